use crate::error::{Error, Result};
use crate::math::matrix::Matrix;

pub struct MseLoss;

impl MseLoss {
    /// Scalar MSE: mean((expected - actual)²) over every element.
    pub fn loss(expected: &Matrix, actual: &Matrix) -> Result<f64> {
        Self::check(expected, actual)?;
        if expected.is_empty() {
            return Ok(0.0);
        }
        Ok(Self::squared_sum(expected, actual) / expected.len() as f64)
    }

    /// Perceptron error: 0.5 · Σ(expected - actual)².
    pub fn half_sum_squared(expected: &Matrix, actual: &Matrix) -> Result<f64> {
        Self::check(expected, actual)?;
        Ok(0.5 * Self::squared_sum(expected, actual))
    }

    /// Output error signal for backprop: expected - actual.
    pub fn error_signal(expected: &Matrix, actual: &Matrix) -> Result<Matrix> {
        Self::check(expected, actual)?;
        Ok(expected.zip_map(actual, |e, a| e - a))
    }

    fn squared_sum(expected: &Matrix, actual: &Matrix) -> f64 {
        expected.iter().zip(actual.iter())
            .map(|(e, a)| (e - a).powi(2))
            .sum()
    }

    fn check(expected: &Matrix, actual: &Matrix) -> Result<()> {
        if expected.shape() != actual.shape() {
            return Err(Error::shape("squared error", expected.shape(), actual.shape()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn averages_over_all_elements() {
        let e = Matrix::from_data(vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
        let a = Matrix::from_data(vec![vec![0.0, 0.0], vec![0.0, 0.0]]);
        assert!((MseLoss::loss(&e, &a).unwrap() - 0.5).abs() < 1e-12);
        assert!((MseLoss::half_sum_squared(&e, &a).unwrap() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn mismatched_shapes_fail() {
        let e = Matrix::zeros(2, 1);
        let a = Matrix::zeros(1, 2);
        assert!(matches!(MseLoss::loss(&e, &a), Err(Error::ShapeMismatch { .. })));
    }

    #[test]
    fn error_signal_is_expected_minus_actual() {
        let e = Matrix::column(&[1.0, 0.0]);
        let a = Matrix::column(&[0.25, 0.5]);
        assert_eq!(MseLoss::error_signal(&e, &a).unwrap().data, vec![vec![0.75], vec![-0.5]]);
    }

    proptest! {
        #[test]
        fn identical_tensors_have_zero_error(
            rows in prop::collection::vec(prop::collection::vec(-1e3f64..1e3, 3), 1..8)
        ) {
            let m = Matrix::from_data(rows);
            prop_assert_eq!(MseLoss::loss(&m, &m).unwrap(), 0.0);
        }
    }
}
