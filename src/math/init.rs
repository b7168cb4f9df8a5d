//! Weight initialization schemes.
//!
//! Every scheme is a pure function of the shape and the generator it is
//! handed.  Trainers own their generator, so two instances never share a
//! random stream.

use rand::distributions::{Distribution, Uniform};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Serialize, Deserialize};

use crate::error::{Error, Result};
use crate::math::matrix::Matrix;

pub const DEFAULT_UNIFORM_MIN: f64 = -0.5;
pub const DEFAULT_UNIFORM_MAX: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "scheme", rename_all = "snake_case")]
pub enum InitScheme {
    /// Independent draws from `[min, max]`.
    Uniform { min: f64, max: f64 },
    /// Glorot uniform: `[-limit, limit]` with `limit = sqrt(6 / (fan_in + fan_out))`.
    Xavier,
}

impl Default for InitScheme {
    fn default() -> Self {
        InitScheme::Uniform { min: DEFAULT_UNIFORM_MIN, max: DEFAULT_UNIFORM_MAX }
    }
}

impl InitScheme {
    /// Samples a fresh `[fan_in, fan_out]` matrix from `rng`.
    pub fn sample<R: Rng + ?Sized>(&self, fan_in: usize, fan_out: usize, rng: &mut R) -> Result<Matrix> {
        let (low, high) = self.bounds(fan_in, fan_out)?;
        let dist = Uniform::new_inclusive(low, high);
        let mut data = Vec::with_capacity(fan_in);
        for _ in 0..fan_in {
            data.push((0..fan_out).map(|_| dist.sample(&mut *rng)).collect());
        }
        Ok(Matrix { rows: fan_in, cols: fan_out, data })
    }

    fn bounds(&self, fan_in: usize, fan_out: usize) -> Result<(f64, f64)> {
        match *self {
            InitScheme::Uniform { min, max } => {
                if !min.is_finite() || !max.is_finite() || min > max || !(max - min).is_finite() {
                    return Err(Error::InvalidParameter(format!(
                        "uniform range [{min}, {max}] must be finite with min <= max and a finite width"
                    )));
                }
                Ok((min, max))
            }
            InitScheme::Xavier => {
                let fan = (fan_in + fan_out).max(1) as f64;
                let limit = (6.0 / fan).sqrt();
                Ok((-limit, limit))
            }
        }
    }
}

/// Seeded entry point: same seed and shape give bit-identical output.
pub fn initialize_weights(fan_in: usize, fan_out: usize, scheme: InitScheme, seed: u64) -> Result<Matrix> {
    let mut rng = StdRng::seed_from_u64(seed);
    scheme.sample(fan_in, fan_out, &mut rng)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn xavier_respects_limit() {
        let w = initialize_weights(2, 4, InitScheme::Xavier, 11).unwrap();
        let limit = 1.0_f64;
        assert_eq!(w.shape(), (2, 4));
        assert!(w.iter().all(|x| x.abs() <= limit));
    }

    #[test]
    fn inverted_range_is_rejected() {
        let err = initialize_weights(2, 2, InitScheme::Uniform { min: 1.0, max: -1.0 }, 0).unwrap_err();
        assert!(matches!(err, Error::InvalidParameter(_)));
    }

    #[test]
    fn range_wider_than_f64_is_rejected() {
        let scheme = InitScheme::Uniform { min: -f64::MAX, max: f64::MAX };
        let err = initialize_weights(2, 2, scheme, 0).unwrap_err();
        assert!(matches!(err, Error::InvalidParameter(_)));
    }

    #[test]
    fn default_scheme_is_half_unit_uniform() {
        let w = initialize_weights(8, 8, InitScheme::default(), 3).unwrap();
        assert!(w.iter().all(|&x| (-0.5..=0.5).contains(&x)));
    }

    proptest! {
        #[test]
        fn same_seed_same_weights(fan_in in 1usize..12, fan_out in 1usize..12, seed: u64) {
            let a = initialize_weights(fan_in, fan_out, InitScheme::Xavier, seed).unwrap();
            let b = initialize_weights(fan_in, fan_out, InitScheme::Xavier, seed).unwrap();
            let bits_a: Vec<u64> = a.iter().map(|x| x.to_bits()).collect();
            let bits_b: Vec<u64> = b.iter().map(|x| x.to_bits()).collect();
            prop_assert_eq!(bits_a, bits_b);
        }

        #[test]
        fn uniform_draws_stay_in_range(min in -5.0f64..0.0, width in 0.0f64..5.0, seed: u64) {
            let max = min + width;
            let w = initialize_weights(3, 5, InitScheme::Uniform { min, max }, seed).unwrap();
            prop_assert!(w.iter().all(|&x| x >= min && x <= max));
        }
    }
}
