use rand::Rng;
use serde::{Serialize, Deserialize};

use crate::activation::activation::ActivationFunction;
use crate::error::Result;
use crate::math::init::InitScheme;
use crate::math::matrix::Matrix;

/// Intermediates of the latest forward pass, consumed by the next backward.
#[derive(Debug, Clone)]
struct ForwardCache {
    input: Matrix,
    pre_activation: Matrix,
    output: Matrix,
}

#[derive(Debug, Clone)]
struct Gradients {
    weights: Matrix,
    biases: Matrix,
}

/// Fully connected layer: `f(x · W + b)`.
///
/// `weights` is `[input_size, size]` and `biases` is `[1, size]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Layer{
    pub size: usize,
    pub input_size: usize,
    pub weights: Matrix,
    pub biases: Matrix,
    pub activator: ActivationFunction,
    #[serde(skip)]
    cache: Option<ForwardCache>,
    #[serde(skip)]
    gradients: Option<Gradients>,
}

impl Layer {
    /// Xavier-initialized weights, zero biases.
    pub fn new<R: Rng + ?Sized>(input_size: usize, size: usize, activation: ActivationFunction, rng: &mut R) -> Result<Layer> {
        Ok(Layer {
            size,
            input_size,
            weights: InitScheme::Xavier.sample(input_size, size, rng)?,
            biases: Matrix::zeros(1, size),
            activator: activation,
            cache: None,
            gradients: None,
        })
    }

    /// Batched forward pass over `[samples, input_size]`; caches the
    /// intermediates for `backward`, replacing any older cache.
    pub fn feed_from(&mut self, input: &Matrix) -> Matrix {
        let z = input.dot(&self.weights).add_row(&self.biases);
        let a = z.map(|x| self.activator.function(x));
        self.cache = Some(ForwardCache {
            input: input.clone(),
            pre_activation: z,
            output: a.clone(),
        });
        a
    }

    /// Forward pass that leaves the cache alone.
    pub fn infer(&self, input: &Matrix) -> Matrix {
        input.dot(&self.weights)
            .add_row(&self.biases)
            .map(|x| self.activator.function(x))
    }

    /// Consumes the forward cache and stores this layer's gradients.
    ///
    /// `incoming_error` is the error in this layer's output space
    /// (`expected - obtained` at the output layer).  Returns the error to
    /// hand to the previous layer, or `None` if there was no cached pass.
    pub fn compute_gradients(&mut self, incoming_error: &Matrix) -> Option<Matrix> {
        let cache = self.cache.take()?;
        let act = self.activator;
        let act_derivative = cache.pre_activation.zip_map(&cache.output, |z, a| act.derivative_at(z, a));
        // δ = error ⊙ f'
        let delta = incoming_error.hadamard(&act_derivative);

        let previous_error = delta.dot(&self.weights.transpose());
        self.gradients = Some(Gradients {
            weights: cache.input.transpose().dot(&delta),
            biases: delta.sum_rows(),
        });
        Some(previous_error)
    }

    /// Moves weights along the stored gradients (ascent on `expected - obtained`,
    /// i.e. descent on squared error).  No-op without pending gradients.
    pub fn apply_gradients(&mut self, lr: f64) {
        if let Some(grads) = self.gradients.take() {
            self.weights = self.weights.clone() + grads.weights.scale(lr);
            self.biases = self.biases.clone() + grads.biases.scale(lr);
        }
    }

    pub fn parameter_count(&self) -> usize {
        self.weights.len() + self.biases.len()
    }

    pub fn has_cached_pass(&self) -> bool {
        self.cache.is_some()
    }

    /// Batch size of the cached forward pass.
    pub fn cached_rows(&self) -> Option<usize> {
        self.cache.as_ref().map(|c| c.input.rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn linear_layer() -> Layer {
        let mut rng = StdRng::seed_from_u64(0);
        let mut layer = Layer::new(2, 1, ActivationFunction::Linear, &mut rng).unwrap();
        layer.weights = Matrix::from_data(vec![vec![1.0], vec![-1.0]]);
        layer
    }

    #[test]
    fn new_layer_has_zero_bias_and_xavier_weights() {
        let mut rng = StdRng::seed_from_u64(1);
        let layer = Layer::new(4, 3, ActivationFunction::Sigmoid, &mut rng).unwrap();
        assert_eq!(layer.weights.shape(), (4, 3));
        assert_eq!(layer.biases, Matrix::zeros(1, 3));
        let limit = (6.0_f64 / 7.0).sqrt();
        assert!(layer.weights.iter().all(|w| w.abs() <= limit));
    }

    #[test]
    fn gradients_follow_the_delta_rule() {
        let mut layer = linear_layer();
        let x = Matrix::from_data(vec![vec![1.0, 2.0], vec![0.0, 1.0]]);
        let out = layer.feed_from(&x);
        assert_eq!(out.data, vec![vec![-1.0], vec![-1.0]]);

        let error = Matrix::column(&[1.0, 0.5]);
        let prev = layer.compute_gradients(&error).unwrap();
        assert_eq!(prev.data, vec![vec![1.0, -1.0], vec![0.5, -0.5]]);

        layer.apply_gradients(0.1);
        // w += 0.1 · xᵀ·δ = 0.1 · [1, 2.5]
        assert!((layer.weights.data[0][0] - 1.1).abs() < 1e-12);
        assert!((layer.weights.data[1][0] + 0.75).abs() < 1e-12);
        assert!((layer.biases.data[0][0] - 0.15).abs() < 1e-12);
    }

    #[test]
    fn cache_is_consumed_once() {
        let mut layer = linear_layer();
        layer.feed_from(&Matrix::from_data(vec![vec![1.0, 1.0]]));
        let err = Matrix::column(&[1.0]);
        assert!(layer.compute_gradients(&err).is_some());
        assert!(layer.compute_gradients(&err).is_none());
    }

    #[test]
    fn infer_does_not_touch_cache() {
        let layer = linear_layer();
        let out = layer.infer(&Matrix::from_data(vec![vec![3.0, 1.0]]));
        assert_eq!(out.data, vec![vec![2.0]]);
        assert!(!layer.has_cached_pass());
    }
}
