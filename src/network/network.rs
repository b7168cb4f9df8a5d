use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Serialize, Deserialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::eval::evaluator::{PerformanceEvaluator, Predictor, TrainingSummary};
use crate::eval::metrics::{self, Metrics, ProblemKind};
use crate::layers::dense::Layer;
use crate::loss::mse::MseLoss;
use crate::math::matrix::Matrix;
use crate::network::spec::NetworkSpec;
use crate::train::loop_fn::{train_loop, EpochModel};
use crate::train::outcome::TrainingOutcome;
use crate::train::train_config::TrainConfig;

/// Multilayer perceptron trained by full-batch backpropagation.
///
/// Every epoch runs all samples through the network at once, measures the
/// mean squared error, and applies one gradient step per layer.
#[derive(Debug, Serialize, Deserialize)]
pub struct Network {
    spec: NetworkSpec,
    pub layers: Vec<Layer>,
    #[serde(skip)]
    last_output: Option<Matrix>,
    #[serde(skip)]
    history: PerformanceEvaluator,
    #[serde(skip)]
    convergence_epoch: Option<usize>,
}

/// Snapshot of a network's architecture and training state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkInfo {
    pub widths: Vec<usize>,
    pub num_layers: usize,
    pub parameter_count: usize,
    pub converged: bool,
    pub convergence_epoch: Option<usize>,
    pub summary: Option<TrainingSummary>,
}

impl Network {
    /// Builds a network from layer widths `[n0, ..., nk]` and one activation
    /// name per layer.
    pub fn new(widths: &[usize], activations: &[&str], seed: u64) -> Result<Network> {
        Network::from_spec(NetworkSpec::new(widths, activations, seed)?)
    }

    pub fn from_spec(spec: NetworkSpec) -> Result<Network> {
        spec.validate()?;
        let mut rng = StdRng::seed_from_u64(spec.seed);
        let layers = spec.widths.windows(2)
            .zip(spec.activations.iter())
            .map(|(w, &activation)| Layer::new(w[0], w[1], activation, &mut rng))
            .collect::<Result<Vec<_>>>()?;
        debug!(widths = ?spec.widths, seed = spec.seed, "network initialized");
        Ok(Network {
            spec,
            layers,
            last_output: None,
            history: PerformanceEvaluator::new(),
            convergence_epoch: None,
        })
    }

    pub fn spec(&self) -> &NetworkSpec {
        &self.spec
    }

    pub fn widths(&self) -> &[usize] {
        &self.spec.widths
    }

    pub fn input_size(&self) -> usize {
        self.spec.widths[0]
    }

    pub fn output_size(&self) -> usize {
        self.spec.widths[self.spec.widths.len() - 1]
    }

    /// Forward pass; stores per-layer intermediates for `backward`.
    pub fn forward(&mut self, inputs: &Matrix) -> Result<Matrix> {
        self.check_inputs(inputs)?;
        let mut current = inputs.clone();
        for layer in &mut self.layers {
            current = layer.feed_from(&current);
        }
        Ok(current)
    }

    /// Backpropagates `expected - obtained` through every layer, consuming
    /// the caches of the latest `forward` and storing gradients for
    /// `apply_gradients`.
    pub fn backward(&mut self, expected: &Matrix, obtained: &Matrix) -> Result<()> {
        let output_size = self.output_size();
        if expected.cols != output_size {
            return Err(Error::shape("backward targets", (expected.rows, output_size), expected.shape()));
        }
        let mut error = MseLoss::error_signal(expected, obtained)?;
        if let Some(layer) = self.layers.iter().position(|l| !l.has_cached_pass()) {
            return Err(Error::MissingForwardPass { layer });
        }
        if let Some(rows) = self.layers.last().and_then(Layer::cached_rows) {
            if rows != expected.rows {
                return Err(Error::shape("backward batch", (rows, output_size), expected.shape()));
            }
        }

        for i in (0..self.layers.len()).rev() {
            error = self.layers[i]
                .compute_gradients(&error)
                .ok_or(Error::MissingForwardPass { layer: i })?;
        }
        Ok(())
    }

    /// Applies the gradients stored by the last `backward` to every layer.
    pub fn apply_gradients(&mut self, learning_rate: f64) {
        for layer in &mut self.layers {
            layer.apply_gradients(learning_rate);
        }
    }

    /// Full-batch training on `inputs` `[samples, n0]` against `targets`
    /// `[samples, nk]`.  Weights carry over from any previous run.
    pub fn train(&mut self, inputs: &Matrix, targets: &Matrix, config: &TrainConfig) -> Result<TrainingOutcome> {
        self.check_inputs(inputs)?;
        if inputs.rows == 0 {
            return Err(Error::InvalidParameter("training set is empty".to_string()));
        }
        let expected = (inputs.rows, self.output_size());
        if targets.shape() != expected {
            return Err(Error::shape("network targets", expected, targets.shape()));
        }
        self.convergence_epoch = None;
        let outcome = train_loop(self, "mlp", inputs, targets, config);
        self.last_output = None;
        let outcome = outcome?;
        self.convergence_epoch = outcome.convergence_epoch;
        Ok(outcome)
    }

    /// Pure forward pass; no caches are written.
    pub fn predict(&self, inputs: &Matrix) -> Result<Matrix> {
        self.check_inputs(inputs)?;
        Ok(self.layers.iter().fold(inputs.clone(), |current, layer| layer.infer(&current)))
    }

    pub fn evaluate(&self, inputs: &Matrix, targets: &Matrix, kind: ProblemKind) -> Result<Metrics> {
        let predictions = self.predict(inputs)?;
        metrics::evaluate(&predictions, targets, kind)
    }

    pub fn history(&self) -> &[f64] {
        self.history.errors()
    }

    pub fn training_summary(&self) -> Option<TrainingSummary> {
        self.history.training_summary()
    }

    pub fn convergence_epoch(&self) -> Option<usize> {
        self.convergence_epoch
    }

    /// Copies of every layer's `(weights, biases)`.
    pub fn layer_weights(&self) -> Vec<(Matrix, Matrix)> {
        self.layers.iter().map(|l| (l.weights.clone(), l.biases.clone())).collect()
    }

    pub fn parameter_count(&self) -> usize {
        self.layers.iter().map(Layer::parameter_count).sum()
    }

    pub fn info(&self) -> NetworkInfo {
        NetworkInfo {
            widths: self.spec.widths.clone(),
            num_layers: self.layers.len(),
            parameter_count: self.parameter_count(),
            converged: self.convergence_epoch.is_some(),
            convergence_epoch: self.convergence_epoch,
            summary: self.training_summary(),
        }
    }

    /// Serializes the network weights to a pretty-printed JSON file.
    pub fn save_json(&self, path: &str) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = std::io::BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    /// Deserializes a network from a JSON file previously written by `save_json`.
    pub fn load_json(path: &str) -> Result<Network> {
        let file = std::fs::File::open(path)?;
        let reader = std::io::BufReader::new(file);
        let network: Network = serde_json::from_reader(reader)?;
        network.check_layers()?;
        Ok(network)
    }

    /// Layer shapes and activations must agree with the spec.
    fn check_layers(&self) -> Result<()> {
        self.spec.validate()?;
        if self.layers.len() != self.spec.num_layers() {
            return Err(Error::InvalidArchitecture(format!(
                "spec has {} layers, found {}", self.spec.num_layers(), self.layers.len()
            )));
        }
        for (i, (layer, w)) in self.layers.iter().zip(self.spec.widths.windows(2)).enumerate() {
            if layer.weights.shape() != (w[0], w[1])
                || layer.biases.shape() != (1, w[1])
                || layer.activator != self.spec.activations[i]
            {
                return Err(Error::InvalidArchitecture(format!(
                    "layer {i} does not match spec {:?}", self.spec.widths
                )));
            }
        }
        Ok(())
    }

    fn check_inputs(&self, inputs: &Matrix) -> Result<()> {
        if inputs.cols != self.input_size() {
            return Err(Error::shape("network inputs", (inputs.rows, self.input_size()), inputs.shape()));
        }
        Ok(())
    }
}

impl EpochModel for Network {
    fn epoch_error(&mut self, inputs: &Matrix, targets: &Matrix) -> Result<f64> {
        let output = self.forward(inputs)?;
        let error = MseLoss::loss(targets, &output)?;
        self.last_output = Some(output);
        Ok(error)
    }

    fn update(&mut self, _inputs: &Matrix, targets: &Matrix, learning_rate: f64) -> Result<()> {
        let output = self.last_output.take().ok_or(Error::MissingForwardPass { layer: self.layers.len() - 1 })?;
        self.backward(targets, &output)?;
        self.apply_gradients(learning_rate);
        Ok(())
    }

    fn history_mut(&mut self) -> &mut PerformanceEvaluator {
        &mut self.history
    }
}

impl Predictor for Network {
    fn predict_batch(&self, inputs: &Matrix) -> Result<Matrix> {
        self.predict(inputs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::train::train_config::Hyperparameters;

    fn xor() -> (Matrix, Matrix) {
        (
            Matrix::from_data(vec![vec![0.0, 0.0], vec![0.0, 1.0], vec![1.0, 0.0], vec![1.0, 1.0]]),
            Matrix::column(&[0.0, 1.0, 1.0, 0.0]),
        )
    }

    #[test]
    fn layer_shapes_follow_widths() {
        let net = Network::new(&[3, 5, 2], &["tanh", "sigmoid"], 0).unwrap();
        let shapes: Vec<_> = net.layers.iter().map(|l| (l.weights.shape(), l.biases.shape())).collect();
        assert_eq!(shapes, vec![((3, 5), (1, 5)), ((5, 2), (1, 2))]);
        assert_eq!(net.parameter_count(), 3 * 5 + 5 + 5 * 2 + 2);
    }

    #[test]
    fn architecture_errors() {
        assert!(matches!(Network::new(&[4], &[], 0), Err(Error::InvalidArchitecture(_))));
        assert!(matches!(Network::new(&[2, 2, 1], &["sigmoid"], 0), Err(Error::InvalidArchitecture(_))));
    }

    #[test]
    fn shape_mismatches_are_reported() {
        let mut net = Network::new(&[2, 3, 1], &["sigmoid", "sigmoid"], 0).unwrap();
        let (x, y) = xor();
        assert!(matches!(net.predict(&Matrix::zeros(4, 3)), Err(Error::ShapeMismatch { .. })));
        let bad_targets = Matrix::zeros(4, 2);
        let config = TrainConfig::default();
        assert!(matches!(net.train(&x, &bad_targets, &config), Err(Error::ShapeMismatch { .. })));
        assert!(net.train(&x, &y, &TrainConfig::new(Hyperparameters::new(0.5, 1, 0.0))).is_ok());
    }

    #[test]
    fn backward_without_forward_fails() {
        let mut net = Network::new(&[2, 1], &["linear"], 0).unwrap();
        let y = Matrix::column(&[1.0]);
        assert!(matches!(net.backward(&y, &y), Err(Error::MissingForwardPass { layer: 0 })));
    }

    #[test]
    fn stale_cache_is_not_reused() {
        let mut net = Network::new(&[2, 2, 1], &["sigmoid", "sigmoid"], 0).unwrap();
        let (x, y) = xor();
        let out = net.forward(&x).unwrap();
        net.backward(&y, &out).unwrap();
        assert!(matches!(net.backward(&y, &out), Err(Error::MissingForwardPass { .. })));
    }

    #[test]
    fn one_step_reduces_error() {
        let mut net = Network::new(&[2, 4, 1], &["sigmoid", "sigmoid"], 3).unwrap();
        let (x, y) = xor();
        let before = MseLoss::loss(&y, &net.predict(&x).unwrap()).unwrap();
        let out = net.forward(&x).unwrap();
        net.backward(&y, &out).unwrap();
        net.apply_gradients(0.05);
        let after = MseLoss::loss(&y, &net.predict(&x).unwrap()).unwrap();
        assert!(after < before, "{after} >= {before}");
    }

    #[test]
    fn predict_matches_forward() {
        let mut net = Network::new(&[2, 3, 2], &["tanh", "linear"], 8).unwrap();
        let (x, _) = xor();
        assert_eq!(net.predict(&x).unwrap(), net.forward(&x).unwrap());
    }

    #[test]
    fn same_seed_same_network() {
        let a = Network::new(&[2, 4, 1], &["sigmoid", "sigmoid"], 21).unwrap();
        let b = Network::new(&[2, 4, 1], &["sigmoid", "sigmoid"], 21).unwrap();
        assert_eq!(a.layer_weights(), b.layer_weights());
    }

    #[test]
    fn save_and_load_keep_weights() {
        let net = Network::new(&[2, 3, 1], &["tanh", "sigmoid"], 4).unwrap();
        let path = std::env::temp_dir().join(format!("ferrite-net-{}.json", std::process::id()));
        let path = path.to_string_lossy().to_string();
        net.save_json(&path).unwrap();
        let loaded = Network::load_json(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(loaded.layer_weights(), net.layer_weights());
        assert_eq!(loaded.spec(), net.spec());
        assert!(loaded.history().is_empty());
    }

    #[test]
    fn info_reflects_training() {
        let mut net = Network::new(&[2, 4, 1], &["sigmoid", "sigmoid"], 3).unwrap();
        let (x, y) = xor();
        let outcome = net.train(&x, &y, &TrainConfig::new(Hyperparameters::new(0.5, 10, 0.0))).unwrap();
        let info = net.info();
        assert!(!info.converged);
        assert_eq!(info.num_layers, 2);
        assert_eq!(info.summary.unwrap().epochs, outcome.epochs_run + 1);
    }
}
