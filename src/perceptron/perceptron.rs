use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::activation::activation::ActivationFunction;
use crate::error::{Error, Result};
use crate::eval::evaluator::{PerformanceEvaluator, Predictor, TrainingSummary};
use crate::eval::metrics::{self, Metrics, ProblemKind};
use crate::loss::mse::MseLoss;
use crate::math::init::InitScheme;
use crate::math::matrix::Matrix;
use crate::train::loop_fn::{train_loop, EpochModel};
use crate::train::outcome::TrainingOutcome;
use crate::train::train_config::TrainConfig;

/// Initial weights are drawn from this symmetric range.
const INIT_RANGE: f64 = 1.0;

/// Single-layer perceptron.
///
/// The weight vector has shape `[num_inputs + 1, 1]`; its last row is the
/// bias, paired with a constant-1 input appended to every sample.
///
/// Training is online: each epoch picks one sample uniformly at random from
/// the perceptron's own seeded generator and applies
/// `Δw = η · (t - O) · f'(h) · x`.
#[derive(Debug)]
pub struct Perceptron {
    num_inputs: usize,
    weights: Matrix,
    activation: ActivationFunction,
    config: TrainConfig,
    rng: StdRng,
    history: PerformanceEvaluator,
    convergence_epoch: Option<usize>,
}

impl Perceptron {
    pub fn new(num_inputs: usize, config: impl Into<TrainConfig>, seed: u64) -> Result<Perceptron> {
        let config = config.into();
        config.hyper.validate()?;
        let mut rng = StdRng::seed_from_u64(seed);
        let weights = InitScheme::Uniform { min: -INIT_RANGE, max: INIT_RANGE }
            .sample(num_inputs + 1, 1, &mut rng)?;
        debug!(num_inputs, seed, "perceptron initialized");
        Ok(Perceptron {
            num_inputs,
            weights,
            activation: ActivationFunction::Step,
            config,
            rng,
            history: PerformanceEvaluator::new(),
            convergence_epoch: None,
        })
    }

    pub fn num_inputs(&self) -> usize {
        self.num_inputs
    }

    /// Current `[num_inputs + 1, 1]` weights, bias last.
    pub fn weights(&self) -> &Matrix {
        &self.weights
    }

    /// Replaces the weights, e.g. with a previously trained vector.
    pub fn set_weights(&mut self, weights: Matrix) -> Result<()> {
        let expected = (self.num_inputs + 1, 1);
        if weights.shape() != expected {
            return Err(Error::shape("perceptron weights", expected, weights.shape()));
        }
        self.weights = weights;
        Ok(())
    }

    /// Activation used by the last `train` call (step before any training).
    pub fn activation(&self) -> ActivationFunction {
        self.activation
    }

    pub fn config(&self) -> &TrainConfig {
        &self.config
    }

    /// Per-epoch error history of the last run.
    pub fn history(&self) -> &[f64] {
        self.history.errors()
    }

    pub fn training_summary(&self) -> Option<TrainingSummary> {
        self.history.training_summary()
    }

    pub fn convergence_epoch(&self) -> Option<usize> {
        self.convergence_epoch
    }

    /// Trains on `inputs` `[samples, num_inputs]` against `targets`
    /// `[samples, 1]`.  Weights carry over from any previous run; the
    /// history and convergence epoch do not.
    pub fn train(&mut self, inputs: &Matrix, targets: &Matrix, activation: &str) -> Result<TrainingOutcome<Matrix>> {
        let activation = ActivationFunction::from_name(activation)?;
        self.check_training_data(inputs, targets)?;
        self.activation = activation;
        self.convergence_epoch = None;

        // Bias column is constant for the whole run.
        let with_bias = inputs.with_bias_column();
        let config = self.config.clone();
        let outcome = train_loop(self, "perceptron", &with_bias, targets, &config)?;
        self.convergence_epoch = outcome.convergence_epoch;
        Ok(outcome.with_weights(self.weights.clone()))
    }

    /// Output for one sample of `num_inputs` features.
    pub fn predict(&self, input: &[f64]) -> Result<f64> {
        self.predict_with(input, self.activation)
    }

    pub fn predict_with(&self, input: &[f64], activation: ActivationFunction) -> Result<f64> {
        if input.len() != self.num_inputs {
            return Err(Error::shape("perceptron input", (1, self.num_inputs), (1, input.len())));
        }
        let sample: Vec<f64> = input.iter().copied().chain(std::iter::once(1.0)).collect();
        Ok(activation.function(self.net_input(&sample)))
    }

    /// Scores the current weights on `inputs` against `targets`.
    pub fn evaluate(&self, inputs: &Matrix, targets: &Matrix, kind: ProblemKind) -> Result<Metrics> {
        metrics::evaluate(&self.predict_batch(inputs)?, targets, kind)
    }

    fn net_input(&self, sample_with_bias: &[f64]) -> f64 {
        sample_with_bias.iter()
            .zip(self.weights.data.iter())
            .map(|(x, w)| x * w[0])
            .sum()
    }

    fn check_training_data(&self, inputs: &Matrix, targets: &Matrix) -> Result<()> {
        if inputs.rows == 0 {
            return Err(Error::InvalidParameter("training set is empty".to_string()));
        }
        if inputs.cols != self.num_inputs {
            return Err(Error::shape("perceptron inputs", (inputs.rows, self.num_inputs), inputs.shape()));
        }
        if targets.shape() != (inputs.rows, 1) {
            return Err(Error::shape("perceptron targets", (inputs.rows, 1), targets.shape()));
        }
        Ok(())
    }
}

impl EpochModel for Perceptron {
    fn epoch_error(&mut self, inputs: &Matrix, targets: &Matrix) -> Result<f64> {
        let outputs = Matrix::from_data(
            inputs.data.iter()
                .map(|sample| vec![self.activation.function(self.net_input(sample))])
                .collect(),
        );
        MseLoss::half_sum_squared(targets, &outputs)
    }

    fn update(&mut self, inputs: &Matrix, targets: &Matrix, learning_rate: f64) -> Result<()> {
        let index = self.rng.gen_range(0..inputs.rows);
        let sample = inputs.row(index);
        let h = self.net_input(sample);
        let output = self.activation.function(h);
        let m = targets.data[index][0] - output;
        let step = learning_rate * m * self.activation.derivative_at(h, output);
        for (w, x) in self.weights.data.iter_mut().zip(sample.iter()) {
            w[0] += step * x;
        }
        Ok(())
    }

    fn history_mut(&mut self) -> &mut PerformanceEvaluator {
        &mut self.history
    }
}

impl Predictor for Perceptron {
    fn predict_batch(&self, inputs: &Matrix) -> Result<Matrix> {
        if inputs.cols != self.num_inputs {
            return Err(Error::shape("perceptron inputs", (inputs.rows, self.num_inputs), inputs.shape()));
        }
        let outputs = inputs.with_bias_column().data.iter()
            .map(|sample| self.activation.function(self.net_input(sample)))
            .collect::<Vec<_>>();
        Ok(Matrix::column(&outputs))
    }
}
