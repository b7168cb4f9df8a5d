use serde::{Serialize, Deserialize};

use crate::error::Result;
use crate::eval::metrics::{binary_classification_metrics, DEFAULT_THRESHOLD};
use crate::math::matrix::Matrix;

/// Anything that maps a `[samples, features]` batch to a batch of outputs.
pub trait Predictor {
    fn predict_batch(&self, inputs: &Matrix) -> Result<Matrix>;
}

/// Summary of one training run's error history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingSummary {
    pub initial_error: f64,
    pub final_error: f64,
    pub min_error: f64,
    pub max_error: f64,
    /// `(initial - final) / initial * 100`; 0 when the initial error is 0.
    pub error_reduction_pct: f64,
    pub epochs: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoiseRobustness {
    pub clean_accuracy: f64,
    pub noisy_accuracy: f64,
    pub accuracy_degradation: f64,
    /// `(1 - degradation) * 100`.
    pub robustness_pct: f64,
}

/// Per-run error/accuracy history.  Owned by one trainer; reset with
/// `clear_history` at the start of every `train` call.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PerformanceEvaluator {
    errors: Vec<f64>,
    accuracies: Vec<f64>,
}

impl PerformanceEvaluator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_error(&mut self, value: f64) {
        self.errors.push(value);
    }

    pub fn record_accuracy(&mut self, value: f64) {
        self.accuracies.push(value);
    }

    pub fn errors(&self) -> &[f64] {
        &self.errors
    }

    pub fn accuracies(&self) -> &[f64] {
        &self.accuracies
    }

    pub fn clear_history(&mut self) {
        self.errors.clear();
        self.accuracies.clear();
    }

    /// `None` when no error has been recorded yet.
    pub fn training_summary(&self) -> Option<TrainingSummary> {
        let (&initial_error, &final_error) = (self.errors.first()?, self.errors.last()?);
        let min_error = self.errors.iter().copied().fold(f64::INFINITY, f64::min);
        let max_error = self.errors.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let error_reduction_pct = if initial_error == 0.0 {
            0.0
        } else {
            (initial_error - final_error) / initial_error * 100.0
        };
        Some(TrainingSummary {
            initial_error,
            final_error,
            min_error,
            max_error,
            error_reduction_pct,
            epochs: self.errors.len(),
        })
    }

    /// Accuracy on clean vs. perturbed inputs through the same model, at the
    /// default binary threshold.
    pub fn noise_robustness<P: Predictor + ?Sized>(
        &self,
        model: &P,
        clean_inputs: &Matrix,
        noisy_inputs: &Matrix,
        labels: &Matrix,
    ) -> Result<NoiseRobustness> {
        self.noise_robustness_at(model, clean_inputs, noisy_inputs, labels, DEFAULT_THRESHOLD)
    }

    pub fn noise_robustness_at<P: Predictor + ?Sized>(
        &self,
        model: &P,
        clean_inputs: &Matrix,
        noisy_inputs: &Matrix,
        labels: &Matrix,
        threshold: f64,
    ) -> Result<NoiseRobustness> {
        let clean = binary_classification_metrics(&model.predict_batch(clean_inputs)?, labels, threshold)?;
        let noisy = binary_classification_metrics(&model.predict_batch(noisy_inputs)?, labels, threshold)?;
        let accuracy_degradation = clean.accuracy - noisy.accuracy;
        Ok(NoiseRobustness {
            clean_accuracy: clean.accuracy,
            noisy_accuracy: noisy.accuracy,
            accuracy_degradation,
            robustness_pct: (1.0 - accuracy_degradation) * 100.0,
        })
    }
}
