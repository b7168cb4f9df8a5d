use serde::{Serialize, Deserialize};

/// Terminal state of a training run.  None of these is an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    Converged,
    EpochsExhausted,
    /// Stop flag raised or progress receiver dropped.
    Cancelled,
}

/// What a `train` call reports back.  `W` carries the final weights for
/// trainers that return them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingOutcome<W = ()> {
    pub stop_reason: StopReason,
    /// Number of weight updates applied.
    pub epochs_run: usize,
    /// Error of the final weights (last entry of the history); `None` when
    /// the run was cancelled before the first measurement.
    pub final_error: Option<f64>,
    /// Epoch index at which the error dropped below the target.
    pub convergence_epoch: Option<usize>,
    pub weights: W,
}

impl<W> TrainingOutcome<W> {
    pub fn converged(&self) -> bool {
        self.stop_reason == StopReason::Converged
    }

    pub fn with_weights<V>(self, weights: V) -> TrainingOutcome<V> {
        TrainingOutcome {
            stop_reason: self.stop_reason,
            epochs_run: self.epochs_run,
            final_error: self.final_error,
            convergence_epoch: self.convergence_epoch,
            weights,
        }
    }
}
