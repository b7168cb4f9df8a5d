use serde::{Serialize, Deserialize};

/// Per-epoch training statistics.
///
/// When a `progress_tx` channel is configured in `TrainConfig`, the training
/// loop sends one `EpochStats` value after measuring the error of every epoch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpochStats {
    /// 0-based epoch index.
    pub epoch: usize,
    /// Epoch budget for this run.
    pub max_epochs: usize,
    /// Error of the current weights over the whole training set.
    pub error: f64,
    /// Wall-clock time since the run started, in milliseconds.
    pub elapsed_ms: u64,
}
