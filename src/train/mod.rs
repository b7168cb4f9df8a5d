pub mod epoch_stats;
pub mod train_config;
pub mod outcome;
pub mod loop_fn;

pub use epoch_stats::EpochStats;
pub use train_config::{Hyperparameters, TrainConfig};
pub use outcome::{StopReason, TrainingOutcome};
