use std::sync::mpsc;
use std::sync::{Arc, atomic::AtomicBool};
use serde::{Serialize, Deserialize};

use crate::error::{Error, Result};
use crate::train::epoch_stats::EpochStats;

/// Learning rate, epoch budget and convergence target for one training run.
///
/// Named presets are plain constructors; nothing here is global.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Hyperparameters {
    pub learning_rate: f64,
    pub max_epochs: usize,
    /// Training stops as converged once the recorded error drops below this.
    pub error_target: f64,
}

const PRESET_NAMES: [&str; 5] = ["default", "fast", "precise", "gate", "regression"];

impl Default for Hyperparameters {
    fn default() -> Self {
        Hyperparameters { learning_rate: 1.0, max_epochs: 1000, error_target: 0.01 }
    }
}

impl Hyperparameters {
    pub fn new(learning_rate: f64, max_epochs: usize, error_target: f64) -> Self {
        Hyperparameters { learning_rate, max_epochs, error_target }
    }

    pub fn fast() -> Self {
        Self::new(2.0, 500, 0.05)
    }

    pub fn precise() -> Self {
        Self::new(0.5, 2000, 0.001)
    }

    /// Logic-gate training.
    pub fn gate() -> Self {
        Self::new(1.0, 1000, 0.01)
    }

    /// Long, low-rate runs for linear regression targets.
    pub fn regression() -> Self {
        Self::new(0.1, 100_000, 1e-6)
    }

    pub fn preset(name: &str) -> Result<Self> {
        match name {
            "default" => Ok(Self::default()),
            "fast" => Ok(Self::fast()),
            "precise" => Ok(Self::precise()),
            "gate" => Ok(Self::gate()),
            "regression" => Ok(Self::regression()),
            _ => Err(Error::UnknownPreset {
                name: name.to_string(),
                available: PRESET_NAMES.iter().map(|s| s.to_string()).collect(),
            }),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.learning_rate > 0.0 && self.learning_rate.is_finite()) {
            return Err(Error::InvalidParameter(format!(
                "learning rate must be positive and finite, got {}", self.learning_rate
            )));
        }
        if self.error_target.is_nan() {
            return Err(Error::InvalidParameter("error target is NaN".to_string()));
        }
        Ok(())
    }

    /// Serializes the hyperparameters to a pretty-printed JSON file.
    pub fn save_json(&self, path: &str) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = std::io::BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    pub fn load_json(path: &str) -> Result<Hyperparameters> {
        let file = std::fs::File::open(path)?;
        let reader = std::io::BufReader::new(file);
        let hyper: Hyperparameters = serde_json::from_reader(reader)?;
        hyper.validate()?;
        Ok(hyper)
    }
}

/// Configuration for a `train` run.
///
/// # Fields
/// - `hyper`       : learning rate, epoch budget, error target
/// - `log_interval`: emit a `debug!` progress line every this many epochs
/// - `progress_tx` : optional channel sender; one `EpochStats` is sent per
///                    epoch.  If the receiver is dropped the run is cancelled.
/// - `stop_flag`   : optional atomic flag; when set to `true` from another
///                    thread the run stops before its next epoch.
#[derive(Debug, Clone)]
pub struct TrainConfig {
    pub hyper: Hyperparameters,
    pub log_interval: usize,
    pub progress_tx: Option<mpsc::Sender<EpochStats>>,
    pub stop_flag: Option<Arc<AtomicBool>>,
}

impl TrainConfig {
    /// Creates a minimal `TrainConfig` with no progress channel and no stop flag.
    pub fn new(hyper: Hyperparameters) -> Self {
        TrainConfig {
            hyper,
            log_interval: 100,
            progress_tx: None,
            stop_flag: None,
        }
    }

    pub fn with_log_interval(mut self, log_interval: usize) -> Self {
        self.log_interval = log_interval;
        self
    }

    pub fn with_progress(mut self, tx: mpsc::Sender<EpochStats>) -> Self {
        self.progress_tx = Some(tx);
        self
    }

    pub fn with_stop_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.stop_flag = Some(flag);
        self
    }
}

impl Default for TrainConfig {
    fn default() -> Self {
        TrainConfig::new(Hyperparameters::default())
    }
}

impl From<Hyperparameters> for TrainConfig {
    fn from(hyper: Hyperparameters) -> Self {
        TrainConfig::new(hyper)
    }
}
