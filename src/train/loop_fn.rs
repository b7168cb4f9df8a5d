use std::sync::atomic::Ordering;
use std::time::Instant;

use tracing::{debug, info};

use crate::error::Result;
use crate::eval::evaluator::PerformanceEvaluator;
use crate::math::matrix::Matrix;
use crate::train::epoch_stats::EpochStats;
use crate::train::outcome::{StopReason, TrainingOutcome};
use crate::train::train_config::TrainConfig;

/// One trainable model as seen by `train_loop`.
///
/// `update` is called only right after `epoch_error` on the same data, so a
/// model may reuse whatever `epoch_error` computed with the current weights.
pub(crate) trait EpochModel {
    /// Error of the current weights over the full training set.
    fn epoch_error(&mut self, inputs: &Matrix, targets: &Matrix) -> Result<f64>;

    /// Applies one weight update.
    fn update(&mut self, inputs: &Matrix, targets: &Matrix, learning_rate: f64) -> Result<()>;

    fn history_mut(&mut self) -> &mut PerformanceEvaluator;
}

// ---------------------------------------------------------------------------
// Public entry point
// ---------------------------------------------------------------------------

/// Runs epochs until the error drops below `error_target`, the epoch budget
/// is spent, or the run is cancelled.
///
/// Each epoch measures and records the error first, then checks for
/// convergence, the epoch budget and cancellation, then updates.  The last recorded error therefore
/// always belongs to the final weights.  The history is cleared on entry.
pub(crate) fn train_loop<M: EpochModel>(
    model: &mut M,
    label: &str,
    inputs: &Matrix,
    targets: &Matrix,
    config: &TrainConfig,
) -> Result<TrainingOutcome> {
    let hyper = config.hyper;
    hyper.validate()?;
    model.history_mut().clear_history();

    info!(
        model = label,
        samples = inputs.rows,
        learning_rate = hyper.learning_rate,
        max_epochs = hyper.max_epochs,
        error_target = hyper.error_target,
        "training started"
    );

    let t_start = Instant::now();
    let mut final_error = None;
    let mut epoch = 0;

    let stop_reason = loop {
        let error = model.epoch_error(inputs, targets)?;
        model.history_mut().record_error(error);
        final_error = Some(error);

        if config.log_interval > 0 && epoch % config.log_interval == 0 {
            debug!(model = label, epoch, error, "epoch");
        }

        if let Some(ref tx) = config.progress_tx {
            let stats = EpochStats {
                epoch,
                max_epochs: hyper.max_epochs,
                error,
                elapsed_ms: t_start.elapsed().as_millis() as u64,
            };
            // If the receiver has been dropped, stop training.
            if tx.send(stats).is_err() {
                info!(model = label, epoch, "progress receiver dropped, training cancelled");
                break StopReason::Cancelled;
            }
        }

        if error < hyper.error_target {
            info!(model = label, epoch, error, "converged");
            break StopReason::Converged;
        }
        if epoch >= hyper.max_epochs {
            info!(model = label, epoch, error, "epoch budget exhausted without converging");
            break StopReason::EpochsExhausted;
        }
        if cancel_requested(config) {
            info!(model = label, epoch, error, "training cancelled");
            break StopReason::Cancelled;
        }

        model.update(inputs, targets, hyper.learning_rate)?;
        epoch += 1;
    };

    Ok(TrainingOutcome {
        stop_reason,
        epochs_run: epoch,
        final_error,
        convergence_epoch: (stop_reason == StopReason::Converged).then_some(epoch),
        weights: (),
    })
}

fn cancel_requested(config: &TrainConfig) -> bool {
    config
        .stop_flag
        .as_ref()
        .map_or(false, |flag| flag.load(Ordering::Relaxed))
}
