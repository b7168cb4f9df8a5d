// Small demo: a perceptron on the AND gate and an MLP on XOR.
// All training logic lives in the library (src/lib.rs and its modules).
// Set RUST_LOG=debug to see per-epoch progress.
use ferrite_perceptron::{Hyperparameters, Matrix, Network, Perceptron, Result, TrainConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let inputs = Matrix::from_rows(vec![
        vec![0.0, 0.0],
        vec![0.0, 1.0],
        vec![1.0, 0.0],
        vec![1.0, 1.0],
    ])?;

    let and_targets = Matrix::column(&[0.0, 0.0, 0.0, 1.0]);
    let mut perceptron = Perceptron::new(2, Hyperparameters::gate(), 7)?;
    let outcome = perceptron.train(&inputs, &and_targets, "step")?;
    info!(
        converged = outcome.converged(),
        epochs = outcome.epochs_run,
        weights = ?outcome.weights.data,
        "AND perceptron"
    );

    let xor_targets = Matrix::column(&[0.0, 1.0, 1.0, 0.0]);
    let mut network = Network::new(&[2, 4, 1], &["sigmoid", "sigmoid"], 7)?;
    let config = TrainConfig::new(Hyperparameters::new(0.5, 20_000, 0.005)).with_log_interval(1000);
    let outcome = network.train(&inputs, &xor_targets, &config)?;
    info!(
        converged = outcome.converged(),
        epochs = outcome.epochs_run,
        error = ?outcome.final_error,
        "XOR network"
    );
    for (input, output) in inputs.data.iter().zip(network.predict(&inputs)?.iter()) {
        info!(?input, output, "prediction");
    }
    Ok(())
}
