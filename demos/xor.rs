use std::sync::mpsc;
use std::thread;

use ferrite_perceptron::{Hyperparameters, Matrix, Network, Perceptron, TrainConfig};

fn main() -> ferrite_perceptron::Result<()> {
    tracing_subscriber::fmt().init();

    let inputs = Matrix::from_rows(vec![
        vec![1.0, 0.0],
        vec![1.0, 1.0],
        vec![0.0, 1.0],
        vec![0.0, 0.0],
    ])?;
    let expected_outputs = Matrix::column(&[1.0, 0.0, 1.0, 0.0]);

    // A single threshold unit cannot separate XOR.
    let mut perceptron = Perceptron::new(2, Hyperparameters::new(1.0, 10_000, 0.01), 0)?;
    let outcome = perceptron.train(&inputs, &expected_outputs, "step")?;
    println!(
        "Perceptron: converged = {}, final error = {:?}",
        outcome.converged(),
        outcome.final_error
    );

    let mut network = Network::new(&[2, 4, 1], &["sigmoid", "sigmoid"], 0)?;

    let (tx, rx) = mpsc::channel::<ferrite_perceptron::train::EpochStats>();
    let printer = thread::spawn(move || {
        for stats in rx {
            if stats.epoch % 1000 == 0 {
                println!("Epoch {}: error = {:.6}", stats.epoch, stats.error);
            }
        }
    });

    let config = TrainConfig::new(Hyperparameters::new(0.5, 20_000, 0.001)).with_progress(tx);
    let outcome = network.train(&inputs, &expected_outputs, &config)?;
    drop(config);
    printer.join().ok();

    println!("Network: converged = {} after {} epochs", outcome.converged(), outcome.epochs_run);
    let predictions = network.predict(&inputs)?;
    for (input, output) in inputs.data.iter().zip(predictions.iter()) {
        println!("Input: {:?} -> Output: {:.4}", input, output);
    }
    Ok(())
}
