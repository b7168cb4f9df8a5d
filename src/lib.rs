pub mod error;
pub mod math;
pub mod activation;
pub mod layers;
pub mod network;
pub mod perceptron;
pub mod loss;
pub mod eval;
pub mod noise;
pub mod train;

// Convenience re-exports
pub use error::{Error, Result};
pub use math::matrix::Matrix;
pub use math::init::{initialize_weights, InitScheme};
pub use activation::activation::{get_activation, ActivationFunction};
pub use layers::dense::Layer;
pub use network::network::Network;
pub use network::spec::NetworkSpec;
pub use perceptron::perceptron::Perceptron;
pub use loss::mse::MseLoss;
pub use eval::evaluator::{PerformanceEvaluator, Predictor};
pub use eval::metrics::{Metrics, ProblemKind};
pub use noise::noise::{NoiseInjector, NoiseKind};
pub use train::train_config::{Hyperparameters, TrainConfig};
pub use train::outcome::{StopReason, TrainingOutcome};
