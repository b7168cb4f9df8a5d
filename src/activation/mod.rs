pub mod activation;

pub use activation::{
    available_activations, get_activation, Activation, ActivationFunction, DerivativeInput,
};
