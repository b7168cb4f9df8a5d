use serde::{Serialize, Deserialize};

use crate::error::{Error, Result};

/// Bound applied to sigmoid inputs before exponentiation.
const SIGMOID_CLAMP: f64 = 500.0;

/// Which argument a derivative expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DerivativeInput {
    /// The raw pre-activation `z`.
    PreActivation,
    /// The activated output `f(z)`.
    Output,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivationFunction {
    /// Heaviside step with `{0, 1}` outputs.
    Step,
    /// Sign function with `{-1, 1}` outputs.
    Sign,
    Sigmoid,
    Tanh,
    Linear,
}

/// A registry entry: the `(forward, derivative)` capability pair for one name.
#[derive(Clone, Copy)]
pub struct Activation {
    pub name: &'static str,
    pub kind: ActivationFunction,
    pub forward: fn(f64) -> f64,
    pub derivative: fn(f64) -> f64,
    pub derivative_input: DerivativeInput,
}

impl std::fmt::Debug for Activation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Activation")
            .field("name", &self.name)
            .field("derivative_input", &self.derivative_input)
            .finish()
    }
}

static REGISTRY: [Activation; 5] = [
    Activation {
        name: "step",
        kind: ActivationFunction::Step,
        forward: step,
        derivative: unit_slope,
        derivative_input: DerivativeInput::PreActivation,
    },
    Activation {
        name: "sign",
        kind: ActivationFunction::Sign,
        forward: sign,
        derivative: unit_slope,
        derivative_input: DerivativeInput::PreActivation,
    },
    Activation {
        name: "sigmoid",
        kind: ActivationFunction::Sigmoid,
        forward: sigmoid,
        derivative: sigmoid_derivative,
        derivative_input: DerivativeInput::Output,
    },
    Activation {
        name: "tanh",
        kind: ActivationFunction::Tanh,
        forward: tanh,
        derivative: tanh_derivative,
        derivative_input: DerivativeInput::Output,
    },
    Activation {
        name: "linear",
        kind: ActivationFunction::Linear,
        forward: linear,
        derivative: unit_slope,
        derivative_input: DerivativeInput::PreActivation,
    },
];

/// Looks up an activation by name.
pub fn get_activation(name: &str) -> Result<Activation> {
    REGISTRY
        .iter()
        .find(|a| a.name == name)
        .copied()
        .ok_or_else(|| Error::UnknownActivation {
            name: name.to_string(),
            available: available_activations().iter().map(|s| s.to_string()).collect(),
        })
}

pub fn available_activations() -> Vec<&'static str> {
    REGISTRY.iter().map(|a| a.name).collect()
}

impl ActivationFunction {
    pub fn from_name(name: &str) -> Result<ActivationFunction> {
        get_activation(name).map(|a| a.kind)
    }

    pub fn entry(&self) -> &'static Activation {
        // Every variant has exactly one registry slot.
        match self {
            ActivationFunction::Step => &REGISTRY[0],
            ActivationFunction::Sign => &REGISTRY[1],
            ActivationFunction::Sigmoid => &REGISTRY[2],
            ActivationFunction::Tanh => &REGISTRY[3],
            ActivationFunction::Linear => &REGISTRY[4],
        }
    }

    pub fn name(&self) -> &'static str {
        self.entry().name
    }

    /// Element-wise activation.
    pub fn function(&self, x: f64) -> f64 {
        (self.entry().forward)(x)
    }

    /// Element-wise derivative.  `arg` must follow `derivative_input()`.
    pub fn derivative(&self, arg: f64) -> f64 {
        (self.entry().derivative)(arg)
    }

    pub fn derivative_input(&self) -> DerivativeInput {
        self.entry().derivative_input
    }

    /// Derivative given both sides of the activation; picks the argument the
    /// function expects so callers cannot mix conventions.
    pub fn derivative_at(&self, pre_activation: f64, output: f64) -> f64 {
        match self.derivative_input() {
            DerivativeInput::PreActivation => self.derivative(pre_activation),
            DerivativeInput::Output => self.derivative(output),
        }
    }

    /// Inclusive output range `(low, high)` of the forward function.
    pub fn range(&self) -> (f64, f64) {
        match self {
            ActivationFunction::Step => (0.0, 1.0),
            ActivationFunction::Sign => (-1.0, 1.0),
            ActivationFunction::Sigmoid => (0.0, 1.0),
            ActivationFunction::Tanh => (-1.0, 1.0),
            ActivationFunction::Linear => (f64::NEG_INFINITY, f64::INFINITY),
        }
    }
}

fn step(x: f64) -> f64 {
    if x >= 0.0 { 1.0 } else { 0.0 }
}

fn sign(x: f64) -> f64 {
    if x >= 0.0 { 1.0 } else { -1.0 }
}

/// Perceptron rule: the threshold units pass the error straight through.
fn unit_slope(_x: f64) -> f64 {
    1.0
}

fn sigmoid(x: f64) -> f64 {
    let x = x.clamp(-SIGMOID_CLAMP, SIGMOID_CLAMP);
    1.0 / (1.0 + (-x).exp())
}

/// Takes the sigmoid output `s`.
fn sigmoid_derivative(s: f64) -> f64 {
    s * (1.0 - s)
}

fn tanh(x: f64) -> f64 {
    x.tanh()
}

/// Takes the tanh output `t`.
fn tanh_derivative(t: f64) -> f64 {
    1.0 - t * t
}

fn linear(x: f64) -> f64 {
    x
}
