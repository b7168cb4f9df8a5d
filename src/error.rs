//! Error types for the training engine.

use thiserror::Error;

/// Result type alias for this crate.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// An activation name that is not in the registry.
    #[error("unknown activation '{name}', available: {}", available.join(", "))]
    UnknownActivation { name: String, available: Vec<String> },

    /// Layer widths / activation list that cannot describe a network.
    #[error("invalid architecture: {0}")]
    InvalidArchitecture(String),

    /// Tensor shapes that do not fit the configured model or each other.
    #[error("shape mismatch in {context}: expected {expected}, found {found}")]
    ShapeMismatch {
        context: &'static str,
        expected: String,
        found: String,
    },

    /// A numeric argument outside its valid domain.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("unknown preset '{name}', available: {}", available.join(", "))]
    UnknownPreset { name: String, available: Vec<String> },

    #[error("unknown noise kind '{name}', available: {}", available.join(", "))]
    UnknownNoise { name: String, available: Vec<String> },

    /// `backward` was called without a forward pass since the last update.
    #[error("no forward pass cached for layer {layer}; call forward before backward")]
    MissingForwardPass { layer: usize },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Builds a `ShapeMismatch` from two `(rows, cols)` pairs.
    pub fn shape(context: &'static str, expected: (usize, usize), found: (usize, usize)) -> Self {
        Error::ShapeMismatch {
            context,
            expected: format!("{}x{}", expected.0, expected.1),
            found: format!("{}x{}", found.0, found.1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_activation_lists_valid_names() {
        let err = Error::UnknownActivation {
            name: "relu".to_string(),
            available: vec!["step".to_string(), "sigmoid".to_string()],
        };
        assert_eq!(err.to_string(), "unknown activation 'relu', available: step, sigmoid");
    }

    #[test]
    fn shape_helper_formats_dimensions() {
        let err = Error::shape("predict", (4, 2), (4, 3));
        assert_eq!(err.to_string(), "shape mismatch in predict: expected 4x2, found 4x3");
    }
}
