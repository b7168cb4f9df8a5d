use serde::{Serialize, Deserialize};

use crate::activation::activation::ActivationFunction;
use crate::error::{Error, Result};

/// A fully serializable description of a network architecture.
///
/// `widths` lists every layer boundary `[n0, n1, ..., nk]`, so a spec with
/// `k + 1` widths describes `k` layers and needs exactly `k` activations.
/// The seed drives the Xavier initialization of every layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkSpec {
    pub widths: Vec<usize>,
    pub activations: Vec<ActivationFunction>,
    #[serde(default)]
    pub seed: u64,
}

impl NetworkSpec {
    /// Resolves activation names and checks that the spec describes a network.
    pub fn new(widths: &[usize], activations: &[&str], seed: u64) -> Result<NetworkSpec> {
        let activations = activations.iter()
            .map(|name| ActivationFunction::from_name(name))
            .collect::<Result<Vec<_>>>()?;
        let spec = NetworkSpec { widths: widths.to_vec(), activations, seed };
        spec.validate()?;
        Ok(spec)
    }

    /// Same activation on every layer.
    pub fn uniform(widths: &[usize], activation: ActivationFunction, seed: u64) -> Result<NetworkSpec> {
        let layers = widths.len().saturating_sub(1);
        let spec = NetworkSpec { widths: widths.to_vec(), activations: vec![activation; layers], seed };
        spec.validate()?;
        Ok(spec)
    }

    pub fn num_layers(&self) -> usize {
        self.widths.len().saturating_sub(1)
    }

    pub fn validate(&self) -> Result<()> {
        if self.widths.len() < 2 {
            return Err(Error::InvalidArchitecture(format!(
                "need at least 2 widths (input and output), got {:?}", self.widths
            )));
        }
        if let Some(i) = self.widths.iter().position(|&w| w == 0) {
            return Err(Error::InvalidArchitecture(format!("width {i} is zero in {:?}", self.widths)));
        }
        if self.activations.len() != self.num_layers() {
            return Err(Error::InvalidArchitecture(format!(
                "{} layers need {} activations, got {}",
                self.num_layers(), self.num_layers(), self.activations.len()
            )));
        }
        Ok(())
    }

    /// Serializes the spec to a pretty-printed JSON file.
    pub fn save_json(&self, path: &str) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = std::io::BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    /// Deserializes and validates a `NetworkSpec` from a JSON file.
    pub fn load_json(path: &str) -> Result<NetworkSpec> {
        let file = std::fs::File::open(path)?;
        let reader = std::io::BufReader::new(file);
        let spec: NetworkSpec = serde_json::from_reader(reader)?;
        spec.validate()?;
        Ok(spec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_width_is_invalid() {
        assert!(matches!(NetworkSpec::new(&[2], &[], 0), Err(Error::InvalidArchitecture(_))));
    }

    #[test]
    fn activation_count_must_match_layers() {
        let err = NetworkSpec::new(&[2, 4, 1], &["sigmoid"], 0).unwrap_err();
        assert!(matches!(err, Error::InvalidArchitecture(_)));
    }

    #[test]
    fn unknown_activation_is_reported() {
        let err = NetworkSpec::new(&[2, 1], &["relu"], 0).unwrap_err();
        assert!(matches!(err, Error::UnknownActivation { .. }));
    }

    #[test]
    fn parses_from_json_with_default_seed() {
        let spec: NetworkSpec =
            serde_json::from_str(r#"{"widths":[2,3,1],"activations":["tanh","sigmoid"]}"#).unwrap();
        assert_eq!(spec.seed, 0);
        assert_eq!(spec.activations, vec![ActivationFunction::Tanh, ActivationFunction::Sigmoid]);
        assert!(spec.validate().is_ok());
    }
}
