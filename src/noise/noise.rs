use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Serialize, Deserialize};
use std::f64::consts::PI;

use crate::error::{Error, Result};
use crate::math::matrix::Matrix;

/// Perturbation applied to every element independently.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NoiseKind {
    /// With probability `p`, replaces `x` by `1 - x` (flips binary pixels).
    BitFlip { p: f64 },
    /// Adds N(0, std_dev).  With `binarize` the sum is thresholded at 0.5,
    /// so binary bitmaps stay binary.
    Gaussian {
        std_dev: f64,
        #[serde(default = "binarize_by_default")]
        binarize: bool,
    },
    /// With probability `p`, sets the element to 0.
    Dropout { p: f64 },
    /// With probability `p/2` sets 1, then with probability `p/2` sets 0.
    SaltPepper { p: f64 },
}

const NOISE_NAMES: [&str; 4] = ["bit_flip", "gaussian", "dropout", "salt_pepper"];

/// Cut-off used to re-binarize Gaussian-perturbed values.
pub const BINARIZE_THRESHOLD: f64 = 0.5;

fn binarize_by_default() -> bool {
    true
}

impl NoiseKind {
    /// Builds a kind from its name and a single level parameter.
    /// `"gaussian"` re-binarizes its output.
    pub fn from_name(name: &str, level: f64) -> Result<NoiseKind> {
        let kind = match name {
            "bit_flip" => NoiseKind::BitFlip { p: level },
            "gaussian" => NoiseKind::Gaussian { std_dev: level, binarize: true },
            "dropout" => NoiseKind::Dropout { p: level },
            "salt_pepper" => NoiseKind::SaltPepper { p: level },
            _ => {
                return Err(Error::UnknownNoise {
                    name: name.to_string(),
                    available: NOISE_NAMES.iter().map(|s| s.to_string()).collect(),
                })
            }
        };
        kind.validate()?;
        Ok(kind)
    }

    fn validate(&self) -> Result<()> {
        match *self {
            NoiseKind::BitFlip { p } | NoiseKind::Dropout { p } | NoiseKind::SaltPepper { p } => {
                if !(0.0..=1.0).contains(&p) {
                    return Err(Error::InvalidParameter(format!("noise probability {p} outside [0, 1]")));
                }
            }
            NoiseKind::Gaussian { std_dev, .. } => {
                if !(std_dev >= 0.0 && std_dev.is_finite()) {
                    return Err(Error::InvalidParameter(format!("noise std_dev {std_dev} must be finite and >= 0")));
                }
            }
        }
        Ok(())
    }
}

/// Produces perturbed copies of input tensors for robustness evaluation.
/// Owns its generator; the same seed reproduces the same perturbations.
pub struct NoiseInjector {
    rng: StdRng,
}

impl NoiseInjector {
    pub fn new(seed: u64) -> Self {
        NoiseInjector { rng: StdRng::seed_from_u64(seed) }
    }

    /// Returns a perturbed copy; `data` is left untouched.
    pub fn apply(&mut self, data: &Matrix, kind: NoiseKind) -> Result<Matrix> {
        kind.validate()?;
        let mut noisy = data.clone();
        for x in noisy.data.iter_mut().flatten() {
            *x = self.perturb(*x, kind);
        }
        Ok(noisy)
    }

    fn perturb(&mut self, x: f64, kind: NoiseKind) -> f64 {
        let rng = &mut self.rng;
        match kind {
            NoiseKind::BitFlip { p } => if rng.gen::<f64>() < p { 1.0 - x } else { x },
            NoiseKind::Gaussian { std_dev, binarize } => {
                let y = x + sample_standard_normal(rng) * std_dev;
                if !binarize {
                    y
                } else if y > BINARIZE_THRESHOLD {
                    1.0
                } else {
                    0.0
                }
            }
            NoiseKind::Dropout { p } => if rng.gen::<f64>() < p { 0.0 } else { x },
            NoiseKind::SaltPepper { p } => {
                let salt = rng.gen::<f64>() < p / 2.0;
                let pepper = rng.gen::<f64>() < p / 2.0;
                if pepper { 0.0 } else if salt { 1.0 } else { x }
            }
        }
    }
}

/// Samples a single value from N(0, 1) using the Box-Muller transform.
fn sample_standard_normal<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    // Draw two independent uniform samples in (0, 1] to avoid log(0).
    let u1: f64 = 1.0 - rng.gen::<f64>();
    let u2: f64 = 1.0 - rng.gen::<f64>();
    (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos()
}

/// Signal-to-noise ratio in dB; 0 when either power is 0.
pub fn signal_to_noise_ratio(clean: &Matrix, noisy: &Matrix) -> Result<f64> {
    if clean.shape() != noisy.shape() {
        return Err(Error::shape("signal to noise ratio", clean.shape(), noisy.shape()));
    }
    if clean.is_empty() {
        return Ok(0.0);
    }
    let n = clean.len() as f64;
    let signal = clean.iter().map(|x| x * x).sum::<f64>() / n;
    let noise = clean.iter().zip(noisy.iter()).map(|(c, d)| (c - d).powi(2)).sum::<f64>() / n;
    if signal == 0.0 || noise == 0.0 {
        return Ok(0.0);
    }
    let snr = 10.0 * (signal / noise).log10();
    Ok(if snr.is_finite() { snr } else { 0.0 })
}

/// SNR gain of a reconstruction over the noisy input it was built from.
pub fn snr_improvement(clean: &Matrix, noisy: &Matrix, reconstructed: &Matrix) -> Result<f64> {
    Ok(signal_to_noise_ratio(clean, reconstructed)? - signal_to_noise_ratio(clean, noisy)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ones(rows: usize, cols: usize) -> Matrix {
        Matrix::zeros(rows, cols).map(|_| 1.0)
    }

    #[test]
    fn zero_level_leaves_data_intact() {
        let data = ones(4, 4);
        let mut injector = NoiseInjector::new(1);
        for kind in [
            NoiseKind::BitFlip { p: 0.0 },
            NoiseKind::Gaussian { std_dev: 0.0, binarize: false },
            NoiseKind::Gaussian { std_dev: 0.0, binarize: true },
            NoiseKind::Dropout { p: 0.0 },
            NoiseKind::SaltPepper { p: 0.0 },
        ] {
            assert_eq!(injector.apply(&data, kind).unwrap(), data);
        }
    }

    #[test]
    fn full_bit_flip_inverts_binary_data() {
        let data = Matrix::from_data(vec![vec![0.0, 1.0], vec![1.0, 0.0]]);
        let flipped = NoiseInjector::new(7).apply(&data, NoiseKind::BitFlip { p: 1.0 }).unwrap();
        assert_eq!(flipped.data, vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
    }

    #[test]
    fn full_dropout_zeroes_everything() {
        let out = NoiseInjector::new(7).apply(&ones(3, 3), NoiseKind::Dropout { p: 1.0 }).unwrap();
        assert!(out.iter().all(|&x| x == 0.0));
    }

    #[test]
    fn same_seed_same_noise() {
        let data = ones(5, 5);
        let kind = NoiseKind::Gaussian { std_dev: 0.3, binarize: false };
        let a = NoiseInjector::new(42).apply(&data, kind).unwrap();
        let b = NoiseInjector::new(42).apply(&data, kind).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, data);
    }

    fn checkerboard() -> Matrix {
        Matrix::from_data((0..4).map(|r| (0..4).map(|c| ((r + c) % 2) as f64).collect()).collect())
    }

    #[test]
    fn binarized_gaussian_keeps_bitmaps_binary() {
        let data = checkerboard();
        let kind = NoiseKind::from_name("gaussian", 0.4).unwrap();
        assert_eq!(kind, NoiseKind::Gaussian { std_dev: 0.4, binarize: true });
        let noisy = NoiseInjector::new(5).apply(&data, kind).unwrap();
        assert!(noisy.iter().all(|&x| x == 0.0 || x == 1.0));
    }

    #[test]
    fn raw_gaussian_leaves_real_values() {
        let data = checkerboard();
        let kind = NoiseKind::Gaussian { std_dev: 0.2, binarize: false };
        let noisy = NoiseInjector::new(5).apply(&data, kind).unwrap();
        assert!(noisy.iter().all(|&x| x != 0.0 && x != 1.0));
    }

    #[test]
    fn gaussian_binarizes_unless_told_otherwise() {
        let kind: NoiseKind = serde_json::from_str(r#"{"kind":"gaussian","std_dev":0.1}"#).unwrap();
        assert_eq!(kind, NoiseKind::Gaussian { std_dev: 0.1, binarize: true });
    }

    #[test]
    fn invalid_levels_are_rejected() {
        assert!(matches!(NoiseKind::from_name("dropout", 1.5), Err(Error::InvalidParameter(_))));
        assert!(matches!(NoiseKind::from_name("gaussian", -0.1), Err(Error::InvalidParameter(_))));
        assert!(matches!(NoiseKind::from_name("speckle", 0.1), Err(Error::UnknownNoise { .. })));
    }

    #[test]
    fn snr_is_zero_for_identical_signals() {
        let data = ones(2, 2);
        assert_eq!(signal_to_noise_ratio(&data, &data).unwrap(), 0.0);
    }

    #[test]
    fn snr_improvement_is_positive_for_better_reconstruction() {
        let clean = ones(1, 4);
        let noisy = Matrix::from_data(vec![vec![0.0, 1.0, 0.0, 1.0]]);
        let reconstructed = Matrix::from_data(vec![vec![1.0, 1.0, 0.5, 1.0]]);
        assert!(snr_improvement(&clean, &noisy, &reconstructed).unwrap() > 0.0);
    }
}
