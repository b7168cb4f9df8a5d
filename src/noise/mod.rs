pub mod noise;

pub use noise::{signal_to_noise_ratio, snr_improvement, NoiseInjector, NoiseKind, BINARIZE_THRESHOLD};
