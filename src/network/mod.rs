pub mod network;
pub mod spec;

pub use network::{Network, NetworkInfo};
pub use spec::NetworkSpec;
