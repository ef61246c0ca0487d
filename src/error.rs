//! Error types shared by the whole crate.

use thiserror::Error;

/// The result type used throughout the playground engine.
pub type Result<T> = std::result::Result<T, Error>;

/// Failures surfaced by the network, the trainer and config loading.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    /// A feature vector does not match the width of the network input layer.
    #[error("input has {got} features but the network expects {expected}")]
    InputSize { expected: usize, got: usize },

    /// Introspection of a hidden neuron that does not exist.
    #[error("no hidden neuron {neuron} in layer {layer}")]
    NodeOutOfRange { layer: usize, neuron: usize },

    /// A network shape that cannot be built.
    #[error("invalid architecture: {0}")]
    InvalidArchitecture(String),

    /// A configuration value outside its allowed range.
    #[error("invalid config: {0}")]
    InvalidConfig(String),
}
