//! A small neural network playground: two-class 2D datasets, engineered
//! input features, a fully connected network trained by mini-batch gradient
//! descent, and a frame-driven training loop.

pub mod activator;
pub mod config;
pub mod dataset;
pub mod error;
pub mod features;
pub mod feed_forward;
pub mod layers;
pub mod playground;
pub mod regularization;
pub mod schedule;
pub mod trainer;
pub mod training_loop;

mod utils;

pub use crate::config::{Action, NodeId, PlaygroundConfig};
pub use crate::error::{Error, Result};
pub use crate::playground::Playground;
pub use crate::training_loop::{LoopState, TrainingLoop};
