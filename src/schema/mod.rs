//! Schema module - Configuration, score and progress types for terrain evolution.

mod config;
mod evolution;

pub use config::*;
pub use evolution::*;
