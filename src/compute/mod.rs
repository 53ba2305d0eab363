//! Compute module - Heightmap buffers, noise synthesis and evolution.

mod grid;
mod noise_field;

pub mod evolution;

pub use grid::*;
pub use noise_field::*;
