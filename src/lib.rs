//! Terrain Evolve - Evolutionary synthesis of terrain heightmaps.
//!
//! This crate seeds a population of coherent-noise heightmaps and refines it
//! over a fixed number of generations against four terrain-quality metrics:
//! quadrant balance, closeness to sea level, depth of the lowest point and
//! height of the highest point.
//!
//! # Architecture
//!
//! The crate is split into two main modules:
//!
//! - `schema`: Configuration types, score vectors and run reports
//! - `compute`: Height grids, noise synthesis and the evolutionary pipeline
//!
//! # Example
//!
//! ```rust,no_run
//! use terrain_evolve::{GridStats, generate};
//!
//! // 64x64 heightmap from 6 noise octaves, default population and generations
//! let heightmap = generate(64, 64, 6)?;
//! let stats = GridStats::from_grid(&heightmap);
//!
//! println!("Elevation range: [{:.1}, {:.1}]", stats.min_value, stats.max_value);
//! # Ok::<(), terrain_evolve::EvolutionError>(())
//! ```

pub mod compute;
pub mod schema;

// Re-export commonly used types
pub use compute::evolution::{EvolutionEngine, EvolutionError, EvolutionResult};
pub use compute::{GridStats, HeightGrid, NoiseFieldGenerator};
pub use schema::{EvolutionConfig, FitnessVector, GridConfig, NoiseConfig};

/// Evolve one `height` x `width` heightmap seeded from `octaves` noise layers.
///
/// Uses the default population (4), generation count (10) and children per
/// pair (2), with a fresh random seed.
pub fn generate(height: usize, width: usize, octaves: u32) -> Result<HeightGrid, EvolutionError> {
    let config = EvolutionConfig {
        grid: GridConfig { height, width },
        noise: NoiseConfig {
            octaves,
            ..Default::default()
        },
        ..Default::default()
    };
    generate_with_config(config)
}

/// Evolve one heightmap with full control over the run.
pub fn generate_with_config(config: EvolutionConfig) -> Result<HeightGrid, EvolutionError> {
    let mut engine = EvolutionEngine::new(config)?;
    Ok(engine.run()?.best)
}
