//! Evolutionary refinement of terrain heightmaps.
//!
//! # Overview
//!
//! A run seeds a population of coherent-noise grids and then repeats, for a
//! fixed number of generations:
//!
//! - **Fitness** (`fitness`): score each grid on four axes and rank the
//!   population with the configured [`RankingRule`](crate::schema::RankingRule)
//! - **Selection** (`selection`): elite plus random breeders, shuffled
//! - **Crossover** (`crossover`): pairs of breeders produce sibling grids
//! - **Mutation** (`mutation`): probability-gated noise injection
//!
//! The final population is scored once more and its top grid is returned.
//! Every random draw goes through one [`TerrainRng`], so a fixed
//! `random_seed` reproduces a run exactly.
//!
//! # Example
//!
//! ```rust,no_run
//! use terrain_evolve::compute::evolution::EvolutionEngine;
//! use terrain_evolve::schema::EvolutionConfig;
//!
//! let config = EvolutionConfig {
//!     random_seed: Some(7),
//!     ..Default::default()
//! };
//!
//! let mut engine = EvolutionEngine::new(config)?;
//! let result = engine.run_with_callback(|progress| {
//!     println!("Generation {}: best = {:?}", progress.generation, progress.best_fitness);
//! })?;
//!
//! println!("Best heightmap: {}x{}", result.best.height(), result.best.width());
//! # Ok::<(), terrain_evolve::compute::evolution::EvolutionError>(())
//! ```

mod crossover;
mod fitness;
mod mutation;
mod population;
mod rng;
mod search;
mod selection;

pub use crossover::CrossoverOperator;
pub use fitness::{DegenerateGridError, FitnessEvaluator, pareto_fronts, rank_indices};
pub use mutation::{Mutation, MutationOperator};
pub use population::{Candidate, Population};
pub use rng::TerrainRng;
pub use search::{EvolutionEngine, EvolutionError, EvolutionResult};
pub use selection::SelectionStage;
