//! Generational driver for heightmap evolution.

use std::time::Instant;

use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::compute::{GridError, HeightGrid};
use crate::schema::{
    EvolutionConfig, EvolutionConfigError, EvolutionHistory, EvolutionPhase, EvolutionProgress,
    EvolutionStats, FitnessVector,
};

use super::crossover::CrossoverOperator;
use super::fitness::{DegenerateGridError, FitnessEvaluator, rank_indices};
use super::mutation::MutationOperator;
use super::population::{Candidate, Population};
use super::rng::TerrainRng;
use super::selection::SelectionStage;

/// Errors that abort a run.
#[derive(Debug, thiserror::Error)]
pub enum EvolutionError {
    #[error("Invalid evolution configuration: {0}")]
    InvalidConfiguration(#[from] EvolutionConfigError),
    #[error("Cannot score grid: {0}")]
    DegenerateGrid(#[from] DegenerateGridError),
    #[error("Grid operation failed: {0}")]
    Grid(#[from] GridError),
    #[error("Failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
    #[error("Population is empty")]
    EmptyPopulation,
}

/// Outcome of a finished run.
#[derive(Debug, Clone)]
pub struct EvolutionResult {
    /// Top-ranked grid of the final population.
    pub best: HeightGrid,
    /// Its score vector.
    pub best_fitness: FitnessVector,
    pub stats: EvolutionStats,
    pub history: EvolutionHistory,
}

/// Evolution engine that runs the search.
pub struct EvolutionEngine {
    config: EvolutionConfig,
    rng: TerrainRng,
    evaluator: FitnessEvaluator,
    selection: SelectionStage,
    crossover: CrossoverOperator,
    mutation: MutationOperator,
    workers: Option<ThreadPool>,
    population: Population,
    history: EvolutionHistory,
    phase: EvolutionPhase,
    generation: usize,
    evaluations: u64,
    mutated_last_generation: usize,
    next_id: u64,
}

impl EvolutionEngine {
    /// Create a new evolution engine. The configuration is validated here,
    /// before any grid is allocated.
    pub fn new(config: EvolutionConfig) -> Result<Self, EvolutionError> {
        config.validate()?;

        let seed = config.random_seed.unwrap_or_else(rand::random);
        log::debug!("evolution rng seed: {}", seed);

        let workers = match config.evaluation.parallel_workers {
            0 => None,
            n => Some(ThreadPoolBuilder::new().num_threads(n).build()?),
        };

        let selection = SelectionStage::from_fractions(
            config.population.breeder_pool_size(),
            config.selection.elite_fraction,
            config.selection.random_fraction,
        );

        Ok(Self {
            rng: TerrainRng::new(seed),
            evaluator: FitnessEvaluator::new(config.fitness.targets),
            selection,
            crossover: CrossoverOperator::new(config.crossover),
            mutation: MutationOperator::new(&config.mutation),
            workers,
            population: Population::default(),
            history: EvolutionHistory::default(),
            phase: EvolutionPhase::Initializing,
            generation: 0,
            evaluations: 0,
            mutated_last_generation: 0,
            next_id: 0,
            config,
        })
    }

    pub fn config(&self) -> &EvolutionConfig {
        &self.config
    }

    /// Current population. Ranked best-first after each evaluation.
    pub fn population(&self) -> &Population {
        &self.population
    }

    pub fn phase(&self) -> EvolutionPhase {
        self.phase
    }

    /// Generations completed so far.
    pub fn generation(&self) -> usize {
        self.generation
    }

    /// Seed the founding population and reset all run state.
    pub fn initialize(&mut self) -> Result<(), EvolutionError> {
        self.phase = EvolutionPhase::Initializing;
        self.generation = 0;
        self.evaluations = 0;
        self.mutated_last_generation = 0;
        self.history = EvolutionHistory::default();

        let config = &self.config;
        let rng = &mut self.rng;
        self.population = in_pool(self.workers.as_ref(), || {
            Population::seed(
                &config.grid,
                &config.noise,
                config.population.size,
                config.population.seeding,
                rng,
            )
        })?;
        self.next_id = self.population.len() as u64;
        Ok(())
    }

    /// Score every candidate in parallel, then rank the population best-first.
    fn evaluate_population(&mut self) -> Result<(), EvolutionError> {
        self.phase = EvolutionPhase::Evaluating;

        let evaluator = &self.evaluator;
        let population = &self.population;
        let scores = in_pool(self.workers.as_ref(), || {
            evaluator.evaluate_population(population.par_grids())
        })?;
        self.evaluations += scores.len() as u64;

        let order = rank_indices(&scores, &self.config.fitness.ranking);
        if let (Some(best), Some(mean)) = (
            FitnessVector::axis_min(&scores),
            FitnessVector::axis_mean(&scores),
        ) {
            self.history.best_scores.push(best);
            self.history.mean_scores.push(mean);
        }

        self.population.assign_fitness(scores);
        self.population.rank(&order);
        Ok(())
    }

    /// Build exactly `size` offspring from the ranked population.
    ///
    /// Breeder `i` pairs with breeder `len - 1 - i` for the first half of the
    /// pool (the middle breeder of an odd pool pairs with itself). Every pair
    /// runs `children_per_pair` crossovers of two siblings each; pairs repeat
    /// in order until enough offspring exist, and the surplus is dropped.
    fn breed(&mut self) -> Result<Population, EvolutionError> {
        self.phase = EvolutionPhase::Selecting;
        let breeders = self
            .selection
            .select(self.population.candidates(), &mut self.rng);
        if breeders.is_empty() {
            return Err(EvolutionError::EmptyPopulation);
        }

        self.phase = EvolutionPhase::Breeding;
        let size = self.config.population.size;
        let pairs = breeders.len().div_ceil(2);
        let child_generation = self.generation + 1;
        let mut offspring = Vec::with_capacity(size + 2 * self.config.population.children_per_pair);

        while offspring.len() < size {
            for i in 0..pairs {
                let parent1 = &breeders[i];
                let parent2 = &breeders[breeders.len() - 1 - i];
                for _ in 0..self.config.population.children_per_pair {
                    let (child1, child2) =
                        self.crossover
                            .crossover(&parent1.grid, &parent2.grid, &mut self.rng)?;
                    for grid in [child1, child2] {
                        offspring.push(Candidate {
                            id: self.next_id,
                            grid,
                            fitness: None,
                            generation: child_generation,
                            parents: vec![parent1.id, parent2.id],
                        });
                        self.next_id += 1;
                    }
                }
            }
        }
        offspring.truncate(size);

        log::trace!(
            "generation {}: {} breeders in {} pairs",
            child_generation,
            breeders.len(),
            pairs
        );
        Ok(Population::from_candidates(offspring))
    }

    /// Select, breed and mutate one generation. The current population must
    /// already be evaluated and ranked.
    fn step_generation(&mut self) -> Result<(), EvolutionError> {
        let offspring = self.breed()?;

        self.phase = EvolutionPhase::Mutating;
        let (next, mutated) = self
            .mutation
            .mutate_population(offspring, &mut self.rng)?;

        self.population = next;
        self.mutated_last_generation = mutated;
        self.history.mutated.push(mutated);
        self.generation += 1;
        Ok(())
    }

    /// Get current progress.
    pub fn progress(&self) -> EvolutionProgress {
        EvolutionProgress {
            generation: self.generation,
            total_generations: self.config.population.generations,
            phase: self.phase,
            best_fitness: self.population.best().and_then(|c| c.fitness),
            mean_fitness: FitnessVector::axis_mean(
                self.population.iter().filter_map(|c| c.fitness.as_ref()),
            ),
            mutated_last_generation: self.mutated_last_generation,
            history: self.history.clone(),
        }
    }

    /// Run evolution with progress callback.
    ///
    /// The callback fires once the founders are scored, after every
    /// generation, and once more on termination.
    pub fn run_with_callback<F>(&mut self, callback: F) -> Result<EvolutionResult, EvolutionError>
    where
        F: Fn(&EvolutionProgress),
    {
        let start_time = Instant::now();
        let generations = self.config.population.generations;
        log::info!(
            "evolving {} heightmaps of {}x{} for {} generations",
            self.config.population.size,
            self.config.grid.height,
            self.config.grid.width,
            generations
        );

        self.initialize()?;
        self.evaluate_population()?;
        callback(&self.progress());

        while self.generation < generations {
            self.step_generation()?;
            self.evaluate_population()?;

            if let Some(best) = self.population.best().and_then(|c| c.fitness) {
                log::debug!(
                    "generation {}/{}: best {:?}, {} mutated",
                    self.generation,
                    generations,
                    best,
                    self.mutated_last_generation
                );
            }
            callback(&self.progress());
        }

        self.phase = EvolutionPhase::Terminated;
        callback(&self.progress());

        let (best, best_fitness) = self
            .population
            .best()
            .and_then(|c| c.fitness.map(|f| (c.grid.clone(), f)))
            .ok_or(EvolutionError::EmptyPopulation)?;

        let elapsed = start_time.elapsed().as_secs_f64();
        let stats = EvolutionStats {
            generations: self.generation,
            total_evaluations: self.evaluations,
            elapsed_seconds: elapsed,
            evaluations_per_second: if elapsed > 0.0 {
                self.evaluations as f64 / elapsed
            } else {
                0.0
            },
        };
        log::info!(
            "evolution finished after {} generations ({} evaluations in {:.3}s)",
            stats.generations,
            stats.total_evaluations,
            stats.elapsed_seconds
        );

        Ok(EvolutionResult {
            best,
            best_fitness,
            stats,
            history: self.history.clone(),
        })
    }

    /// Run evolution (blocking).
    pub fn run(&mut self) -> Result<EvolutionResult, EvolutionError> {
        self.run_with_callback(|_| {})
    }
}

/// Run `op` inside the dedicated pool, or on the global pool when there is none.
fn in_pool<R, OP>(pool: Option<&ThreadPool>, op: OP) -> R
where
    R: Send,
    OP: FnOnce() -> R + Send,
{
    match pool {
        Some(pool) => pool.install(op),
        None => op(),
    }
}
