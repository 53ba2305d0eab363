//! Evolution configuration types for heightmap refinement.
//!
//! This module provides types for configuring the generational search that
//! turns a population of noise fields into a single refined heightmap, plus the
//! progress and history types reported while it runs.

use serde::{Deserialize, Serialize};

use super::{GridConfig, NoiseConfig};

/// Top-level configuration for an evolution run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvolutionConfig {
    /// Heightmap dimensions.
    #[serde(default)]
    pub grid: GridConfig,
    /// Noise layering used to seed the first generation.
    #[serde(default)]
    pub noise: NoiseConfig,
    /// Population and generation settings.
    #[serde(default)]
    pub population: PopulationConfig,
    /// Mutation settings.
    #[serde(default)]
    pub mutation: MutationConfig,
    /// Crossover strategy.
    #[serde(default)]
    pub crossover: CrossoverStrategy,
    /// Fitness targets and ranking rule.
    #[serde(default)]
    pub fitness: FitnessConfig,
    /// Breeder pool composition.
    #[serde(default)]
    pub selection: SelectionConfig,
    /// Evaluation settings (worker count).
    #[serde(default)]
    pub evaluation: EvaluationConfig,
    /// Window radius, in cells, for neighborhood statistics.
    #[serde(default = "default_locality_radius")]
    pub locality_radius: usize,
    /// Random seed for reproducibility.
    #[serde(default)]
    pub random_seed: Option<u64>,
}

impl Default for EvolutionConfig {
    fn default() -> Self {
        Self {
            grid: GridConfig::default(),
            noise: NoiseConfig::default(),
            population: PopulationConfig::default(),
            mutation: MutationConfig::default(),
            crossover: CrossoverStrategy::default(),
            fitness: FitnessConfig::default(),
            selection: SelectionConfig::default(),
            evaluation: EvaluationConfig::default(),
            locality_radius: default_locality_radius(),
            random_seed: None,
        }
    }
}

fn default_locality_radius() -> usize {
    4
}

/// Population and generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PopulationConfig {
    /// Number of individuals in every generation.
    #[serde(default = "default_population_size")]
    pub size: usize,
    /// Number of generations to run. This is the only stop condition.
    #[serde(default = "default_generations")]
    pub generations: usize,
    /// Crossover invocations per breeding pair. Each invocation yields two
    /// siblings.
    #[serde(default = "default_children_per_pair")]
    pub children_per_pair: usize,
    /// How the first generation is seeded.
    #[serde(default)]
    pub seeding: SeedingStrategy,
}

impl Default for PopulationConfig {
    fn default() -> Self {
        Self {
            size: default_population_size(),
            generations: default_generations(),
            children_per_pair: default_children_per_pair(),
            seeding: SeedingStrategy::default(),
        }
    }
}

impl PopulationConfig {
    /// Breeders needed per generation: `ceil(size / children_per_pair)`.
    pub fn breeder_pool_size(&self) -> usize {
        self.size.div_ceil(self.children_per_pair.max(1))
    }
}

fn default_population_size() -> usize {
    4
}
fn default_generations() -> usize {
    10
}
fn default_children_per_pair() -> usize {
    2
}

/// Seeding strategy for the initial population.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum SeedingStrategy {
    /// Raw fractal noise in roughly [-1, 1].
    #[default]
    Plain,
    /// Noise scaled by 100 with a coarse random offset field on top.
    Perturbed,
}

/// Mutation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MutationConfig {
    /// Chance, in percent (0-100), that an individual is mutated.
    #[serde(default = "default_mutation_chance")]
    pub chance: f64,
    /// Amplitude multiplier applied to the rounded normal draw.
    #[serde(default)]
    pub scale: MutationScale,
}

impl Default for MutationConfig {
    fn default() -> Self {
        Self {
            chance: default_mutation_chance(),
            scale: MutationScale::default(),
        }
    }
}

fn default_mutation_chance() -> f64 {
    30.0
}

/// Fixed amplitude multipliers for mutation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum MutationScale {
    /// Multiplier 20.
    #[default]
    Fine,
    /// Multiplier 100.
    Coarse,
}

impl MutationScale {
    /// Numeric multiplier.
    pub fn factor(self) -> f64 {
        match self {
            Self::Fine => 20.0,
            Self::Coarse => 100.0,
        }
    }
}

/// Crossover strategy.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum CrossoverStrategy {
    /// Per-cell random convex blend of the two parents.
    #[default]
    WeightedBlend,
    /// Children are the sum and the difference of the parents.
    SumDifference,
}

/// Fitness configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FitnessConfig {
    /// Target elevations.
    #[serde(default)]
    pub targets: FitnessTargets,
    /// Rule turning score vectors into a ranking.
    #[serde(default)]
    pub ranking: RankingRule,
}

/// Target elevations for the deviation metrics.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct FitnessTargets {
    /// Ideal elevation for every cell.
    #[serde(default = "default_sea_level")]
    pub sea_level: f64,
    /// Ideal lowest elevation.
    #[serde(default = "default_bedrock")]
    pub bedrock: f64,
    /// Ideal highest elevation.
    #[serde(default = "default_mountain")]
    pub mountain: f64,
}

impl Default for FitnessTargets {
    fn default() -> Self {
        Self {
            sea_level: default_sea_level(),
            bedrock: default_bedrock(),
            mountain: default_mountain(),
        }
    }
}

fn default_sea_level() -> f64 {
    25.0
}
fn default_bedrock() -> f64 {
    -2000.0
}
fn default_mountain() -> f64 {
    3500.0
}

/// One axis of a [`FitnessVector`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum FitnessAxis {
    Balance,
    SeaLevel,
    Bedrock,
    Mountain,
}

impl FitnessAxis {
    /// All axes in vector order.
    pub const ALL: [FitnessAxis; 4] = [
        FitnessAxis::Balance,
        FitnessAxis::SeaLevel,
        FitnessAxis::Bedrock,
        FitnessAxis::Mountain,
    ];
}

/// Rule for ordering individuals by their score vectors.
///
/// Lower is better on every axis.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(tag = "type")]
pub enum RankingRule {
    /// Non-dominated fronts first; inside a front, lowest sum of per-axis ranks.
    #[default]
    Pareto,
    /// Ascending weighted sum of the four axes, in vector order.
    WeightedSum { weights: [f64; 4] },
    /// Compare axes one at a time in the given priority order.
    Lexicographic { priority: Vec<FitnessAxis> },
}

/// Breeder pool composition, as fractions of the pool size.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectionConfig {
    /// Fraction of the pool taken from the top of the ranking (rounded up).
    #[serde(default = "default_elite_fraction")]
    pub elite_fraction: f64,
    /// Fraction of the pool drawn uniformly with replacement (rounded down).
    #[serde(default = "default_random_fraction")]
    pub random_fraction: f64,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            elite_fraction: default_elite_fraction(),
            random_fraction: default_random_fraction(),
        }
    }
}

fn default_elite_fraction() -> f64 {
    0.75
}
fn default_random_fraction() -> f64 {
    0.25
}

/// Evaluation settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct EvaluationConfig {
    /// Number of parallel workers (0 = rayon's global pool).
    #[serde(default)]
    pub parallel_workers: usize,
}

// ============================================================================
// Scores, Progress and History
// ============================================================================

/// Per-individual score vector. Lower is better on every axis.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct FitnessVector {
    /// Sum of quadrant variances minus ten times the global variance.
    pub balance: f64,
    /// Euclidean distance of the whole grid from the sea-level target.
    pub sea_level: f64,
    /// Distance of the lowest cell from the bedrock target.
    pub bedrock: f64,
    /// Distance of the highest cell from the mountain target.
    pub mountain: f64,
}

impl FitnessVector {
    /// Value along one axis.
    pub fn get(&self, axis: FitnessAxis) -> f64 {
        match axis {
            FitnessAxis::Balance => self.balance,
            FitnessAxis::SeaLevel => self.sea_level,
            FitnessAxis::Bedrock => self.bedrock,
            FitnessAxis::Mountain => self.mountain,
        }
    }

    /// Components in vector order.
    pub fn to_array(&self) -> [f64; 4] {
        [self.balance, self.sea_level, self.bedrock, self.mountain]
    }

    /// True if `self` is no worse on every axis and strictly better on one.
    pub fn dominates(&self, other: &FitnessVector) -> bool {
        let a = self.to_array();
        let b = other.to_array();
        a.iter().zip(&b).all(|(x, y)| x <= y) && a.iter().zip(&b).any(|(x, y)| x < y)
    }

    /// Per-axis minimum over a set of vectors.
    pub fn axis_min<'a>(scores: impl IntoIterator<Item = &'a FitnessVector>) -> Option<Self> {
        scores.into_iter().copied().reduce(|acc, s| FitnessVector {
            balance: acc.balance.min(s.balance),
            sea_level: acc.sea_level.min(s.sea_level),
            bedrock: acc.bedrock.min(s.bedrock),
            mountain: acc.mountain.min(s.mountain),
        })
    }

    /// Per-axis mean over a set of vectors.
    pub fn axis_mean<'a>(scores: impl IntoIterator<Item = &'a FitnessVector>) -> Option<Self> {
        let mut count = 0usize;
        let mut sum = [0.0f64; 4];
        for s in scores {
            for (acc, v) in sum.iter_mut().zip(s.to_array()) {
                *acc += v;
            }
            count += 1;
        }
        if count == 0 {
            return None;
        }
        let n = count as f64;
        Some(FitnessVector {
            balance: sum[0] / n,
            sea_level: sum[1] / n,
            bedrock: sum[2] / n,
            mountain: sum[3] / n,
        })
    }
}

/// Current phase of evolution.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum EvolutionPhase {
    /// Seeding the population.
    #[default]
    Initializing,
    /// Scoring candidates.
    Evaluating,
    /// Building the breeder pool.
    Selecting,
    /// Producing offspring.
    Breeding,
    /// Applying mutation.
    Mutating,
    /// All generations done.
    Terminated,
}

/// Evolution history for plotting.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct EvolutionHistory {
    /// Per-axis best score of each evaluated generation.
    pub best_scores: Vec<FitnessVector>,
    /// Per-axis mean score of each evaluated generation.
    pub mean_scores: Vec<FitnessVector>,
    /// Number of mutated individuals per generation.
    pub mutated: Vec<usize>,
}

/// Progress update reported while a run is in flight.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvolutionProgress {
    /// Generations completed so far.
    pub generation: usize,
    /// Total generations planned.
    pub total_generations: usize,
    /// Current phase.
    pub phase: EvolutionPhase,
    /// Score of the top-ranked individual of the last evaluation.
    pub best_fitness: Option<FitnessVector>,
    /// Per-axis mean of the last evaluation.
    pub mean_fitness: Option<FitnessVector>,
    /// Individuals mutated in the last generation.
    pub mutated_last_generation: usize,
    /// Statistics history.
    pub history: EvolutionHistory,
}

/// Statistics from an evolution run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvolutionStats {
    /// Total generations run.
    pub generations: usize,
    /// Total fitness evaluations performed.
    pub total_evaluations: u64,
    /// Time taken (in seconds).
    pub elapsed_seconds: f64,
    /// Evaluations per second.
    pub evaluations_per_second: f64,
}

// ============================================================================
// Validation
// ============================================================================

/// Evolution configuration validation errors.
#[derive(Debug, thiserror::Error)]
pub enum EvolutionConfigError {
    #[error("Population size must be non-zero")]
    EmptyPopulation,
    #[error("Children per pair must be non-zero")]
    NoChildren,
    #[error("Mutation chance must be within 0-100 percent (got {0})")]
    InvalidMutationChance(f64),
    #[error("Invalid selection fractions: {0}")]
    InvalidSelection(String),
    #[error("Invalid ranking rule: {0}")]
    InvalidRanking(String),
    #[error("Fitness target {name} must be finite (got {value})")]
    InvalidFitnessTarget { name: &'static str, value: f64 },
    #[error("Locality radius {radius} exceeds the largest grid side {limit}")]
    InvalidLocalityRadius { radius: usize, limit: usize },
    #[error("Grid/noise config validation failed: {0}")]
    BaseConfigError(#[from] super::ConfigError),
}

impl EvolutionConfig {
    /// Validate evolution configuration.
    pub fn validate(&self) -> Result<(), EvolutionConfigError> {
        self.grid.validate()?;
        self.noise.validate()?;

        if self.population.size == 0 {
            return Err(EvolutionConfigError::EmptyPopulation);
        }
        if self.population.children_per_pair == 0 {
            return Err(EvolutionConfigError::NoChildren);
        }

        let chance = self.mutation.chance;
        if !(0.0..=100.0).contains(&chance) {
            return Err(EvolutionConfigError::InvalidMutationChance(chance));
        }

        let check_fraction = |value: f64, name: &str| {
            if (0.0..=1.0).contains(&value) {
                Ok(())
            } else {
                Err(EvolutionConfigError::InvalidSelection(format!(
                    "{} ({}) must be within [0, 1]",
                    name, value
                )))
            }
        };
        check_fraction(self.selection.elite_fraction, "elite_fraction")?;
        check_fraction(self.selection.random_fraction, "random_fraction")?;
        let pool = self.population.breeder_pool_size() as f64;
        let picked = (pool * self.selection.elite_fraction).ceil()
            + (pool * self.selection.random_fraction).floor();
        if picked < 1.0 {
            return Err(EvolutionConfigError::InvalidSelection(format!(
                "fractions select nobody from a breeder pool of {}",
                pool
            )));
        }

        let targets = &self.fitness.targets;
        for (name, value) in [
            ("sea_level", targets.sea_level),
            ("bedrock", targets.bedrock),
            ("mountain", targets.mountain),
        ] {
            if !value.is_finite() {
                return Err(EvolutionConfigError::InvalidFitnessTarget { name, value });
            }
        }

        let limit = self.grid.height.max(self.grid.width);
        if self.locality_radius > limit {
            return Err(EvolutionConfigError::InvalidLocalityRadius {
                radius: self.locality_radius,
                limit,
            });
        }

        match &self.fitness.ranking {
            RankingRule::Pareto => {}
            RankingRule::WeightedSum { weights } => {
                if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
                    return Err(EvolutionConfigError::InvalidRanking(format!(
                        "weights {:?} must be finite and non-negative",
                        weights
                    )));
                }
            }
            RankingRule::Lexicographic { priority } => {
                if priority.is_empty() {
                    return Err(EvolutionConfigError::InvalidRanking(
                        "lexicographic priority must name at least one axis".to_string(),
                    ));
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ConfigError;

    #[test]
    fn test_default_config_valid() {
        let config = EvolutionConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_configs_fail_fast() {
        let mut config = EvolutionConfig::default();
        config.grid.width = 1;
        assert!(matches!(
            config.validate(),
            Err(EvolutionConfigError::BaseConfigError(
                ConfigError::InvalidDimensions { .. }
            ))
        ));

        let mut config = EvolutionConfig::default();
        config.population.size = 0;
        assert!(matches!(
            config.validate(),
            Err(EvolutionConfigError::EmptyPopulation)
        ));

        let mut config = EvolutionConfig::default();
        config.population.children_per_pair = 0;
        assert!(matches!(
            config.validate(),
            Err(EvolutionConfigError::NoChildren)
        ));

        let mut config = EvolutionConfig::default();
        config.mutation.chance = 101.0;
        assert!(matches!(
            config.validate(),
            Err(EvolutionConfigError::InvalidMutationChance(_))
        ));

        let mut config = EvolutionConfig::default();
        config.fitness.ranking = RankingRule::Lexicographic { priority: vec![] };
        assert!(config.validate().is_err());

        let mut config = EvolutionConfig::default();
        config.selection.elite_fraction = 0.0;
        assert!(matches!(
            config.validate(),
            Err(EvolutionConfigError::InvalidSelection(_))
        ));
    }

    #[test]
    fn test_targets_and_radius_validated() {
        let mut config = EvolutionConfig::default();
        config.fitness.targets.mountain = f64::INFINITY;
        assert!(matches!(
            config.validate(),
            Err(EvolutionConfigError::InvalidFitnessTarget {
                name: "mountain",
                ..
            })
        ));

        let mut config = EvolutionConfig::default();
        config.fitness.targets.sea_level = f64::NAN;
        assert!(matches!(
            config.validate(),
            Err(EvolutionConfigError::InvalidFitnessTarget {
                name: "sea_level",
                ..
            })
        ));

        let mut config = EvolutionConfig::default();
        config.locality_radius = usize::MAX;
        assert!(matches!(
            config.validate(),
            Err(EvolutionConfigError::InvalidLocalityRadius { limit: 64, .. })
        ));

        config.locality_radius = 64;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_breeder_pool_size() {
        let mut population = PopulationConfig::default();
        assert_eq!(population.breeder_pool_size(), 2);
        population.size = 7;
        population.children_per_pair = 3;
        assert_eq!(population.breeder_pool_size(), 3);
    }

    #[test]
    fn test_dominance() {
        let a = FitnessVector {
            balance: -1.0,
            sea_level: 1.0,
            bedrock: 1.0,
            mountain: 1.0,
        };
        let b = FitnessVector {
            balance: -1.0,
            sea_level: 2.0,
            bedrock: 1.0,
            mountain: 1.0,
        };
        assert!(a.dominates(&b));
        assert!(!b.dominates(&a));
        assert!(!a.dominates(&a));
    }

    #[test]
    fn test_axis_reductions() {
        let scores = [
            FitnessVector {
                balance: 1.0,
                sea_level: 4.0,
                bedrock: 0.0,
                mountain: 2.0,
            },
            FitnessVector {
                balance: 3.0,
                sea_level: 2.0,
                bedrock: 2.0,
                mountain: 2.0,
            },
        ];
        let min = FitnessVector::axis_min(&scores).unwrap();
        assert_eq!(min.to_array(), [1.0, 2.0, 0.0, 2.0]);
        let mean = FitnessVector::axis_mean(&scores).unwrap();
        assert_eq!(mean.to_array(), [2.0, 3.0, 1.0, 2.0]);
        assert!(FitnessVector::axis_mean(&[] as &[FitnessVector]).is_none());
    }

    #[test]
    fn test_serialization() {
        let config = EvolutionConfig {
            fitness: FitnessConfig {
                ranking: RankingRule::WeightedSum {
                    weights: [1.0, 0.5, 0.25, 0.25],
                },
                ..Default::default()
            },
            ..Default::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        let parsed: EvolutionConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.population.size, config.population.size);
        assert_eq!(parsed.fitness.ranking, config.fitness.ranking);
    }

    #[test]
    fn test_empty_json_is_default() {
        let parsed: EvolutionConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(parsed.population.children_per_pair, 2);
        assert_eq!(parsed.mutation.chance, 30.0);
        assert_eq!(parsed.fitness.targets.bedrock, -2000.0);
        assert_eq!(parsed.fitness.ranking, RankingRule::Pareto);
    }
}
