//! Fitness evaluation and ranking for heightmap candidates.
//!
//! A grid is scored on four independent axes (lower is better on each), and
//! a [`RankingRule`] turns a set of score vectors into a total order.

use std::cmp::Ordering;

use rayon::prelude::*;

use crate::compute::HeightGrid;
use crate::schema::{FitnessAxis, FitnessTargets, FitnessVector, RankingRule};

/// Weight applied to the whole-grid variance in the balance metric.
const GLOBAL_VARIANCE_WEIGHT: f64 = 10.0;

/// Grid that cannot be scored meaningfully.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DegenerateGridError {
    #[error("Grid {height}x{width} is too small to split into four non-empty quadrants")]
    TooSmall { height: usize, width: usize },
    #[error("Grid holds non-finite value {value} at ({row}, {col})")]
    NonFinite { row: usize, col: usize, value: f64 },
    #[error("Score on axis {axis:?} is not finite")]
    NonFiniteScore { axis: FitnessAxis },
}

/// Scores grids against the configured elevation targets.
#[derive(Debug, Clone, Default)]
pub struct FitnessEvaluator {
    targets: FitnessTargets,
}

impl FitnessEvaluator {
    /// Create a new fitness evaluator.
    pub fn new(targets: FitnessTargets) -> Self {
        Self { targets }
    }

    /// Targets in use.
    pub fn targets(&self) -> &FitnessTargets {
        &self.targets
    }

    /// Score a single grid.
    pub fn score(&self, grid: &HeightGrid) -> Result<FitnessVector, DegenerateGridError> {
        let (height, width) = grid.shape();
        if height < 2 || width < 2 {
            return Err(DegenerateGridError::TooSmall { height, width });
        }
        if let Some((row, col)) = grid.first_non_finite() {
            return Err(DegenerateGridError::NonFinite {
                row,
                col,
                value: grid.get(row, col),
            });
        }

        let score = FitnessVector {
            balance: quadrant_balance(grid),
            sea_level: sea_level_deviation(grid, self.targets.sea_level),
            bedrock: (grid.min() - self.targets.bedrock).abs(),
            mountain: (grid.max() - self.targets.mountain).abs(),
        };
        // Finite cells can still overflow the variance or the norm.
        if let Some(&axis) = FitnessAxis::ALL
            .iter()
            .find(|&&axis| !score.get(axis).is_finite())
        {
            return Err(DegenerateGridError::NonFiniteScore { axis });
        }
        Ok(score)
    }

    /// Score every grid in parallel. Fails on the first degenerate grid.
    pub fn evaluate_population<'a, I>(
        &self,
        grids: I,
    ) -> Result<Vec<FitnessVector>, DegenerateGridError>
    where
        I: IntoParallelIterator<Item = &'a HeightGrid>,
    {
        grids
            .into_par_iter()
            .map(|grid| self.score(grid))
            .collect()
    }
}

/// Sum of the four quadrant variances minus ten times the global variance.
fn quadrant_balance(grid: &HeightGrid) -> f64 {
    let local: f64 = grid.quadrants().iter().map(HeightGrid::variance).sum();
    local - GLOBAL_VARIANCE_WEIGHT * grid.variance()
}

/// Euclidean norm of `grid - target`.
fn sea_level_deviation(grid: &HeightGrid, target: f64) -> f64 {
    grid.as_slice()
        .iter()
        .map(|&v| (v - target).powi(2))
        .sum::<f64>()
        .sqrt()
}

/// Order individuals best-first. Returns indices into `scores`.
///
/// Ties keep their original relative order.
pub fn rank_indices(scores: &[FitnessVector], rule: &RankingRule) -> Vec<usize> {
    let mut order: Vec<usize> = (0..scores.len()).collect();

    match rule {
        RankingRule::WeightedSum { weights } => {
            let keys: Vec<f64> = scores
                .iter()
                .map(|s| s.to_array().iter().zip(weights).map(|(v, w)| v * w).sum())
                .collect();
            order.sort_by(|&a, &b| keys[a].total_cmp(&keys[b]));
        }
        RankingRule::Lexicographic { priority } => {
            order.sort_by(|&a, &b| {
                priority
                    .iter()
                    .map(|&axis| scores[a].get(axis).total_cmp(&scores[b].get(axis)))
                    .find(|o| *o != Ordering::Equal)
                    .unwrap_or(Ordering::Equal)
            });
        }
        RankingRule::Pareto => {
            let fronts = pareto_fronts(scores);
            let borda = axis_rank_sums(scores);
            order.sort_by(|&a, &b| fronts[a].cmp(&fronts[b]).then(borda[a].cmp(&borda[b])));
        }
    }

    order
}

/// Non-dominated front index per individual (0 = not dominated by anyone).
pub fn pareto_fronts(scores: &[FitnessVector]) -> Vec<usize> {
    let n = scores.len();
    let mut domination_count = vec![0usize; n];
    let mut dominated: Vec<Vec<usize>> = vec![Vec::new(); n];

    for i in 0..n {
        for j in 0..n {
            if i == j {
                continue;
            }
            if scores[i].dominates(&scores[j]) {
                dominated[i].push(j);
            } else if scores[j].dominates(&scores[i]) {
                domination_count[i] += 1;
            }
        }
    }

    let mut front_of = vec![0usize; n];
    let mut current: Vec<usize> = (0..n).filter(|&i| domination_count[i] == 0).collect();
    let mut front = 0;
    while !current.is_empty() {
        let mut next = Vec::new();
        for &i in &current {
            front_of[i] = front;
            for &j in &dominated[i] {
                domination_count[j] -= 1;
                if domination_count[j] == 0 {
                    next.push(j);
                }
            }
        }
        front += 1;
        current = next;
    }

    front_of
}

/// Per individual, the number of (individual, axis) pairs that beat it.
fn axis_rank_sums(scores: &[FitnessVector]) -> Vec<usize> {
    scores
        .iter()
        .map(|s| {
            FitnessAxis::ALL
                .iter()
                .map(|&axis| {
                    scores
                        .iter()
                        .filter(|other| other.get(axis) < s.get(axis))
                        .count()
                })
                .sum()
        })
        .collect()
}
