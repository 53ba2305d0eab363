//! Probability-gated noise injection.
//!
//! A mutated grid receives `k * U`, where `U` is a uniform [0, 1) field and
//! `k = round(N(0, sqrt(std(grid)))) * scale`. Rough terrain therefore draws
//! larger perturbations than flat terrain, and a perfectly flat grid draws none.

use crate::compute::{GridError, HeightGrid};
use crate::schema::{MutationConfig, MutationScale};

use super::population::{Candidate, Population};
use super::rng::TerrainRng;

/// Outcome of mutating one individual.
#[derive(Debug, Clone)]
pub struct Mutation {
    /// The (possibly unchanged) grid.
    pub grid: HeightGrid,
    /// Amplitude `k` that was applied, or `None` if the gate skipped this grid.
    pub amplitude: Option<f64>,
}

impl Mutation {
    /// True if the probability gate selected this individual.
    pub fn attempted(&self) -> bool {
        self.amplitude.is_some()
    }
}

/// Applies mutation at a configured chance and scale.
#[derive(Debug, Clone)]
pub struct MutationOperator {
    chance: f64,
    scale: MutationScale,
}

impl Default for MutationOperator {
    fn default() -> Self {
        Self::new(&MutationConfig::default())
    }
}

impl MutationOperator {
    pub fn new(config: &MutationConfig) -> Self {
        Self {
            chance: config.chance,
            scale: config.scale,
        }
    }

    /// Perturb `grid` unconditionally, returning the new grid and `k`.
    pub fn perturb(
        &self,
        grid: &HeightGrid,
        rng: &mut TerrainRng,
    ) -> Result<(HeightGrid, f64), GridError> {
        let spread = grid.std().sqrt();
        let amplitude = rng.normal(spread).round() * self.scale.factor();
        let mask = rng.uniform_grid(grid.height(), grid.width());
        Ok((grid.add_scaled(&mask, amplitude)?, amplitude))
    }

    /// Mutate with probability `chance` percent; otherwise return the grid as is.
    pub fn mutate(&self, grid: HeightGrid, rng: &mut TerrainRng) -> Result<Mutation, GridError> {
        if rng.unit() * 100.0 < self.chance {
            let (mutated, amplitude) = self.perturb(&grid, rng)?;
            log::trace!("mutated individual with amplitude {}", amplitude);
            Ok(Mutation {
                grid: mutated,
                amplitude: Some(amplitude),
            })
        } else {
            Ok(Mutation {
                grid,
                amplitude: None,
            })
        }
    }

    /// Mutate every individual independently. Returns the new population and
    /// how many individuals passed the probability gate.
    pub fn mutate_population(
        &self,
        population: Population,
        rng: &mut TerrainRng,
    ) -> Result<(Population, usize), GridError> {
        let mut mutated = 0;
        let mut next = Vec::with_capacity(population.len());
        for candidate in population {
            let outcome = self.mutate(candidate.grid, rng)?;
            if outcome.attempted() {
                mutated += 1;
            }
            next.push(Candidate {
                grid: outcome.grid,
                fitness: None,
                ..candidate
            });
        }
        Ok((Population::from_candidates(next), mutated))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rough_grids() -> Vec<HeightGrid> {
        (0..6)
            .map(|i| {
                HeightGrid::from_fn(8, 8, |r, c| ((r * 8 + c + i) % 7) as f64 * 300.0 - 900.0)
            })
            .collect()
    }

    fn operator(chance: f64, scale: MutationScale) -> MutationOperator {
        MutationOperator::new(&MutationConfig { chance, scale })
    }

    #[test]
    fn test_zero_chance_is_identity() {
        let grids = rough_grids();
        let mut rng = TerrainRng::new(17);
        let (next, mutated) = operator(0.0, MutationScale::Fine)
            .mutate_population(Population::from_grids(grids.clone()), &mut rng)
            .unwrap();
        assert_eq!(mutated, 0);
        assert_eq!(next.len(), grids.len());
        for (candidate, grid) in next.iter().zip(&grids) {
            assert_eq!(&candidate.grid, grid);
        }
    }

    #[test]
    fn test_full_chance_mutates_everyone() {
        let grids = rough_grids();
        let op = operator(100.0, MutationScale::Fine);
        let mut rng = TerrainRng::new(17);

        for grid in &grids {
            let outcome = op.mutate(grid.clone(), &mut rng).unwrap();
            let amplitude = outcome.amplitude.expect("gate must always pass at 100%");
            if amplitude != 0.0 {
                assert_ne!(&outcome.grid, grid);
            } else {
                assert_eq!(&outcome.grid, grid);
            }
        }

        let population = Population::from_grids(grids.clone());
        let (next, mutated) = op.mutate_population(population, &mut rng).unwrap();
        assert_eq!(mutated, grids.len());
        let ids: Vec<u64> = next.iter().map(|c| c.id).collect();
        assert_eq!(ids, (0..grids.len() as u64).collect::<Vec<_>>());
    }

    #[test]
    fn test_amplitude_is_multiple_of_scale() {
        let grid = rough_grids().remove(0);
        let mut rng = TerrainRng::new(4);
        for scale in [MutationScale::Fine, MutationScale::Coarse] {
            let op = operator(100.0, scale);
            for _ in 0..8 {
                let (_, k) = op.perturb(&grid, &mut rng).unwrap();
                let units = k / scale.factor();
                assert_eq!(units, units.round());
            }
        }
    }

    #[test]
    fn test_flat_grid_not_perturbed() {
        let flat = HeightGrid::filled(5, 5, 42.0);
        let mut rng = TerrainRng::new(8);
        let (grid, k) = MutationOperator::default().perturb(&flat, &mut rng).unwrap();
        assert_eq!(k, 0.0);
        assert_eq!(grid, flat);
    }

    #[test]
    fn test_perturbation_is_one_sided() {
        let grid = rough_grids().remove(1);
        let mut rng = TerrainRng::new(23);
        let (mutated, k) = operator(100.0, MutationScale::Coarse)
            .perturb(&grid, &mut rng)
            .unwrap();
        for (&after, &before) in mutated.as_slice().iter().zip(grid.as_slice()) {
            let delta = after - before;
            assert!(delta * k.signum() >= -1e-9);
            assert!(delta.abs() <= k.abs() + 1e-9);
        }
    }
}
