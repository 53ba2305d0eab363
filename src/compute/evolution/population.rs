//! Fixed-size populations of candidate heightmaps.

use rayon::prelude::*;

use crate::compute::{GridError, HeightGrid, NoiseFieldGenerator};
use crate::schema::{FitnessVector, GridConfig, NoiseConfig, SeedingStrategy};

use super::rng::TerrainRng;

/// A candidate individual in the population.
#[derive(Debug, Clone)]
pub struct Candidate {
    /// Unique identifier.
    pub id: u64,
    /// The heightmap.
    pub grid: HeightGrid,
    /// Score from the most recent evaluation, if any.
    pub fitness: Option<FitnessVector>,
    /// Generation created.
    pub generation: usize,
    /// Parent IDs.
    pub parents: Vec<u64>,
}

impl Candidate {
    /// A first-generation candidate with no parents.
    pub fn founder(id: u64, grid: HeightGrid) -> Self {
        Self {
            id,
            grid,
            fitness: None,
            generation: 0,
            parents: Vec::new(),
        }
    }
}

/// Ordered candidates of one generation.
///
/// Order is insertion order until [`rank`](Self::rank) is applied, after
/// which index 0 holds the best candidate.
#[derive(Debug, Clone, Default)]
pub struct Population {
    candidates: Vec<Candidate>,
}

impl Population {
    pub fn from_candidates(candidates: Vec<Candidate>) -> Self {
        Self { candidates }
    }

    /// Wrap bare grids as founders with ids `0..len`.
    pub fn from_grids(grids: Vec<HeightGrid>) -> Self {
        Self::from_candidates(
            grids
                .into_iter()
                .enumerate()
                .map(|(i, grid)| Candidate::founder(i as u64, grid))
                .collect(),
        )
    }

    /// Seed `size` founders that share the layering parameters but differ in
    /// noise realization.
    ///
    /// Each founder's base is `noise.base` offset by a draw from `rng`. All
    /// draws happen on the calling thread before any field is generated, so
    /// the result depends only on the rng state.
    pub fn seed(
        grid: &GridConfig,
        noise: &NoiseConfig,
        size: usize,
        strategy: SeedingStrategy,
        rng: &mut TerrainRng,
    ) -> Result<Self, GridError> {
        let bases: Vec<u32> = (0..size)
            .map(|_| noise.base.wrapping_add(rng.noise_base()))
            .collect();

        let grids = match strategy {
            SeedingStrategy::Plain => bases
                .par_iter()
                .map(|&base| NoiseFieldGenerator.generate(grid, &noise.with_base(base)))
                .collect(),
            SeedingStrategy::Perturbed => bases
                .iter()
                .map(|&base| {
                    NoiseFieldGenerator.generate_perturbed(grid, &noise.with_base(base), rng)
                })
                .collect::<Result<Vec<_>, _>>()?,
        };

        log::debug!(
            "seeded {} founders ({:?}, {}x{})",
            size,
            strategy,
            grid.height,
            grid.width
        );
        Ok(Self::from_grids(grids))
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Candidate> {
        self.candidates.iter()
    }

    /// Grids in population order, for parallel evaluation.
    pub fn par_grids(&self) -> impl IndexedParallelIterator<Item = &HeightGrid> {
        self.candidates.par_iter().map(|c| &c.grid)
    }

    /// Scores in population order. `None` for unevaluated candidates.
    pub fn scores(&self) -> Vec<Option<FitnessVector>> {
        self.candidates.iter().map(|c| c.fitness).collect()
    }

    /// Attach one score per candidate, in population order.
    pub fn assign_fitness(&mut self, scores: Vec<FitnessVector>) {
        for (candidate, score) in self.candidates.iter_mut().zip(scores) {
            candidate.fitness = Some(score);
        }
    }

    /// Reorder by a best-first permutation of indices.
    pub fn rank(&mut self, order: &[usize]) {
        let mut slots: Vec<Option<Candidate>> =
            std::mem::take(&mut self.candidates).into_iter().map(Some).collect();
        self.candidates = order.iter().filter_map(|&i| slots[i].take()).collect();
    }

    /// First candidate. After ranking, the best one.
    pub fn best(&self) -> Option<&Candidate> {
        self.candidates.first()
    }

    pub fn into_candidates(self) -> Vec<Candidate> {
        self.candidates
    }
}

impl IntoIterator for Population {
    type Item = Candidate;
    type IntoIter = std::vec::IntoIter<Candidate>;

    fn into_iter(self) -> Self::IntoIter {
        self.candidates.into_iter()
    }
}
