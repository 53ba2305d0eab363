//! Random source for evolutionary operators.
//!
//! Every stochastic step (noise bases, selection draws, blend weights,
//! mutation) takes this wrapper explicitly; nothing reseeds global state.

use rand::prelude::*;

use crate::compute::HeightGrid;

/// Random number generator wrapper for terrain operators.
pub struct TerrainRng {
    rng: StdRng,
}

impl TerrainRng {
    /// Create from seed.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Uniform sample in [0, 1).
    pub fn unit(&mut self) -> f64 {
        self.rng.r#gen::<f64>()
    }

    /// Normal sample with mean 0 and the given standard deviation.
    pub fn normal(&mut self, std_dev: f64) -> f64 {
        let z: f64 = self.rng.sample(rand_distr::StandardNormal);
        z * std_dev
    }

    /// Grid of independent uniform [0, 1) samples, drawn in row-major order.
    pub fn uniform_grid(&mut self, height: usize, width: usize) -> HeightGrid {
        HeightGrid::from_fn(height, width, |_, _| self.rng.r#gen::<f64>())
    }

    /// Pick one element uniformly.
    pub fn choose<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        items.choose(&mut self.rng)
    }

    /// Shuffle in place.
    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        items.shuffle(&mut self.rng);
    }

    /// Fresh noise realization offset.
    pub fn noise_base(&mut self) -> u32 {
        self.rng.r#gen()
    }
}
