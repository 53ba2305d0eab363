//! Coherent noise fields for seeding the population.
//!
//! Each cell samples fractal Brownian motion over 2D Perlin noise at the
//! normalized coordinate (row / height, col / width). The Perlin source is
//! rebuilt from `base` on every call, so generation is a pure function of its
//! parameters.

use noise::{NoiseFn, Perlin};

use crate::compute::evolution::TerrainRng;
use crate::compute::{GridError, HeightGrid};
use crate::schema::{GridConfig, NoiseConfig};

/// Scale applied to the raw field by [`NoiseFieldGenerator::generate_perturbed`].
const PERTURBED_FIELD_SCALE: f64 = 100.0;
/// Amplitude multiplier for the perturbation mask.
const PERTURBED_MASK_SCALE: f64 = 100.0;

/// Generates coherent-noise height grids.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoiseFieldGenerator;

impl NoiseFieldGenerator {
    /// Generate one noise grid. Rows are computed in parallel.
    pub fn generate(&self, grid: &GridConfig, noise: &NoiseConfig) -> HeightGrid {
        let perlin = Perlin::new(noise.base);
        let h = grid.height as f64;
        let w = grid.width as f64;

        HeightGrid::par_from_fn(grid.height, grid.width, |row, col| {
            fbm(&perlin, row as f64 / h, col as f64 / w, noise)
        })
    }

    /// Noise grid scaled by 100 with a coarse random offset field added.
    ///
    /// The offset amplitude is `round(N(0, 3 * std)) * 100` times a uniform
    /// [0, 1) mask, where `std` is the spread of the scaled field.
    pub fn generate_perturbed(
        &self,
        grid: &GridConfig,
        noise: &NoiseConfig,
        rng: &mut TerrainRng,
    ) -> Result<HeightGrid, GridError> {
        let field = self.generate(grid, noise).scale(PERTURBED_FIELD_SCALE);
        let amplitude = rng.normal(3.0 * field.std()).round() * PERTURBED_MASK_SCALE;
        let mask = rng.uniform_grid(grid.height, grid.width);

        field.add_scaled(&mask, amplitude)
    }
}

/// Fractal sum of Perlin octaves, normalized by the total amplitude.
///
/// Octave `k` samples at frequency `lacunarity^k` with amplitude
/// `persistence^k`. Each octave tiles with period `repeat * frequency` in its
/// scaled coordinates, so the whole field repeats every `repeat` units.
fn fbm(perlin: &Perlin, x: f64, y: f64, noise: &NoiseConfig) -> f64 {
    let mut total = 0.0;
    let mut amplitude = 1.0;
    let mut frequency = 1.0;
    let mut max_value = 0.0;

    for _ in 0..noise.octaves {
        total += amplitude
            * tiled_sample(
                perlin,
                x * frequency,
                y * frequency,
                noise.repeat_x as f64 * frequency,
                noise.repeat_y as f64 * frequency,
            );
        max_value += amplitude;
        amplitude *= noise.persistence;
        frequency *= noise.lacunarity;
    }

    total / max_value
}

/// Perlin sample made periodic in both axes.
///
/// Blends the four copies of the field shifted by one period, weighted
/// bilinearly by the position inside the tile, so the value at `x` and at
/// `x + period_x` coincide and the field is continuous across tile edges.
fn tiled_sample(perlin: &Perlin, x: f64, y: f64, period_x: f64, period_y: f64) -> f64 {
    let x = x.rem_euclid(period_x);
    let y = y.rem_euclid(period_y);
    let u = x / period_x;
    let v = y / period_y;

    perlin.get([x, y]) * (1.0 - u) * (1.0 - v)
        + perlin.get([x - period_x, y]) * u * (1.0 - v)
        + perlin.get([x, y - period_y]) * (1.0 - u) * v
        + perlin.get([x - period_x, y - period_y]) * u * v
}
