//! Crossover operators combining two parent grids.
//!
//! Both strategies borrow the parents and return two newly allocated children,
//! so a parent that is also a surviving elite is never modified.

use crate::compute::{GridError, HeightGrid};
use crate::schema::CrossoverStrategy;

use super::rng::TerrainRng;

/// Applies the configured crossover strategy.
#[derive(Debug, Clone, Copy, Default)]
pub struct CrossoverOperator {
    strategy: CrossoverStrategy,
}

impl CrossoverOperator {
    pub fn new(strategy: CrossoverStrategy) -> Self {
        Self { strategy }
    }

    pub fn strategy(&self) -> CrossoverStrategy {
        self.strategy
    }

    /// Produce two siblings from two parents of the same shape.
    pub fn crossover(
        &self,
        parent1: &HeightGrid,
        parent2: &HeightGrid,
        rng: &mut TerrainRng,
    ) -> Result<(HeightGrid, HeightGrid), GridError> {
        parent1.check_shape(parent2)?;
        match self.strategy {
            CrossoverStrategy::WeightedBlend => weighted_blend(parent1, parent2, rng),
            CrossoverStrategy::SumDifference => sum_difference(parent1, parent2),
        }
    }
}

/// Per-cell convex blends with two independent weight fields.
///
/// Each weight field is uniform [0, 1) stretched to span [0, 1] exactly.
/// `child = parent1 * w + parent2 * (1 - w)`, once per field, both children
/// taken from the original parents.
fn weighted_blend(
    parent1: &HeightGrid,
    parent2: &HeightGrid,
    rng: &mut TerrainRng,
) -> Result<(HeightGrid, HeightGrid), GridError> {
    let (height, width) = parent1.shape();
    let blend = |rng: &mut TerrainRng| -> Result<HeightGrid, GridError> {
        let weights = rng.uniform_grid(height, width).normalized();
        let first = parent1.zip_map(&weights, |p, w| p * w)?;
        let second = parent2.zip_map(&weights, |p, w| p * (1.0 - w))?;
        first.add(&second)
    };

    let child1 = blend(&mut *rng)?;
    let child2 = blend(rng)?;
    Ok((child1, child2))
}

/// `(parent1 + parent2, parent1 - parent2)`.
fn sum_difference(
    parent1: &HeightGrid,
    parent2: &HeightGrid,
) -> Result<(HeightGrid, HeightGrid), GridError> {
    Ok((parent1.add(parent2)?, parent1.sub(parent2)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn parents() -> (HeightGrid, HeightGrid) {
        let p1 = HeightGrid::from_fn(6, 5, |r, c| (r * 5 + c) as f64 * 10.0 - 100.0);
        let p2 = HeightGrid::from_fn(6, 5, |r, c| ((r + 2) * (c + 1)) as f64 * -3.0);
        (p1, p2)
    }

    #[test]
    fn test_sum_difference() {
        let (p1, p2) = parents();
        let op = CrossoverOperator::new(CrossoverStrategy::SumDifference);
        let mut rng = TerrainRng::new(1);
        let (c1, c2) = op.crossover(&p1, &p2, &mut rng).unwrap();

        assert_eq!(c1.get(2, 3), p1.get(2, 3) + p2.get(2, 3));
        assert_eq!(c2.get(2, 3), p1.get(2, 3) - p2.get(2, 3));
        assert_ne!(c1, c2);
    }

    #[test]
    fn test_parents_untouched() {
        let (p1, p2) = parents();
        let (p1_before, p2_before) = (p1.clone(), p2.clone());
        let mut rng = TerrainRng::new(9);
        for strategy in [
            CrossoverStrategy::WeightedBlend,
            CrossoverStrategy::SumDifference,
        ] {
            let (c1, c2) = CrossoverOperator::new(strategy)
                .crossover(&p1, &p2, &mut rng)
                .unwrap();
            assert_eq!(c1.shape(), p1.shape());
            assert_eq!(c2.shape(), p1.shape());
        }
        assert_eq!(p1, p1_before);
        assert_eq!(p2, p2_before);
    }

    #[test]
    fn test_weighted_blend_stays_between_parents() {
        let (p1, p2) = parents();
        let op = CrossoverOperator::new(CrossoverStrategy::WeightedBlend);
        let mut rng = TerrainRng::new(21);
        let (c1, c2) = op.crossover(&p1, &p2, &mut rng).unwrap();

        for child in [&c1, &c2] {
            for ((&c, &a), &b) in child
                .as_slice()
                .iter()
                .zip(p1.as_slice())
                .zip(p2.as_slice())
            {
                assert!(c >= a.min(b) - 1e-9 && c <= a.max(b) + 1e-9);
            }
        }
        // Independent weight fields give distinct siblings.
        assert_ne!(c1, c2);
    }

    #[test]
    fn test_blend_of_identical_parents() {
        let p = HeightGrid::filled(4, 4, 12.5);
        let op = CrossoverOperator::new(CrossoverStrategy::WeightedBlend);
        let mut rng = TerrainRng::new(2);
        let (c1, c2) = op.crossover(&p, &p, &mut rng).unwrap();
        for v in c1.as_slice().iter().chain(c2.as_slice()) {
            assert!((v - 12.5).abs() < 1e-9);
        }
    }

    #[test]
    fn test_shape_mismatch() {
        let a = HeightGrid::filled(4, 4, 0.0);
        let b = HeightGrid::filled(4, 5, 0.0);
        let mut rng = TerrainRng::new(0);
        assert!(CrossoverOperator::default().crossover(&a, &b, &mut rng).is_err());
    }

    proptest! {
        #[test]
        fn prop_sum_difference_round_trip(
            values in proptest::collection::vec((-5.0e3f64..5.0e3, -5.0e3f64..5.0e3), 16)
        ) {
            let (a, b): (Vec<f64>, Vec<f64>) = values.into_iter().unzip();
            let p1 = HeightGrid::from_vec(4, 4, a).unwrap();
            let p2 = HeightGrid::from_vec(4, 4, b).unwrap();
            let op = CrossoverOperator::new(CrossoverStrategy::SumDifference);
            let mut rng = TerrainRng::new(0);
            let (c1, c2) = op.crossover(&p1, &p2, &mut rng).unwrap();

            let r1 = c1.add(&c2).unwrap().scale(0.5);
            let r2 = c1.sub(&c2).unwrap().scale(0.5);
            for (x, y) in r1.as_slice().iter().zip(p1.as_slice()) {
                prop_assert!((x - y).abs() < 1e-9);
            }
            for (x, y) in r2.as_slice().iter().zip(p2.as_slice()) {
                prop_assert!((x - y).abs() < 1e-9);
            }
        }
    }
}
