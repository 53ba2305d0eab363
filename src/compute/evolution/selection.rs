//! Breeder selection: elitism plus uniform random picks.

use super::rng::TerrainRng;

/// Elite and random counts for one breeder pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionStage {
    /// Individuals taken in rank order from the top.
    pub num_from_top: usize,
    /// Individuals drawn uniformly, with replacement, from the whole ranking.
    pub num_from_random: usize,
}

impl SelectionStage {
    /// Counts for a pool of `pool_size`: the elite share rounded up and the
    /// random share rounded down.
    pub fn from_fractions(pool_size: usize, elite_fraction: f64, random_fraction: f64) -> Self {
        Self {
            num_from_top: (pool_size as f64 * elite_fraction).ceil() as usize,
            num_from_random: (pool_size as f64 * random_fraction).floor() as usize,
        }
    }

    /// Total individuals this stage asks for.
    pub fn pool_size(&self) -> usize {
        self.num_from_top + self.num_from_random
    }

    /// Build a shuffled breeder pool from a best-first ranking.
    ///
    /// The elite count is clamped to the ranking length, and random draws are
    /// skipped when the ranking is empty, so the pool may come out smaller
    /// than [`pool_size`](Self::pool_size).
    pub fn select<T: Clone>(&self, ranked: &[T], rng: &mut TerrainRng) -> Vec<T> {
        let mut pool: Vec<T> = ranked.iter().take(self.num_from_top).cloned().collect();

        for _ in 0..self.num_from_random {
            if let Some(pick) = rng.choose(ranked) {
                pool.push(pick.clone());
            }
        }

        rng.shuffle(&mut pool);
        pool
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_fractions() {
        let stage = SelectionStage::from_fractions(2, 0.75, 0.25);
        assert_eq!(stage.num_from_top, 2);
        assert_eq!(stage.num_from_random, 0);

        let stage = SelectionStage::from_fractions(10, 0.75, 0.25);
        assert_eq!(stage.num_from_top, 8);
        assert_eq!(stage.num_from_random, 2);
        assert_eq!(stage.pool_size(), 10);
    }

    #[test]
    fn test_pure_elitism_returns_top_set() {
        let ranked: Vec<u32> = (0..10).collect();
        let stage = SelectionStage {
            num_from_top: 10,
            num_from_random: 0,
        };
        let mut rng = TerrainRng::new(5);
        let mut pool = stage.select(&ranked, &mut rng);
        pool.sort_unstable();
        assert_eq!(pool, ranked);
    }

    #[test]
    fn test_elite_subset_and_random_members() {
        let ranked: Vec<u32> = (0..20).collect();
        let stage = SelectionStage {
            num_from_top: 3,
            num_from_random: 5,
        };
        let mut rng = TerrainRng::new(11);
        let pool = stage.select(&ranked, &mut rng);

        assert_eq!(pool.len(), 8);
        for elite in 0..3 {
            assert!(pool.contains(&elite));
        }
        assert!(pool.iter().all(|v| ranked.contains(v)));
    }

    #[test]
    fn test_mismatched_counts_tolerated() {
        let ranked = vec!['a', 'b'];
        let stage = SelectionStage {
            num_from_top: 5,
            num_from_random: 1,
        };
        let mut rng = TerrainRng::new(0);
        assert_eq!(stage.select(&ranked, &mut rng).len(), 3);

        let empty: Vec<char> = Vec::new();
        assert!(stage.select(&empty, &mut rng).is_empty());
    }
}
