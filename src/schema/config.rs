//! Configuration types for heightmap grids and coherent-noise layering.

use serde::{Deserialize, Serialize};

/// Heightmap dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridConfig {
    /// Number of rows (H).
    #[serde(default = "default_grid_side")]
    pub height: usize,
    /// Number of columns (W).
    #[serde(default = "default_grid_side")]
    pub width: usize,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            height: default_grid_side(),
            width: default_grid_side(),
        }
    }
}

fn default_grid_side() -> usize {
    64
}

impl GridConfig {
    /// Get total number of cells (height * width).
    #[inline]
    pub fn cell_count(&self) -> usize {
        self.height * self.width
    }

    /// Validate grid dimensions.
    ///
    /// Both sides must be at least 2 so that every quadrant of the grid is
    /// non-empty during fitness evaluation.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.height <= 1 || self.width <= 1 {
            return Err(ConfigError::InvalidDimensions {
                height: self.height,
                width: self.width,
            });
        }
        Ok(())
    }
}

/// Fractal Perlin noise layering parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NoiseConfig {
    /// Number of noise layers summed together.
    #[serde(default = "default_octaves")]
    pub octaves: u32,
    /// Amplitude multiplier between successive octaves.
    #[serde(default = "default_persistence")]
    pub persistence: f64,
    /// Frequency multiplier between successive octaves.
    #[serde(default = "default_lacunarity")]
    pub lacunarity: f64,
    /// Tiling period along the row axis, in lattice units.
    #[serde(default = "default_repeat")]
    pub repeat_x: u32,
    /// Tiling period along the column axis, in lattice units.
    #[serde(default = "default_repeat")]
    pub repeat_y: u32,
    /// Noise realization offset. Different bases give unrelated fields.
    #[serde(default)]
    pub base: u32,
}

impl Default for NoiseConfig {
    fn default() -> Self {
        Self {
            octaves: default_octaves(),
            persistence: default_persistence(),
            lacunarity: default_lacunarity(),
            repeat_x: default_repeat(),
            repeat_y: default_repeat(),
            base: 0,
        }
    }
}

fn default_octaves() -> u32 {
    8
}
fn default_persistence() -> f64 {
    0.5
}
fn default_lacunarity() -> f64 {
    2.0
}
fn default_repeat() -> u32 {
    1024
}

impl NoiseConfig {
    /// Same layering with a different realization offset.
    pub fn with_base(&self, base: u32) -> Self {
        Self { base, ..*self }
    }

    /// Validate noise parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.octaves == 0 {
            return Err(ConfigError::InvalidOctaves);
        }
        if !self.persistence.is_finite() || self.persistence <= 0.0 {
            return Err(ConfigError::InvalidPersistence(self.persistence));
        }
        if !self.lacunarity.is_finite() || self.lacunarity <= 0.0 {
            return Err(ConfigError::InvalidLacunarity(self.lacunarity));
        }
        if self.repeat_x == 0 || self.repeat_y == 0 {
            return Err(ConfigError::InvalidRepeat {
                repeat_x: self.repeat_x,
                repeat_y: self.repeat_y,
            });
        }
        Ok(())
    }
}

/// Configuration validation errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Grid dimensions must both exceed 1 (got {height}x{width})")]
    InvalidDimensions { height: usize, width: usize },
    #[error("Octave count must be non-zero")]
    InvalidOctaves,
    #[error("Persistence must be finite and positive (got {0})")]
    InvalidPersistence(f64),
    #[error("Lacunarity must be finite and positive (got {0})")]
    InvalidLacunarity(f64),
    #[error("Repeat periods must be non-zero (got {repeat_x}x{repeat_y})")]
    InvalidRepeat { repeat_x: u32, repeat_y: u32 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_valid() {
        assert!(GridConfig::default().validate().is_ok());
        assert!(NoiseConfig::default().validate().is_ok());
    }

    #[test]
    fn test_thin_grid_rejected() {
        for (height, width) in [(1, 8), (8, 1), (0, 0)] {
            let grid = GridConfig { height, width };
            assert!(matches!(
                grid.validate(),
                Err(ConfigError::InvalidDimensions { .. })
            ));
        }
    }

    #[test]
    fn test_noise_validation() {
        let zero_octaves = NoiseConfig {
            octaves: 0,
            ..Default::default()
        };
        assert!(matches!(
            zero_octaves.validate(),
            Err(ConfigError::InvalidOctaves)
        ));

        let bad_lacunarity = NoiseConfig {
            lacunarity: f64::NAN,
            ..Default::default()
        };
        assert!(bad_lacunarity.validate().is_err());

        let no_repeat = NoiseConfig {
            repeat_y: 0,
            ..Default::default()
        };
        assert!(no_repeat.validate().is_err());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let noise: NoiseConfig = serde_json::from_str(r#"{"octaves": 3}"#).unwrap();
        assert_eq!(noise.octaves, 3);
        assert_eq!(noise.repeat_x, 1024);
        assert_eq!(noise.base, 0);
    }
}
