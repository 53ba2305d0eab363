//! Height grid - Bounded 2D elevation buffer.
//!
//! All arithmetic returns a freshly allocated grid; nothing here mutates a grid
//! through a shared reference, so operators can never alias population slots.

use std::ops::Range;

use rayon::prelude::*;

/// Grid shape and arithmetic errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GridError {
    #[error("Buffer of {len} values cannot form a {height}x{width} grid")]
    LengthMismatch {
        height: usize,
        width: usize,
        len: usize,
    },
    #[error("Grid shapes differ: {left:?} vs {right:?}")]
    ShapeMismatch {
        left: (usize, usize),
        right: (usize, usize),
    },
}

/// H x W matrix of elevations, stored row-major: index = row * width + col.
#[derive(Debug, Clone, PartialEq)]
pub struct HeightGrid {
    data: Vec<f64>,
    height: usize,
    width: usize,
}

impl HeightGrid {
    /// Grid with every cell set to `value`.
    pub fn filled(height: usize, width: usize, value: f64) -> Self {
        Self {
            data: vec![value; height * width],
            height,
            width,
        }
    }

    /// Wrap a row-major buffer.
    pub fn from_vec(height: usize, width: usize, data: Vec<f64>) -> Result<Self, GridError> {
        if data.len() != height * width {
            return Err(GridError::LengthMismatch {
                height,
                width,
                len: data.len(),
            });
        }
        Ok(Self {
            data,
            height,
            width,
        })
    }

    /// Build a grid cell by cell, in row-major order.
    pub fn from_fn(height: usize, width: usize, mut f: impl FnMut(usize, usize) -> f64) -> Self {
        let mut data = Vec::with_capacity(height * width);
        for row in 0..height {
            for col in 0..width {
                data.push(f(row, col));
            }
        }
        Self {
            data,
            height,
            width,
        }
    }

    /// Build a grid with rows computed in parallel. `f` must be pure.
    pub fn par_from_fn<F>(height: usize, width: usize, f: F) -> Self
    where
        F: Fn(usize, usize) -> f64 + Sync,
    {
        let mut data = vec![0.0f64; height * width];
        if width > 0 {
            data.par_chunks_mut(width)
                .enumerate()
                .for_each(|(row, cells)| {
                    for (col, cell) in cells.iter_mut().enumerate() {
                        *cell = f(row, col);
                    }
                });
        }
        Self {
            data,
            height,
            width,
        }
    }

    /// Number of rows.
    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Number of columns.
    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    /// (rows, columns).
    #[inline]
    pub fn shape(&self) -> (usize, usize) {
        (self.height, self.width)
    }

    /// Total number of cells.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Row-major view of the cells.
    #[inline]
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// Consume the grid, returning its row-major buffer.
    pub fn into_vec(self) -> Vec<f64> {
        self.data
    }

    /// Value at (row, col).
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data[row * self.width + col]
    }

    /// Set value at (row, col).
    #[inline]
    pub fn set(&mut self, row: usize, col: usize, value: f64) {
        self.data[row * self.width + col] = value;
    }

    /// Apply `f` to every cell.
    pub fn map(&self, f: impl Fn(f64) -> f64) -> Self {
        Self {
            data: self.data.iter().map(|&v| f(v)).collect(),
            height: self.height,
            width: self.width,
        }
    }

    /// Combine two same-shaped grids cell by cell.
    pub fn zip_map(
        &self,
        other: &HeightGrid,
        f: impl Fn(f64, f64) -> f64,
    ) -> Result<Self, GridError> {
        self.check_shape(other)?;
        Ok(Self {
            data: self
                .data
                .iter()
                .zip(&other.data)
                .map(|(&a, &b)| f(a, b))
                .collect(),
            height: self.height,
            width: self.width,
        })
    }

    /// Elementwise sum.
    pub fn add(&self, other: &HeightGrid) -> Result<Self, GridError> {
        self.zip_map(other, |a, b| a + b)
    }

    /// Elementwise difference.
    pub fn sub(&self, other: &HeightGrid) -> Result<Self, GridError> {
        self.zip_map(other, |a, b| a - b)
    }

    /// Multiply every cell by `factor`.
    pub fn scale(&self, factor: f64) -> Self {
        self.map(|v| v * factor)
    }

    /// `self + factor * other`.
    pub fn add_scaled(&self, other: &HeightGrid, factor: f64) -> Result<Self, GridError> {
        self.zip_map(other, |a, b| a + factor * b)
    }

    /// Error unless both grids have the same shape.
    pub fn check_shape(&self, other: &HeightGrid) -> Result<(), GridError> {
        if self.shape() != other.shape() {
            return Err(GridError::ShapeMismatch {
                left: self.shape(),
                right: other.shape(),
            });
        }
        Ok(())
    }

    /// Smallest cell (+inf for an empty grid).
    pub fn min(&self) -> f64 {
        self.data.iter().copied().fold(f64::INFINITY, f64::min)
    }

    /// Largest cell (-inf for an empty grid).
    pub fn max(&self) -> f64 {
        self.data.iter().copied().fold(f64::NEG_INFINITY, f64::max)
    }

    /// Arithmetic mean (NaN for an empty grid).
    pub fn mean(&self) -> f64 {
        self.data.iter().sum::<f64>() / self.data.len() as f64
    }

    /// Population variance (divides by the cell count).
    pub fn variance(&self) -> f64 {
        let mean = self.mean();
        self.data.iter().map(|&v| (v - mean).powi(2)).sum::<f64>() / self.data.len() as f64
    }

    /// Population standard deviation.
    pub fn std(&self) -> f64 {
        self.variance().sqrt()
    }

    /// Euclidean (Frobenius) norm.
    pub fn norm(&self) -> f64 {
        self.data.iter().map(|&v| v * v).sum::<f64>().sqrt()
    }

    /// Rescale so the smallest cell maps to 0 and the largest to 1.
    ///
    /// A constant grid has no spread to stretch and maps to 0.5 everywhere.
    pub fn normalized(&self) -> Self {
        let min = self.min();
        let range = self.max() - min;
        if range > 0.0 && range.is_finite() {
            self.map(|v| (v - min) / range)
        } else {
            self.map(|_| 0.5)
        }
    }

    /// Copy of a rectangular sub-region. Ranges are clamped to the grid.
    pub fn region(&self, rows: Range<usize>, cols: Range<usize>) -> Self {
        let rows = rows.start.min(self.height)..rows.end.min(self.height);
        let cols = cols.start.min(self.width)..cols.end.min(self.width);
        let height = rows.len();
        let width = cols.len();

        let mut data = Vec::with_capacity(height * width);
        for row in rows {
            let start = row * self.width;
            data.extend_from_slice(&self.data[start + cols.start..start + cols.end]);
        }
        Self {
            data,
            height,
            width,
        }
    }

    /// The four quadrants split at the midpoint row and column:
    /// top-left, top-right, bottom-left, bottom-right.
    pub fn quadrants(&self) -> [HeightGrid; 4] {
        let mid_row = self.height / 2;
        let mid_col = self.width / 2;
        [
            self.region(0..mid_row, 0..mid_col),
            self.region(0..mid_row, mid_col..self.width),
            self.region(mid_row..self.height, 0..mid_col),
            self.region(mid_row..self.height, mid_col..self.width),
        ]
    }

    /// Position of the first NaN or infinite cell, if any.
    pub fn first_non_finite(&self) -> Option<(usize, usize)> {
        self.data
            .iter()
            .position(|v| !v.is_finite())
            .map(|idx| (idx / self.width, idx % self.width))
    }

    /// Local roughness around (row, col) over a window of `radius` cells,
    /// clamped at the grid edges. `None` if the center lies outside the grid.
    pub fn neighborhood(
        &self,
        row: usize,
        col: usize,
        radius: usize,
    ) -> Option<NeighborhoodStats> {
        if row >= self.height || col >= self.width {
            return None;
        }
        let center = self.get(row, col);
        let row_end = row.saturating_add(radius).saturating_add(1).min(self.height);
        let col_end = col.saturating_add(radius).saturating_add(1).min(self.width);
        let rows = row.saturating_sub(radius)..row_end;
        let cols = col.saturating_sub(radius)..col_end;

        let mut total_difference = 0.0f64;
        let mut total_height = 0.0f64;
        let mut count = 0usize;
        for r in rows {
            for c in cols.clone() {
                let v = self.get(r, c);
                total_difference += (v - center).abs();
                total_height += v;
                count += 1;
            }
        }

        Some(NeighborhoodStats {
            total_difference,
            mean_height: total_height / count as f64,
            cells: count,
        })
    }
}

/// Neighborhood statistics around one cell.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct NeighborhoodStats {
    /// Sum of absolute differences from the center elevation.
    pub total_difference: f64,
    /// Mean elevation of the window.
    pub mean_height: f64,
    /// Cells in the (clamped) window.
    pub cells: usize,
}

/// Grid statistics for monitoring.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct GridStats {
    pub height: usize,
    pub width: usize,
    pub min_value: f64,
    pub max_value: f64,
    pub mean_value: f64,
    pub std_dev: f64,
}

impl GridStats {
    /// Compute statistics from a grid.
    pub fn from_grid(grid: &HeightGrid) -> Self {
        Self {
            height: grid.height(),
            width: grid.width(),
            min_value: grid.min(),
            max_value: grid.max(),
            mean_value: grid.mean(),
            std_dev: grid.std(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(height: usize, width: usize) -> HeightGrid {
        HeightGrid::from_fn(height, width, |r, c| (r * width + c) as f64)
    }

    #[test]
    fn test_from_vec_checks_length() {
        assert!(HeightGrid::from_vec(2, 3, vec![0.0; 6]).is_ok());
        assert_eq!(
            HeightGrid::from_vec(2, 3, vec![0.0; 5]),
            Err(GridError::LengthMismatch {
                height: 2,
                width: 3,
                len: 5
            })
        );
    }

    #[test]
    fn test_par_from_fn_matches_from_fn() {
        let f = |r: usize, c: usize| (r as f64).sin() + c as f64 * 0.5;
        assert_eq!(HeightGrid::par_from_fn(7, 5, f), HeightGrid::from_fn(7, 5, f));
    }

    #[test]
    fn test_reductions() {
        let grid = HeightGrid::from_vec(2, 2, vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        assert_eq!(grid.min(), 1.0);
        assert_eq!(grid.max(), 4.0);
        assert!((grid.mean() - 2.5).abs() < 1e-12);
        assert!((grid.variance() - 1.25).abs() < 1e-12);
        assert!((grid.norm() - 30.0f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_arithmetic_leaves_inputs_untouched() {
        let a = ramp(3, 3);
        let b = HeightGrid::filled(3, 3, 2.0);
        let a_before = a.clone();

        let sum = a.add(&b).unwrap();
        let diff = a.sub(&b).unwrap();

        assert_eq!(a, a_before);
        assert_eq!(sum.get(1, 1), 6.0);
        assert_eq!(diff.get(1, 1), 2.0);
        assert_eq!(a.add_scaled(&b, 0.5).unwrap().get(0, 0), 1.0);
    }

    #[test]
    fn test_shape_mismatch() {
        let a = HeightGrid::filled(2, 3, 0.0);
        let b = HeightGrid::filled(3, 2, 0.0);
        assert!(matches!(a.add(&b), Err(GridError::ShapeMismatch { .. })));
    }

    #[test]
    fn test_region_is_a_copy() {
        let grid = ramp(4, 4);
        let mut sub = grid.region(1..3, 2..4);
        assert_eq!(sub.shape(), (2, 2));
        assert_eq!(sub.as_slice(), &[6.0, 7.0, 10.0, 11.0]);

        sub.set(0, 0, -1.0);
        assert_eq!(grid.get(1, 2), 6.0);
    }

    #[test]
    fn test_quadrants_cover_odd_grid() {
        let grid = ramp(5, 3);
        let quads = grid.quadrants();
        assert_eq!(quads[0].shape(), (2, 1));
        assert_eq!(quads[1].shape(), (2, 2));
        assert_eq!(quads[2].shape(), (3, 1));
        assert_eq!(quads[3].shape(), (3, 2));
        let cells: usize = quads.iter().map(HeightGrid::len).sum();
        assert_eq!(cells, grid.len());
    }

    #[test]
    fn test_normalized() {
        let grid = HeightGrid::from_vec(1, 3, vec![2.0, 4.0, 6.0]).unwrap();
        assert_eq!(grid.normalized().as_slice(), &[0.0, 0.5, 1.0]);
        let flat = HeightGrid::filled(2, 2, 7.0);
        assert!(flat.normalized().as_slice().iter().all(|&v| v == 0.5));
    }

    #[test]
    fn test_first_non_finite() {
        let mut grid = HeightGrid::filled(3, 3, 1.0);
        assert_eq!(grid.first_non_finite(), None);
        grid.set(2, 1, f64::NAN);
        assert_eq!(grid.first_non_finite(), Some((2, 1)));
    }

    #[test]
    fn test_neighborhood_clamps_at_edges() {
        let grid = ramp(4, 4);
        let corner = grid.neighborhood(0, 0, 1).unwrap();
        assert_eq!(corner.cells, 4);
        // Window holds 0, 1, 4, 5
        assert!((corner.total_difference - 10.0).abs() < 1e-12);
        assert!((corner.mean_height - 2.5).abs() < 1e-12);

        let inner = grid.neighborhood(1, 1, 1).unwrap();
        assert_eq!(inner.cells, 9);

        let flat = HeightGrid::filled(4, 4, 3.0).neighborhood(2, 2, 4).unwrap();
        assert_eq!(flat.total_difference, 0.0);
        assert_eq!(flat.mean_height, 3.0);
    }

    #[test]
    fn test_neighborhood_huge_radius_covers_grid() {
        let grid = ramp(3, 5);
        let whole = grid.neighborhood(2, 4, usize::MAX).unwrap();
        assert_eq!(whole.cells, 15);
        assert!((whole.mean_height - 7.0).abs() < 1e-12);
    }

    #[test]
    fn test_neighborhood_outside_grid() {
        let grid = ramp(3, 3);
        assert_eq!(grid.neighborhood(3, 0, 1), None);
        assert_eq!(grid.neighborhood(0, 7, 1), None);
    }
}
