//! Regular lat/lon grids of meteorological values.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{GridError, GridResult};

/// Fill value written by the hourly source files (`1.0e+20`).
pub const DEFAULT_FILL_VALUE: f32 = 1.0e20;

/// Dimensions of a grid: rows follow latitude, columns follow longitude.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridShape {
    /// Number of latitude samples
    pub rows: usize,
    /// Number of longitude samples
    pub cols: usize,
}

impl GridShape {
    pub fn new(rows: usize, cols: usize) -> Self {
        Self { rows, cols }
    }

    /// Total number of grid cells.
    pub fn len(&self) -> usize {
        self.rows * self.cols
    }

    /// Check if the shape has no cells.
    pub fn is_empty(&self) -> bool {
        self.rows == 0 || self.cols == 0
    }
}

impl fmt::Display for GridShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.rows, self.cols)
    }
}

/// A 2D grid stored in row-major order (row 0 first).
///
/// Cells equal to the grid's fill value, or NaN, are treated as missing.
/// Elementwise operations propagate missing cells: if either operand is
/// missing, the result cell carries the fill value of `self`.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    data: Vec<f32>,
    shape: GridShape,
    fill_value: f32,
}

impl Grid {
    /// Create a grid from row-major data.
    pub fn new(data: Vec<f32>, shape: GridShape, fill_value: f32) -> GridResult<Self> {
        if data.len() != shape.len() {
            return Err(GridError::DataLength {
                expected: shape.len(),
                actual: data.len(),
            });
        }
        Ok(Self {
            data,
            shape,
            fill_value,
        })
    }

    /// Create a grid with every cell set to `value`.
    pub fn filled(shape: GridShape, value: f32, fill_value: f32) -> Self {
        Self {
            data: vec![value; shape.len()],
            shape,
            fill_value,
        }
    }

    /// Create a grid by evaluating `f(row, col)` for every cell.
    pub fn from_fn(
        shape: GridShape,
        fill_value: f32,
        mut f: impl FnMut(usize, usize) -> f32,
    ) -> Self {
        let mut data = Vec::with_capacity(shape.len());
        for row in 0..shape.rows {
            for col in 0..shape.cols {
                data.push(f(row, col));
            }
        }
        Self {
            data,
            shape,
            fill_value,
        }
    }

    pub fn shape(&self) -> GridShape {
        self.shape
    }

    pub fn rows(&self) -> usize {
        self.shape.rows
    }

    pub fn cols(&self) -> usize {
        self.shape.cols
    }

    pub fn fill_value(&self) -> f32 {
        self.fill_value
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    pub fn into_data(self) -> Vec<f32> {
        self.data
    }

    /// Get the value at a grid position.
    pub fn get(&self, row: usize, col: usize) -> Option<f32> {
        if row >= self.shape.rows || col >= self.shape.cols {
            return None;
        }
        self.data.get(row * self.shape.cols + col).copied()
    }

    /// Borrow one row of the grid.
    pub fn row(&self, row: usize) -> Option<&[f32]> {
        if row >= self.shape.rows {
            return None;
        }
        let start = row * self.shape.cols;
        Some(&self.data[start..start + self.shape.cols])
    }

    /// Check whether a value is missing in this grid.
    #[inline]
    pub fn is_fill(&self, value: f32) -> bool {
        value.is_nan() || value == self.fill_value
    }

    /// Number of missing cells.
    pub fn fill_count(&self) -> usize {
        self.data.iter().filter(|v| self.is_fill(**v)).count()
    }

    /// Fail unless `other` has the same shape as this grid.
    pub fn ensure_same_shape(&self, other: &Grid) -> GridResult<()> {
        if self.shape != other.shape {
            return Err(GridError::ShapeMismatch {
                expected: self.shape,
                actual: other.shape,
            });
        }
        Ok(())
    }

    /// Combine two grids cell by cell into a new grid.
    pub fn zip_map(&self, other: &Grid, f: impl Fn(f32, f32) -> f32) -> GridResult<Grid> {
        self.ensure_same_shape(other)?;

        let data = self
            .data
            .iter()
            .zip(&other.data)
            .map(|(&a, &b)| {
                if self.is_fill(a) || other.is_fill(b) {
                    self.fill_value
                } else {
                    f(a, b)
                }
            })
            .collect();

        Ok(Grid {
            data,
            shape: self.shape,
            fill_value: self.fill_value,
        })
    }

    /// Combine `other` into this grid in place.
    pub fn zip_apply(&mut self, other: &Grid, f: impl Fn(f32, f32) -> f32) -> GridResult<()> {
        self.ensure_same_shape(other)?;

        let fill = self.fill_value;
        for (a, &b) in self.data.iter_mut().zip(&other.data) {
            if a.is_nan() || *a == fill || other.is_fill(b) {
                *a = fill;
            } else {
                *a = f(*a, b);
            }
        }
        Ok(())
    }

    /// Apply `f` to every non-missing cell in place.
    pub fn map_valid(&mut self, f: impl Fn(f32) -> f32) {
        let fill = self.fill_value;
        for v in &mut self.data {
            if v.is_nan() || *v == fill {
                *v = fill;
            } else {
                *v = f(*v);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_wrong_length() {
        let err = Grid::new(vec![1.0; 5], GridShape::new(2, 3), DEFAULT_FILL_VALUE).unwrap_err();
        assert_eq!(
            err,
            GridError::DataLength {
                expected: 6,
                actual: 5
            }
        );
    }

    #[test]
    fn test_from_fn_is_row_major() {
        let grid = Grid::from_fn(GridShape::new(2, 3), DEFAULT_FILL_VALUE, |r, c| {
            (r * 10 + c) as f32
        });
        assert_eq!(grid.data(), &[0.0, 1.0, 2.0, 10.0, 11.0, 12.0]);
        assert_eq!(grid.get(1, 2), Some(12.0));
        assert_eq!(grid.get(2, 0), None);
        assert_eq!(grid.row(1), Some(&[10.0, 11.0, 12.0][..]));
    }

    #[test]
    fn test_zip_map_propagates_fill() {
        let shape = GridShape::new(1, 3);
        let a = Grid::new(vec![1.0, DEFAULT_FILL_VALUE, 3.0], shape, DEFAULT_FILL_VALUE).unwrap();
        let b = Grid::new(vec![1.0, 2.0, f32::NAN], shape, DEFAULT_FILL_VALUE).unwrap();

        let sum = a.zip_map(&b, |x, y| x + y).unwrap();
        assert_eq!(sum.data(), &[2.0, DEFAULT_FILL_VALUE, DEFAULT_FILL_VALUE]);
        assert_eq!(sum.fill_count(), 2);
    }

    #[test]
    fn test_zip_apply_shape_mismatch() {
        let mut a = Grid::filled(GridShape::new(2, 2), 1.0, DEFAULT_FILL_VALUE);
        let b = Grid::filled(GridShape::new(3, 2), 1.0, DEFAULT_FILL_VALUE);

        let err = a.zip_apply(&b, |x, y| x + y).unwrap_err();
        assert!(matches!(err, GridError::ShapeMismatch { .. }));
        // Untouched on failure
        assert_eq!(a.data(), &[1.0; 4]);
    }

    #[test]
    fn test_map_valid_skips_fill() {
        let mut grid = Grid::new(
            vec![2.0, DEFAULT_FILL_VALUE],
            GridShape::new(1, 2),
            DEFAULT_FILL_VALUE,
        )
        .unwrap();
        grid.map_valid(|v| v / 2.0);
        assert_eq!(grid.data(), &[1.0, DEFAULT_FILL_VALUE]);
    }

    #[test]
    fn test_shape_display() {
        assert_eq!(GridShape::new(224, 464).to_string(), "224x464");
        assert!(GridShape::new(0, 4).is_empty());
    }
}
