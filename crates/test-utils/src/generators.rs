//! Test data generators for creating synthetic weather-like data.
//!
//! These generators create predictable, verifiable grids and coordinate
//! vectors that can be used across the test suite.

use grid_common::{Attributes, Grid, GridShape, SourceFile, DEFAULT_FILL_VALUE};

/// Creates a grid with every cell set to `value` and the default fill value.
pub fn uniform_grid(shape: GridShape, value: f32) -> Grid {
    Grid::filled(shape, value, DEFAULT_FILL_VALUE)
}

/// Creates a grid with predictable values.
///
/// Each cell value is calculated as: `col * 1000 + row`
///
/// # Example
///
/// ```
/// use grid_common::GridShape;
/// use test_utils::indexed_grid;
///
/// let grid = indexed_grid(GridShape::new(5, 10));
/// assert_eq!(grid.get(0, 1), Some(1000.0));
/// assert_eq!(grid.get(1, 0), Some(1.0));
/// ```
pub fn indexed_grid(shape: GridShape) -> Grid {
    Grid::from_fn(shape, DEFAULT_FILL_VALUE, |row, col| (col * 1000 + row) as f32)
}

/// Creates a grid with temperature-like values in Kelvin.
///
/// The values range from approximately 250K (-23C) to 310K (37C),
/// increasing from the top-left to the bottom-right corner.
pub fn temperature_grid(shape: GridShape) -> Grid {
    Grid::from_fn(shape, DEFAULT_FILL_VALUE, |row, col| {
        let x_factor = col as f32 / shape.cols.max(1) as f32;
        let y_factor = row as f32 / shape.rows.max(1) as f32;
        250.0 + (x_factor * 30.0) + (y_factor * 30.0)
    })
}

/// Copy of `grid` with the listed `(row, col)` cells set to the fill value.
pub fn with_fill_cells(grid: &Grid, cells: &[(usize, usize)]) -> Grid {
    let mut data = grid.data().to_vec();
    for &(row, col) in cells {
        data[row * grid.cols() + col] = grid.fill_value();
    }
    Grid::new(data, grid.shape(), grid.fill_value()).expect("same shape as the input grid")
}

/// Evenly spaced latitudes from `start` in steps of `step` degrees.
pub fn latitude_axis(rows: usize, start: f64, step: f64) -> Vec<f64> {
    (0..rows).map(|i| start + i as f64 * step).collect()
}

/// Evenly spaced longitudes from `start` in steps of `step` degrees.
pub fn longitude_axis(cols: usize, start: f64, step: f64) -> Vec<f64> {
    (0..cols).map(|i| start + i as f64 * step).collect()
}

/// NLDAS-like latitudes: 25.0625N northwards at 0.125 degrees.
pub fn nldas_latitudes(rows: usize) -> Vec<f64> {
    latitude_axis(rows, 25.0625, 0.125)
}

/// NLDAS-like longitudes: 124.9375W eastwards at 0.125 degrees.
pub fn nldas_longitudes(cols: usize) -> Vec<f64> {
    longitude_axis(cols, -124.9375, 0.125)
}

/// Builder for one synthetic hourly file.
///
/// # Example
///
/// ```
/// use grid_common::GridShape;
/// use test_utils::SampleBuilder;
///
/// let file = SampleBuilder::new("/hourly/00.zarr", GridShape::new(2, 3))
///     .uniform("TMP", 290.0)
///     .axis("lat", vec![10.0, 20.0])
///     .build();
/// assert_eq!(file.len(), 2);
/// ```
pub struct SampleBuilder {
    shape: GridShape,
    file: SourceFile,
}

impl SampleBuilder {
    pub fn new(path: &str, shape: GridShape) -> Self {
        Self {
            shape,
            file: SourceFile::new(path),
        }
    }

    /// Add a grid with every cell set to `value`.
    pub fn uniform(self, name: &str, value: f32) -> Self {
        let grid = uniform_grid(self.shape, value);
        self.grid(name, grid)
    }

    pub fn grid(mut self, name: &str, grid: Grid) -> Self {
        self.file.insert(name, grid, Attributes::new());
        self
    }

    pub fn axis(mut self, name: &str, values: Vec<f64>) -> Self {
        self.file.insert(name, values, Attributes::new());
        self
    }

    /// Add a uniform grid carrying a `units` attribute.
    pub fn with_units(mut self, name: &str, value: f32, units: &str) -> Self {
        let mut attrs = Attributes::new();
        attrs.insert("units".to_string(), units.into());
        attrs.insert("_FillValue".to_string(), (DEFAULT_FILL_VALUE as f64).into());
        self.file.insert(name, uniform_grid(self.shape, value), attrs);
        self
    }

    pub fn build(self) -> SourceFile {
        self.file
    }
}
