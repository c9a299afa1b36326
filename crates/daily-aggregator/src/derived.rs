//! Fields computed from already aggregated grids.

use grid_common::Grid;

use crate::error::{AggregationError, Result};

/// Wind speed magnitude `sqrt(u² + v²)` from daily mean wind components.
pub fn wind_speed(u: &Grid, v: &Grid) -> Result<Grid> {
    u.zip_map(v, f32::hypot)
        .map_err(|e| AggregationError::from_grid("wind_speed", e))
}

/// Mean of the daily maximum and minimum temperature.
pub fn mean_temperature(max: &Grid, min: &Grid) -> Result<Grid> {
    max.zip_map(min, |hi, lo| (hi + lo) / 2.0)
        .map_err(|e| AggregationError::from_grid("mean_temperature", e))
}
