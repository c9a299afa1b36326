//! FAO-56 Penman-Monteith reference evapotranspiration over a daily grid.
//!
//! # Units
//!
//! Inputs arrive as stored in the source grids:
//!
//! | field | unit |
//! |-------|------|
//! | max/min temperature, dew point | K |
//! | shortwave radiation | W m⁻² (daily mean) |
//! | pressure | Pa |
//! | wind speed | m s⁻¹ |
//! | latitude | degrees north |
//!
//! The engine converts to °C, MJ m⁻² day⁻¹ and kPa before applying the
//! FAO-56 formulas and returns ET₀ in mm day⁻¹. Soil heat flux is zero at a
//! daily time step.
//!
//! # Missing data
//!
//! A cell whose required inputs include a fill value or NaN gets the fill
//! value of the maximum temperature grid. Nothing is computed for it.

pub mod radiation;
pub mod solar;
pub mod vapor;

use grid_common::Grid;
use tracing::debug;

use crate::error::{AggregationError, Result};

pub use radiation::{
    net_outgoing_longwave, net_radiation, net_shortwave, relative_shortwave, STEFAN_BOLTZMANN,
    WATTS_TO_MJ_PER_DAY,
};
pub use solar::{
    atmospheric_pressure, clear_sky_radiation, extraterrestrial_radiation,
    inverse_relative_distance, solar_declination, sunset_hour_angle, RowGeometry, SolarContext,
    SOLAR_CONSTANT,
};
pub use vapor::{
    actual_vapour_pressure_from_dew_point, actual_vapour_pressure_from_tmin,
    psychrometric_constant, saturation_vapour_pressure, slope_saturation_vapour_pressure,
};

/// Offset between Kelvin and degrees Celsius.
pub const KELVIN_OFFSET: f64 = 273.15;

/// Daily fields consumed by [`EvapotranspirationEngine::compute`].
#[derive(Debug, Clone, Copy)]
pub struct EtInputs<'a> {
    pub tmax: &'a Grid,
    pub tmin: &'a Grid,
    pub shortwave: &'a Grid,
    pub wind_speed: &'a Grid,
    /// Surface pressure; the altitude-derived value is used when `None`
    pub pressure: Option<&'a Grid>,
    /// Dew point; the Tmin proxy is used when `None`
    pub dew_point: Option<&'a Grid>,
    /// One latitude per grid row
    pub latitude: &'a [f64],
}

/// Scalar inputs for one grid cell, already in SI units as stored.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellInputs {
    pub tmax_k: f64,
    pub tmin_k: f64,
    /// W m⁻²
    pub shortwave: f64,
    /// m s⁻¹
    pub wind_speed: f64,
    /// kPa
    pub pressure_kpa: f64,
    pub dew_point_k: Option<f64>,
}

/// Computes ET₀ for every cell of a day's grids.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EvapotranspirationEngine {
    albedo: f64,
}

impl Default for EvapotranspirationEngine {
    fn default() -> Self {
        Self { albedo: 0.0 }
    }
}

impl EvapotranspirationEngine {
    pub fn new(albedo: f64) -> Self {
        Self { albedo }
    }

    pub fn albedo(&self) -> f64 {
        self.albedo
    }

    /// ET₀ in mm day⁻¹ for one cell.
    pub fn cell(&self, row: &RowGeometry, inputs: &CellInputs) -> f64 {
        let tmax_c = inputs.tmax_k - KELVIN_OFFSET;
        let tmin_c = inputs.tmin_k - KELVIN_OFFSET;
        let tavg_c = (tmax_c + tmin_c) / 2.0;
        let tavg_k = tavg_c + KELVIN_OFFSET;

        let shortwave = inputs.shortwave * WATTS_TO_MJ_PER_DAY;

        let ea = match inputs.dew_point_k {
            Some(dew_point) => actual_vapour_pressure_from_dew_point(dew_point - KELVIN_OFFSET),
            None => actual_vapour_pressure_from_tmin(tmin_c),
        };

        let rnl = net_outgoing_longwave(inputs.tmin_k, inputs.tmax_k, shortwave, row.clear_sky, ea);
        let rn = net_radiation(net_shortwave(shortwave, self.albedo), rnl);

        let gamma = psychrometric_constant(inputs.pressure_kpa);
        let delta = slope_saturation_vapour_pressure(tavg_c);
        let es = saturation_vapour_pressure(tavg_c);
        let ws = inputs.wind_speed;

        let numerator = 0.408 * delta * rn + gamma * (900.0 / tavg_k) * ws * (es - ea);
        let denominator = delta + gamma * (1.0 + 0.34 * ws);
        numerator / denominator
    }

    /// ET₀ grid for a day.
    ///
    /// Fails with `ShapeMismatch` if the grids disagree or the latitude
    /// vector length differs from the number of rows, and with
    /// `InvalidLatitude` for latitudes outside [-90, 90].
    pub fn compute(&self, inputs: &EtInputs<'_>, solar: &SolarContext) -> Result<Grid> {
        let shape = inputs.tmax.shape();
        let mut grids = vec![
            ("min_temperature", inputs.tmin),
            ("shortwave_radiation", inputs.shortwave),
            ("wind_speed", inputs.wind_speed),
        ];
        if let Some(pressure) = inputs.pressure {
            grids.push(("pressure", pressure));
        }
        if let Some(dew_point) = inputs.dew_point {
            grids.push(("dew_point", dew_point));
        }
        for (name, grid) in &grids {
            inputs
                .tmax
                .ensure_same_shape(grid)
                .map_err(|e| AggregationError::from_grid(*name, e))?;
        }
        if inputs.latitude.len() != shape.rows {
            return Err(AggregationError::ShapeMismatch {
                variable: "latitude".to_string(),
                expected: shape,
                actual: grid_common::GridShape::new(inputs.latitude.len(), shape.cols),
            });
        }

        let rows = inputs
            .latitude
            .iter()
            .map(|lat| solar.row_geometry(*lat))
            .collect::<Result<Vec<_>>>()?;
        let fallback_pressure = atmospheric_pressure(solar.altitude_m());

        debug!(
            day_of_year = solar.day_of_year(),
            rows = shape.rows,
            cols = shape.cols,
            measured_pressure = inputs.pressure.is_some(),
            dew_point = inputs.dew_point.is_some(),
            "Computing reference evapotranspiration"
        );

        let fill = inputs.tmax.fill_value();
        let et = Grid::from_fn(shape, fill, |i, j| {
            let idx = i * shape.cols + j;
            let value = |grid: &Grid| {
                let v = grid.data()[idx];
                (!grid.is_fill(v)).then_some(v as f64)
            };

            let cell = (|| {
                let pressure_kpa = match inputs.pressure {
                    Some(grid) => value(grid)? / 1000.0,
                    None => fallback_pressure,
                };
                let dew_point_k = match inputs.dew_point {
                    Some(grid) => Some(value(grid)?),
                    None => None,
                };
                Some(CellInputs {
                    tmax_k: value(inputs.tmax)?,
                    tmin_k: value(inputs.tmin)?,
                    shortwave: value(inputs.shortwave)?,
                    wind_speed: value(inputs.wind_speed)?,
                    pressure_kpa,
                    dew_point_k,
                })
            })();

            match cell {
                Some(cell) => self.cell(&rows[i], &cell) as f32,
                None => fill,
            }
        });

        Ok(et)
    }
}
