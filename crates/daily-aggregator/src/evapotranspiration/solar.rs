//! Solar geometry and radiation terms of FAO-56 (equations 21-24, 37).
//!
//! Angles are in radians, radiation in MJ m⁻² day⁻¹.

use std::f64::consts::PI;

use chrono::{Datelike, NaiveDate};

use crate::error::{AggregationError, Result};

/// Solar constant Gsc in MJ m⁻² min⁻¹.
pub const SOLAR_CONSTANT: f64 = 0.0820;

/// Solar declination δ (FAO-56 eq. 24).
pub fn solar_declination(day_of_year: u32) -> f64 {
    0.409 * ((2.0 * PI / 365.0) * day_of_year as f64 - 1.39).sin()
}

/// Inverse relative distance Earth-Sun dr (FAO-56 eq. 23).
pub fn inverse_relative_distance(day_of_year: u32) -> f64 {
    1.0 + 0.033 * ((2.0 * PI / 365.0) * day_of_year as f64).cos()
}

/// Sunset hour angle ωs (FAO-56 eq. 25).
///
/// The cosine is clamped to [-1, 1] so polar day and polar night yield π and 0.
pub fn sunset_hour_angle(latitude: f64, declination: f64) -> f64 {
    let cos_ws = (-latitude.tan() * declination.tan()).clamp(-1.0, 1.0);
    cos_ws.acos()
}

/// Extraterrestrial radiation Ra (FAO-56 eq. 21).
pub fn extraterrestrial_radiation(
    latitude: f64,
    declination: f64,
    sunset_hour_angle: f64,
    inverse_distance: f64,
) -> f64 {
    let tmp1 = (24.0 * 60.0) / PI;
    let tmp2 = sunset_hour_angle * latitude.sin() * declination.sin();
    let tmp3 = latitude.cos() * declination.cos() * sunset_hour_angle.sin();
    tmp1 * SOLAR_CONSTANT * inverse_distance * (tmp2 + tmp3)
}

/// Clear-sky radiation Rso (FAO-56 eq. 37).
pub fn clear_sky_radiation(altitude_m: f64, extraterrestrial: f64) -> f64 {
    (0.00002 * altitude_m + 0.75) * extraterrestrial
}

/// Atmospheric pressure in kPa at an altitude (FAO-56 eq. 7).
pub fn atmospheric_pressure(altitude_m: f64) -> f64 {
    let tmp = (293.0 - 0.0065 * altitude_m) / 293.0;
    101.3 * tmp.powf(5.26)
}

/// Fail unless a day-of-year lies in [1, 366].
pub fn check_day_of_year(day_of_year: u32) -> Result<u32> {
    if !(1..=366).contains(&day_of_year) {
        return Err(AggregationError::InvalidDayOfYear(day_of_year));
    }
    Ok(day_of_year)
}

/// Convert a latitude in degrees to radians, failing outside [-90, 90].
pub fn latitude_radians(latitude_deg: f64) -> Result<f64> {
    if !(-90.0..=90.0).contains(&latitude_deg) {
        return Err(AggregationError::InvalidLatitude(latitude_deg));
    }
    Ok(latitude_deg.to_radians())
}

/// Day-level inputs to the radiative geometry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolarContext {
    day_of_year: u32,
    altitude_m: f64,
    declination: f64,
    inverse_distance: f64,
}

impl SolarContext {
    pub fn new(day_of_year: u32, altitude_m: f64) -> Result<Self> {
        let day_of_year = check_day_of_year(day_of_year)?;
        Ok(Self {
            day_of_year,
            altitude_m,
            declination: solar_declination(day_of_year),
            inverse_distance: inverse_relative_distance(day_of_year),
        })
    }

    /// Context for a calendar date.
    pub fn for_date(date: NaiveDate, altitude_m: f64) -> Result<Self> {
        Self::new(date.ordinal(), altitude_m)
    }

    pub fn day_of_year(&self) -> u32 {
        self.day_of_year
    }

    pub fn altitude_m(&self) -> f64 {
        self.altitude_m
    }

    pub fn declination(&self) -> f64 {
        self.declination
    }

    pub fn inverse_distance(&self) -> f64 {
        self.inverse_distance
    }

    /// Radiation terms shared by every cell of a latitude row.
    pub fn row_geometry(&self, latitude_deg: f64) -> Result<RowGeometry> {
        let latitude = latitude_radians(latitude_deg)?;
        let sunset = sunset_hour_angle(latitude, self.declination);
        let ra =
            extraterrestrial_radiation(latitude, self.declination, sunset, self.inverse_distance);
        Ok(RowGeometry {
            latitude,
            sunset_hour_angle: sunset,
            extraterrestrial: ra,
            clear_sky: clear_sky_radiation(self.altitude_m, ra),
        })
    }
}

/// Per-latitude radiation terms.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RowGeometry {
    pub latitude: f64,
    pub sunset_hour_angle: f64,
    pub extraterrestrial: f64,
    pub clear_sky: f64,
}
