//! Psychrometric and vapour pressure terms. Temperatures in °C, pressures in kPa.

/// Saturation vapour pressure e°(T) (FAO-56 eq. 11).
pub fn saturation_vapour_pressure(t: f64) -> f64 {
    0.6108 * ((17.27 * t) / (t + 237.3)).exp()
}

/// Actual vapour pressure estimated from daily minimum temperature
/// (FAO-56 eq. 48, Tdew ≈ Tmin).
pub fn actual_vapour_pressure_from_tmin(tmin: f64) -> f64 {
    0.611 * ((17.27 * tmin) / (tmin + 237.3)).exp()
}

/// Actual vapour pressure from dew point temperature (FAO-56 eq. 14).
pub fn actual_vapour_pressure_from_dew_point(dew_point: f64) -> f64 {
    saturation_vapour_pressure(dew_point)
}

/// Slope of the saturation vapour pressure curve Δ (FAO-56 eq. 13).
pub fn slope_saturation_vapour_pressure(t: f64) -> f64 {
    4098.0 * saturation_vapour_pressure(t) / (t + 237.3).powi(2)
}

/// Psychrometric constant γ (FAO-56 eq. 8).
pub fn psychrometric_constant(pressure_kpa: f64) -> f64 {
    0.000665 * pressure_kpa
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fao_table_values() {
        // FAO-56 annex 2, table 2.3
        assert!((saturation_vapour_pressure(20.0) - 2.338).abs() < 1e-3);
        assert!((slope_saturation_vapour_pressure(20.0) - 0.145).abs() < 1e-3);
        // FAO-56 example 2
        assert!((psychrometric_constant(81.8) - 0.054).abs() < 1e-3);
    }

    #[test]
    fn test_tmin_proxy_matches_saturation_closely() {
        let a = actual_vapour_pressure_from_tmin(15.0);
        let b = actual_vapour_pressure_from_dew_point(15.0);
        assert!((a - b).abs() < 0.01);
        assert!(a < b);
    }
}
