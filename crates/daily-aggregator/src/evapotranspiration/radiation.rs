//! Net radiation budget. Radiation in MJ m⁻² day⁻¹, temperatures in K.

/// Stefan-Boltzmann constant in MJ K⁻⁴ m⁻² day⁻¹.
pub const STEFAN_BOLTZMANN: f64 = 4.903e-9;

/// Mean W m⁻² over one day expressed in MJ m⁻² day⁻¹.
pub const WATTS_TO_MJ_PER_DAY: f64 = 0.0864;

/// Relative shortwave radiation Rs/Rso, limited to 1.0.
///
/// Falls back to 1.0 when there is no clear-sky radiation (polar night).
pub fn relative_shortwave(shortwave: f64, clear_sky: f64) -> f64 {
    if clear_sky <= 0.0 {
        return 1.0;
    }
    (shortwave / clear_sky).min(1.0)
}

/// Net outgoing longwave radiation Rnl (FAO-56 eq. 39).
pub fn net_outgoing_longwave(
    tmin_k: f64,
    tmax_k: f64,
    shortwave: f64,
    clear_sky: f64,
    actual_vapour_pressure: f64,
) -> f64 {
    let tmp1 = STEFAN_BOLTZMANN * ((tmax_k.powi(4) + tmin_k.powi(4)) / 2.0);
    let tmp2 = 0.34 - 0.14 * actual_vapour_pressure.sqrt();
    let tmp3 = 1.35 * relative_shortwave(shortwave, clear_sky) - 0.35;
    tmp1 * tmp2 * tmp3
}

/// Net shortwave radiation Rns (FAO-56 eq. 38).
pub fn net_shortwave(shortwave: f64, albedo: f64) -> f64 {
    (1.0 - albedo) * shortwave
}

/// Net radiation Rn = Rns - Rnl (FAO-56 eq. 40).
pub fn net_radiation(net_shortwave: f64, net_longwave: f64) -> f64 {
    net_shortwave - net_longwave
}
