//! Physical constants of the surface energy balance and firn column model.
//!
//! Values follow the glaciological literature conventions used throughout the
//! model formulations (Oerlemans & Knap 1998; Konzelmann et al. 1994;
//! Ligtenberg et al. 2011; van Kampenhout et al. 2017).

/// Melting temperature of ice (K).
pub const T_MELT: f64 = 273.15;

/// Stefan-Boltzmann constant (W m⁻² K⁻⁴).
pub const STEFAN_BOLTZMANN: f64 = 5.67e-8;

/// Latent heat of melting/fusion (J kg⁻¹).
pub const LATENT_MELT: f64 = 0.33e6;

/// Latent heat of sublimation/riming (J kg⁻¹).
pub const LATENT_SUBLIMATION: f64 = 2.83e6;

/// Latent heat of evaporation/condensation (J kg⁻¹).
pub const LATENT_VAPORIZATION: f64 = 2.5e6;

/// Specific heat of dry air at constant pressure (J kg⁻¹ K⁻¹).
pub const CP_AIR: f64 = 1005.7;

/// Specific gas constant of water vapor (J kg⁻¹ K⁻¹).
pub const R_VAPOR: f64 = 462.0;

/// Specific gas constant of dry air (J kg⁻¹ K⁻¹).
pub const R_DRY_AIR: f64 = 287.0;

/// Universal gas constant (J mol⁻¹ K⁻¹).
pub const R_UNIVERSAL: f64 = 8.314;

/// Ratio of molecular weights of water vapor and dry air.
pub const EPS_VAPOR: f64 = 0.622;

/// Saturation vapor pressure at 0 °C (Pa).
pub const VP_TRIPLE: f64 = 610.5;

/// Reference air pressure (Pa).
pub const P_REF: f64 = 1015e2;

/// Gravitational acceleration (m s⁻²).
pub const GRAVITY: f64 = 9.81;

/// Density of ice (kg m⁻³).
pub const DENSITY_ICE: f64 = 900.0;

/// Density of firn: the snow-to-firn transition density (kg m⁻³).
pub const DENSITY_FIRN: f64 = 500.0;

/// Default density of fresh snow (kg m⁻³).
pub const DENSITY_FRESH_SNOW: f64 = 350.0;

/// Density of water (kg m⁻³).
pub const DENSITY_WATER: f64 = 1000.0;

/// Albedo of fresh snow.
pub const ALBEDO_FRESH_SNOW: f64 = 0.83;

/// Albedo of firn.
pub const ALBEDO_FIRN: f64 = 0.52;

/// Albedo of bare ice.
pub const ALBEDO_ICE: f64 = 0.39;

/// Gravitational densification activation energy, creep term (J mol⁻¹).
pub const E_CREEP: f64 = 60000.0;

/// Gravitational densification activation energy, grain-growth term (J mol⁻¹).
pub const E_GRAIN: f64 = 42400.0;

/// Prandtl number in the turbulent flux formulation.
pub const PRANDTL: f64 = 5.0;

/// Katabatic (free-convection) turbulent flux coefficient.
pub const K_KATABATIC: f64 = 0.0004;

/// Background turbulent exchange coefficient.
pub const C_TURB_BACKGROUND: f64 = 0.0025;

/// Aerosol transmissivity exponent (Houghton 1954).
pub const K_AEROSOL: f64 = 0.974;

/// Clear-sky emissivity coefficient (Konzelmann et al. 1994).
pub const EMISSIVITY_B: f64 = 0.455;

/// Cloud emissivity (Konzelmann et al. 1994).
pub const EMISSIVITY_CLOUD: f64 = 0.960;

/// Cloud-fraction exponent in the sky emissivity blend.
pub const EMISSIVITY_EXP: i32 = 2;

/// Snow-to-rain transition temperature (K).
pub const RAIN_SNOW_T: f64 = 273.75;

/// Threshold precipitation rate that resets the time since last snowfall
/// (m w.e. s⁻¹).
pub const SNOWFALL_RATE_THRESHOLD: f64 = 2.5e-8;

/// Albedo decay timescale of wet snow (days).
pub const TSTAR_WET: f64 = 15.0;

/// Albedo decay timescale of dry snow (days).
pub const TSTAR_DRY: f64 = 30.0;

/// Albedo decay timescale increase per kelvin below melt (days K⁻¹).
pub const TSTAR_K: f64 = 7.0;

/// Days in a tropical year.
pub const YEAR_DAYS: f64 = 365.242199;

/// Seconds per day.
pub const DAY_SECONDS: f64 = 86400.0;

/// Specific heat capacity of ice at temperature `t` (J kg⁻¹ K⁻¹).
///
/// Linear fit valid over the temperature range of polar firn.
#[inline]
#[must_use]
pub fn heat_capacity_ice(t: f64) -> f64 {
    152.2 + 7.122 * t
}

/// Effective thermal conductivity of snow/firn at density `d` (W m⁻¹ K⁻¹).
///
/// Quadratic fit in density after Sturm et al. (1997).
#[inline]
#[must_use]
pub fn conductivity(d: f64) -> f64 {
    0.138 - 1.01e-3 * d + 3.233e-6 * d * d
}

/// Maximum irreducible water mass a layer of density `d` and thickness `z`
/// can hold against gravity (kg m⁻²).
///
/// Empirical pore-space retention curve (Schneider & Jansson 2004); zero for
/// layers at ice density, which have no connected pore space.
#[inline]
#[must_use]
pub fn irreducible_capacity(d: f64, z: f64) -> f64 {
    if d >= DENSITY_ICE - 1.0 {
        return 0.0;
    }
    let e = 0.0143 * (3.3 * (DENSITY_ICE - d) / DENSITY_ICE).exp();
    d * z * e / (1.0 - e) * 0.05 * (DENSITY_ICE - d).min(20.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conductivity_increases_with_density() {
        assert!(conductivity(DENSITY_ICE) > conductivity(DENSITY_FRESH_SNOW));
        assert!(conductivity(DENSITY_FRESH_SNOW) > 0.0);
    }

    #[test]
    fn heat_capacity_positive_over_firn_range() {
        for t in [200.0, 240.0, 273.15] {
            assert!(heat_capacity_ice(t) > 0.0);
        }
    }

    #[test]
    fn irreducible_capacity_vanishes_at_ice_density() {
        assert_eq!(irreducible_capacity(DENSITY_ICE, 1.0), 0.0);
        assert!(irreducible_capacity(DENSITY_FRESH_SNOW, 1.0) > 0.0);
    }
}
