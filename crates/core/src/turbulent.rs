//! Turbulent and ground heat fluxes.
//!
//! Bulk aerodynamic formulas for the sensible and latent heat fluxes with a
//! turbulent exchange coefficient composed of a constant background part and
//! a katabatic free-convection part driven by the surface-air temperature
//! deficit (clipped at zero). The ground heat flux uses the effective
//! conductivity of the top two layers weighted by their thicknesses.

use crate::constants::{
    conductivity, CP_AIR, C_TURB_BACKGROUND, EPS_VAPOR, GRAVITY, K_KATABATIC,
    LATENT_SUBLIMATION, LATENT_VAPORIZATION, PRANDTL, T_MELT,
};
use crate::forcing::{saturation_vapor_pressure, MetPoint};
use crate::state::Layer;

/// Turbulent exchange coefficient: background plus katabatic term.
#[inline]
#[must_use]
pub fn exchange_coefficient(t_air: f64, tsurf: f64, theta_lapse: f64) -> f64 {
    let katabatic = (K_KATABATIC
        * (t_air - tsurf)
        * (GRAVITY / (T_MELT * theta_lapse * PRANDTL)).sqrt())
    .max(0.0);
    0.5 * (C_TURB_BACKGROUND + katabatic)
}

/// Sensible heat flux (W m⁻², positive toward the surface).
#[inline]
#[must_use]
pub fn sensible_heat_flux(met: &MetPoint, tsurf: f64, theta_lapse: f64) -> f64 {
    let c_turb = exchange_coefficient(met.t_air, tsurf, theta_lapse);
    met.air_density * CP_AIR * c_turb * (met.t_air - tsurf)
}

/// Latent heat flux (W m⁻², positive toward the surface).
///
/// Below the melting point the exchange is sublimation/deposition with the
/// latent heat of sublimation; at or above it, evaporation/condensation with
/// the latent heat of vaporization.
#[inline]
#[must_use]
pub fn latent_heat_flux(met: &MetPoint, tsurf: f64, theta_lapse: f64) -> f64 {
    let c_turb = exchange_coefficient(met.t_air, tsurf, theta_lapse);
    let latent = if tsurf < T_MELT {
        LATENT_SUBLIMATION
    } else {
        LATENT_VAPORIZATION
    };
    let vp_surf = saturation_vapor_pressure(tsurf);
    EPS_VAPOR * met.air_density * latent * c_turb * (met.vapor_pressure - vp_surf) / met.pressure
}

/// Bulk conductance of the top two layers for the ground heat flux
/// (W m⁻² K⁻¹): conductivities weighted by layer thickness over the squared
/// distance from the surface to the mid-point of layer 1.
#[inline]
#[must_use]
pub fn ground_flux_conductance(column: &[Layer]) -> f64 {
    let k0 = conductivity(column[0].density);
    let k1 = conductivity(column[1].density);
    let z0 = column[0].thickness;
    let z1 = column[1].thickness;
    (k0 * z0 + 0.5 * k1 * z1) / (z0 + 0.5 * z1).powi(2)
}

/// Ground heat flux (W m⁻², positive toward the surface).
#[inline]
#[must_use]
pub fn ground_heat_flux(conductance: f64, t_layer1: f64, tsurf: f64) -> f64 {
    conductance * (t_layer1 - tsurf)
}
