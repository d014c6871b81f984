//! Per-point, per-step diagnostic record.
//!
//! Everything a run writes to its output files or hands to a coupled model:
//! flux components, melt and moisture fluxes, refreezing and runoff splits,
//! stored water totals, and the surface/albedo state of the step.

use serde::{Deserialize, Serialize};

/// Diagnostics of one grid point for one timestep. All mass fluxes are in
/// m w.e. per timestep, energy fluxes in W m⁻².
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct PointDiagnostics {
    /// Incoming shortwave radiation.
    pub sw_in: f64,
    /// Reflected shortwave radiation.
    pub sw_out: f64,
    /// Incoming longwave radiation.
    pub lw_in: f64,
    /// Outgoing longwave radiation.
    pub lw_out: f64,
    /// Sensible heat flux.
    pub shf: f64,
    /// Latent heat flux.
    pub lhf: f64,
    /// Ground heat flux.
    pub ghf: f64,
    /// Top-of-atmosphere radiation on the local slope.
    pub toa: f64,
    /// Topographic shading mask (1 = shaded).
    pub shade: f64,
    /// Resolved surface temperature (K).
    pub tsurf: f64,
    /// Surface albedo used this step.
    pub albedo: f64,
    /// Albedo decay timescale (days; zero on bare ice).
    pub albedo_timescale: f64,
    /// Melt energy (W m⁻²).
    pub melt_energy: f64,
    /// Surface melt.
    pub melt: f64,
    /// Vapor deposition (riming).
    pub deposition: f64,
    /// Condensation onto a melting surface.
    pub condensation: f64,
    /// Sublimation.
    pub sublimation: f64,
    /// Evaporation.
    pub evaporation: f64,
    /// Total refreezing.
    pub refreeze: f64,
    /// Refrozen percolating water.
    pub refreeze_percolation: f64,
    /// Refrozen slush water.
    pub refreeze_slush: f64,
    /// Refrozen irreducible water.
    pub refreeze_irreducible: f64,
    /// Total runoff.
    pub runoff: f64,
    /// Surface runoff.
    pub runoff_surface: f64,
    /// Slush runoff.
    pub runoff_slush: f64,
    /// In-domain irreducible water runoff.
    pub runoff_irreducible: f64,
    /// Smoothed deep irreducible runoff.
    pub runoff_deep: f64,
    /// Fresh snow density of the step (kg m⁻³).
    pub fresh_snow_density: f64,
    /// Slush water stored in the column (kg m⁻²).
    pub slush_water: f64,
    /// Irreducible water stored in the column (kg m⁻²).
    pub irreducible_water: f64,
    /// Temperature of the deepest layer (K).
    pub ice_temperature: f64,
    /// Surface mass balance of the step.
    pub smb: f64,
}
