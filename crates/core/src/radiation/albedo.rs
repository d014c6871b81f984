//! Surface albedo evolution and reflected shortwave.
//!
//! Snow albedo decays from the fresh-snow value toward the firn value with
//! an age-dependent timescale that is short for wet snow and long for cold,
//! dry snow (Oerlemans & Knap 1998; Bougamont et al. 2005). Any snowfall
//! within the current timestep resets the decay; a surface at ice density or
//! with no remaining snow mass takes the bare-ice albedo.

use chrono::{DateTime, Utc};

use crate::constants::{
    ALBEDO_FIRN, ALBEDO_FRESH_SNOW, ALBEDO_ICE, DENSITY_ICE, TSTAR_DRY, TSTAR_K, TSTAR_WET,
    T_MELT,
};
use crate::state::SurfacePoint;

/// Advance the albedo state of one point and return the decay timescale
/// diagnostic (days; zero on bare ice).
pub fn update_albedo(
    surface: &mut SurfacePoint,
    top_density: f64,
    now: DateTime<Utc>,
    timestep_days: f64,
) -> f64 {
    let ice_surface = top_density >= DENSITY_ICE || surface.snowmass == 0.0;

    let mut tstar = 0.0;
    if !ice_surface {
        tstar = if surface.tsurf >= T_MELT {
            TSTAR_WET
        } else {
            TSTAR_DRY + (T_MELT - surface.tsurf).min(10.0) * TSTAR_K
        };
        if surface.time_last_snow < now {
            let decay = (surface.albedo_snow - ALBEDO_FIRN).max(0.0) / tstar * timestep_days;
            surface.albedo_snow -= decay;
        }
    }

    if surface.time_last_snow == now || ice_surface {
        surface.albedo_snow = ALBEDO_FRESH_SNOW;
    }

    surface.albedo = if ice_surface {
        ALBEDO_ICE
    } else {
        surface.albedo_snow
    };
    tstar
}
