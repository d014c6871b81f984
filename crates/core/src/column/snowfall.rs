//! Phase 1: snowfall and vapor deposition.
//!
//! Fresh mass is converted to a thickness increment at the fresh-snow
//! density and consumed in portions of at most one top-layer target
//! thickness. Each portion either thickens the top layer, blending
//! temperature and density with the incoming snow, or pushes a new layer in
//! at the surface, shifting the stack down one slot; the layer falling off
//! the bottom exports its liquid water as deep runoff.

use crate::config::CompactionScheme;
use crate::constants::{DENSITY_FRESH_SNOW, DENSITY_WATER, T_MELT};
use crate::grid::LayerScheme;
use crate::state::{Layer, SurfacePoint};

/// Water shed from the column bottom during downward shifts (kg m⁻²).
#[derive(Debug, Clone, Copy, Default)]
pub struct ShedWater {
    /// Irreducible water of dropped layers, exported as deep runoff.
    pub deep_water_runoff: f64,
    /// Slush of dropped layers, exported as slush runoff.
    pub slush_runoff: f64,
}

/// Density of freshly fallen snow (kg m⁻³).
///
/// The seasonal-snow compaction scheme uses the temperature and wind
/// dependent parametrization of van Kampenhout et al. (2017); the firn-only
/// scheme uses the fixed default density.
#[must_use]
pub fn fresh_snow_density(scheme: CompactionScheme, t_air: f64, wind: f64) -> f64 {
    match scheme {
        CompactionScheme::FirnOnly => DENSITY_FRESH_SNOW,
        CompactionScheme::FirnAndSnow => {
            let dt = t_air - T_MELT;
            let temp_part = if dt > 2.0 {
                50.0 + 1.7 * 17f64.powf(1.5)
            } else if dt > -15.0 {
                50.0 + 1.7 * (dt + 15.0).powf(1.5)
            } else {
                -3.8328 * dt - 0.0333 * dt * dt
            };
            let wind_part = 266.86 * (0.5 * (1.0 + (wind / 5.0).tanh())).powf(8.8);
            temp_part + wind_part
        }
    }
}

/// Add snowfall and riming deposition (both m w.e.) to the top of the
/// column.
pub fn snowfall_and_deposition(
    column: &mut [Layer],
    scheme: &LayerScheme,
    surface: &mut SurfacePoint,
    snowfall: f64,
    deposition: f64,
    fresh_density: f64,
) -> ShedWater {
    let nl = column.len();
    let max_z = scheme.max_thickness;
    let mut shed = ShedWater::default();

    let mut shift_total = (snowfall + deposition) * DENSITY_WATER / fresh_density;
    surface.surface_height += shift_total;

    while shift_total > 0.0 {
        let shift = shift_total.min(max_z);
        shift_total -= shift;

        let old = column.to_vec();

        if old[0].thickness + shift <= max_z {
            // Thicken the top layer, blending with the incoming snow.
            let z_new = old[0].thickness + shift;
            column[0].thickness = z_new;
            column[0].temperature =
                (old[0].temperature * old[0].thickness + surface.tsurf * shift) / z_new;
            column[0].density =
                (old[0].density * old[0].thickness + fresh_density * shift) / z_new;
        } else {
            // Push a new surface layer in: the old top fills up to the
            // target thickness at slot 1, the remainder becomes a pure
            // fresh-snow top, and everything below moves down one slot.
            shed.deep_water_runoff += old[nl - 1].water;
            shed.slush_runoff += old[nl - 1].slush;

            for k in (2..nl).rev() {
                column[k].thickness = old[k - 1].thickness;
                column[k].temperature = old[k - 1].temperature;
                column[k].density = old[k - 1].density;
                column[k].water = old[k - 1].water;
                column[k].slush = old[k - 1].slush;
            }

            let fill = max_z - old[0].thickness;
            column[1].thickness = max_z;
            column[1].temperature =
                (old[0].temperature * old[0].thickness + surface.tsurf * fill) / max_z;
            column[1].density =
                (old[0].density * old[0].thickness + fresh_density * fill) / max_z;
            column[1].water = old[0].water;
            column[1].slush = old[0].slush;

            column[0].thickness = (old[0].thickness + shift) - max_z;
            column[0].temperature = surface.tsurf;
            column[0].density = fresh_density;
            column[0].water = 0.0;
            column[0].slush = 0.0;
        }
    }

    shed
}
