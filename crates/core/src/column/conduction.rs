//! Phase 4: vertical heat conduction.
//!
//! Explicit finite differences on the irregular layer grid, sub-stepped
//! under a stability limit of half the minimum `c_eff·Δz²/k` over the
//! interior layers. The surface boundary is the resolved surface
//! temperature; the bottom boundary carries the configured geothermal flux.
//! The top layer temperature is interpolated between the surface and layer 1
//! after the loop, and all temperatures clamp at the melting point.
//! Conduction moves energy only: thickness, density and water are untouched.

use crate::constants::{conductivity, heat_capacity_ice, DAY_SECONDS, T_MELT};
use crate::state::Layer;

/// Floor of the stability sub-step, as a fraction of the full timestep.
/// Guards against degenerate columns with near-zero layer thickness.
const MIN_SUBSTEP_FRACTION: f64 = 1e-6;

/// Diffuse heat through one column over `timestep_days`.
pub fn heat_conduction(
    column: &mut [Layer],
    tsurf: f64,
    geothermal_flux: f64,
    timestep_days: f64,
) {
    let nl = column.len();

    // Effective conductivity and heat capacity, held fixed over the
    // sub-stepping like the layer geometry.
    let kk: Vec<f64> = column.iter().map(|l| conductivity(l.density)).collect();
    let c_eff: Vec<f64> = column
        .iter()
        .map(|l| l.density * heat_capacity_ice(l.temperature))
        .collect();
    let z: Vec<f64> = column.iter().map(|l| l.thickness).collect();

    // Squared conduction distances: surface to layer-1 midpoint, then
    // midpoint to midpoint.
    let dz1 = (z[0] + 0.5 * z[1]).powi(2);
    let dz2: Vec<f64> = (2..nl).map(|k| 0.5 * (z[k] + z[k - 1]).powi(2)).collect();

    // Stability limit over the interior layers (days).
    let min_c = c_eff[1..].iter().cloned().fold(f64::INFINITY, f64::min);
    let min_z = z[1..].iter().cloned().fold(f64::INFINITY, f64::min);
    let max_k = kk[1..].iter().cloned().fold(0.0f64, f64::max);
    let dt_stable =
        (0.5 * min_c * min_z * min_z / max_k / DAY_SECONDS).max(timestep_days * MIN_SUBSTEP_FRACTION);

    let mut elapsed = 0.0;
    let mut flux = vec![0.0; nl];
    while elapsed < timestep_days {
        let dt = dt_stable.min(timestep_days - elapsed);
        elapsed += dt;
        let seconds = DAY_SECONDS * dt;

        let t_old: Vec<f64> = column.iter().map(|l| l.temperature).collect();

        // Downward heat fluxes into each interior layer.
        flux[1] = (kk[0] * z[0] + 0.5 * kk[1] * z[1]) * (t_old[1] - tsurf) / dz1;
        for k in 2..nl {
            flux[k] = (kk[k - 1] * z[k - 1] + kk[k] * z[k]) * (t_old[k] - t_old[k - 1])
                / dz2[k - 2];
        }

        column[1].temperature = t_old[1]
            + seconds * (flux[2] - flux[1])
                / (c_eff[1] * (0.5 * z[0] + 0.5 * z[1] + 0.25 * z[2]));

        for k in 2..nl - 1 {
            column[k].temperature = t_old[k]
                + seconds * (flux[k + 1] - flux[k])
                    / (c_eff[k] * (0.25 * z[k - 1] + 0.5 * z[k] + 0.25 * z[k + 1]));
        }

        column[nl - 1].temperature = t_old[nl - 1]
            + seconds * (geothermal_flux - flux[nl - 1])
                / (c_eff[nl - 1] * (0.25 * z[nl - 2] + 0.75 * z[nl - 1]));
    }

    // The thin surface layer follows the gradient between the surface and
    // layer 1 rather than its own prognostic equation.
    column[0].temperature = tsurf
        + (column[1].temperature - tsurf) / (z[0] + 0.5 * z[1]) * 0.5 * z[0];

    for (layer, (k, c)) in column.iter_mut().zip(kk.into_iter().zip(c_eff)) {
        layer.temperature = layer.temperature.min(T_MELT);
        layer.conductivity = k;
        layer.heat_capacity = c;
    }
}
