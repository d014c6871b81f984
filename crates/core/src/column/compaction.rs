//! Phase 3: densification of firn and seasonal snow.
//!
//! Firn densifies under a gravitational/Arrhenius law driven by the annual
//! snow load and the annual-mean layer temperature (Ligtenberg et al. 2011).
//! With the seasonal-snow scheme active, layers below firn density also
//! densify by destructive metamorphism, overburden pressure over a
//! temperature- and density-dependent viscosity, and wind drift attenuated
//! with depth (van Kampenhout et al. 2017). Densities clamp at the ice
//! density and layer thickness rescales inversely to conserve mass; water in
//! excess of the shrunken pore space is truncated and later reported as
//! in-domain irreducible runoff.

use crate::config::CompactionScheme;
use crate::constants::{
    irreducible_capacity, DAY_SECONDS, DENSITY_FIRN, DENSITY_ICE, DENSITY_WATER, E_CREEP,
    E_GRAIN, GRAVITY, R_UNIVERSAL, T_MELT, YEAR_DAYS,
};
use crate::state::{Layer, SurfacePoint};

/// Densify the column over one timestep and return the in-domain
/// irreducible-water runoff (kg m⁻²): the water lost from storage since
/// `water_before` was sampled at the start of the ablation phase.
pub fn compact(
    column: &mut [Layer],
    scheme: CompactionScheme,
    surface: &mut SurfacePoint,
    wind: f64,
    timestep_days: f64,
    water_before: f64,
) -> f64 {
    let dt_yearfrac = timestep_days / YEAR_DAYS;
    let dt_seconds = timestep_days * DAY_SECONDS;

    let old: Vec<Layer> = column.to_vec();

    // Annual snowfall statistics feeding the gravitational law.
    let annual_snow = surface.annual_snow.max(1e-6);
    let log_annual_snow = annual_snow.ln();

    // ------ Firn densification ------
    for layer in column.iter_mut() {
        // Running annual mean temperature advances for every layer.
        layer.temp_mean =
            (1.0 - dt_yearfrac) * layer.temp_mean + dt_yearfrac * layer.temperature;

        let is_firn = match scheme {
            CompactionScheme::FirnOnly => true,
            CompactionScheme::FirnAndSnow => layer.density >= DENSITY_FIRN,
        };
        if !is_firn {
            continue;
        }

        let grav = if layer.density < 550.0 {
            0.07 * (1.435 - 0.151 * log_annual_snow).max(0.25)
        } else {
            0.03 * (2.366 - 0.293 * log_annual_snow).max(0.25)
        };
        let arrhenius = (-E_CREEP / (R_UNIVERSAL * layer.temperature)
            + E_GRAIN / (R_UNIVERSAL * layer.temp_mean))
            .exp();
        layer.density = (layer.density
            + dt_yearfrac
                * grav
                * annual_snow
                * GRAVITY
                * (DENSITY_ICE - layer.density)
                * arrhenius)
            .min(DENSITY_ICE);
    }

    // ------ Seasonal snow densification ------
    if scheme == CompactionScheme::FirnAndSnow {
        let is_snow: Vec<bool> = column.iter().map(|l| l.density < DENSITY_FIRN).collect();

        // Destructive metamorphism: density- and temperature-dependent
        // exponential decay of the fresh-snow structure, doubled for wet
        // layers.
        for (layer, &snow) in column.iter_mut().zip(&is_snow) {
            if !snow {
                continue;
            }
            let c1 = (-0.046 * (layer.density - 175.0).max(0.0)).exp();
            let c2 = if layer.water != 0.0 { 2.0 } else { 1.0 };
            let increment =
                c1 * c2 * 2.777e-6 * (0.04 * (layer.temperature - T_MELT)).exp() * dt_seconds
                    * layer.density;
            layer.density = (layer.density + increment).min(DENSITY_ICE);
        }

        // Overburden pressure: the cumulative load above each layer over a
        // temperature/density/water-dependent viscosity.
        let mut cumulative_load = 0.0;
        for (layer, &snow) in column.iter_mut().zip(&is_snow) {
            let weight = layer.density * layer.thickness * GRAVITY;
            let load = cumulative_load + 0.5 * weight;
            cumulative_load += weight;
            if !snow {
                continue;
            }
            let viscosity = 4.0 * 7.62237e6 / 250.0 * layer.density
                / (1.0 + 60.0 * layer.water / (DENSITY_WATER * layer.thickness))
                * (0.1 * (T_MELT - layer.temperature) + 0.023 * layer.density).exp();
            let increment = dt_seconds * layer.density * load / viscosity;
            layer.density = (layer.density + increment).min(DENSITY_ICE);
        }

        // Wind drift: only effective near the surface, attenuated by the
        // cumulative drift-resistance depth of the layers above.
        let mut drift_depth: f64 = 0.0;
        for layer in column.iter_mut() {
            let mobility =
                -0.069 + 0.66 * (1.25 - 0.0042 * (layer.density.max(50.0) - 50.0));
            let drift_index = -2.868 * (-0.085 * wind).exp() + 1.0 + mobility;
            let gamma = (drift_index * (-drift_depth / 0.1).exp()).max(0.0);
            drift_depth += layer.thickness * (3.25 - drift_index);

            if drift_index > 0.0 && layer.density < DENSITY_FIRN {
                let tau = 48.0 * 2.0 * 3600.0;
                let increment =
                    dt_seconds * (350.0 - layer.density).max(0.0) * gamma / tau;
                layer.density = (layer.density + increment).min(DENSITY_ICE);
            }
        }
    }

    // ------ Thickness rescale and water truncation ------
    for (layer, old_layer) in column.iter_mut().zip(&old) {
        if layer.density < DENSITY_ICE {
            layer.thickness = old_layer.thickness * old_layer.density / layer.density;
        }
        layer.water = layer.water.min(irreducible_capacity(layer.density, layer.thickness));
    }

    let thickness_change: f64 = column.iter().map(|l| l.thickness).sum::<f64>()
        - old.iter().map(|l| l.thickness).sum::<f64>();
    surface.surface_height += thickness_change;

    water_before - column.iter().map(|l| l.water).sum::<f64>()
}
