//! Phase 5: percolation, refreezing and liquid water storage.
//!
//! The liquid input (melt + rain + net condensation) is distributed over the
//! column by the configured percolation kernel, refreezes from the top down
//! against each layer's cold-content and pore-space limits, tops up the
//! irreducible storage, and finally pools as slush from the bottom up.
//! Slush decays exponentially toward runoff; stored slush and irreducible
//! water refreeze in two further passes under the same limits. Water beyond
//! the total pore space leaves immediately as surface runoff.

use crate::config::PercolationScheme;
use crate::constants::{
    heat_capacity_ice, irreducible_capacity, DENSITY_ICE, DENSITY_WATER, LATENT_MELT, T_MELT,
};
use crate::state::Layer;

/// Water bookkeeping of the percolation phase (all kg m⁻²).
#[derive(Debug, Clone, Copy, Default)]
pub struct PercolationResult {
    /// Refrozen percolating water.
    pub refreeze_percolation: f64,
    /// Refrozen slush water.
    pub refreeze_slush: f64,
    /// Refrozen irreducible water.
    pub refreeze_irreducible: f64,
    /// Water rejected at the surface (input beyond the total pore space).
    pub runoff_surface: f64,
    /// Slush released to runoff by the storage decay.
    pub runoff_slush: f64,
    /// Slush stored in the column after the phase.
    pub slush_total: f64,
    /// Irreducible water stored in the column after the phase.
    pub irreducible_total: f64,
}

/// Per-layer kernel weights for the liquid input, scaled by layer thickness
/// and normalized so they sum to `available` exactly.
fn input_distribution(
    column: &[Layer],
    scheme: PercolationScheme,
    characteristic_depth: f64,
    available: f64,
) -> Vec<f64> {
    let nl = column.len();
    let z0 = characteristic_depth;

    // Layer midpoint depths.
    let mut depth = Vec::with_capacity(nl);
    let mut cum = 0.0;
    for layer in column {
        depth.push(cum + 0.5 * layer.thickness);
        cum += layer.thickness;
    }

    let mut weights = vec![0.0; nl];
    match scheme {
        PercolationScheme::Bucket => weights[0] = 1.0,
        PercolationScheme::Normal => {
            let sigma = z0 / 3.0;
            for (w, &zz) in weights.iter_mut().zip(&depth) {
                *w = 2.0 * (-zz * zz / (2.0 * sigma * sigma)).exp()
                    / sigma
                    / (2.0 * std::f64::consts::PI).sqrt();
            }
        }
        PercolationScheme::Linear => {
            for (w, &zz) in weights.iter_mut().zip(&depth) {
                *w = (2.0 * (z0 - zz) / (z0 * z0)).max(0.0);
            }
        }
        PercolationScheme::Uniform => {
            // Uniform down to the layer whose midpoint is closest to z0.
            let mut deepest = 0;
            let mut best = f64::INFINITY;
            for (k, &zz) in depth.iter().enumerate() {
                let d = (zz - z0).abs();
                if d < best {
                    best = d;
                    deepest = k;
                }
            }
            for w in weights.iter_mut().take(deepest + 1) {
                *w = 1.0 / z0;
            }
        }
    }

    for (w, layer) in weights.iter_mut().zip(column) {
        *w *= layer.thickness;
    }
    let total: f64 = weights.iter().sum();
    if total > 0.0 {
        for w in &mut weights {
            *w *= available / total;
        }
    } else {
        // Degenerate kernel (e.g. every midpoint beyond the characteristic
        // depth): fall back to surface input.
        weights[0] = available;
    }
    weights
}

/// Cold-content and pore-space refreezing limit of a layer (kg m⁻²).
#[inline]
fn refreeze_limit(layer: &Layer) -> f64 {
    let cold_content = heat_capacity_ice(layer.temperature)
        * layer.density
        * layer.thickness
        * (T_MELT - layer.temperature)
        / LATENT_MELT;
    let pore = layer.pore_space() * DENSITY_ICE;
    cold_content.min(pore).max(0.0)
}

/// Refreeze `amount` into a layer: warms it by the released latent heat and
/// densifies it by the refrozen mass.
#[inline]
fn apply_refreeze(layer: &mut Layer, amount: f64, cpi: f64) {
    if amount <= 0.0 {
        return;
    }
    layer.temperature +=
        LATENT_MELT * amount / (layer.density * cpi * layer.thickness);
    layer.density += amount / layer.thickness;
}

/// Run the percolation/refreezing/storage phase on one column.
///
/// `melt`, `rain`, `condensation` and `evaporation` are in m w.e. for this
/// timestep.
pub fn percolate_and_refreeze(
    column: &mut [Layer],
    scheme: PercolationScheme,
    characteristic_depth: f64,
    slush_runoff_days: f64,
    timestep_days: f64,
    melt: f64,
    rain: f64,
    condensation: f64,
    evaporation: f64,
) -> PercolationResult {
    let nl = column.len();
    let mut out = PercolationResult::default();

    let available = ((melt + rain + condensation - evaporation) * 1e3).max(0.0);
    let input = input_distribution(column, scheme, characteristic_depth, available);

    // ------ Top-down refreezing of percolating water ------
    let water_old: Vec<f64> = column.iter().map(|l| l.water).collect();
    let cpi: Vec<f64> = column
        .iter()
        .map(|l| heat_capacity_ice(l.temperature))
        .collect();
    let limits: Vec<f64> = column.iter().map(refreeze_limit).collect();
    let capacity: Vec<f64> = column
        .iter()
        .map(|l| irreducible_capacity(l.density, l.thickness))
        .collect();

    let mut carried = 0.0;
    for n in 0..nl {
        carried += input[n];

        let refrozen;
        if carried > limits[n] {
            refrozen = limits[n];
            let left = carried - refrozen;
            let stored = left.min((capacity[n] - water_old[n]).max(0.0));
            column[n].water = water_old[n] + stored;
        } else {
            refrozen = carried;
        }
        carried -= refrozen + (column[n].water - water_old[n]);

        apply_refreeze(&mut column[n], refrozen, cpi[n]);
        out.refreeze_percolation += refrozen;
    }

    // ------ Slush storage with exponential release ------
    let slush_space: Vec<f64> = column
        .iter()
        .map(|l| (l.pore_space() * DENSITY_WATER - l.water).max(0.0))
        .collect();
    let total_space: f64 = slush_space.iter().sum();

    let mut pooled = carried + column.iter().map(|l| l.slush).sum::<f64>();
    out.runoff_surface = (pooled - total_space).max(0.0);
    pooled = pooled.min(total_space);

    let retained = 1.0 / (1.0 + timestep_days / slush_runoff_days);
    out.runoff_slush = pooled * (1.0 - retained);
    pooled *= retained;
    if pooled < 1e-25 {
        pooled = 0.0;
    }

    // Bottom-up filling of the remaining pore space.
    for n in (0..nl).rev() {
        let stored = pooled.min(slush_space[n]);
        column[n].slush = stored;
        pooled -= stored;
    }

    // ------ Refreezing of stored slush ------
    for layer in column.iter_mut() {
        if layer.slush > 0.0 && layer.temperature < T_MELT {
            let cpi = heat_capacity_ice(layer.temperature);
            let refrozen = layer.slush.min(refreeze_limit(layer));
            layer.slush -= refrozen;
            apply_refreeze(layer, refrozen, cpi);
            out.refreeze_slush += refrozen;
        }
    }

    // ------ Refreezing of irreducible water ------
    for layer in column.iter_mut() {
        if layer.water > 0.0 && layer.temperature < T_MELT {
            let cpi = heat_capacity_ice(layer.temperature);
            let refrozen = layer.water.min(refreeze_limit(layer));
            layer.water -= refrozen;
            apply_refreeze(layer, refrozen, cpi);
            out.refreeze_irreducible += refrozen;
        }
    }

    out.slush_total = column.iter().map(|l| l.slush).sum();
    out.irreducible_total = column.iter().map(|l| l.water).sum();
    out
}
