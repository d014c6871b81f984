//! Multi-layer snow/firn column model.
//!
//! Seven ordered phases advance one column through a timestep:
//!
//! 1. snowfall & vapor deposition (mass insertion, downward shifts)
//! 2. melt & sublimation (mass removal, upward shifts)
//! 3. compaction (firn + seasonal snow densification)
//! 4. heat conduction (sub-stepped explicit diffusion)
//! 5. percolation, refreezing & water storage
//! 6. layer merging/splitting at the doubling-depth boundaries
//! 7. runoff aggregation
//!
//! Every phase is a pure function of the column state plus the step inputs
//! and runs independently per grid point; shifting phases snapshot the column
//! before rewriting it so no update reads a slot the same pass already wrote.

pub mod ablation;
pub mod compaction;
pub mod conduction;
pub mod percolation;
pub mod regrid;
pub mod runoff;
pub mod snowfall;

use crate::config::ModelConfig;
use crate::diagnostics::PointDiagnostics;
use crate::energy_balance::SurfaceSolution;
use crate::forcing::MetPoint;
use crate::grid::LayerScheme;
use crate::state::{Layer, SurfacePoint};

/// Advance one column through all seven phases.
///
/// `surface` and `column` are the point's persistent state; `met` and
/// `solution` are this step's forcing and energy-balance result. Diagnostics
/// are written into `diag`.
pub fn step_column(
    config: &ModelConfig,
    scheme: &LayerScheme,
    met: &MetPoint,
    solution: &SurfaceSolution,
    surface: &mut SurfacePoint,
    column: &mut [Layer],
    diag: &mut PointDiagnostics,
) {
    let dt = config.timestep_days;

    // 1. Snowfall and riming add mass at the surface.
    let fresh_density = snowfall::fresh_snow_density(config.compaction, met.t_air, met.wind);
    let added = snowfall::snowfall_and_deposition(
        column,
        scheme,
        surface,
        met.snowfall,
        solution.deposition,
        fresh_density,
    );
    let mut deep_water_runoff = added.deep_water_runoff;
    let mut slush_runoff_extra = added.slush_runoff;
    diag.fresh_snow_density = fresh_density;

    // 2. Melt and sublimation remove mass from the top. The column water
    // total before removal anchors the in-domain irreducible runoff
    // bookkeeping closed out by the compaction phase.
    let water_before = column.iter().map(|l| l.water).sum::<f64>();
    ablation::melt_and_sublimation(
        column,
        scheme,
        surface,
        solution.melt,
        solution.sublimation,
    );

    // 3. Compaction densifies the column and truncates water the shrinking
    // pore space can no longer hold.
    let irr_runoff = compaction::compact(
        column,
        config.compaction,
        surface,
        met.wind,
        dt,
        water_before,
    );

    // 4. Heat conduction under the resolved surface temperature.
    conduction::heat_conduction(column, solution.tsurf, config.geothermal_flux, dt);

    // 5. Liquid water input percolates, refreezes, and is stored.
    let perc = percolation::percolate_and_refreeze(
        column,
        config.percolation,
        config.percolation_depth,
        config.slush_runoff_days,
        dt,
        solution.melt,
        met.rain,
        solution.condensation,
        solution.evaporation,
    );

    // 6. Regridding keeps the doubling-depth structure intact.
    let shed = regrid::merge_and_split(column, scheme);
    deep_water_runoff += shed.deep_water_runoff;
    slush_runoff_extra += shed.slush_runoff;

    // 7. Aggregate runoff and expose the basal ice temperature.
    runoff::aggregate(
        surface,
        diag,
        dt,
        perc.runoff_surface,
        perc.runoff_slush + slush_runoff_extra,
        irr_runoff,
        deep_water_runoff,
    );

    diag.refreeze_percolation = 1e-3 * perc.refreeze_percolation;
    diag.refreeze_slush = 1e-3 * perc.refreeze_slush;
    diag.refreeze_irreducible = 1e-3 * perc.refreeze_irreducible;
    diag.refreeze = diag.refreeze_percolation + diag.refreeze_slush + diag.refreeze_irreducible;
    diag.slush_water = perc.slush_total;
    diag.irreducible_water = perc.irreducible_total;
    diag.ice_temperature = column[column.len() - 1].temperature;
}
