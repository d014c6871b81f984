//! Phase 6: layer merging and splitting at the doubling-depth boundaries.
//!
//! Shifting phases move sub- or over-sized layers across the band
//! boundaries. At each boundary the first layer of the deeper band merges
//! with its neighbor above once it has shrunk to the shallower band's target
//! thickness (accumulation), and a layer two slots above the boundary splits
//! in half once it has grown beyond that target (ablation). Both operations
//! shift the deeper stack by one slot, keeping the layer count fixed: a
//! merge refills the bottom slot at the deepest band's target, a split drops
//! the bottom layer and exports its water to the runoff accounting.

use crate::constants::T_MELT;
use crate::grid::LayerScheme;
use crate::state::Layer;

use super::snowfall::ShedWater;

/// Apply merge/split regridding to one column.
pub fn merge_and_split(column: &mut [Layer], scheme: &LayerScheme) -> ShedWater {
    let mut shed = ShedWater::default();
    if !scheme.double_depth {
        return shed;
    }
    let nl = column.len();

    for (n, &boundary) in scheme.split.iter().enumerate() {
        let target = 2f64.powi(n as i32) * scheme.max_thickness;
        let s = boundary;

        if column[s].thickness <= target {
            // Accumulation: a shallow-band layer crossed the boundary.
            // Merge it into its neighbor above and pull the deeper stack up.
            let old = column.to_vec();
            let merged_z = old[s - 1].thickness + old[s].thickness;
            column[s - 1].thickness = merged_z;
            column[s - 1].water = old[s - 1].water + old[s].water;
            column[s - 1].slush = old[s - 1].slush + old[s].slush;
            column[s - 1].density = (old[s - 1].thickness * old[s - 1].density
                + old[s].thickness * old[s].density)
                / merged_z;
            column[s - 1].temperature = (old[s - 1].thickness * old[s - 1].temperature
                + old[s].thickness * old[s].temperature)
                / merged_z;

            for k in s..nl - 1 {
                column[k].thickness = old[k + 1].thickness;
                column[k].density = old[k + 1].density;
                column[k].temperature = old[k + 1].temperature;
                column[k].water = old[k + 1].water;
                column[k].slush = old[k + 1].slush;
            }

            // New bottom layer: band target thickness, temperature
            // extrapolated from the two deepest layers, no liquid water.
            column[nl - 1].thickness = scheme.bottom_target();
            column[nl - 1].temperature =
                (2.0 * old[nl - 1].temperature - old[nl - 2].temperature).min(T_MELT);
            column[nl - 1].density = old[nl - 1].density;
            column[nl - 1].water = 0.0;
            column[nl - 1].slush = 0.0;
        } else if column[s - 2].thickness > target {
            // Ablation: a layer above the boundary outgrew its band. Split
            // it in half and push the deeper stack down; the bottom layer
            // drops off into the runoff accounting.
            let old = column.to_vec();
            shed.deep_water_runoff += old[nl - 1].water;
            shed.slush_runoff += old[nl - 1].slush;

            column[s - 2].thickness = 0.5 * old[s - 2].thickness;
            column[s - 2].water = 0.5 * old[s - 2].water;
            column[s - 2].slush = 0.5 * old[s - 2].slush;

            column[s - 1].thickness = column[s - 2].thickness;
            column[s - 1].density = column[s - 2].density;
            column[s - 1].temperature = column[s - 2].temperature;
            column[s - 1].water = column[s - 2].water;
            column[s - 1].slush = column[s - 2].slush;

            for k in s..nl {
                column[k].thickness = old[k - 1].thickness;
                column[k].density = old[k - 1].density;
                column[k].temperature = old[k - 1].temperature;
                column[k].water = old[k - 1].water;
                column[k].slush = old[k - 1].slush;
            }
        }
    }

    shed
}
