//! Phase 2: melt and sublimation.
//!
//! The removed energy has already been converted to a mass flux by the
//! energy-balance solver; here that mass is taken from the top of the column
//! layer by layer. Once the top layer is consumed the stack shifts up one
//! slot and the vacated bottom slot is refilled at its band's target
//! thickness, keeping the layer count fixed. Liquid water in shrinking
//! layers scales with the remaining thickness; the difference is picked up
//! by the in-domain irreducible runoff bookkeeping at the end of the
//! compaction phase.

use crate::grid::LayerScheme;
use crate::state::{Layer, SurfacePoint};

/// Threshold below which a top layer counts as fully consumed (m).
const MIN_THICKNESS: f64 = 1e-17;

/// Remove melt and sublimation mass (both m w.e.) from the column top.
pub fn melt_and_sublimation(
    column: &mut [Layer],
    scheme: &LayerScheme,
    surface: &mut SurfacePoint,
    melt: f64,
    sublimation: f64,
) {
    let nl = column.len();
    let mut mass_removed = (melt + sublimation) * 1e3;
    if mass_removed <= 0.0 {
        return;
    }

    // Convert the removed mass to a (negative) thickness shift, consuming
    // layers from the top down. A column removed in its entirety saturates
    // at its total thickness.
    let mut shift_total = 0.0;
    for layer in column.iter() {
        if mass_removed <= 0.0 {
            break;
        }
        let layer_mass = layer.mass();
        if mass_removed > layer_mass {
            mass_removed -= layer_mass;
            shift_total -= layer.thickness;
        } else {
            shift_total -= mass_removed / layer_mass * layer.thickness;
            mass_removed = 0.0;
        }
    }

    while shift_total < 0.0 {
        // Never pull up by more than one layer-1 thickness at a time.
        let shift = shift_total.max(-column[1].thickness);
        shift_total -= shift;
        surface.surface_height += shift;

        let old = column.to_vec();

        if old[0].thickness + shift > MIN_THICKNESS {
            // The top layer shrinks; its water scales with the thickness.
            let z_new = old[0].thickness + shift;
            column[0].thickness = z_new;
            column[0].water = old[0].water * z_new / old[0].thickness;
            column[0].slush = old[0].slush * z_new / old[0].thickness;
        } else {
            // Top layer consumed: the remainder of the removal eats into
            // layer 1, everything below pulls up one slot, and the bottom
            // slot is refilled at the deepest band's target thickness.
            let z_new = old[0].thickness + old[1].thickness + shift;
            column[0].thickness = z_new;
            column[0].temperature = old[1].temperature;
            column[0].density = old[1].density;
            column[0].water = old[1].water * z_new / old[1].thickness;
            column[0].slush = old[1].slush * z_new / old[1].thickness;

            for k in 1..nl - 1 {
                column[k].thickness = old[k + 1].thickness;
                column[k].temperature = old[k + 1].temperature;
                column[k].density = old[k + 1].density;
                column[k].water = old[k + 1].water;
                column[k].slush = old[k + 1].slush;
            }

            column[nl - 1].thickness = scheme.bottom_target();
            column[nl - 1].temperature = old[nl - 1].temperature;
            column[nl - 1].density = old[nl - 1].density;
            column[nl - 1].water = 0.0;
            column[nl - 1].slush = 0.0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn surface() -> SurfacePoint {
        SurfacePoint {
            tsurf: 270.0,
            albedo: 0.8,
            albedo_snow: 0.8,
            snowmass: 0.0,
            surface_height: 0.0,
            time_last_snow: Utc.with_ymd_and_hms(1979, 1, 1, 0, 0, 0).unwrap(),
            annual_snow: 500.0,
            smb: 0.0,
            smb_cumulative: 0.0,
            deep_runoff_mean: 0.0,
        }
    }

    fn column(nl: usize) -> Vec<Layer> {
        (0..nl)
            .map(|k| Layer {
                thickness: 0.1,
                density: 400.0,
                temperature: 260.0 + k as f64,
                water: 1.0,
                slush: 0.0,
                temp_mean: 260.0,
                heat_capacity: 0.0,
                conductivity: 0.0,
            })
            .collect()
    }

    #[test]
    fn partial_removal_shrinks_top_layer_and_scales_water() {
        let scheme = LayerScheme::uniform(5, 0.1).unwrap();
        let mut surf = surface();
        let mut col = column(5);
        // Half the top layer: 20 kg of the 40 kg layer = 0.02 m w.e.
        melt_and_sublimation(&mut col, &scheme, &mut surf, 0.02, 0.0);

        assert!((col[0].thickness - 0.05).abs() < 1e-12);
        assert!((col[0].water - 0.5).abs() < 1e-12);
        assert_eq!(col.len(), 5);
        assert!((surf.surface_height + 0.05).abs() < 1e-12);
    }

    #[test]
    fn full_layer_removal_pulls_stack_up_and_refills_bottom() {
        let scheme = LayerScheme::uniform(4, 0.1).unwrap();
        let mut surf = surface();
        let mut col = column(4);
        // 1.5 layers: 60 kg = 0.06 m w.e.
        melt_and_sublimation(&mut col, &scheme, &mut surf, 0.06, 0.0);

        assert_eq!(col.len(), 4);
        // New top is the remaining half of the old layer 1.
        assert!((col[0].thickness - 0.05).abs() < 1e-12);
        assert_eq!(col[0].temperature, 261.0);
        assert!((col[0].water - 0.5).abs() < 1e-12);
        // Old layers 2 and 3 pulled up.
        assert_eq!(col[1].temperature, 262.0);
        assert_eq!(col[2].temperature, 263.0);
        // Vacated bottom refilled at the band target with no water.
        assert!((col[3].thickness - 0.1).abs() < 1e-12);
        assert_eq!(col[3].water, 0.0);
        assert_eq!(col[3].temperature, 263.0);
    }

    #[test]
    fn zero_removal_is_a_no_op() {
        let scheme = LayerScheme::uniform(4, 0.1).unwrap();
        let mut surf = surface();
        let mut col = column(4);
        let before = col.clone();
        melt_and_sublimation(&mut col, &scheme, &mut surf, 0.0, 0.0);
        assert_eq!(col, before);
        assert_eq!(surf.surface_height, 0.0);
    }

    #[test]
    fn removal_capped_at_total_column_mass() {
        let scheme = LayerScheme::uniform(3, 0.1).unwrap();
        let mut surf = surface();
        let mut col = column(3);
        // Ask for far more than the column holds; must not panic and must
        // keep the layer count.
        melt_and_sublimation(&mut col, &scheme, &mut surf, 10.0, 0.0);
        assert_eq!(col.len(), 3);
        for l in &col {
            assert!(l.thickness > 0.0);
        }
    }
}
