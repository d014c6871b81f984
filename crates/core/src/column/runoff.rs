//! Phase 7: runoff aggregation.
//!
//! Surface, slush and in-domain irreducible runoff leave within the
//! timestep; irreducible water shed at the column bottom is smoothed over a
//! one-year window before it counts, representing the long travel time of
//! deep englacial drainage.

use crate::constants::YEAR_DAYS;
use crate::diagnostics::PointDiagnostics;
use crate::state::SurfacePoint;

/// Combine the runoff components (kg m⁻²) into the per-step diagnostics
/// (m w.e.) and advance the deep-runoff smoothing state.
pub fn aggregate(
    surface: &mut SurfacePoint,
    diag: &mut PointDiagnostics,
    timestep_days: f64,
    runoff_surface: f64,
    runoff_slush: f64,
    runoff_irreducible: f64,
    deep_water_runoff: f64,
) {
    let weight = timestep_days / YEAR_DAYS;
    surface.deep_runoff_mean =
        surface.deep_runoff_mean * (1.0 - weight) + deep_water_runoff * weight;

    diag.runoff_surface = 1e-3 * runoff_surface;
    diag.runoff_slush = 1e-3 * runoff_slush;
    diag.runoff_irreducible = 1e-3 * runoff_irreducible;
    diag.runoff_deep = 1e-3 * surface.deep_runoff_mean;
    diag.runoff = diag.runoff_surface + diag.runoff_slush + diag.runoff_irreducible
        + diag.runoff_deep;
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

    #[test]
    fn components_sum_into_total_runoff() {
        let mut surf = surface();
        let mut diag = PointDiagnostics::default();
        aggregate(&mut surf, &mut diag, 0.125, 10.0, 5.0, 2.0, 0.0);
        assert!((diag.runoff - 1e-3 * 17.0).abs() < 1e-12);
    }

    #[test]
    fn deep_runoff_is_smoothed_over_a_year() {
        let mut surf = surface();
        let mut diag = PointDiagnostics::default();
        // A single large deep-runoff pulse barely shows up in one step...
        aggregate(&mut surf, &mut diag, 1.0, 0.0, 0.0, 0.0, 100.0);
        assert!(diag.runoff_deep < 1e-3 * 1.0);
        // ...but a year of steady input converges toward it.
        for _ in 0..3000 {
            aggregate(&mut surf, &mut diag, 1.0, 0.0, 0.0, 0.0, 100.0);
        }
        assert!((surf.deep_runoff_mean - 100.0).abs() < 1.0);
    }
}
