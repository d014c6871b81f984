//! Surface mass balance accumulation.
//!
//! The climatic surface mass balance combines precipitation, runoff and the
//! moisture phase-change fluxes. Snow mass tracks the balance, floored at
//! zero, and resets wherever the whole column has reached ice density (an
//! ice-capped column holds no residual snow).

use crate::constants::DENSITY_ICE;
use crate::diagnostics::PointDiagnostics;
use crate::forcing::MetPoint;
use crate::state::{Layer, SurfacePoint};

/// Update the mass-balance state of one point from this step's fluxes.
pub fn accumulate(
    surface: &mut SurfacePoint,
    column: &[Layer],
    met: &MetPoint,
    diag: &mut PointDiagnostics,
) {
    let smb = met.snowfall + met.rain - diag.runoff + diag.deposition + diag.condensation
        - diag.sublimation
        - diag.evaporation;

    surface.smb = smb;
    surface.smb_cumulative += smb;
    diag.smb = smb;

    surface.snowmass = (surface.snowmass + smb).max(0.0);
    if column.iter().all(|l| l.density >= DENSITY_ICE) {
        surface.snowmass = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn surface(snowmass: f64) -> SurfacePoint {
        SurfacePoint {
            tsurf: 270.0,
            albedo: 0.8,
            albedo_snow: 0.8,
            snowmass,
            surface_height: 0.0,
            time_last_snow: Utc.with_ymd_and_hms(1979, 1, 1, 0, 0, 0).unwrap(),
            annual_snow: 500.0,
            smb: 0.0,
            smb_cumulative: 0.0,
            deep_runoff_mean: 0.0,
        }
    }

    fn column(density: f64) -> Vec<Layer> {
        vec![
            Layer {
                thickness: 0.1,
                density,
                temperature: 265.0,
                water: 0.0,
                slush: 0.0,
                temp_mean: 265.0,
                heat_capacity: 0.0,
                conductivity: 0.0,
            };
            4
        ]
    }

    #[test]
    fn accumulation_raises_smb_and_snow_mass() {
        let mut surf = surface(0.1);
        let col = column(400.0);
        let met = MetPoint {
            snowfall: 0.02,
            rain: 0.005,
            ..MetPoint::default()
        };
        let mut diag = PointDiagnostics {
            runoff: 0.003,
            deposition: 0.001,
            ..PointDiagnostics::default()
        };
        accumulate(&mut surf, &col, &met, &mut diag);

        let expected = 0.02 + 0.005 - 0.003 + 0.001;
        assert!((surf.smb - expected).abs() < 1e-12);
        assert!((surf.snowmass - (0.1 + expected)).abs() < 1e-12);
        assert!((surf.smb_cumulative - expected).abs() < 1e-12);
    }

    #[test]
    fn snow_mass_floors_at_zero() {
        let mut surf = surface(0.01);
        let col = column(400.0);
        let met = MetPoint::default();
        let mut diag = PointDiagnostics {
            runoff: 0.05,
            ..PointDiagnostics::default()
        };
        accumulate(&mut surf, &col, &met, &mut diag);
        assert_eq!(surf.snowmass, 0.0);
        assert!(surf.smb < 0.0);
    }

    #[test]
    fn ice_capped_column_resets_snow_mass() {
        let mut surf = surface(0.5);
        let col = column(DENSITY_ICE);
        let met = MetPoint {
            snowfall: 0.01,
            ..MetPoint::default()
        };
        let mut diag = PointDiagnostics::default();
        accumulate(&mut surf, &col, &met, &mut diag);
        assert_eq!(surf.snowmass, 0.0);
    }
}
