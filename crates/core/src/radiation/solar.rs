//! Solar geometry and topographic self-shading.
//!
//! Top-of-atmosphere irradiance, solar declination and hour angle follow the
//! approximation formulas of Iqbal (1983) and Meyers & Dale (1983). Shading
//! ray-marches the structured elevation raster along the solar azimuth,
//! capped at a fixed step count and short-circuiting once every point is
//! shaded.

use chrono::{DateTime, Datelike, Timelike, Utc};

use crate::grid::Grid;

/// Maximum number of raster steps the shading ray-march takes per point.
const MAX_SHADE_STEPS: usize = 200;

/// Solar position for one timestep.
#[derive(Debug, Clone)]
pub struct SolarGeometry {
    /// Top-of-atmosphere irradiance on a surface normal to the beam (W m⁻²).
    pub toa_normal: f64,
    /// Solar declination (radians).
    pub declination: f64,
    /// Solar hour angle per grid point (radians); varies with longitude.
    pub hour_angle: Vec<f64>,
    /// Solar elevation angle per grid point (radians).
    pub elevation: Vec<f64>,
}

impl SolarGeometry {
    /// Solar geometry at `date` for every grid point.
    #[must_use]
    pub fn new(date: DateTime<Utc>, utc_offset_hours: f64, grid: &Grid) -> Self {
        // Fractional day of year, in radians around the orbit.
        let day_of_year = f64::from(date.ordinal0())
            + f64::from(date.num_seconds_from_midnight()) / 86400.0;
        let trad = 2.0 * std::f64::consts::PI * day_of_year / 365.242;

        let toa_normal = 1353.0 * (1.0 + 0.034 * trad.cos());

        // Declination approximation (degrees), Iqbal (1983).
        let decl_deg = 0.322003 - 22.971 * trad.cos() - 0.357898 * (2.0 * trad).cos()
            - 0.14398 * (3.0 * trad).cos()
            + 3.94638 * trad.sin()
            + 0.019334 * (2.0 * trad).sin()
            + 0.05928 * (3.0 * trad).sin();
        let declination = decl_deg.to_radians();

        // Equation-of-time correction for orbital eccentricity (minutes).
        let b = (360.0 / 365.0 * (day_of_year - 81.0)).to_radians();
        let tcor_ecc = 9.87 * (2.0 * b).sin() - 7.53 * b.cos() - 1.5 * b.sin();

        let hour = f64::from(date.hour()) + f64::from(date.minute()) / 60.0;

        let mut hour_angle = Vec::with_capacity(grid.len());
        let mut elevation = Vec::with_capacity(grid.len());
        for gp in &grid.points {
            // Longitude correction within the time zone (minutes).
            let tcor_lon = 4.0 * (gp.longitude - 15.0 * utc_offset_hours);
            let local_solar_time = hour + (tcor_ecc + tcor_lon) / 60.0;
            let h = (15.0 * (local_solar_time - 12.0)).to_radians();

            let lat = gp.latitude.to_radians();
            let sin_elev =
                lat.sin() * declination.sin() + lat.cos() * declination.cos() * h.cos();
            hour_angle.push(h);
            elevation.push(sin_elev.clamp(-1.0, 1.0).asin());
        }

        Self {
            toa_normal,
            declination,
            hour_angle,
            elevation,
        }
    }

    /// Solar azimuth per point (radians), measured from the raster marching
    /// convention used by [`shading_mask`]: positive before solar noon.
    #[must_use]
    pub fn azimuth(&self, grid: &Grid) -> Vec<f64> {
        grid.points
            .iter()
            .enumerate()
            .map(|(i, gp)| {
                let lat = gp.latitude.to_radians();
                let h = self.hour_angle[i];
                let d = self.declination;
                let cos_elev = self.elevation[i].cos();
                let arg = ((h.cos() * d.cos() * lat.sin() - d.sin() * lat.cos())
                    / cos_elev)
                    .clamp(-1.0, 1.0);
                if h < 0.0 {
                    arg.acos()
                } else {
                    -arg.acos()
                }
            })
            .collect()
    }
}

/// Shading mask per point: 1.0 where direct sunlight is blocked, else 0.0.
///
/// With a topography raster the mask is found by marching along the solar
/// azimuth and comparing the terrain elevation angle against the solar
/// elevation. Without one, a point is shaded exactly when the sun is below
/// the horizon.
#[must_use]
pub fn shading_mask(grid: &Grid, solar: &SolarGeometry) -> Vec<f64> {
    let Some(topo) = &grid.topography else {
        return solar
            .elevation
            .iter()
            .map(|&e| if e < 0.0 { 1.0 } else { 0.0 })
            .collect();
    };

    let azimuth = solar.azimuth(grid);
    let n = grid.len();

    // Per-point raster step direction from the azimuth octant; steps are
    // unit raster moves with a tangent-scaled minor component.
    let mut step_col = vec![0.0f64; n];
    let mut step_row = vec![0.0f64; n];
    for i in 0..n {
        use std::f64::consts::PI;
        let az = azimuth[i];
        let (dc, dr) = if az <= -0.75 * PI {
            (-(PI + az).tan(), 1.0)
        } else if az <= -0.25 * PI {
            (-1.0, -(PI / 2.0 + az).tan())
        } else if az <= 0.25 * PI {
            (az.tan(), -1.0)
        } else if az <= 0.75 * PI {
            (1.0, -(PI / 2.0 - az).tan())
        } else {
            ((PI - az).tan(), 1.0)
        };
        step_col[i] = dc;
        step_row[i] = dr;
    }

    let mut shade = vec![0.0f64; n];
    for count in 1..=MAX_SHADE_STEPS {
        let mut all_shaded = true;
        for i in 0..n {
            if shade[i] == 1.0 {
                continue;
            }
            let (row, col) = topo.point_cells[i];
            let z_here = topo.elevation[row * topo.cols + col];

            let r = row as i64 + (step_row[i] * count as f64).round() as i64;
            let c = col as i64 + (step_col[i] * count as f64).round() as i64;
            let z_there = topo.elevation_at(r, c);

            let distance =
                count as f64 * topo.spacing * step_col[i].hypot(step_row[i]);
            let terrain_angle = ((z_there - z_here) / distance).atan();
            if solar.elevation[i] <= terrain_angle {
                shade[i] = 1.0;
            } else {
                all_shaded = false;
            }
        }
        if all_shaded {
            break;
        }
    }
    shade
}
