//! Incoming shortwave radiation.
//!
//! The computed path evaluates top-of-atmosphere radiation on the local
//! slope, splits it into direct and diffuse parts after shading (Oerlemans
//! 1992), and attenuates through gaseous, water-vapor, aerosol, and cloud
//! transmissivities (Meyers & Dale 1983; Atwater & Brown 1974; McDonald
//! 1960; Houghton 1954; Van Pelt et al. 2012). The supplied path applies the
//! same diffuse/direct split directly to the shortwave flux delivered by an
//! external atmosphere model.

use crate::config::RadiationInput;
use crate::constants::{EPS_VAPOR, K_AEROSOL, LATENT_SUBLIMATION, P_REF, R_VAPOR, VP_TRIPLE};
use crate::forcing::Forcing;
use crate::grid::Grid;
use crate::radiation::solar::SolarGeometry;

/// Shortwave flux components for one timestep.
#[derive(Debug, Clone)]
pub struct Shortwave {
    /// Top-of-atmosphere radiation on the local slope (W m⁻²). Zero on the
    /// supplied path, which never evaluates it.
    pub toa: Vec<f64>,
    /// Incoming shortwave at the surface (W m⁻²).
    pub sw_in: Vec<f64>,
}

/// Incoming shortwave for all grid points.
#[must_use]
pub fn incoming_shortwave(
    grid: &Grid,
    solar: &SolarGeometry,
    shade: &[f64],
    forcing: &Forcing,
    mode: RadiationInput,
) -> Shortwave {
    match mode {
        RadiationInput::Supplied => supplied(forcing, shade),
        RadiationInput::Computed => computed(grid, solar, shade, forcing),
    }
}

/// Diffuse/direct split of a supplied shortwave flux: the diffuse fraction
/// grows with cloud cover and only the direct part is masked by shading.
fn supplied(forcing: &Forcing, shade: &[f64]) -> Shortwave {
    let n = forcing.points.len();
    let mut sw_in = Vec::with_capacity(n);
    for (met, &sh) in forcing.points.iter().zip(shade) {
        let diffuse = (0.8 - 0.65 * (1.0 - met.cloud)) * met.sw_in;
        let direct = (0.2 + 0.65 * (1.0 - met.cloud)) * (1.0 - sh) * met.sw_in;
        sw_in.push(direct + diffuse);
    }
    Shortwave {
        toa: vec![0.0; n],
        sw_in,
    }
}

fn computed(grid: &Grid, solar: &SolarGeometry, shade: &[f64], forcing: &Forcing) -> Shortwave {
    let lambda = water_vapor_lambda(grid.mean_abs_latitude());
    let d = solar.declination;

    let mut toa_slope = Vec::with_capacity(grid.len());
    let mut sw_in = Vec::with_capacity(grid.len());

    for (i, gp) in grid.points.iter().enumerate() {
        let met = &forcing.points[i];
        let lat = gp.latitude.to_radians();
        let h = solar.hour_angle[i];
        let beta = gp.slope_beta;
        let gamma = gp.slope_gamma;

        // Top of the atmosphere on a horizontal surface (may be negative
        // below the horizon; only its square enters the air-mass term).
        let toa_flat = solar.toa_normal
            * (lat.sin() * d.sin() + lat.cos() * d.cos() * h.cos());

        // Top of the atmosphere on the local slope, Iqbal (1983).
        let toa = (solar.toa_normal
            * ((lat.sin() * beta.cos() - lat.cos() * beta.sin() * gamma.cos()) * d.sin()
                + (lat.cos() * beta.cos() + lat.sin() * beta.sin() * gamma.cos())
                    * d.cos()
                    * h.cos()
                + d.cos() * beta.sin() * gamma.sin() * h.sin()))
        .max(0.0);

        // Direct part is masked by topographic shading, diffuse part is not.
        let direct = (0.2 + 0.65 * (1.0 - met.cloud)) * (1.0 - shade[i]) * toa;
        let diffuse = (0.8 - 0.65 * (1.0 - met.cloud)) * toa;
        let toa_shaded = direct + diffuse;

        // Relative optical air mass.
        let m = 35.0 * (met.pressure / P_REF)
            / (1224.0 * (toa_flat / solar.toa_normal).powi(2) + 1.0).sqrt();

        // Gaseous absorption and scattering.
        let t_rg = 1.021 - 0.084 * (m * (949.0 * (met.pressure / 1e3) * 1e-5 + 0.051)).sqrt();

        // Water vapor absorption via the dew point.
        let q = met.spec_humidity.max(1e-12);
        let t_dew_k = 1.0
            / (1.0 / 273.15
                - (R_VAPOR / LATENT_SUBLIMATION) * (q * met.pressure / (EPS_VAPOR * VP_TRIPLE)).ln());
        let t_dew_f = 32.0 + 1.8 * (t_dew_k - 273.15);
        let u = (0.1133 - (lambda + 1.0).ln() + 0.0393 * t_dew_f).exp();
        let t_w = 1.0 - 0.077 * (u * m).powf(0.3);

        // Aerosol and cloud attenuation.
        let t_a = K_AEROSOL.powf(m);
        let t_cl = 1.0 - 0.128 * met.cloud - 0.346 * met.cloud.powi(2);

        toa_slope.push(toa);
        sw_in.push(toa_shaded * t_rg * t_w * t_a * t_cl);
    }

    Shortwave {
        toa: toa_slope,
        sw_in,
    }
}

/// Latitude-banded precipitable-water coefficient λ of the water-vapor
/// transmissivity parametrization.
fn water_vapor_lambda(mean_abs_latitude: f64) -> f64 {
    match mean_abs_latitude {
        l if l < 20.0 => 2.91,
        l if l < 30.0 => 3.12,
        l if l < 40.0 => 3.00,
        l if l < 50.0 => 2.78,
        l if l < 60.0 => 2.79,
        l if l < 70.0 => 2.41,
        l if l < 80.0 => 2.03,
        _ => 1.62,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{GridPoint, LayerScheme};
    use chrono::{TimeZone, Utc};

    fn grid_at(lat: f64) -> Grid {
        Grid::new(
            vec![GridPoint::flat(lat, 0.0, 100.0)],
            LayerScheme::uniform(5, 0.1).unwrap(),
            None,
        )
        .unwrap()
    }

    fn forcing_clear_sky() -> Forcing {
        let mut f = Forcing::new(1);
        f.points[0].t_air = 270.0;
        f.points[0].rel_humidity = 0.6;
        f.points[0].pressure = 1.0e5;
        f.derive_fields(&grid_at(45.0), RadiationInput::Computed);
        f
    }

    #[test]
    fn computed_noon_flux_is_positive_and_below_toa() {
        let grid = grid_at(45.0);
        let date = Utc.with_ymd_and_hms(1979, 6, 21, 12, 0, 0).unwrap();
        let solar = SolarGeometry::new(date, 0.0, &grid);
        let shade = vec![0.0];
        let sw = incoming_shortwave(&grid, &solar, &shade, &forcing_clear_sky(), RadiationInput::Computed);
        assert!(sw.sw_in[0] > 0.0);
        assert!(sw.sw_in[0] < sw.toa[0]);
    }

    #[test]
    fn computed_flux_vanishes_at_night() {
        let grid = grid_at(45.0);
        let date = Utc.with_ymd_and_hms(1979, 6, 21, 0, 0, 0).unwrap();
        let solar = SolarGeometry::new(date, 0.0, &grid);
        let shade = shading_mask_for(&grid, &solar);
        let sw = incoming_shortwave(&grid, &solar, &shade, &forcing_clear_sky(), RadiationInput::Computed);
        assert_eq!(sw.sw_in[0], 0.0);
    }

    fn shading_mask_for(grid: &Grid, solar: &SolarGeometry) -> Vec<f64> {
        crate::radiation::solar::shading_mask(grid, solar)
    }

    #[test]
    fn clouds_reduce_the_computed_flux() {
        let grid = grid_at(45.0);
        let date = Utc.with_ymd_and_hms(1979, 6, 21, 12, 0, 0).unwrap();
        let solar = SolarGeometry::new(date, 0.0, &grid);
        let shade = vec![0.0];

        let clear = forcing_clear_sky();
        let mut cloudy = forcing_clear_sky();
        cloudy.points[0].cloud = 1.0;

        let sw_clear =
            incoming_shortwave(&grid, &solar, &shade, &clear, RadiationInput::Computed);
        let sw_cloudy =
            incoming_shortwave(&grid, &solar, &shade, &cloudy, RadiationInput::Computed);
        assert!(sw_cloudy.sw_in[0] < sw_clear.sw_in[0]);
    }

    #[test]
    fn supplied_path_splits_and_masks_direct_only() {
        let grid = grid_at(45.0);
        let date = Utc.with_ymd_and_hms(1979, 6, 21, 12, 0, 0).unwrap();
        let solar = SolarGeometry::new(date, 0.0, &grid);

        let mut f = Forcing::new(1);
        f.points[0].cloud = 0.0;
        f.points[0].sw_in = 500.0;

        let unshaded =
            incoming_shortwave(&grid, &solar, &[0.0], &f, RadiationInput::Supplied);
        let shaded = incoming_shortwave(&grid, &solar, &[1.0], &f, RadiationInput::Supplied);

        // Clear sky: 85% direct + 15% diffuse; full shade removes the direct.
        assert!((unshaded.sw_in[0] - 500.0).abs() < 1e-9);
        assert!((shaded.sw_in[0] - 0.15 * 500.0).abs() < 1e-9);
    }
}
