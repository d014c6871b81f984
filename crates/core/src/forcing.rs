//! Meteorological forcing and derived fields.
//!
//! Collaborators hand the core one [`Forcing`] per timestep with the raw
//! meteorology filled in; [`Forcing::derive_fields`] then completes the
//! secondary quantities the physics needs (vapor pressure and humidity,
//! air density, the snow/rain partition of precipitation, and the
//! potential-temperature lapse rate used by the katabatic exchange term).
//!
//! The [`synthetic`] module provides the built-in example forcing used by the
//! headless demo and the integration tests.

use serde::{Deserialize, Serialize};

use crate::config::RadiationInput;
use crate::constants::{
    CP_AIR, EPS_VAPOR, LATENT_SUBLIMATION, LATENT_VAPORIZATION, P_REF, RAIN_SNOW_T, R_DRY_AIR,
    R_VAPOR, T_MELT, VP_TRIPLE,
};
use crate::grid::Grid;

/// Lower bound of the potential-temperature lapse rate (K m⁻¹), also used
/// outright when the grid has no elevation spread to fit against.
pub const MIN_THETA_LAPSE: f64 = 0.0015;

/// Meteorological input of one grid point for one timestep.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct MetPoint {
    /// Air temperature (K).
    pub t_air: f64,
    /// Total precipitation over the timestep (m w.e.).
    pub precipitation: f64,
    /// Snowfall part of the precipitation (m w.e.), derived.
    pub snowfall: f64,
    /// Rainfall part of the precipitation (m w.e.), derived.
    pub rain: f64,
    /// Cloud cover fraction.
    pub cloud: f64,
    /// Wind speed (m s⁻¹).
    pub wind: f64,
    /// Relative humidity (fraction). Input when radiation is computed,
    /// derived when an external atmosphere supplies specific humidity.
    pub rel_humidity: f64,
    /// Specific humidity (kg kg⁻¹). Input or derived, see `rel_humidity`.
    pub spec_humidity: f64,
    /// Vapor pressure (Pa), derived.
    pub vapor_pressure: f64,
    /// Air density (kg m⁻³), derived.
    pub air_density: f64,
    /// Air pressure (Pa).
    pub pressure: f64,
    /// Incoming shortwave radiation (W m⁻²), only read when supplied by an
    /// external atmosphere.
    pub sw_in: f64,
    /// Incoming longwave radiation (W m⁻²), only read when supplied by an
    /// external atmosphere.
    pub lw_in: f64,
}

/// Saturation vapor pressure over ice below the melting point and over water
/// at or above it (Pa), from the integrated Clausius-Clapeyron relation.
#[inline]
#[must_use]
pub fn saturation_vapor_pressure(t: f64) -> f64 {
    let latent = if t < T_MELT {
        LATENT_SUBLIMATION
    } else {
        LATENT_VAPORIZATION
    };
    VP_TRIPLE * (latent / R_VAPOR * (1.0 / T_MELT - 1.0 / t)).exp()
}

/// Forcing arrays for one timestep across all grid points.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Forcing {
    /// One entry per grid point.
    pub points: Vec<MetPoint>,
    /// Potential-temperature lapse rate (K m⁻¹), derived.
    pub theta_lapse: f64,
}

impl Forcing {
    /// Zero-initialized forcing for `n` points.
    #[must_use]
    pub fn new(n: usize) -> Self {
        Self {
            points: vec![MetPoint::default(); n],
            theta_lapse: MIN_THETA_LAPSE,
        }
    }

    /// Complete the derived fields from the raw inputs.
    ///
    /// With [`RadiationInput::Supplied`] the external atmosphere provides
    /// specific humidity and vapor pressure / relative humidity follow from
    /// it; otherwise relative humidity is the input and vapor pressure and
    /// specific humidity are derived.
    pub fn derive_fields(&mut self, grid: &Grid, radiation: RadiationInput) {
        for met in &mut self.points {
            let vp_sat = saturation_vapor_pressure(met.t_air);

            match radiation {
                RadiationInput::Supplied => {
                    met.vapor_pressure = met.spec_humidity * met.pressure / EPS_VAPOR;
                    met.rel_humidity = met.vapor_pressure / vp_sat;
                }
                RadiationInput::Computed => {
                    met.vapor_pressure = met.rel_humidity * vp_sat;
                    met.spec_humidity = met.rel_humidity * vp_sat * EPS_VAPOR / met.pressure;
                }
            }

            met.air_density = met.pressure / (R_DRY_AIR * met.t_air);

            // Snow/rain partition with a linear transition band of ±1 K
            // around the rain/snow threshold.
            let t = met.t_air;
            let p = met.precipitation;
            if t < RAIN_SNOW_T - 1.0 {
                met.snowfall = p;
                met.rain = 0.0;
            } else if t > RAIN_SNOW_T + 1.0 {
                met.snowfall = 0.0;
                met.rain = p;
            } else {
                met.snowfall = p * (RAIN_SNOW_T - t + 1.0) / 2.0;
                met.rain = p * (1.0 + t - RAIN_SNOW_T) / 2.0;
            }
        }

        self.theta_lapse = theta_lapse(grid, &self.points);
    }
}

/// Potential-temperature lapse rate from a least-squares fit of potential
/// temperature against elevation, floored at [`MIN_THETA_LAPSE`].
fn theta_lapse(grid: &Grid, points: &[MetPoint]) -> f64 {
    let n = points.len() as f64;
    let z0 = grid.points[0].elevation;
    if grid.points.iter().all(|p| p.elevation == z0) {
        return MIN_THETA_LAPSE;
    }

    let theta = |met: &MetPoint| met.t_air * (P_REF / met.pressure).powf(R_DRY_AIR / CP_AIR);

    let mean_z: f64 = grid.points.iter().map(|p| p.elevation).sum::<f64>() / n;
    let mean_theta: f64 = points.iter().map(theta).sum::<f64>() / n;

    let mut cov = 0.0;
    let mut var = 0.0;
    for (gp, met) in grid.points.iter().zip(points) {
        let dz = gp.elevation - mean_z;
        cov += dz * (theta(met) - mean_theta);
        var += dz * dz;
    }
    (cov / var).max(MIN_THETA_LAPSE)
}

pub mod synthetic {
    //! Built-in example forcing: a seasonal temperature cycle with an
    //! elevation lapse, weekly precipitation pulses, alternating cloud and
    //! humidity regimes, random wind, and barometric pressure.

    use chrono::{DateTime, Datelike, Utc};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    use super::Forcing;
    use crate::config::RadiationInput;
    use crate::constants::YEAR_DAYS;
    use crate::grid::Grid;

    /// Deterministic synthetic weather generator.
    #[derive(Debug)]
    pub struct SyntheticWeather {
        rng: StdRng,
        /// Mean sea-level air temperature (K).
        pub t_mean_sea_level: f64,
        /// Seasonal temperature amplitude (K).
        pub t_amplitude: f64,
        /// Air temperature lapse rate (K m⁻¹, negative upward).
        pub t_lapse: f64,
        /// Annual precipitation at sea level (m w.e.).
        pub annual_precipitation: f64,
        /// Precipitation increase with elevation (% m⁻¹).
        pub precipitation_gradient: f64,
        /// Maximum wind speed (m s⁻¹).
        pub max_wind: f64,
    }

    impl SyntheticWeather {
        /// Generator with the default example climate.
        #[must_use]
        pub fn new(seed: u64) -> Self {
            Self {
                rng: StdRng::seed_from_u64(seed),
                t_mean_sea_level: 268.0,
                t_amplitude: 10.0,
                t_lapse: -0.005,
                annual_precipitation: 0.5,
                precipitation_gradient: 0.1,
                max_wind: 10.0,
            }
        }

        /// Forcing for one timestep, with derived fields completed.
        pub fn generate(
            &mut self,
            grid: &Grid,
            date: DateTime<Utc>,
            timestep_days: f64,
        ) -> Forcing {
            let mut forcing = Forcing::new(grid.len());

            let yearfrac = f64::from(date.ordinal()) / YEAR_DAYS;
            let season = (2.0 * std::f64::consts::PI * yearfrac
                - 0.65 * std::f64::consts::PI)
                .sin();

            let prev = date - chrono::Duration::seconds((timestep_days * 86400.0) as i64);
            let precip_event =
                date.weekday() == chrono::Weekday::Mon && prev.weekday() != chrono::Weekday::Mon;
            let even_week = date.iso_week().week() % 2 == 0;

            for (met, gp) in forcing.points.iter_mut().zip(&grid.points) {
                met.t_air =
                    self.t_mean_sea_level + self.t_amplitude * season + self.t_lapse * gp.elevation;
                met.precipitation = if precip_event {
                    (self.annual_precipitation / 52.0)
                        * (1.0 + self.precipitation_gradient * gp.elevation / 100.0)
                } else {
                    0.0
                };
                met.cloud = if even_week { 1.0 } else { 0.0 };
                met.rel_humidity = if even_week { 0.8 } else { 0.5 };
                met.wind = self.rng.random_range(0.0..self.max_wind);
                met.pressure = 1015e2 * (-1.244e-4 * gp.elevation).exp();
            }

            forcing.derive_fields(grid, RadiationInput::Computed);
            forcing
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{GridPoint, LayerScheme};
    use approx::assert_relative_eq;

    fn grid(elevations: &[f64]) -> Grid {
        let points = elevations
            .iter()
            .map(|&z| GridPoint::flat(78.0, 16.0, z))
            .collect();
        Grid::new(points, LayerScheme::uniform(5, 0.1).unwrap(), None).unwrap()
    }

    fn raw_forcing(n: usize, t_air: f64, precipitation: f64) -> Forcing {
        let mut f = Forcing::new(n);
        for met in &mut f.points {
            met.t_air = t_air;
            met.precipitation = precipitation;
            met.rel_humidity = 0.7;
            met.pressure = 1.0e5;
        }
        f
    }

    #[test]
    fn partition_sums_to_total_precipitation() {
        let grid = grid(&[100.0]);
        for t in [270.0, 272.9, 273.75, 274.2, 276.0] {
            let mut f = raw_forcing(1, t, 0.01);
            f.derive_fields(&grid, RadiationInput::Computed);
            let met = &f.points[0];
            assert_relative_eq!(met.snowfall + met.rain, 0.01, max_relative = 1e-12);
            assert!(met.snowfall >= 0.0 && met.rain >= 0.0);
        }
    }

    #[test]
    fn cold_precipitation_is_all_snow() {
        let grid = grid(&[100.0]);
        let mut f = raw_forcing(1, 265.0, 0.02);
        f.derive_fields(&grid, RadiationInput::Computed);
        assert_eq!(f.points[0].snowfall, 0.02);
        assert_eq!(f.points[0].rain, 0.0);
    }

    #[test]
    fn humidity_roundtrip_is_consistent() {
        let grid = grid(&[100.0]);
        let mut f = raw_forcing(1, 270.0, 0.0);
        f.derive_fields(&grid, RadiationInput::Computed);
        let met = f.points[0];
        // q * P / eps reproduces the vapor pressure
        assert_relative_eq!(
            met.spec_humidity * met.pressure / EPS_VAPOR,
            met.vapor_pressure,
            max_relative = 1e-12
        );
    }

    #[test]
    fn flat_grid_uses_lapse_floor() {
        let grid = grid(&[300.0, 300.0]);
        let mut f = raw_forcing(2, 270.0, 0.0);
        f.derive_fields(&grid, RadiationInput::Computed);
        assert_eq!(f.theta_lapse, MIN_THETA_LAPSE);
    }

    #[test]
    fn lapse_fit_recovers_imposed_gradient() {
        let grid = grid(&[0.0, 500.0, 1000.0]);
        let mut f = Forcing::new(3);
        for (met, z) in f.points.iter_mut().zip([0.0f64, 500.0, 1000.0]) {
            met.t_air = 270.0 + 0.004 * z;
            met.rel_humidity = 0.7;
            met.pressure = P_REF; // uniform pressure: theta == t_air
            met.precipitation = 0.0;
        }
        f.derive_fields(&grid, RadiationInput::Computed);
        assert_relative_eq!(f.theta_lapse, 0.004, max_relative = 1e-9);
    }

    #[test]
    fn synthetic_weather_is_finite_and_bounded() {
        use chrono::{TimeZone, Utc};
        let grid = grid(&[0.0, 800.0]);
        let mut gen = synthetic::SyntheticWeather::new(7);
        let date = Utc.with_ymd_and_hms(1979, 7, 2, 12, 0, 0).unwrap();
        let f = gen.generate(&grid, date, 0.125);
        for met in &f.points {
            assert!(met.t_air.is_finite() && met.t_air > 200.0 && met.t_air < 320.0);
            assert!(met.wind >= 0.0 && met.wind <= 10.0);
            assert!(met.air_density > 0.5 && met.air_density < 2.0);
        }
    }
}
