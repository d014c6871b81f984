//! Longwave radiation.
//!
//! Incoming longwave follows the Konzelmann et al. (1994) sky emissivity
//! blend of a clear-sky part, driven by the vapor pressure / temperature
//! ratio, and a cloud part. Outgoing longwave is blackbody emission at the
//! surface temperature.

use crate::constants::{
    EMISSIVITY_B, EMISSIVITY_CLOUD, EMISSIVITY_EXP, STEFAN_BOLTZMANN,
};
use crate::forcing::MetPoint;

/// Incoming longwave radiation (W m⁻²).
#[inline]
#[must_use]
pub fn incoming_longwave(met: &MetPoint) -> f64 {
    // Clear-sky emissivity, Konzelmann et al. (1994).
    let e_cs = 0.23 + EMISSIVITY_B * (met.vapor_pressure / met.t_air).powf(0.125);
    let cloud_term = met.cloud.powi(EMISSIVITY_EXP);
    let e_sky = e_cs * (1.0 - cloud_term) + EMISSIVITY_CLOUD * cloud_term;
    e_sky * STEFAN_BOLTZMANN * met.t_air.powi(4)
}

/// Outgoing longwave radiation (W m⁻²) at surface temperature `tsurf` (K).
#[inline]
#[must_use]
pub fn outgoing_longwave(tsurf: f64) -> f64 {
    STEFAN_BOLTZMANN * tsurf.powi(4)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn met(t_air: f64, vapor_pressure: f64, cloud: f64) -> MetPoint {
        MetPoint {
            t_air,
            vapor_pressure,
            cloud,
            ..MetPoint::default()
        }
    }

    #[test]
    fn overcast_sky_emits_more_than_clear_sky() {
        let clear = incoming_longwave(&met(263.15, 300.0, 0.0));
        let overcast = incoming_longwave(&met(263.15, 300.0, 1.0));
        assert!(overcast > clear);
    }

    #[test]
    fn incoming_below_blackbody_at_air_temperature() {
        let lw = incoming_longwave(&met(263.15, 300.0, 0.5));
        assert!(lw < STEFAN_BOLTZMANN * 263.15f64.powi(4));
        assert!(lw > 0.0);
    }

    #[test]
    fn outgoing_matches_blackbody_at_melting_point() {
        let lw = outgoing_longwave(273.15);
        assert!((lw - 315.6).abs() < 1.0);
    }
}
