//! Surface energy-balance solver.
//!
//! The surface temperature is the root of the net energy balance
//!
//! ```text
//! E(T) = SWin − SWout + LWin − LWout(T) + SHF(T) + LHF(T) + GHF(T)
//! ```
//!
//! found by bisection on an interval of ±40 K around the previous surface
//! temperature, halving the step each iteration. Failing to shrink the
//! interval below the tolerance within 20 iterations means the initial
//! interval did not bracket the root or a forcing input is unphysical; that
//! is a fatal error and aborts the whole timestep. The converged temperature
//! is clamped at the melting point, the fluxes are re-evaluated there, and
//! the excess energy becomes melt. The latent heat flux is converted into
//! phase-change mass fluxes selected by its sign and by whether the surface
//! is below the melting point.

use std::fmt;

use crate::constants::{
    DAY_SECONDS, LATENT_MELT, LATENT_SUBLIMATION, LATENT_VAPORIZATION, T_MELT,
};
use crate::forcing::MetPoint;
use crate::radiation::outgoing_longwave;
use crate::state::Layer;
use crate::turbulent::{
    ground_flux_conductance, ground_heat_flux, latent_heat_flux, sensible_heat_flux,
};

/// Maximum bisection iterations before the solver gives up.
const MAX_ITERATIONS: usize = 20;

/// Half-width of the initial bisection interval (K).
const INITIAL_HALF_WIDTH: f64 = 40.0;

/// Energy-flux components at the resolved surface temperature (W m⁻²,
/// positive toward the surface except `sw_out`/`lw_out`).
#[derive(Debug, Clone, Copy, Default)]
pub struct SurfaceFluxes {
    /// Incoming shortwave.
    pub sw_in: f64,
    /// Reflected shortwave.
    pub sw_out: f64,
    /// Incoming longwave.
    pub lw_in: f64,
    /// Outgoing longwave.
    pub lw_out: f64,
    /// Sensible heat flux.
    pub shf: f64,
    /// Latent heat flux.
    pub lhf: f64,
    /// Ground (subsurface) heat flux.
    pub ghf: f64,
}

/// Result of the energy balance at one grid point for one timestep.
#[derive(Debug, Clone, Copy)]
pub struct SurfaceSolution {
    /// Resolved surface temperature (K), clamped at the melting point.
    pub tsurf: f64,
    /// Fluxes at the resolved temperature.
    pub fluxes: SurfaceFluxes,
    /// Melt energy (W m⁻²); zero below the melting point.
    pub melt_energy: f64,
    /// Melt over the timestep (m w.e.).
    pub melt: f64,
    /// Vapor deposited onto a sub-freezing surface (m w.e.).
    pub deposition: f64,
    /// Vapor condensed onto a melting surface (m w.e.).
    pub condensation: f64,
    /// Ice sublimated from a sub-freezing surface (m w.e.).
    pub sublimation: f64,
    /// Water evaporated from a melting surface (m w.e.), clipped so it never
    /// exceeds the melt that produced it.
    pub evaporation: f64,
}

/// Solver failure: the bisection did not converge within the iteration cap.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NonConvergence {
    /// Interval width at the final iteration (K).
    pub width: f64,
    /// Tolerance that was requested (K).
    pub tolerance: f64,
}

impl fmt::Display for NonConvergence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "surface energy balance did not converge below {} K within {MAX_ITERATIONS} \
             iterations (final interval width {} K); forcing is unphysical or the initial \
             interval does not bracket the root",
            self.tolerance, self.width
        )
    }
}

impl std::error::Error for NonConvergence {}

/// Solve the energy balance of one grid point.
///
/// `sw_in`, `sw_out` and `lw_in` do not depend on the surface temperature
/// candidate and are passed in precomputed; the longwave-out, turbulent and
/// ground fluxes are re-evaluated at every candidate.
///
/// # Errors
/// Returns [`NonConvergence`] when the interval does not shrink below the
/// tolerance within 20 iterations. The caller must treat this as fatal for
/// the whole timestep.
pub fn solve_surface(
    prev_tsurf: f64,
    sw_in: f64,
    sw_out: f64,
    lw_in: f64,
    met: &MetPoint,
    theta_lapse: f64,
    column: &[Layer],
    timestep_days: f64,
    tolerance: f64,
) -> Result<SurfaceSolution, NonConvergence> {
    let conductance = ground_flux_conductance(column);
    let t1 = column[1].temperature;

    let balance = |t: f64| -> f64 {
        sw_in - sw_out + lw_in - outgoing_longwave(t)
            + latent_heat_flux(met, t, theta_lapse)
            + sensible_heat_flux(met, t, theta_lapse)
            + ground_heat_flux(conductance, t1, t)
    };

    let mut t_low = prev_tsurf - INITIAL_HALF_WIDTH;
    let mut t_high = prev_tsurf + INITIAL_HALF_WIDTH;
    let mut width = t_high - t_low;
    let mut t_mid = 0.5 * (t_low + t_high);
    let mut converged = false;

    for _ in 0..MAX_ITERATIONS {
        t_mid = 0.5 * (t_low + t_high);
        width *= 0.5;

        let e_low = balance(t_low);
        let e_mid = balance(t_mid);
        if e_mid * e_low < 0.0 {
            t_high = t_mid;
        } else {
            t_low = t_mid;
        }

        if width < tolerance {
            converged = true;
            break;
        }
    }
    if !converged {
        return Err(NonConvergence {
            width,
            tolerance,
        });
    }

    // Clamp at the melting point; nudge results that landed exactly on the
    // boundary below it so the clamp comparison cannot oscillate between
    // steps.
    if (t_mid - T_MELT).abs() < tolerance {
        t_mid -= tolerance;
    }
    let tsurf = t_mid.min(T_MELT);

    let fluxes = SurfaceFluxes {
        sw_in,
        sw_out,
        lw_in,
        lw_out: outgoing_longwave(tsurf),
        shf: sensible_heat_flux(met, tsurf, theta_lapse),
        lhf: latent_heat_flux(met, tsurf, theta_lapse),
        ghf: ground_heat_flux(conductance, t1, tsurf),
    };

    let net = fluxes.sw_in - fluxes.sw_out + fluxes.lw_in - fluxes.lw_out
        + fluxes.shf
        + fluxes.lhf
        + fluxes.ghf;
    let melt_energy = if tsurf < T_MELT { 0.0 } else { net };

    let step_seconds = DAY_SECONDS * timestep_days;
    let melt = step_seconds * melt_energy / LATENT_MELT / 1e3;

    // Phase-change mass fluxes from the latent heat flux, all nonnegative.
    let below_melt = tsurf < T_MELT;
    let lhf = fluxes.lhf;
    let deposition = if below_melt && lhf > 0.0 {
        step_seconds * lhf / LATENT_SUBLIMATION / 1e3
    } else {
        0.0
    };
    let condensation = if !below_melt && lhf > 0.0 {
        step_seconds * lhf / LATENT_VAPORIZATION / 1e3
    } else {
        0.0
    };
    let sublimation = if below_melt && lhf < 0.0 {
        -step_seconds * lhf / LATENT_SUBLIMATION / 1e3
    } else {
        0.0
    };
    let evaporation = if !below_melt && lhf < 0.0 {
        (-step_seconds * lhf / LATENT_VAPORIZATION / 1e3).min(melt)
    } else {
        0.0
    };

    Ok(SurfaceSolution {
        tsurf,
        fluxes,
        melt_energy,
        melt,
        deposition,
        condensation,
        sublimation,
        evaporation,
    })
}
