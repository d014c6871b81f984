//! Model driver: one call per timestep, orchestrating radiation, the
//! surface energy balance, the column phases and the mass balance across
//! all grid points.
//!
//! Every stage is data-parallel over the grid-point dimension; columns never
//! share mutable state. The only abnormal exit is a non-converging energy
//! balance, which aborts the whole timestep.

use chrono::{DateTime, Utc};
use rayon::prelude::*;
use std::fmt;
use tracing::{debug, info};

use crate::column;
use crate::config::{ConfigError, ModelConfig, RadiationInput};
use crate::constants::{DAY_SECONDS, SNOWFALL_RATE_THRESHOLD, YEAR_DAYS};
use crate::diagnostics::PointDiagnostics;
use crate::energy_balance::{solve_surface, NonConvergence, SurfaceSolution};
use crate::forcing::Forcing;
use crate::grid::{Grid, GridError};
use crate::mass_balance;
use crate::radiation::{
    incoming_longwave, incoming_shortwave, shading_mask, update_albedo, SolarGeometry,
};
use crate::state::ModelState;

/// The assembled model: grid, configuration and persistent state.
#[derive(Debug, Clone)]
pub struct Model {
    grid: Grid,
    config: ModelConfig,
    state: ModelState,
}

/// The field set exchanged with an external ice-dynamics model.
#[derive(Debug, Clone)]
pub struct CouplingFields {
    /// Surface mass balance of the last step (m w.e.).
    pub smb: Vec<f64>,
    /// Temperature of the deepest layer (K).
    pub ice_temperature: Vec<f64>,
    /// Total runoff of the last step (m w.e.).
    pub runoff: Vec<f64>,
    /// Cumulative surface height change (m).
    pub surface_height: Vec<f64>,
}

impl Model {
    /// Assemble a model from existing state (e.g. a restart snapshot).
    ///
    /// # Errors
    /// Returns `ModelError` for an invalid configuration or a state whose
    /// shape does not match the grid.
    pub fn new(grid: Grid, config: ModelConfig, state: ModelState) -> Result<Self, ModelError> {
        config.validate()?;
        if !state.matches(&grid) {
            return Err(ModelError::StateMismatch {
                points: grid.len(),
                nl: grid.layers.nl,
            });
        }
        info!(
            points = grid.len(),
            layers = grid.layers.nl,
            "model assembled"
        );
        Ok(Self {
            grid,
            config,
            state,
        })
    }

    /// Assemble a model with manually initialized cold-start state.
    ///
    /// # Errors
    /// Returns `ModelError` for an invalid configuration.
    pub fn cold_start(
        grid: Grid,
        config: ModelConfig,
        start: DateTime<Utc>,
    ) -> Result<Self, ModelError> {
        let state = ModelState::cold_start(&grid, start);
        Self::new(grid, config, state)
    }

    /// The model grid.
    #[must_use]
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// The model configuration.
    #[must_use]
    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    /// The persistent state (for restart serialization).
    #[must_use]
    pub fn state(&self) -> &ModelState {
        &self.state
    }

    /// Advance the model by one timestep.
    ///
    /// `forcing` carries the raw meteorology for this step; derived fields
    /// are completed in place. `date` is the valid time of the step.
    ///
    /// # Errors
    /// Returns `StepError::ForcingShape` if the forcing does not cover the
    /// grid, and `StepError::EnergyBalance` if the bisection fails to
    /// converge anywhere (which aborts the whole step).
    pub fn step(
        &mut self,
        forcing: &mut Forcing,
        date: DateTime<Utc>,
    ) -> Result<Vec<PointDiagnostics>, StepError> {
        let n = self.grid.len();
        let nl = self.grid.layers.nl;
        let dt = self.config.timestep_days;

        if forcing.points.len() != n {
            return Err(StepError::ForcingShape {
                expected: n,
                got: forcing.points.len(),
            });
        }

        forcing.derive_fields(&self.grid, self.config.radiation);

        // Forcing bookkeeping: the annual snowfall window feeding firn
        // compaction, and the time of the last snowfall event feeding the
        // albedo decay.
        let year_steps = YEAR_DAYS / dt;
        for (surf, met) in self.state.surface.iter_mut().zip(&forcing.points) {
            surf.annual_snow =
                (1.0 - 1.0 / year_steps) * surf.annual_snow + met.precipitation * 1e3;
            if met.snowfall / (dt * DAY_SECONDS) > SNOWFALL_RATE_THRESHOLD {
                surf.time_last_snow = date;
            }
        }

        // Radiation: solar geometry, shading, albedo and the three fluxes
        // that do not depend on the surface temperature candidate.
        let solar = SolarGeometry::new(date, self.config.utc_offset_hours, &self.grid);
        let shade = shading_mask(&self.grid, &solar);
        let shortwave =
            incoming_shortwave(&self.grid, &solar, &shade, forcing, self.config.radiation);

        let mut sw_out = vec![0.0; n];
        let mut lw_in = vec![0.0; n];
        let mut tstar = vec![0.0; n];
        for i in 0..n {
            let top_density = self.state.layers[i * nl].density;
            tstar[i] = update_albedo(&mut self.state.surface[i], top_density, date, dt);
            sw_out[i] = shortwave.sw_in[i] * self.state.surface[i].albedo;
            lw_in[i] = match self.config.radiation {
                RadiationInput::Supplied => forcing.points[i].lw_in,
                RadiationInput::Computed => incoming_longwave(&forcing.points[i]),
            };
        }

        // Surface energy balance, in parallel across points. A single
        // non-converging point aborts the step.
        let surface = &self.state.surface;
        let layers = &self.state.layers;
        let config = &self.config;
        let solutions: Result<Vec<SurfaceSolution>, NonConvergence> = (0..n)
            .into_par_iter()
            .map(|i| {
                solve_surface(
                    surface[i].tsurf,
                    shortwave.sw_in[i],
                    sw_out[i],
                    lw_in[i],
                    &forcing.points[i],
                    forcing.theta_lapse,
                    &layers[i * nl..(i + 1) * nl],
                    config.timestep_days,
                    config.temperature_tolerance,
                )
            })
            .collect();
        let solutions = solutions.map_err(StepError::EnergyBalance)?;

        // Column physics and mass balance, in parallel across points.
        let mut diags = vec![PointDiagnostics::default(); n];
        let grid_layers = &self.grid.layers;
        let forcing_points = &forcing.points;
        self.state
            .surface
            .par_iter_mut()
            .zip(self.state.layers.par_chunks_mut(nl))
            .zip(diags.par_iter_mut())
            .enumerate()
            .for_each(|(i, ((surf, col), diag))| {
                let met = &forcing_points[i];
                let sol = &solutions[i];

                surf.tsurf = sol.tsurf;
                diag.sw_in = sol.fluxes.sw_in;
                diag.sw_out = sol.fluxes.sw_out;
                diag.lw_in = sol.fluxes.lw_in;
                diag.lw_out = sol.fluxes.lw_out;
                diag.shf = sol.fluxes.shf;
                diag.lhf = sol.fluxes.lhf;
                diag.ghf = sol.fluxes.ghf;
                diag.toa = shortwave.toa[i];
                diag.shade = shade[i];
                diag.tsurf = sol.tsurf;
                diag.albedo = surf.albedo;
                diag.albedo_timescale = tstar[i];
                diag.melt_energy = sol.melt_energy;
                diag.melt = sol.melt;
                diag.deposition = sol.deposition;
                diag.condensation = sol.condensation;
                diag.sublimation = sol.sublimation;
                diag.evaporation = sol.evaporation;

                column::step_column(config, grid_layers, met, sol, surf, col, diag);
                mass_balance::accumulate(surf, col, met, diag);
            });

        let melt_total: f64 = diags.iter().map(|d| d.melt).sum();
        let runoff_total: f64 = diags.iter().map(|d| d.runoff).sum();
        debug!(
            %date,
            melt_mwe = melt_total / n as f64,
            runoff_mwe = runoff_total / n as f64,
            "timestep complete"
        );

        Ok(diags)
    }

    /// The exchanged field subset for an external ice-dynamics model.
    #[must_use]
    pub fn coupling_fields(&self, diags: &[PointDiagnostics]) -> CouplingFields {
        let nl = self.grid.layers.nl;
        CouplingFields {
            smb: self.state.surface.iter().map(|s| s.smb).collect(),
            ice_temperature: (0..self.grid.len())
                .map(|i| self.state.layers[i * nl + nl - 1].temperature)
                .collect(),
            runoff: diags.iter().map(|d| d.runoff).collect(),
            surface_height: self
                .state
                .surface
                .iter()
                .map(|s| s.surface_height)
                .collect(),
        }
    }
}

/// Model assembly errors.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelError {
    /// Invalid configuration.
    Config(ConfigError),
    /// Invalid grid.
    Grid(GridError),
    /// State arrays do not match the grid shape.
    StateMismatch {
        /// Grid points expected.
        points: usize,
        /// Layers per column expected.
        nl: usize,
    },
}

impl fmt::Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e) => write!(f, "configuration error: {e}"),
            Self::Grid(e) => write!(f, "grid error: {e}"),
            Self::StateMismatch { points, nl } => {
                write!(
                    f,
                    "state arrays do not match the grid ({points} points × {nl} layers expected)"
                )
            }
        }
    }
}

impl std::error::Error for ModelError {}

impl From<ConfigError> for ModelError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

impl From<GridError> for ModelError {
    fn from(e: GridError) -> Self {
        Self::Grid(e)
    }
}

/// Timestep errors.
#[derive(Debug, Clone, PartialEq)]
pub enum StepError {
    /// Forcing arrays do not cover the grid.
    ForcingShape {
        /// Points in the grid.
        expected: usize,
        /// Points in the forcing.
        got: usize,
    },
    /// The energy-balance bisection failed to converge.
    EnergyBalance(NonConvergence),
}

impl fmt::Display for StepError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ForcingShape { expected, got } => {
                write!(f, "forcing covers {got} points but the grid has {expected}")
            }
            Self::EnergyBalance(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for StepError {}
