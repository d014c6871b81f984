//! Persistent model state: per-point surface variables and the layer arena.
//!
//! Columns are stored as one contiguous arena of [`Layer`] records indexed
//! `[point × nl + layer]`; layer 0 is at the surface. The arena shape never
//! changes: every regridding operation shifts content between slots and keeps
//! the layer count fixed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::{
    ALBEDO_FRESH_SNOW, ALBEDO_ICE, DENSITY_ICE, T_MELT,
};
use crate::grid::Grid;

/// One vertical layer of snow, firn or ice.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Layer {
    /// Thickness (m).
    pub thickness: f64,
    /// Density (kg m⁻³), bounded by the ice density.
    pub density: f64,
    /// Temperature (K), bounded by the melting point.
    pub temperature: f64,
    /// Irreducible liquid water held in the pore space (kg m⁻²).
    pub water: f64,
    /// Slush water stored on top of the irreducible fraction (kg m⁻²).
    pub slush: f64,
    /// Running annual mean temperature (K), used by firn densification.
    pub temp_mean: f64,
    /// Effective volumetric heat capacity from the last conduction step
    /// (J m⁻³ K⁻¹). Diagnostic.
    pub heat_capacity: f64,
    /// Effective conductivity from the last conduction step (W m⁻¹ K⁻¹).
    /// Diagnostic.
    pub conductivity: f64,
}

impl Layer {
    /// Mass of the layer's solid fraction (kg m⁻²).
    #[inline]
    #[must_use]
    pub fn mass(&self) -> f64 {
        self.density * self.thickness
    }

    /// Pore volume per unit area (m). Multiply by the density of ice or
    /// water to express the capacity as a refreezable or storable mass.
    #[inline]
    #[must_use]
    pub fn pore_space(&self) -> f64 {
        (self.thickness * (1.0 - self.density / DENSITY_ICE)).max(0.0)
    }
}

/// Per-point surface state carried between timesteps.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SurfacePoint {
    /// Surface temperature (K).
    pub tsurf: f64,
    /// Current surface albedo.
    pub albedo: f64,
    /// Decaying snow albedo, tracked separately so an ice interlude does not
    /// erase the snow aging state.
    pub albedo_snow: f64,
    /// Snow mass above ice (m w.e.).
    pub snowmass: f64,
    /// Cumulative surface height change (m).
    pub surface_height: f64,
    /// Time of the last snowfall event.
    pub time_last_snow: DateTime<Utc>,
    /// Running annual snowfall (mm w.e.), exponential one-year window.
    pub annual_snow: f64,
    /// Surface mass balance of the current step (m w.e.).
    pub smb: f64,
    /// Cumulative surface mass balance (m w.e.).
    pub smb_cumulative: f64,
    /// Exponentially smoothed runoff of irreducible water leaving the column
    /// bottom (kg m⁻², one-year window).
    pub deep_runoff_mean: f64,
}

/// The complete persistent state: surface points plus the layer arena.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelState {
    /// Per-point surface variables, one entry per grid point.
    pub surface: Vec<SurfacePoint>,
    /// Layer arena, `points.len() × nl` entries.
    pub layers: Vec<Layer>,
    /// Layers per column (copied from the grid for shape validation).
    pub nl: usize,
}

impl ModelState {
    /// Manual cold-start initialization: an ice-capped column at 265 K with
    /// the surface at the melting point, no liquid water, layer thicknesses
    /// from the doubling scheme, and fresh-snow albedo state.
    #[must_use]
    pub fn cold_start(grid: &Grid, start: DateTime<Utc>) -> Self {
        let n = grid.len();
        let nl = grid.layers.nl;

        let surface = vec![
            SurfacePoint {
                tsurf: T_MELT,
                albedo: ALBEDO_ICE,
                albedo_snow: ALBEDO_FRESH_SNOW,
                snowmass: 0.0,
                surface_height: 0.0,
                time_last_snow: start,
                annual_snow: 500.0,
                smb: 0.0,
                smb_cumulative: 0.0,
                deep_runoff_mean: 0.0,
            };
            n
        ];

        let mut layers = Vec::with_capacity(n * nl);
        for _ in 0..n {
            for l in 0..nl {
                layers.push(Layer {
                    thickness: grid.layers.target_thickness(l),
                    density: DENSITY_ICE,
                    temperature: 265.0,
                    water: 0.0,
                    slush: 0.0,
                    temp_mean: 265.0,
                    heat_capacity: 0.0,
                    conductivity: 0.0,
                });
            }
        }

        Self { surface, layers, nl }
    }

    /// Column slice of one grid point.
    #[inline]
    #[must_use]
    pub fn column(&self, point: usize) -> &[Layer] {
        &self.layers[point * self.nl..(point + 1) * self.nl]
    }

    /// Mutable column slice of one grid point.
    #[inline]
    pub fn column_mut(&mut self, point: usize) -> &mut [Layer] {
        &mut self.layers[point * self.nl..(point + 1) * self.nl]
    }

    /// Whether the state arrays match the grid shape.
    #[must_use]
    pub fn matches(&self, grid: &Grid) -> bool {
        self.nl == grid.layers.nl
            && self.surface.len() == grid.len()
            && self.layers.len() == grid.len() * grid.layers.nl
    }
}
