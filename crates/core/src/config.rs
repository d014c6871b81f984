//! Model configuration: timestep, physics-mode selectors, and tunable
//! parameters of the energy balance and snow model.
//!
//! Physics modes are explicit enums parsed from the selector strings used in
//! run configurations; an unknown selector is a fatal configuration error.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Vertical distribution kernel for percolating meltwater.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PercolationScheme {
    /// Tipping-bucket: all water enters the top layer.
    Bucket,
    /// Gaussian-shaped deep percolation around the surface.
    Normal,
    /// Linearly decaying input down to the characteristic depth.
    Linear,
    /// Uniform input down to the characteristic depth.
    Uniform,
}

impl FromStr for PercolationScheme {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "bucket" => Ok(Self::Bucket),
            "normal" => Ok(Self::Normal),
            "linear" => Ok(Self::Linear),
            "uniform" => Ok(Self::Uniform),
            other => Err(ConfigError::UnknownPercolation(other.to_string())),
        }
    }
}

/// Densification scheme applied to the column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompactionScheme {
    /// Gravitational firn densification (Ligtenberg et al. 2011) applied to
    /// every layer.
    FirnOnly,
    /// Gravitational densification for firn plus seasonal-snow metamorphism,
    /// overburden, and wind-drift densification (van Kampenhout et al. 2017)
    /// for layers below firn density.
    FirnAndSnow,
}

impl FromStr for CompactionScheme {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "firn_only" => Ok(Self::FirnOnly),
            "firn+snow" => Ok(Self::FirnAndSnow),
            other => Err(ConfigError::UnknownCompaction(other.to_string())),
        }
    }
}

/// Where incoming radiation comes from.
///
/// When an external atmosphere model supplies shortwave and longwave fluxes
/// directly, the radiation scheme switches from the full transmissivity
/// decomposition to a diffuse/direct split of the supplied shortwave. The two
/// paths use different physics and are intentionally kept separate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RadiationInput {
    /// Compute shortwave from solar geometry and atmospheric transmissivity,
    /// and longwave from sky emissivity.
    #[default]
    Computed,
    /// Shortwave and longwave are supplied in the forcing; only the
    /// diffuse/direct split and shading are applied.
    Supplied,
}

/// Model configuration shared by all grid points.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Timestep (days).
    pub timestep_days: f64,
    /// Local time offset relative to UTC (hours), used by the solar hour
    /// angle.
    pub utc_offset_hours: f64,
    /// Percolation kernel.
    pub percolation: PercolationScheme,
    /// Densification scheme.
    pub compaction: CompactionScheme,
    /// Radiation source.
    pub radiation: RadiationInput,
    /// Convergence tolerance of the surface energy-balance solver (K).
    pub temperature_tolerance: f64,
    /// Geothermal heat flux at the column bottom (W m⁻²).
    pub geothermal_flux: f64,
    /// Characteristic deep percolation depth (m).
    pub percolation_depth: f64,
    /// Slush runoff e-folding timescale (days).
    pub slush_runoff_days: f64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            timestep_days: 0.125,
            utc_offset_hours: 0.0,
            percolation: PercolationScheme::Normal,
            compaction: CompactionScheme::FirnAndSnow,
            radiation: RadiationInput::Computed,
            temperature_tolerance: 0.01,
            geothermal_flux: 0.0,
            percolation_depth: 6.0,
            slush_runoff_days: 0.001,
        }
    }
}

impl ModelConfig {
    /// Validate parameter ranges.
    ///
    /// # Errors
    /// Returns `ConfigError` if the timestep or a tolerance is not positive.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.timestep_days > 0.0) {
            return Err(ConfigError::InvalidTimestep(self.timestep_days));
        }
        if !(self.temperature_tolerance > 0.0) {
            return Err(ConfigError::InvalidTolerance(self.temperature_tolerance));
        }
        if !(self.percolation_depth > 0.0) {
            return Err(ConfigError::InvalidPercolationDepth(self.percolation_depth));
        }
        if !(self.slush_runoff_days > 0.0) {
            return Err(ConfigError::InvalidSlushTimescale(self.slush_runoff_days));
        }
        Ok(())
    }
}

/// Fatal configuration errors, raised before any timestep runs.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Unknown percolation selector string.
    UnknownPercolation(String),
    /// Unknown compaction selector string.
    UnknownCompaction(String),
    /// Timestep must be positive.
    InvalidTimestep(f64),
    /// Solver tolerance must be positive.
    InvalidTolerance(f64),
    /// Percolation depth must be positive.
    InvalidPercolationDepth(f64),
    /// Slush runoff timescale must be positive.
    InvalidSlushTimescale(f64),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownPercolation(s) => {
                write!(
                    f,
                    "unknown percolation scheme '{s}' (expected bucket, normal, linear or uniform)"
                )
            }
            Self::UnknownCompaction(s) => {
                write!(
                    f,
                    "unknown compaction scheme '{s}' (expected firn_only or firn+snow)"
                )
            }
            Self::InvalidTimestep(v) => write!(f, "timestep must be positive, got {v}"),
            Self::InvalidTolerance(v) => {
                write!(f, "solver tolerance must be positive, got {v}")
            }
            Self::InvalidPercolationDepth(v) => {
                write!(f, "percolation depth must be positive, got {v}")
            }
            Self::InvalidSlushTimescale(v) => {
                write!(f, "slush runoff timescale must be positive, got {v}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selector_strings_parse() {
        assert_eq!(
            "bucket".parse::<PercolationScheme>().unwrap(),
            PercolationScheme::Bucket
        );
        assert_eq!(
            "uniform".parse::<PercolationScheme>().unwrap(),
            PercolationScheme::Uniform
        );
        assert_eq!(
            "firn+snow".parse::<CompactionScheme>().unwrap(),
            CompactionScheme::FirnAndSnow
        );
    }

    #[test]
    fn unknown_selectors_are_fatal() {
        assert!(matches!(
            "darcy".parse::<PercolationScheme>(),
            Err(ConfigError::UnknownPercolation(_))
        ));
        assert!(matches!(
            "none".parse::<CompactionScheme>(),
            Err(ConfigError::UnknownCompaction(_))
        ));
    }

    #[test]
    fn default_config_is_valid() {
        assert!(ModelConfig::default().validate().is_ok());
    }

    #[test]
    fn non_positive_timestep_rejected() {
        let cfg = ModelConfig {
            timestep_days: 0.0,
            ..ModelConfig::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::InvalidTimestep(_))
        ));
    }
}
