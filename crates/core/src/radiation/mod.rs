//! Radiation model: solar geometry, topographic shading, shortwave and
//! longwave fluxes, and surface albedo evolution.
//!
//! Two shortwave paths exist and are selected by
//! [`RadiationInput`](crate::config::RadiationInput): the full
//! top-of-atmosphere + transmissivity decomposition when the model computes
//! radiation itself, and a diffuse/direct split of a supplied flux when an
//! external atmosphere model provides shortwave directly. The two paths use
//! different physics and are intentionally not unified.

pub mod albedo;
pub mod longwave;
pub mod shortwave;
pub mod solar;

pub use albedo::update_albedo;
pub use longwave::{incoming_longwave, outgoing_longwave};
pub use shortwave::{incoming_shortwave, Shortwave};
pub use solar::{shading_mask, SolarGeometry};
