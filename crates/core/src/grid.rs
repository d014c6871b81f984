//! Horizontal grid and vertical layer scheme.
//!
//! The model runs on a flat list of glacierized grid points (non-glacier
//! cells are filtered out by the mesh reader before the core sees them).
//! Each point owns an independent vertical column of `nl` layers whose target
//! thickness doubles at configured split indices, concentrating resolution
//! near the surface while keeping the total layer count fixed.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Static per-point grid data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridPoint {
    /// Latitude (degrees, positive north).
    pub latitude: f64,
    /// Longitude (degrees, positive east).
    pub longitude: f64,
    /// Surface elevation (m above sea level).
    pub elevation: f64,
    /// Surface slope angle β (radians).
    pub slope_beta: f64,
    /// Surface slope azimuth γ (radians).
    pub slope_gamma: f64,
}

impl GridPoint {
    /// A flat point at the given position and elevation.
    #[must_use]
    pub fn flat(latitude: f64, longitude: f64, elevation: f64) -> Self {
        Self {
            latitude,
            longitude,
            elevation,
            slope_beta: 0.0,
            slope_gamma: 0.0,
        }
    }
}

/// Vertical discretization policy shared by all columns.
///
/// Layer index 0 is the surface layer; index `nl - 1` the deepest. The
/// ascending `split` indices partition the column into bands; band `n` has
/// target thickness `2ⁿ × max_thickness` and the bottom-most band absorbs all
/// depth beyond the last split.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayerScheme {
    /// Number of vertical layers per column.
    pub nl: usize,
    /// Maximum thickness of the top layer (m).
    pub max_thickness: f64,
    /// Ascending 0-based layer indices at which the target thickness doubles.
    pub split: Vec<usize>,
    /// Whether depth doubling (and hence merge/split regridding) is active.
    pub double_depth: bool,
}

impl LayerScheme {
    /// Scheme with doubling bands.
    ///
    /// # Errors
    /// Returns `GridError` if the layer count is below 3, the thickness is
    /// not positive, or the split indices are not strictly ascending within
    /// `[2, nl - 2]` (merging reaches one slot above a boundary, splitting
    /// two).
    pub fn new(
        nl: usize,
        max_thickness: f64,
        split: Vec<usize>,
        double_depth: bool,
    ) -> Result<Self, GridError> {
        if nl < 3 {
            return Err(GridError::TooFewLayers(nl));
        }
        if !(max_thickness > 0.0) {
            return Err(GridError::InvalidThickness(max_thickness));
        }
        let mut prev = 0usize;
        for (i, &s) in split.iter().enumerate() {
            if s < 2 || s > nl - 2 || (i > 0 && s <= prev) {
                return Err(GridError::InvalidSplit(s));
            }
            prev = s;
        }
        Ok(Self {
            nl,
            max_thickness,
            split,
            double_depth,
        })
    }

    /// Scheme with uniform layer thickness (no doubling).
    ///
    /// # Errors
    /// Returns `GridError` for invalid `nl` or thickness.
    pub fn uniform(nl: usize, max_thickness: f64) -> Result<Self, GridError> {
        Self::new(nl, max_thickness, Vec::new(), false)
    }

    /// Band index of a layer: the number of split depths at or above it.
    #[must_use]
    pub fn band(&self, layer: usize) -> usize {
        if !self.double_depth {
            return 0;
        }
        self.split.iter().filter(|&&s| layer >= s).count()
    }

    /// Target thickness of a layer (m): `2^band × max_thickness`.
    #[must_use]
    pub fn target_thickness(&self, layer: usize) -> f64 {
        2f64.powi(self.band(layer) as i32) * self.max_thickness
    }

    /// Target thickness of the deepest band (m), used when refilling the
    /// bottom slot after an upward shift.
    #[must_use]
    pub fn bottom_target(&self) -> f64 {
        if self.double_depth {
            2f64.powi(self.split.len() as i32) * self.max_thickness
        } else {
            self.max_thickness
        }
    }
}

/// Structured 2-D elevation grid used for topographic self-shading.
///
/// The horizontal grid points are a masked subset of this regular raster;
/// `point_cells` maps each grid point to its `(row, col)` raster cell.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Topography {
    /// Raster elevations, row-major (m).
    pub elevation: Vec<f64>,
    /// Number of rows.
    pub rows: usize,
    /// Number of columns.
    pub cols: usize,
    /// Cell spacing (m).
    pub spacing: f64,
    /// Raster cell of each grid point.
    pub point_cells: Vec<(usize, usize)>,
}

impl Topography {
    /// Raster elevation at a cell, clamping indices to the raster bounds.
    #[must_use]
    pub fn elevation_at(&self, row: i64, col: i64) -> f64 {
        let r = row.clamp(0, self.rows as i64 - 1) as usize;
        let c = col.clamp(0, self.cols as i64 - 1) as usize;
        self.elevation[r * self.cols + c]
    }
}

/// The horizontal model grid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Grid {
    /// Glacierized grid points.
    pub points: Vec<GridPoint>,
    /// Vertical layer scheme.
    pub layers: LayerScheme,
    /// Optional raster for topographic shading. Without it the shading mask
    /// reduces to "sun below the horizon".
    pub topography: Option<Topography>,
}

impl Grid {
    /// Build and validate a grid.
    ///
    /// # Errors
    /// Returns `GridError` if the point list is empty or the topography does
    /// not cover every point.
    pub fn new(
        points: Vec<GridPoint>,
        layers: LayerScheme,
        topography: Option<Topography>,
    ) -> Result<Self, GridError> {
        if points.is_empty() {
            return Err(GridError::EmptyGrid);
        }
        if let Some(topo) = &topography {
            if topo.point_cells.len() != points.len() {
                return Err(GridError::TopographyMismatch {
                    points: points.len(),
                    cells: topo.point_cells.len(),
                });
            }
            if topo.elevation.len() != topo.rows * topo.cols {
                return Err(GridError::TopographyMismatch {
                    points: topo.rows * topo.cols,
                    cells: topo.elevation.len(),
                });
            }
        }
        Ok(Self {
            points,
            layers,
            topography,
        })
    }

    /// Number of grid points.
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether the grid has no points (never true for a validated grid).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Mean absolute latitude (degrees), used by the water-vapor
    /// transmissivity parametrization.
    #[must_use]
    pub fn mean_abs_latitude(&self) -> f64 {
        let sum: f64 = self.points.iter().map(|p| p.latitude).sum();
        (sum / self.points.len() as f64).abs()
    }
}

/// Grid construction errors.
#[derive(Debug, Clone, PartialEq)]
pub enum GridError {
    /// No glacierized points.
    EmptyGrid,
    /// Fewer than 3 vertical layers.
    TooFewLayers(usize),
    /// Non-positive layer thickness.
    InvalidThickness(f64),
    /// Split index out of range or not strictly ascending.
    InvalidSplit(usize),
    /// Topography raster does not match the point list.
    TopographyMismatch {
        /// Expected entry count.
        points: usize,
        /// Actual entry count.
        cells: usize,
    },
}

impl fmt::Display for GridError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyGrid => write!(f, "grid contains no glacierized points"),
            Self::TooFewLayers(nl) => {
                write!(f, "column needs at least 3 layers, got {nl}")
            }
            Self::InvalidThickness(v) => {
                write!(f, "layer thickness must be positive, got {v}")
            }
            Self::InvalidSplit(s) => {
                write!(
                    f,
                    "split indices must be strictly ascending within [2, nl-2], got {s}"
                )
            }
            Self::TopographyMismatch { points, cells } => {
                write!(
                    f,
                    "topography raster mismatch: expected {points} entries, got {cells}"
                )
            }
        }
    }
}

impl std::error::Error for GridError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn band_targets_double_at_splits() {
        let scheme = LayerScheme::new(50, 0.1, vec![15, 25, 35], true).unwrap();
        assert_eq!(scheme.target_thickness(0), 0.1);
        assert_eq!(scheme.target_thickness(14), 0.1);
        assert_eq!(scheme.target_thickness(15), 0.2);
        assert_eq!(scheme.target_thickness(25), 0.4);
        assert_eq!(scheme.target_thickness(35), 0.8);
        assert_eq!(scheme.target_thickness(49), 0.8);
        assert_eq!(scheme.bottom_target(), 0.8);
    }

    #[test]
    fn uniform_scheme_has_single_band() {
        let scheme = LayerScheme::uniform(10, 0.1).unwrap();
        assert_eq!(scheme.target_thickness(9), 0.1);
        assert_eq!(scheme.bottom_target(), 0.1);
    }

    #[test]
    fn split_indices_validated() {
        assert!(LayerScheme::new(10, 0.1, vec![0], true).is_err());
        assert!(LayerScheme::new(10, 0.1, vec![9], true).is_err());
        assert!(LayerScheme::new(10, 0.1, vec![4, 4], true).is_err());
        assert!(LayerScheme::new(10, 0.1, vec![4, 6], true).is_ok());
    }

    #[test]
    fn empty_grid_rejected() {
        let layers = LayerScheme::uniform(5, 0.1).unwrap();
        assert!(matches!(
            Grid::new(Vec::new(), layers, None),
            Err(GridError::EmptyGrid)
        ));
    }
}
