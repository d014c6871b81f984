//! Restart snapshots.
//!
//! The full persistent state serializes to a JSON file at the end of a run
//! and can seed the next one. Loading validates the array shapes against the
//! grid before the state is accepted.

use std::fs;
use std::path::Path;

use crate::grid::Grid;
use crate::state::ModelState;

/// Snapshot I/O errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnapshotError {
    /// Reading the snapshot file failed.
    LoadFailed(String),
    /// Parsing the snapshot contents failed.
    ParseFailed(String),
    /// Serializing the state failed.
    SerializeFailed(String),
    /// Writing the snapshot file failed.
    SaveFailed(String),
    /// The snapshot does not match the grid shape.
    ShapeMismatch {
        /// Grid points expected.
        points: usize,
        /// Layers per column expected.
        nl: usize,
    },
}

impl std::fmt::Display for SnapshotError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LoadFailed(e) => write!(f, "failed to read snapshot: {e}"),
            Self::ParseFailed(e) => write!(f, "failed to parse snapshot: {e}"),
            Self::SerializeFailed(e) => write!(f, "failed to serialize state: {e}"),
            Self::SaveFailed(e) => write!(f, "failed to write snapshot: {e}"),
            Self::ShapeMismatch { points, nl } => {
                write!(
                    f,
                    "snapshot does not match the grid ({points} points × {nl} layers expected)"
                )
            }
        }
    }
}

impl std::error::Error for SnapshotError {}

/// Load model state from a snapshot file, validating the shape against
/// `grid`.
///
/// # Errors
/// Returns `SnapshotError` on I/O, parse, or shape failures.
pub fn load<P: AsRef<Path>>(path: P, grid: &Grid) -> Result<ModelState, SnapshotError> {
    let contents =
        fs::read_to_string(path).map_err(|e| SnapshotError::LoadFailed(e.to_string()))?;
    let state: ModelState =
        serde_json::from_str(&contents).map_err(|e| SnapshotError::ParseFailed(e.to_string()))?;
    if !state.matches(grid) {
        return Err(SnapshotError::ShapeMismatch {
            points: grid.len(),
            nl: grid.layers.nl,
        });
    }
    Ok(state)
}

/// Save model state to a snapshot file.
///
/// # Errors
/// Returns `SnapshotError` on serialization or I/O failures.
pub fn save<P: AsRef<Path>>(path: P, state: &ModelState) -> Result<(), SnapshotError> {
    let contents = serde_json::to_string(state)
        .map_err(|e| SnapshotError::SerializeFailed(e.to_string()))?;
    fs::write(path, contents).map_err(|e| SnapshotError::SaveFailed(e.to_string()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{GridPoint, LayerScheme};
    use chrono::{TimeZone, Utc};

    fn grid(n: usize) -> Grid {
        let points = (0..n)
            .map(|i| GridPoint::flat(78.0, 16.0, 100.0 * i as f64))
            .collect();
        Grid::new(points, LayerScheme::uniform(6, 0.1).unwrap(), None).unwrap()
    }

    #[test]
    fn snapshot_roundtrips_the_state() {
        let grid = grid(3);
        let start = Utc.with_ymd_and_hms(1979, 1, 1, 0, 0, 0).unwrap();
        let mut state = ModelState::cold_start(&grid, start);
        state.surface[1].tsurf = 268.5;
        state.layers[7].water = 3.25;

        let path = std::env::temp_dir().join("firn-sim-snapshot-roundtrip.json");
        save(&path, &state).unwrap();
        let loaded = load(&path, &grid).unwrap();
        fs::remove_file(&path).ok();

        assert_eq!(loaded.surface[1].tsurf, 268.5);
        assert_eq!(loaded.layers[7].water, 3.25);
        assert_eq!(loaded.layers.len(), state.layers.len());
    }

    #[test]
    fn shape_mismatch_is_rejected() {
        let grid3 = grid(3);
        let grid2 = grid(2);
        let start = Utc.with_ymd_and_hms(1979, 1, 1, 0, 0, 0).unwrap();
        let state = ModelState::cold_start(&grid3, start);

        let path = std::env::temp_dir().join("firn-sim-snapshot-mismatch.json");
        save(&path, &state).unwrap();
        let result = load(&path, &grid2);
        fs::remove_file(&path).ok();

        assert!(matches!(result, Err(SnapshotError::ShapeMismatch { .. })));
    }

    #[test]
    fn missing_file_reports_load_failure() {
        let grid = grid(1);
        let result = load("/nonexistent/firn-sim-snapshot.json", &grid);
        assert!(matches!(result, Err(SnapshotError::LoadFailed(_))));
    }
}
