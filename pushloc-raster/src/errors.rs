//! Raster layer error type.

use thiserror::Error;

/// Errors raised by DEM tiles and the tile cache.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RasterError {
    /// Raw elevation lookup outside the tile grid.
    #[error("out of tile indices: [{i}, {j}] not in [0, {max_i}] x [0, {max_j}]")]
    OutOfTileIndices {
        i: usize,
        j: usize,
        max_i: usize,
        max_j: usize,
    },

    /// Interpolation request outside the tile footprint.
    #[error(
        "out of tile angles: ({}\u{b0}, {}\u{b0}) not in [{}\u{b0}, {}\u{b0}] x [{}\u{b0}, {}\u{b0}]",
        latitude.to_degrees(), longitude.to_degrees(),
        min_latitude.to_degrees(), max_latitude.to_degrees(),
        min_longitude.to_degrees(), max_longitude.to_degrees()
    )]
    OutOfTileAngles {
        latitude: f64,
        longitude: f64,
        min_latitude: f64,
        max_latitude: f64,
        min_longitude: f64,
        max_longitude: f64,
    },

    /// Tile with fewer than 2 x 2 elevation samples.
    #[error("empty tile")]
    EmptyTile,

    /// The updater returned a tile that does not properly cover the
    /// requested point.
    #[error(
        "updated tile misses interpolation neighbors for ({}\u{b0}, {}\u{b0})",
        latitude.to_degrees(), longitude.to_degrees()
    )]
    TileWithoutRequiredNeighbors { latitude: f64, longitude: f64 },

    /// The updater delivered no elevation data at all.
    #[error("no DEM data available")]
    NoDemData,
}

/// Convenience alias for `Result<T, RasterError>`.
pub type RasterResult<T> = Result<T, RasterError>;

impl RasterError {
    /// Creates an [`OutOfTileIndices`](Self::OutOfTileIndices) error.
    pub fn out_of_tile_indices(i: usize, j: usize, max_i: usize, max_j: usize) -> Self {
        Self::OutOfTileIndices { i, j, max_i, max_j }
    }

    /// Creates a [`TileWithoutRequiredNeighbors`](Self::TileWithoutRequiredNeighbors) error.
    pub fn tile_without_required_neighbors(latitude: f64, longitude: f64) -> Self {
        Self::TileWithoutRequiredNeighbors {
            latitude,
            longitude,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indices_message() {
        let err = RasterError::out_of_tile_indices(5, 7, 3, 3);
        assert_eq!(
            err.to_string(),
            "out of tile indices: [5, 7] not in [0, 3] x [0, 3]"
        );
    }

    #[test]
    fn test_angles_message_in_degrees() {
        let err = RasterError::OutOfTileAngles {
            latitude: 0.0,
            longitude: std::f64::consts::PI,
            min_latitude: -0.1,
            max_latitude: 0.1,
            min_longitude: 0.0,
            max_longitude: 0.1,
        };
        assert!(err.to_string().contains("180"), "got: {}", err);
    }
}
