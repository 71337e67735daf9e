//! Callback used by the cache to load DEM data on demand.

use crate::errors::RasterResult;
use crate::tile::Tile;

/// Supplies elevation data for the tile covering a point.
///
/// Implementations fill the tile with
/// [`set_geometry`](Tile::set_geometry) and
/// [`set_elevation`](Tile::set_elevation); the cache seals it afterward.
/// The delivered tile must cover the requested point strictly inside its
/// interpolation area (not on the boundary), otherwise the lookup fails
/// with
/// [`TileWithoutRequiredNeighbors`](crate::RasterError::TileWithoutRequiredNeighbors).
///
/// Updaters must not call back into the cache or the localization facade.
pub trait TileUpdater {
    /// Fills `tile` with data covering `(latitude, longitude)` (radians).
    fn update_tile(&self, latitude: f64, longitude: f64, tile: &mut Tile) -> RasterResult<()>;
}

/// Closures can serve as updaters directly, which keeps test DEMs terse.
impl<F> TileUpdater for F
where
    F: Fn(f64, f64, &mut Tile) -> RasterResult<()>,
{
    fn update_tile(&self, latitude: f64, longitude: f64, tile: &mut Tile) -> RasterResult<()> {
        self(latitude, longitude, tile)
    }
}

impl TileUpdater for Box<dyn TileUpdater> {
    fn update_tile(&self, latitude: f64, longitude: f64, tile: &mut Tile) -> RasterResult<()> {
        (**self).update_tile(latitude, longitude, tile)
    }
}
