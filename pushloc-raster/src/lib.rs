//! DEM raster layer: tiles, min/max trees and the tile cache.
//!
//! Elevation data reaches the localization pipeline as rectangular
//! lat/lon tiles supplied on demand by a user [`TileUpdater`] callback
//! and held in a bounded LRU [`TilesCache`]. Each sealed [`Tile`] owns a
//! [`MinMaxTree`], the hierarchical elevation envelope the Duvenhage
//! intersection algorithm prunes against.

mod cache;
mod errors;
mod minmax;
mod tile;
mod updater;

pub use cache::TilesCache;
pub use errors::{RasterError, RasterResult};
pub use minmax::{MinMaxNode, MinMaxTree};
pub use tile::{Tile, TileLocation};
pub use updater::TileUpdater;
