//! Bounded LRU cache of DEM tiles.

use crate::errors::{RasterError, RasterResult};
use crate::tile::{Tile, TileLocation};
use crate::updater::TileUpdater;
use std::rc::Rc;
use tracing::debug;

/// Least-recently-used cache of sealed tiles, keyed by coverage.
///
/// A lookup scans the cached tiles for one whose interpolation area
/// contains the query point, refreshing its recency. On a miss the
/// updater is invoked, the new tile is sealed, verified to cover the
/// point and inserted; the least recently used tile is dropped when the
/// cache exceeds its bound. Tiles are handed out as `Rc` so a traversal
/// can keep the current tile alive while the cache evicts and loads
/// neighbors.
pub struct TilesCache<U: TileUpdater> {
    updater: U,
    max_cached_tiles: usize,
    tiles: Vec<Rc<Tile>>,
}

impl<U: TileUpdater> TilesCache<U> {
    /// Creates a cache holding at most `max_cached_tiles` tiles.
    pub fn new(updater: U, max_cached_tiles: usize) -> Self {
        Self {
            updater,
            max_cached_tiles: max_cached_tiles.max(1),
            tiles: Vec::new(),
        }
    }

    /// Number of tiles currently alive in the cache.
    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// Returns the tile whose interpolation area covers
    /// `(latitude, longitude)`, loading it through the updater if needed.
    pub fn get_tile(&mut self, latitude: f64, longitude: f64) -> RasterResult<Rc<Tile>> {
        if let Some(position) = self
            .tiles
            .iter()
            .position(|tile| tile.location(latitude, longitude) == TileLocation::HasInterpolationNeighbors)
        {
            let tile = self.tiles.remove(position);
            self.tiles.insert(0, Rc::clone(&tile));
            return Ok(tile);
        }

        debug!(
            latitude = latitude.to_degrees(),
            longitude = longitude.to_degrees(),
            "tile cache miss, invoking updater"
        );
        let mut tile = Tile::new();
        self.updater.update_tile(latitude, longitude, &mut tile)?;
        tile.tile_update_completed()?;

        if tile.location(latitude, longitude) != TileLocation::HasInterpolationNeighbors {
            return Err(RasterError::tile_without_required_neighbors(
                latitude, longitude,
            ));
        }

        let tile = Rc::new(tile);
        self.tiles.insert(0, Rc::clone(&tile));
        if self.tiles.len() > self.max_cached_tiles {
            let evicted = self.tiles.pop();
            if let Some(evicted) = evicted {
                debug!(
                    min_latitude = evicted.min_latitude().to_degrees(),
                    min_longitude = evicted.min_longitude().to_degrees(),
                    "evicting least recently used tile"
                );
            }
        }
        Ok(tile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    /// One-degree tiles on a regular worldwide grid, flat elevation,
    /// counting updater invocations.
    struct CountingUpdater {
        calls: Cell<usize>,
    }

    impl TileUpdater for CountingUpdater {
        fn update_tile(&self, latitude: f64, longitude: f64, tile: &mut Tile) -> RasterResult<()> {
            self.calls.set(self.calls.get() + 1);
            let size = 1.0_f64.to_radians();
            let step = size / 10.0;
            let min_lat = (latitude / size).floor() * size - step;
            let min_lon = (longitude / size).floor() * size - step;
            tile.set_geometry(min_lat, min_lon, step, step, 13, 13)?;
            for i in 0..13 {
                for j in 0..13 {
                    tile.set_elevation(i, j, 0.0)?;
                }
            }
            Ok(())
        }
    }

    #[test]
    fn test_miss_then_hit() {
        let mut cache = TilesCache::new(
            CountingUpdater {
                calls: Cell::new(0),
            },
            4,
        );
        let lat = 0.5_f64.to_radians();
        let lon = 0.5_f64.to_radians();
        let t1 = cache.get_tile(lat, lon).unwrap();
        let t2 = cache.get_tile(lat, lon).unwrap();
        assert!(Rc::ptr_eq(&t1, &t2));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_lru_eviction_order() {
        let updater = CountingUpdater {
            calls: Cell::new(0),
        };
        let mut cache = TilesCache::new(updater, 2);
        let rad = |d: f64| d.to_radians();

        // touch tiles A, B, A, C with capacity 2: B is evicted
        cache.get_tile(rad(0.5), rad(0.5)).unwrap(); // A (miss)
        cache.get_tile(rad(10.5), rad(0.5)).unwrap(); // B (miss)
        cache.get_tile(rad(0.5), rad(0.5)).unwrap(); // A (hit, refreshed)
        cache.get_tile(rad(20.5), rad(0.5)).unwrap(); // C (miss, evicts B)
        assert_eq!(cache.updater.calls.get(), 3);
        assert_eq!(cache.len(), 2);

        // A must still be cached, B must be reloaded
        cache.get_tile(rad(0.5), rad(0.5)).unwrap();
        assert_eq!(cache.updater.calls.get(), 3, "tile A was evicted");
        cache.get_tile(rad(10.5), rad(0.5)).unwrap();
        assert_eq!(cache.updater.calls.get(), 4, "tile B should have been evicted");
    }

    #[test]
    fn test_cache_never_exceeds_bound() {
        let updater = CountingUpdater {
            calls: Cell::new(0),
        };
        let mut cache = TilesCache::new(updater, 3);
        for k in 0..10 {
            cache
                .get_tile((k as f64 * 2.0 + 0.5).to_radians(), 0.5_f64.to_radians())
                .unwrap();
            assert!(cache.len() <= 3);
        }
    }

    #[test]
    fn test_updater_not_covering_point() {
        // an updater that always delivers a tile around the origin
        let bad = |_: f64, _: f64, tile: &mut Tile| {
            tile.set_geometry(0.0, 0.0, 0.01, 0.01, 5, 5)?;
            for i in 0..5 {
                for j in 0..5 {
                    tile.set_elevation(i, j, 0.0)?;
                }
            }
            Ok(())
        };
        let mut cache = TilesCache::new(bad, 2);
        let result = cache.get_tile(1.0, 1.0);
        assert!(matches!(
            result,
            Err(RasterError::TileWithoutRequiredNeighbors { .. })
        ));
    }

    #[test]
    fn test_updater_without_data() {
        let empty = |_: f64, _: f64, _tile: &mut Tile| -> RasterResult<()> { Ok(()) };
        let mut cache = TilesCache::new(empty, 2);
        assert!(matches!(
            cache.get_tile(0.1, 0.1),
            Err(RasterError::NoDemData)
        ));
        assert!(cache.is_empty());
    }
}
