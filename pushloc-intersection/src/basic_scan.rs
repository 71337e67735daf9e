//! Exhaustive cell-by-cell scan, the slow reference implementation.
//!
//! Walks the same outer tile loop as the Duvenhage algorithm but, inside
//! a tile, tries every cell in the rectangle spanned by the ray's entry
//! and exit points and keeps the closest crossing. No pruning, no tree:
//! quadratic cost, trivially correct. Exists to validate the fast
//! traversal in tests; do not use it in production.

use crate::algorithm::IntersectionAlgorithm;
use crate::errors::IntersectionResult;
use crate::walk::{
    cell_diagonal, geodetic_at, polished_cell_intersection, refine_in_tile, walk_tiles,
};
use pushloc_core::{Ellipsoid, GeodeticPoint, NormalizedGeodeticPoint, Vector3};
use pushloc_raster::{Tile, TilesCache, TileUpdater};

/// Brute-force DEM intersection for validation purposes.
pub struct BasicScanAlgorithm<U: TileUpdater> {
    cache: TilesCache<U>,
}

impl<U: TileUpdater> BasicScanAlgorithm<U> {
    pub fn new(updater: U, max_cached_tiles: usize) -> Self {
        Self {
            cache: TilesCache::new(updater, max_cached_tiles),
        }
    }
}

/// Scans every cell in the rectangle spanned by the segment `[s0, s1]`,
/// keeping the crossing closest to the spacecraft.
fn scan_tile(
    ellipsoid: &Ellipsoid,
    tile: &Tile,
    position: &Vector3,
    los: &Vector3,
    s0: f64,
    s1: f64,
) -> Option<NormalizedGeodeticPoint> {
    let entry = geodetic_at(ellipsoid, tile, position, los, s0);
    let exit = geodetic_at(ellipsoid, tile, position, los, s1);

    let to_grid = |gp: &NormalizedGeodeticPoint| -> (f64, f64) {
        (
            (gp.latitude() - tile.min_latitude()) / tile.latitude_step(),
            (gp.longitude() - tile.min_longitude()) / tile.longitude_step(),
        )
    };
    let (ei, ej) = to_grid(&entry);
    let (xi, xj) = to_grid(&exit);

    let clamp_row = |v: f64| (v.floor().max(0.0) as usize).min(tile.latitude_rows() - 2);
    let clamp_col = |v: f64| (v.floor().max(0.0) as usize).min(tile.longitude_columns() - 2);
    let i_min = clamp_row(ei.min(xi) - 1.0);
    let i_max = clamp_row(ei.max(xi) + 1.0);
    let j_min = clamp_col(ej.min(xj) - 1.0);
    let j_max = clamp_col(ej.max(xj) + 1.0);

    let reach = cell_diagonal(ellipsoid, tile);
    let mut best: Option<(f64, NormalizedGeodeticPoint)> = None;
    for i in i_min..=i_max {
        for j in j_min..=j_max {
            // local linearization bracket around the cell center
            let center = GeodeticPoint::new(
                tile.latitude_at_index(i) + 0.5 * tile.latitude_step(),
                tile.longitude_at_index(j) + 0.5 * tile.longitude_step(),
                0.5 * (tile.min_elevation() + tile.max_elevation()),
            );
            let t_center =
                (ellipsoid.to_cartesian(&center) - *position).dot(los) / los.magnitude_squared();
            let cell_entry = geodetic_at(ellipsoid, tile, position, los, t_center - reach);
            let cell_along = geodetic_at(ellipsoid, tile, position, los, t_center + reach);
            if let Some(hit) = polished_cell_intersection(
                ellipsoid, tile, position, los, &cell_entry, &cell_along, i, j,
            ) {
                let t = (ellipsoid.to_cartesian(&hit.to_geodetic()) - *position).dot(los);
                if t >= s0 - reach && best.as_ref().map_or(true, |(tb, _)| t < *tb) {
                    best = Some((t, hit));
                }
            }
        }
    }
    best.map(|(_, hit)| hit)
}

impl<U: TileUpdater> IntersectionAlgorithm for BasicScanAlgorithm<U> {
    fn intersection(
        &mut self,
        ellipsoid: &Ellipsoid,
        position: &Vector3,
        los: &Vector3,
    ) -> IntersectionResult<NormalizedGeodeticPoint> {
        walk_tiles(&mut self.cache, ellipsoid, position, los, scan_tile)
    }

    fn refine_intersection(
        &mut self,
        ellipsoid: &Ellipsoid,
        position: &Vector3,
        los: &Vector3,
        close_guess: &NormalizedGeodeticPoint,
    ) -> IntersectionResult<NormalizedGeodeticPoint> {
        if let Some(hit) = refine_in_tile(&mut self.cache, ellipsoid, position, los, close_guess)? {
            return Ok(hit);
        }
        self.intersection(ellipsoid, position, los)
    }
}
