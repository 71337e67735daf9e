//! Duvenhage ray/DEM intersection: min/max tile tree traversal.
//!
//! Within a tile the search descends the min/max k-d tree: at each node
//! the ray segment is clipped against the node's padded elevation
//! envelope (no overlap means the whole subregion is skipped), then
//! split at the node's boundary parallel or meridian, and the
//! sub-segments are recursed in ray order so the first hit found is the
//! first hit along the ray. Leaves delegate to the bilinear patch
//! intersection of the single cell they cover.
//!
//! When the ray leaves a tile without hitting terrain, the walker steps
//! an infinitesimal distance across the boundary and asks the cache for
//! the neighbor tile; longitude continuity across the antimeridian is
//! preserved by normalizing every geodetic conversion against the
//! current tile center.
//!
//! The flat-body mode replaces the curved envelope clipping with a
//! linear interpolation of the altitude between the segment endpoints:
//! cheaper, and accurate enough when tiles are small compared to the
//! body curvature.

use crate::algorithm::IntersectionAlgorithm;
use crate::errors::IntersectionResult;
use crate::walk::{
    geodetic_at, polished_cell_intersection, refine_in_tile, shell_margin, walk_tiles,
    CROSSING_EPS,
};
use pushloc_core::{Ellipsoid, NormalizedGeodeticPoint, Vector3};
use pushloc_raster::{Tile, TilesCache, TileUpdater};

/// DEM intersection by min/max tree traversal.
pub struct DuvenhageAlgorithm<U: TileUpdater> {
    cache: TilesCache<U>,
    flat_body: bool,
}

impl<U: TileUpdater> DuvenhageAlgorithm<U> {
    /// Creates the algorithm with its own tile cache.
    ///
    /// With `flat_body` set, the altitude clipping uses the locally
    /// planar approximation.
    pub fn new(updater: U, max_cached_tiles: usize, flat_body: bool) -> Self {
        Self {
            cache: TilesCache::new(updater, max_cached_tiles),
            flat_body,
        }
    }
}

/// Clips `[t0, t1]` against the padded envelope `[h_min, h_max]`,
/// returning the sub-segments (at most two, in ray order) on which the
/// ray altitude can overlap the envelope.
#[allow(clippy::too_many_arguments)]
fn clip_to_envelope(
    flat_body: bool,
    ellipsoid: &Ellipsoid,
    tile: &Tile,
    position: &Vector3,
    los: &Vector3,
    t0: f64,
    t1: f64,
    h_min: f64,
    h_max: f64,
) -> Vec<(f64, f64)> {
    let up = h_max + shell_margin(h_max);
    let down = h_min - shell_margin(h_min);

    if flat_body {
        let h0 = geodetic_at(ellipsoid, tile, position, los, t0).altitude();
        let h1 = geodetic_at(ellipsoid, tile, position, los, t1).altitude();
        let dh = h1 - h0;
        if dh.abs() < 1e-12 {
            return if h0 <= up && h0 >= down {
                vec![(t0, t1)]
            } else {
                vec![]
            };
        }
        let t_at = |h: f64| t0 + (h - h0) / dh * (t1 - t0);
        let (ta, tb) = if dh > 0.0 {
            (t_at(down), t_at(up))
        } else {
            (t_at(up), t_at(down))
        };
        let a = t0.max(ta);
        let b = t1.min(tb);
        return if b - a > CROSSING_EPS {
            vec![(a, b)]
        } else {
            vec![]
        };
    }

    let Some((ta, tb)) = ellipsoid.altitude_shell_crossings(position, los, up) else {
        // the whole line stays above the envelope
        return vec![];
    };
    let a = t0.max(ta);
    let b = t1.min(tb);
    if b - a <= CROSSING_EPS {
        return vec![];
    }

    // carve out the part sunk below the envelope floor, if the floor
    // shell still has positive radii
    if ellipsoid.polar_radius() + down > 0.0 {
        if let Some((tc, td)) = ellipsoid.altitude_shell_crossings(position, los, down) {
            let mut segments = Vec::with_capacity(2);
            if tc.min(b) - a > CROSSING_EPS {
                segments.push((a, tc.min(b)));
            }
            if b - td.max(a) > CROSSING_EPS {
                segments.push((td.max(a), b));
            }
            return segments;
        }
    }
    vec![(a, b)]
}

/// Depth-first traversal of the min/max tree over `[t0, t1]`.
#[allow(clippy::too_many_arguments)]
fn search_node(
    flat_body: bool,
    ellipsoid: &Ellipsoid,
    tile: &Tile,
    position: &Vector3,
    los: &Vector3,
    node_index: usize,
    t0: f64,
    t1: f64,
) -> Option<NormalizedGeodeticPoint> {
    let node = tile.min_max_tree().node(node_index);
    let segments = clip_to_envelope(
        flat_body,
        ellipsoid,
        tile,
        position,
        los,
        t0,
        t1,
        node.min_elevation,
        node.max_elevation,
    );

    for (s0, s1) in segments {
        match node.children() {
            None => {
                // leaf cell
                let entry = geodetic_at(ellipsoid, tile, position, los, s0);
                let along_t = if s1 - s0 > 1.0 { s1 } else { s0 + 1.0 };
                let along = geodetic_at(ellipsoid, tile, position, los, along_t);
                if let Some(hit) = polished_cell_intersection(
                    ellipsoid,
                    tile,
                    position,
                    los,
                    &entry,
                    &along,
                    node.min_row,
                    node.min_column,
                ) {
                    return Some(hit);
                }
            }
            Some((first, second)) => {
                let crossings: Vec<f64> = if node.splits_along_rows() {
                    let boundary = tile.latitude_at_index(node.split_index());
                    ellipsoid.latitude_crossings(position, los, boundary)
                } else {
                    let boundary = tile.longitude_at_index(node.split_index());
                    ellipsoid
                        .longitude_crossing(position, los, boundary)
                        .into_iter()
                        .collect()
                };

                let mut bounds = Vec::with_capacity(crossings.len() + 2);
                bounds.push(s0);
                for t in crossings {
                    if t > s0 + CROSSING_EPS && t < s1 - CROSSING_EPS {
                        bounds.push(t);
                    }
                }
                bounds.push(s1);
                bounds.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

                for window in bounds.windows(2) {
                    let (a, b) = (window[0], window[1]);
                    if b - a < CROSSING_EPS {
                        continue;
                    }
                    let mid = geodetic_at(ellipsoid, tile, position, los, 0.5 * (a + b));
                    let child = if node.splits_along_rows() {
                        if mid.latitude() < tile.latitude_at_index(node.split_index()) {
                            first
                        } else {
                            second
                        }
                    } else if mid.longitude() < tile.longitude_at_index(node.split_index()) {
                        first
                    } else {
                        second
                    };
                    if let Some(hit) =
                        search_node(flat_body, ellipsoid, tile, position, los, child, a, b)
                    {
                        return Some(hit);
                    }
                }
            }
        }
    }
    None
}

impl<U: TileUpdater> IntersectionAlgorithm for DuvenhageAlgorithm<U> {
    fn intersection(
        &mut self,
        ellipsoid: &Ellipsoid,
        position: &Vector3,
        los: &Vector3,
    ) -> IntersectionResult<NormalizedGeodeticPoint> {
        let flat_body = self.flat_body;
        walk_tiles(
            &mut self.cache,
            ellipsoid,
            position,
            los,
            |ellipsoid, tile, position, los, s0, s1| {
                search_node(flat_body, ellipsoid, tile, position, los, 0, s0, s1)
            },
        )
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
        // the shifted ray slipped out of the guessed neighborhood; fall
        // back to a full search
        self.intersection(ellipsoid, position, los)
    }
}
