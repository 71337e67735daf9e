//! Shared ray-walking machinery for the DEM-backed algorithms.
//!
//! Both the Duvenhage traversal and the exhaustive scan drive the same
//! outer loop: seed a tile under the ray, stabilize the DEM entry point
//! against that tile's max-elevation shell, find where the ray runs
//! inside the tile, search it, and hop across the boundary into the
//! neighbor when nothing is hit. Only the per-tile search differs, so it
//! is injected into [`walk_tiles`] as a closure.

use crate::errors::{IntersectionError, IntersectionResult};
use pushloc_core::{Ellipsoid, GeodeticPoint, GeomError, NormalizedGeodeticPoint, Vector3};
use pushloc_raster::{Tile, TileLocation, TilesCache, TileUpdater};
use std::rc::Rc;
use tracing::trace;

/// Minimum sub-segment length considered during traversal (metres along
/// the ray).
pub(crate) const CROSSING_EPS: f64 = 1.0e-6;

/// How far past a tile boundary the walker steps before asking the cache
/// for the neighbor tile (metres along the ray).
pub(crate) const BOUNDARY_NUDGE: f64 = 1.0e-2;

/// Hard bound on tile transitions for a single ray; crossing more tiles
/// than this means the walk is not making progress.
pub(crate) const MAX_TILE_HOPS: usize = 1000;

/// Safety padding added to elevation envelopes before clipping against
/// them, absorbing the small difference between the `(a + h, b + h)`
/// shell and the true surface of geodetic altitude `h`.
pub(crate) fn shell_margin(altitude: f64) -> f64 {
    10.0 + 0.005 * altitude.abs()
}

/// Geodetic point of the ray at parameter `t`, unwrapped against the
/// tile center longitude.
pub(crate) fn geodetic_at(
    ellipsoid: &Ellipsoid,
    tile: &Tile,
    position: &Vector3,
    los: &Vector3,
    t: f64,
) -> NormalizedGeodeticPoint {
    ellipsoid.to_normalized_geodetic(&(*position + *los * t), tile.center_longitude())
}

/// Ground-level seed below the ray, used to locate the first tile.
///
/// Rays that miss the zero-altitude ellipsoid but may still graze high
/// terrain are seeded at their closest approach instead.
pub(crate) fn seed_geodetic(
    ellipsoid: &Ellipsoid,
    position: &Vector3,
    los: &Vector3,
) -> IntersectionResult<GeodeticPoint> {
    match ellipsoid.point_on_ground(position, los, 0.0, 0.0) {
        Ok(gp) => Ok(gp.to_geodetic()),
        Err(GeomError::LineOfSightDoesNotReachGround) => {
            let t = ellipsoid.closest_approach(position, los, 0.0);
            Ok(ellipsoid.to_geodetic(&(*position + *los * t)))
        }
        Err(e) => Err(e.into()),
    }
}

/// Parameter of the DEM entry point: where the ray first descends below
/// the padded max-elevation shell of `tile`.
pub(crate) fn entry_parameter(
    ellipsoid: &Ellipsoid,
    tile: &Tile,
    position: &Vector3,
    los: &Vector3,
) -> IntersectionResult<f64> {
    let shell = tile.max_elevation() + shell_margin(tile.max_elevation());
    let (t_entry, _) = ellipsoid
        .altitude_shell_crossings(position, los, shell)
        .ok_or(GeomError::LineOfSightDoesNotReachGround)?;
    if t_entry < 0.0 {
        return Err(IntersectionError::DemEntryPointBehindSpacecraft);
    }
    Ok(t_entry)
}

/// First interval `[a, b]` with `a >= from` on which the ray runs inside
/// the tile footprint, or `None` when the ray never enters it past
/// `from`.
///
/// The search is capped where the ray sinks below the tile's padded
/// floor shell: terrain cannot be crossed for the first time below the
/// lowest elevation the tile holds.
pub(crate) fn tile_interval(
    ellipsoid: &Ellipsoid,
    tile: &Tile,
    position: &Vector3,
    los: &Vector3,
    from: f64,
) -> Option<(f64, f64)> {
    let floor = tile.min_elevation() - shell_margin(tile.min_elevation());
    let cap = if ellipsoid.polar_radius() + floor > 0.0 {
        match ellipsoid.altitude_shell_crossings(position, los, floor) {
            Some((tc, _)) if tc > from + CROSSING_EPS => tc,
            Some(_) => return None,
            None => from + 4.0 * ellipsoid.equatorial_radius(),
        }
    } else {
        from + 4.0 * ellipsoid.equatorial_radius()
    };

    let mut crossings: Vec<f64> = Vec::with_capacity(6);
    for latitude in [tile.min_latitude(), tile.max_latitude()] {
        crossings.extend(ellipsoid.latitude_crossings(position, los, latitude));
    }
    for longitude in [tile.min_longitude(), tile.max_longitude()] {
        if let Some(t) = ellipsoid.longitude_crossing(position, los, longitude) {
            crossings.push(t);
        }
    }
    crossings.retain(|&t| t > from + CROSSING_EPS && t < cap - CROSSING_EPS);
    crossings.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let mut bounds = Vec::with_capacity(crossings.len() + 2);
    bounds.push(from);
    bounds.extend(crossings);
    bounds.push(cap);

    for window in bounds.windows(2) {
        let (a, b) = (window[0], window[1]);
        if b - a < CROSSING_EPS {
            continue;
        }
        let mid = geodetic_at(ellipsoid, tile, position, los, 0.5 * (a + b));
        if tile.location(mid.latitude(), mid.longitude()) != TileLocation::OutOfTile {
            return Some((a, b));
        }
    }
    None
}

/// Outer loop shared by the DEM-backed algorithms.
///
/// `search` inspects one tile over one in-tile ray segment and returns
/// the first crossing it finds there.
pub(crate) fn walk_tiles<U, F>(
    cache: &mut TilesCache<U>,
    ellipsoid: &Ellipsoid,
    position: &Vector3,
    los: &Vector3,
    mut search: F,
) -> IntersectionResult<NormalizedGeodeticPoint>
where
    U: TileUpdater,
    F: FnMut(&Ellipsoid, &Tile, &Vector3, &Vector3, f64, f64) -> Option<NormalizedGeodeticPoint>,
{
    let seed = seed_geodetic(ellipsoid, position, los)?;
    let mut tile = cache.get_tile(seed.latitude, seed.longitude)?;

    // stabilize the entry tile: the crossing of the current tile's
    // max-elevation shell may land over a neighbor; follow it until the
    // entry point and the tile agree
    let mut t_current = entry_parameter(ellipsoid, &tile, position, los)?;
    for _ in 0..8 {
        let entry = geodetic_at(ellipsoid, &tile, position, los, t_current);
        if tile.location(entry.latitude(), entry.longitude()) != TileLocation::OutOfTile {
            break;
        }
        tile = cache.get_tile(entry.latitude(), entry.longitude())?;
        t_current = entry_parameter(ellipsoid, &tile, position, los)?;
    }

    for hop in 0..MAX_TILE_HOPS {
        // escape check: ascending above everything this tile holds
        let gp_current = geodetic_at(ellipsoid, &tile, position, los, t_current);
        let ceiling = tile.max_elevation() + shell_margin(tile.max_elevation());
        if gp_current.altitude() > ceiling && los.dot(&gp_current.zenith()) > 0.0 {
            return Err(GeomError::LineOfSightDoesNotReachGround.into());
        }

        let Some((s0, s1)) = tile_interval(ellipsoid, &tile, position, los, t_current) else {
            return Err(GeomError::LineOfSightDoesNotReachGround.into());
        };

        if let Some(hit) = search(ellipsoid, &tile, position, los, s0, s1) {
            return Ok(hit);
        }

        // hop across the boundary into the neighbor tile
        t_current = s1 + BOUNDARY_NUDGE;
        let next = ellipsoid.to_geodetic(&(*position + *los * t_current));
        trace!(
            hop,
            latitude = next.latitude.to_degrees(),
            longitude = next.longitude.to_degrees(),
            "ray left tile, continuing in neighbor"
        );
        tile = cache.get_tile(next.latitude, next.longitude)?;
    }

    Err(IntersectionError::internal("ray/DEM tile walk"))
}

/// Characteristic cell size of a tile, in metres.
pub(crate) fn cell_diagonal(ellipsoid: &Ellipsoid, tile: &Tile) -> f64 {
    let r = ellipsoid.equatorial_radius();
    let dlat = tile.latitude_step() * r;
    let dlon = tile.longitude_step() * r;
    libm::sqrt(dlat * dlat + dlon * dlon)
}

/// Cell intersection with iterative re-linearization.
///
/// [`Tile::cell_intersection`] linearizes the ray between two sampled
/// geodetic points; over spans of several kilometres the curvature of
/// the geodetic path costs metres of altitude. Once a first crossing is
/// found, re-sampling the path over a short bracket around it shrinks
/// that error below the millimetre level in two iterations.
#[allow(clippy::too_many_arguments)]
pub(crate) fn polished_cell_intersection(
    ellipsoid: &Ellipsoid,
    tile: &Tile,
    position: &Vector3,
    los: &Vector3,
    entry: &NormalizedGeodeticPoint,
    along: &NormalizedGeodeticPoint,
    i: usize,
    j: usize,
) -> Option<NormalizedGeodeticPoint> {
    let mut hit = tile.cell_intersection(entry, along, i, j)?;
    let delta = (0.02 * cell_diagonal(ellipsoid, tile)).max(1.0);
    for _ in 0..2 {
        let t_hit = (ellipsoid.to_cartesian(&hit.to_geodetic()) - *position).dot(los)
            / los.magnitude_squared();
        let near_entry = geodetic_at(ellipsoid, tile, position, los, t_hit - delta);
        let near_along = geodetic_at(ellipsoid, tile, position, los, t_hit + delta);
        match tile.cell_intersection(&near_entry, &near_along, i, j) {
            Some(polished) => hit = polished,
            None => break,
        }
    }
    Some(hit)
}

/// Recomputes an exact cell intersection around an approximate hit, for
/// the second pass of light-time corrected localization.
///
/// The ray is slightly different from the one that produced the guess,
/// so the hit may have slipped into an adjacent cell; the 3x3
/// neighborhood around the guessed cell is searched and the closest
/// crossing along the ray wins.
pub(crate) fn refine_in_tile<U: TileUpdater>(
    cache: &mut TilesCache<U>,
    ellipsoid: &Ellipsoid,
    position: &Vector3,
    los: &Vector3,
    guess: &NormalizedGeodeticPoint,
) -> IntersectionResult<Option<NormalizedGeodeticPoint>> {
    let tile: Rc<Tile> = cache.get_tile(guess.latitude(), guess.longitude())?;
    let Some((i0, j0)) = tile.floor_cell(guess.latitude(), guess.longitude()) else {
        return Ok(None);
    };

    let guess_cart = ellipsoid.to_cartesian(&guess.to_geodetic());
    let t_close = (guess_cart - *position).dot(los) / los.magnitude_squared();
    let reach = 1.5 * cell_diagonal(ellipsoid, &tile);
    let entry = geodetic_at(ellipsoid, &tile, position, los, t_close - reach);
    let along = geodetic_at(ellipsoid, &tile, position, los, t_close + reach);

    let mut best: Option<(f64, NormalizedGeodeticPoint)> = None;
    for di in -1i64..=1 {
        for dj in -1i64..=1 {
            let i = i0 as i64 + di;
            let j = j0 as i64 + dj;
            if i < 0
                || j < 0
                || i as usize + 1 >= tile.latitude_rows()
                || j as usize + 1 >= tile.longitude_columns()
            {
                continue;
            }
            if let Some(hit) = polished_cell_intersection(
                ellipsoid,
                &tile,
                position,
                los,
                &entry,
                &along,
                i as usize,
                j as usize,
            ) {
                let t = (ellipsoid.to_cartesian(&hit.to_geodetic()) - *position).dot(los);
                if best.as_ref().map_or(true, |(tb, _)| t < *tb) {
                    best = Some((t, hit));
                }
            }
        }
    }
    Ok(best.map(|(_, hit)| hit))
}
