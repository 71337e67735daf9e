//! DEM tiles: a rectangular lat/lon lattice of elevation samples.
//!
//! A tile starts empty, gets filled by a [`TileUpdater`](crate::TileUpdater)
//! (geometry first, then per-sample elevations) and is sealed by
//! [`tile_update_completed`](Tile::tile_update_completed), which freezes
//! the data and builds the min/max tree. After sealing the tile only
//! answers queries.
//!
//! Latitudes grow with the row index `i`, longitudes with the column
//! index `j`. A *cell* `(i, j)` is the quadrilateral patch between the
//! four samples `(i, j)`, `(i+1, j)`, `(i, j+1)`, `(i+1, j+1)`, carrying
//! the bilinear elevation surface used for ray intersection. Longitudes
//! are compared after unwrapping against the tile center, so tiles
//! spanning the antimeridian behave like any other tile.

use crate::errors::{RasterError, RasterResult};
use crate::minmax::MinMaxTree;
use pushloc_core::{normalize_longitude, NormalizedGeodeticPoint};

/// Where a query point sits relative to a tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileLocation {
    /// Interior: the four samples needed for bilinear interpolation all
    /// exist.
    HasInterpolationNeighbors,
    /// On the tile but at the very edge; raw data exists, interpolation
    /// neighbors do not.
    HasRawData,
    /// Outside the tile footprint.
    OutOfTile,
}

/// A DEM tile with its min/max tree.
#[derive(Debug, Clone, Default)]
pub struct Tile {
    min_latitude: f64,
    min_longitude: f64,
    latitude_step: f64,
    longitude_step: f64,
    latitude_rows: usize,
    longitude_columns: usize,
    elevations: Vec<f64>,
    min_elevation: f64,
    max_elevation: f64,
    tree: MinMaxTree,
    sealed: bool,
}

impl Tile {
    /// Creates an empty tile, ready to be filled by an updater.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the grid geometry and allocates the elevation storage.
    ///
    /// `min_latitude`/`min_longitude` locate the first sample; steps must
    /// be positive and each dimension must hold at least 2 samples.
    pub fn set_geometry(
        &mut self,
        min_latitude: f64,
        min_longitude: f64,
        latitude_step: f64,
        longitude_step: f64,
        latitude_rows: usize,
        longitude_columns: usize,
    ) -> RasterResult<()> {
        if latitude_rows < 2
            || longitude_columns < 2
            || latitude_step <= 0.0
            || longitude_step <= 0.0
        {
            return Err(RasterError::EmptyTile);
        }
        self.min_latitude = min_latitude;
        self.min_longitude = min_longitude;
        self.latitude_step = latitude_step;
        self.longitude_step = longitude_step;
        self.latitude_rows = latitude_rows;
        self.longitude_columns = longitude_columns;
        self.elevations = vec![0.0; latitude_rows * longitude_columns];
        Ok(())
    }

    /// Stores one elevation sample, bounds-checked.
    pub fn set_elevation(&mut self, i: usize, j: usize, elevation: f64) -> RasterResult<()> {
        if self.latitude_rows == 0 {
            return Err(RasterError::EmptyTile);
        }
        self.check_indices(i, j)?;
        self.elevations[i * self.longitude_columns + j] = elevation;
        Ok(())
    }

    /// Seals the tile: computes the global elevation envelope and builds
    /// the min/max tree. Fails with [`RasterError::NoDemData`] when no
    /// geometry was ever provided.
    pub fn tile_update_completed(&mut self) -> RasterResult<()> {
        if self.latitude_rows == 0 {
            return Err(RasterError::NoDemData);
        }
        self.min_elevation = self.elevations.iter().cloned().fold(f64::INFINITY, f64::min);
        self.max_elevation = self
            .elevations
            .iter()
            .cloned()
            .fold(f64::NEG_INFINITY, f64::max);
        self.tree = MinMaxTree::build(
            &self.elevations,
            self.latitude_rows,
            self.longitude_columns,
        );
        self.sealed = true;
        Ok(())
    }

    #[inline]
    pub fn min_latitude(&self) -> f64 {
        self.min_latitude
    }

    #[inline]
    pub fn min_longitude(&self) -> f64 {
        self.min_longitude
    }

    /// Latitude of the last sample row.
    #[inline]
    pub fn max_latitude(&self) -> f64 {
        self.latitude_at_index(self.latitude_rows - 1)
    }

    /// Longitude of the last sample column (may exceed π for
    /// antimeridian tiles).
    #[inline]
    pub fn max_longitude(&self) -> f64 {
        self.longitude_at_index(self.longitude_columns - 1)
    }

    #[inline]
    pub fn latitude_step(&self) -> f64 {
        self.latitude_step
    }

    #[inline]
    pub fn longitude_step(&self) -> f64 {
        self.longitude_step
    }

    #[inline]
    pub fn latitude_rows(&self) -> usize {
        self.latitude_rows
    }

    #[inline]
    pub fn longitude_columns(&self) -> usize {
        self.longitude_columns
    }

    #[inline]
    pub fn latitude_at_index(&self, i: usize) -> f64 {
        self.min_latitude + i as f64 * self.latitude_step
    }

    #[inline]
    pub fn longitude_at_index(&self, j: usize) -> f64 {
        self.min_longitude + j as f64 * self.longitude_step
    }

    /// Longitude of the tile center, the unwrapping reference for all
    /// longitude comparisons on this tile.
    #[inline]
    pub fn center_longitude(&self) -> f64 {
        self.min_longitude + 0.5 * (self.longitude_columns - 1) as f64 * self.longitude_step
    }

    /// Smallest elevation sample of the tile.
    #[inline]
    pub fn min_elevation(&self) -> f64 {
        self.min_elevation
    }

    /// Largest elevation sample of the tile.
    #[inline]
    pub fn max_elevation(&self) -> f64 {
        self.max_elevation
    }

    /// The min/max tree built at sealing time.
    #[inline]
    pub fn min_max_tree(&self) -> &MinMaxTree {
        &self.tree
    }

    /// Raw elevation lookup, bounds-checked.
    pub fn elevation_at_indices(&self, i: usize, j: usize) -> RasterResult<f64> {
        self.check_indices(i, j)?;
        Ok(self.elevations[i * self.longitude_columns + j])
    }

    /// Continuous (row, column) coordinates of a point, longitude
    /// unwrapped against the tile center.
    fn grid_coordinates(&self, latitude: f64, longitude: f64) -> (f64, f64) {
        let lon = normalize_longitude(longitude, self.center_longitude());
        (
            (latitude - self.min_latitude) / self.latitude_step,
            (lon - self.min_longitude) / self.longitude_step,
        )
    }

    /// Classifies a point against the tile footprint.
    pub fn location(&self, latitude: f64, longitude: f64) -> TileLocation {
        if self.latitude_rows == 0 {
            return TileLocation::OutOfTile;
        }
        let (di, dj) = self.grid_coordinates(latitude, longitude);
        let max_i = (self.latitude_rows - 1) as f64;
        let max_j = (self.longitude_columns - 1) as f64;
        if di < 0.0 || di > max_i || dj < 0.0 || dj > max_j {
            TileLocation::OutOfTile
        } else if di < max_i && dj < max_j {
            TileLocation::HasInterpolationNeighbors
        } else {
            TileLocation::HasRawData
        }
    }

    /// Cell indices of the point, clamped to valid cells, or `None`
    /// outside the tile.
    pub fn floor_cell(&self, latitude: f64, longitude: f64) -> Option<(usize, usize)> {
        if self.location(latitude, longitude) == TileLocation::OutOfTile {
            return None;
        }
        let (di, dj) = self.grid_coordinates(latitude, longitude);
        let i = (di.floor() as usize).min(self.latitude_rows - 2);
        let j = (dj.floor() as usize).min(self.longitude_columns - 2);
        Some((i, j))
    }

    /// Bilinear elevation at a point inside the tile.
    pub fn interpolate_elevation(&self, latitude: f64, longitude: f64) -> RasterResult<f64> {
        let (i, j) = self
            .floor_cell(latitude, longitude)
            .ok_or_else(|| self.out_of_tile_angles(latitude, longitude))?;
        let (di, dj) = self.grid_coordinates(latitude, longitude);
        let u = di - i as f64;
        let v = dj - j as f64;
        let h00 = self.elevations[i * self.longitude_columns + j];
        let h01 = self.elevations[i * self.longitude_columns + j + 1];
        let h10 = self.elevations[(i + 1) * self.longitude_columns + j];
        let h11 = self.elevations[(i + 1) * self.longitude_columns + j + 1];
        Ok((1.0 - u) * (1.0 - v) * h00 + u * (1.0 - v) * h10 + (1.0 - u) * v * h01 + u * v * h11)
    }

    /// Intersection of a ray with the bilinear surface of cell `(i, j)`.
    ///
    /// The ray is described by two of its points converted to geodetic
    /// coordinates and unwrapped against the same reference: `entry` at
    /// parameter 0 and `along` further down the ray. The path is
    /// linearized between them, which is accurate over the extent of a
    /// cell; the caller picks `along` roughly one cell away. Returns the
    /// first crossing at or after `entry` that falls inside the cell, or
    /// `None`.
    pub fn cell_intersection(
        &self,
        entry: &NormalizedGeodeticPoint,
        along: &NormalizedGeodeticPoint,
        i: usize,
        j: usize,
    ) -> Option<NormalizedGeodeticPoint> {
        if i + 1 >= self.latitude_rows || j + 1 >= self.longitude_columns {
            return None;
        }
        let reference = self.center_longitude();

        let (u0, v0) = {
            let (di, dj) = self.grid_coordinates(entry.latitude(), entry.longitude());
            (di - i as f64, dj - j as f64)
        };
        let (u1, v1) = {
            let (di, dj) = self.grid_coordinates(along.latitude(), along.longitude());
            (di - i as f64, dj - j as f64)
        };
        let du = u1 - u0;
        let dv = v1 - v0;
        let h_entry = entry.altitude();
        let dh = along.altitude() - h_entry;

        let h00 = self.elevations[i * self.longitude_columns + j];
        let h01 = self.elevations[i * self.longitude_columns + j + 1];
        let h10 = self.elevations[(i + 1) * self.longitude_columns + j];
        let h11 = self.elevations[(i + 1) * self.longitude_columns + j + 1];
        let c_u = h10 - h00;
        let c_v = h01 - h00;
        let c_uv = h00 - h10 - h01 + h11;

        // f(s) = ray altitude - surface altitude along the linearized path
        let a2 = -c_uv * du * dv;
        let b1 = dh - c_u * du - c_v * dv - c_uv * (u0 * dv + v0 * du);
        let c0 = h_entry - (h00 + c_u * u0 + c_v * v0 + c_uv * u0 * v0);

        let mut roots = Vec::with_capacity(2);
        if a2 == 0.0 {
            if b1 != 0.0 {
                roots.push(-c0 / b1);
            } else if c0.abs() < 1e-9 {
                // degenerate: the path runs along the surface
                roots.push(0.0);
            }
        } else {
            let discriminant = b1 * b1 - 4.0 * a2 * c0;
            if discriminant < 0.0 {
                return None;
            }
            // numerically stable quadratic roots
            let q = -0.5 * (b1 + libm::sqrt(discriminant).copysign(b1));
            let r1 = q / a2;
            let r2 = if q != 0.0 { c0 / q } else { r1 };
            roots.push(r1.min(r2));
            roots.push(r1.max(r2));
        }

        const S_TOL: f64 = 1.0e-9;
        const UV_TOL: f64 = 1.0e-7;
        for s in roots {
            if s < -S_TOL {
                continue;
            }
            let u = u0 + s * du;
            let v = v0 + s * dv;
            if (-UV_TOL..=1.0 + UV_TOL).contains(&u) && (-UV_TOL..=1.0 + UV_TOL).contains(&v) {
                let latitude = self.latitude_at_index(i) + u * self.latitude_step;
                let longitude = self.longitude_at_index(j) + v * self.longitude_step;
                let altitude = h00 + c_u * u + c_v * v + c_uv * u * v;
                return Some(NormalizedGeodeticPoint::new(
                    latitude, longitude, altitude, reference,
                ));
            }
        }
        None
    }

    fn check_indices(&self, i: usize, j: usize) -> RasterResult<()> {
        if self.latitude_rows == 0 || i >= self.latitude_rows || j >= self.longitude_columns {
            return Err(RasterError::out_of_tile_indices(
                i,
                j,
                self.latitude_rows.saturating_sub(1),
                self.longitude_columns.saturating_sub(1),
            ));
        }
        Ok(())
    }

    fn out_of_tile_angles(&self, latitude: f64, longitude: f64) -> RasterError {
        RasterError::OutOfTileAngles {
            latitude,
            longitude,
            min_latitude: self.min_latitude,
            max_latitude: self.max_latitude(),
            min_longitude: self.min_longitude,
            max_longitude: self.max_longitude(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pushloc_core::constants::PI;

    /// 4 x 4 samples, 0.1 rad steps, elevation = 100 i + 10 j.
    fn ramp_tile() -> Tile {
        let mut tile = Tile::new();
        tile.set_geometry(0.0, 0.0, 0.1, 0.1, 4, 4).unwrap();
        for i in 0..4 {
            for j in 0..4 {
                tile.set_elevation(i, j, 100.0 * i as f64 + 10.0 * j as f64)
                    .unwrap();
            }
        }
        tile.tile_update_completed().unwrap();
        tile
    }

    #[test]
    fn test_geometry_validation() {
        let mut tile = Tile::new();
        assert_eq!(
            tile.set_geometry(0.0, 0.0, 0.1, 0.1, 1, 4),
            Err(RasterError::EmptyTile)
        );
        assert_eq!(
            tile.set_geometry(0.0, 0.0, -0.1, 0.1, 4, 4),
            Err(RasterError::EmptyTile)
        );
        assert_eq!(tile.tile_update_completed(), Err(RasterError::NoDemData));
    }

    #[test]
    fn test_elevation_access_and_bounds() {
        let tile = ramp_tile();
        assert_eq!(tile.elevation_at_indices(2, 3).unwrap(), 230.0);
        let err = tile.elevation_at_indices(4, 0).unwrap_err();
        assert_eq!(
            err,
            RasterError::out_of_tile_indices(4, 0, 3, 3)
        );
        assert_eq!(tile.min_elevation(), 0.0);
        assert_eq!(tile.max_elevation(), 330.0);
    }

    #[test]
    fn test_location_classification() {
        let tile = ramp_tile();
        assert_eq!(
            tile.location(0.15, 0.15),
            TileLocation::HasInterpolationNeighbors
        );
        assert_eq!(tile.location(0.3, 0.15), TileLocation::HasRawData);
        assert_eq!(tile.location(0.15, 0.3), TileLocation::HasRawData);
        assert_eq!(tile.location(0.31, 0.15), TileLocation::OutOfTile);
        assert_eq!(tile.location(-0.01, 0.15), TileLocation::OutOfTile);
    }

    #[test]
    fn test_interpolation_matches_bilinear() {
        let tile = ramp_tile();
        // the ramp is linear, so bilinear interpolation is exact
        let h = tile.interpolate_elevation(0.15, 0.25).unwrap();
        assert!((h - (1.5 * 100.0 + 2.5 * 10.0)).abs() < 1e-9);

        let err = tile.interpolate_elevation(0.5, 0.0).unwrap_err();
        assert!(matches!(err, RasterError::OutOfTileAngles { .. }));
    }

    #[test]
    fn test_antimeridian_tile_location() {
        let mut tile = Tile::new();
        // 4 columns straddling the antimeridian, centered on π
        tile.set_geometry(0.0, PI - 0.15, 0.1, 0.1, 4, 4).unwrap();
        for i in 0..4 {
            for j in 0..4 {
                tile.set_elevation(i, j, 0.0).unwrap();
            }
        }
        tile.tile_update_completed().unwrap();

        // a point just east of the antimeridian, given with negative longitude
        assert_eq!(
            tile.location(0.15, -PI + 0.05),
            TileLocation::HasInterpolationNeighbors
        );
        let h = tile.interpolate_elevation(0.15, -PI + 0.05).unwrap();
        assert_eq!(h, 0.0);
    }

    #[test]
    fn test_cell_intersection_flat_cell() {
        let mut tile = Tile::new();
        tile.set_geometry(0.0, 0.0, 0.1, 0.1, 2, 2).unwrap();
        for i in 0..2 {
            for j in 0..2 {
                tile.set_elevation(i, j, 50.0).unwrap();
            }
        }
        tile.tile_update_completed().unwrap();

        // descending path through the cell
        let entry = NormalizedGeodeticPoint::new(0.02, 0.02, 100.0, 0.0);
        let along = NormalizedGeodeticPoint::new(0.06, 0.06, 0.0, 0.0);
        let hit = tile.cell_intersection(&entry, &along, 0, 0).unwrap();
        assert!((hit.altitude() - 50.0).abs() < 1e-9);
        assert!((hit.latitude() - 0.04).abs() < 1e-12);
        assert!((hit.longitude() - 0.04).abs() < 1e-12);
    }

    #[test]
    fn test_cell_intersection_miss_above() {
        let mut tile = Tile::new();
        tile.set_geometry(0.0, 0.0, 0.1, 0.1, 2, 2).unwrap();
        for i in 0..2 {
            for j in 0..2 {
                tile.set_elevation(i, j, 50.0).unwrap();
            }
        }
        tile.tile_update_completed().unwrap();

        // level path above the surface
        let entry = NormalizedGeodeticPoint::new(0.02, 0.02, 100.0, 0.0);
        let along = NormalizedGeodeticPoint::new(0.06, 0.06, 100.0, 0.0);
        assert!(tile.cell_intersection(&entry, &along, 0, 0).is_none());
    }

    #[test]
    fn test_cell_intersection_sloped_cell() {
        let mut tile = Tile::new();
        tile.set_geometry(0.0, 0.0, 0.1, 0.1, 2, 2).unwrap();
        tile.set_elevation(0, 0, 0.0).unwrap();
        tile.set_elevation(0, 1, 0.0).unwrap();
        tile.set_elevation(1, 0, 100.0).unwrap();
        tile.set_elevation(1, 1, 100.0).unwrap();
        tile.tile_update_completed().unwrap();

        // northward level path at 50 m: the slope rises through it at u = 0.5
        let entry = NormalizedGeodeticPoint::new(0.0, 0.05, 50.0, 0.0);
        let along = NormalizedGeodeticPoint::new(0.1, 0.05, 50.0, 0.0);
        let hit = tile.cell_intersection(&entry, &along, 0, 0).unwrap();
        assert!((hit.latitude() - 0.05).abs() < 1e-12);
        assert!((hit.altitude() - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_cell_intersection_behind_entry_rejected() {
        let mut tile = Tile::new();
        tile.set_geometry(0.0, 0.0, 0.1, 0.1, 2, 2).unwrap();
        for i in 0..2 {
            for j in 0..2 {
                tile.set_elevation(i, j, 50.0).unwrap();
            }
        }
        tile.tile_update_completed().unwrap();

        // ascending path starting below the surface: crossing is behind
        let entry = NormalizedGeodeticPoint::new(0.02, 0.02, 40.0, 0.0);
        let along = NormalizedGeodeticPoint::new(0.01, 0.01, 30.0, 0.0);
        assert!(tile.cell_intersection(&entry, &along, 0, 0).is_none());
    }

    #[test]
    fn test_floor_cell_clamping() {
        let tile = ramp_tile();
        // on the very max boundary: clamped into the last cell
        assert_eq!(tile.floor_cell(0.3, 0.3), Some((2, 2)));
        assert_eq!(tile.floor_cell(0.0, 0.0), Some((0, 0)));
        assert_eq!(tile.floor_cell(0.5, 0.0), None);
    }
}
