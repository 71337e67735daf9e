//! Multi-layer atmospheric refraction.
//!
//! Optional collaborator of the localization pipeline: given the
//! uncorrected intersection geometry, it re-traces the line of sight
//! through a stack of constant-index atmospheric shells, bending it at
//! each shell crossing with Snell's law, and intersects the supplied
//! DEM tile with the bent ray.

use crate::errors::{LocError, LocResult};
use pushloc_core::{Ellipsoid, NormalizedGeodeticPoint, Vector3};
use pushloc_raster::Tile;

/// Corrects a ground intersection for atmospheric refraction.
pub trait AtmosphericRefraction {
    /// Ground point seen along `initial_los` from `initial_pos` (body
    /// frame), bending through the atmosphere, down to the DEM surface
    /// of `tile` around the uncorrected ground altitude `altitude`.
    /// Returns `None` when the bent ray no longer meets the tile cell.
    fn point_on_ground(
        &self,
        initial_pos: &Vector3,
        initial_los: &Vector3,
        initial_zenith: &Vector3,
        altitude: f64,
        tile: &Tile,
    ) -> LocResult<Option<NormalizedGeodeticPoint>>;
}

/// Mean atmospheric refraction indices by layer lower bound (metres),
/// descending.
const MEAN_ATMOSPHERIC_REFRACTIONS: [(f64, f64); 15] = [
    (100_000.0, 1.000_000_00),
    (50_000.0, 1.000_000_00),
    (40_000.0, 1.000_001_00),
    (30_000.0, 1.000_004_00),
    (23_000.0, 1.000_012_00),
    (18_000.0, 1.000_028_00),
    (14_000.0, 1.000_052_00),
    (11_000.0, 1.000_083_00),
    (9_000.0, 1.000_106_00),
    (7_000.0, 1.000_134_00),
    (5_000.0, 1.000_167_00),
    (3_000.0, 1.000_206_00),
    (1_000.0, 1.000_252_00),
    (0.0, 1.000_278_00),
    (-1_000.0, 1.000_306_00),
];

/// Piecewise-constant refraction model over fixed altitude shells.
pub struct MultiLayerModel {
    ellipsoid: Ellipsoid,
    /// (lower bound, index) pairs, descending by altitude.
    layers: Vec<(f64, f64)>,
}

impl MultiLayerModel {
    /// Creates the model with the standard mean atmosphere table.
    pub fn new(ellipsoid: Ellipsoid) -> Self {
        Self {
            ellipsoid,
            layers: MEAN_ATMOSPHERIC_REFRACTIONS.to_vec(),
        }
    }

    /// Creates the model with a custom layer table; entries are sorted
    /// into descending altitude order.
    pub fn with_layers(ellipsoid: Ellipsoid, mut layers: Vec<(f64, f64)>) -> Self {
        layers.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        Self { ellipsoid, layers }
    }
}

impl AtmosphericRefraction for MultiLayerModel {
    fn point_on_ground(
        &self,
        initial_pos: &Vector3,
        initial_los: &Vector3,
        initial_zenith: &Vector3,
        altitude: f64,
        tile: &Tile,
    ) -> LocResult<Option<NormalizedGeodeticPoint>> {
        let lowest = match self.layers.last() {
            Some((bound, _)) => *bound,
            None => {
                return Err(LocError::NoLayerData {
                    altitude,
                    lowest: f64::NAN,
                })
            }
        };
        let start_altitude = self.ellipsoid.to_geodetic(initial_pos).altitude;
        if start_altitude < lowest {
            return Err(LocError::NoLayerData {
                altitude: start_altitude,
                lowest,
            });
        }

        let mut pos = *initial_pos;
        let mut los = initial_los.normalize();
        let mut zenith = *initial_zenith;
        // incidence measured from the downward normal: acute for a
        // descending ray
        let mut theta1 = los.angle(&-zenith);
        // no bending at the first crossed shell: there is no upper
        // medium above it
        let mut previous_index: Option<f64> = None;
        let mut entry: Option<NormalizedGeodeticPoint> = None;

        for &(bound, index) in &self.layers {
            // layers above the start position play no role
            if self.ellipsoid.to_geodetic(&pos).altitude < bound {
                continue;
            }
            // stop at the last shell still above the ground altitude;
            // the DEM intersection starts from its crossing
            if bound <= altitude {
                break;
            }

            let sin_theta1 = libm::sin(theta1);
            if let Some(previous) = previous_index {
                // Snell across the shell boundary; a vertical ray is
                // not bent
                if sin_theta1 > 1e-12 {
                    let theta2 = libm::asin(previous * sin_theta1 / index);
                    let sin_ratio = libm::sin(theta2) / sin_theta1;
                    let b = sin_ratio * libm::cos(theta1) - libm::cos(theta2);
                    los = Vector3::linear_combination(sin_ratio, &los, b, &zenith).normalize();
                    theta1 = theta2;
                }
            }

            let gp = self
                .ellipsoid
                .point_on_ground(&pos, &los, bound, tile.center_longitude())?;
            pos = self.ellipsoid.to_cartesian(&gp.to_geodetic());
            zenith = gp.zenith();
            entry = Some(gp);
            previous_index = Some(index);
        }

        let entry = match entry {
            Some(gp) => gp,
            // target altitude above every layer: no bending applies
            None => self
                .ellipsoid
                .to_normalized_geodetic(initial_pos, tile.center_longitude()),
        };

        let Some((i, j)) = tile.floor_cell(entry.latitude(), entry.longitude()) else {
            return Ok(None);
        };
        let along_cart = self.ellipsoid.to_cartesian(&entry.to_geodetic()) + los * 100.0;
        let along = self
            .ellipsoid
            .to_normalized_geodetic(&along_cart, tile.center_longitude());
        Ok(tile.cell_intersection(&entry, &along, i, j))
    }
}
