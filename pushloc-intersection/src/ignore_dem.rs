//! Ellipsoid-only intersection, ignoring any DEM.

use crate::algorithm::IntersectionAlgorithm;
use crate::errors::IntersectionResult;
use pushloc_core::{Ellipsoid, NormalizedGeodeticPoint, Vector3};

/// Treats the body as bare ellipsoid: every ray lands at altitude zero.
#[derive(Debug, Clone, Copy, Default)]
pub struct IgnoreDemAlgorithm;

impl IgnoreDemAlgorithm {
    pub fn new() -> Self {
        Self
    }
}

impl IntersectionAlgorithm for IgnoreDemAlgorithm {
    fn intersection(
        &mut self,
        ellipsoid: &Ellipsoid,
        position: &Vector3,
        los: &Vector3,
    ) -> IntersectionResult<NormalizedGeodeticPoint> {
        let gp = ellipsoid.point_on_ground(position, los, 0.0, 0.0)?;
        // normalize against its own longitude so downstream consumers
        // see a plain (-π, π] value
        Ok(gp)
    }

    fn refine_intersection(
        &mut self,
        ellipsoid: &Ellipsoid,
        position: &Vector3,
        los: &Vector3,
        _close_guess: &NormalizedGeodeticPoint,
    ) -> IntersectionResult<NormalizedGeodeticPoint> {
        self.intersection(ellipsoid, position, los)
    }
}
