//! Intersection with a constant-altitude surface.
//!
//! Stands in for the DEM when the target altitude is already known, as
//! in the quadrilateral stage of inverse localization where the four
//! corners are localized at the ground point's altitude.

use crate::algorithm::IntersectionAlgorithm;
use crate::errors::IntersectionResult;
use pushloc_core::{Ellipsoid, NormalizedGeodeticPoint, Vector3};

/// Replaces the DEM with the surface at a fixed geodetic altitude.
#[derive(Debug, Clone, Copy)]
pub struct ConstantElevationAlgorithm {
    altitude: f64,
}

impl ConstantElevationAlgorithm {
    /// Creates the algorithm for the given altitude (metres).
    pub fn new(altitude: f64) -> Self {
        Self { altitude }
    }

    pub fn altitude(&self) -> f64 {
        self.altitude
    }
}

impl IntersectionAlgorithm for ConstantElevationAlgorithm {
    fn intersection(
        &mut self,
        ellipsoid: &Ellipsoid,
        position: &Vector3,
        los: &Vector3,
    ) -> IntersectionResult<NormalizedGeodeticPoint> {
        let point = ellipsoid.point_at_altitude(position, los, self.altitude)?;
        let gp = ellipsoid.to_geodetic(&point);
        Ok(NormalizedGeodeticPoint::new(
            gp.latitude,
            gp.longitude,
            self.altitude,
            gp.longitude,
        ))
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lands_at_requested_altitude() {
        let ellipsoid = Ellipsoid::new(6_378_137.0, 1.0 / 298.257_223_563);
        let mut algorithm = ConstantElevationAlgorithm::new(1234.5);
        let position = Vector3::new(ellipsoid.equatorial_radius() + 700_000.0, 2.0e5, 1.0e5);
        let los = Vector3::new(-1.0, -0.02, -0.01).normalize();
        let gp = algorithm.intersection(&ellipsoid, &position, &los).unwrap();
        assert_eq!(gp.altitude(), 1234.5);

        // the point is really on the ray at that altitude
        let cart = ellipsoid.to_cartesian(&gp.to_geodetic());
        let off_ray = (cart - position).cross(&los).magnitude() / los.magnitude();
        assert!(off_ray < 1e-4, "point {} m off the ray", off_ray);
    }

    #[test]
    fn test_missing_shell() {
        let ellipsoid = Ellipsoid::new(6_378_137.0, 1.0 / 298.257_223_563);
        let mut algorithm = ConstantElevationAlgorithm::new(0.0);
        let position = Vector3::new(ellipsoid.equatorial_radius() + 700_000.0, 0.0, 0.0);
        let los = Vector3::new(0.0, 1.0, 0.0);
        assert!(algorithm.intersection(&ellipsoid, &position, &los).is_err());
    }
}
