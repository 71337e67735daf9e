//! The capability shared by all intersection algorithm variants.

use crate::errors::IntersectionResult;
use pushloc_core::{Ellipsoid, NormalizedGeodeticPoint, Vector3};

/// Ray/DEM intersection, in two stages.
///
/// `position` and `los` are in the body frame; `los` is a unit vector.
/// Results are geodetic points on the DEM surface, longitude-normalized
/// for continuity along the ray path.
///
/// Methods take `&mut self` because DEM-backed implementations own a
/// tile cache that reorders and loads on lookup; the engine is
/// single-threaded by contract.
pub trait IntersectionAlgorithm {
    /// Finds the first DEM crossing of the ray.
    fn intersection(
        &mut self,
        ellipsoid: &Ellipsoid,
        position: &Vector3,
        los: &Vector3,
    ) -> IntersectionResult<NormalizedGeodeticPoint>;

    /// Recomputes an intersection exactly, starting from a close guess.
    ///
    /// Used as the second stage of light-time corrected localization,
    /// where the first stage ran with slightly shifted transforms.
    fn refine_intersection(
        &mut self,
        ellipsoid: &Ellipsoid,
        position: &Vector3,
        los: &Vector3,
        close_guess: &NormalizedGeodeticPoint,
    ) -> IntersectionResult<NormalizedGeodeticPoint>;
}
