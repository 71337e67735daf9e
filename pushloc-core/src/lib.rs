//! Math and geodesy foundation for the pushloc geolocation workspace.
//!
//! This crate holds everything the DEM raster layer and the localization
//! pipeline agree on: Cartesian vectors and rotations, quaternions,
//! geodetic points (plain and longitude-normalized), absolute dates, the
//! reference ellipsoid with its ray intersection operations, kinematic
//! frame transforms, and the small numerical toolbox (Lagrange
//! interpolation, bracketing Brent solver).
//!
//! Everything here is pure: no I/O, no hidden state, no interior
//! mutability. Errors are geometric facts ("this ray never reaches that
//! parallel"), reported through [`GeomError`].

pub mod constants;
pub mod math;

mod ellipsoid;
mod epoch;
mod errors;
mod geodetic;
mod matrix;
mod quaternion;
mod solver;
mod transform;

pub use ellipsoid::Ellipsoid;
pub use epoch::Epoch;
pub use errors::{GeomError, GeomResult};
pub use geodetic::{normalize_longitude, GeodeticPoint, NormalizedGeodeticPoint};
pub use matrix::{RotationMatrix3, Vector3};
pub use quaternion::Quaternion;
pub use solver::{BracketingBrentSolver, SolverError};
pub use transform::Transform;
