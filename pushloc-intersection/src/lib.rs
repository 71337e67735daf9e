//! Ray/DEM intersection algorithms.
//!
//! All variants implement [`IntersectionAlgorithm`], the two-operation
//! capability the localization pipeline needs: find the first DEM
//! crossing of a body-frame ray, and refine a crossing from a close
//! guess. The production algorithm is [`DuvenhageAlgorithm`]
//! (hierarchical min/max tile traversal, per B. Duvenhage's terrain
//! ray-tracing scheme); [`BasicScanAlgorithm`] is its brute-force
//! validation twin; [`IgnoreDemAlgorithm`] and
//! [`ConstantElevationAlgorithm`] degenerate to ellipsoid shells.

mod algorithm;
mod basic_scan;
mod duvenhage;
mod errors;
mod fixed_altitude;
mod ignore_dem;
mod walk;

pub use algorithm::IntersectionAlgorithm;
pub use basic_scan::BasicScanAlgorithm;
pub use duvenhage::DuvenhageAlgorithm;
pub use errors::{IntersectionError, IntersectionResult};
pub use fixed_altitude::ConstantElevationAlgorithm;
pub use ignore_dem::IgnoreDemAlgorithm;
