//! Intersection layer error type.

use pushloc_core::GeomError;
use pushloc_raster::RasterError;
use thiserror::Error;

/// Errors raised by the ray/DEM intersection algorithms.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum IntersectionError {
    /// The ray meets the DEM top shell only behind the spacecraft.
    #[error("DEM entry point is behind spacecraft")]
    DemEntryPointBehindSpacecraft,

    /// Underlying geometry failure (ray misses a surface).
    #[error(transparent)]
    Geom(#[from] GeomError),

    /// Underlying raster failure (tile or cache).
    #[error(transparent)]
    Raster(#[from] RasterError),

    /// Invariant violation; always a bug.
    #[error("internal error in {context}, please report")]
    Internal { context: String },
}

/// Convenience alias for `Result<T, IntersectionError>`.
pub type IntersectionResult<T> = Result<T, IntersectionError>;

impl IntersectionError {
    /// Creates an [`Internal`](Self::Internal) error.
    pub fn internal(context: &str) -> Self {
        Self::Internal {
            context: context.to_string(),
        }
    }
}
