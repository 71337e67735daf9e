//! Top-level error type of the localization facade.
//!
//! Lower-layer errors flow upward and are flattened here, so callers
//! match on one enum: geometric misses, raster failures, temporal and
//! configuration problems, and the inverse-localization specific cases.
//!
//! Propagation policy: in *direct* localization geometric misses
//! surface as errors (the caller asked for that specific pixel); in
//! *inverse* localization a ground point simply not visible in the line
//! range is absorbed into `Ok(None)`, never an error.

use pushloc_core::{Epoch, GeomError};
use pushloc_intersection::IntersectionError;
use pushloc_raster::RasterError;
use thiserror::Error;

/// Errors raised by the localization facade.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LocError {
    /// Geometric failure from the ellipsoid layer.
    #[error(transparent)]
    Geom(#[from] GeomError),

    /// DEM raster failure.
    #[error(transparent)]
    Raster(#[from] RasterError),

    /// The ray meets the DEM top shell only behind the spacecraft.
    #[error("DEM entry point is behind spacecraft")]
    DemEntryPointBehindSpacecraft,

    /// Date outside the ephemeris or attitude sample span.
    #[error("date {date} is out of time range [{min}, {max}]")]
    OutOfTimeRange { date: Epoch, min: Epoch, max: Epoch },

    /// No sensor registered under this name.
    #[error("unknown sensor {name}")]
    UnknownSensor { name: String },

    /// The builder was asked to build without a required piece.
    #[error("context has not been initialized: no {missing}")]
    UninitializedContext { missing: String },

    /// Inverse localization refined to a pixel outside the sensor line.
    #[error(
        "ground point would be seen by pixel {expected:.3}, outside of column range [{min}, {max}]"
    )]
    GroundPointOutOfColumnRange { expected: f64, min: i64, max: i64 },

    /// A root solver exhausted its evaluation budget.
    #[error("maximum number of solver evaluations ({max}) exceeded")]
    TooManyEvaluations { max: usize },

    /// Atmospheric refraction invoked below the lowest modeled layer.
    #[error("no atmospheric layer data at altitude {altitude} m (lowest layer: {lowest} m)")]
    NoLayerData { altitude: f64, lowest: f64 },

    /// Invariant violation; always a bug.
    #[error("internal error in {context}, please report")]
    Internal { context: String },
}

/// Convenience alias for `Result<T, LocError>`.
pub type LocResult<T> = Result<T, LocError>;

impl LocError {
    /// Creates an [`UnknownSensor`](Self::UnknownSensor) error.
    pub fn unknown_sensor(name: &str) -> Self {
        Self::UnknownSensor {
            name: name.to_string(),
        }
    }

    /// Creates an [`UninitializedContext`](Self::UninitializedContext) error.
    pub fn uninitialized(missing: &str) -> Self {
        Self::UninitializedContext {
            missing: missing.to_string(),
        }
    }

    /// Creates an [`Internal`](Self::Internal) error.
    pub fn internal(context: &str) -> Self {
        Self::Internal {
            context: context.to_string(),
        }
    }
}

impl From<IntersectionError> for LocError {
    fn from(err: IntersectionError) -> Self {
        match err {
            IntersectionError::Geom(e) => Self::Geom(e),
            IntersectionError::Raster(e) => Self::Raster(e),
            IntersectionError::DemEntryPointBehindSpacecraft => {
                Self::DemEntryPointBehindSpacecraft
            }
            IntersectionError::Internal { context } => Self::Internal { context },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intersection_errors_flatten() {
        let err: LocError = IntersectionError::Geom(GeomError::LineOfSightDoesNotReachGround).into();
        assert_eq!(err, LocError::Geom(GeomError::LineOfSightDoesNotReachGround));

        let err: LocError = IntersectionError::DemEntryPointBehindSpacecraft.into();
        assert_eq!(err, LocError::DemEntryPointBehindSpacecraft);
    }

    #[test]
    fn test_out_of_time_range_message() {
        let err = LocError::OutOfTimeRange {
            date: Epoch::from_seconds_since_j2000(100.0),
            min: Epoch::j2000(),
            max: Epoch::from_seconds_since_j2000(50.0),
        };
        let text = err.to_string();
        assert!(text.contains("out of time range"), "got: {}", text);
    }
}
