//! Geometric error type for the math and geodesy layer.
//!
//! Rays fired from a spacecraft do not always meet the surface they are
//! asked to meet: a line of sight can pass above the ellipsoid, never
//! reach a prescribed parallel or meridian, or stay clear of an altitude
//! shell. Those outcomes are reported through [`GeomError`] so callers can
//! distinguish "the geometry says no" from programming errors, which use
//! the [`Internal`](GeomError::Internal) variant.

use thiserror::Error;

/// Errors raised by ellipsoid and ray geometry operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeomError {
    /// The line of sight does not intersect the ground surface.
    #[error("line of sight does not reach ground")]
    LineOfSightDoesNotReachGround,

    /// The line of sight never crosses the requested parallel.
    #[error("line of sight never crosses latitude {}\u{b0}", latitude.to_degrees())]
    LineOfSightNeverCrossesLatitude { latitude: f64 },

    /// The line of sight never crosses the requested meridian.
    #[error("line of sight never crosses longitude {}\u{b0}", longitude.to_degrees())]
    LineOfSightNeverCrossesLongitude { longitude: f64 },

    /// The line of sight never crosses the requested altitude shell.
    #[error("line of sight never crosses altitude {altitude} m")]
    LineOfSightNeverCrossesAltitude { altitude: f64 },

    /// Invariant violation; always a bug.
    #[error("internal error in {context}, please report")]
    Internal { context: String },
}

/// Convenience alias for `Result<T, GeomError>`.
pub type GeomResult<T> = Result<T, GeomError>;

impl GeomError {
    /// Creates a [`LineOfSightNeverCrossesLatitude`](Self::LineOfSightNeverCrossesLatitude) error.
    pub fn never_crosses_latitude(latitude: f64) -> Self {
        Self::LineOfSightNeverCrossesLatitude { latitude }
    }

    /// Creates a [`LineOfSightNeverCrossesLongitude`](Self::LineOfSightNeverCrossesLongitude) error.
    pub fn never_crosses_longitude(longitude: f64) -> Self {
        Self::LineOfSightNeverCrossesLongitude { longitude }
    }

    /// Creates a [`LineOfSightNeverCrossesAltitude`](Self::LineOfSightNeverCrossesAltitude) error.
    pub fn never_crosses_altitude(altitude: f64) -> Self {
        Self::LineOfSightNeverCrossesAltitude { altitude }
    }

    /// Creates an [`Internal`](Self::Internal) error.
    pub fn internal(context: &str) -> Self {
        Self::Internal {
            context: context.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latitude_message_in_degrees() {
        let err = GeomError::never_crosses_latitude(std::f64::consts::FRAC_PI_2);
        assert!(err.to_string().contains("90"), "got: {}", err);
    }

    #[test]
    fn test_send_sync() {
        fn _assert_send<T: Send>() {}
        fn _assert_sync<T: Sync>() {}
        _assert_send::<GeomError>();
        _assert_sync::<GeomError>();
    }
}
