//! Geodetic points, plain and longitude-normalized.
//!
//! Latitude and longitude are in radians, altitude in metres above the
//! reference ellipsoid. Two flavors exist:
//!
//! - [`GeodeticPoint`] is the plain value handed to and returned by the
//!   public API, with longitude in `(-π, π]`.
//! - [`NormalizedGeodeticPoint`] additionally carries the longitude
//!   reference it was unwrapped against, so that a ray walked across the
//!   antimeridian keeps a continuous longitude instead of jumping by 2π.
//!   All DEM traversal code works with this flavor.

use crate::Vector3;
use std::fmt;

/// Wraps `longitude` into `[center - π, center + π)`.
///
/// This is the unwrapping primitive behind [`NormalizedGeodeticPoint`]:
/// two points a few metres apart on either side of the antimeridian get
/// longitudes a few micro-radians apart when normalized against the same
/// center, instead of ±π.
pub fn normalize_longitude(longitude: f64, center: f64) -> f64 {
    use crate::constants::{PI, TWO_PI};
    let delta = libm::fmod(longitude - center + PI, TWO_PI);
    let delta = if delta < 0.0 { delta + TWO_PI } else { delta };
    center + delta - PI
}

/// A point given by geodetic latitude, longitude and altitude.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GeodeticPoint {
    /// Geodetic latitude, radians in `[-π/2, π/2]`.
    pub latitude: f64,
    /// Longitude, radians.
    pub longitude: f64,
    /// Altitude above the ellipsoid, metres.
    pub altitude: f64,
}

impl GeodeticPoint {
    /// Creates a new geodetic point.
    #[inline]
    pub fn new(latitude: f64, longitude: f64, altitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            altitude,
        }
    }

    /// Unit vector pointing away from the ellipsoid center along the
    /// local ellipsoid normal, in body Cartesian axes.
    pub fn zenith(&self) -> Vector3 {
        let (sin_lat, cos_lat) = libm::sincos(self.latitude);
        let (sin_lon, cos_lon) = libm::sincos(self.longitude);
        Vector3::new(cos_lat * cos_lon, cos_lat * sin_lon, sin_lat)
    }

    /// Unit vector opposite to [`zenith`](Self::zenith).
    pub fn nadir(&self) -> Vector3 {
        -self.zenith()
    }
}

impl fmt::Display for GeodeticPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "(lat: {:.6}\u{b0}, lon: {:.6}\u{b0}, alt: {:.3} m)",
            self.latitude.to_degrees(),
            self.longitude.to_degrees(),
            self.altitude
        )
    }
}

/// A geodetic point whose longitude has been unwrapped against a
/// reference, for continuity across the antimeridian.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NormalizedGeodeticPoint {
    latitude: f64,
    longitude: f64,
    altitude: f64,
    longitude_reference: f64,
}

impl NormalizedGeodeticPoint {
    /// Creates a point with `longitude` unwrapped into
    /// `[reference - π, reference + π)`.
    pub fn new(latitude: f64, longitude: f64, altitude: f64, reference: f64) -> Self {
        Self {
            latitude,
            longitude: normalize_longitude(longitude, reference),
            altitude,
            longitude_reference: reference,
        }
    }

    #[inline]
    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    /// Unwrapped longitude; may lie outside `(-π, π]`.
    #[inline]
    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    #[inline]
    pub fn altitude(&self) -> f64 {
        self.altitude
    }

    /// The reference the longitude was unwrapped against.
    #[inline]
    pub fn longitude_reference(&self) -> f64 {
        self.longitude_reference
    }

    /// Same point with the altitude replaced.
    pub fn with_altitude(&self, altitude: f64) -> Self {
        Self { altitude, ..*self }
    }

    /// Local zenith unit vector in body Cartesian axes.
    pub fn zenith(&self) -> Vector3 {
        self.to_geodetic().zenith()
    }

    /// Converts back to a plain geodetic point (longitude kept as-is).
    pub fn to_geodetic(&self) -> GeodeticPoint {
        GeodeticPoint::new(self.latitude, self.longitude, self.altitude)
    }
}

impl fmt::Display for NormalizedGeodeticPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.to_geodetic().fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::PI;

    #[test]
    fn test_normalize_longitude_plain() {
        assert!((normalize_longitude(0.1, 0.0) - 0.1).abs() < 1e-15);
        assert!((normalize_longitude(0.1 + 2.0 * PI, 0.0) - 0.1).abs() < 1e-12);
        assert!((normalize_longitude(0.1 - 4.0 * PI, 0.0) - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_normalize_longitude_antimeridian() {
        // a point just west of the antimeridian, unwrapped against +π
        let lon = normalize_longitude(-PI + 1e-6, PI);
        assert!(
            (lon - (PI + 1e-6)).abs() < 1e-12,
            "no 2π jump expected, got {}",
            lon
        );
    }

    #[test]
    fn test_normalized_point_keeps_reference() {
        let p = NormalizedGeodeticPoint::new(0.2, -PI + 1e-6, 100.0, PI);
        assert!(p.longitude() > PI);
        assert_eq!(p.longitude_reference(), PI);
        assert_eq!(p.altitude(), 100.0);
        assert_eq!(p.with_altitude(0.0).altitude(), 0.0);
    }

    #[test]
    fn test_zenith_at_equator_and_pole() {
        let equator = GeodeticPoint::new(0.0, 0.0, 0.0);
        assert!(equator.zenith().distance(&Vector3::x_axis()) < 1e-15);

        let pole = GeodeticPoint::new(PI / 2.0, 0.0, 0.0);
        assert!(pole.zenith().distance(&Vector3::z_axis()) < 1e-15);

        assert!(equator.nadir().distance(&-Vector3::x_axis()) < 1e-15);
    }
}
