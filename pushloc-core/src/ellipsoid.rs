//! Reference ellipsoid with the ray intersections needed by DEM traversal.
//!
//! Besides the classical geodetic ↔ Cartesian conversions, this type
//! answers the questions the tile-walking code keeps asking about a body
//! frame ray `(p, los)`:
//!
//! - where does it meet the ground, or a shell at some altitude
//!   ([`point_on_ground`](Ellipsoid::point_on_ground),
//!   [`point_at_altitude`](Ellipsoid::point_at_altitude))?
//! - where does it cross a given parallel or meridian
//!   ([`point_at_latitude`](Ellipsoid::point_at_latitude),
//!   [`point_at_longitude`](Ellipsoid::point_at_longitude))?
//!
//! The altitude-`h` shell is modeled as the ellipsoid with semi-axes
//! `(a + h, b + h)`; the surface of points at exact geodetic altitude `h`
//! is not an ellipsoid, but the two differ by well under the flattening
//! times the altitude, and [`point_at_altitude`](Ellipsoid::point_at_altitude)
//! polishes its result to the exact geodetic altitude anyway. The set of
//! points at geodetic latitude `φ` (any altitude, any longitude) is an
//! exact cone whose apex sits on the polar axis at `z = -e² N(φ) sin φ`;
//! the latitude crossings use that cone directly.

use crate::errors::{GeomError, GeomResult};
use crate::geodetic::{GeodeticPoint, NormalizedGeodeticPoint};
use crate::Vector3;

const ALTITUDE_CONVERGENCE: f64 = 1.0e-6;

/// A one-axis ellipsoid of revolution, immutable after construction.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Ellipsoid {
    equatorial_radius: f64,
    flattening: f64,
    e2: f64,
    polar_radius: f64,
}

impl Ellipsoid {
    /// Creates an ellipsoid from equatorial radius (m) and flattening.
    ///
    /// Requires `equatorial_radius > 0` and `0 <= flattening < 1`.
    pub fn new(equatorial_radius: f64, flattening: f64) -> Self {
        Self {
            equatorial_radius,
            flattening,
            e2: flattening * (2.0 - flattening),
            polar_radius: equatorial_radius * (1.0 - flattening),
        }
    }

    #[inline]
    pub fn equatorial_radius(&self) -> f64 {
        self.equatorial_radius
    }

    #[inline]
    pub fn flattening(&self) -> f64 {
        self.flattening
    }

    #[inline]
    pub fn polar_radius(&self) -> f64 {
        self.polar_radius
    }

    /// Squared first eccentricity `f(2 - f)`.
    #[inline]
    pub fn eccentricity_squared(&self) -> f64 {
        self.e2
    }

    /// Geodetic to Cartesian (ECEF in the body frame).
    pub fn to_cartesian(&self, point: &GeodeticPoint) -> Vector3 {
        let (sin_lat, cos_lat) = libm::sincos(point.latitude);
        let (sin_lon, cos_lon) = libm::sincos(point.longitude);
        let n = self.equatorial_radius / libm::sqrt(1.0 - self.e2 * sin_lat * sin_lat);
        let r = (n + point.altitude) * cos_lat;
        Vector3::new(
            r * cos_lon,
            r * sin_lon,
            (n * (1.0 - self.e2) + point.altitude) * sin_lat,
        )
    }

    /// Cartesian to geodetic, Bowring start plus fixed-point polish.
    pub fn to_geodetic(&self, point: &Vector3) -> GeodeticPoint {
        let a = self.equatorial_radius;
        let b = self.polar_radius;
        let r = libm::sqrt(point.x * point.x + point.y * point.y);
        let longitude = libm::atan2(point.y, point.x);

        if r < 1e-9 * a {
            // polar axis
            let latitude = if point.z >= 0.0 {
                crate::constants::HALF_PI
            } else {
                -crate::constants::HALF_PI
            };
            return GeodeticPoint::new(latitude, longitude, point.z.abs() - b);
        }

        let theta = libm::atan2(point.z * a, r * b);
        let (sin_theta, cos_theta) = libm::sincos(theta);
        let ep2 = self.e2 / (1.0 - self.e2);
        let mut latitude = libm::atan2(
            point.z + ep2 * b * sin_theta.powi(3),
            r - self.e2 * a * cos_theta.powi(3),
        );
        let mut altitude = 0.0;

        for _ in 0..4 {
            let (sin_lat, cos_lat) = libm::sincos(latitude);
            let n = a / libm::sqrt(1.0 - self.e2 * sin_lat * sin_lat);
            altitude = r / cos_lat - n;
            latitude = libm::atan2(point.z, r * (1.0 - self.e2 * n / (n + altitude)));
        }

        GeodeticPoint::new(latitude, longitude, altitude)
    }

    /// Cartesian to geodetic with the longitude unwrapped against
    /// `reference`.
    pub fn to_normalized_geodetic(
        &self,
        point: &Vector3,
        reference: f64,
    ) -> NormalizedGeodeticPoint {
        let gp = self.to_geodetic(point);
        NormalizedGeodeticPoint::new(gp.latitude, gp.longitude, gp.altitude, reference)
    }

    /// Ray parameters at which `(p, los)` crosses the altitude shell,
    /// entry first, or `None` when the whole line stays outside.
    ///
    /// Between the two returned parameters the ray is inside the shell.
    pub fn altitude_shell_crossings(
        &self,
        position: &Vector3,
        los: &Vector3,
        altitude: f64,
    ) -> Option<(f64, f64)> {
        let ax = self.equatorial_radius + altitude;
        let bz = self.polar_radius + altitude;

        let px = position.x / ax;
        let py = position.y / ax;
        let pz = position.z / bz;
        let lx = los.x / ax;
        let ly = los.y / ax;
        let lz = los.z / bz;

        let a2 = lx * lx + ly * ly + lz * lz;
        let b1 = px * lx + py * ly + pz * lz;
        let c0 = px * px + py * py + pz * pz - 1.0;

        let discriminant = b1 * b1 - a2 * c0;
        if discriminant < 0.0 {
            return None;
        }
        let sq = libm::sqrt(discriminant);
        Some(((-b1 - sq) / a2, (-b1 + sq) / a2))
    }

    /// Ray parameter of the point closest to the shell at `altitude`
    /// (in the scaled metric of that shell).
    pub fn closest_approach(&self, position: &Vector3, los: &Vector3, altitude: f64) -> f64 {
        let ax = self.equatorial_radius + altitude;
        let bz = self.polar_radius + altitude;
        let px = position.x / ax;
        let py = position.y / ax;
        let pz = position.z / bz;
        let lx = los.x / ax;
        let ly = los.y / ax;
        let lz = los.z / bz;
        -(px * lx + py * ly + pz * lz) / (lx * lx + ly * ly + lz * lz)
    }

    /// First geodetic intersection of the ray with the shell at
    /// `altitude` (0 for the ground), longitude unwrapped against
    /// `lon_reference`.
    ///
    /// The point behind the start position is returned when the shell
    /// lies entirely behind; callers that care check the sign of
    /// `(point - position) · los`. Fails with
    /// [`GeomError::LineOfSightDoesNotReachGround`] when the ray misses
    /// the shell altogether.
    pub fn point_on_ground(
        &self,
        position: &Vector3,
        los: &Vector3,
        altitude: f64,
        lon_reference: f64,
    ) -> GeomResult<NormalizedGeodeticPoint> {
        let (t1, t2) = self
            .altitude_shell_crossings(position, los, altitude)
            .ok_or(GeomError::LineOfSightDoesNotReachGround)?;
        let t = if t1 >= 0.0 { t1 } else { t2 };
        let point = *position + *los * t;
        Ok(self.to_normalized_geodetic(&point, lon_reference))
    }

    /// Point of the ray at exact geodetic altitude `altitude`, the first
    /// one along the ray.
    ///
    /// Seeds on the `(a + h, b + h)` shell and polishes with a Newton
    /// iteration on the true geodetic altitude.
    pub fn point_at_altitude(
        &self,
        position: &Vector3,
        los: &Vector3,
        altitude: f64,
    ) -> GeomResult<Vector3> {
        let mut t = match self.altitude_shell_crossings(position, los, altitude) {
            Some((t1, _)) if t1 >= 0.0 => t1,
            Some((_, t2)) => t2,
            // grazing geometry: start from the closest approach and let
            // the iteration decide
            None => self.closest_approach(position, los, altitude),
        };

        for _ in 0..12 {
            let point = *position + *los * t;
            let gp = self.to_geodetic(&point);
            let dh = altitude - gp.altitude;
            if dh.abs() < ALTITUDE_CONVERGENCE {
                return Ok(point);
            }
            let slope = los.dot(&gp.zenith());
            if slope.abs() < 1e-12 {
                break;
            }
            t += dh / slope;
        }

        Err(GeomError::never_crosses_altitude(altitude))
    }

    /// Ray parameters at which `(p, los)` crosses the iso-latitude cone,
    /// sorted, on the correct nappe. Empty when there is no crossing.
    pub fn latitude_crossings(
        &self,
        position: &Vector3,
        los: &Vector3,
        latitude: f64,
    ) -> Vec<f64> {
        let (sin_lat, cos_lat) = libm::sincos(latitude);
        let n = self.equatorial_radius / libm::sqrt(1.0 - self.e2 * sin_lat * sin_lat);
        let apex_z = -self.e2 * n * sin_lat;

        let s2 = sin_lat * sin_lat;
        let c2 = cos_lat * cos_lat;
        let dz = position.z - apex_z;

        let a2 = s2 * (los.x * los.x + los.y * los.y) - c2 * los.z * los.z;
        let b1 = s2 * (position.x * los.x + position.y * los.y) - c2 * dz * los.z;
        let c0 = s2 * (position.x * position.x + position.y * position.y) - c2 * dz * dz;

        let mut roots = Vec::with_capacity(2);
        let scale = los.magnitude_squared();
        if a2.abs() < 1e-12 * scale {
            if b1.abs() > 1e-12 * scale * self.equatorial_radius {
                roots.push(-c0 / (2.0 * b1));
            }
        } else {
            let discriminant = b1 * b1 - a2 * c0;
            if discriminant >= 0.0 {
                let sq = libm::sqrt(discriminant);
                roots.push((-b1 - sq) / a2);
                roots.push((-b1 + sq) / a2);
            }
        }

        // keep the nappe matching the latitude sign; at the equator the
        // cone degenerates to the plane z = 0 and both roots coincide
        let mut crossings: Vec<f64> = roots
            .into_iter()
            .filter(|&t| {
                sin_lat.abs() < 1e-12 || (position.z + t * los.z - apex_z) * sin_lat >= 0.0
            })
            .collect();
        crossings.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        crossings.dedup();
        crossings
    }

    /// Point of the ray at the given geodetic latitude, the crossing
    /// closest to `close_reference` when two exist.
    pub fn point_at_latitude(
        &self,
        position: &Vector3,
        los: &Vector3,
        latitude: f64,
        close_reference: &Vector3,
    ) -> GeomResult<Vector3> {
        let crossings = self.latitude_crossings(position, los, latitude);
        crossings
            .iter()
            .map(|&t| *position + *los * t)
            .min_by(|p1, p2| {
                let d1 = p1.distance(close_reference);
                let d2 = p2.distance(close_reference);
                d1.partial_cmp(&d2).unwrap_or(std::cmp::Ordering::Equal)
            })
            .ok_or_else(|| GeomError::never_crosses_latitude(latitude))
    }

    /// Ray parameter at which `(p, los)` crosses the meridian plane, or
    /// `None` when the ray is parallel to it.
    pub fn longitude_crossing(
        &self,
        position: &Vector3,
        los: &Vector3,
        longitude: f64,
    ) -> Option<f64> {
        let (sin_lon, cos_lon) = libm::sincos(longitude);
        let normal = Vector3::new(-sin_lon, cos_lon, 0.0);
        let slope = normal.dot(los);
        if slope.abs() < 1e-12 * los.magnitude() {
            return None;
        }
        Some(-normal.dot(position) / slope)
    }

    /// Point of the ray at the given longitude.
    pub fn point_at_longitude(
        &self,
        position: &Vector3,
        los: &Vector3,
        longitude: f64,
    ) -> GeomResult<Vector3> {
        self.longitude_crossing(position, los, longitude)
            .map(|t| *position + *los * t)
            .ok_or_else(|| GeomError::never_crosses_longitude(longitude))
    }
}
