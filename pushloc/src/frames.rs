//! Inertial-to-body frame providers.
//!
//! The localization pipeline only needs one thing from the frame world:
//! the kinematic [`Transform`] from the chosen inertial frame to the
//! body-rotating frame at a given date. That is the [`TransformProvider`]
//! trait; deployments with a full astrodynamics stack implement it on
//! their side and get exact IERS frames.
//!
//! [`EarthRotationModel`] is the embedded back-end behind the
//! [`InertialFrameId`]/[`BodyRotatingFrameId`] presets. It is
//! EOP-free: Earth Rotation Angle or apparent sidereal time around the
//! Z axis, constant GCRF/EME2000 frame bias, Lieske 1976 precession and
//! a truncated (five strongest terms) IAU-1980 nutation series. No
//! polar motion, and dates are interpreted as UT1-equivalent seconds.
//! That is arcsecond-class pointing: appropriate for self-consistent
//! localization work, not for astrometric comparisons against other
//! toolchains.

use crate::config::{BodyRotatingFrameId, InertialFrameId};
use pushloc_core::constants::{ARCSEC_TO_RAD, TWO_PI};
use pushloc_core::{Epoch, RotationMatrix3, Transform, Vector3};

/// Mean Earth rotation rate (rad/s), IERS conventions.
pub const EARTH_ANGULAR_VELOCITY: f64 = 7.292_115e-5;

/// Supplies the inertial-to-body transform at a date.
pub trait TransformProvider {
    /// Kinematic transform from the inertial frame to the
    /// body-rotating frame at `date`.
    fn transform(&self, date: Epoch) -> Transform;
}

/// Embedded EOP-free Earth orientation model.
#[derive(Debug, Clone, Copy)]
pub struct EarthRotationModel {
    inertial: InertialFrameId,
    body: BodyRotatingFrameId,
}

impl EarthRotationModel {
    /// Creates the model for a preset frame pair.
    pub fn new(inertial: InertialFrameId, body: BodyRotatingFrameId) -> Self {
        Self { inertial, body }
    }
}

impl TransformProvider for EarthRotationModel {
    fn transform(&self, date: Epoch) -> Transform {
        // chain: inertial frame -> EME2000 -> equator of date -> body
        let mut m = eme2000_from(self.inertial, date);
        match self.body {
            BodyRotatingFrameId::Itrf => {
                // CIO-based: spin by the Earth Rotation Angle around the
                // (bias-corrected) celestial pole
                m = gcrf_from_eme2000() * m;
                m.rotate_z(earth_rotation_angle(date));
            }
            BodyRotatingFrameId::ItrfEquinox | BodyRotatingFrameId::Gtod => {
                // equinox-based: precession-nutation to the true equator
                // of date, then apparent sidereal time
                let t = date.julian_centuries();
                let (dpsi, deps) = nutation_angles(t);
                m = nutation_matrix(t, dpsi, deps) * precession_matrix(t) * m;
                let gast = gmst_1982(date) + dpsi * libm::cos(mean_obliquity(t));
                m.rotate_z(gast);
            }
        }
        Transform::new(
            m,
            Vector3::new(0.0, 0.0, EARTH_ANGULAR_VELOCITY),
            Vector3::zeros(),
            Vector3::zeros(),
        )
    }
}

/// Frame matrix taking coordinates in `frame` to EME2000.
fn eme2000_from(frame: InertialFrameId, date: Epoch) -> RotationMatrix3 {
    match frame {
        InertialFrameId::Eme2000 => RotationMatrix3::identity(),
        InertialFrameId::Gcrf => gcrf_from_eme2000().transpose(),
        InertialFrameId::Mod => precession_matrix(date.julian_centuries()).transpose(),
        InertialFrameId::Tod => {
            let t = date.julian_centuries();
            let (dpsi, deps) = nutation_angles(t);
            (nutation_matrix(t, dpsi, deps) * precession_matrix(t)).transpose()
        }
        InertialFrameId::Veis1950 => {
            // mean equator and equinox of B1950; the small Veis meridian
            // offset is not modeled
            const T_B1950: f64 = -0.500_002_1;
            precession_matrix(T_B1950).transpose()
        }
    }
}

/// Constant frame bias, EME2000 to GCRF (IERS 2003 values).
fn gcrf_from_eme2000() -> RotationMatrix3 {
    const D_ALPHA0: f64 = -0.014_60 * ARCSEC_TO_RAD;
    const XI0: f64 = -0.016_617_0 * ARCSEC_TO_RAD;
    const ETA0: f64 = -0.006_819_2 * ARCSEC_TO_RAD;
    let mut m = RotationMatrix3::identity();
    m.rotate_z(D_ALPHA0);
    m.rotate_y(-XI0);
    m.rotate_x(ETA0);
    m
}

/// Earth Rotation Angle (radians), IAU 2000.
fn earth_rotation_angle(date: Epoch) -> f64 {
    let d = date.days_since_j2000();
    TWO_PI * (0.779_057_273_264_0 + 1.002_737_811_911_354_48 * d) % TWO_PI
}

/// Greenwich mean sidereal time (radians), IAU 1982 model.
fn gmst_1982(date: Epoch) -> f64 {
    let d = date.days_since_j2000();
    let t = date.julian_centuries();
    let degrees = 280.460_618_37 + 360.985_647_366_29 * d + 3.879_33e-4 * t * t
        - t * t * t / 38_710_000.0;
    degrees.to_radians() % TWO_PI
}

/// Mean obliquity of the ecliptic (radians), IAU 1980.
fn mean_obliquity(t: f64) -> f64 {
    (84_381.448 - 46.815_0 * t - 5.9e-4 * t * t + 1.813e-3 * t * t * t) * ARCSEC_TO_RAD
}

/// Lieske 1976 precession, frame matrix EME2000 to mean-of-date.
fn precession_matrix(t: f64) -> RotationMatrix3 {
    let zeta = (2306.218_1 * t + 0.301_88 * t * t + 0.017_998 * t * t * t) * ARCSEC_TO_RAD;
    let z = (2306.218_1 * t + 1.094_68 * t * t + 0.018_203 * t * t * t) * ARCSEC_TO_RAD;
    let theta = (2004.310_9 * t - 0.426_65 * t * t - 0.041_833 * t * t * t) * ARCSEC_TO_RAD;
    let mut m = RotationMatrix3::identity();
    m.rotate_z(-zeta);
    m.rotate_y(theta);
    m.rotate_z(-z);
    m
}

/// Nutation in longitude and obliquity (radians): the five strongest
/// terms of the IAU-1980 series, good to a few hundredths of an
/// arcsecond.
fn nutation_angles(t: f64) -> (f64, f64) {
    let omega = (125.044_52 - 1_934.136_261 * t).to_radians();
    let f = (93.271_91 + 483_202.017_538 * t).to_radians();
    let d = (297.850_36 + 445_267.111_480 * t).to_radians();
    let l_sun = (357.527_72 + 35_999.050_340 * t).to_radians();

    let dpsi = (-17.199_6 * libm::sin(omega)
        - 1.318_7 * libm::sin(2.0 * (f - d + omega))
        - 0.227_4 * libm::sin(2.0 * (f + omega))
        + 0.206_2 * libm::sin(2.0 * omega)
        + 0.142_6 * libm::sin(l_sun))
        * ARCSEC_TO_RAD;
    let deps = (9.202_5 * libm::cos(omega)
        + 0.573_6 * libm::cos(2.0 * (f - d + omega))
        + 0.097_7 * libm::cos(2.0 * (f + omega))
        - 0.089_5 * libm::cos(2.0 * omega)
        + 0.005_4 * libm::cos(l_sun))
        * ARCSEC_TO_RAD;
    (dpsi, deps)
}

/// Frame matrix mean-of-date to true-of-date.
fn nutation_matrix(t: f64, dpsi: f64, deps: f64) -> RotationMatrix3 {
    let eps = mean_obliquity(t);
    let mut m = RotationMatrix3::identity();
    m.rotate_x(eps);
    m.rotate_z(-dpsi);
    m.rotate_x(-(eps + deps));
    m
}
