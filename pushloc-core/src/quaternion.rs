//! Unit quaternions for attitude representation.
//!
//! Attitude samples arrive as quaternions; the pipeline converts them to
//! rotation matrices once per query. The only subtlety worth keeping in
//! mind is the double cover: `q` and `-q` represent the same rotation, so
//! interpolation across a sample window must first align signs
//! ([`align_with`](Quaternion::align_with)), otherwise component-wise
//! blending tears the attitude apart at a sign flip.

use crate::{RotationMatrix3, Vector3};
use std::fmt;

/// A rotation quaternion `w + xi + yj + zk` (scalar part first).
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Quaternion {
    pub w: f64,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Quaternion {
    /// Creates a quaternion from scalar and vector components.
    #[inline]
    pub fn new(w: f64, x: f64, y: f64, z: f64) -> Self {
        Self { w, x, y, z }
    }

    /// The identity rotation.
    #[inline]
    pub fn identity() -> Self {
        Self::new(1.0, 0.0, 0.0, 0.0)
    }

    /// Rotation of `angle` radians around `axis` (active, right-hand rule).
    pub fn from_axis_angle(axis: &Vector3, angle: f64) -> Self {
        let k = axis.normalize();
        let (s, c) = libm::sincos(0.5 * angle);
        Self::new(c, s * k.x, s * k.y, s * k.z)
    }

    /// Quaternion norm.
    pub fn norm(&self) -> f64 {
        libm::sqrt(self.w * self.w + self.x * self.x + self.y * self.y + self.z * self.z)
    }

    /// Returns the unit quaternion with the same rotation.
    ///
    /// The zero quaternion is returned unchanged.
    pub fn normalize(&self) -> Self {
        let n = self.norm();
        if n == 0.0 {
            *self
        } else {
            Self::new(self.w / n, self.x / n, self.y / n, self.z / n)
        }
    }

    /// Four-component dot product.
    pub fn dot(&self, other: &Self) -> f64 {
        self.w * other.w + self.x * other.x + self.y * other.y + self.z * other.z
    }

    /// Returns this quaternion or its negation, whichever is in the same
    /// half-space as `reference`.
    pub fn align_with(&self, reference: &Self) -> Self {
        if self.dot(reference) < 0.0 {
            Self::new(-self.w, -self.x, -self.y, -self.z)
        } else {
            *self
        }
    }

    /// Converts to the equivalent rotation matrix (active convention,
    /// same as [`RotationMatrix3::from_axis_angle`]).
    pub fn to_rotation_matrix(&self) -> RotationMatrix3 {
        let q = self.normalize();
        let (w, x, y, z) = (q.w, q.x, q.y, q.z);
        RotationMatrix3::from_array([
            [
                1.0 - 2.0 * (y * y + z * z),
                2.0 * (x * y - w * z),
                2.0 * (x * z + w * y),
            ],
            [
                2.0 * (x * y + w * z),
                1.0 - 2.0 * (x * x + z * z),
                2.0 * (y * z - w * x),
            ],
            [
                2.0 * (x * z - w * y),
                2.0 * (y * z + w * x),
                1.0 - 2.0 * (x * x + y * y),
            ],
        ])
    }
}

impl fmt::Display for Quaternion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Quaternion({:.9}, {:.9}, {:.9}, {:.9})",
            self.w, self.x, self.y, self.z
        )
    }
}
