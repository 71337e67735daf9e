//! 3x3 rotation matrices for frame transformations.
//!
//! Rotations move vectors between the spacecraft frame, the inertial
//! frame and the body-rotating frame. Two conventions coexist here and
//! each constructor documents which one it uses:
//!
//! - the **frame** (passive) convention of [`rotate_x`](RotationMatrix3::rotate_x),
//!   [`rotate_y`](RotationMatrix3::rotate_y) and
//!   [`rotate_z`](RotationMatrix3::rotate_z): the matrix re-expresses a
//!   fixed vector in a rotated frame. A positive `rotate_z(π/2)` takes
//!   `[1, 0, 0]` to `[0, -1, 0]`. Frame chains (bias, precession,
//!   nutation, Earth rotation) are built this way.
//! - the **vector** (active) convention of
//!   [`from_axis_angle`](RotationMatrix3::from_axis_angle): the matrix
//!   rotates the vector itself, by the right-hand rule around the axis.
//!   Kinematic shifts of transforms are built this way.
//!
//! Matrices compose by multiplication, rightmost acting first. The
//! inverse of a rotation is its transpose.

use crate::Vector3;
use std::fmt;

/// A 3x3 rotation matrix, row-major storage.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RotationMatrix3 {
    elements: [[f64; 3]; 3],
}

impl RotationMatrix3 {
    /// Creates the identity matrix.
    pub fn identity() -> Self {
        Self {
            elements: [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
        }
    }

    /// Creates a matrix from a row-major 3x3 array.
    ///
    /// Does not validate that the matrix is a proper rotation.
    pub fn from_array(elements: [[f64; 3]; 3]) -> Self {
        Self { elements }
    }

    /// Rotation of vectors by `angle` radians around `axis` (active,
    /// right-hand rule). The axis does not need to be normalized.
    pub fn from_axis_angle(axis: &Vector3, angle: f64) -> Self {
        let k = axis.normalize();
        let (s, c) = libm::sincos(angle);
        let t = 1.0 - c;
        Self::from_array([
            [
                t * k.x * k.x + c,
                t * k.x * k.y - s * k.z,
                t * k.x * k.z + s * k.y,
            ],
            [
                t * k.x * k.y + s * k.z,
                t * k.y * k.y + c,
                t * k.y * k.z - s * k.x,
            ],
            [
                t * k.x * k.z - s * k.y,
                t * k.y * k.z + s * k.x,
                t * k.z * k.z + c,
            ],
        ])
    }

    /// Returns the element at `(row, col)`. Panics outside 0..3.
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.elements[row][col]
    }

    /// Premultiplies by a frame rotation of `phi` radians about X.
    pub fn rotate_x(&mut self, phi: f64) {
        let (s, c) = libm::sincos(phi);
        let r = Self::from_array([[1.0, 0.0, 0.0], [0.0, c, s], [0.0, -s, c]]);
        *self = r * *self;
    }

    /// Premultiplies by a frame rotation of `theta` radians about Y.
    pub fn rotate_y(&mut self, theta: f64) {
        let (s, c) = libm::sincos(theta);
        let r = Self::from_array([[c, 0.0, -s], [0.0, 1.0, 0.0], [s, 0.0, c]]);
        *self = r * *self;
    }

    /// Premultiplies by a frame rotation of `psi` radians about Z.
    pub fn rotate_z(&mut self, psi: f64) {
        let (s, c) = libm::sincos(psi);
        let r = Self::from_array([[c, s, 0.0], [-s, c, 0.0], [0.0, 0.0, 1.0]]);
        *self = r * *self;
    }

    /// Returns the transpose, which for a rotation is its inverse.
    pub fn transpose(&self) -> Self {
        let e = &self.elements;
        Self::from_array([
            [e[0][0], e[1][0], e[2][0]],
            [e[0][1], e[1][1], e[2][1]],
            [e[0][2], e[1][2], e[2][2]],
        ])
    }

    /// Applies the matrix to a vector.
    pub fn apply_to_vector(&self, v: &Vector3) -> Vector3 {
        let e = &self.elements;
        Vector3::new(
            e[0][0] * v.x + e[0][1] * v.y + e[0][2] * v.z,
            e[1][0] * v.x + e[1][1] * v.y + e[1][2] * v.z,
            e[2][0] * v.x + e[2][1] * v.y + e[2][2] * v.z,
        )
    }

    /// Extracts the rotation vector (axis scaled by angle in radians).
    ///
    /// Interprets the matrix in the active convention, so that
    /// `from_axis_angle(&v.normalize(), v.magnitude())` rebuilds the
    /// matrix. Returns the zero vector for the identity.
    pub fn to_rotation_vector(&self) -> Vector3 {
        let e = &self.elements;
        let axis = Vector3::new(
            e[2][1] - e[1][2],
            e[0][2] - e[2][0],
            e[1][0] - e[0][1],
        );
        let s = 0.5 * axis.magnitude();
        let c = 0.5 * (e[0][0] + e[1][1] + e[2][2] - 1.0);
        let angle = libm::atan2(s, c);
        if s < 1e-300 {
            // identity (angle ~ 0) or half-turn; half-turns do not occur
            // for the small kinematic shifts this is used for
            return Vector3::zeros();
        }
        axis.normalize() * angle
    }
}

/// Matrix * Matrix composition (rightmost acts first).
impl std::ops::Mul for RotationMatrix3 {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        let mut out = [[0.0; 3]; 3];
        for (i, row) in out.iter_mut().enumerate() {
            for (j, cell) in row.iter_mut().enumerate() {
                *cell = self.elements[i][0] * rhs.elements[0][j]
                    + self.elements[i][1] * rhs.elements[1][j]
                    + self.elements[i][2] * rhs.elements[2][j];
            }
        }
        Self::from_array(out)
    }
}

impl fmt::Display for RotationMatrix3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let e = &self.elements;
        write!(
            f,
            "[[{:.12}, {:.12}, {:.12}], [{:.12}, {:.12}, {:.12}], [{:.12}, {:.12}, {:.12}]]",
            e[0][0], e[0][1], e[0][2], e[1][0], e[1][1], e[1][2], e[2][0], e[2][1], e[2][2]
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_vec_close(a: Vector3, b: Vector3, tol: f64) {
        assert!(a.distance(&b) < tol, "{} vs {}", a, b);
    }

    #[test]
    fn test_identity_leaves_vectors() {
        let m = RotationMatrix3::identity();
        let v = Vector3::new(1.0, 2.0, 3.0);
        assert_eq!(m.apply_to_vector(&v), v);
    }

    #[test]
    fn test_frame_rotation_convention() {
        let mut m = RotationMatrix3::identity();
        m.rotate_z(std::f64::consts::FRAC_PI_2);
        assert_vec_close(
            m.apply_to_vector(&Vector3::x_axis()),
            Vector3::new(0.0, -1.0, 0.0),
            1e-15,
        );
    }

    #[test]
    fn test_active_rotation_convention() {
        let m = RotationMatrix3::from_axis_angle(&Vector3::z_axis(), std::f64::consts::FRAC_PI_2);
        assert_vec_close(
            m.apply_to_vector(&Vector3::x_axis()),
            Vector3::new(0.0, 1.0, 0.0),
            1e-15,
        );
    }

    #[test]
    fn test_transpose_is_inverse() {
        let mut m = RotationMatrix3::identity();
        m.rotate_z(0.5);
        m.rotate_x(0.3);
        let product = m * m.transpose();
        for i in 0..3 {
            for j in 0..3 {
                let expected = if i == j { 1.0 } else { 0.0 };
                assert!((product.get(i, j) - expected).abs() < 1e-15);
            }
        }
    }

    #[test]
    fn test_rotation_vector_roundtrip() {
        let axis = Vector3::new(1.0, -2.0, 0.5).normalize();
        let angle = 0.7;
        let m = RotationMatrix3::from_axis_angle(&axis, angle);
        let rv = m.to_rotation_vector();
        assert!((rv.magnitude() - angle).abs() < 1e-12);
        assert_vec_close(rv.normalize(), axis, 1e-12);
    }

    #[test]
    fn test_rotation_vector_identity() {
        assert_eq!(
            RotationMatrix3::identity().to_rotation_vector(),
            Vector3::zeros()
        );
    }

    #[test]
    fn test_composition_order() {
        // rightmost acts first: rotating x by Rz(90) then Rx(90) sends
        // +X to +Y then +Y to +Z (active convention)
        let rz = RotationMatrix3::from_axis_angle(&Vector3::z_axis(), std::f64::consts::FRAC_PI_2);
        let rx = RotationMatrix3::from_axis_angle(&Vector3::x_axis(), std::f64::consts::FRAC_PI_2);
        let combined = rx * rz;
        assert_vec_close(
            combined.apply_to_vector(&Vector3::x_axis()),
            Vector3::z_axis(),
            1e-15,
        );
    }
}
