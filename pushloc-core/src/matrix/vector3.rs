//! 3D Cartesian vectors for positions and lines of sight.
//!
//! Everything the localization pipeline moves around, from spacecraft
//! positions to pixel lines of sight, is a [`Vector3`].
//! Positions are in metres in whatever frame the caller is working in;
//! lines of sight are unit vectors.
//!
//! # Lines of sight
//!
//! A pixel LOS is a unit vector from the sensor origin through the pixel.
//! The two operations that matter most for sensor geometry are the angle
//! between two directions ([`angle`](Vector3::angle), numerically stable
//! near 0 and π where the plain `acos` of a dot product loses digits) and
//! weighted combinations ([`linear_combination`](Vector3::linear_combination),
//! used for velocity composition and LOS interpolation):
//!
//! ```
//! use pushloc_core::Vector3;
//!
//! let a = Vector3::x_axis();
//! let b = Vector3::y_axis();
//! assert!((a.angle(&b) - std::f64::consts::FRAC_PI_2).abs() < 1e-15);
//!
//! // midpoint direction of two neighboring pixel LOS
//! let mid = Vector3::linear_combination(0.5, &a, 0.5, &b).normalize();
//! assert!((mid.magnitude() - 1.0).abs() < 1e-15);
//! ```

use std::fmt;

/// A 3D Cartesian vector.
///
/// Components are public for direct access when performance matters.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Vector3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vector3 {
    /// Creates a new vector from x, y, z components.
    #[inline]
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Returns the zero vector `[0, 0, 0]`.
    #[inline]
    pub fn zeros() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    /// Returns the unit vector along the X axis `[1, 0, 0]`.
    #[inline]
    pub fn x_axis() -> Self {
        Self::new(1.0, 0.0, 0.0)
    }

    /// Returns the unit vector along the Y axis `[0, 1, 0]`.
    #[inline]
    pub fn y_axis() -> Self {
        Self::new(0.0, 1.0, 0.0)
    }

    /// Returns the unit vector along the Z axis `[0, 0, 1]`.
    #[inline]
    pub fn z_axis() -> Self {
        Self::new(0.0, 0.0, 1.0)
    }

    /// Returns the Euclidean length (L2 norm) of the vector.
    #[inline]
    pub fn magnitude(&self) -> f64 {
        libm::sqrt(self.magnitude_squared())
    }

    /// Returns the squared magnitude.
    ///
    /// Faster than [`magnitude`](Self::magnitude) when only comparisons
    /// are needed.
    #[inline]
    pub fn magnitude_squared(&self) -> f64 {
        self.x * self.x + self.y * self.y + self.z * self.z
    }

    /// Returns a unit vector pointing in the same direction.
    ///
    /// The zero vector is returned unchanged (avoids NaN).
    pub fn normalize(&self) -> Self {
        let mag = self.magnitude();
        if mag == 0.0 {
            *self
        } else {
            Self::new(self.x / mag, self.y / mag, self.z / mag)
        }
    }

    /// Computes the dot product with another vector.
    #[inline]
    pub fn dot(&self, other: &Self) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    /// Computes the cross product with another vector (right-hand rule).
    pub fn cross(&self, other: &Self) -> Self {
        Self::new(
            self.y * other.z - self.z * other.y,
            self.z * other.x - self.x * other.z,
            self.x * other.y - self.y * other.x,
        )
    }

    /// Euclidean distance to another point.
    #[inline]
    pub fn distance(&self, other: &Self) -> f64 {
        (*self - *other).magnitude()
    }

    /// Angular separation with another vector, in `[0, π]`.
    ///
    /// Uses the atan2 of cross and dot products, which stays accurate for
    /// nearly parallel and nearly opposite vectors where
    /// `acos(dot)` does not.
    pub fn angle(&self, other: &Self) -> f64 {
        libm::atan2(self.cross(other).magnitude(), self.dot(other))
    }

    /// Weighted sum `a·u + b·v` of two vectors.
    #[inline]
    pub fn linear_combination(a: f64, u: &Self, b: f64, v: &Self) -> Self {
        Self::new(
            a * u.x + b * v.x,
            a * u.y + b * v.y,
            a * u.z + b * v.z,
        )
    }

    /// Returns the components as a `[f64; 3]` array.
    #[inline]
    pub fn to_array(&self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }

    /// Creates a vector from a `[f64; 3]` array.
    #[inline]
    pub fn from_array(arr: [f64; 3]) -> Self {
        Self::new(arr[0], arr[1], arr[2])
    }
}

/// Vector + Vector
impl std::ops::Add for Vector3 {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

/// Vector - Vector
impl std::ops::Sub for Vector3 {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

/// Vector * scalar
impl std::ops::Mul<f64> for Vector3 {
    type Output = Self;

    fn mul(self, scalar: f64) -> Self {
        Self::new(self.x * scalar, self.y * scalar, self.z * scalar)
    }
}

/// scalar * Vector
impl std::ops::Mul<Vector3> for f64 {
    type Output = Vector3;

    fn mul(self, vec: Vector3) -> Vector3 {
        vec * self
    }
}

/// Vector / scalar
impl std::ops::Div<f64> for Vector3 {
    type Output = Self;

    fn div(self, scalar: f64) -> Self {
        Self::new(self.x / scalar, self.y / scalar, self.z / scalar)
    }
}

/// -Vector
impl std::ops::Neg for Vector3 {
    type Output = Self;

    fn neg(self) -> Self {
        Self::new(-self.x, -self.y, -self.z)
    }
}

impl fmt::Display for Vector3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Vector3({:.9}, {:.9}, {:.9})", self.x, self.y, self.z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_construction_and_axes() {
        let v = Vector3::new(1.0, 2.0, 3.0);
        assert_eq!(v.x, 1.0);
        assert_eq!(v.y, 2.0);
        assert_eq!(v.z, 3.0);
        assert_eq!(Vector3::x_axis(), Vector3::new(1.0, 0.0, 0.0));
        assert_eq!(Vector3::y_axis(), Vector3::new(0.0, 1.0, 0.0));
        assert_eq!(Vector3::z_axis(), Vector3::new(0.0, 0.0, 1.0));
        assert_eq!(Vector3::from_array([4.0, 5.0, 6.0]).to_array(), [4.0, 5.0, 6.0]);
    }

    #[test]
    fn test_magnitude_and_normalize() {
        let v = Vector3::new(3.0, 4.0, 0.0);
        assert_eq!(v.magnitude(), 5.0);
        assert_eq!(v.magnitude_squared(), 25.0);
        assert_eq!(v.normalize(), Vector3::new(0.6, 0.8, 0.0));
        assert_eq!(Vector3::zeros().normalize(), Vector3::zeros());
    }

    #[test]
    fn test_dot_cross() {
        let a = Vector3::x_axis();
        let b = Vector3::y_axis();
        assert_eq!(a.dot(&b), 0.0);
        assert_eq!(a.cross(&b), Vector3::z_axis());

        let d = Vector3::new(1.0, 2.0, 3.0);
        let e = Vector3::new(4.0, 5.0, 6.0);
        assert_eq!(d.dot(&e), 32.0);
    }

    #[test]
    fn test_arithmetic_operators() {
        let a = Vector3::new(1.0, 2.0, 3.0);
        let b = Vector3::new(4.0, 5.0, 6.0);
        assert_eq!(a + b, Vector3::new(5.0, 7.0, 9.0));
        assert_eq!(b - a, Vector3::new(3.0, 3.0, 3.0));
        assert_eq!(a * 2.0, Vector3::new(2.0, 4.0, 6.0));
        assert_eq!(3.0 * a, Vector3::new(3.0, 6.0, 9.0));
        assert_eq!(a / 2.0, Vector3::new(0.5, 1.0, 1.5));
        assert_eq!(-a, Vector3::new(-1.0, -2.0, -3.0));
    }

    #[test]
    fn test_angle_stability_near_zero() {
        let a = Vector3::x_axis();
        let b = Vector3::new(1.0, 1e-9, 0.0).normalize();
        let angle = a.angle(&b);
        assert!(
            (angle - 1e-9).abs() < 1e-18,
            "near-parallel angle lost precision: {}",
            angle
        );
    }

    #[test]
    fn test_angle_right_and_opposite() {
        let a = Vector3::x_axis();
        assert!((a.angle(&Vector3::y_axis()) - std::f64::consts::FRAC_PI_2).abs() < 1e-15);
        assert!((a.angle(&-a) - std::f64::consts::PI).abs() < 1e-15);
    }

    #[test]
    fn test_linear_combination() {
        let a = Vector3::new(1.0, 0.0, 0.0);
        let b = Vector3::new(0.0, 1.0, 0.0);
        let c = Vector3::linear_combination(2.0, &a, 3.0, &b);
        assert_eq!(c, Vector3::new(2.0, 3.0, 0.0));
    }

    #[test]
    fn test_distance() {
        let a = Vector3::new(1.0, 2.0, 3.0);
        let b = Vector3::new(4.0, 6.0, 3.0);
        assert_eq!(a.distance(&b), 5.0);
    }
}
