//! Kinematic transforms between reference frames.
//!
//! A [`Transform`] maps coordinates from an origin frame A to a
//! destination frame B at one instant, together with the first-order
//! motion of B relative to A. Position mapping is `p_B = R·p_A + τ`;
//! `v` is the time derivative of `τ` and `ω` the angular velocity of B
//! with respect to A, expressed in B.
//!
//! The first-order motion is what makes light-time correction cheap:
//! [`shifted_by`](Transform::shifted_by) produces the approximate
//! transform a fraction of a second away without re-interpolating the
//! ephemeris, exactly the accuracy class needed for sub-centimetre
//! ground displacements over millisecond light travel times.

use crate::{RotationMatrix3, Vector3};

/// Frame transform with first-order kinematics.
#[derive(Debug, Clone, Copy)]
pub struct Transform {
    rotation: RotationMatrix3,
    rotation_rate: Vector3,
    translation: Vector3,
    velocity: Vector3,
}

impl Transform {
    /// Creates a transform from its four components.
    ///
    /// `rotation_rate` is the angular velocity of the destination frame
    /// with respect to the origin frame, expressed in destination axes.
    pub fn new(
        rotation: RotationMatrix3,
        rotation_rate: Vector3,
        translation: Vector3,
        velocity: Vector3,
    ) -> Self {
        Self {
            rotation,
            rotation_rate,
            translation,
            velocity,
        }
    }

    /// The identity transform (frames coincide, no relative motion).
    pub fn identity() -> Self {
        Self::new(
            RotationMatrix3::identity(),
            Vector3::zeros(),
            Vector3::zeros(),
            Vector3::zeros(),
        )
    }

    #[inline]
    pub fn rotation(&self) -> &RotationMatrix3 {
        &self.rotation
    }

    #[inline]
    pub fn rotation_rate(&self) -> &Vector3 {
        &self.rotation_rate
    }

    #[inline]
    pub fn translation(&self) -> &Vector3 {
        &self.translation
    }

    /// Velocity of the origin-frame origin as seen in the destination
    /// frame. For a spacecraft-to-inertial transform this is the
    /// spacecraft inertial velocity.
    #[inline]
    pub fn velocity(&self) -> &Vector3 {
        &self.velocity
    }

    /// Maps a position from the origin frame to the destination frame.
    pub fn transform_position(&self, p: &Vector3) -> Vector3 {
        self.rotation.apply_to_vector(p) + self.translation
    }

    /// Maps a free vector (direction) from origin to destination frame.
    pub fn transform_vector(&self, v: &Vector3) -> Vector3 {
        self.rotation.apply_to_vector(v)
    }

    /// The inverse transform (destination to origin).
    pub fn inverse(&self) -> Self {
        let rt = self.rotation.transpose();
        let translation = -rt.apply_to_vector(&self.translation);
        let velocity =
            -rt.apply_to_vector(&(self.rotation_rate.cross(&self.translation) + self.velocity));
        let rotation_rate = -rt.apply_to_vector(&self.rotation_rate);
        Self::new(rt, rotation_rate, translation, velocity)
    }

    /// First-order approximation of the transform `dt` seconds away.
    ///
    /// The rotation advances by `ω·dt`, the translation by `v·dt`; rates
    /// are kept. Valid for `|ω·dt| ≪ 1`, which holds comfortably for
    /// light-time scale shifts.
    pub fn shifted_by(&self, dt: f64) -> Self {
        let rate_norm = self.rotation_rate.magnitude();
        let rotation = if rate_norm * dt.abs() > 0.0 {
            RotationMatrix3::from_axis_angle(&self.rotation_rate, -rate_norm * dt) * self.rotation
        } else {
            self.rotation
        };
        Self::new(
            rotation,
            self.rotation_rate,
            self.translation + self.velocity * dt,
            self.velocity,
        )
    }

    /// Chains `self` (A to B) with `second` (B to C) into A to C.
    pub fn compose(&self, second: &Transform) -> Self {
        let rotation = second.rotation * self.rotation;
        let translated = second.rotation.apply_to_vector(&self.translation);
        let translation = translated + second.translation;
        let rotation_rate =
            second.rotation_rate + second.rotation.apply_to_vector(&self.rotation_rate);
        let velocity = second.velocity + second.rotation.apply_to_vector(&self.velocity)
            - second.rotation_rate.cross(&translated);
        Self::new(rotation, rotation_rate, translation, velocity)
    }
}
