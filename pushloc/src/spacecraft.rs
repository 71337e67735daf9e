//! Spacecraft-to-body transform provider backed by tabulated samples.
//!
//! The spacecraft side interpolates tabulated ephemeris
//! (position/velocity) and attitude (quaternion) samples; the body side
//! delegates to the configured [`TransformProvider`](crate::TransformProvider).
//! Queries outside the common sample span fail with
//! [`OutOfTimeRange`](crate::LocError::OutOfTimeRange).

use crate::errors::{LocError, LocResult};
use crate::frames::TransformProvider;
use pushloc_core::math::{lagrange_interpolate_vector3, lagrange_interpolate};
use pushloc_core::{Epoch, Quaternion, Transform, Vector3};

/// One ephemeris sample: position and velocity in the inertial frame.
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PvSample {
    pub date: Epoch,
    pub position: Vector3,
    pub velocity: Vector3,
}

impl PvSample {
    pub fn new(date: Epoch, position: Vector3, velocity: Vector3) -> Self {
        Self {
            date,
            position,
            velocity,
        }
    }
}

/// One attitude sample: rotation from spacecraft to inertial axes.
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AttitudeSample {
    pub date: Epoch,
    pub quaternion: Quaternion,
}

impl AttitudeSample {
    pub fn new(date: Epoch, quaternion: Quaternion) -> Self {
        Self { date, quaternion }
    }
}

/// Time step used to estimate the attitude angular rate by finite
/// differences of the interpolated quaternion.
const RATE_ESTIMATION_STEP: f64 = 0.25;

/// Converter between the spacecraft frame and the body-rotating frame.
pub struct SpacecraftToBody {
    inertial_to_body: Box<dyn TransformProvider>,
    pv_samples: Vec<PvSample>,
    attitude_samples: Vec<AttitudeSample>,
    pv_order: usize,
    attitude_order: usize,
}

impl SpacecraftToBody {
    /// Creates the converter from sample tables.
    ///
    /// Samples are sorted by date; interpolation orders are clamped to
    /// the available sample counts (and to at least 2 when possible).
    pub fn new(
        inertial_to_body: Box<dyn TransformProvider>,
        mut pv_samples: Vec<PvSample>,
        pv_order: usize,
        mut attitude_samples: Vec<AttitudeSample>,
        attitude_order: usize,
    ) -> LocResult<Self> {
        if pv_samples.is_empty() {
            return Err(LocError::uninitialized("position/velocity sample"));
        }
        if attitude_samples.is_empty() {
            return Err(LocError::uninitialized("attitude sample"));
        }
        pv_samples.sort_by(|a, b| {
            a.date
                .partial_cmp(&b.date)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        attitude_samples.sort_by(|a, b| {
            a.date
                .partial_cmp(&b.date)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        let pv_order = pv_order.max(2).min(pv_samples.len());
        let attitude_order = attitude_order.max(2).min(attitude_samples.len());
        Ok(Self {
            inertial_to_body,
            pv_samples,
            attitude_samples,
            pv_order,
            attitude_order,
        })
    }

    /// Earliest date covered by both sample tables.
    pub fn min_date(&self) -> Epoch {
        let pv = self.pv_samples[0].date;
        let a = self.attitude_samples[0].date;
        if pv > a {
            pv
        } else {
            a
        }
    }

    /// Latest date covered by both sample tables.
    pub fn max_date(&self) -> Epoch {
        let pv = self.pv_samples[self.pv_samples.len() - 1].date;
        let a = self.attitude_samples[self.attitude_samples.len() - 1].date;
        if pv < a {
            pv
        } else {
            a
        }
    }

    fn check_in_range(&self, date: Epoch) -> LocResult<()> {
        if date < self.min_date() || date > self.max_date() {
            return Err(LocError::OutOfTimeRange {
                date,
                min: self.min_date(),
                max: self.max_date(),
            });
        }
        Ok(())
    }

    /// Transform from the spacecraft frame to the inertial frame.
    pub fn sc_to_inertial(&self, date: Epoch) -> LocResult<Transform> {
        self.check_in_range(date)?;
        let (position, velocity) = self.interpolate_pv(date);
        let rotation = self.interpolate_attitude(date).to_rotation_matrix();

        // angular rate from a symmetric finite difference of the
        // interpolated attitude; expressed in the inertial frame with
        // the sign convention of Transform (rate of destination w.r.t.
        // origin): for a spacecraft turning at ω in inertial axes the
        // inertial frame turns at -ω relative to the spacecraft
        let before = self
            .interpolate_attitude(date + (-RATE_ESTIMATION_STEP))
            .to_rotation_matrix();
        let after = self
            .interpolate_attitude(date + RATE_ESTIMATION_STEP)
            .to_rotation_matrix();
        let delta = after * before.transpose();
        let rate = -delta.to_rotation_vector() * (1.0 / (2.0 * RATE_ESTIMATION_STEP));

        Ok(Transform::new(rotation, rate, position, velocity))
    }

    /// Transform from the inertial frame to the body-rotating frame.
    pub fn inertial_to_body(&self, date: Epoch) -> LocResult<Transform> {
        Ok(self.inertial_to_body.transform(date))
    }

    fn interpolate_pv(&self, date: Epoch) -> (Vector3, Vector3) {
        let window = sample_window(&self.pv_samples, |s| s.date, date, self.pv_order);
        let xs: Vec<f64> = window.iter().map(|s| s.date - date).collect();
        let positions: Vec<Vector3> = window.iter().map(|s| s.position).collect();
        let velocities: Vec<Vector3> = window.iter().map(|s| s.velocity).collect();
        (
            lagrange_interpolate_vector3(&xs, &positions, 0.0),
            lagrange_interpolate_vector3(&xs, &velocities, 0.0),
        )
    }

    fn interpolate_attitude(&self, date: Epoch) -> Quaternion {
        let window = sample_window(&self.attitude_samples, |s| s.date, date, self.attitude_order);
        let xs: Vec<f64> = window.iter().map(|s| s.date - date).collect();
        // align signs across the window so component-wise interpolation
        // does not tear at the quaternion double cover
        let reference = window[0].quaternion;
        let aligned: Vec<Quaternion> = window
            .iter()
            .map(|s| s.quaternion.align_with(&reference))
            .collect();
        let component = |pick: fn(&Quaternion) -> f64| {
            let ys: Vec<f64> = aligned.iter().map(pick).collect();
            lagrange_interpolate(&xs, &ys, 0.0)
        };
        Quaternion::new(
            component(|q| q.w),
            component(|q| q.x),
            component(|q| q.y),
            component(|q| q.z),
        )
        .normalize()
    }
}

/// The `n` samples nearest to `date` in a sorted table.
fn sample_window<T>(samples: &[T], date_of: impl Fn(&T) -> Epoch, date: Epoch, n: usize) -> &[T] {
    let n = n.min(samples.len());
    let upper = samples.partition_point(|s| date_of(s) < date);
    let half = n / 2;
    let start = upper.saturating_sub(half).min(samples.len() - n);
    &samples[start..start + n]
}
