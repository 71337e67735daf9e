//! Pushbroom line sensor model.

use pushloc_core::{Epoch, Vector3};

/// Maps real-valued line numbers to acquisition dates and back.
///
/// Implementations must be monotonically increasing in the line number.
pub trait LineDatation {
    /// Acquisition date of (possibly fractional) line `line`.
    fn date(&self, line: f64) -> Epoch;

    /// (Possibly fractional) line acquired at `date`.
    fn line(&self, date: Epoch) -> f64;
}

/// Affine line datation: a reference line, its date, and a constant
/// line rate.
#[derive(Debug, Clone, Copy)]
pub struct LinearLineDatation {
    reference_date: Epoch,
    reference_line: f64,
    /// Lines per second.
    rate: f64,
}

impl LinearLineDatation {
    pub fn new(reference_date: Epoch, reference_line: f64, rate: f64) -> Self {
        Self {
            reference_date,
            reference_line,
            rate,
        }
    }
}

impl LineDatation for LinearLineDatation {
    fn date(&self, line: f64) -> Epoch {
        self.reference_date + (line - self.reference_line) / self.rate
    }

    fn line(&self, date: Epoch) -> f64 {
        self.reference_line + self.rate * (date - self.reference_date)
    }
}

/// A pushbroom line sensor: ordered pixel lines of sight in the
/// spacecraft frame, the sensor origin, a datation model and the mean
/// plane normal of the LOS fan.
pub struct LineSensor {
    name: String,
    position: Vector3,
    los: Vec<Vector3>,
    datation: Box<dyn LineDatation>,
    mean_plane_normal: Vector3,
}

impl LineSensor {
    /// Creates a sensor; LOS vectors are normalized and the mean plane
    /// normal is estimated from the fan (see
    /// [`with_mean_plane_normal`](Self::with_mean_plane_normal) to
    /// override it with a calibrated value).
    pub fn new(
        name: impl Into<String>,
        datation: Box<dyn LineDatation>,
        position: Vector3,
        los: Vec<Vector3>,
    ) -> Self {
        let los: Vec<Vector3> = los.iter().map(Vector3::normalize).collect();
        let mean_plane_normal = estimate_mean_plane_normal(&los);
        Self {
            name: name.into(),
            position,
            los,
            datation,
            mean_plane_normal,
        }
    }

    /// Replaces the estimated mean plane normal with a supplied one.
    pub fn with_mean_plane_normal(mut self, normal: Vector3) -> Self {
        self.mean_plane_normal = normal.normalize();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Sensor origin position in the spacecraft frame.
    pub fn position(&self) -> &Vector3 {
        &self.position
    }

    pub fn nb_pixels(&self) -> usize {
        self.los.len()
    }

    /// LOS of integer pixel `i` in the spacecraft frame.
    pub fn los(&self, i: usize) -> Vector3 {
        self.los[i]
    }

    /// LOS at a fractional pixel index: normalized linear interpolation
    /// of the two neighboring pixels, clamped at the sensor ends.
    pub fn interpolated_los(&self, x: f64) -> Vector3 {
        let i_inf = (libm::floor(x).max(0.0) as usize).min(self.los.len() - 2);
        let i_sup = i_inf + 1;
        Vector3::linear_combination(
            i_sup as f64 - x,
            &self.los[i_inf],
            x - i_inf as f64,
            &self.los[i_sup],
        )
        .normalize()
    }

    /// Acquisition date of a (fractional) line.
    pub fn date(&self, line: f64) -> Epoch {
        self.datation.date(line)
    }

    /// Line acquired at a date.
    pub fn line(&self, date: Epoch) -> f64 {
        self.datation.line(date)
    }

    /// Unit normal of the sensor's mean sweep plane.
    pub fn mean_plane_normal(&self) -> &Vector3 {
        &self.mean_plane_normal
    }
}

/// Normal of the best-fit plane of an ordered LOS fan.
///
/// Every cross product of neighboring LOS vectors is perpendicular to
/// the plane the fan sweeps; their sum averages out the per-pixel noise
/// and is the smallest-variance principal axis of the set for the
/// quasi-planar fans line sensors have.
fn estimate_mean_plane_normal(los: &[Vector3]) -> Vector3 {
    let mut normal = Vector3::zeros();
    for pair in los.windows(2) {
        normal = normal + pair[0].cross(&pair[1]);
    }
    if normal.magnitude() == 0.0 {
        // single-pixel or degenerate sensor: any vector orthogonal to
        // the first LOS works
        let l = los.first().copied().unwrap_or_else(Vector3::x_axis);
        let candidate = l.cross(&Vector3::z_axis());
        if candidate.magnitude() > 1e-12 {
            return candidate.normalize();
        }
        return l.cross(&Vector3::x_axis()).normalize();
    }
    normal.normalize()
}

/// A (fractional) sensor line/pixel coordinate pair.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SensorPixel {
    pub line: f64,
    pub pixel: f64,
}

impl SensorPixel {
    pub fn new(line: f64, pixel: f64) -> Self {
        Self { line, pixel }
    }
}
