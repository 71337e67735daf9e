//! Absolute dates for line datation and ephemeris indexing.

use crate::constants::{DAYS_PER_JULIAN_CENTURY, J2000_JD, SECONDS_PER_DAY};
use std::fmt;
use std::ops::{Add, Sub};

/// An absolute date, stored as seconds offset from J2000.0.
///
/// The time scale is opaque to the localization pipeline: line datation,
/// ephemeris samples and attitude samples must simply share it. The
/// embedded Earth rotation models interpret it as UT1-equivalent seconds;
/// deployments needing the full UT1/TT distinction plug in their own
/// frame provider.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Epoch {
    offset: f64,
}

impl Epoch {
    /// Creates an epoch from a seconds offset relative to J2000.0.
    #[inline]
    pub fn from_seconds_since_j2000(offset: f64) -> Self {
        Self { offset }
    }

    /// The J2000.0 reference epoch itself.
    #[inline]
    pub fn j2000() -> Self {
        Self { offset: 0.0 }
    }

    /// Seconds elapsed since J2000.0 (negative before).
    #[inline]
    pub fn seconds_since_j2000(&self) -> f64 {
        self.offset
    }

    /// Days elapsed since J2000.0.
    #[inline]
    pub fn days_since_j2000(&self) -> f64 {
        self.offset / SECONDS_PER_DAY
    }

    /// Julian centuries elapsed since J2000.0.
    #[inline]
    pub fn julian_centuries(&self) -> f64 {
        self.days_since_j2000() / DAYS_PER_JULIAN_CENTURY
    }

    /// Julian date.
    #[inline]
    pub fn julian_date(&self) -> f64 {
        J2000_JD + self.days_since_j2000()
    }
}

/// Epoch + seconds
impl Add<f64> for Epoch {
    type Output = Epoch;

    fn add(self, seconds: f64) -> Epoch {
        Epoch::from_seconds_since_j2000(self.offset + seconds)
    }
}

/// Epoch - Epoch, in seconds
impl Sub for Epoch {
    type Output = f64;

    fn sub(self, other: Epoch) -> f64 {
        self.offset - other.offset
    }
}

impl fmt::Display for Epoch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "J2000{:+.6}s", self.offset)
    }
}
