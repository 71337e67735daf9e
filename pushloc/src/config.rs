//! Configuration identifiers for the facade presets.

use pushloc_core::Ellipsoid;

/// DEM intersection algorithm selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AlgorithmId {
    /// Hierarchical min/max tile traversal; the production choice.
    Duvenhage,
    /// Duvenhage with locally planar altitude clipping.
    DuvenhageFlatBody,
    /// Cell-by-cell exhaustive scan. Quadratic cost; validation only.
    BasicSlowExhaustiveScanForTestsOnly,
    /// No DEM at all; pure ellipsoid intersection.
    IgnoreDemUseEllipsoid,
}

/// Reference ellipsoid selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EllipsoidId {
    Grs80,
    Wgs84,
    Iers96,
    Iers2003,
}

impl EllipsoidId {
    /// Builds the ellipsoid with the standard defining constants.
    pub fn ellipsoid(&self) -> Ellipsoid {
        match self {
            Self::Grs80 => Ellipsoid::new(6_378_137.0, 1.0 / 298.257_222_101),
            Self::Wgs84 => Ellipsoid::new(6_378_137.0, 1.0 / 298.257_223_563),
            Self::Iers96 => Ellipsoid::new(6_378_136.49, 1.0 / 298.256_45),
            Self::Iers2003 => Ellipsoid::new(6_378_136.6, 1.0 / 298.256_42),
        }
    }
}

/// Inertial frame selection for the embedded frame model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum InertialFrameId {
    /// Geocentric celestial reference frame.
    Gcrf,
    /// Mean equator and equinox of J2000.0.
    Eme2000,
    /// Mean equator and equinox of date (Lieske 1976 precession).
    Mod,
    /// True equator and equinox of date (truncated IAU-1980 nutation).
    Tod,
    /// Mean equator and equinox of B1950 (Veis).
    Veis1950,
}

/// Body-rotating frame selection for the embedded frame model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BodyRotatingFrameId {
    /// CIO-based terrestrial frame, Earth Rotation Angle.
    Itrf,
    /// Equinox-based terrestrial frame, apparent sidereal time.
    ItrfEquinox,
    /// Greenwich true-of-date, apparent sidereal time.
    Gtod,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ellipsoid_constants() {
        let wgs84 = EllipsoidId::Wgs84.ellipsoid();
        assert_eq!(wgs84.equatorial_radius(), 6_378_137.0);
        assert!((1.0 / wgs84.flattening() - 298.257_223_563).abs() < 1e-9);

        let grs80 = EllipsoidId::Grs80.ellipsoid();
        assert!((1.0 / grs80.flattening() - 298.257_222_101).abs() < 1e-9);

        assert_eq!(EllipsoidId::Iers96.ellipsoid().equatorial_radius(), 6_378_136.49);
        assert_eq!(EllipsoidId::Iers2003.ellipsoid().equatorial_radius(), 6_378_136.6);
    }
}
