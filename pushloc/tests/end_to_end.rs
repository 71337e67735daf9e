//! End-to-end localization scenarios with analytic expectations.

use pushloc::{
    AlgorithmId, AttitudeSample, Epoch, GeodeticPoint, LinearLineDatation, LineSensor, LocError,
    PushbroomLocator, PvSample, Quaternion, RotationMatrix3, Tile, TileUpdater, Transform,
    TransformProvider, Vector3,
};
use pushloc_raster::RasterResult;

const WGS84_A: f64 = 6_378_137.0;
const SPEED_OF_LIGHT: f64 = 299_792_458.0;
const ALTITUDE: f64 = 700_000.0;

/// Body frame frozen onto the inertial frame: isolates sensor geometry
/// and aberration from Earth orientation.
struct FrozenBody;

impl TransformProvider for FrozenBody {
    fn transform(&self, _date: Epoch) -> Transform {
        Transform::identity()
    }
}

/// Body frame spinning uniformly around +z, aligned with inertial at
/// J2000: isolates the light-time correction.
struct SpinningBody {
    omega: f64,
}

impl TransformProvider for SpinningBody {
    fn transform(&self, date: Epoch) -> Transform {
        let mut rotation = RotationMatrix3::identity();
        rotation.rotate_z(self.omega * date.seconds_since_j2000());
        Transform::new(
            rotation,
            Vector3::new(0.0, 0.0, self.omega),
            Vector3::zeros(),
            Vector3::zeros(),
        )
    }
}

/// Flat DEM tiles at a constant elevation, available worldwide.
fn flat_updater(elevation: f64) -> Box<dyn TileUpdater> {
    Box::new(move |latitude: f64, longitude: f64, tile: &mut Tile| -> RasterResult<()> {
        let size = 0.01_f64;
        let step = size / 20.0;
        let min_lat = (latitude / size).floor() * size - step;
        let min_lon = (longitude / size).floor() * size - step;
        tile.set_geometry(min_lat, min_lon, step, step, 23, 23)?;
        for i in 0..23 {
            for j in 0..23 {
                tile.set_elevation(i, j, elevation)?;
            }
        }
        Ok(())
    })
}

/// Conical hill of the given peak elevation centered at
/// (hill_lat, hill_lon), zero elsewhere.
fn hill_elevation(lat: f64, lon: f64, hill_lat: f64, hill_lon: f64, peak: f64) -> f64 {
    let radius = 0.002_f64;
    let d = ((lat - hill_lat).powi(2) + (lon - hill_lon).powi(2)).sqrt();
    (peak * (1.0 - d / radius)).max(0.0)
}

fn hill_updater(hill_lat: f64, hill_lon: f64, peak: f64) -> Box<dyn TileUpdater> {
    Box::new(move |latitude: f64, longitude: f64, tile: &mut Tile| -> RasterResult<()> {
        let size = 0.01_f64;
        let step = size / 20.0;
        let min_lat = (latitude / size).floor() * size - step;
        let min_lon = (longitude / size).floor() * size - step;
        tile.set_geometry(min_lat, min_lon, step, step, 23, 23)?;
        for i in 0..23 {
            for j in 0..23 {
                let lat = min_lat + i as f64 * step;
                let lon = min_lon + j as f64 * step;
                tile.set_elevation(i, j, hill_elevation(lat, lon, hill_lat, hill_lon, peak))?;
            }
        }
        Ok(())
    })
}

/// Straight-line LEO pass above the equator: position over (0°, 0°) at
/// J2000, moving along +y at `velocity`.
fn pass_ephemeris(velocity: f64) -> Vec<PvSample> {
    (0..16)
        .map(|k| {
            let t = -0.5 + 0.1 * k as f64;
            PvSample::new(
                Epoch::from_seconds_since_j2000(t),
                Vector3::new(WGS84_A + ALTITUDE, velocity * t, 0.0),
                Vector3::new(0.0, velocity, 0.0),
            )
        })
        .collect()
}

fn steady_attitude() -> Vec<AttitudeSample> {
    (0..16)
        .map(|k| {
            let t = -0.5 + 0.1 * k as f64;
            AttitudeSample::new(Epoch::from_seconds_since_j2000(t), Quaternion::identity())
        })
        .collect()
}

/// Cross-track fan of `n` pixels in the spacecraft x-z plane, centered
/// on -x (nadir for the pass geometry above).
fn cross_track_sensor(name: &str, n: usize) -> LineSensor {
    let los: Vec<Vector3> = (0..n)
        .map(|i| {
            let offset = (i as f64 - (n as f64 - 1.0) / 2.0) * 1.0e-5;
            Vector3::new(-1.0, 0.0, offset).normalize()
        })
        .collect();
    LineSensor::new(
        name,
        Box::new(LinearLineDatation::new(Epoch::j2000(), 0.0, 1000.0)),
        Vector3::zeros(),
        los,
    )
}

fn cartesian(gp: &GeodeticPoint) -> Vector3 {
    pushloc::EllipsoidId::Wgs84.ellipsoid().to_cartesian(gp)
}

#[test]
fn test_leo_nadir_pixel_on_flat_dem() {
    let mut locator = PushbroomLocator::builder()
        .tile_updater(flat_updater(0.0))
        .transform_provider(Box::new(FrozenBody))
        .position_velocities(pass_ephemeris(7500.0), 2)
        .quaternions(steady_attitude(), 2)
        .light_time_correction(false)
        .aberration_of_light_correction(false)
        .build()
        .unwrap();
    locator.add_sensor(cross_track_sensor("line", 201));

    let ground = locator.direct_localization("line", 0.0).unwrap();
    assert_eq!(ground.len(), 201);
    let center = ground[100];
    let offset = cartesian(&center).distance(&Vector3::new(WGS84_A, 0.0, 0.0));
    assert!(
        offset < 0.01,
        "nadir pixel {} m away from (0, 0, 0)",
        offset
    );

    // neighboring pixels spread cross-track (along z), about 7 m apart
    let spread = cartesian(&ground[101]).distance(&cartesian(&ground[100]));
    assert!((spread - 7.0).abs() < 0.5, "pixel spacing {} m", spread);
}

#[test]
fn test_aberration_of_light_offset() {
    let velocity = 7500.0;
    let build = |aberration: bool| {
        let mut locator = PushbroomLocator::builder()
            .algorithm(AlgorithmId::IgnoreDemUseEllipsoid)
            .transform_provider(Box::new(FrozenBody))
            .position_velocities(pass_ephemeris(velocity), 2)
            .quaternions(steady_attitude(), 2)
            .light_time_correction(false)
            .aberration_of_light_correction(aberration)
            .build()
            .unwrap();
        locator.add_sensor(cross_track_sensor("line", 3));
        locator
    };

    let plain = build(false).direct_localization("line", 0.0).unwrap()[1];
    let corrected = build(true).direct_localization("line", 0.0).unwrap()[1];

    let offset = cartesian(&corrected).distance(&cartesian(&plain));
    let expected = ALTITUDE * velocity / SPEED_OF_LIGHT;
    assert!(
        (offset - expected).abs() < 0.15 * expected,
        "aberration ground offset {} m, expected about {} m",
        offset,
        expected
    );
    // deflection is toward the velocity (+y, increasing longitude)
    assert!(
        corrected.longitude > plain.longitude,
        "aberration must deflect toward the spacecraft velocity"
    );
}

#[test]
fn test_light_time_offset_on_rotating_body() {
    let omega = 7.292_115e-5;
    let build = |light_time: bool| {
        let mut locator = PushbroomLocator::builder()
            .algorithm(AlgorithmId::IgnoreDemUseEllipsoid)
            .transform_provider(Box::new(SpinningBody { omega }))
            .position_velocities(pass_ephemeris(0.0), 2)
            .quaternions(steady_attitude(), 2)
            .light_time_correction(light_time)
            .aberration_of_light_correction(false)
            .build()
            .unwrap();
        locator.add_sensor(cross_track_sensor("line", 3));
        locator
    };

    let plain = build(false).direct_localization("line", 0.0).unwrap()[1];
    let corrected = build(true).direct_localization("line", 0.0).unwrap()[1];

    // the body frame is rewound by the light travel time: the reported
    // point moves by omega * (altitude / c) in longitude
    let expected = omega * (ALTITUDE / SPEED_OF_LIGHT) * WGS84_A;
    let shift = (corrected.longitude - plain.longitude) * WGS84_A;
    assert!(
        (shift.abs() - expected).abs() < 0.25 * expected,
        "light-time longitude shift {} m, expected about {} m",
        shift,
        expected
    );
    assert!(shift > 0.0, "rewinding the body rotation shifts eastward");
}

#[test]
fn test_dem_hill_oblique_grazing() {
    let hill_lat = 0.0;
    let hill_lon = 0.005;
    let peak = 1000.0;
    let mut locator = PushbroomLocator::builder()
        .tile_updater(hill_updater(hill_lat, hill_lon, peak))
        .transform_provider(Box::new(FrozenBody))
        .position_velocities(pass_ephemeris(0.0), 2)
        .quaternions(steady_attitude(), 2)
        .light_time_correction(false)
        .aberration_of_light_correction(false)
        .build()
        .unwrap();

    // oblique sensor aimed at the hill flank: fan tilted toward +y
    let los: Vec<Vector3> = (0..3)
        .map(|i| {
            let offset = (i as f64 - 1.0) * 1.0e-5;
            Vector3::new(-1.0, 0.0455, offset).normalize()
        })
        .collect();
    locator.add_sensor(
        LineSensor::new(
            "oblique",
            Box::new(LinearLineDatation::new(Epoch::j2000(), 0.0, 1000.0)),
            Vector3::zeros(),
            los,
        )
        .with_mean_plane_normal(Vector3::y_axis()),
    );

    let hit = locator.direct_localization("oblique", 0.0).unwrap()[1];
    assert!(
        hit.altitude > 100.0,
        "ray should strike the hill, landed at {} m",
        hit.altitude
    );
    // illuminated (near) side of the hill, between sensor and peak
    assert!(
        hit.longitude < hill_lon,
        "hit {} is beyond the peak",
        hit.longitude
    );

    // the reported altitude lies on the bilinear surface of the DEM
    let mut reference = Tile::new();
    hill_updater(hill_lat, hill_lon, peak)
        .update_tile(hit.latitude, hit.longitude, &mut reference)
        .unwrap();
    reference.tile_update_completed().unwrap();
    let surface = reference
        .interpolate_elevation(hit.latitude, hit.longitude)
        .unwrap();
    assert!(
        (hit.altitude - surface).abs() < 1.0,
        "altitude {} off the bilinear surface {}",
        hit.altitude,
        surface
    );
}

#[test]
fn test_direct_inverse_roundtrip() {
    let omega = 7.292_115e-5;
    let mut locator = PushbroomLocator::builder()
        .tile_updater(flat_updater(0.0))
        .transform_provider(Box::new(SpinningBody { omega }))
        .position_velocities(pass_ephemeris(7500.0), 2)
        .quaternions(steady_attitude(), 2)
        .build()
        .unwrap();
    locator.add_sensor(cross_track_sensor("line", 201));

    let line = 100.0;
    let ground = locator.direct_localization("line", line).unwrap();
    for &pixel in &[0usize, 57, 100, 143, 200] {
        let found = locator
            .inverse_localization("line", &ground[pixel], line - 1.0, line + 1.0)
            .unwrap()
            .unwrap_or_else(|| panic!("pixel {} not recovered", pixel));
        assert!(
            (found.line - line).abs() < 1e-6,
            "pixel {}: line {} instead of {}",
            pixel,
            found.line,
            line
        );
        assert!(
            (found.pixel - pixel as f64).abs() < 1e-3,
            "pixel {}: pixel {} instead of {}",
            pixel,
            found.pixel,
            pixel
        );
    }
}

#[test]
fn test_inverse_then_direct_lands_nearby() {
    let mut locator = PushbroomLocator::builder()
        .tile_updater(flat_updater(0.0))
        .transform_provider(Box::new(FrozenBody))
        .position_velocities(pass_ephemeris(7500.0), 2)
        .quaternions(steady_attitude(), 2)
        .build()
        .unwrap();
    locator.add_sensor(cross_track_sensor("line", 201));

    // an arbitrary ground point inside the swath
    let target = GeodeticPoint::new(3.0e-5, 1.2e-4, 0.0);
    let found = locator
        .inverse_localization("line", &target, 0.0, 200.0)
        .unwrap()
        .expect("target is inside the swath");

    let ground = locator
        .direct_localization("line", found.line)
        .unwrap();
    let landed = ground[found.pixel.round() as usize];
    let miss = cartesian(&landed).distance(&cartesian(&target));
    // within one pixel footprint (about 7 m ground sample distance)
    assert!(miss < 3.5, "direct(inverse(g)) missed by {} m", miss);
}

#[test]
fn test_inverse_localization_out_of_range_returns_none() {
    let mut locator = PushbroomLocator::builder()
        .tile_updater(flat_updater(0.0))
        .transform_provider(Box::new(FrozenBody))
        .position_velocities(pass_ephemeris(7500.0), 2)
        .quaternions(steady_attitude(), 2)
        .build()
        .unwrap();
    locator.add_sensor(cross_track_sensor("line", 201));

    // 10 km down-track: overflown near line 1333, far outside [0, 100]
    let ahead = GeodeticPoint::new(0.0, 10_000.0 / WGS84_A, 0.0);
    let result = locator
        .inverse_localization("line", &ahead, 0.0, 100.0)
        .unwrap();
    assert!(result.is_none(), "point outside the range must give None");
}

#[test]
fn test_unknown_sensor() {
    let mut locator = PushbroomLocator::builder()
        .algorithm(AlgorithmId::IgnoreDemUseEllipsoid)
        .transform_provider(Box::new(FrozenBody))
        .position_velocities(pass_ephemeris(7500.0), 2)
        .quaternions(steady_attitude(), 2)
        .build()
        .unwrap();
    let result = locator.direct_localization("missing", 0.0);
    assert!(matches!(result, Err(LocError::UnknownSensor { .. })));
}

#[test]
fn test_ignore_dem_matches_flat_dem() {
    // with a flat DEM at zero elevation, the Duvenhage and the
    // ellipsoid-only algorithms must agree to well under a millimetre
    let build = |id: AlgorithmId| {
        let mut locator = PushbroomLocator::builder()
            .tile_updater(flat_updater(0.0))
            .algorithm(id)
            .transform_provider(Box::new(FrozenBody))
            .position_velocities(pass_ephemeris(7500.0), 2)
            .quaternions(steady_attitude(), 2)
            .light_time_correction(false)
            .aberration_of_light_correction(false)
            .build()
            .unwrap();
        locator.add_sensor(cross_track_sensor("line", 11));
        locator
    };

    let dem = build(AlgorithmId::Duvenhage)
        .direct_localization("line", 0.0)
        .unwrap();
    let bare = build(AlgorithmId::IgnoreDemUseEllipsoid)
        .direct_localization("line", 0.0)
        .unwrap();
    for (a, b) in dem.iter().zip(bare.iter()) {
        assert!(
            cartesian(a).distance(&cartesian(b)) < 1e-3,
            "{} vs {}",
            a,
            b
        );
    }
}

#[test]
fn test_out_of_time_range_surfaces() {
    let mut locator = PushbroomLocator::builder()
        .algorithm(AlgorithmId::IgnoreDemUseEllipsoid)
        .transform_provider(Box::new(FrozenBody))
        .position_velocities(pass_ephemeris(7500.0), 2)
        .quaternions(steady_attitude(), 2)
        .build()
        .unwrap();
    locator.add_sensor(cross_track_sensor("line", 3));

    // line 100000 dates 100 s after J2000, outside the ephemeris span
    let result = locator.direct_localization("line", 100_000.0);
    assert!(matches!(result, Err(LocError::OutOfTimeRange { .. })));
}
