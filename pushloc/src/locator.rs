//! The localization facade: direct and inverse localization.

use crate::config::{AlgorithmId, BodyRotatingFrameId, EllipsoidId, InertialFrameId};
use crate::errors::{LocError, LocResult};
use crate::frames::{EarthRotationModel, TransformProvider};
use crate::sensor::{LineSensor, SensorPixel};
use crate::spacecraft::{AttitudeSample, PvSample, SpacecraftToBody};
use pushloc_core::constants::{HALF_PI, SPEED_OF_LIGHT};
use pushloc_core::{
    normalize_longitude, BracketingBrentSolver, Ellipsoid, GeodeticPoint, SolverError, Vector3,
};
use pushloc_intersection::{
    BasicScanAlgorithm, ConstantElevationAlgorithm, DuvenhageAlgorithm, IgnoreDemAlgorithm,
    IntersectionAlgorithm,
};
use pushloc_raster::TileUpdater;
use std::collections::HashMap;
use tracing::debug;

/// Accuracy of the coarse inverse-localization stage.
///
/// It only has to place the crossing within one line/pixel so the
/// surrounding quadrilateral can be built; there is no point in a
/// smaller value.
const COARSE_INVERSE_LOCATION_ACCURACY: f64 = 0.01;

/// Evaluation budget of each inverse-localization solve.
const MAX_EVAL: usize = 1000;

/// Geodetic localization engine for pushbroom line-sensor imagery.
///
/// Owns the reference ellipsoid, the spacecraft-to-body converter, the
/// registered sensors and the DEM intersection algorithm. One instance
/// per worker thread: the tile cache inside the algorithm mutates on
/// lookup, which is why [`direct_localization`](Self::direct_localization)
/// takes `&mut self`.
pub struct PushbroomLocator {
    ellipsoid: Ellipsoid,
    sc_to_body: SpacecraftToBody,
    sensors: HashMap<String, LineSensor>,
    algorithm: Box<dyn IntersectionAlgorithm>,
    light_time_correction: bool,
    aberration_of_light_correction: bool,
}

impl PushbroomLocator {
    /// Starts configuring a locator.
    pub fn builder() -> PushbroomLocatorBuilder {
        PushbroomLocatorBuilder::new()
    }

    /// Registers a line sensor under its name.
    pub fn add_sensor(&mut self, sensor: LineSensor) {
        self.sensors.insert(sensor.name().to_string(), sensor);
    }

    /// Enables or disables the compensation of light travel time
    /// between ground and spacecraft. On by default; disabling it is
    /// mainly useful for validation against systems that do not
    /// compensate it.
    pub fn set_light_time_correction(&mut self, enabled: bool) {
        self.light_time_correction = enabled;
    }

    pub fn is_light_time_corrected(&self) -> bool {
        self.light_time_correction
    }

    /// Enables or disables the aberration of light correction (velocity
    /// composition between light and spacecraft). On by default;
    /// disable it when the pixel lines of sight already include it.
    pub fn set_aberration_of_light_correction(&mut self, enabled: bool) {
        self.aberration_of_light_correction = enabled;
    }

    pub fn is_aberration_of_light_corrected(&self) -> bool {
        self.aberration_of_light_correction
    }

    pub fn ellipsoid(&self) -> &Ellipsoid {
        &self.ellipsoid
    }

    fn sensor(&self, name: &str) -> LocResult<&LineSensor> {
        self.sensors
            .get(name)
            .ok_or_else(|| LocError::unknown_sensor(name))
    }

    /// Direct localization of a full sensor line: the ground position
    /// of every pixel of `sensor_name` at (fractional) line number
    /// `line`.
    pub fn direct_localization(
        &mut self,
        sensor_name: &str,
        line: f64,
    ) -> LocResult<Vec<GeodeticPoint>> {
        let sensor = self
            .sensors
            .get(sensor_name)
            .ok_or_else(|| LocError::unknown_sensor(sensor_name))?;
        localize_line(
            &self.ellipsoid,
            &self.sc_to_body,
            sensor,
            self.algorithm.as_mut(),
            0,
            sensor.nb_pixels(),
            line,
            self.light_time_correction,
            self.aberration_of_light_correction,
        )
    }

    /// Inverse localization of a ground point: the (fractional) sensor
    /// line and pixel observing `ground`, searched over
    /// `[min_line, max_line]`, or `None` when the point is not seen in
    /// that range.
    pub fn inverse_localization(
        &self,
        sensor_name: &str,
        ground: &GeodeticPoint,
        min_line: f64,
        max_line: f64,
    ) -> LocResult<Option<SensorPixel>> {
        let sensor = self.sensor(sensor_name)?;
        let nb_pixels = sensor.nb_pixels();
        let target = self.ellipsoid.to_cartesian(ground);
        let solver = BracketingBrentSolver::new(COARSE_INVERSE_LOCATION_ACCURACY);

        // stage 1: the line at which the target crosses the sensor mean
        // plane
        let crossing = MeanPlaneCrossing {
            sc_to_body: &self.sc_to_body,
            sensor,
            target,
            light_time_correction: self.light_time_correction,
            aberration_of_light_correction: self.aberration_of_light_correction,
        };
        let coarse_line =
            match solver.solve(MAX_EVAL, |line| crossing.value(line), min_line, max_line) {
                Ok(line) => line,
                Err(SolverError::NoBracketing { .. }) => return Ok(None),
                Err(SolverError::TooManyEvaluations { max }) => {
                    return Err(LocError::TooManyEvaluations { max })
                }
                Err(SolverError::Function(e)) => return Err(e),
            };

        // stage 2: the pixel along that line
        let target_direction = crossing.target_direction(coarse_line)?;
        let cross = sensor
            .mean_plane_normal()
            .cross(&target_direction)
            .normalize();
        let pixel_value = |x: f64| -> LocResult<f64> {
            Ok(cross.angle(&sensor.interpolated_los(x)) - HALF_PI)
        };
        let coarse_pixel = match solver.solve(MAX_EVAL, pixel_value, -1.0, nb_pixels as f64) {
            Ok(pixel) => pixel,
            Err(SolverError::NoBracketing { .. }) => return Ok(None),
            Err(SolverError::TooManyEvaluations { max }) => {
                return Err(LocError::TooManyEvaluations { max })
            }
            Err(SolverError::Function(e)) => return Err(e),
        };

        // stage 3: bilinear refinement over the quadrilateral built by
        // localizing the two surrounding pixels on the two surrounding
        // lines, at the ground point's altitude
        let line_inf = libm::floor(coarse_line);
        let pixel_inf = (libm::floor(coarse_pixel).max(0.0) as usize).min(nb_pixels - 2);
        let mut at_altitude = ConstantElevationAlgorithm::new(ground.altitude);
        let previous = localize_line(
            &self.ellipsoid,
            &self.sc_to_body,
            sensor,
            &mut at_altitude,
            pixel_inf,
            pixel_inf + 2,
            line_inf,
            self.light_time_correction,
            self.aberration_of_light_correction,
        )?;
        let next = localize_line(
            &self.ellipsoid,
            &self.sc_to_body,
            sensor,
            &mut at_altitude,
            pixel_inf,
            pixel_inf + 2,
            line_inf + 1.0,
            self.light_time_correction,
            self.aberration_of_light_correction,
        )?;

        // unwrap every longitude against the target's before solving,
        // so quadrilaterals straddling the antimeridian stay continuous
        let lon = |gp: &GeodeticPoint| normalize_longitude(gp.longitude, ground.longitude);
        let (u, v) = interpolation_coordinates(
            ground.longitude,
            ground.latitude,
            lon(&previous[0]),
            previous[0].latitude,
            lon(&previous[1]),
            previous[1].latitude,
            lon(&next[0]),
            next[0].latitude,
            lon(&next[1]),
            next[1].latitude,
        )?;

        let pixel = pixel_inf as f64 + u;
        if !(-1.0..=nb_pixels as f64).contains(&pixel) {
            return Err(LocError::GroundPointOutOfColumnRange {
                expected: pixel,
                min: -1,
                max: nb_pixels as i64,
            });
        }
        Ok(Some(SensorPixel::new(line_inf + v, pixel)))
    }
}

/// Direct localization of pixels `[start, end)` of one sensor line.
#[allow(clippy::too_many_arguments)]
fn localize_line(
    ellipsoid: &Ellipsoid,
    sc_to_body: &SpacecraftToBody,
    sensor: &LineSensor,
    algorithm: &mut dyn IntersectionAlgorithm,
    start: usize,
    end: usize,
    line: f64,
    light_time_correction: bool,
    aberration_of_light_correction: bool,
) -> LocResult<Vec<GeodeticPoint>> {
    let date = sensor.date(line);
    let sc_to_inert = sc_to_body.sc_to_inertial(date)?;
    let inert_to_body = sc_to_body.inertial_to_body(date)?;
    // spacecraft -> body, without any light-time shift
    let approximate = sc_to_inert.compose(&inert_to_body);

    let spacecraft_velocity = *sc_to_inert.velocity();
    let p_inert = sc_to_inert.transform_position(sensor.position());

    let mut ground_points = Vec::with_capacity(end - start);
    for i in start..end {
        let raw_l_inert = sc_to_inert.transform_vector(&sensor.los(i));
        let l_inert = if aberration_of_light_correction {
            // the spacecraft velocity is small with respect to the speed
            // of light, so classical velocity composition is enough
            Vector3::linear_combination(SPEED_OF_LIGHT, &raw_l_inert, 1.0, &spacecraft_velocity)
                .normalize()
        } else {
            raw_l_inert
        };

        let gp = if light_time_correction {
            // two-pass light time compensation: a coarse ellipsoid
            // intersection fixes the delay, the DEM intersection runs
            // with the body frame rewound by it, and a second, refined
            // delay polishes the result
            let s_p = approximate.transform_position(sensor.position());
            let s_l = approximate.transform_vector(&sensor.los(i));
            let e_p1 = ellipsoid.to_cartesian(
                &ellipsoid
                    .point_on_ground(&s_p, &s_l, 0.0, 0.0)?
                    .to_geodetic(),
            );
            let delta_t1 = e_p1.distance(&s_p) / SPEED_OF_LIGHT;
            let shifted1 = inert_to_body.shifted_by(-delta_t1);
            let gp1 = algorithm.intersection(
                ellipsoid,
                &shifted1.transform_position(&p_inert),
                &shifted1.transform_vector(&l_inert),
            )?;

            let e_p2 = ellipsoid.to_cartesian(&gp1.to_geodetic());
            let delta_t2 = e_p2.distance(&s_p) / SPEED_OF_LIGHT;
            let shifted2 = inert_to_body.shifted_by(-delta_t2);
            algorithm.refine_intersection(
                ellipsoid,
                &shifted2.transform_position(&p_inert),
                &shifted2.transform_vector(&l_inert),
                &gp1,
            )?
        } else {
            let p_body = inert_to_body.transform_position(&p_inert);
            let l_body = inert_to_body.transform_vector(&l_inert);
            let first = algorithm.intersection(ellipsoid, &p_body, &l_body)?;
            algorithm.refine_intersection(ellipsoid, &p_body, &l_body, &first)?
        };
        ground_points.push(gp.to_geodetic());
    }
    Ok(ground_points)
}

/// Finds the sensor line at which a ground target crosses the sensor
/// mean plane.
struct MeanPlaneCrossing<'a> {
    sc_to_body: &'a SpacecraftToBody,
    sensor: &'a LineSensor,
    target: Vector3,
    light_time_correction: bool,
    aberration_of_light_correction: bool,
}

impl MeanPlaneCrossing<'_> {
    /// Signed angular offset of the target from the mean plane; zero at
    /// the crossing.
    fn value(&self, line: f64) -> LocResult<f64> {
        let direction = self.target_direction(line)?;
        Ok(direction.angle(self.sensor.mean_plane_normal()) - HALF_PI)
    }

    /// Direction from the sensor to the target, in the spacecraft
    /// frame, with the same corrections the direct path applies.
    fn target_direction(&self, line: f64) -> LocResult<Vector3> {
        let date = self.sensor.date(line);
        let sc_to_inert = self.sc_to_body.sc_to_inertial(date)?;
        let body_to_inert = self.sc_to_body.inertial_to_body(date)?.inverse();
        let ref_inert = sc_to_inert.transform_position(self.sensor.position());

        let target_inert = if self.light_time_correction {
            let coarse = body_to_inert.transform_position(&self.target);
            let delta_t = ref_inert.distance(&coarse) / SPEED_OF_LIGHT;
            body_to_inert
                .shifted_by(-delta_t)
                .transform_position(&self.target)
        } else {
            body_to_inert.transform_position(&self.target)
        };

        let l_inert = (target_inert - ref_inert).normalize();
        let raw_l_inert = if self.aberration_of_light_correction {
            // inverse of the direct-path composition: remove the
            // spacecraft velocity from the apparent direction
            let velocity = *sc_to_inert.velocity();
            Vector3::linear_combination(SPEED_OF_LIGHT, &l_inert, -1.0, &velocity).normalize()
        } else {
            l_inert
        };

        Ok(sc_to_inert.inverse().transform_vector(&raw_l_inert))
    }
}

/// Bilinear interpolation coordinates of point `(x, y)` inside the
/// quadrilateral `A(xa, ya) B(xb, yb) C(xc, yc) D(xd, yd)`, where `u`
/// runs from A to B (and C to D) and `v` from A to C (and B to D).
///
/// Solves `P = A + u (B - A) + v (C - A) + u v (A - B - C + D)` exactly
/// through the quadratic in `u`; the quadrilateral is generally not a
/// rectangle, which is the whole reason this exists.
#[allow(clippy::too_many_arguments)]
fn interpolation_coordinates(
    x: f64,
    y: f64,
    xa: f64,
    ya: f64,
    xb: f64,
    yb: f64,
    xc: f64,
    yc: f64,
    xd: f64,
    yd: f64,
) -> LocResult<(f64, f64)> {
    let cross = |px: f64, py: f64, qx: f64, qy: f64| px * qy - py * qx;

    let (ex, ey) = (xb - xa, yb - ya);
    let (fx, fy) = (xc - xa, yc - ya);
    let (gx, gy) = (xa - xb - xc + xd, ya - yb - yc + yd);
    let (hx, hy) = (x - xa, y - ya);

    let a2 = cross(ex, ey, gx, gy);
    let b1 = cross(ex, ey, fx, fy) - cross(hx, hy, gx, gy);
    let c0 = -cross(hx, hy, fx, fy);

    let v_for = |u: f64| -> f64 {
        let dx = fx + u * gx;
        let dy = fy + u * gy;
        if dx.abs() >= dy.abs() {
            (hx - u * ex) / dx
        } else {
            (hy - u * ey) / dy
        }
    };
    // distance from the unit box, for picking among roots
    let overshoot = |w: f64| {
        if w < 0.0 {
            -w
        } else if w > 1.0 {
            w - 1.0
        } else {
            0.0
        }
    };

    let mut candidates: Vec<(f64, f64)> = Vec::with_capacity(2);
    if a2.abs() <= 1e-12 * b1.abs() {
        if b1 == 0.0 {
            return Err(LocError::internal("degenerate interpolation quadrilateral"));
        }
        let u = -c0 / b1;
        candidates.push((u, v_for(u)));
    } else {
        let discriminant = b1 * b1 - 4.0 * a2 * c0;
        if discriminant < 0.0 {
            return Err(LocError::internal("interpolation quadrilateral inversion"));
        }
        let q = -0.5 * (b1 + libm::sqrt(discriminant).copysign(b1));
        let u1 = q / a2;
        candidates.push((u1, v_for(u1)));
        if q != 0.0 {
            let u2 = c0 / q;
            candidates.push((u2, v_for(u2)));
        }
    }

    candidates.retain(|(u, v)| u.is_finite() && v.is_finite());
    candidates
        .into_iter()
        .min_by(|(u1, v1), (u2, v2)| {
            let d1 = overshoot(*u1) + overshoot(*v1);
            let d2 = overshoot(*u2) + overshoot(*v2);
            d1.partial_cmp(&d2).unwrap_or(std::cmp::Ordering::Equal)
        })
        .ok_or_else(|| LocError::internal("interpolation quadrilateral inversion"))
}

/// Step-by-step configuration of a [`PushbroomLocator`].
///
/// Light time and aberration of light corrections default to on.
pub struct PushbroomLocatorBuilder {
    updater: Option<Box<dyn TileUpdater>>,
    max_cached_tiles: usize,
    algorithm_id: AlgorithmId,
    ellipsoid_id: EllipsoidId,
    inertial_frame_id: InertialFrameId,
    body_frame_id: BodyRotatingFrameId,
    transform_provider: Option<Box<dyn TransformProvider>>,
    pv_samples: Vec<PvSample>,
    pv_order: usize,
    attitude_samples: Vec<AttitudeSample>,
    attitude_order: usize,
    light_time_correction: bool,
    aberration_of_light_correction: bool,
}

impl PushbroomLocatorBuilder {
    fn new() -> Self {
        Self {
            updater: None,
            max_cached_tiles: 8,
            algorithm_id: AlgorithmId::Duvenhage,
            ellipsoid_id: EllipsoidId::Wgs84,
            inertial_frame_id: InertialFrameId::Eme2000,
            body_frame_id: BodyRotatingFrameId::Itrf,
            transform_provider: None,
            pv_samples: Vec::new(),
            pv_order: 4,
            attitude_samples: Vec::new(),
            attitude_order: 4,
            light_time_correction: true,
            aberration_of_light_correction: true,
        }
    }

    /// The callback loading DEM tiles on demand. Required unless the
    /// algorithm ignores the DEM.
    pub fn tile_updater(mut self, updater: Box<dyn TileUpdater>) -> Self {
        self.updater = Some(updater);
        self
    }

    /// Bound of the tile cache (default 8).
    pub fn max_cached_tiles(mut self, max: usize) -> Self {
        self.max_cached_tiles = max;
        self
    }

    /// DEM intersection algorithm (default Duvenhage).
    pub fn algorithm(mut self, id: AlgorithmId) -> Self {
        self.algorithm_id = id;
        self
    }

    /// Reference ellipsoid preset (default WGS84).
    pub fn ellipsoid(mut self, id: EllipsoidId) -> Self {
        self.ellipsoid_id = id;
        self
    }

    /// Inertial frame preset (default EME2000).
    pub fn inertial_frame(mut self, id: InertialFrameId) -> Self {
        self.inertial_frame_id = id;
        self
    }

    /// Body rotating frame preset (default ITRF).
    pub fn body_rotating_frame(mut self, id: BodyRotatingFrameId) -> Self {
        self.body_frame_id = id;
        self
    }

    /// Replaces the embedded frame model with an exact external one.
    pub fn transform_provider(mut self, provider: Box<dyn TransformProvider>) -> Self {
        self.transform_provider = Some(provider);
        self
    }

    /// Satellite position/velocity samples and interpolation order.
    pub fn position_velocities(mut self, samples: Vec<PvSample>, order: usize) -> Self {
        self.pv_samples = samples;
        self.pv_order = order;
        self
    }

    /// Satellite attitude quaternion samples and interpolation order.
    pub fn quaternions(mut self, samples: Vec<AttitudeSample>, order: usize) -> Self {
        self.attitude_samples = samples;
        self.attitude_order = order;
        self
    }

    pub fn light_time_correction(mut self, enabled: bool) -> Self {
        self.light_time_correction = enabled;
        self
    }

    pub fn aberration_of_light_correction(mut self, enabled: bool) -> Self {
        self.aberration_of_light_correction = enabled;
        self
    }

    /// Builds the locator, failing with
    /// [`UninitializedContext`](LocError::UninitializedContext) when a
    /// required piece is missing.
    pub fn build(self) -> LocResult<PushbroomLocator> {
        let algorithm: Box<dyn IntersectionAlgorithm> = match self.algorithm_id {
            AlgorithmId::IgnoreDemUseEllipsoid => Box::new(IgnoreDemAlgorithm::new()),
            id => {
                let updater = self
                    .updater
                    .ok_or_else(|| LocError::uninitialized("tile updater"))?;
                match id {
                    AlgorithmId::Duvenhage => {
                        Box::new(DuvenhageAlgorithm::new(updater, self.max_cached_tiles, false))
                    }
                    AlgorithmId::DuvenhageFlatBody => {
                        Box::new(DuvenhageAlgorithm::new(updater, self.max_cached_tiles, true))
                    }
                    AlgorithmId::BasicSlowExhaustiveScanForTestsOnly => {
                        Box::new(BasicScanAlgorithm::new(updater, self.max_cached_tiles))
                    }
                    AlgorithmId::IgnoreDemUseEllipsoid => unreachable!(),
                }
            }
        };

        let provider = self
            .transform_provider
            .unwrap_or_else(|| {
                Box::new(EarthRotationModel::new(
                    self.inertial_frame_id,
                    self.body_frame_id,
                ))
            });
        let sc_to_body = SpacecraftToBody::new(
            provider,
            self.pv_samples,
            self.pv_order,
            self.attitude_samples,
            self.attitude_order,
        )?;

        debug!(
            algorithm = ?self.algorithm_id,
            ellipsoid = ?self.ellipsoid_id,
            max_cached_tiles = self.max_cached_tiles,
            "building pushbroom locator"
        );
        Ok(PushbroomLocator {
            ellipsoid: self.ellipsoid_id.ellipsoid(),
            sc_to_body,
            sensors: HashMap::new(),
            algorithm,
            light_time_correction: self.light_time_correction,
            aberration_of_light_correction: self.aberration_of_light_correction,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interpolation_coordinates_rectangle() {
        // unit square: coordinates are the point itself
        let (u, v) =
            interpolation_coordinates(0.25, 0.75, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 1.0, 1.0)
                .unwrap();
        assert!((u - 0.25).abs() < 1e-12);
        assert!((v - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_interpolation_coordinates_skewed() {
        // non-rectangular quadrilateral: verify by forward evaluation
        let (xa, ya) = (0.0, 0.0);
        let (xb, yb) = (1.0, 0.1);
        let (xc, yc) = (0.15, 0.9);
        let (xd, yd) = (1.2, 1.05);
        let (u0, v0) = (0.3, 0.6);
        let x = xa * (1.0 - u0) * (1.0 - v0)
            + xb * u0 * (1.0 - v0)
            + xc * (1.0 - u0) * v0
            + xd * u0 * v0;
        let y = ya * (1.0 - u0) * (1.0 - v0)
            + yb * u0 * (1.0 - v0)
            + yc * (1.0 - u0) * v0
            + yd * u0 * v0;
        let (u, v) =
            interpolation_coordinates(x, y, xa, ya, xb, yb, xc, yc, xd, yd).unwrap();
        assert!((u - u0).abs() < 1e-10, "u = {}", u);
        assert!((v - v0).abs() < 1e-10, "v = {}", v);
    }

    #[test]
    fn test_interpolation_coordinates_parallelogram() {
        // parallelogram: the uv cross term vanishes, linear path
        let (u, v) =
            interpolation_coordinates(0.6, 0.5, 0.0, 0.0, 1.0, 0.2, 0.1, 1.0, 1.1, 1.2)
                .unwrap();
        let x = (1.0 - u) * (1.0 - v) * 0.0 + u * (1.0 - v) * 1.0 + (1.0 - u) * v * 0.1
            + u * v * 1.1;
        let y = (1.0 - u) * (1.0 - v) * 0.0 + u * (1.0 - v) * 0.2 + (1.0 - u) * v * 1.0
            + u * v * 1.2;
        assert!((x - 0.6).abs() < 1e-10);
        assert!((y - 0.5).abs() < 1e-10);
    }

    #[test]
    fn test_builder_requires_updater_for_dem_algorithms() {
        let result = PushbroomLocator::builder().build();
        assert!(matches!(
            result,
            Err(LocError::UninitializedContext { .. })
        ));
    }

    #[test]
    fn test_builder_requires_samples() {
        let result = PushbroomLocator::builder()
            .algorithm(AlgorithmId::IgnoreDemUseEllipsoid)
            .build();
        assert!(matches!(
            result,
            Err(LocError::UninitializedContext { .. })
        ));
    }
}
