//! Geodetic localization for pushbroom line-sensor imagery.
//!
//! Given a time-stamped ephemeris (position/velocity and attitude) of a
//! spacecraft carrying line sensors with known pixel lines of sight,
//! and a Digital Elevation Model supplied tile by tile through a
//! callback, [`PushbroomLocator`] answers the two dual questions of
//! image geolocation:
//!
//! - **direct localization**: where on the ground does each pixel of a
//!   given acquisition line look?
//! - **inverse localization**: which (fractional) line and pixel see a
//!   given ground point, if any, within a line range?
//!
//! Both account for light travel time between ground and spacecraft and
//! for the aberration of light induced by the spacecraft velocity; the
//! ground is a DEM with arbitrary relief, intersected by the Duvenhage
//! min/max tile traversal of the `pushloc-intersection` crate.
//!
//! ```no_run
//! use pushloc::{
//!     AlgorithmId, AttitudeSample, EllipsoidId, LinearLineDatation, LineSensor,
//!     PushbroomLocator, PvSample,
//! };
//! use pushloc_core::{Epoch, Vector3};
//!
//! # fn updater() -> Box<dyn pushloc_raster::TileUpdater> { unimplemented!() }
//! # fn ephemeris() -> Vec<PvSample> { unimplemented!() }
//! # fn attitudes() -> Vec<AttitudeSample> { unimplemented!() }
//! # fn main() -> Result<(), pushloc::LocError> {
//! let mut locator = PushbroomLocator::builder()
//!     .tile_updater(updater())
//!     .max_cached_tiles(8)
//!     .algorithm(AlgorithmId::Duvenhage)
//!     .ellipsoid(EllipsoidId::Wgs84)
//!     .position_velocities(ephemeris(), 6)
//!     .quaternions(attitudes(), 4)
//!     .build()?;
//!
//! let datation = LinearLineDatation::new(Epoch::j2000(), 0.0, 1000.0);
//! let los = (0..1000)
//!     .map(|i| Vector3::new(-1.0, 0.0, (i as f64 - 500.0) * 1e-5).normalize())
//!     .collect();
//! locator.add_sensor(LineSensor::new(
//!     "panchromatic",
//!     Box::new(datation),
//!     Vector3::zeros(),
//!     los,
//! ));
//!
//! let ground = locator.direct_localization("panchromatic", 4250.0)?;
//! let pixel = locator.inverse_localization("panchromatic", &ground[300], 4000.0, 4500.0)?;
//! # Ok(()) }
//! ```

mod config;
mod errors;
mod frames;
mod locator;
mod refraction;
mod sensor;
mod spacecraft;

pub use config::{AlgorithmId, BodyRotatingFrameId, EllipsoidId, InertialFrameId};
pub use errors::{LocError, LocResult};
pub use frames::{EarthRotationModel, TransformProvider, EARTH_ANGULAR_VELOCITY};
pub use locator::{PushbroomLocator, PushbroomLocatorBuilder};
pub use refraction::{AtmosphericRefraction, MultiLayerModel};
pub use sensor::{LineDatation, LineSensor, LinearLineDatation, SensorPixel};
pub use spacecraft::{AttitudeSample, PvSample, SpacecraftToBody};

pub use pushloc_core::{
    Ellipsoid, Epoch, GeodeticPoint, NormalizedGeodeticPoint, Quaternion, RotationMatrix3,
    Transform, Vector3,
};
pub use pushloc_intersection::IntersectionAlgorithm;
pub use pushloc_raster::{Tile, TileUpdater, TilesCache};
