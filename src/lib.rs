//! Land cover classification of multispectral imagery.
//!
//! A snow pass derives a snow mask from reflectance and a DEM. A
//! water/cloud/snow pass turns SPOT, LANDSAT or SENTINEL2 reflectance plus
//! cloud and snow masks into a class raster. A vegetation pass refines the
//! land classes of that raster into woody, herbaceous and bare ground, helped
//! by an aligned land cover database.

pub mod calibration;
pub mod class;
pub mod config;
pub mod error;
pub mod finish;
pub mod geo;
pub mod logger;
pub mod pipeline;
pub mod raster;
pub mod report;
pub mod scan;
pub mod sensor;
pub mod snow;
pub mod vegetation;
pub mod water;

pub use class::LandClass;
pub use error::{ClassifyError, Result};
pub use sensor::{Band, Sensor, SensorProfile};
