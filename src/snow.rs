//! Snow mask generation.
//!
//! Bright snow is picked out of uncalibrated reflectance (scaled by 1000)
//! and then checked against a DEM: surf and turbid estuary water look like
//! snow or bright land but only occur near sea level. The result is the
//! snow mask the water classification reads.

use std::fmt;

use crate::class::ClassEntry;
use crate::water::Reflectance;

// Snow never lies this low; such pixels are breaking surf
pub const SNOW_MIN_ELEVATION: f64 = 150.0;
pub const ESTUARY_MAX_ELEVATION: f64 = 50.0;

const SNOW_MIN_RED: f64 = 250.0;
const SNOW_MIN_NIR_EXCESS: f64 = 200.0;
const SNOW_MAX_SWIR: f64 = 100.0;
const ESTUARY_MIN_VSBAR: f64 = 100.0;
const ESTUARY_MIN_SWIR_DROP: f64 = 0.6;

/// Codes of the snow mask raster.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SnowClass {
  Undefined = 0,
  Snow = 1,
  BrightCoastalWater = 2,
  Other = 3,
}

impl SnowClass {
  pub const ALL: [SnowClass; 4] =
    [SnowClass::Undefined, SnowClass::Snow, SnowClass::BrightCoastalWater, SnowClass::Other];

  pub fn code(self) -> u8 {
    self as u8
  }

  pub fn from_code(code: u8) -> Option<SnowClass> {
    SnowClass::ALL.get(code as usize).copied()
  }

  pub fn name(self) -> &'static str {
    match self {
      SnowClass::Undefined => "Undefined",
      SnowClass::Snow => "Snow",
      SnowClass::BrightCoastalWater => "Bright Coastal Water",
      SnowClass::Other => "Other",
    }
  }

  pub fn rgba(self) -> [u8; 4] {
    match self {
      SnowClass::Undefined => [0, 0, 0, 255],
      SnowClass::Snow => [255, 0, 255, 255],
      SnowClass::BrightCoastalWater => [160, 32, 240, 255],
      SnowClass::Other => [211, 211, 211, 255],
    }
  }

  pub fn legend() -> Vec<ClassEntry> {
    SnowClass::ALL
      .iter()
      .map(|class| ClassEntry { code: class.code(), name: class.name(), rgba: class.rgba() })
      .collect()
  }
}

impl fmt::Display for SnowClass {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.name())
  }
}

fn is_snow(raw: &Reflectance) -> bool {
  raw.red > SNOW_MIN_RED && raw.nir - raw.swir > SNOW_MIN_NIR_EXCESS && raw.swir < SNOW_MAX_SWIR
}

// Bright in the visible with a large drop into the SWIR
fn is_bright_estuary(raw: &Reflectance, vsbar: f64) -> bool {
  vsbar > ESTUARY_MIN_VSBAR && (vsbar - raw.swir) / vsbar > ESTUARY_MIN_SWIR_DROP
}

/// Snow mask code of one pixel from its valid-data mask code, DEM elevation
/// in metres and native band values. A NaN elevation never counts as low.
pub fn classify_snow(mask: u8, elevation: f64, raw: &Reflectance) -> SnowClass {
  let vsbar = raw.vsbar();
  if mask == 0 || vsbar <= 0.0 {
    return SnowClass::Undefined;
  }

  if is_snow(raw) {
    if elevation < SNOW_MIN_ELEVATION {
      SnowClass::BrightCoastalWater
    } else {
      SnowClass::Snow
    }
  } else if elevation < ESTUARY_MAX_ELEVATION && is_bright_estuary(raw, vsbar) {
    SnowClass::BrightCoastalWater
  } else {
    SnowClass::Other
  }
}
