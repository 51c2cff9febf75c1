use thiserror::Error;

use crate::calibration::calibrate;
use crate::class::LandClass;
use crate::sensor::{Band, Sensor};

// Below this NDVI a land pixel is definitely not vegetation
const NDVI_VEGETATED: f64 = 0.15;
// Herbaceous pixels below this NDVI are primarily bare
const NDVI_HERBACEOUS: f64 = 0.47;
// NIR brighter than SWIR by more than this fraction hints at vegetation on bare ground
const BARE_NIR_EXCESS: f64 = 0.05;

// (nir, swir, red) upper limits for woody vegetation
const WOODY_STRICT: (f64, f64, f64) = (0.36, 0.16, 0.055);
const WOODY_RELAXED: (f64, f64, f64) = (0.486, 0.17, 0.06);

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("ndvi divide by zero (nir + red == 0)")]
pub struct NdviUndefined;

/// Calibrated red, NIR and SWIR reflectance as fractions (0 - 1).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VegetationSample {
  pub red: f64,
  pub nir: f64,
  pub swir: f64,
}

impl VegetationSample {
  /// Builds the sample from stored integer reflectance (scaled by 1000).
  pub fn from_raw(red: u16, nir: u16, swir: u16, sensor: Sensor) -> VegetationSample {
    VegetationSample {
      red: calibrate(red as f64 / 1000.0, sensor, Band::Red),
      nir: calibrate(nir as f64 / 1000.0, sensor, Band::Nir),
      swir: calibrate(swir as f64 / 1000.0, sensor, Band::Swir),
    }
  }

  // Unlike the water test, a zero denominator is an error here
  pub fn ndvi(&self) -> Result<f64, NdviUndefined> {
    let sum = self.nir + self.red;
    if sum == 0.0 {
      return Err(NdviUndefined);
    }
    Ok((self.nir - self.red) / sum)
  }

  fn below(&self, limits: (f64, f64, f64)) -> bool {
    self.nir < limits.0 && self.swir < limits.1 && self.red < limits.2
  }
}

/// LCDB classes imaged as forest, mangroves or scrub.
pub fn is_woody_cover(lcdb: u8) -> bool {
  lcdb == 63 || lcdb > 64 || lcdb / 10 == 5
}

/// Refines a water/land classification into vegetation classes.
///
/// `lcdb` is only consulted for potentially vegetated land pixels that miss
/// the strict woody thresholds.
pub fn classify_vegetation(prior: LandClass, sample: &VegetationSample, lcdb: u8) -> Result<LandClass, NdviUndefined> {
  if prior == LandClass::Undefined {
    return Ok(prior);
  }

  let ndvi = sample.ndvi()?;

  let class = match prior {
    LandClass::Land => {
      let class = if ndvi < NDVI_VEGETATED {
        LandClass::Bare
      } else if sample.below(WOODY_STRICT) {
        LandClass::Woody
      } else if sample.below(WOODY_RELAXED) && is_woody_cover(lcdb) {
        LandClass::Woody
      } else {
        LandClass::Herbaceous
      };

      if class == LandClass::Herbaceous && ndvi < NDVI_HERBACEOUS {
        LandClass::PrimBare
      } else {
        class
      }
    }
    // bare ground is typically brighter in SWIR than NIR
    LandClass::Bare if sample.nir / sample.swir - 1.0 > BARE_NIR_EXCESS => LandClass::PrimBare,
    other => other,
  };

  Ok(class)
}
