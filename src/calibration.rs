//! Cross-sensor radiometric calibration.
//!
//! Thresholds of the classifiers were fitted against LANDSAT ETM reflectance.
//! SPOT HRG and SENTINEL2 MSI bands are mapped onto that space before any
//! test is applied, LANDSAT 4/5/7 and LANDSAT 8 values are used as they are.

use crate::sensor::{Band, Sensor};

/// Affine mapping `value * scale + offset`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Affine {
  pub scale: f64,
  pub offset: f64,
}

impl Affine {
  pub const IDENTITY: Affine = Affine { scale: 1.0, offset: 0.0 };

  const fn ratio(scale: f64) -> Affine {
    Affine { scale, offset: 0.0 }
  }

  pub fn apply(&self, value: f64) -> f64 {
    value * self.scale + self.offset
  }

  pub fn invert(&self, value: f64) -> f64 {
    (value - self.offset) / self.scale
  }
}

// SPOT HRG to ETM band ratios
const HRG_TO_ETM_GREEN: Affine = Affine::ratio(1.086);
const HRG_TO_ETM_RED: Affine = Affine::ratio(0.926);
const HRG_TO_ETM_NIR: Affine = Affine::ratio(0.998);
const HRG_TO_ETM_SWIR: Affine = Affine::ratio(0.983);

// SENTINEL2 MSI to ETM regression (Flood 2017)
const MSI_TO_ETM_BLUE: Affine = Affine { scale: 0.9551, offset: -0.0022 };
const MSI_TO_ETM_GREEN: Affine = Affine { scale: 1.0582, offset: 0.0031 };
const MSI_TO_ETM_RED: Affine = Affine { scale: 0.9871, offset: 0.0064 };
const MSI_TO_ETM_NIR: Affine = Affine { scale: 1.0187, offset: 0.0120 };
const MSI_TO_ETM_SWIR: Affine = Affine { scale: 0.9528, offset: 0.0079 };
const MSI_TO_ETM_SWIR2: Affine = Affine { scale: 0.9688, offset: -0.0042 };

pub fn coefficients(sensor: Sensor, band: Band) -> Affine {
  match sensor {
    Sensor::Landsat | Sensor::Landsat8 => Affine::IDENTITY,
    Sensor::Spot => match band {
      Band::Green => HRG_TO_ETM_GREEN,
      Band::Red => HRG_TO_ETM_RED,
      Band::Nir => HRG_TO_ETM_NIR,
      Band::Swir => HRG_TO_ETM_SWIR,
      // not recorded by HRG, never read for SPOT
      Band::Blue | Band::Swir2 => Affine::IDENTITY,
    },
    Sensor::Sentinel2 => match band {
      Band::Blue => MSI_TO_ETM_BLUE,
      Band::Green => MSI_TO_ETM_GREEN,
      Band::Red => MSI_TO_ETM_RED,
      Band::Nir => MSI_TO_ETM_NIR,
      Band::Swir => MSI_TO_ETM_SWIR,
      Band::Swir2 => MSI_TO_ETM_SWIR2,
    },
  }
}

/// Maps one native band value of `sensor` onto the reference reflectance space.
pub fn calibrate(raw: f64, sensor: Sensor, band: Band) -> f64 {
  match sensor {
    Sensor::Landsat | Sensor::Landsat8 => raw,
    _ => coefficients(sensor, band).apply(raw),
  }
}

pub fn uncalibrate(value: f64, sensor: Sensor, band: Band) -> f64 {
  match sensor {
    Sensor::Landsat | Sensor::Landsat8 => value,
    _ => coefficients(sensor, band).invert(value),
  }
}
