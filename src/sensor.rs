use std::fmt;

use crate::error::{ClassifyError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sensor {
  Spot,      // SPOT 4/5, 4 bands
  Landsat,   // LANDSAT 4/5/7, 6 bands
  Landsat8,  // LANDSAT 8, 7 bands
  Sentinel2, // SENTINEL 2, 10 bands
}

impl fmt::Display for Sensor {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      Sensor::Spot => "SPOT",
      Sensor::Landsat => "LANDSAT",
      Sensor::Landsat8 => "LANDSAT8",
      Sensor::Sentinel2 => "SENTINEL2",
    };
    write!(f, "{}", name)
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Band {
  Blue,
  Green,
  Red,
  Nir,
  Swir,
  Swir2,
}

impl Band {
  pub const ALL: [Band; 6] = [Band::Blue, Band::Green, Band::Red, Band::Nir, Band::Swir, Band::Swir2];

  fn slot(self) -> usize {
    self as usize
  }
}

impl fmt::Display for Band {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      Band::Blue => "blue",
      Band::Green => "green",
      Band::Red => "red",
      Band::Nir => "nir",
      Band::Swir => "swir",
      Band::Swir2 => "swir2",
    };
    write!(f, "{}", name)
  }
}

pub const SUPPORTED_BAND_COUNTS: [usize; 4] = [4, 6, 7, 10];

/// Sensor selected for a run together with the 1-based raster band index of
/// each spectral channel. Channels the sensor does not record are `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SensorProfile {
  sensor: Sensor,
  bands: [Option<usize>; 6],
}

impl SensorProfile {
  /// Resolves the profile from the band count of the primary raster.
  pub fn from_band_count(count: usize) -> Result<SensorProfile> {
    let (sensor, bands) = match count {
      4 => (Sensor::Spot, [None, Some(1), Some(2), Some(3), Some(4), None]),
      6 => (Sensor::Landsat, [Some(1), Some(2), Some(3), Some(4), Some(5), Some(6)]),
      7 => (Sensor::Landsat8, [Some(2), Some(3), Some(4), Some(5), Some(6), Some(7)]),
      10 => (Sensor::Sentinel2, [Some(1), Some(2), Some(3), Some(7), Some(9), Some(10)]),
      _ => {
        return Err(ClassifyError::configuration(format!(
          "expecting 4, 6, 7 or 10 band imagery (SPOT/LANDSAT/SENTINEL2), found {} bands",
          count
        )))
      }
    };
    Ok(SensorProfile { sensor, bands })
  }

  pub fn sensor(&self) -> Sensor {
    self.sensor
  }

  pub fn band_index(&self, band: Band) -> Option<usize> {
    self.bands[band.slot()]
  }

  pub fn has_band(&self, band: Band) -> bool {
    self.band_index(band).is_some()
  }

  // (channel, raster band index) pairs in blue..swir2 order
  pub fn available_bands(&self) -> Vec<(Band, usize)> {
    Band::ALL
      .iter()
      .filter_map(|&band| self.band_index(band).map(|index| (band, index)))
      .collect()
  }
}
