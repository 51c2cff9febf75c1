//! Water, cloud and snow classification.
//!
//! Basic premise: raw NDVI is good at finding water or bare ground, and water
//! is dark. Band values are standardised reflectance scaled by 1000 (so 50 is
//! 5% reflectance), calibrated onto the LANDSAT ETM space before testing.

use crate::calibration::calibrate;
use crate::class::LandClass;
use crate::sensor::{Band, Sensor, SensorProfile};

// Snow mask codes below this value override the spectral test
pub const SNOW_MASK_CLEAR: u8 = 3;
const SNOW_MASK_INCONSISTENT: u8 = 0;
const SNOW_MASK_SNOW: u8 = 1;
const SNOW_MASK_BRIGHT_WATER: u8 = 2;

/// Band values of one pixel. Blue and SWIR2 are absent for 4-band sensors.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reflectance {
  pub blue: Option<f64>,
  pub green: f64,
  pub red: f64,
  pub nir: f64,
  pub swir: f64,
  pub swir2: Option<f64>,
}

impl Reflectance {
  pub fn get(&self, band: Band) -> Option<f64> {
    match band {
      Band::Blue => self.blue,
      Band::Green => Some(self.green),
      Band::Red => Some(self.red),
      Band::Nir => Some(self.nir),
      Band::Swir => Some(self.swir),
      Band::Swir2 => self.swir2,
    }
  }

  pub fn calibrated(&self, sensor: Sensor) -> Reflectance {
    Reflectance {
      blue: self.blue.map(|v| calibrate(v, sensor, Band::Blue)),
      green: calibrate(self.green, sensor, Band::Green),
      red: calibrate(self.red, sensor, Band::Red),
      nir: calibrate(self.nir, sensor, Band::Nir),
      swir: calibrate(self.swir, sensor, Band::Swir),
      swir2: self.swir2.map(|v| calibrate(v, sensor, Band::Swir2)),
    }
  }

  fn sum(&self, bands: &[Band]) -> f64 {
    bands.iter().filter_map(|&band| self.get(band)).sum()
  }

  fn mean(&self, bands: &[Band]) -> f64 {
    let (sum, count) = bands
      .iter()
      .filter_map(|&band| self.get(band))
      .fold((0.0, 0usize), |(sum, count), value| (sum + value, count + 1));
    sum / count as f64
  }

  // Zero when nir + red is not positive
  pub fn ndvi(&self) -> f64 {
    if self.nir + self.red > 0.0 {
      (self.nir - self.red) / (self.nir + self.red)
    } else {
      0.0
    }
  }

  // Mean of the visible bands
  pub fn vsbar(&self) -> f64 {
    self.mean(&[Band::Blue, Band::Green, Band::Red])
  }

  // Mean of the infra-red bands
  pub fn irbar(&self) -> f64 {
    self.mean(&[Band::Nir, Band::Swir, Band::Swir2])
  }

  // Visible over SWIR; above one the spectrum slopes downward (unlike soil or rock)
  pub fn slope_ratio(&self) -> f64 {
    self.sum(&[Band::Blue, Band::Green]) / self.sum(&[Band::Swir, Band::Swir2])
  }

  pub fn swir_mean(&self) -> f64 {
    self.mean(&[Band::Swir, Band::Swir2])
  }

  fn total(&self) -> f64 {
    self.sum(&Band::ALL)
  }
}

// How an unvegetated pixel is judged dark enough to be water
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DarkRule {
  MeanBelow(f64),
  BothBelow(f64),
}

/// Threshold record of the spectral water test for one sensor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WaterRules {
  pub zero_sum_undefined: bool,
  pub dim_pretest: Option<(f64, f64)>,
  pub slope_threshold: f64,
  pub dark_nir_max: f64,
  pub dark_swir_max: f64,
  pub dark_swir2_max: Option<f64>,
  pub glacial_vsbar_min: f64,
  pub glacial_swir_max: f64,
  pub ndvi_unvegetated: f64,
  pub unvegetated_dark: DarkRule,
  pub bare_min_vsbar: Option<f64>,
}

const LANDSAT_RULES: WaterRules = WaterRules {
  zero_sum_undefined: false,
  dim_pretest: None,
  slope_threshold: 1.0,
  dark_nir_max: 150.0,
  dark_swir_max: 80.0,
  dark_swir2_max: None,
  glacial_vsbar_min: 100.0,
  glacial_swir_max: 30.0,
  ndvi_unvegetated: -0.2,
  unvegetated_dark: DarkRule::MeanBelow(50.0),
  bare_min_vsbar: None,
};

impl WaterRules {
  pub fn for_sensor(sensor: Sensor) -> WaterRules {
    match sensor {
      Sensor::Landsat | Sensor::Landsat8 => LANDSAT_RULES,
      // bare ground must also slope upward and reach 4% in the visible
      Sensor::Spot => WaterRules { bare_min_vsbar: Some(40.0), ..LANDSAT_RULES },
      Sensor::Sentinel2 => WaterRules {
        zero_sum_undefined: true,
        dim_pretest: Some((30.0, 50.0)),
        slope_threshold: 1.2,
        dark_swir2_max: Some(60.0),
        unvegetated_dark: DarkRule::BothBelow(50.0),
        ..LANDSAT_RULES
      },
    }
  }
}

/// Outcome of the water decision for one pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
  Classified(LandClass),
  // clear in the cloud mask but background in the snow mask
  Inconsistent,
}

impl Verdict {
  pub fn class(self) -> LandClass {
    match self {
      Verdict::Classified(class) => class,
      Verdict::Inconsistent => LandClass::Undefined,
    }
  }
}

/// Spectral part of the decision, applied to calibrated values.
pub fn spectral_class(sample: &Reflectance, rules: &WaterRules) -> LandClass {
  let ndvi = sample.ndvi();
  let vsbar = sample.vsbar();
  let irbar = sample.irbar();
  let slope = sample.slope_ratio();

  let mut class = LandClass::Land;

  let very_dim = match rules.dim_pretest {
    Some((vs_max, ir_max)) => vsbar <= vs_max && irbar <= ir_max,
    None => false,
  };

  if very_dim {
    class = LandClass::Water;
  } else if slope > rules.slope_threshold {
    let dark_infrared = sample.nir < rules.dark_nir_max
      && sample.swir < rules.dark_swir_max
      && match (rules.dark_swir2_max, sample.swir2) {
        (Some(max), Some(swir2)) => swir2 < max,
        _ => true,
      };

    if dark_infrared {
      class = LandClass::Water;
    } else if vsbar > rules.glacial_vsbar_min && sample.swir_mean() < rules.glacial_swir_max {
      class = LandClass::Glacial;
    }
  }

  if class == LandClass::Land && ndvi < rules.ndvi_unvegetated {
    let dark = match rules.unvegetated_dark {
      DarkRule::MeanBelow(max) => (vsbar + irbar) / 2.0 < max,
      DarkRule::BothBelow(max) => vsbar < max && irbar < max,
    };

    class = if dark {
      LandClass::Water
    } else {
      match rules.bare_min_vsbar {
        None => LandClass::Bare,
        Some(min_vsbar) if slope <= rules.slope_threshold && vsbar > min_vsbar => LandClass::Bare,
        Some(_) => LandClass::Land,
      }
    };
  }

  class
}

/// Full decision for one pixel from its mask codes and native band values.
pub fn classify_water(cloud: u8, snow: u8, raw: &Reflectance, profile: &SensorProfile) -> Verdict {
  if cloud == LandClass::Undefined.code() {
    return Verdict::Classified(LandClass::Undefined);
  }
  if cloud == LandClass::Cloud.code() {
    return Verdict::Classified(LandClass::Cloud);
  }

  match snow {
    SNOW_MASK_INCONSISTENT => return Verdict::Inconsistent,
    SNOW_MASK_SNOW => return Verdict::Classified(LandClass::Snow),
    SNOW_MASK_BRIGHT_WATER => return Verdict::Classified(LandClass::Water),
    _ => {}
  }

  let rules = WaterRules::for_sensor(profile.sensor());
  if rules.zero_sum_undefined && raw.total() == 0.0 {
    return Verdict::Classified(LandClass::Undefined);
  }

  Verdict::Classified(spectral_class(&raw.calibrated(profile.sensor()), &rules))
}
