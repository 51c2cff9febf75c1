use approx::assert_relative_eq;
use spectral_landcover::calibration::{calibrate, coefficients, uncalibrate, Affine};
use spectral_landcover::sensor::SUPPORTED_BAND_COUNTS;
use spectral_landcover::{Band, ClassifyError, Sensor, SensorProfile};

#[test]
fn test_supported_band_counts_resolve_sensor() {
  let cases = [
    (4, Sensor::Spot),
    (6, Sensor::Landsat),
    (7, Sensor::Landsat8),
    (10, Sensor::Sentinel2),
  ];
  assert_eq!(cases.map(|(count, _)| count), SUPPORTED_BAND_COUNTS);
  for (count, sensor) in cases {
    let profile = SensorProfile::from_band_count(count).unwrap();
    assert_eq!(profile.sensor(), sensor, "band count {}", count);
  }
}

#[test]
fn test_band_indices_per_sensor() {
  let spot = SensorProfile::from_band_count(4).unwrap();
  assert_eq!(spot.band_index(Band::Blue), None);
  assert_eq!(spot.band_index(Band::Green), Some(1));
  assert_eq!(spot.band_index(Band::Swir), Some(4));
  assert_eq!(spot.band_index(Band::Swir2), None);
  assert_eq!(spot.available_bands().len(), 4);

  let landsat = SensorProfile::from_band_count(6).unwrap();
  let indices: Vec<usize> = landsat.available_bands().iter().map(|(_, index)| *index).collect();
  assert_eq!(indices, vec![1, 2, 3, 4, 5, 6]);

  // coastal aerosol band comes first
  let landsat8 = SensorProfile::from_band_count(7).unwrap();
  assert_eq!(landsat8.band_index(Band::Blue), Some(2));
  assert_eq!(landsat8.band_index(Band::Swir2), Some(7));

  // red edge bands are skipped
  let sentinel2 = SensorProfile::from_band_count(10).unwrap();
  assert_eq!(sentinel2.band_index(Band::Red), Some(3));
  assert_eq!(sentinel2.band_index(Band::Nir), Some(7));
  assert_eq!(sentinel2.band_index(Band::Swir), Some(9));
  assert_eq!(sentinel2.band_index(Band::Swir2), Some(10));
}

#[test]
fn test_unsupported_band_count_is_configuration_error() {
  for count in [0, 1, 3, 5, 8, 9, 11, 13] {
    match SensorProfile::from_band_count(count) {
      Err(ClassifyError::Configuration(message)) => {
        assert!(message.contains("4, 6, 7 or 10"), "message: {}", message);
      }
      other => panic!("band count {} gave {:?}", count, other),
    }
  }
}

#[test]
fn test_landsat_calibration_is_identity() {
  for sensor in [Sensor::Landsat, Sensor::Landsat8] {
    for band in Band::ALL {
      for x in [0.0, 0.037, 1.0, 50.0, 9999.5] {
        assert_eq!(calibrate(x, sensor, band), x);
      }
    }
  }
}

#[test]
fn test_spot_calibration_ratios() {
  assert_relative_eq!(calibrate(100.0, Sensor::Spot, Band::Green), 108.6, epsilon = 1e-9);
  assert_relative_eq!(calibrate(100.0, Sensor::Spot, Band::Red), 92.6, epsilon = 1e-9);
  assert_relative_eq!(calibrate(100.0, Sensor::Spot, Band::Nir), 99.8, epsilon = 1e-9);
  assert_relative_eq!(calibrate(100.0, Sensor::Spot, Band::Swir), 98.3, epsilon = 1e-9);
}

#[test]
fn test_sentinel2_calibration_is_affine() {
  for band in Band::ALL {
    let affine = coefficients(Sensor::Sentinel2, band);
    assert!(affine.scale > 0.95 && affine.scale < 1.06, "{} scale {}", band, affine.scale);
    assert!(affine.offset.abs() <= 0.0125, "{} offset {}", band, affine.offset);

    // equal steps in, equal steps out
    let a = calibrate(0.1, Sensor::Sentinel2, band);
    let b = calibrate(0.2, Sensor::Sentinel2, band);
    let c = calibrate(0.3, Sensor::Sentinel2, band);
    assert_relative_eq!(b - a, c - b, epsilon = 1e-12);
  }
  assert_relative_eq!(calibrate(0.25, Sensor::Sentinel2, Band::Nir), 0.25 * 1.0187 + 0.0120, epsilon = 1e-12);
}

#[test]
fn test_sentinel2_calibration_round_trip() {
  for band in Band::ALL {
    for raw in [0.0, 0.001, 0.05, 0.42, 1.0, 37.0, 1200.0] {
      let value = calibrate(raw, Sensor::Sentinel2, band);
      assert_relative_eq!(uncalibrate(value, Sensor::Sentinel2, band), raw, epsilon = 1e-9);
    }
  }
}

#[test]
fn test_affine_identity() {
  assert_eq!(Affine::IDENTITY.apply(3.5), 3.5);
  assert_eq!(Affine::IDENTITY.invert(3.5), 3.5);
}
