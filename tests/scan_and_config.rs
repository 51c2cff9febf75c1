use approx::assert_relative_eq;
use spectral_landcover::config::{config_value, Settings};
use spectral_landcover::finish::{overview_levels, ClassStatistics};
use spectral_landcover::pipeline::{classify_vegetation_grid, classify_water_grid, SpectralBands};
use spectral_landcover::raster::Grid;
use spectral_landcover::report::Progress;
use spectral_landcover::scan::scan_rows;
use spectral_landcover::{Band, ClassifyError, LandClass, SensorProfile};

fn landsat_bands(width: usize, height: usize, pixels: &[[u16; 6]]) -> SpectralBands {
  let profile = SensorProfile::from_band_count(6).unwrap();
  let bands = Band::ALL
    .iter()
    .enumerate()
    .map(|(slot, &band)| {
      let values = pixels.iter().map(|pixel| pixel[slot]).collect();
      (band, Grid::from_vec(width, height, values).unwrap())
    })
    .collect();
  SpectralBands::new(profile, bands).unwrap()
}

#[test]
fn test_scan_fills_every_row_in_place() {
  let (width, height) = (7, 23);
  for jobs in [1, 2, 3, 8, 64] {
    let mut progress = Progress::hidden(height);
    let grid = scan_rows(width, height, jobs, &mut progress, |row, out| {
      for (col, value) in out.iter_mut().enumerate() {
        *value = ((row * width + col) % 251) as u8;
      }
      Ok(())
    })
    .unwrap();

    assert_eq!(grid.size(), (width, height));
    for row in 0..height {
      for col in 0..width {
        assert_eq!(grid.get(row, col), Some(((row * width + col) % 251) as u8));
      }
    }
    assert_eq!(progress.done(), height);
    assert_eq!(progress.percent(), 100);
  }
}

#[test]
fn test_scan_parallel_matches_single_thread() {
  let classify = |row: usize, out: &mut [u8]| -> spectral_landcover::Result<()> {
    for (col, value) in out.iter_mut().enumerate() {
      *value = LandClass::ALL[(row * 3 + col * 7) % 10].code();
    }
    Ok(())
  };
  let single = scan_rows(40, 30, 1, &mut Progress::hidden(30), classify).unwrap();
  let parallel = scan_rows(40, 30, 6, &mut Progress::hidden(30), classify).unwrap();
  assert_eq!(single, parallel);
}

#[test]
fn test_scan_reports_first_failing_row() {
  let mut progress = Progress::hidden(10);
  let result = scan_rows(4, 10, 1, &mut progress, |row, _| {
    if row == 3 || row == 5 {
      return Err(ClassifyError::Computation { row, col: 2 });
    }
    Ok(())
  });
  match result {
    Err(ClassifyError::Computation { row, col }) => assert_eq!((row, col), (3, 2)),
    other => panic!("expected a computation error, got {:?}", other),
  }
  // the scan stops at the failing row
  assert_eq!(progress.done(), 3);

  let result = scan_rows(4, 10, 4, &mut Progress::hidden(10), |row, _| {
    if row == 7 {
      return Err(ClassifyError::Computation { row, col: 0 });
    }
    Ok(())
  });
  assert!(matches!(result, Err(ClassifyError::Computation { row: 7, col: 0 })));
}

#[test]
fn test_scan_empty_grid() {
  let grid = scan_rows(0, 0, 4, &mut Progress::hidden(0), |_, _| Ok(())).unwrap();
  assert_eq!(grid.size(), (0, 0));
}

#[test]
fn test_progress_is_monotonic() {
  let mut progress = Progress::hidden(7);
  let mut last = progress.percent();
  for _ in 0..10 {
    progress.advance();
    assert!(progress.percent() >= last);
    last = progress.percent();
  }
  assert_eq!(progress.done(), 7);
  assert_eq!(progress.percent(), 100);
}

#[test]
fn test_water_grid_classification() {
  // one row of pixels covering each branch of the mask ladder
  let water = [50, 50, 50, 120, 60, 20];
  let vegetated = [30, 60, 40, 300, 150, 80];
  let pixels = [water, water, water, vegetated, vegetated, water];
  let bands = landsat_bands(3, 2, &pixels);

  let cloud = Grid::from_vec(3, 2, vec![0, 5, 1, 1, 1, 1]).unwrap();
  let snow = Grid::from_vec(3, 2, vec![3, 3, 1, 0, 3, 3]).unwrap();

  let outcome = classify_water_grid(&bands, &cloud, &snow, 2, &mut Progress::hidden(2)).unwrap();
  let codes: Vec<LandClass> = outcome.grid.data().iter().map(|&code| LandClass::from_code(code).unwrap()).collect();
  assert_eq!(
    codes,
    vec![
      LandClass::Undefined,
      LandClass::Cloud,
      LandClass::Snow,
      LandClass::Undefined,
      LandClass::Land,
      LandClass::Water
    ]
  );
  assert_eq!(outcome.inconsistent, 1);
}

#[test]
fn test_water_grid_rejects_mismatched_masks() {
  let bands = landsat_bands(2, 1, &[[50, 50, 50, 120, 60, 20]; 2]);
  let cloud = Grid::new(3, 1, 1u8);
  let snow = Grid::new(2, 1, 3u8);
  let result = classify_water_grid(&bands, &cloud, &snow, 1, &mut Progress::hidden(1));
  assert!(matches!(result, Err(ClassifyError::Configuration(_))));
}

#[test]
fn test_vegetation_grid_classification() {
  // red, nir and swir are what matter here
  let woody = [0, 0, 40, 300, 100, 0];
  let bare = [0, 0, 500, 200, 100, 0];
  let dark = [0, 0, 0, 0, 100, 0];
  let bands = landsat_bands(4, 1, &[woody, bare, dark, woody]);

  let water = Grid::from_vec(4, 1, vec![9, 9, 0, 1]).unwrap();
  let lcdb = Grid::new(4, 1, 0u8);
  let grid = classify_vegetation_grid(&bands, &water, &lcdb, 2, &mut Progress::hidden(1)).unwrap();
  assert_eq!(
    grid.data(),
    &[LandClass::Woody.code(), LandClass::Bare.code(), LandClass::Undefined.code(), LandClass::Water.code()]
  );
}

#[test]
fn test_vegetation_grid_reports_pixel_of_zero_ndvi() {
  let ok = [0, 0, 40, 300, 100, 0];
  let dark = [0, 0, 0, 0, 100, 0];
  let bands = landsat_bands(3, 2, &[ok, ok, ok, ok, dark, ok]);
  let water = Grid::new(3, 2, LandClass::Water.code());
  let lcdb = Grid::new(3, 2, 0u8);

  let result = classify_vegetation_grid(&bands, &water, &lcdb, 1, &mut Progress::hidden(2));
  assert!(matches!(result, Err(ClassifyError::Computation { row: 1, col: 1 })));
}

#[test]
fn test_vegetation_grid_rejects_unknown_prior_codes() {
  let bands = landsat_bands(1, 1, &[[0, 0, 40, 300, 100, 0]]);
  let water = Grid::new(1, 1, 42u8);
  let lcdb = Grid::new(1, 1, 0u8);
  let result = classify_vegetation_grid(&bands, &water, &lcdb, 1, &mut Progress::hidden(1));
  assert!(matches!(result, Err(ClassifyError::Configuration(_))));
}

#[test]
fn test_spectral_bands_reject_foreign_bands() {
  let spot = SensorProfile::from_band_count(4).unwrap();
  let result = SpectralBands::new(spot, vec![(Band::Blue, Grid::new(2, 2, 0u16))]);
  assert!(matches!(result, Err(ClassifyError::Configuration(_))));

  let landsat = SensorProfile::from_band_count(6).unwrap();
  let result =
    SpectralBands::new(landsat, vec![(Band::Red, Grid::new(2, 2, 0u16)), (Band::Nir, Grid::new(3, 2, 0u16))]);
  assert!(matches!(result, Err(ClassifyError::Configuration(_))));
}

#[test]
fn test_grid_bounds() {
  let mut grid = Grid::new(3, 2, 0u8);
  assert!(grid.set_item(1, 2, 9));
  assert!(!grid.set_item(2, 0, 9));
  assert!(!grid.set_item(0, 3, 9));
  assert_eq!(grid.get(1, 2), Some(9));
  assert_eq!(grid.get(2, 0), None);
  assert_eq!(grid.row(1), Some(&[0u8, 0, 9][..]));
  assert!(grid.row(2).is_none());
  assert!(Grid::from_vec(3, 2, vec![0u8; 5]).is_err());
}

#[test]
fn test_class_statistics() {
  let grid = Grid::from_vec(5, 2, vec![1, 1, 1, 9, 9, 9, 3, 0, 1, 9]).unwrap();
  let stats = ClassStatistics::from_grid(&grid);
  assert_eq!(stats.histogram[1], 4);
  assert_eq!(stats.histogram[9], 4);
  assert_eq!(stats.histogram.iter().sum::<u64>(), 10);
  assert_relative_eq!(stats.minimum, 0.0);
  assert_relative_eq!(stats.maximum, 9.0);
  assert_relative_eq!(stats.mean, 4.3, epsilon = 1e-12);
  // population deviation
  let variance = (4.0 * 3.3f64.powi(2) + 4.0 * 4.7f64.powi(2) + 1.3f64.powi(2) + 4.3f64.powi(2)) / 10.0;
  assert_relative_eq!(stats.std_dev, variance.sqrt(), epsilon = 1e-12);
  // tie between 1 and 9 goes to the lower bin
  assert_eq!(stats.mode, 1);
  // cumulative counts first exceed half of 10 at bin 3
  assert_eq!(stats.median, 3);

  let items = stats.metadata_items();
  assert!(items.contains(&("LAYER_TYPE", "thematic".to_string())));
  assert!(items.contains(&("STATISTICS_HISTOBINFUNCTION", "direct".to_string())));
  assert!(items.contains(&("STATISTICS_MAXIMUM", "9".to_string())));
}

#[test]
fn test_overview_levels() {
  assert!(overview_levels(100, 100).is_empty());
  assert_eq!(overview_levels(200, 1000), vec![4]);
  assert_eq!(overview_levels(1000, 1000), vec![4, 8, 16]);
  assert_eq!(overview_levels(100_000, 50_000), vec![4, 8, 16, 32, 64, 128, 256, 512]);
}

#[test]
fn test_settings_parse() {
  let text = "# run settings\njobs = 4\n overviews=false \noverview_resampling = mode\nprogress = no\nunknown = 1\n";
  let settings = Settings::parse(text).unwrap();
  assert_eq!(settings.jobs, Some(4));
  assert_eq!(settings.overviews, Some(false));
  assert_eq!(settings.overview_resampling.as_deref(), Some("MODE"));
  assert_eq!(settings.progress, Some(false));

  assert_eq!(Settings::parse("").unwrap(), Settings::default());
  assert_eq!(config_value("a=1\n#b=2\nb = 3", "b"), Some("3".to_string()));
}

#[test]
fn test_settings_reject_invalid_values() {
  for text in ["jobs = 0", "jobs = many", "overviews = maybe", "overview_resampling = sharpest"] {
    assert!(matches!(Settings::parse(text), Err(ClassifyError::Configuration(_))), "{}", text);
  }
}

#[test]
fn test_settings_load_missing_file_gives_defaults() {
  let dir = tempfile::tempdir().unwrap();
  let settings = Settings::load(dir.path().join("app.config")).unwrap();
  assert_eq!(settings, Settings::default());

  let path = dir.path().join("custom.config");
  std::fs::write(&path, "jobs=2\n").unwrap();
  assert_eq!(Settings::load(&path).unwrap().jobs, Some(2));
}
