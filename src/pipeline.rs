use gdal::raster::GdalDataType;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{info, warn};

use crate::class::{ClassEntry, LandClass};
use crate::error::{ClassifyError, Result};
use crate::finish::{finish_thematic, ClassStatistics};
use crate::raster::{self, create_output, output_driver, write_grid, Grid, RasterParams, RasterSource};
use crate::report::{Progress, Reporter};
use crate::scan::scan_rows;
use crate::sensor::{Band, Sensor, SensorProfile};
use crate::snow::{classify_snow, SnowClass};
use crate::vegetation::{classify_vegetation, VegetationSample};
use crate::water::{classify_water, Reflectance, Verdict};

const WATER_BANDS: [Band; 6] = Band::ALL;
const VEGETATION_BANDS: [Band; 3] = [Band::Red, Band::Nir, Band::Swir];
const SNOW_BANDS: [Band; 6] = Band::ALL;

/// Reflectance bands of the primary raster, resident for the whole run.
#[derive(Debug, Clone)]
pub struct SpectralBands {
  profile: SensorProfile,
  width: usize,
  height: usize,
  bands: [Option<Grid<u16>>; 6],
}

impl SpectralBands {
  /// Every band passed in must belong to the profile and share one size.
  pub fn new(profile: SensorProfile, bands: Vec<(Band, Grid<u16>)>) -> Result<SpectralBands> {
    let (width, height) = match bands.first() {
      Some((_, grid)) => grid.size(),
      None => return Err(ClassifyError::configuration("no reflectance bands given")),
    };

    let mut slots: [Option<Grid<u16>>; 6] = Default::default();
    for (band, grid) in bands {
      if !profile.has_band(band) {
        return Err(ClassifyError::configuration(format!(
          "{} imagery has no {} band",
          profile.sensor(),
          band
        )));
      }
      if grid.size() != (width, height) {
        return Err(ClassifyError::configuration(format!(
          "{} band is {} x {}, expecting {} x {}",
          band,
          grid.width(),
          grid.height(),
          width,
          height
        )));
      }
      slots[band as usize] = Some(grid);
    }

    Ok(SpectralBands { profile, width, height, bands: slots })
  }

  /// Reads the `wanted` bands the sensor records, checking for UInt16 data.
  pub fn read(source: &RasterSource, profile: SensorProfile, wanted: &[Band]) -> Result<SpectralBands> {
    let mut bands = Vec::with_capacity(wanted.len());
    for &band in wanted {
      if let Some(index) = profile.band_index(band) {
        bands.push((band, source.read_band::<u16>(index, GdalDataType::UInt16)?));
      }
    }
    SpectralBands::new(profile, bands)
  }

  pub fn profile(&self) -> SensorProfile {
    self.profile
  }

  pub fn size(&self) -> (usize, usize) {
    (self.width, self.height)
  }

  pub fn value(&self, band: Band, row: usize, col: usize) -> Option<u16> {
    self.bands[band as usize].as_ref()?.get(row, col)
  }

  fn required(&self, band: Band, row: usize, col: usize) -> Result<u16> {
    self.value(band, row, col).ok_or_else(|| {
      ClassifyError::configuration(format!("{} band not loaded for row {}, column {}", band, row, col))
    })
  }

  // Native values of one pixel; blue and swir2 only where the sensor has them
  pub fn reflectance(&self, row: usize, col: usize) -> Result<Reflectance> {
    let optional = |band: Band| -> Result<Option<f64>> {
      if self.profile.has_band(band) {
        Ok(Some(self.required(band, row, col)? as f64))
      } else {
        Ok(None)
      }
    };

    Ok(Reflectance {
      blue: optional(Band::Blue)?,
      green: self.required(Band::Green, row, col)? as f64,
      red: self.required(Band::Red, row, col)? as f64,
      nir: self.required(Band::Nir, row, col)? as f64,
      swir: self.required(Band::Swir, row, col)? as f64,
      swir2: optional(Band::Swir2)?,
    })
  }

  pub fn vegetation_sample(&self, row: usize, col: usize) -> Result<VegetationSample> {
    Ok(VegetationSample::from_raw(
      self.required(Band::Red, row, col)?,
      self.required(Band::Nir, row, col)?,
      self.required(Band::Swir, row, col)?,
      self.profile.sensor(),
    ))
  }
}

fn check_size<T: Copy>(what: &str, grid: &Grid<T>, expected: (usize, usize)) -> Result<()> {
  if grid.size() != expected {
    return Err(ClassifyError::configuration(format!(
      "{} is {} x {}, expecting {} x {} like the imagery",
      what,
      grid.width(),
      grid.height(),
      expected.0,
      expected.1
    )));
  }
  Ok(())
}

#[derive(Debug, Clone, PartialEq)]
pub struct WaterOutcome {
  pub grid: Grid<u8>,
  // clear in the cloud mask yet background in the snow mask, written as undefined
  pub inconsistent: usize,
}

/// Water, cloud and snow classification of resident rasters.
pub fn classify_water_grid(
  bands: &SpectralBands,
  cloud: &Grid<u8>,
  snow: &Grid<u8>,
  jobs: usize,
  progress: &mut Progress,
) -> Result<WaterOutcome> {
  let (width, height) = bands.size();
  check_size("cloud mask", cloud, (width, height))?;
  check_size("snow mask", snow, (width, height))?;

  let profile = bands.profile();
  let inconsistent = AtomicUsize::new(0);

  let grid = scan_rows(width, height, jobs, progress, |row, out| {
    let (Some(cloud_row), Some(snow_row)) = (cloud.row(row), snow.row(row)) else {
      return Err(ClassifyError::configuration(format!("mask row {} out of range", row)));
    };

    for col in 0..width {
      let raw = bands.reflectance(row, col)?;
      let verdict = classify_water(cloud_row[col], snow_row[col], &raw, &profile);
      if verdict == Verdict::Inconsistent {
        inconsistent.fetch_add(1, Ordering::Relaxed);
      }
      out[col] = verdict.class().code();
    }
    Ok(())
  })?;

  Ok(WaterOutcome { grid, inconsistent: inconsistent.into_inner() })
}

/// Vegetation refinement of a water classification. `lcdb` must already be
/// laid over the water grid.
pub fn classify_vegetation_grid(
  bands: &SpectralBands,
  water: &Grid<u8>,
  lcdb: &Grid<u8>,
  jobs: usize,
  progress: &mut Progress,
) -> Result<Grid<u8>> {
  let (width, height) = bands.size();
  check_size("water classification", water, (width, height))?;
  check_size("land cover buffer", lcdb, (width, height))?;

  scan_rows(width, height, jobs, progress, |row, out| {
    let (Some(water_row), Some(lcdb_row)) = (water.row(row), lcdb.row(row)) else {
      return Err(ClassifyError::configuration(format!("prior row {} out of range", row)));
    };

    for col in 0..width {
      let prior = LandClass::from_code(water_row[col]).ok_or_else(|| {
        ClassifyError::configuration(format!(
          "unknown class code {} in water classification at row {}, column {}",
          water_row[col], row, col
        ))
      })?;
      if prior == LandClass::Undefined {
        out[col] = prior.code();
        continue;
      }

      let sample = bands.vegetation_sample(row, col)?;
      let class =
        classify_vegetation(prior, &sample, lcdb_row[col]).map_err(|_| ClassifyError::Computation { row, col })?;
      out[col] = class.code();
    }
    Ok(())
  })
}

/// Snow mask generation from resident rasters; `dem` holds elevations in
/// metres laid over the imagery grid.
pub fn classify_snow_grid(
  bands: &SpectralBands,
  mask: &Grid<u8>,
  dem: &Grid<f64>,
  jobs: usize,
  progress: &mut Progress,
) -> Result<Grid<u8>> {
  let (width, height) = bands.size();
  check_size("valid data mask", mask, (width, height))?;
  check_size("elevation buffer", dem, (width, height))?;

  scan_rows(width, height, jobs, progress, |row, out| {
    let (Some(mask_row), Some(dem_row)) = (mask.row(row), dem.row(row)) else {
      return Err(ClassifyError::configuration(format!("mask row {} out of range", row)));
    };

    for col in 0..width {
      let raw = bands.reflectance(row, col)?;
      out[col] = classify_snow(mask_row[col], dem_row[col], &raw).code();
    }
    Ok(())
  })
}

/// Output side settings shared by all runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOptions {
  pub jobs: usize,
  pub verbose: bool,
  // resampling method, `None` skips overviews
  pub overviews: Option<String>,
}

impl Default for RunOptions {
  fn default() -> Self {
    RunOptions { jobs: 1, verbose: false, overviews: Some("NEAREST".to_string()) }
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
  pub sensor: Sensor,
  pub width: usize,
  pub height: usize,
  pub inconsistent: usize,
  pub statistics: ClassStatistics,
  // classes the output raster is coloured with
  pub legend: Vec<ClassEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaterJob {
  pub imagery: PathBuf,
  pub cloud: PathBuf,
  pub snow: PathBuf,
  pub output: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VegetationJob {
  pub imagery: PathBuf,
  pub water: PathBuf,
  pub lcdb: PathBuf,
  pub output: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnowJob {
  pub imagery: PathBuf,
  pub dem: PathBuf,
  pub mask: PathBuf,
  pub output: PathBuf,
}

// Fail before any reading when the output cannot be created
fn check_output(path: &Path) -> Result<()> {
  output_driver(path)?;
  if path.exists() {
    return Err(ClassifyError::configuration(format!("{} already exists", path.display())));
  }
  Ok(())
}

fn resolve_profile(imagery: &Path) -> Result<SensorProfile> {
  let profile = SensorProfile::from_band_count(raster::band_count(imagery)?)?;
  info!("Sensor: {}", profile.sensor());
  Ok(profile)
}

/// Auxiliary metadata file GDAL may write beside `path`.
pub fn sidecar_path(path: &Path) -> PathBuf {
  let mut name = path.as_os_str().to_os_string();
  name.push(".aux.xml");
  PathBuf::from(name)
}

/// Deletes a partially written output together with its metadata sidecar.
pub fn remove_partial_output(path: &Path) {
  for file in [path.to_path_buf(), sidecar_path(path)] {
    if file.exists() {
      if let Err(err) = fs::remove_file(&file) {
        warn!("could not remove partial output {}: {}", file.display(), err);
      }
    }
  }
}

// Create, write and finish the output; anything written is removed on failure
fn write_output(
  path: &Path,
  params: &RasterParams,
  projection: &str,
  grid: &Grid<u8>,
  legend: &[ClassEntry],
  options: &RunOptions,
) -> Result<ClassStatistics> {
  let written = create_output(path, params, projection).and_then(|mut dataset| {
    write_grid(&dataset, 1, grid)?;
    let statistics = finish_thematic(&mut dataset, grid, legend, options.overviews.as_deref());
    dataset.flush_cache()?;
    Ok(statistics)
  });

  if written.is_err() {
    remove_partial_output(path);
  }
  written
}

/// Water, cloud and snow classification from files.
pub fn run_water(job: &WaterJob, options: &RunOptions) -> Result<RunSummary> {
  check_output(&job.output)?;
  let mut reporter = Reporter::new(options.verbose);

  let profile = resolve_profile(&job.imagery)?;
  let imagery = RasterSource::open(&job.imagery)?;
  let bands = SpectralBands::read(&imagery, profile, &WATER_BANDS)?;
  let cloud_source = RasterSource::open(&job.cloud)?;
  let cloud = cloud_source.read_band::<u8>(1, GdalDataType::UInt8)?;
  let snow_source = RasterSource::open(&job.snow)?;
  let snow = snow_source.read_band::<u8>(1, GdalDataType::UInt8)?;
  let (width, height) = bands.size();
  reporter.step(format!("{} imagery ({} x {}) and masks read", profile.sensor(), width, height));

  let mut progress = reporter.progress("Classifying Water", height);
  let outcome = classify_water_grid(&bands, &cloud, &snow, options.jobs, &mut progress)?;
  if outcome.inconsistent > 0 {
    warn!(
      "{} pixels are clear in {} but background in {}; written as {}",
      outcome.inconsistent,
      job.cloud.display(),
      job.snow.display(),
      LandClass::Undefined
    );
  }
  reporter.step("Water classified");

  // the output takes the snow mask's grid
  let params = RasterParams { width, height, geo_transform: snow_source.info().to_geo_transform() };
  let legend = LandClass::legend();
  let statistics = write_output(&job.output, &params, snow_source.projection(), &outcome.grid, &legend, options)?;
  reporter.step(format!("Output {} written", job.output.display()));

  Ok(RunSummary { sensor: profile.sensor(), width, height, inconsistent: outcome.inconsistent, statistics, legend })
}

/// Vegetation refinement of a water classification from files.
pub fn run_vegetation(job: &VegetationJob, options: &RunOptions) -> Result<RunSummary> {
  check_output(&job.output)?;
  let mut reporter = Reporter::new(options.verbose);

  let profile = resolve_profile(&job.imagery)?;
  let imagery = RasterSource::open(&job.imagery)?;
  let bands = SpectralBands::read(&imagery, profile, &VEGETATION_BANDS)?;
  let water_source = RasterSource::open(&job.water)?;
  let water = water_source.read_band::<u8>(1, GdalDataType::UInt8)?;
  let (width, height) = bands.size();

  let lcdb_source = RasterSource::open(&job.lcdb)?;
  let lcdb = lcdb_source.read_aligned::<u8>(1, GdalDataType::UInt8, water_source.info(), water.size(), 0)?;
  reporter.step(format!("{} imagery ({} x {}) and land cover read", profile.sensor(), width, height));

  let mut progress = reporter.progress("Classifying Vegetation", height);
  let grid = classify_vegetation_grid(&bands, &water, &lcdb, options.jobs, &mut progress)?;
  reporter.step("Vegetation classified");

  let params = RasterParams { width, height, geo_transform: water_source.info().to_geo_transform() };
  let legend = LandClass::legend();
  let statistics = write_output(&job.output, &params, water_source.projection(), &grid, &legend, options)?;
  reporter.step(format!("Output {} written", job.output.display()));

  Ok(RunSummary { sensor: profile.sensor(), width, height, inconsistent: 0, statistics, legend })
}

/// Snow mask generation from files. The DEM may hold any pixel type and
/// must share the imagery's pixel lattice; cells it does not cover count as
/// high ground.
pub fn run_snow(job: &SnowJob, options: &RunOptions) -> Result<RunSummary> {
  check_output(&job.output)?;
  let mut reporter = Reporter::new(options.verbose);

  let profile = resolve_profile(&job.imagery)?;
  let imagery = RasterSource::open(&job.imagery)?;
  let bands = SpectralBands::read(&imagery, profile, &SNOW_BANDS)?;
  let mask_source = RasterSource::open(&job.mask)?;
  let mask = mask_source.read_band::<u8>(1, GdalDataType::UInt8)?;
  let (width, height) = bands.size();

  let dem_source = RasterSource::open(&job.dem)?;
  let dem = dem_source.read_aligned_as::<f64>(1, imagery.info(), (width, height), f64::NAN)?;
  reporter.step(format!("{} imagery ({} x {}), mask and elevation read", profile.sensor(), width, height));

  let mut progress = reporter.progress("Classifying Snow", height);
  let grid = classify_snow_grid(&bands, &mask, &dem, options.jobs, &mut progress)?;
  reporter.step("Snow classified");

  let params = RasterParams { width, height, geo_transform: imagery.info().to_geo_transform() };
  let legend = SnowClass::legend();
  let statistics = write_output(&job.output, &params, imagery.projection(), &grid, &legend, options)?;
  reporter.step(format!("Output {} written", job.output.display()));

  Ok(RunSummary { sensor: profile.sensor(), width, height, inconsistent: 0, statistics, legend })
}
