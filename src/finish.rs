//! Finishing touches for a written classification raster: thematic layer
//! flag, summary statistics with a direct histogram, a colour attribute
//! table and overviews. Failures here are reported and otherwise ignored,
//! the classification itself is already on disk.

use gdal::errors::GdalError;
use gdal::raster::RasterBand;
use gdal::{Dataset, Metadata};
use gdal_sys::{CPLErr, GDALRATFieldType, GDALRATFieldUsage};
use std::ffi::{c_int, CString};
use tracing::{debug, warn};

use crate::class::ClassEntry;
use crate::error::Result;
use crate::raster::Grid;

pub const HISTOGRAM_BINS: usize = 256;

// Overviews stop before the smallest level drops to this many pixels
const MIN_OVERVIEW_PIXELS: usize = 33;
const OVERVIEW_LEVELS: [usize; 8] = [4, 8, 16, 32, 64, 128, 256, 512];

/// Summary of a byte raster as stored in the band metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassStatistics {
  pub histogram: [u64; HISTOGRAM_BINS],
  pub minimum: f64,
  pub maximum: f64,
  pub mean: f64,
  pub std_dev: f64,
  pub mode: u8,
  pub median: u8,
}

impl ClassStatistics {
  pub fn from_grid(grid: &Grid<u8>) -> ClassStatistics {
    let mut histogram = [0u64; HISTOGRAM_BINS];
    for &value in grid.data() {
      histogram[value as usize] += 1;
    }

    let total: u64 = histogram.iter().sum();
    if total == 0 {
      return ClassStatistics {
        histogram,
        minimum: 0.0,
        maximum: 0.0,
        mean: 0.0,
        std_dev: 0.0,
        mode: 0,
        median: 0,
      };
    }

    let occupied = || histogram.iter().enumerate().filter(|(_, count)| **count > 0).map(|(bin, _)| bin);
    let minimum = occupied().next().unwrap_or(0) as f64;
    let maximum = occupied().last().unwrap_or(0) as f64;

    let sum: f64 = histogram.iter().enumerate().map(|(bin, &count)| bin as f64 * count as f64).sum();
    let mean = sum / total as f64;
    let variance: f64 = histogram
      .iter()
      .enumerate()
      .map(|(bin, &count)| count as f64 * (bin as f64 - mean).powi(2))
      .sum::<f64>()
      / total as f64;

    // lowest bin wins a tie
    let mut mode = 0;
    for (bin, &count) in histogram.iter().enumerate() {
      if count > histogram[mode] {
        mode = bin;
      }
    }

    let half = total as f64 / 2.0;
    let mut cumulative = 0u64;
    let mut median = 0;
    for (bin, &count) in histogram.iter().enumerate() {
      cumulative += count;
      if cumulative as f64 > half {
        median = bin;
        break;
      }
    }

    ClassStatistics {
      histogram,
      minimum,
      maximum,
      mean,
      std_dev: variance.sqrt(),
      mode: mode as u8,
      median: median as u8,
    }
  }

  // Band metadata items in the names GDAL and its viewers understand
  pub fn metadata_items(&self) -> Vec<(&'static str, String)> {
    vec![
      ("LAYER_TYPE", "thematic".to_string()),
      ("STATISTICS_MINIMUM", self.minimum.to_string()),
      ("STATISTICS_MAXIMUM", self.maximum.to_string()),
      ("STATISTICS_MEAN", self.mean.to_string()),
      ("STATISTICS_STDDEV", self.std_dev.to_string()),
      ("STATISTICS_SKIPFACTORX", "1".to_string()),
      ("STATISTICS_SKIPFACTORY", "1".to_string()),
      ("STATISTICS_HISTOBINFUNCTION", "direct".to_string()),
      ("STATISTICS_MODE", self.mode.to_string()),
      ("STATISTICS_MEDIAN", self.median.to_string()),
    ]
  }
}

/// Decimation factors worth building for a raster of this size.
pub fn overview_levels(width: usize, height: usize) -> Vec<i32> {
  let min_dim = width.min(height);
  OVERVIEW_LEVELS
    .iter()
    .take_while(|&&level| min_dim / level > MIN_OVERVIEW_PIXELS)
    .map(|&level| level as i32)
    .collect()
}

fn write_metadata(band: &mut RasterBand, statistics: &ClassStatistics) -> Result<()> {
  for (key, value) in statistics.metadata_items() {
    band.set_metadata_item(key, &value, "")?;
  }
  Ok(())
}

fn check(rv: CPLErr::Type, method_name: &'static str) -> Result<()> {
  if rv != CPLErr::CE_None {
    return Err(GdalError::CplError { class: rv, number: 0, msg: format!("{} failed", method_name) }.into());
  }
  Ok(())
}

fn write_attribute_table(band: &RasterBand, statistics: &ClassStatistics, legend: &[ClassEntry]) -> Result<()> {
  let columns = [
    ("Histogram", GDALRATFieldType::GFT_Real, GDALRATFieldUsage::GFU_PixelCount),
    ("Class", GDALRATFieldType::GFT_String, GDALRATFieldUsage::GFU_Name),
    ("Red", GDALRATFieldType::GFT_Integer, GDALRATFieldUsage::GFU_Red),
    ("Green", GDALRATFieldType::GFT_Integer, GDALRATFieldUsage::GFU_Green),
    ("Blue", GDALRATFieldType::GFT_Integer, GDALRATFieldUsage::GFU_Blue),
    ("Alpha", GDALRATFieldType::GFT_Integer, GDALRATFieldUsage::GFU_Alpha),
  ];
  let column_names = columns
    .iter()
    .map(|(name, _, _)| CString::new(*name))
    .collect::<std::result::Result<Vec<_>, _>>()
    .map_err(GdalError::from)?;
  let class_names = legend
    .iter()
    .map(|entry| CString::new(entry.name))
    .collect::<std::result::Result<Vec<_>, _>>()
    .map_err(GdalError::from)?;

  unsafe {
    let rat = gdal_sys::GDALCreateRasterAttributeTable();
    if rat.is_null() {
      return Err(
        GdalError::NullPointer { method_name: "GDALCreateRasterAttributeTable", msg: String::new() }.into(),
      );
    }

    let mut outcome = Ok(());
    for ((_, field_type, usage), name) in columns.iter().zip(&column_names) {
      outcome = check(
        gdal_sys::GDALRATCreateColumn(rat, name.as_ptr(), *field_type, *usage),
        "GDALRATCreateColumn",
      );
      if outcome.is_err() {
        break;
      }
    }

    if outcome.is_ok() {
      gdal_sys::GDALRATSetRowCount(rat, HISTOGRAM_BINS as c_int);
      for (row, &count) in statistics.histogram.iter().enumerate() {
        gdal_sys::GDALRATSetValueAsDouble(rat, row as c_int, 0, count as f64);
      }
      for (entry, name) in legend.iter().zip(&class_names) {
        let row = entry.code as c_int;
        gdal_sys::GDALRATSetValueAsString(rat, row, 1, name.as_ptr());
        for (field, &channel) in entry.rgba.iter().enumerate() {
          gdal_sys::GDALRATSetValueAsInt(rat, row, 2 + field as c_int, channel as c_int);
        }
      }
      // the band keeps its own copy
      outcome = check(gdal_sys::GDALSetDefaultRAT(band.c_rasterband(), rat), "GDALSetDefaultRAT");
    }

    gdal_sys::GDALDestroyRasterAttributeTable(rat);
    outcome
  }
}

/// Marks band 1 of `dataset` as thematic and stores its statistics and an
/// attribute table coloured from `legend`. Overviews are built with
/// `overview_resampling` when set.
pub fn finish_thematic(
  dataset: &mut Dataset,
  grid: &Grid<u8>,
  legend: &[ClassEntry],
  overview_resampling: Option<&str>,
) -> ClassStatistics {
  let statistics = ClassStatistics::from_grid(grid);

  match dataset.rasterband(1) {
    Ok(mut band) => {
      if let Err(err) = write_metadata(&mut band, &statistics) {
        warn!("could not write statistics: {}", err);
      }
      if let Err(err) = write_attribute_table(&band, &statistics, legend) {
        warn!("could not write attribute table: {}", err);
      }
    }
    Err(err) => warn!("could not finish output band: {}", err),
  }

  if let Some(resampling) = overview_resampling {
    let levels = overview_levels(grid.width(), grid.height());
    debug!("overview levels {:?} ({})", levels, resampling);
    if !levels.is_empty() {
      if let Err(err) = dataset.build_overviews(resampling, &levels, &[]) {
        warn!("could not build overviews: {}", err);
      }
    }
  }

  statistics
}
