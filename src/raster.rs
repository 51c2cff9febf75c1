use gdal::raster::{Buffer, GdalDataType, GdalType, RasterBand};
use gdal::{Dataset, DriverManager};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::{ClassifyError, Result};
use crate::geo::{grid_mismatch, overlap_window, MapInfo};

// Used when a dataset carries no geotransform
const DEFAULT_GEO_TRANSFORM: [f64; 6] = [0.0, 1.0, 0.0, 0.0, 0.0, -1.0];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RasterParams {
  pub width: usize,
  pub height: usize,
  pub geo_transform: [f64; 6],
}

/// Row-major two-dimensional grid with bounds-checked access.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid<T> {
  width: usize,
  height: usize,
  data: Vec<T>,
}

impl<T: Copy> Grid<T> {
  // Create a new grid filled with an initial value
  pub fn new(width: usize, height: usize, initial_value: T) -> Self {
    Grid { width, height, data: vec![initial_value; width * height] }
  }

  pub fn from_vec(width: usize, height: usize, data: Vec<T>) -> Result<Self> {
    if data.len() != width * height {
      return Err(ClassifyError::configuration(format!(
        "grid of {} x {} cannot hold {} values",
        width,
        height,
        data.len()
      )));
    }
    Ok(Grid { width, height, data })
  }

  pub fn width(&self) -> usize {
    self.width
  }

  pub fn height(&self) -> usize {
    self.height
  }

  pub fn size(&self) -> (usize, usize) {
    (self.width, self.height)
  }

  pub fn get(&self, row: usize, col: usize) -> Option<T> {
    if row < self.height && col < self.width {
      Some(self.data[row * self.width + col])
    } else {
      None
    }
  }

  // Set the value at a specific row and column; false when out of bounds
  pub fn set_item(&mut self, row: usize, col: usize, value: T) -> bool {
    if row < self.height && col < self.width {
      self.data[row * self.width + col] = value;
      true
    } else {
      false
    }
  }

  pub fn row(&self, row: usize) -> Option<&[T]> {
    if row < self.height {
      Some(&self.data[row * self.width..(row + 1) * self.width])
    } else {
      None
    }
  }

  pub fn row_mut(&mut self, row: usize) -> Option<&mut [T]> {
    if row < self.height {
      Some(&mut self.data[row * self.width..(row + 1) * self.width])
    } else {
      None
    }
  }

  pub fn data(&self) -> &[T] {
    &self.data
  }
}

impl<T: GdalType + Copy> Grid<T> {
  // Load a whole band
  pub fn from_raster_band(rasterband: &RasterBand) -> Result<Self> {
    let buffer = rasterband.read_band_as::<T>()?;
    let ((width, height), data) = buffer.into_shape_and_vec();
    Grid::from_vec(width, height, data)
  }

  pub fn to_gdal_buffer(&self) -> Buffer<T> {
    Buffer::new((self.width, self.height), self.data.clone())
  }
}

/// An opened raster file with the grid description shared by its bands.
pub struct RasterSource {
  path: PathBuf,
  dataset: Dataset,
  params: RasterParams,
  projection: String,
  info: MapInfo,
}

impl RasterSource {
  pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
    let path = path.as_ref().to_path_buf();
    let dataset = Dataset::open(&path)
      .map_err(|err| ClassifyError::configuration(format!("error opening {}: {}", path.display(), err)))?;

    let (width, height) = dataset.raster_size();
    let geo_transform = dataset.geo_transform().unwrap_or(DEFAULT_GEO_TRANSFORM);
    let info = MapInfo::from_geo_transform(&geo_transform, width, height)
      .map_err(|err| ClassifyError::configuration(format!("{}: {}", path.display(), err)))?;
    let projection = dataset.projection();

    Ok(RasterSource {
      path,
      dataset,
      params: RasterParams { width, height, geo_transform },
      projection,
      info,
    })
  }

  pub fn band_count(&self) -> usize {
    self.dataset.raster_count()
  }

  pub fn projection(&self) -> &str {
    &self.projection
  }

  pub fn info(&self) -> &MapInfo {
    &self.info
  }

  fn typed_band(&self, band_index: usize, expected: GdalDataType) -> Result<RasterBand<'_>> {
    let band = self.dataset.rasterband(band_index)?;
    let found = band.band_type();
    if found != expected {
      return Err(ClassifyError::configuration(format!(
        "{} [Layer {}]: expecting {} data [{}]",
        self.path.display(),
        band_index,
        expected.name(),
        found.name()
      )));
    }
    Ok(band)
  }

  /// Reads a whole band after checking its pixel type.
  pub fn read_band<T: GdalType + Copy>(&self, band_index: usize, expected: GdalDataType) -> Result<Grid<T>> {
    let band = self.typed_band(band_index, expected)?;
    info!("Reading {} [Layer {}]...", self.path.display(), band_index);
    Grid::from_raster_band(&band)
  }

  /// Reads a band into a buffer laid over `target`, a grid of `size` cells
  /// that must share this raster's pixel lattice. Cells outside this raster
  /// keep `fill`.
  pub fn read_aligned<T: GdalType + Copy>(
    &self,
    band_index: usize,
    expected: GdalDataType,
    target: &MapInfo,
    size: (usize, usize),
    fill: T,
  ) -> Result<Grid<T>> {
    self.aligned(band_index, Some(expected), target, size, fill)
  }

  /// Like `read_aligned`, converting whatever pixel type the band holds.
  pub fn read_aligned_as<T: GdalType + Copy>(
    &self,
    band_index: usize,
    target: &MapInfo,
    size: (usize, usize),
    fill: T,
  ) -> Result<Grid<T>> {
    self.aligned(band_index, None, target, size, fill)
  }

  fn aligned<T: GdalType + Copy>(
    &self,
    band_index: usize,
    expected: Option<GdalDataType>,
    target: &MapInfo,
    size: (usize, usize),
    fill: T,
  ) -> Result<Grid<T>> {
    if let Some(reason) = grid_mismatch(&self.info, target) {
      return Err(ClassifyError::alignment(format!(
        "{} is not on the grid of the classified raster ({})",
        self.path.display(),
        reason
      )));
    }

    let offset = self.info.map_to_pixel(target.upper_left_center.x, target.upper_left_center.y);
    let window = overlap_window(offset, size, (self.params.width, self.params.height)).ok_or_else(|| {
      ClassifyError::alignment(format!("{} does not overlap the classified raster", self.path.display()))
    })?;
    debug!("aligned read of {} at offset {:?}: {:?}", self.path.display(), offset, window);

    let band = match expected {
      Some(expected) => self.typed_band(band_index, expected)?,
      None => self.dataset.rasterband(band_index)?,
    };
    info!(
      "Reading {} ...({},{}) -> ({} x {})",
      self.path.display(),
      offset.0,
      offset.1,
      size.0,
      size.1
    );
    let buffer = band.read_as::<T>(
      (window.src_col as isize, window.src_row as isize),
      (window.width, window.height),
      (window.width, window.height),
      None,
    )?;

    let mut grid = Grid::new(size.0, size.1, fill);
    for (r, chunk) in buffer.data().chunks(window.width).enumerate() {
      if let Some(row) = grid.row_mut(window.dst_row + r) {
        row[window.dst_col..window.dst_col + window.width].copy_from_slice(chunk);
      }
    }
    Ok(grid)
  }
}

/// Number of bands in a raster file, checked before any typed read.
pub fn band_count<P: AsRef<Path>>(path: P) -> Result<usize> {
  let path = path.as_ref();
  let count = RasterSource::open(path)?.band_count();
  if count == 0 {
    return Err(ClassifyError::configuration(format!(
      "invalid number of bands returned from {} [{}]",
      path.display(),
      count
    )));
  }
  Ok(count)
}

/// GDAL driver for an output file, chosen by extension.
pub fn output_driver(path: &Path) -> Result<&'static str> {
  let extension = path
    .extension()
    .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
    .unwrap_or_default();

  match extension.as_str() {
    "kea" => Ok("KEA"),
    "img" => Ok("HFA"),
    "tif" | "tiff" => Ok("GTiff"),
    _ => Err(ClassifyError::configuration(format!(
      "unsupported file extension for {} (expecting .kea, .img or .tif)",
      path.display()
    ))),
  }
}

/// Creates a new single band byte raster; the file must not exist yet.
pub fn create_output(path: &Path, params: &RasterParams, projection: &str) -> Result<Dataset> {
  let driver_name = output_driver(path)?;
  if path.exists() {
    return Err(ClassifyError::configuration(format!("{} already exists", path.display())));
  }

  info!("Creating {}... ({})", path.display(), driver_name);
  let driver = DriverManager::get_driver_by_name(driver_name)?;
  let mut dataset = driver.create_with_band_type::<u8, _>(path, params.width, params.height, 1)?;
  dataset.set_geo_transform(&params.geo_transform)?;
  if !projection.is_empty() {
    dataset.set_projection(projection)?;
  }
  Ok(dataset)
}

pub fn write_grid<T: GdalType + Copy>(dataset: &Dataset, band_index: usize, grid: &Grid<T>) -> Result<()> {
  let mut band = dataset.rasterband(band_index)?;
  let mut buffer = grid.to_gdal_buffer();
  info!("Writing Layer {}", band_index);
  band.write((0, 0), grid.size(), &mut buffer)?;
  Ok(())
}
