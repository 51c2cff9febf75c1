use crate::error::{ClassifyError, Result};

// Tolerance for lattice comparisons, in map units for pixel sizes and in pixels for offsets
const GRID_TOLERANCE: f64 = 0.0001;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinate {
  pub x: f64,
  pub y: f64,
}

/// Map grid of a north-up raster described by pixel centres.
///
/// GDAL geotransforms map pixel/line (i, j) to map (E, N):
///
/// ```text
/// E = gt[0] + i * gt[1] + j * gt[2]
/// N = gt[3] + i * gt[4] + j * gt[5]
/// ```
///
/// Only transforms with `gt[2] == gt[4] == 0` are representable here.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapInfo {
  pub upper_left_center: Coordinate,
  pub lower_right_center: Coordinate,
  pub pixel_width: f64,
  pub pixel_height: f64,
}

impl MapInfo {
  pub fn from_geo_transform(gt: &[f64; 6], width: usize, height: usize) -> Result<MapInfo> {
    if gt[2] != 0.0 || gt[4] != 0.0 {
      return Err(ClassifyError::configuration("expecting north up imagery only"));
    }

    let pixel_width = gt[1].abs();
    let pixel_height = gt[5].abs();
    let upper_left_center = Coordinate {
      x: gt[0] + 0.5 * gt[1],
      y: gt[3] + 0.5 * gt[5],
    };
    let lower_right_center = Coordinate {
      x: upper_left_center.x + (width as f64 - 1.0) * pixel_width,
      y: upper_left_center.y - (height as f64 - 1.0) * pixel_height,
    };

    Ok(MapInfo { upper_left_center, lower_right_center, pixel_width, pixel_height })
  }

  // Inverse of from_geo_transform for north-up grids
  pub fn to_geo_transform(&self) -> [f64; 6] {
    [
      self.upper_left_center.x - 0.5 * self.pixel_width,
      self.pixel_width,
      0.0,
      self.upper_left_center.y + 0.5 * self.pixel_height,
      0.0,
      -self.pixel_height,
    ]
  }

  // Fractional pixel position of a map coordinate (pixel centres are integral)
  pub fn map_to_raw(&self, e: f64, n: f64) -> (f64, f64) {
    (
      (e - self.upper_left_center.x) / self.pixel_width,
      (self.upper_left_center.y - n) / self.pixel_height,
    )
  }

  /// Column and row of the pixel containing map coordinate (E, N).
  /// The result may lie outside the raster.
  pub fn map_to_pixel(&self, e: f64, n: f64) -> (i64, i64) {
    let (x, y) = self.map_to_raw(e, n);
    (x.round() as i64, y.round() as i64)
  }

  pub fn pixel_center(&self, col: i64, row: i64) -> Coordinate {
    Coordinate {
      x: self.upper_left_center.x + col as f64 * self.pixel_width,
      y: self.upper_left_center.y - row as f64 * self.pixel_height,
    }
  }
}

fn off_lattice(n: f64) -> bool {
  (n - n.round()).abs() > GRID_TOLERANCE
}

/// Reason two grids cannot be read in registration, `None` when they can.
pub fn grid_mismatch(a: &MapInfo, b: &MapInfo) -> Option<&'static str> {
  if (a.pixel_width - b.pixel_width).abs() > GRID_TOLERANCE {
    return Some("inconsistent pixel width");
  }
  if (a.pixel_height - b.pixel_height).abs() > GRID_TOLERANCE {
    return Some("inconsistent pixel height");
  }

  let pixel_width = 0.5 * (a.pixel_width + b.pixel_width);
  let pixel_height = 0.5 * (a.pixel_height + b.pixel_height);

  if off_lattice((a.upper_left_center.x - b.upper_left_center.x) / pixel_width) {
    return Some("pixel centres not aligned along x");
  }
  if off_lattice((a.upper_left_center.y - b.upper_left_center.y) / pixel_height) {
    return Some("pixel centres not aligned along y");
  }
  None
}

pub fn same_grid(a: &MapInfo, b: &MapInfo) -> bool {
  grid_mismatch(a, b).is_none()
}

/// Part of a source raster copied into a destination buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
  pub src_col: usize,
  pub src_row: usize,
  pub dst_col: usize,
  pub dst_row: usize,
  pub width: usize,
  pub height: usize,
}

/// Intersection of a `dst_size` buffer placed at `offset` (source pixel
/// coordinates of its first cell) with a source raster of `src_size`.
/// Sizes are (width, height); `None` when they do not overlap.
pub fn overlap_window(offset: (i64, i64), dst_size: (usize, usize), src_size: (usize, usize)) -> Option<Window> {
  let axis = |start: i64, dst_len: usize, src_len: usize| -> Option<(usize, usize, usize)> {
    let first = start.max(0);
    let last = (start + dst_len as i64).min(src_len as i64);
    if last <= first {
      return None;
    }
    Some((first as usize, (first - start) as usize, (last - first) as usize))
  };

  let (src_col, dst_col, width) = axis(offset.0, dst_size.0, src_size.0)?;
  let (src_row, dst_row, height) = axis(offset.1, dst_size.1, src_size.1)?;

  Some(Window { src_col, src_row, dst_col, dst_row, width, height })
}
