use approx::assert_relative_eq;
use spectral_landcover::geo::{grid_mismatch, overlap_window, same_grid, MapInfo, Window};
use spectral_landcover::ClassifyError;

fn grid(x0: f64, y0: f64, pixel_width: f64, pixel_height: f64, width: usize, height: usize) -> MapInfo {
  MapInfo::from_geo_transform(&[x0, pixel_width, 0.0, y0, 0.0, -pixel_height], width, height).unwrap()
}

#[test]
fn test_map_info_pixel_centres() {
  let info = grid(1000.0, 5000.0, 20.0, 20.0, 100, 50);
  assert_relative_eq!(info.upper_left_center.x, 1010.0);
  assert_relative_eq!(info.upper_left_center.y, 4990.0);
  assert_relative_eq!(info.lower_right_center.x, 1010.0 + 99.0 * 20.0);
  assert_relative_eq!(info.lower_right_center.y, 4990.0 - 49.0 * 20.0);
}

#[test]
fn test_geo_transform_round_trip_non_square_pixels() {
  let gt = [1_570_000.0, 10.0, 0.0, 5_180_000.0, 0.0, -30.0];
  let info = MapInfo::from_geo_transform(&gt, 64, 32).unwrap();
  let back = info.to_geo_transform();
  for (a, b) in gt.iter().zip(back.iter()) {
    assert_relative_eq!(*a, *b, epsilon = 1e-9);
  }
}

#[test]
fn test_rotated_geo_transform_rejected() {
  let gt = [0.0, 10.0, 0.5, 0.0, 0.0, -10.0];
  assert!(matches!(MapInfo::from_geo_transform(&gt, 10, 10), Err(ClassifyError::Configuration(_))));
  let gt = [0.0, 10.0, 0.0, 0.0, 0.2, -10.0];
  assert!(matches!(MapInfo::from_geo_transform(&gt, 10, 10), Err(ClassifyError::Configuration(_))));
}

#[test]
fn test_map_to_pixel_rounds_to_nearest_centre() {
  let info = grid(0.0, 100.0, 10.0, 10.0, 10, 10);
  assert_eq!(info.map_to_pixel(5.0, 95.0), (0, 0));
  assert_eq!(info.map_to_pixel(14.0, 84.0), (1, 1));
  assert_eq!(info.map_to_pixel(36.0, 56.0), (3, 4));
  // outside the raster
  assert_eq!(info.map_to_pixel(-25.0, 125.0), (-3, -3));

  let centre = info.pixel_center(3, 4);
  assert_eq!(info.map_to_pixel(centre.x, centre.y), (3, 4));
}

#[test]
fn test_same_grid_reflexive_and_symmetric() {
  let a = grid(1000.0, 5000.0, 20.0, 20.0, 100, 100);
  let b = grid(1000.0 + 7.0 * 20.0, 5000.0 - 3.0 * 20.0, 20.0, 20.0, 40, 60);
  let c = grid(1005.0, 5000.0, 20.0, 20.0, 100, 100);
  let d = grid(1000.0, 5000.0, 25.0, 20.0, 100, 100);

  for g in [&a, &b, &c, &d] {
    assert!(same_grid(g, g));
  }
  for (x, y) in [(&a, &b), (&a, &c), (&a, &d), (&b, &c)] {
    assert_eq!(same_grid(x, y), same_grid(y, x));
  }

  assert!(same_grid(&a, &b));
  assert!(!same_grid(&a, &c));
  assert!(!same_grid(&a, &d));
}

#[test]
fn test_grid_mismatch_reasons() {
  let a = grid(0.0, 0.0, 10.0, 10.0, 10, 10);
  assert_eq!(grid_mismatch(&a, &a), None);
  assert_eq!(
    grid_mismatch(&a, &grid(0.0, 0.0, 10.5, 10.0, 10, 10)),
    Some("inconsistent pixel width")
  );
  assert_eq!(
    grid_mismatch(&a, &grid(0.0, 0.0, 10.0, 12.0, 10, 10)),
    Some("inconsistent pixel height")
  );
  assert_eq!(
    grid_mismatch(&a, &grid(0.0, 4.0, 10.0, 10.0, 10, 10)),
    Some("pixel centres not aligned along y")
  );
  // within tolerance of the lattice
  assert_eq!(grid_mismatch(&a, &grid(0.000_000_5, 0.0, 10.0, 10.0, 10, 10)), None);
}

#[test]
fn test_overlap_window_inside_and_clipped() {
  // destination fully inside source
  assert_eq!(
    overlap_window((2, 3), (4, 5), (10, 10)),
    Some(Window { src_col: 2, src_row: 3, dst_col: 0, dst_row: 0, width: 4, height: 5 })
  );
  // destination starts left of and above the source
  assert_eq!(
    overlap_window((-2, -1), (5, 5), (10, 10)),
    Some(Window { src_col: 0, src_row: 0, dst_col: 2, dst_row: 1, width: 3, height: 4 })
  );
  // destination runs past the right and bottom edges
  assert_eq!(
    overlap_window((8, 9), (5, 5), (10, 10)),
    Some(Window { src_col: 8, src_row: 9, dst_col: 0, dst_row: 0, width: 2, height: 1 })
  );
}

#[test]
fn test_overlap_window_disjoint() {
  assert_eq!(overlap_window((10, 0), (5, 5), (10, 10)), None);
  assert_eq!(overlap_window((-5, 0), (5, 5), (10, 10)), None);
  assert_eq!(overlap_window((0, 12), (5, 5), (10, 10)), None);
}
