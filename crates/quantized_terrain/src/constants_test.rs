use super::*;

#[test]
fn test_quantize_grid_coord_edges() {
  assert_eq!(quantize_grid_coord(0.0, 256), 0);
  // East/north edge computes to 32768 and must clamp.
  assert_eq!(quantize_grid_coord(256.0, 256), QUANTIZED_MAX);
  assert_eq!(quantize_grid_coord(128.0, 256), 16384);
}

#[test]
fn test_quantize_grid_coord_non_power_of_two_side() {
  // Placeholder grids use arbitrary sides.
  for side in [3u32, 5, 17, 63] {
    let mut last = 0;
    for i in 0..=side {
      let q = quantize_grid_coord(i as f64, side);
      assert!(q >= last, "quantized coordinates must be monotonic");
      last = q;
    }
    assert_eq!(last, QUANTIZED_MAX);
  }
}

#[test]
fn test_child_mask_all_children() {
  assert_eq!(CHILD_TILE_MASK_ALL, 15);
}
