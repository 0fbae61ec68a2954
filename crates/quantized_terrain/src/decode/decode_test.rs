use super::*;

fn rgb_buffer(size: usize, f: impl Fn(usize, usize) -> [u8; 3]) -> PixelBuffer {
  let mut data = Vec::with_capacity(size * size * 4);
  for y in 0..size {
    for x in 0..size {
      let [r, g, b] = f(x, y);
      data.extend_from_slice(&[r, g, b, 255]);
    }
  }
  PixelBuffer::from_rgb8(size, 4, data).unwrap()
}

#[test]
fn test_terrain_rgb_formula() {
  let decoder = TerrainRgbDecoder::default();
  // ((39·256 + 16)·256 + 0) / 10 − 10000 = 246000
  assert_eq!(decoder.height(39, 16, 0), 246000.0);
  assert_eq!(decoder.height(0, 0, 0), -10000.0);
  // Sea level: 100000 = 1·65536 + 134·256 + 160
  assert_eq!(decoder.height(1, 134, 160), 0.0);
}

#[test]
fn test_terrain_rgb_custom_interval_offset() {
  let decoder = TerrainRgbDecoder::new(100.0, 0.0);
  for (r, g, b) in [(0u8, 0u8, 7u8), (3, 200, 17), (255, 255, 255)] {
    let expected = ((r as f64 * 256.0 + g as f64) * 256.0 + b as f64) / 100.0;
    assert_eq!(decoder.height(r, g, b), expected);
  }
}

#[test]
fn test_decode_grid_size_and_values() {
  let pixels = rgb_buffer(4, |x, y| [1, 134, 160 + (x + 4 * y) as u8]);
  let grid = decode_grid(&TerrainRgbDecoder::default(), &pixels, 4).unwrap();
  assert_eq!(grid.size(), 5);
  for y in 0..4 {
    for x in 0..4 {
      let expected = (x + 4 * y) as f32 / 10.0;
      assert!((grid.get(x, y) - expected).abs() < 1e-4);
    }
  }
}

#[test]
fn test_decode_grid_backfills_last_row_and_column() {
  let pixels = rgb_buffer(8, |x, y| [0, (x * 13) as u8, (y * 29) as u8]);
  let grid = decode_grid(&TerrainRgbDecoder::default(), &pixels, 8).unwrap();
  let last = grid.max_coord();
  for i in 0..=last {
    assert_eq!(grid.get(i, last), grid.get(i, last - 1), "row mismatch at column {i}");
    assert_eq!(grid.get(last, i), grid.get(last - 1, i), "column mismatch at row {i}");
  }
}

#[test]
fn test_float_decoder() {
  let heights: Vec<f32> = (0..16).map(|i| i as f32 * 2.5).collect();
  let pixels = PixelBuffer::from_f32(4, heights).unwrap();
  let grid = decode_grid(&Float32Decoder, &pixels, 4).unwrap();
  assert_eq!(grid.get(3, 2), 11.0 * 2.5);
  assert_eq!(grid.get(4, 2), 11.0 * 2.5);
}

#[test]
fn test_encoding_dispatch_matches_decoders() {
  let pixels = rgb_buffer(2, |x, y| [0, x as u8, y as u8]);
  let encoding = HeightEncoding::TerrainRgb {
    interval: 1.0,
    offset: 5.0,
  };
  let grid = decode_grid(&encoding, &pixels, 2).unwrap();
  assert_eq!(grid.get(1, 1), 256.0 + 1.0 - 5.0);
}

#[test]
fn test_decode_rejects_wrong_size() {
  let pixels = rgb_buffer(4, |_, _| [0, 0, 0]);
  let err = decode_grid(&TerrainRgbDecoder::default(), &pixels, 8).unwrap_err();
  assert!(matches!(
    err,
    SynthesisError::GridSizeMismatch {
      expected: 8,
      actual: 4
    }
  ));
}

#[test]
fn test_decode_rejects_wrong_format() {
  let pixels = PixelBuffer::from_f32(2, vec![0.0; 4]).unwrap();
  let err = decode_grid(&TerrainRgbDecoder::default(), &pixels, 2).unwrap_err();
  assert!(matches!(err, SynthesisError::UnsupportedPixelFormat { .. }));

  let rgb = rgb_buffer(2, |_, _| [0, 0, 0]);
  let err = decode_grid(&Float32Decoder, &rgb, 2).unwrap_err();
  assert!(matches!(err, SynthesisError::UnsupportedPixelFormat { .. }));
}

#[test]
fn test_pixel_buffer_length_check() {
  let err = PixelBuffer::from_rgb8(4, 3, vec![0; 10]).unwrap_err();
  assert!(matches!(err, SynthesisError::BufferLength { expected: 48, len: 10 }));
}

#[test]
fn test_encoding_from_toml() {
  #[derive(Deserialize)]
  struct Wrapper {
    encoding: HeightEncoding,
  }
  let w: Wrapper = toml::from_str("encoding = { kind = \"terrain_rgb\", interval = 5.0 }").unwrap();
  assert_eq!(
    w.encoding,
    HeightEncoding::TerrainRgb {
      interval: 5.0,
      offset: 10000.0
    }
  );
  let w: Wrapper = toml::from_str("encoding = { kind = \"float32\" }").unwrap();
  assert_eq!(w.encoding, HeightEncoding::Float32);
}
