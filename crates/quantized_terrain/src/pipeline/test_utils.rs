//! Test utilities for pipeline tests.
//!
//! Mock heightmap sources and raster fixtures for exercising the provider
//! without files or network.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Condvar, Mutex};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::ProviderConfig;
use crate::decode::{HeightEncoding, PixelBuffer};
use crate::source::{HeightmapSource, MemorySource, ZoomAvailability};
use crate::types::TileCoordinate;

/// Raster tile size used by pipeline tests.
pub const TEST_TILE_SIZE: usize = 16;

/// South of the equator at zoom 5, so the detail gate lets it through.
pub const SYNTH_COORD: TileCoordinate = TileCoordinate::new(16, 16, 5);

// =============================================================================
// Raster Fixtures
// =============================================================================

pub fn flat_pixels(height: f32) -> PixelBuffer {
  PixelBuffer::from_f32(TEST_TILE_SIZE, vec![height; TEST_TILE_SIZE * TEST_TILE_SIZE])
    .expect("flat buffer")
}

/// Bumpy float raster, deterministic per seed.
pub fn random_pixels(seed: u64) -> PixelBuffer {
  let mut rng = StdRng::seed_from_u64(seed);
  let data = (0..TEST_TILE_SIZE * TEST_TILE_SIZE)
    .map(|_| rng.random_range(0.0..2500.0))
    .collect();
  PixelBuffer::from_f32(TEST_TILE_SIZE, data).expect("random buffer")
}

/// Terrain-RGB raster where every pixel encodes `height` metres.
pub fn terrain_rgb_pixels(height: f64) -> PixelBuffer {
  let packed = ((height + 10000.0) * 10.0).round() as u32;
  let rgb = [(packed >> 16) as u8, (packed >> 8) as u8, packed as u8];
  let data = rgb.repeat(TEST_TILE_SIZE * TEST_TILE_SIZE);
  PixelBuffer::from_rgb8(TEST_TILE_SIZE, 3, data).expect("rgb buffer")
}

/// Small tiles, float rasters, two workers and two in-flight slots.
pub fn test_config() -> ProviderConfig {
  ProviderConfig::default()
    .with_tile_size(TEST_TILE_SIZE as u32)
    .with_encoding(HeightEncoding::Float32)
    .with_worker_threads(2)
    .with_max_concurrent_tiles(2)
}

/// Memory source holding `pixels` at each of `coords`.
pub fn memory_source(coords: &[TileCoordinate], pixels: PixelBuffer) -> MemorySource {
  let source = MemorySource::new(TEST_TILE_SIZE, ZoomAvailability::new(15, false));
  for &coord in coords {
    source.insert(coord, pixels.clone());
  }
  source
}

// =============================================================================
// Mock Sources
// =============================================================================

/// Counts `get_samples` calls on the wrapped source.
pub struct CountingSource<S> {
  pub inner: S,
  fetches: AtomicUsize,
}

impl<S: HeightmapSource> CountingSource<S> {
  pub fn new(inner: S) -> Self {
    Self {
      inner,
      fetches: AtomicUsize::new(0),
    }
  }

  pub fn count(&self) -> usize {
    self.fetches.load(Ordering::SeqCst)
  }
}

impl<S: HeightmapSource> HeightmapSource for CountingSource<S> {
  fn sample_size(&self) -> usize {
    self.inner.sample_size()
  }

  fn get_samples(&self, coord: TileCoordinate) -> Option<PixelBuffer> {
    self.fetches.fetch_add(1, Ordering::SeqCst);
    self.inner.get_samples(coord)
  }

  fn is_available(&self, coord: TileCoordinate) -> bool {
    self.inner.is_available(coord)
  }
}

/// Blocks every fetch until [`GatedSource::open`] is called.
pub struct GatedSource {
  pixels: PixelBuffer,
  open: Mutex<bool>,
  signal: Condvar,
}

impl GatedSource {
  pub fn new(pixels: PixelBuffer) -> Self {
    Self {
      pixels,
      open: Mutex::new(false),
      signal: Condvar::new(),
    }
  }

  pub fn open(&self) {
    *self.open.lock().expect("gate lock") = true;
    self.signal.notify_all();
  }
}

impl HeightmapSource for GatedSource {
  fn sample_size(&self) -> usize {
    self.pixels.size
  }

  fn get_samples(&self, _coord: TileCoordinate) -> Option<PixelBuffer> {
    let mut open = self.open.lock().expect("gate lock");
    while !*open {
      open = self.signal.wait(open).expect("gate wait");
    }
    Some(self.pixels.clone())
  }

  fn is_available(&self, _coord: TileCoordinate) -> bool {
    true
  }
}

/// Panics on every fetch.
pub struct PanickingSource;

impl HeightmapSource for PanickingSource {
  fn sample_size(&self) -> usize {
    TEST_TILE_SIZE
  }

  fn get_samples(&self, coord: TileCoordinate) -> Option<PixelBuffer> {
    panic!("raster backend crashed fetching {coord}");
  }

  fn is_available(&self, _coord: TileCoordinate) -> bool {
    true
  }
}
