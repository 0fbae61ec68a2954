//! Raster input boundary.

use std::collections::HashMap;
use std::sync::RwLock;

use crate::decode::PixelBuffer;
use crate::types::TileCoordinate;

/// Supplies raster tiles to the provider.
///
/// Fetch failures surface as `None`; the provider turns them into
/// placeholder tiles. Implementations are called from worker threads.
pub trait HeightmapSource: Send + Sync {
  /// Raster tile edge length in pixels.
  fn sample_size(&self) -> usize;

  /// Pixel buffer for `coord`, or `None` if it cannot be produced.
  fn get_samples(&self, coord: TileCoordinate) -> Option<PixelBuffer>;

  /// Whether a tile exists at `coord`.
  fn is_available(&self, coord: TileCoordinate) -> bool;
}

/// Zoom-level availability rule shared by sources.
///
/// The maximum zoom is always available; odd levels may be skipped below it,
/// and nothing exists above it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ZoomAvailability {
  pub max_zoom: u32,
  pub skip_odd_levels: bool,
}

impl ZoomAvailability {
  pub fn new(max_zoom: u32, skip_odd_levels: bool) -> Self {
    Self {
      max_zoom,
      skip_odd_levels,
    }
  }

  pub fn is_available(&self, z: u32) -> bool {
    if z == self.max_zoom {
      return true;
    }
    if self.skip_odd_levels && z % 2 == 1 {
      return false;
    }
    z <= self.max_zoom
  }
}

/// In-memory source. Tiles not inserted are unavailable.
#[derive(Debug)]
pub struct MemorySource {
  sample_size: usize,
  zoom: ZoomAvailability,
  tiles: RwLock<HashMap<TileCoordinate, PixelBuffer>>,
}

impl MemorySource {
  pub fn new(sample_size: usize, zoom: ZoomAvailability) -> Self {
    Self {
      sample_size,
      zoom,
      tiles: RwLock::new(HashMap::new()),
    }
  }

  pub fn insert(&self, coord: TileCoordinate, pixels: PixelBuffer) {
    if let Ok(mut tiles) = self.tiles.write() {
      tiles.insert(coord, pixels);
    }
  }

  pub fn len(&self) -> usize {
    self.tiles.read().map(|tiles| tiles.len()).unwrap_or(0)
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }
}

impl HeightmapSource for MemorySource {
  fn sample_size(&self) -> usize {
    self.sample_size
  }

  fn get_samples(&self, coord: TileCoordinate) -> Option<PixelBuffer> {
    self.tiles.read().ok()?.get(&coord).cloned()
  }

  fn is_available(&self, coord: TileCoordinate) -> bool {
    self.zoom.is_available(coord.z)
      && self
        .tiles
        .read()
        .map(|tiles| tiles.contains_key(&coord))
        .unwrap_or(false)
  }
}
