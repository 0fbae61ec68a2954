//! Tiling schemes mapping tile coordinates to geographic rectangles.

use std::f64::consts::{FRAC_PI_2, PI};

use super::{Ellipsoid, Rectangle};
use crate::types::TileCoordinate;

/// Rule mapping `(x, y, z)` tile coordinates to geographic rectangles.
pub trait TilingScheme: Send + Sync {
  fn ellipsoid(&self) -> &Ellipsoid;

  fn tiles_x_at_level(&self, level: u32) -> u64;

  fn tiles_y_at_level(&self, level: u32) -> u64;

  fn tile_rectangle(&self, coord: TileCoordinate) -> Rectangle;
}

/// Web Mercator quad-tree with a single level-zero tile.
///
/// With `fill_poles`, the top row's north edge and the bottom row's south edge
/// are stretched to the poles so the tile set covers the whole globe.
#[derive(Clone, Debug)]
pub struct WebMercatorTilingScheme {
  ellipsoid: Ellipsoid,
  semimajor_axis: f64,
  fill_poles: bool,
}

impl WebMercatorTilingScheme {
  pub fn new(ellipsoid: Ellipsoid, fill_poles: bool) -> Self {
    Self {
      semimajor_axis: ellipsoid.maximum_radius(),
      ellipsoid,
      fill_poles,
    }
  }

  pub fn fill_poles(&self) -> bool {
    self.fill_poles
  }

  /// Northern latitude limit of the Mercator square (≈ 85.0511°).
  pub fn maximum_latitude() -> f64 {
    FRAC_PI_2 - 2.0 * (-PI).exp().atan()
  }

  #[inline]
  fn mercator_y_to_latitude(&self, y: f64) -> f64 {
    FRAC_PI_2 - 2.0 * (-y / self.semimajor_axis).exp().atan()
  }
}

#[inline]
fn tiles_at_level(level: u32) -> u64 {
  1u64 << level.min(62)
}

impl TilingScheme for WebMercatorTilingScheme {
  fn ellipsoid(&self) -> &Ellipsoid {
    &self.ellipsoid
  }

  fn tiles_x_at_level(&self, level: u32) -> u64 {
    tiles_at_level(level)
  }

  fn tiles_y_at_level(&self, level: u32) -> u64 {
    tiles_at_level(level)
  }

  fn tile_rectangle(&self, coord: TileCoordinate) -> Rectangle {
    let extent = PI * self.semimajor_axis;
    let tiles_x = self.tiles_x_at_level(coord.z) as f64;
    let tiles_y = self.tiles_y_at_level(coord.z) as f64;
    let tile_width = 2.0 * extent / tiles_x;
    let tile_height = 2.0 * extent / tiles_y;

    let west_m = -extent + coord.x as f64 * tile_width;
    let east_m = west_m + tile_width;
    let north_m = extent - coord.y as f64 * tile_height;
    let south_m = north_m - tile_height;

    let mut rect = Rectangle::new(
      west_m / self.semimajor_axis,
      self.mercator_y_to_latitude(south_m),
      east_m / self.semimajor_axis,
      self.mercator_y_to_latitude(north_m),
    );

    if self.fill_poles {
      if coord.y == 0 {
        rect.north = FRAC_PI_2;
      }
      if coord.y as u64 + 1 == self.tiles_y_at_level(coord.z) {
        rect.south = -FRAC_PI_2;
      }
    }

    rect
  }
}
