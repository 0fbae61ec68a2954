//! Per-level geometric error budget and the low-detail gate.
//!
//! ```text
//! level_max(z)     = levelZeroError / (tile_size / 256) / 2^z
//! error_at_zoom(z) = max(level_max(z) / detail_scalar, minimum_error)
//! scaled(tile)     = error_at_zoom(z) / (1 − sin φ)²      φ = tile center latitude
//!
//! skip synthesis  ⇔  z < min_zoom  ∨  scaled(tile) > error_at_zoom(min_zoom)
//! ```
//!
//! Web Mercator samples shrink toward the poles, so a tile near the pole at a
//! given level carries far more detail than its equatorial budget suggests.
//! The latitude factor pushes those tiles over the gate until deeper levels.

use std::f64::consts::TAU;

use crate::constants::{
  EPSILON5, HEIGHTMAP_TERRAIN_QUALITY, LEVEL_ZERO_HEIGHTMAP_WIDTH, PLACEHOLDER_DENSITY,
  PLACEHOLDER_LATITUDE_EXPONENT, PLACEHOLDER_MAX_LATITUDE_SINE, PLACEHOLDER_MIN_SIDE,
  REFERENCE_TILE_SIZE,
};
use crate::geo::{Ellipsoid, Rectangle};

/// Error budget for a provider configuration.
#[derive(Clone, Debug, PartialEq)]
pub struct ErrorModel {
  level_zero_error: f64,
  tile_size_scalar: f64,
  detail_scalar: f64,
  minimum_error: f64,
  min_zoom_level: u32,
  error_at_min_zoom: f64,
}

impl ErrorModel {
  pub fn new(
    ellipsoid: &Ellipsoid,
    tiles_x_at_level_zero: u64,
    tile_size: u32,
    detail_scalar: f64,
    minimum_error: f64,
    min_zoom_level: u32,
  ) -> Self {
    let mut model = Self {
      level_zero_error: estimated_level_zero_error(ellipsoid, tiles_x_at_level_zero),
      tile_size_scalar: tile_size as f64 / REFERENCE_TILE_SIZE,
      detail_scalar: detail_scalar + EPSILON5,
      minimum_error,
      min_zoom_level,
      error_at_min_zoom: 0.0,
    };
    model.error_at_min_zoom = model.error_at_zoom(min_zoom_level);
    model
  }

  pub fn min_zoom_level(&self) -> u32 {
    self.min_zoom_level
  }

  /// Unclamped heightmap error for a level, before the detail scalar.
  pub fn level_maximum_geometric_error(&self, level: u32) -> f64 {
    self.level_zero_error / self.tile_size_scalar / 2f64.powi(level as i32)
  }

  /// Mesh error bound for a level, floored at the minimum error.
  pub fn error_at_zoom(&self, level: u32) -> f64 {
    (self.level_maximum_geometric_error(level) / self.detail_scalar).max(self.minimum_error)
  }

  /// Error corrected for the latitude of the tile center.
  pub fn scaled_error(&self, level: u32, rectangle: &Rectangle) -> f64 {
    let latitude = rectangle.center().latitude;
    self.error_at_zoom(level) / (1.0 - latitude.sin()).powi(2)
  }

  /// Equatorial error at the minimum zoom level; the gate's threshold.
  pub fn error_at_min_zoom(&self) -> f64 {
    self.error_at_min_zoom
  }

  /// True if the tile is too coarse to be worth synthesizing.
  pub fn should_skip(&self, level: u32, rectangle: &Rectangle) -> bool {
    level < self.min_zoom_level || self.scaled_error(level, rectangle) > self.error_at_min_zoom
  }

  /// Placeholder vertices per side:
  /// `max(ceil(200 / (z + 1) · (1 − min(|sin φ|, 0.995))^0.25), 4)`.
  pub fn placeholder_side(&self, level: u32, rectangle: &Rectangle) -> u32 {
    let latitude = rectangle.center().latitude;
    let lat_scalar = latitude.sin().abs().min(PLACEHOLDER_MAX_LATITUDE_SINE);
    let side = (PLACEHOLDER_DENSITY / (level as f64 + 1.0)
      * (1.0 - lat_scalar).powf(PLACEHOLDER_LATITUDE_EXPONENT))
    .ceil();
    (side as u32).max(PLACEHOLDER_MIN_SIDE)
  }
}

/// Estimated level-zero geometric error of a 65-sample heightmap.
pub fn estimated_level_zero_error(ellipsoid: &Ellipsoid, tiles_x_at_level_zero: u64) -> f64 {
  ellipsoid.maximum_radius() * TAU * HEIGHTMAP_TERRAIN_QUALITY
    / (LEVEL_ZERO_HEIGHTMAP_WIDTH * tiles_x_at_level_zero as f64)
}

/// Longest triangle hypotenuse, in grid cells, before a split is forced.
pub fn max_vertex_distance(rectangle: &Rectangle) -> f64 {
  (2.0 / rectangle.height()).ceil()
}

#[cfg(test)]
#[path = "error_model_test.rs"]
mod error_model_test;
