//! ProviderConfig - every recognized provider option and its default.
//!
//! Loaded from TOML (all keys optional) or built in code with the `with_*`
//! methods. [`ProviderConfig::validate`] runs before the provider starts.
//!
//! ```toml
//! tile_size = 512
//! max_zoom = 14
//! detail_scalar = 4.0
//! worker_threads = 0          # synthesize on the calling thread
//!
//! [encoding]
//! kind = "terrain_rgb"
//! interval = 10.0
//! offset = 10000.0
//! ```

use std::f64::consts::FRAC_PI_2;
use std::path::Path;

use glam::DVec3;
use serde::Deserialize;

use crate::constants::{DEFAULT_TILE_SIZE, MAX_TILE_SIZE};
use crate::decode::HeightEncoding;
use crate::error::ConfigError;
use crate::geo::Ellipsoid;

/// Provider configuration.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProviderConfig {
  /// Raster tile edge length in pixels. Power of two.
  pub tile_size: u32,

  /// Deepest level the source serves.
  pub max_zoom: u32,

  /// Report odd levels below `max_zoom` as unavailable.
  pub skip_odd_levels: bool,

  /// Divisor applied to the level error. Higher means denser meshes.
  pub detail_scalar: f64,

  /// Error floor in world units.
  pub minimum_error: f64,

  /// Levels below this always get placeholders.
  pub min_zoom_level: u32,

  /// Tiles synthesizing at once before requests are answered with Busy.
  pub max_concurrent_tiles: usize,

  /// Background synthesis threads. 0 synthesizes on the calling thread.
  pub worker_threads: usize,

  /// Stretch the outer tile rows to the poles.
  pub fill_poles: bool,

  /// Force splits of long triangles so coarse tiles follow the curvature.
  pub limit_edge_length: bool,

  /// Widest tile (radians) whose synthesized mesh is kept.
  pub max_tile_width: f64,

  /// Raster pixel encoding.
  pub encoding: HeightEncoding,

  pub ellipsoid: EllipsoidConfig,
}

/// Ellipsoid radii in world units.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EllipsoidConfig {
  pub radii: [f64; 3],
}

impl Default for EllipsoidConfig {
  fn default() -> Self {
    Self {
      radii: Ellipsoid::WGS84_RADII,
    }
  }
}

impl EllipsoidConfig {
  pub fn to_ellipsoid(&self) -> Ellipsoid {
    Ellipsoid::new(DVec3::from_array(self.radii))
  }
}

impl Default for ProviderConfig {
  fn default() -> Self {
    Self {
      tile_size: DEFAULT_TILE_SIZE,
      max_zoom: 15,
      skip_odd_levels: false,
      detail_scalar: 4.0,
      minimum_error: 0.1,
      min_zoom_level: 3,
      max_concurrent_tiles: 5,
      worker_threads: 5,
      fill_poles: true,
      limit_edge_length: true,
      max_tile_width: FRAC_PI_2,
      encoding: HeightEncoding::default(),
      ellipsoid: EllipsoidConfig::default(),
    }
  }
}

impl ProviderConfig {
  /// Parse and validate a TOML document.
  pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
    let config: Self = toml::from_str(text)?;
    config.validate()?;
    Ok(config)
  }

  /// Read, parse and validate a TOML file.
  pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
      path: path.to_path_buf(),
      source,
    })?;
    Self::from_toml_str(&text)
  }

  pub fn validate(&self) -> Result<(), ConfigError> {
    if self.tile_size < 2 || !self.tile_size.is_power_of_two() {
      return Err(ConfigError::invalid(
        "tile_size",
        format!("{} is not a power of two >= 2", self.tile_size),
      ));
    }
    if self.tile_size > MAX_TILE_SIZE {
      return Err(ConfigError::invalid(
        "tile_size",
        format!("{} exceeds the maximum of {MAX_TILE_SIZE}", self.tile_size),
      ));
    }
    if !is_positive(self.detail_scalar) {
      return Err(ConfigError::invalid(
        "detail_scalar",
        format!("{} must be positive", self.detail_scalar),
      ));
    }
    if !(self.minimum_error.is_finite() && self.minimum_error >= 0.0) {
      return Err(ConfigError::invalid(
        "minimum_error",
        format!("{} must be non-negative", self.minimum_error),
      ));
    }
    if self.max_concurrent_tiles == 0 {
      return Err(ConfigError::invalid("max_concurrent_tiles", "must be at least 1"));
    }
    if !is_positive(self.max_tile_width) {
      return Err(ConfigError::invalid(
        "max_tile_width",
        format!("{} must be positive", self.max_tile_width),
      ));
    }
    if let HeightEncoding::TerrainRgb { interval, .. } = self.encoding {
      if !is_positive(interval) {
        return Err(ConfigError::invalid(
          "encoding.interval",
          format!("{interval} must be positive"),
        ));
      }
    }
    if !self.ellipsoid.radii.iter().all(|r| is_positive(*r)) {
      return Err(ConfigError::invalid(
        "ellipsoid.radii",
        format!("{:?} must all be positive", self.ellipsoid.radii),
      ));
    }
    Ok(())
  }

  pub fn with_tile_size(mut self, tile_size: u32) -> Self {
    self.tile_size = tile_size;
    self
  }

  pub fn with_max_zoom(mut self, max_zoom: u32) -> Self {
    self.max_zoom = max_zoom;
    self
  }

  pub fn with_skip_odd_levels(mut self, skip: bool) -> Self {
    self.skip_odd_levels = skip;
    self
  }

  pub fn with_detail_scalar(mut self, detail_scalar: f64) -> Self {
    self.detail_scalar = detail_scalar;
    self
  }

  pub fn with_minimum_error(mut self, minimum_error: f64) -> Self {
    self.minimum_error = minimum_error;
    self
  }

  pub fn with_min_zoom_level(mut self, level: u32) -> Self {
    self.min_zoom_level = level;
    self
  }

  pub fn with_max_concurrent_tiles(mut self, max: usize) -> Self {
    self.max_concurrent_tiles = max;
    self
  }

  pub fn with_worker_threads(mut self, threads: usize) -> Self {
    self.worker_threads = threads;
    self
  }

  pub fn with_fill_poles(mut self, fill_poles: bool) -> Self {
    self.fill_poles = fill_poles;
    self
  }

  pub fn with_limit_edge_length(mut self, limit: bool) -> Self {
    self.limit_edge_length = limit;
    self
  }

  pub fn with_max_tile_width(mut self, radians: f64) -> Self {
    self.max_tile_width = radians;
    self
  }

  pub fn with_encoding(mut self, encoding: HeightEncoding) -> Self {
    self.encoding = encoding;
    self
  }

  pub fn with_ellipsoid_radii(mut self, radii: [f64; 3]) -> Self {
    self.ellipsoid.radii = radii;
    self
  }
}

#[inline]
fn is_positive(value: f64) -> bool {
  value.is_finite() && value > 0.0
}

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;
