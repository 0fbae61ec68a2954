//! Geographic rectangles.

use std::f64::consts::TAU;

/// Geodetic position.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Cartographic {
  pub longitude: f64,
  pub latitude: f64,
  pub height: f64,
}

impl Cartographic {
  pub fn new(longitude: f64, latitude: f64, height: f64) -> Self {
    Self {
      longitude,
      latitude,
      height,
    }
  }
}

/// Longitude/latitude box in radians. `east < west` means the box crosses the
/// antimeridian.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rectangle {
  pub west: f64,
  pub south: f64,
  pub east: f64,
  pub north: f64,
}

impl Rectangle {
  pub fn new(west: f64, south: f64, east: f64, north: f64) -> Self {
    Self {
      west,
      south,
      east,
      north,
    }
  }

  /// Angular width, accounting for antimeridian crossing.
  #[inline]
  pub fn width(&self) -> f64 {
    let mut east = self.east;
    if east < self.west {
      east += TAU;
    }
    east - self.west
  }

  #[inline]
  pub fn height(&self) -> f64 {
    self.north - self.south
  }

  /// Center point at zero height.
  pub fn center(&self) -> Cartographic {
    let mut longitude = self.west + self.width() * 0.5;
    if longitude > std::f64::consts::PI {
      longitude -= TAU;
    }
    Cartographic::new(longitude, (self.south + self.north) * 0.5, 0.0)
  }
}
