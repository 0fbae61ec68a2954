//! Reference ellipsoid.

use glam::DVec3;

/// Triaxial reference ellipsoid centered at the origin.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ellipsoid {
  radii: DVec3,
  radii_squared: DVec3,
  one_over_radii: DVec3,
  one_over_radii_squared: DVec3,
}

impl Ellipsoid {
  /// WGS84 radii in meters.
  pub const WGS84_RADII: [f64; 3] = [6378137.0, 6378137.0, 6356752.314_245_179_3];

  pub fn new(radii: DVec3) -> Self {
    let radii_squared = radii * radii;
    Self {
      radii,
      radii_squared,
      one_over_radii: DVec3::ONE / radii,
      one_over_radii_squared: DVec3::ONE / radii_squared,
    }
  }

  pub fn wgs84() -> Self {
    Self::new(DVec3::from_array(Self::WGS84_RADII))
  }

  #[inline]
  pub fn radii(&self) -> DVec3 {
    self.radii
  }

  #[inline]
  pub fn maximum_radius(&self) -> f64 {
    self.radii.max_element()
  }

  /// Surface normal for a geodetic longitude/latitude.
  #[inline]
  pub fn geodetic_surface_normal_cartographic(&self, longitude: f64, latitude: f64) -> DVec3 {
    let cos_lat = latitude.cos();
    DVec3::new(
      cos_lat * longitude.cos(),
      cos_lat * longitude.sin(),
      latitude.sin(),
    )
    .normalize()
  }

  /// Surface normal at (or above) a Cartesian position.
  #[inline]
  pub fn geodetic_surface_normal(&self, position: DVec3) -> DVec3 {
    (position * self.one_over_radii_squared).normalize()
  }

  /// Geodetic longitude/latitude/height to Cartesian.
  pub fn cartographic_to_cartesian(&self, longitude: f64, latitude: f64, height: f64) -> DVec3 {
    let n = self.geodetic_surface_normal_cartographic(longitude, latitude);
    let k = self.radii_squared * n;
    let gamma = n.dot(k).sqrt();
    k / gamma + n * height
  }

  /// Scale a position so the ellipsoid becomes the unit sphere.
  #[inline]
  pub fn transform_position_to_scaled_space(&self, position: DVec3) -> DVec3 {
    position * self.one_over_radii
  }
}

impl Default for Ellipsoid {
  fn default() -> Self {
    Self::wgs84()
  }
}

#[cfg(test)]
mod tests {
  use std::f64::consts::FRAC_PI_2;

  use super::*;

  #[test]
  fn test_equator_prime_meridian() {
    let e = Ellipsoid::wgs84();
    let p = e.cartographic_to_cartesian(0.0, 0.0, 0.0);
    assert!((p - DVec3::new(6378137.0, 0.0, 0.0)).length() < 1e-6);
  }

  #[test]
  fn test_north_pole_uses_polar_radius() {
    let e = Ellipsoid::wgs84();
    let p = e.cartographic_to_cartesian(0.0, FRAC_PI_2, 100.0);
    assert!(p.x.abs() < 1e-6);
    assert!((p.z - (Ellipsoid::WGS84_RADII[2] + 100.0)).abs() < 1e-6);
  }

  #[test]
  fn test_scaled_space_surface_is_unit_length() {
    let e = Ellipsoid::wgs84();
    for (lon, lat) in [(0.3, 0.2), (-2.0, -1.1), (1.5, 0.9)] {
      let p = e.cartographic_to_cartesian(lon, lat, 0.0);
      let scaled = e.transform_position_to_scaled_space(p);
      assert!((scaled.length() - 1.0).abs() < 1e-9);
    }
  }

  #[test]
  fn test_surface_normal_matches_cartographic_normal() {
    let e = Ellipsoid::wgs84();
    let p = e.cartographic_to_cartesian(0.7, 0.4, 0.0);
    let n1 = e.geodetic_surface_normal(p);
    let n2 = e.geodetic_surface_normal_cartographic(0.7, 0.4);
    assert!((n1 - n2).length() < 1e-9);
  }
}
