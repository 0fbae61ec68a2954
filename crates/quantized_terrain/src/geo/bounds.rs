//! Bounding volumes for culling.

use glam::{DMat3, DVec3};

use super::{Ellipsoid, Rectangle};

/// Samples per rectangle side when fitting an oriented box.
const OBB_SAMPLES_PER_SIDE: usize = 16;

/// Oriented bounding box. Columns of `half_axes` are the box's half-extent
/// vectors.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OrientedBoundingBox {
  pub center: DVec3,
  pub half_axes: DMat3,
}

impl OrientedBoundingBox {
  /// Box enclosing the ellipsoid surface patch under `rectangle` between
  /// `minimum_height` and `maximum_height`.
  ///
  /// Axes follow the east/north/up frame at the rectangle center. The patch is
  /// sampled on a regular lattice and the extents are padded by the chord
  /// sagitta of one lattice diagonal, which bounds how far the surface between
  /// samples can bulge past the sampled points.
  pub fn from_rectangle(
    rectangle: &Rectangle,
    minimum_height: f64,
    maximum_height: f64,
    ellipsoid: &Ellipsoid,
  ) -> Self {
    let center = rectangle.center();
    let origin = ellipsoid.cartographic_to_cartesian(center.longitude, center.latitude, 0.0);
    let up = ellipsoid.geodetic_surface_normal(origin);
    let east = DVec3::new(-center.longitude.sin(), center.longitude.cos(), 0.0);
    let north = up.cross(east).normalize();

    let width = rectangle.width();
    let height = rectangle.height();
    let mut min = DVec3::splat(f64::INFINITY);
    let mut max = DVec3::splat(f64::NEG_INFINITY);

    for i in 0..=OBB_SAMPLES_PER_SIDE {
      let lon = rectangle.west + width * i as f64 / OBB_SAMPLES_PER_SIDE as f64;
      for j in 0..=OBB_SAMPLES_PER_SIDE {
        let lat = rectangle.south + height * j as f64 / OBB_SAMPLES_PER_SIDE as f64;
        for h in [minimum_height, maximum_height] {
          let offset = ellipsoid.cartographic_to_cartesian(lon, lat, h) - origin;
          let local = DVec3::new(offset.dot(east), offset.dot(north), offset.dot(up));
          min = min.min(local);
          max = max.max(local);
        }
      }
    }

    let step = width.hypot(height) / OBB_SAMPLES_PER_SIDE as f64;
    let outer_radius = ellipsoid.maximum_radius() + maximum_height.max(0.0);
    let sagitta = outer_radius * (1.0 - (step * 0.5).cos());
    min -= DVec3::splat(sagitta);
    max += DVec3::splat(sagitta);

    let mid = (min + max) * 0.5;
    let half = (max - min) * 0.5;

    Self {
      center: origin + east * mid.x + north * mid.y + up * mid.z,
      half_axes: DMat3::from_cols(east * half.x, north * half.y, up * half.z),
    }
  }

  /// Half-extent lengths along the box axes.
  pub fn half_extents(&self) -> DVec3 {
    DVec3::new(
      self.half_axes.x_axis.length(),
      self.half_axes.y_axis.length(),
      self.half_axes.z_axis.length(),
    )
  }

  /// True if `point` lies inside the box (with `tolerance` slack per axis).
  pub fn contains_point(&self, point: DVec3, tolerance: f64) -> bool {
    let offset = point - self.center;
    [self.half_axes.x_axis, self.half_axes.y_axis, self.half_axes.z_axis]
      .iter()
      .all(|axis| {
        let len = axis.length();
        if len == 0.0 {
          return offset.dot(*axis).abs() <= tolerance;
        }
        (offset.dot(*axis) / len).abs() <= len + tolerance
      })
  }
}

/// Bounding sphere.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingSphere {
  pub center: DVec3,
  pub radius: f64,
}

impl BoundingSphere {
  pub fn new(center: DVec3, radius: f64) -> Self {
    Self { center, radius }
  }

  /// Smallest sphere centered on the box that encloses it.
  pub fn from_oriented_bounding_box(obb: &OrientedBoundingBox) -> Self {
    let corner = obb.half_axes.x_axis + obb.half_axes.y_axis + obb.half_axes.z_axis;
    Self::new(obb.center, corner.length())
  }

  /// Sphere around the whole globe, including terrain up to `maximum_height`.
  pub fn globe(ellipsoid: &Ellipsoid, maximum_height: f64) -> Self {
    Self::new(
      DVec3::ZERO,
      ellipsoid.maximum_radius() + maximum_height.max(0.0),
    )
  }

  pub fn contains_point(&self, point: DVec3, tolerance: f64) -> bool {
    point.distance(self.center) <= self.radius + tolerance
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn sample_patch(rect: &Rectangle, heights: [f64; 2], e: &Ellipsoid) -> Vec<DVec3> {
    let mut points = Vec::new();
    for i in 0..=40 {
      for j in 0..=40 {
        let lon = rect.west + rect.width() * i as f64 / 40.0;
        let lat = rect.south + rect.height() * j as f64 / 40.0;
        for h in heights {
          points.push(e.cartographic_to_cartesian(lon, lat, h));
        }
      }
    }
    points
  }

  #[test]
  fn test_obb_encloses_patch() {
    let e = Ellipsoid::wgs84();
    for rect in [
      Rectangle::new(0.10, 0.20, 0.15, 0.25),
      Rectangle::new(-1.0, -0.8, -0.2, 0.1),
      Rectangle::new(2.0, 1.2, 2.6, 1.5),
    ] {
      let obb = OrientedBoundingBox::from_rectangle(&rect, -100.0, 4000.0, &e);
      let sphere = BoundingSphere::from_oriented_bounding_box(&obb);
      for p in sample_patch(&rect, [-100.0, 4000.0], &e) {
        assert!(obb.contains_point(p, 1e-3), "point outside box for {:?}", rect);
        assert!(sphere.contains_point(p, 1e-3));
      }
    }
  }

  #[test]
  fn test_obb_axes_are_orthogonal() {
    let e = Ellipsoid::wgs84();
    let obb =
      OrientedBoundingBox::from_rectangle(&Rectangle::new(0.3, 0.4, 0.35, 0.45), 0.0, 10.0, &e);
    let x = obb.half_axes.x_axis.normalize();
    let y = obb.half_axes.y_axis.normalize();
    let z = obb.half_axes.z_axis.normalize();
    assert!(x.dot(y).abs() < 1e-9);
    assert!(x.dot(z).abs() < 1e-9);
    assert!(y.dot(z).abs() < 1e-9);
  }

  #[test]
  fn test_globe_sphere_encloses_ellipsoid() {
    let e = Ellipsoid::wgs84();
    let sphere = BoundingSphere::globe(&e, 8848.0);
    assert_eq!(sphere.center, DVec3::ZERO);
    let peak = e.cartographic_to_cartesian(0.0, 0.0, 8848.0);
    assert!(sphere.contains_point(peak, 1e-6));
  }
}
