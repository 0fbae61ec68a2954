//! Mesh to quantized terrain tile.
//!
//! ```text
//!  Mesh (grid space)          QuantizedTile
//!  ─────────────────          ────────────────────────────────────────
//!  vertices (px, py)   ──►    u, v        px·32768/S, (S−py)·32768/S
//!  grid heights        ──►    height      (h − min)·32767/(max − min)
//!  boundary vertices   ──►    west/south/east/north index lists
//!  error bound         ──►    skirt heights (error · 20)
//!  rectangle, min/max  ──►    bounding sphere, oriented box,
//!                             horizon occlusion point
//! ```
//!
//! All quantized values are clamped to [0, 32767].

use std::f64::consts::{FRAC_PI_2, FRAC_PI_4};

use glam::DVec3;

use crate::constants::{quantize_grid_coord, EPSILON5, QUANTIZED_MAX, SKIRT_ERROR_MULTIPLE};
use crate::error::SynthesisError;
use crate::geo::{BoundingSphere, Ellipsoid, OrientedBoundingBox, Rectangle};
use crate::types::{
  Edge, EdgeIndices, ElevationGrid, Mesh, QuantizedTile, QuantizedVertices, SkirtHeights,
  TileCoordinate,
};

/// Turns grid-space meshes into quantized tiles for one ellipsoid.
#[derive(Clone, Debug)]
pub struct MeshEncoder {
  ellipsoid: Ellipsoid,
  max_tile_width: f64,
}

impl MeshEncoder {
  /// `max_tile_width` (radians) is the widest tile whose synthesized mesh is
  /// kept; wider tiles are rejected with [`SynthesisError::TileTooWide`].
  pub fn new(ellipsoid: Ellipsoid, max_tile_width: f64) -> Self {
    Self {
      ellipsoid,
      max_tile_width,
    }
  }

  pub fn ellipsoid(&self) -> &Ellipsoid {
    &self.ellipsoid
  }

  pub fn max_tile_width(&self) -> f64 {
    self.max_tile_width
  }

  /// Encode a synthesized mesh sampled from `grid`.
  #[cfg_attr(feature = "trace_spans", tracing::instrument(skip_all, name = "encode"))]
  pub fn encode(
    &self,
    coord: TileCoordinate,
    mesh: &Mesh,
    grid: &ElevationGrid,
    rectangle: &Rectangle,
    error: f64,
  ) -> Result<QuantizedTile, SynthesisError> {
    let width = rectangle.width();
    if width > self.max_tile_width {
      return Err(SynthesisError::TileTooWide {
        coord,
        width,
        limit: self.max_tile_width,
      });
    }

    if mesh.vertices.is_empty() {
      return Err(SynthesisError::EmptyMesh);
    }

    let heights: Vec<f64> = mesh
      .vertices
      .iter()
      .map(|&[px, py]| grid.get(px as usize, py as usize) as f64)
      .collect();
    Ok(self.assemble(mesh, grid.max_coord() as u32, &heights, rectangle, error))
  }

  /// Flat stand-in tile with `side × side` vertices at zero height.
  ///
  /// Skips the width check: placeholders are the fallback for wide tiles.
  pub fn encode_placeholder(&self, side: u32, rectangle: &Rectangle, error: f64) -> QuantizedTile {
    let side = side.max(2);
    let mesh = placeholder_mesh(side);
    let heights = vec![0.0; mesh.vertex_count()];
    self.assemble(&mesh, side - 1, &heights, rectangle, error)
  }

  /// `mesh` must have at least one vertex.
  fn assemble(
    &self,
    mesh: &Mesh,
    grid_max: u32,
    heights: &[f64],
    rectangle: &Rectangle,
    error: f64,
  ) -> QuantizedTile {
    let (minimum_height, maximum_height) = height_range(heights);
    let mut vertices = QuantizedVertices::with_capacity(mesh.vertex_count());
    let mut edges = EdgeIndices::default();

    for (i, (&[px, py], &h)) in mesh.vertices.iter().zip(heights).enumerate() {
      vertices.u.push(quantize_grid_coord(px as f64, grid_max));
      vertices.v.push(quantize_grid_coord((grid_max - py) as f64, grid_max));
      vertices.height.push(quantize_height(h, minimum_height, maximum_height));
      for edge in Edge::classify(px, py, grid_max) {
        edges.push(edge, i as u32);
      }
    }

    let (bounding_sphere, oriented_bounding_box) =
      bounding_volume(&self.ellipsoid, rectangle, minimum_height, maximum_height);

    QuantizedTile {
      minimum_height,
      maximum_height,
      vertices,
      indices: mesh.flat_indices(),
      edges,
      skirt_heights: SkirtHeights::uniform(skirt_height(error)),
      bounding_sphere,
      oriented_bounding_box,
      horizon_occlusion_point: horizon_occlusion_point(&self.ellipsoid, rectangle, maximum_height),
      child_tile_mask: QuantizedTile::default_child_mask(),
    }
  }
}

/// Regular `side × side` grid mesh, wound like RTIN output.
pub fn placeholder_mesh(side: u32) -> Mesh {
  let cells = side.saturating_sub(1);
  let mut mesh = Mesh {
    vertices: Vec::with_capacity((side * side) as usize),
    triangles: Vec::with_capacity((cells * cells * 2) as usize),
  };
  for y in 0..side {
    for x in 0..side {
      mesh.vertices.push([x, y]);
    }
  }
  for y in 0..cells {
    for x in 0..cells {
      let tl = y * side + x;
      let tr = tl + 1;
      let bl = tl + side;
      let br = bl + 1;
      mesh.triangles.push([tl, br, tr]);
      mesh.triangles.push([br, tl, bl]);
    }
  }
  mesh
}

fn height_range(heights: &[f64]) -> (f64, f64) {
  heights
    .iter()
    .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &h| (lo.min(h), hi.max(h)))
}

/// Height to [0, 32767]. Collapses to 0 when the tile spans less than one
/// world unit.
#[inline]
pub fn quantize_height(height: f64, minimum: f64, maximum: f64) -> u16 {
  let range = maximum - minimum;
  if range < 1.0 {
    return 0;
  }
  ((height - minimum) * (QUANTIZED_MAX as f64 / range))
    .round()
    .clamp(0.0, QUANTIZED_MAX as f64) as u16
}

/// Skirt depth for a tile encoded at `error`. Never negative.
#[inline]
pub fn skirt_height(error: f64) -> f64 {
  (error * SKIRT_ERROR_MULTIPLE).max(0.0)
}

/// Bounding sphere and, for tiles narrower than a right angle, the oriented
/// box it was derived from.
pub fn bounding_volume(
  ellipsoid: &Ellipsoid,
  rectangle: &Rectangle,
  minimum_height: f64,
  maximum_height: f64,
) -> (BoundingSphere, Option<OrientedBoundingBox>) {
  if rectangle.width() + EPSILON5 >= FRAC_PI_2 {
    return (BoundingSphere::globe(ellipsoid, maximum_height), None);
  }
  let obb = OrientedBoundingBox::from_rectangle(rectangle, minimum_height, maximum_height, ellipsoid);
  (BoundingSphere::from_oriented_bounding_box(&obb), Some(obb))
}

/// Point above the tile center in ellipsoid-scaled space.
///
/// The point sits `cos(w/2)·R + max_height` above the surface, or
/// `(1 + w/2)·R` once the half width passes 45°, far enough out that the tile
/// is never reported occluded while any of it is visible.
pub fn horizon_occlusion_point(
  ellipsoid: &Ellipsoid,
  rectangle: &Rectangle,
  maximum_height: f64,
) -> DVec3 {
  let center = rectangle.center();
  let half_angle = rectangle.width() * 0.5;
  let radius = ellipsoid.maximum_radius();
  let occlusion_height = if half_angle > FRAC_PI_4 {
    (1.0 + half_angle) * radius
  } else {
    half_angle.cos() * radius + maximum_height
  };
  let position = ellipsoid.cartographic_to_cartesian(center.longitude, center.latitude, occlusion_height);
  ellipsoid.transform_position_to_scaled_space(position)
}
