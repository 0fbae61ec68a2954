//! Core data types for tile synthesis.

use std::fmt;

use smallvec::SmallVec;

use crate::constants::CHILD_TILE_MASK_ALL;
use crate::error::SynthesisError;
use crate::geo::{BoundingSphere, OrientedBoundingBox};

/// Tile address in a quad-tree tiling scheme.
///
/// `z` is the zoom level; `x` grows eastward and `y` grows southward from the
/// north-west corner.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileCoordinate {
  pub x: u32,
  pub y: u32,
  pub z: u32,
}

impl TileCoordinate {
  #[inline]
  pub const fn new(x: u32, y: u32, z: u32) -> Self {
    Self { x, y, z }
  }
}

impl fmt::Display for TileCoordinate {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}/{}/{}", self.z, self.x, self.y)
  }
}

/// Square height grid with side `2^k + 1`, row-major (`y * size + x`).
#[derive(Clone, Debug, PartialEq)]
pub struct ElevationGrid {
  size: usize,
  heights: Vec<f32>,
}

impl ElevationGrid {
  /// Grid of `size × size` zero heights. `size` must be `2^k + 1`.
  pub fn new(size: usize) -> Result<Self, SynthesisError> {
    Self::from_heights(size, vec![0.0; size * size])
  }

  /// Wrap existing heights. `heights.len()` must equal `size²`.
  pub fn from_heights(size: usize, heights: Vec<f32>) -> Result<Self, SynthesisError> {
    if size < 2 || !(size - 1).is_power_of_two() {
      return Err(SynthesisError::NonPowerOfTwoGrid(size));
    }
    if heights.len() != size * size {
      return Err(SynthesisError::BufferLength {
        expected: size * size,
        len: heights.len(),
      });
    }
    Ok(Self { size, heights })
  }

  /// Side length (`tile size + 1`).
  #[inline]
  pub fn size(&self) -> usize {
    self.size
  }

  /// Largest grid coordinate (`size - 1`), the `S` of the quantization formulas.
  #[inline]
  pub fn max_coord(&self) -> usize {
    self.size - 1
  }

  #[inline(always)]
  pub fn index(&self, x: usize, y: usize) -> usize {
    y * self.size + x
  }

  #[inline(always)]
  pub fn get(&self, x: usize, y: usize) -> f32 {
    self.heights[self.index(x, y)]
  }

  #[inline(always)]
  pub fn set(&mut self, x: usize, y: usize, height: f32) {
    let idx = self.index(x, y);
    self.heights[idx] = height;
  }

  pub fn heights(&self) -> &[f32] {
    &self.heights
  }

  /// Reject grids holding NaN or infinite heights.
  pub fn check_finite(&self) -> Result<(), SynthesisError> {
    match self.heights.iter().position(|h| !h.is_finite()) {
      Some(idx) => Err(SynthesisError::NonFiniteHeight {
        x: idx % self.size,
        y: idx / self.size,
      }),
      None => Ok(()),
    }
  }
}

/// Triangulated mesh in grid space, before quantization.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Mesh {
  /// Grid coordinates `(px, py)` of each vertex.
  pub vertices: Vec<[u32; 2]>,
  /// Vertex index triples; all triangles share one winding.
  pub triangles: Vec<[u32; 3]>,
}

impl Mesh {
  pub fn vertex_count(&self) -> usize {
    self.vertices.len()
  }

  pub fn triangle_count(&self) -> usize {
    self.triangles.len()
  }

  pub fn is_empty(&self) -> bool {
    self.triangles.is_empty()
  }

  /// Flat index buffer (3 indices per triangle).
  pub fn flat_indices(&self) -> Vec<u32> {
    self.triangles.iter().flatten().copied().collect()
  }
}

/// Tile boundary side.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Edge {
  West,
  South,
  East,
  North,
}

impl Edge {
  /// Sides a grid vertex lies on. Corners lie on two.
  #[inline]
  pub fn classify(px: u32, py: u32, grid_max: u32) -> SmallVec<[Edge; 2]> {
    let mut edges = SmallVec::new();
    if px == 0 {
      edges.push(Edge::West);
    }
    if py == grid_max {
      edges.push(Edge::South);
    }
    if px == grid_max {
      edges.push(Edge::East);
    }
    if py == 0 {
      edges.push(Edge::North);
    }
    edges
  }
}

/// Vertex indices on each tile side, in vertex order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EdgeIndices {
  pub west: Vec<u32>,
  pub south: Vec<u32>,
  pub east: Vec<u32>,
  pub north: Vec<u32>,
}

impl EdgeIndices {
  pub fn push(&mut self, edge: Edge, vertex: u32) {
    self.side_mut(edge).push(vertex);
  }

  pub fn side(&self, edge: Edge) -> &[u32] {
    match edge {
      Edge::West => &self.west,
      Edge::South => &self.south,
      Edge::East => &self.east,
      Edge::North => &self.north,
    }
  }

  fn side_mut(&mut self, edge: Edge) -> &mut Vec<u32> {
    match edge {
      Edge::West => &mut self.west,
      Edge::South => &mut self.south,
      Edge::East => &mut self.east,
      Edge::North => &mut self.north,
    }
  }
}

/// Quantized vertex planes, each value in [0, 32767].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct QuantizedVertices {
  pub u: Vec<u16>,
  pub v: Vec<u16>,
  pub height: Vec<u16>,
}

impl QuantizedVertices {
  pub fn with_capacity(count: usize) -> Self {
    Self {
      u: Vec::with_capacity(count),
      v: Vec::with_capacity(count),
      height: Vec::with_capacity(count),
    }
  }

  pub fn len(&self) -> usize {
    self.u.len()
  }

  pub fn is_empty(&self) -> bool {
    self.u.is_empty()
  }

  /// `[u..., v..., height...]`, the plane layout terrain renderers consume.
  pub fn to_planes(&self) -> Vec<u16> {
    let mut planes = Vec::with_capacity(self.len() * 3);
    planes.extend_from_slice(&self.u);
    planes.extend_from_slice(&self.v);
    planes.extend_from_slice(&self.height);
    planes
  }
}

/// Skirt heights per side, in world units.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SkirtHeights {
  pub west: f64,
  pub south: f64,
  pub east: f64,
  pub north: f64,
}

impl SkirtHeights {
  pub fn uniform(height: f64) -> Self {
    Self {
      west: height,
      south: height,
      east: height,
      north: height,
    }
  }
}

/// Final encoded terrain tile.
#[derive(Clone, Debug, PartialEq)]
pub struct QuantizedTile {
  pub minimum_height: f64,
  pub maximum_height: f64,
  pub vertices: QuantizedVertices,
  /// Triangle indices (3 per triangle).
  pub indices: Vec<u32>,
  pub edges: EdgeIndices,
  pub skirt_heights: SkirtHeights,
  pub bounding_sphere: BoundingSphere,
  /// Absent for globe-spanning tiles; use the bounding sphere alone.
  pub oriented_bounding_box: Option<OrientedBoundingBox>,
  /// Ellipsoid-scaled-space point for horizon culling.
  pub horizon_occlusion_point: glam::DVec3,
  pub child_tile_mask: u8,
}

impl QuantizedTile {
  pub fn vertex_count(&self) -> usize {
    self.vertices.len()
  }

  pub fn triangle_count(&self) -> usize {
    self.indices.len() / 3
  }

  /// All four children are reported available.
  pub const fn default_child_mask() -> u8 {
    CHILD_TILE_MASK_ALL
  }
}

#[cfg(test)]
#[path = "types_test.rs"]
mod types_test;
