//! Right-triangulated irregular network (RTIN) simplification.
//!
//! A `(2^k + 1)²` grid is covered by two root right triangles. Each triangle
//! splits at its hypotenuse midpoint into two children, alternating diagonals
//! level by level down to single-cell triangles.
//!
//! ```text
//!  (0,0) a ─────────── c (S,0)        a ─────── c
//!        │ ╲           │              │ ╲   ╱ │     children of (a, b, c):
//!        │   ╲   #0    │    split     │   m   │       (c, a, m)
//!        │ #1  ╲       │   ───────►   │ ╱   ╲ │       (b, c, m)
//!        │       ╲     │              │       │
//!  (0,S) └─────────── b (S,S)         ...     b
//! ```
//!
//! # Phases
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │ Rtin::new(grid_size)          once per grid size, shareable   │
//! │   triangle coordinates for every node of the implicit tree    │
//! └───────────────────────────────────────────────────────────────┘
//!                               │
//!                               ▼
//! ┌───────────────────────────────────────────────────────────────┐
//! │ Rtin::create_tile(grid)       once per elevation grid         │
//! │   error at every hypotenuse midpoint, smallest triangles      │
//! │   first, each parent taking the max of its children           │
//! └───────────────────────────────────────────────────────────────┘
//!                               │
//!                               ▼
//! ┌───────────────────────────────────────────────────────────────┐
//! │ RtinTile::mesh(max_error, max_length)   per error bound       │
//! │   walk from the roots, split while the midpoint error exceeds │
//! │   the bound, emit leaves as triangles                         │
//! └───────────────────────────────────────────────────────────────┘
//! ```
//!
//! Because a midpoint's error already includes every descendant's error,
//! whenever a triangle splits its neighbor across the shared hypotenuse
//! splits too. Retained edges therefore always end on shared grid vertices.

use crate::constants::MAX_TILE_SIZE;
use crate::error::SynthesisError;
use crate::types::{ElevationGrid, Mesh};

/// Precomputed triangle hierarchy for one grid size.
///
/// Holds no per-tile state and can be shared across threads.
#[derive(Clone, Debug)]
pub struct Rtin {
  grid_size: usize,
  num_triangles: usize,
  num_parent_triangles: usize,
  /// `[ax, ay, bx, by]` per triangle. `c` follows from `a`, `b` and the right
  /// angle.
  coords: Vec<[u32; 4]>,
}

impl Rtin {
  /// Build the hierarchy for grids of side `grid_size` (`2^k + 1`).
  pub fn new(grid_size: usize) -> Result<Self, SynthesisError> {
    if grid_size < 3 || !(grid_size - 1).is_power_of_two() {
      return Err(SynthesisError::NonPowerOfTwoGrid(grid_size));
    }
    let limit = MAX_TILE_SIZE as usize + 1;
    if grid_size > limit {
      return Err(SynthesisError::GridTooLarge {
        size: grid_size,
        limit,
      });
    }
    let tile_size = (grid_size - 1) as u32;
    let num_triangles = (tile_size * tile_size * 2 - 2) as usize;
    let num_parent_triangles = num_triangles - (tile_size * tile_size) as usize;

    let mut coords = Vec::with_capacity(num_triangles);
    for i in 0..num_triangles {
      // Implicit binary tree: ids 2 and 3 are the roots, id >> 1 is the parent.
      let mut id = i + 2;
      let (mut ax, mut ay, mut bx, mut by, mut cx, mut cy) = (0u32, 0u32, 0u32, 0u32, 0u32, 0u32);
      if id & 1 == 1 {
        // south-west root
        bx = tile_size;
        by = tile_size;
        cx = tile_size;
      } else {
        // north-east root
        ax = tile_size;
        ay = tile_size;
        cy = tile_size;
      }
      loop {
        id >>= 1;
        if id <= 1 {
          break;
        }
        let mx = (ax + bx) >> 1;
        let my = (ay + by) >> 1;
        if id & 1 == 1 {
          bx = ax;
          by = ay;
          ax = cx;
          ay = cy;
        } else {
          ax = bx;
          ay = by;
          bx = cx;
          by = cy;
        }
        cx = mx;
        cy = my;
      }
      coords.push([ax, ay, bx, by]);
    }

    Ok(Self {
      grid_size,
      num_triangles,
      num_parent_triangles,
      coords,
    })
  }

  #[inline]
  pub fn grid_size(&self) -> usize {
    self.grid_size
  }

  #[inline]
  pub fn triangle_count(&self) -> usize {
    self.num_triangles
  }

  /// Compute the error hierarchy for `grid`.
  #[cfg_attr(feature = "trace_spans", tracing::instrument(skip_all, name = "rtin::create_tile"))]
  pub fn create_tile(&self, grid: &ElevationGrid) -> Result<RtinTile<'_>, SynthesisError> {
    if grid.size() != self.grid_size {
      return Err(SynthesisError::GridSizeMismatch {
        expected: self.grid_size,
        actual: grid.size(),
      });
    }
    grid.check_finite()?;

    let size = self.grid_size;
    let terrain = grid.heights();
    let mut errors = vec![0.0f32; size * size];

    for i in (0..self.num_triangles).rev() {
      let [ax, ay, bx, by] = self.coords[i];
      let (ax, ay, bx, by) = (ax as usize, ay as usize, bx as usize, by as usize);
      let mx = (ax + bx) >> 1;
      let my = (ay + by) >> 1;
      let cx = mx + my - ay;
      let cy = my + ax - mx;

      let interpolated = (terrain[ay * size + ax] + terrain[by * size + bx]) * 0.5;
      let middle = my * size + mx;
      let middle_error = (interpolated - terrain[middle]).abs();
      errors[middle] = errors[middle].max(middle_error);

      if i < self.num_parent_triangles {
        let left_child = ((ay + cy) >> 1) * size + ((ax + cx) >> 1);
        let right_child = ((by + cy) >> 1) * size + ((bx + cx) >> 1);
        errors[middle] = errors[middle].max(errors[left_child]).max(errors[right_child]);
      }
    }

    Ok(RtinTile { rtin: self, errors })
  }
}

/// Error hierarchy for one elevation grid.
#[derive(Clone, Debug)]
pub struct RtinTile<'a> {
  rtin: &'a Rtin,
  errors: Vec<f32>,
}

impl RtinTile<'_> {
  /// Worst vertical error of every triangle whose hypotenuse midpoint is
  /// `(x, y)`, including all of its descendants.
  pub fn error_at(&self, x: usize, y: usize) -> f32 {
    self.errors[y * self.rtin.grid_size + x]
  }

  /// Extract the coarsest mesh whose vertical error is at most `max_error`.
  ///
  /// With `max_length`, a triangle whose hypotenuse is longer than that many
  /// grid cells is split regardless of its error.
  #[cfg_attr(feature = "trace_spans", tracing::instrument(skip_all, name = "rtin::mesh"))]
  pub fn mesh(&self, max_error: f64, max_length: Option<f64>) -> Mesh {
    let max = (self.rtin.grid_size - 1) as u32;
    let mut walk = MeshWalk {
      size: self.rtin.grid_size,
      errors: &self.errors,
      max_error,
      max_length_sq: max_length.map(|l| l * l),
      indices: vec![0u32; self.rtin.grid_size * self.rtin.grid_size],
      num_vertices: 0,
      num_triangles: 0,
    };

    walk.count(0, 0, max, max, max, 0);
    walk.count(max, max, 0, 0, 0, max);

    let mut mesh = Mesh {
      vertices: vec![[0, 0]; walk.num_vertices as usize],
      triangles: Vec::with_capacity(walk.num_triangles),
    };
    walk.emit(&mut mesh, 0, 0, max, max, max, 0);
    walk.emit(&mut mesh, max, max, 0, 0, 0, max);
    mesh
  }
}

/// Scratch state for one extraction. `indices` maps grid cells to vertex
/// index + 1 (0 = not yet used).
struct MeshWalk<'a> {
  size: usize,
  errors: &'a [f32],
  max_error: f64,
  max_length_sq: Option<f64>,
  indices: Vec<u32>,
  num_vertices: u32,
  num_triangles: usize,
}

impl MeshWalk<'_> {
  #[inline]
  fn should_split(&self, ax: u32, ay: u32, bx: u32, by: u32, cx: u32, cy: u32) -> bool {
    if ax.abs_diff(cx) + ay.abs_diff(cy) <= 1 {
      return false;
    }
    let mx = ((ax + bx) >> 1) as usize;
    let my = ((ay + by) >> 1) as usize;
    if self.errors[my * self.size + mx] as f64 > self.max_error {
      return true;
    }
    match self.max_length_sq {
      Some(limit) => {
        let dx = ax.abs_diff(bx) as f64;
        let dy = ay.abs_diff(by) as f64;
        dx * dx + dy * dy > limit
      }
      None => false,
    }
  }

  #[inline]
  fn vertex(&mut self, x: u32, y: u32) {
    let idx = y as usize * self.size + x as usize;
    if self.indices[idx] == 0 {
      self.num_vertices += 1;
      self.indices[idx] = self.num_vertices;
    }
  }

  fn count(&mut self, ax: u32, ay: u32, bx: u32, by: u32, cx: u32, cy: u32) {
    if self.should_split(ax, ay, bx, by, cx, cy) {
      let mx = (ax + bx) >> 1;
      let my = (ay + by) >> 1;
      self.count(cx, cy, ax, ay, mx, my);
      self.count(bx, by, cx, cy, mx, my);
    } else {
      self.vertex(ax, ay);
      self.vertex(bx, by);
      self.vertex(cx, cy);
      self.num_triangles += 1;
    }
  }

  #[allow(clippy::too_many_arguments)]
  fn emit(&self, mesh: &mut Mesh, ax: u32, ay: u32, bx: u32, by: u32, cx: u32, cy: u32) {
    if self.should_split(ax, ay, bx, by, cx, cy) {
      let mx = (ax + bx) >> 1;
      let my = (ay + by) >> 1;
      self.emit(mesh, cx, cy, ax, ay, mx, my);
      self.emit(mesh, bx, by, cx, cy, mx, my);
    } else {
      let a = self.place(mesh, ax, ay);
      let b = self.place(mesh, bx, by);
      let c = self.place(mesh, cx, cy);
      mesh.triangles.push([a, b, c]);
    }
  }

  #[inline]
  fn place(&self, mesh: &mut Mesh, x: u32, y: u32) -> u32 {
    let index = self.indices[y as usize * self.size + x as usize] - 1;
    mesh.vertices[index as usize] = [x, y];
    index
  }
}
