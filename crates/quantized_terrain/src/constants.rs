//! Numeric constants for quantized terrain tiles.
//!
//! # Quantized Vertex Space
//!
//! ```text
//!   v
//! 32767 ┌───────────────────────────┐  north edge (grid row py = 0)
//!       │                           │
//!       │    u = px · 32768 / S     │
//!       │    v = (S − py) · 32768/S │
//!       │                           │
//!     0 └───────────────────────────┘  south edge (grid row py = S)
//!       0                        32767 u
//!   west (px = 0)            east (px = S)
//! ```
//!
//! `S` is the grid side minus one (the raster tile size). The east and north
//! edges compute to 32768 and are clamped to [`QUANTIZED_MAX`].

/// Largest quantized coordinate or height value.
pub const QUANTIZED_MAX: u16 = 32767;

/// Scale applied to grid coordinates before clamping (`32768 / S` per cell).
pub const QUANTIZED_SPAN: f64 = 32768.0;

/// Default raster tile edge length in pixels.
pub const DEFAULT_TILE_SIZE: u32 = 256;

/// Largest raster tile edge length; keeps RTIN triangle ids within `u32`.
pub const MAX_TILE_SIZE: u32 = 4096;

/// Raster tile size the level-zero error estimate is calibrated for.
pub const REFERENCE_TILE_SIZE: f64 = 256.0;

/// Heightmap width used for the level-zero geometric error estimate.
pub const LEVEL_ZERO_HEIGHTMAP_WIDTH: f64 = 65.0;

/// Heightmap terrain quality factor for the level-zero error estimate.
pub const HEIGHTMAP_TERRAIN_QUALITY: f64 = 0.25;

/// Skirt height as a multiple of the tile's error budget.
pub const SKIRT_ERROR_MULTIPLE: f64 = 20.0;

/// Child mask with all four children flagged available (SW, SE, NW, NE).
pub const CHILD_TILE_MASK_ALL: u8 = 0b1111;

/// Tolerance used for angular comparisons (radians).
pub const EPSILON5: f64 = 1e-5;

/// Placeholder vertices-per-side numerator: `ceil(200 / (z + 1) · ...)`.
pub const PLACEHOLDER_DENSITY: f64 = 200.0;

/// Latitude exponent of the placeholder vertex formula.
pub const PLACEHOLDER_LATITUDE_EXPONENT: f64 = 0.25;

/// Upper bound for `|sin(latitude)|` in the placeholder vertex formula.
pub const PLACEHOLDER_MAX_LATITUDE_SINE: f64 = 0.995;

/// Minimum placeholder vertices per side.
pub const PLACEHOLDER_MIN_SIDE: u32 = 4;

/// Convert a grid coordinate to quantized space, clamped to [0, 32767].
#[inline(always)]
pub fn quantize_grid_coord(value: f64, grid_max: u32) -> u16 {
  let scaled = value * (QUANTIZED_SPAN / grid_max as f64);
  scaled.round().clamp(0.0, QUANTIZED_MAX as f64) as u16
}

#[cfg(test)]
#[path = "constants_test.rs"]
mod constants_test;
