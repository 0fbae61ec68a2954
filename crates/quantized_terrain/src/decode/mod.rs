//! Raster sample buffers to elevation grids.
//!
//! ```text
//!   pixel buffer (S × S)               elevation grid (S+1 × S+1)
//!  ┌───┬───┬───┬───┐                  ┌───┬───┬───┬───┬───┐
//!  │ a │ b │ c │ d │                  │ a │ b │ c │ d │ d │ ◄─ last column copied
//!  ├───┼───┼───┼───┤      decode      ├───┼───┼───┼───┼───┤    from the one before
//!  │ e │ f │ g │ h │  ────────────►   │ e │ f │ g │ h │ h │
//!  ├───┼───┼───┼───┤                  ├───┼───┼───┼───┼───┤
//!  │ i │ j │ k │ l │                  │ i │ j │ k │ l │ l │
//!  └───┴───┴───┴───┘                  ├───┼───┼───┼───┼───┤
//!                                     │ i │ j │ k │ l │ l │ ◄─ last row copied
//!                                     └───┴───┴───┴───┴───┘    from the one before
//! ```
//!
//! Decoding never samples past the raster edge. How raw pixels become heights
//! is a [`HeightDecoder`]; the grid assembly and border backfill are shared.

use serde::Deserialize;

use crate::error::SynthesisError;
use crate::types::ElevationGrid;

/// Raw raster samples, row-major with interleaved channels.
#[derive(Clone, Debug, PartialEq)]
pub enum PixelData {
  U8(Vec<u8>),
  F32(Vec<f32>),
}

impl PixelData {
  pub fn len(&self) -> usize {
    match self {
      PixelData::U8(data) => data.len(),
      PixelData::F32(data) => data.len(),
    }
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  fn format_name(&self) -> &'static str {
    match self {
      PixelData::U8(_) => "u8",
      PixelData::F32(_) => "f32",
    }
  }
}

/// Square raster tile of `size × size` pixels.
#[derive(Clone, Debug, PartialEq)]
pub struct PixelBuffer {
  pub size: usize,
  pub channels: usize,
  pub data: PixelData,
}

impl PixelBuffer {
  pub fn new(size: usize, channels: usize, data: PixelData) -> Result<Self, SynthesisError> {
    let expected = size * size * channels;
    if data.len() != expected {
      return Err(SynthesisError::BufferLength {
        expected,
        len: data.len(),
      });
    }
    Ok(Self {
      size,
      channels,
      data,
    })
  }

  /// 8-bit RGB(A) buffer.
  pub fn from_rgb8(size: usize, channels: usize, data: Vec<u8>) -> Result<Self, SynthesisError> {
    Self::new(size, channels, PixelData::U8(data))
  }

  /// Single-channel float buffer.
  pub fn from_f32(size: usize, data: Vec<f32>) -> Result<Self, SynthesisError> {
    Self::new(size, 1, PixelData::F32(data))
  }
}

/// Converts raster pixels to heights in world units.
pub trait HeightDecoder: Send + Sync {
  /// Short name for error messages.
  fn name(&self) -> &'static str;

  /// Write `pixels.size²` heights, row-major, into `out`.
  fn decode_into(&self, pixels: &PixelBuffer, out: &mut [f32]) -> Result<(), SynthesisError>;
}

/// Elevation packed into 8-bit color channels:
/// `height = ((R·256 + G)·256 + B) / interval − offset`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TerrainRgbDecoder {
  pub interval: f64,
  pub offset: f64,
}

impl TerrainRgbDecoder {
  pub const DEFAULT_INTERVAL: f64 = 10.0;
  pub const DEFAULT_OFFSET: f64 = 10000.0;

  pub fn new(interval: f64, offset: f64) -> Self {
    Self { interval, offset }
  }

  #[inline(always)]
  pub fn height(&self, r: u8, g: u8, b: u8) -> f64 {
    ((r as f64 * 256.0 + g as f64) * 256.0 + b as f64) / self.interval - self.offset
  }
}

impl Default for TerrainRgbDecoder {
  fn default() -> Self {
    Self::new(Self::DEFAULT_INTERVAL, Self::DEFAULT_OFFSET)
  }
}

impl HeightDecoder for TerrainRgbDecoder {
  fn name(&self) -> &'static str {
    "terrain_rgb"
  }

  fn decode_into(&self, pixels: &PixelBuffer, out: &mut [f32]) -> Result<(), SynthesisError> {
    let data = match &pixels.data {
      PixelData::U8(data) if pixels.channels >= 3 => data,
      other => {
        return Err(SynthesisError::UnsupportedPixelFormat {
          decoder: self.name(),
          format: other.format_name(),
          channels: pixels.channels,
        })
      }
    };

    for (height, px) in out.iter_mut().zip(data.chunks_exact(pixels.channels)) {
      *height = self.height(px[0], px[1], px[2]) as f32;
    }
    Ok(())
  }
}

/// Heights stored directly in the first channel of a float raster.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Float32Decoder;

impl HeightDecoder for Float32Decoder {
  fn name(&self) -> &'static str {
    "float32"
  }

  fn decode_into(&self, pixels: &PixelBuffer, out: &mut [f32]) -> Result<(), SynthesisError> {
    let data = match &pixels.data {
      PixelData::F32(data) if pixels.channels >= 1 => data,
      other => {
        return Err(SynthesisError::UnsupportedPixelFormat {
          decoder: self.name(),
          format: other.format_name(),
          channels: pixels.channels,
        })
      }
    };

    for (height, px) in out.iter_mut().zip(data.chunks_exact(pixels.channels)) {
      *height = px[0];
    }
    Ok(())
  }
}

/// Source pixel encoding, selectable from configuration.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HeightEncoding {
  TerrainRgb {
    #[serde(default = "default_interval")]
    interval: f64,
    #[serde(default = "default_offset")]
    offset: f64,
  },
  Float32,
}

fn default_interval() -> f64 {
  TerrainRgbDecoder::DEFAULT_INTERVAL
}

fn default_offset() -> f64 {
  TerrainRgbDecoder::DEFAULT_OFFSET
}

impl Default for HeightEncoding {
  fn default() -> Self {
    HeightEncoding::TerrainRgb {
      interval: TerrainRgbDecoder::DEFAULT_INTERVAL,
      offset: TerrainRgbDecoder::DEFAULT_OFFSET,
    }
  }
}

impl HeightDecoder for HeightEncoding {
  fn name(&self) -> &'static str {
    match self {
      HeightEncoding::TerrainRgb { .. } => "terrain_rgb",
      HeightEncoding::Float32 => "float32",
    }
  }

  fn decode_into(&self, pixels: &PixelBuffer, out: &mut [f32]) -> Result<(), SynthesisError> {
    match *self {
      HeightEncoding::TerrainRgb { interval, offset } => {
        TerrainRgbDecoder::new(interval, offset).decode_into(pixels, out)
      }
      HeightEncoding::Float32 => Float32Decoder.decode_into(pixels, out),
    }
  }
}

/// Decode a `tile_size × tile_size` buffer into a `(tile_size + 1)²` grid and
/// backfill the last row and column.
#[cfg_attr(feature = "trace_spans", tracing::instrument(skip_all, name = "decode::decode_grid"))]
pub fn decode_grid<D: HeightDecoder + ?Sized>(
  decoder: &D,
  pixels: &PixelBuffer,
  tile_size: usize,
) -> Result<ElevationGrid, SynthesisError> {
  if pixels.size != tile_size {
    return Err(SynthesisError::GridSizeMismatch {
      expected: tile_size,
      actual: pixels.size,
    });
  }
  let expected = tile_size * tile_size * pixels.channels;
  if pixels.data.len() != expected {
    return Err(SynthesisError::BufferLength {
      expected,
      len: pixels.data.len(),
    });
  }

  let mut decoded = vec![0.0f32; tile_size * tile_size];
  decoder.decode_into(pixels, &mut decoded)?;

  let grid_size = tile_size + 1;
  let mut grid = ElevationGrid::new(grid_size)?;
  for y in 0..tile_size {
    for x in 0..tile_size {
      grid.set(x, y, decoded[y * tile_size + x]);
    }
  }
  backfill_border(&mut grid);
  Ok(grid)
}

/// Copy the second-to-last row into the last row, then the second-to-last
/// column into the last column.
pub fn backfill_border(grid: &mut ElevationGrid) {
  let last = grid.max_coord();
  if last == 0 {
    return;
  }
  for x in 0..last {
    let h = grid.get(x, last - 1);
    grid.set(x, last, h);
  }
  for y in 0..=last {
    let h = grid.get(last - 1, y);
    grid.set(last, y, h);
  }
}

#[cfg(test)]
#[path = "decode_test.rs"]
mod decode_test;
