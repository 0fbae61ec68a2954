//! Error types for configuration and tile synthesis.

use std::path::PathBuf;

use thiserror::Error;

use crate::types::TileCoordinate;

/// Why a tile was delivered as a placeholder instead of a synthesized mesh.
///
/// Not an error from the caller's point of view: the tile is still renderable.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Degradation {
  /// Tile is coarser than the minimum useful detail; synthesis was skipped.
  BelowDetailThreshold,
  /// Raster fetch failed or the tile is not covered by the source.
  SourceUnavailable,
  /// Decoding, triangulation, or encoding hit an unexpected condition.
  SynthesisFailure,
  /// The tile spans too much of the globe for reliable error/occlusion math.
  TileTooWide,
  /// The offloaded task panicked or its result was lost.
  WorkerFailure,
}

impl Degradation {
  /// All kinds, in counter order.
  pub const ALL: [Degradation; 5] = [
    Degradation::BelowDetailThreshold,
    Degradation::SourceUnavailable,
    Degradation::SynthesisFailure,
    Degradation::TileTooWide,
    Degradation::WorkerFailure,
  ];

  /// Stable index for per-kind counters.
  #[inline]
  pub const fn index(self) -> usize {
    match self {
      Degradation::BelowDetailThreshold => 0,
      Degradation::SourceUnavailable => 1,
      Degradation::SynthesisFailure => 2,
      Degradation::TileTooWide => 3,
      Degradation::WorkerFailure => 4,
    }
  }
}

/// Failure inside the tile synthesis pipeline.
#[derive(Debug, Error)]
pub enum SynthesisError {
  #[error("no raster samples for tile {0}")]
  SourceUnavailable(TileCoordinate),

  #[error("pixel buffer is {actual}x{actual}, expected {expected}x{expected}")]
  GridSizeMismatch { expected: usize, actual: usize },

  #[error("pixel buffer holds {len} values, expected {expected}")]
  BufferLength { expected: usize, len: usize },

  #[error("decoder {decoder} cannot read {channels}-channel {format} pixels")]
  UnsupportedPixelFormat {
    decoder: &'static str,
    format: &'static str,
    channels: usize,
  },

  #[error("grid side {0} is not 2^k + 1")]
  NonPowerOfTwoGrid(usize),

  #[error("grid side {size} exceeds the limit of {limit}")]
  GridTooLarge { size: usize, limit: usize },

  #[error("grid holds a non-finite height at ({x}, {y})")]
  NonFiniteHeight { x: usize, y: usize },

  #[error("mesh has no vertices")]
  EmptyMesh,

  #[error("tile {coord} is {width:.4} rad wide, limit is {limit:.4} rad")]
  TileTooWide {
    coord: TileCoordinate,
    width: f64,
    limit: f64,
  },

  #[error("worker failed: {0}")]
  WorkerFailure(String),
}

impl SynthesisError {
  /// Degradation reported when this error is turned into a placeholder.
  pub fn degradation(&self) -> Degradation {
    match self {
      SynthesisError::SourceUnavailable(_) => Degradation::SourceUnavailable,
      SynthesisError::TileTooWide { .. } => Degradation::TileTooWide,
      SynthesisError::WorkerFailure(_) => Degradation::WorkerFailure,
      SynthesisError::GridSizeMismatch { .. }
      | SynthesisError::BufferLength { .. }
      | SynthesisError::UnsupportedPixelFormat { .. }
      | SynthesisError::NonPowerOfTwoGrid(_)
      | SynthesisError::GridTooLarge { .. }
      | SynthesisError::NonFiniteHeight { .. }
      | SynthesisError::EmptyMesh => Degradation::SynthesisFailure,
    }
  }
}

/// Invalid provider configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("failed to read config file {path}: {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("failed to parse config TOML: {0}")]
  Parse(#[from] toml::de::Error),

  #[error("{field} is invalid: {reason}")]
  Invalid { field: &'static str, reason: String },

  #[error("failed to start worker pool: {0}")]
  WorkerPool(#[from] rayon::ThreadPoolBuildError),
}

impl ConfigError {
  pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
    ConfigError::Invalid {
      field,
      reason: reason.into(),
    }
  }
}
