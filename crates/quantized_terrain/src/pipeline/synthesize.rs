//! Tile synthesis: pixels → grid → mesh → quantized tile.
//!
//! [`SynthesisContext`] holds everything that is fixed for a provider and
//! shared read-only by all workers. [`run_job`] is the unit of work a worker
//! executes: fetch, synthesize, and fall back to a placeholder on failure.

use std::sync::Arc;

use web_time::Instant;

use super::types::{StageTimings, TileQuality, TileResponse, TileStage};
use crate::decode::{decode_grid, HeightDecoder};
use crate::encode::MeshEncoder;
use crate::error::{Degradation, SynthesisError};
use crate::error_model::{max_vertex_distance, ErrorModel};
use crate::geo::{Rectangle, TilingScheme};
use crate::governor::InFlightPermit;
use crate::metrics::ProviderMetrics;
use crate::rtin::Rtin;
use crate::source::HeightmapSource;
use crate::types::{QuantizedTile, TileCoordinate};

/// Provider-wide synthesis state. Read-only once built.
pub struct SynthesisContext {
  pub source: Arc<dyn HeightmapSource>,
  pub decoder: Arc<dyn HeightDecoder>,
  pub tiling: Arc<dyn TilingScheme>,
  pub error_model: ErrorModel,
  pub rtin: Rtin,
  pub encoder: MeshEncoder,
  pub tile_size: usize,
  pub limit_edge_length: bool,
  pub metrics: ProviderMetrics,
}

impl SynthesisContext {
  pub fn tile_rectangle(&self, coord: TileCoordinate) -> Rectangle {
    self.tiling.tile_rectangle(coord)
  }

  /// Flat stand-in sized by the placeholder vertex formula.
  pub fn placeholder(&self, coord: TileCoordinate, rectangle: &Rectangle) -> QuantizedTile {
    let side = self.error_model.placeholder_side(coord.z, rectangle);
    let error = self.error_model.error_at_zoom(coord.z);
    self.encoder.encode_placeholder(side, rectangle, error)
  }

  /// Placeholder response for `kind`, counted and logged.
  pub fn degrade(
    &self,
    coord: TileCoordinate,
    rectangle: &Rectangle,
    kind: Degradation,
    stage: Option<TileStage>,
    cause: Option<&dyn std::fmt::Display>,
  ) -> TileResponse {
    self.metrics.record_degradation(kind);
    match (kind, cause) {
      (Degradation::BelowDetailThreshold, _) => {
        tracing::debug!(tile = %coord, reason = ?kind, "serving placeholder");
      }
      (_, Some(cause)) => {
        tracing::warn!(tile = %coord, reason = ?kind, error = %cause, "serving placeholder");
      }
      (_, None) => {
        tracing::warn!(tile = %coord, reason = ?kind, "serving placeholder");
      }
    }
    TileResponse {
      coord,
      tile: self.placeholder(coord, rectangle),
      quality: TileQuality::Placeholder(kind),
      timings: StageTimings::default(),
      stage,
    }
  }
}

/// Raster for one tile, owned by the synthesis that consumes it.
#[derive(Debug)]
pub struct SynthesisTask {
  pub coord: TileCoordinate,
  pub rectangle: Rectangle,
  pub pixels: crate::decode::PixelBuffer,
}

/// Accepted request on its way to a worker. Holds the in-flight slot until
/// dropped.
#[derive(Debug)]
pub struct TileJob {
  pub coord: TileCoordinate,
  pub rectangle: Rectangle,
  pub permit: InFlightPermit,
}

/// Run an accepted request on a worker, releasing its slot when done.
pub fn run_job(ctx: &SynthesisContext, job: TileJob) -> TileResponse {
  let TileJob {
    coord,
    rectangle,
    permit,
  } = job;
  let response = produce_tile(ctx, coord, rectangle);
  drop(permit);
  response
}

/// Fetch and synthesize one tile. Never fails; errors become placeholders.
pub fn produce_tile(ctx: &SynthesisContext, coord: TileCoordinate, rectangle: Rectangle) -> TileResponse {
  let Some(pixels) = ctx.source.get_samples(coord) else {
    return ctx.degrade(
      coord,
      &rectangle,
      Degradation::SourceUnavailable,
      Some(TileStage::InFlight),
      Some(&SynthesisError::SourceUnavailable(coord)),
    );
  };

  let task = SynthesisTask {
    coord,
    rectangle,
    pixels,
  };
  match synthesize(ctx, task) {
    Ok((tile, timings)) => {
      ctx.metrics.record_synthesized(timings.total_us());
      tracing::trace!(
        tile = %coord,
        vertices = tile.vertex_count(),
        triangles = tile.triangle_count(),
        total_us = timings.total_us(),
        "tile synthesized"
      );
      TileResponse {
        coord,
        tile,
        quality: TileQuality::Synthesized,
        timings,
        stage: Some(TileStage::Encoded),
      }
    }
    Err((stage, err)) => {
      tracing::debug!(tile = %coord, stage = ?stage, "synthesis failed");
      ctx.degrade(coord, &rectangle, err.degradation(), Some(stage), Some(&err))
    }
  }
}

/// Decode, triangulate and encode one tile.
///
/// On failure, returns the stage that was reached along with the error.
pub fn synthesize(
  ctx: &SynthesisContext,
  task: SynthesisTask,
) -> Result<(QuantizedTile, StageTimings), (TileStage, SynthesisError)> {
  #[cfg(feature = "trace_spans")]
  let _span = tracing::info_span!("synthesize_tile", tile = %task.coord).entered();

  let SynthesisTask {
    coord,
    rectangle,
    pixels,
  } = task;
  let mut stage = TileStage::InFlight;
  let mut timings = StageTimings::default();

  let t0 = Instant::now();
  let grid = decode_grid(ctx.decoder.as_ref(), &pixels, ctx.tile_size).map_err(|e| (stage, e))?;
  drop(pixels);
  timings.decode_us = t0.elapsed().as_micros() as u64;
  stage = stage.next();

  let t1 = Instant::now();
  let error = ctx.error_model.error_at_zoom(coord.z);
  let max_length = ctx.limit_edge_length.then(|| max_vertex_distance(&rectangle));
  let mesh = {
    #[cfg(feature = "trace_spans")]
    let _span = tracing::info_span!("triangulate").entered();
    ctx
      .rtin
      .create_tile(&grid)
      .map_err(|e| (stage, e))?
      .mesh(error, max_length)
  };
  timings.triangulate_us = t1.elapsed().as_micros() as u64;
  stage = stage.next();

  let t2 = Instant::now();
  let tile = ctx
    .encoder
    .encode(coord, &mesh, &grid, &rectangle, error)
    .map_err(|e| (stage, e))?;
  timings.encode_us = t2.elapsed().as_micros() as u64;

  Ok((tile, timings))
}
