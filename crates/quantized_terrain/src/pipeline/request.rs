//! TerrainProvider - the caller-facing tile request surface.
//!
//! # Usage
//!
//! ```ignore
//! let provider = TerrainProvider::new(Arc::new(source), ProviderConfig::default())?;
//!
//! let mut pending = Vec::new();
//! match provider.request_tile_geometry(TileCoordinate::new(x, y, z)) {
//!     TileRequest::Busy => { /* ask again next frame */ }
//!     TileRequest::Pending(tile) => pending.push(tile),
//! }
//!
//! // Each frame: hand finished tiles to the renderer without blocking.
//! drain_ready(&mut pending, &mut |response: TileResponse| renderer.upload(response));
//! ```

use std::sync::Arc;

use crossbeam_channel::{Receiver, TryRecvError};

use super::synthesize::{produce_tile, run_job, SynthesisContext, TileJob};
use super::types::{TerrainTileConsumer, TileResponse, TileStage};
use crate::config::ProviderConfig;
use crate::decode::HeightDecoder;
use crate::encode::MeshEncoder;
use crate::error::{ConfigError, Degradation, SynthesisError};
use crate::error_model::ErrorModel;
use crate::geo::{Rectangle, TilingScheme, WebMercatorTilingScheme};
use crate::governor::ConcurrencyGovernor;
use crate::metrics::MetricsSnapshot;
use crate::rtin::Rtin;
use crate::source::{HeightmapSource, ZoomAvailability};
use crate::threading::{Completion, WorkerPool};
use crate::types::TileCoordinate;

/// Outcome of [`TerrainProvider::request_tile_geometry`].
#[derive(Debug)]
pub enum TileRequest {
  /// At the in-flight cap. Nothing was started; request again later.
  Busy,
  /// Accepted. Always resolves to a renderable tile.
  Pending(PendingTile),
}

impl TileRequest {
  pub fn is_busy(&self) -> bool {
    matches!(self, TileRequest::Busy)
  }

  pub fn into_pending(self) -> Option<PendingTile> {
    match self {
      TileRequest::Busy => None,
      TileRequest::Pending(tile) => Some(tile),
    }
  }
}

/// A tile that is ready or being synthesized in the background.
pub struct PendingTile {
  coord: TileCoordinate,
  state: PendingState,
}

enum PendingState {
  Ready(Box<TileResponse>),
  Waiting {
    receiver: Receiver<Completion<TileResponse>>,
    ctx: Arc<SynthesisContext>,
  },
}

impl std::fmt::Debug for PendingTile {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("PendingTile")
      .field("coord", &self.coord)
      .field("ready", &self.is_ready())
      .finish()
  }
}

impl PendingTile {
  fn ready(response: TileResponse) -> Self {
    Self {
      coord: response.coord,
      state: PendingState::Ready(Box::new(response)),
    }
  }

  pub fn coord(&self) -> TileCoordinate {
    self.coord
  }

  pub fn is_ready(&self) -> bool {
    matches!(self.state, PendingState::Ready(_))
  }

  /// Pick up the worker's result if it has arrived. Never blocks.
  /// Returns true once the tile is ready.
  pub fn poll(&mut self) -> bool {
    let response = match &self.state {
      PendingState::Ready(_) => return true,
      PendingState::Waiting { receiver, ctx } => match receiver.try_recv() {
        Ok(completion) => resolve(ctx, self.coord, Some(completion)),
        Err(TryRecvError::Empty) => return false,
        Err(TryRecvError::Disconnected) => resolve(ctx, self.coord, None),
      },
    };
    self.state = PendingState::Ready(Box::new(response));
    true
  }

  /// The finished tile, if [`poll`](Self::poll) has seen it.
  pub fn response(&self) -> Option<&TileResponse> {
    match &self.state {
      PendingState::Ready(response) => Some(response),
      PendingState::Waiting { .. } => None,
    }
  }

  /// Block until the tile is finished.
  pub fn wait(self) -> TileResponse {
    match self.state {
      PendingState::Ready(response) => *response,
      PendingState::Waiting { receiver, ctx } => resolve(&ctx, self.coord, receiver.recv().ok()),
    }
  }
}

/// Worker completion to response. Panics and lost workers (`None`) become
/// placeholders.
fn resolve(
  ctx: &SynthesisContext,
  coord: TileCoordinate,
  completion: Option<Completion<TileResponse>>,
) -> TileResponse {
  let failure = match completion {
    Some(Completion {
      result: Ok(response),
      ..
    }) => return response,
    Some(Completion {
      result: Err(failure),
      ..
    }) => SynthesisError::WorkerFailure(failure.to_string()),
    None => SynthesisError::WorkerFailure("worker channel closed".into()),
  };
  let rectangle = ctx.tile_rectangle(coord);
  ctx.degrade(
    coord,
    &rectangle,
    Degradation::WorkerFailure,
    Some(TileStage::InFlight),
    Some(&failure),
  )
}

/// Deliver every finished tile in `pending` to `consumer` and drop it from
/// the list, keeping the rest in order. Never blocks. Returns the number
/// delivered.
pub fn drain_ready<C: TerrainTileConsumer + ?Sized>(
  pending: &mut Vec<PendingTile>,
  consumer: &mut C,
) -> usize {
  let mut delivered = 0;
  let mut waiting = Vec::with_capacity(pending.len());
  for mut tile in pending.drain(..) {
    if tile.poll() {
      consumer.accept(tile.wait());
      delivered += 1;
    } else {
      waiting.push(tile);
    }
  }
  *pending = waiting;
  delivered
}

/// Terrain tile provider.
///
/// Requests are issued from one thread; synthesis runs on
/// `worker_threads` background threads, or inline when that is 0.
pub struct TerrainProvider {
  ctx: Arc<SynthesisContext>,
  governor: ConcurrencyGovernor,
  pool: Option<WorkerPool<TileJob, TileResponse>>,
  zoom: ZoomAvailability,
  config: ProviderConfig,
}

impl TerrainProvider {
  /// Provider decoding pixels with `config.encoding`.
  pub fn new(source: Arc<dyn HeightmapSource>, config: ProviderConfig) -> Result<Self, ConfigError> {
    let decoder = Arc::new(config.encoding);
    Self::with_decoder(source, config, decoder)
  }

  /// Provider with a custom pixel decoder.
  pub fn with_decoder(
    source: Arc<dyn HeightmapSource>,
    config: ProviderConfig,
    decoder: Arc<dyn HeightDecoder>,
  ) -> Result<Self, ConfigError> {
    config.validate()?;
    if source.sample_size() != config.tile_size as usize {
      return Err(ConfigError::invalid(
        "tile_size",
        format!(
          "{} does not match the source sample size {}",
          config.tile_size,
          source.sample_size()
        ),
      ));
    }

    let ellipsoid = config.ellipsoid.to_ellipsoid();
    let tiling = WebMercatorTilingScheme::new(ellipsoid, config.fill_poles);
    let error_model = ErrorModel::new(
      &ellipsoid,
      tiling.tiles_x_at_level(0),
      config.tile_size,
      config.detail_scalar,
      config.minimum_error,
      config.min_zoom_level,
    );
    let rtin = Rtin::new(config.tile_size as usize + 1)
      .map_err(|e| ConfigError::invalid("tile_size", e.to_string()))?;

    let ctx = Arc::new(SynthesisContext {
      source,
      decoder,
      tiling: Arc::new(tiling),
      error_model,
      rtin,
      encoder: MeshEncoder::new(ellipsoid, config.max_tile_width),
      tile_size: config.tile_size as usize,
      limit_edge_length: config.limit_edge_length,
      metrics: Default::default(),
    });

    let pool = if config.worker_threads > 0 {
      let worker_ctx = Arc::clone(&ctx);
      Some(WorkerPool::new(
        "terrain-worker",
        config.worker_threads,
        move |job: TileJob| run_job(&worker_ctx, job),
      )?)
    } else {
      None
    };

    tracing::info!(
      tile_size = config.tile_size,
      max_zoom = config.max_zoom,
      workers = config.worker_threads,
      max_concurrent = config.max_concurrent_tiles,
      "terrain provider ready"
    );

    Ok(Self {
      governor: ConcurrencyGovernor::new(config.max_concurrent_tiles),
      ctx,
      pool,
      zoom: ZoomAvailability::new(config.max_zoom, config.skip_odd_levels),
      config,
    })
  }

  /// Request the mesh for one tile.
  ///
  /// Tiles below the detail threshold, or on a level outside the configured
  /// zoom range, resolve immediately to a placeholder without touching the
  /// source. Otherwise the request takes an in-flight slot, or returns
  /// [`TileRequest::Busy`] if none is free.
  pub fn request_tile_geometry(&self, coord: TileCoordinate) -> TileRequest {
    let rectangle = self.ctx.tile_rectangle(coord);

    if let Some(response) = self.resolve_without_fetch(coord, &rectangle) {
      return TileRequest::Pending(PendingTile::ready(response));
    }

    let Some(permit) = self.governor.try_acquire() else {
      self.ctx.metrics.record_busy();
      tracing::debug!(
        tile = %coord,
        in_flight = self.governor.in_flight(),
        "busy, request rejected"
      );
      return TileRequest::Busy;
    };

    let job = TileJob {
      coord,
      rectangle,
      permit,
    };

    match &self.pool {
      None => TileRequest::Pending(PendingTile::ready(run_job(&self.ctx, job))),
      Some(pool) => {
        let (_, receiver) = pool.submit(job);
        TileRequest::Pending(PendingTile {
          coord,
          state: PendingState::Waiting {
            receiver,
            ctx: Arc::clone(&self.ctx),
          },
        })
      }
    }
  }

  /// Synthesize `coord` on the calling thread, outside the in-flight cap.
  ///
  /// Used for offline bakes where the caller schedules its own parallelism.
  pub fn synthesize_tile(&self, coord: TileCoordinate) -> TileResponse {
    let rectangle = self.ctx.tile_rectangle(coord);
    if let Some(response) = self.resolve_without_fetch(coord, &rectangle) {
      return response;
    }
    produce_tile(&self.ctx, coord, rectangle)
  }

  /// Placeholder for tiles that never reach the source.
  fn resolve_without_fetch(&self, coord: TileCoordinate, rectangle: &Rectangle) -> Option<TileResponse> {
    if self.ctx.error_model.should_skip(coord.z, rectangle) {
      return Some(
        self
          .ctx
          .degrade(coord, rectangle, Degradation::BelowDetailThreshold, None, None),
      );
    }
    if !self.zoom.is_available(coord.z) {
      let cause = SynthesisError::SourceUnavailable(coord);
      return Some(
        self
          .ctx
          .degrade(coord, rectangle, Degradation::SourceUnavailable, None, Some(&cause)),
      );
    }
    None
  }

  /// Whether `coord` is on a configured zoom level and the source has
  /// raster data for it.
  pub fn tile_data_available(&self, coord: TileCoordinate) -> bool {
    self.zoom.is_available(coord.z) && self.ctx.source.is_available(coord)
  }

  /// Unclamped heightmap error for `level`.
  pub fn level_maximum_geometric_error(&self, level: u32) -> f64 {
    self.ctx.error_model.level_maximum_geometric_error(level)
  }

  pub fn error_model(&self) -> &ErrorModel {
    &self.ctx.error_model
  }

  pub fn tiling_scheme(&self) -> &dyn TilingScheme {
    self.ctx.tiling.as_ref()
  }

  pub fn config(&self) -> &ProviderConfig {
    &self.config
  }

  /// Tiles currently synthesizing.
  pub fn in_flight(&self) -> usize {
    self.governor.in_flight()
  }

  pub fn metrics(&self) -> MetricsSnapshot {
    self.ctx.metrics.snapshot()
  }
}
