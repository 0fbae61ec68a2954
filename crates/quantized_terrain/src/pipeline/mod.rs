//! Tile request pipeline.
//!
//! ```text
//! ┌──────────┐     ┌──────────┐     ┌────────┐     ┌──────────────┐     ┌────────┐
//! │ Detail   ├────►│ Governor ├────►│ Fetch  ├────►│ Decode/RTIN  ├────►│ Encode │
//! │ gate     │     │ (slots)  │     │ source │     │ (worker)     │     │        │
//! └────┬─────┘     └────┬─────┘     └───┬────┘     └──────┬───────┘     └───┬────┘
//!      │                │               │                 │                 │
//!  placeholder        Busy         placeholder       placeholder      QuantizedTile
//!  (skipped)                      (unavailable)      (failure)
//! ```
//!
//! # Stages
//!
//! 1. **Gate**: tiles coarser than the minimum zoom's error, and tiles on a
//!    level outside `max_zoom`/`skip_odd_levels`, resolve at once to a
//!    placeholder; the source is never touched.
//! 2. **Governor**: at most `max_concurrent_tiles` tiles synthesize at a time.
//!    Over the cap the request returns `Busy` and nothing is started.
//! 3. **Synthesis** on a worker: fetch raster, decode to a grid, build the
//!    RTIN hierarchy, extract a mesh at the level's error, quantize.
//!
//! Every accepted request resolves to a renderable tile. Failures degrade to
//! a flat placeholder tagged with a [`Degradation`](crate::Degradation).

pub mod types;

pub mod batch;
pub mod request;
pub mod synthesize;

#[cfg(test)]
pub mod test_utils;


pub use batch::{BatchCompletion, TileBatch};
pub use request::{drain_ready, PendingTile, TerrainProvider, TileRequest};
pub use synthesize::{SynthesisContext, SynthesisTask};
pub use types::{StageTimings, TerrainTileConsumer, TileQuality, TileResponse, TileStage};
