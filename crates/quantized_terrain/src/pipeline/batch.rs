//! Batch synthesis for offline bakes.
//!
//! Enqueue → Tick → Completions. Each tick synthesizes every queued tile in
//! parallel on the rayon pool, bypassing the in-flight cap.
//!
//! ```ignore
//! let mut batch = TileBatch::new();
//! for coord in level_coords {
//!     batch.enqueue(coord);
//! }
//! batch.tick(&provider);
//! for done in batch.drain_completions() {
//!     write_tile(&done.response)?;
//! }
//! ```

use rayon::prelude::*;

use super::request::TerrainProvider;
use super::types::TileResponse;
use crate::types::TileCoordinate;

/// Finished batch entry.
#[derive(Clone, Debug)]
pub struct BatchCompletion {
  /// Order of the matching [`TileBatch::enqueue`] call.
  pub id: u64,
  pub response: TileResponse,
}

/// Parallel tile synthesis stage.
#[derive(Debug, Default)]
pub struct TileBatch {
  pending: Vec<(u64, TileCoordinate)>,
  completed: Vec<BatchCompletion>,
  next_id: u64,
}

impl TileBatch {
  pub fn new() -> Self {
    Self::default()
  }

  /// Queue `coord`, returning its id.
  pub fn enqueue(&mut self, coord: TileCoordinate) -> u64 {
    let id = self.next_id;
    self.next_id += 1;
    self.pending.push((id, coord));
    id
  }

  /// Synthesize everything queued. Returns the number of tiles processed.
  pub fn tick(&mut self, provider: &TerrainProvider) -> usize {
    if self.pending.is_empty() {
      return 0;
    }

    let requests = std::mem::take(&mut self.pending);
    let count = requests.len();

    let completions: Vec<BatchCompletion> = requests
      .into_par_iter()
      .map(|(id, coord)| BatchCompletion {
        id,
        response: provider.synthesize_tile(coord),
      })
      .collect();

    self.completed.extend(completions);
    count
  }

  /// Take all finished tiles, in enqueue order.
  pub fn drain_completions(&mut self) -> Vec<BatchCompletion> {
    std::mem::take(&mut self.completed)
  }

  pub fn pending_count(&self) -> usize {
    self.pending.len()
  }

  pub fn completed_count(&self) -> usize {
    self.completed.len()
  }

  /// True when no work remains.
  pub fn is_idle(&self) -> bool {
    self.pending.is_empty() && self.completed.is_empty()
  }
}
