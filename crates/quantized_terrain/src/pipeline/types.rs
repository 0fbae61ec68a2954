//! Request lifecycle types.
//!
//! ```text
//!                         TILE REQUEST LIFECYCLE
//!                         ======================
//!
//!   request ──► below detail threshold? ──yes──► placeholder (BelowDetailThreshold)
//!                    │ no
//!                    ▼
//!               level outside zoom range? ──yes──► placeholder (SourceUnavailable)
//!                    │ no
//!                    ▼
//!               governor full? ──yes──► Busy   (nothing started, retry later)
//!                    │ no
//!                    ▼
//!               ┌──────────┐   ┌─────────┐   ┌──────────────┐   ┌─────────┐
//!               │ InFlight ├──►│ Decoded ├──►│ Triangulated ├──►│ Encoded │
//!               └────┬─────┘   └────┬────┘   └──────┬───────┘   └────┬────┘
//!                    │              │               │                │
//!                    ▼              ▼               ▼                ▼
//!               placeholder (Degradation)  ◄────────┘          Synthesized
//! ```
//!
//! Every path ends in a [`TileResponse`] carrying a renderable tile. Failures
//! are reported through [`TileQuality::Placeholder`], never as errors, and
//! [`TileResponse::stage`] records how far synthesis got.

use crate::error::Degradation;
use crate::types::{QuantizedTile, TileCoordinate};

/// Synthesis stage a tile has reached.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TileStage {
  /// Accepted and fetching its raster.
  InFlight,
  Decoded,
  Triangulated,
  Encoded,
}

impl TileStage {
  /// Stage reached after this one succeeds. `Encoded` is final.
  pub fn next(self) -> TileStage {
    match self {
      TileStage::InFlight => TileStage::Decoded,
      TileStage::Decoded => TileStage::Triangulated,
      TileStage::Triangulated | TileStage::Encoded => TileStage::Encoded,
    }
  }

  pub fn is_final(self) -> bool {
    self == TileStage::Encoded
  }
}

/// How faithful a delivered tile is.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TileQuality {
  /// Synthesized from raster data under the level's error budget.
  Synthesized,
  /// Flat stand-in, and why.
  Placeholder(Degradation),
}

impl TileQuality {
  pub fn degradation(self) -> Option<Degradation> {
    match self {
      TileQuality::Synthesized => None,
      TileQuality::Placeholder(kind) => Some(kind),
    }
  }

  pub fn is_placeholder(self) -> bool {
    matches!(self, TileQuality::Placeholder(_))
  }
}

/// Wall-clock time per synthesis stage, in microseconds.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StageTimings {
  pub decode_us: u64,
  pub triangulate_us: u64,
  pub encode_us: u64,
}

impl StageTimings {
  pub fn total_us(&self) -> u64 {
    self.decode_us + self.triangulate_us + self.encode_us
  }
}

/// A finished tile, ready for the renderer.
#[derive(Clone, Debug)]
pub struct TileResponse {
  pub coord: TileCoordinate,
  pub tile: QuantizedTile,
  pub quality: TileQuality,
  /// Zero for placeholders.
  pub timings: StageTimings,
  /// Last stage synthesis reached, or `None` if the tile was resolved
  /// before any raster fetch.
  pub stage: Option<TileStage>,
}

impl TileResponse {
  pub fn is_placeholder(&self) -> bool {
    self.quality.is_placeholder()
  }
}

/// Receives finished tiles.
///
/// The renderer-side adapter converts [`QuantizedTile`] into its own mesh
/// type here; the synthesis core never sees renderer types.
pub trait TerrainTileConsumer {
  fn accept(&mut self, response: TileResponse);
}

impl<F: FnMut(TileResponse)> TerrainTileConsumer for F {
  fn accept(&mut self, response: TileResponse) {
    self(response)
  }
}
