//! quantized_terrain - Quantized-mesh terrain tiles from raster elevation
//!
//! This crate turns square raster elevation tiles (terrain-RGB PNGs, float
//! rasters) into adaptive triangle meshes in the quantized-mesh layout, ready
//! for a globe renderer. Meshes are simplified with a right-triangulated
//! irregular network (RTIN) so that each tile stays within the geometric
//! error budget of its zoom level.
//!
//! # Features
//!
//! - **RTIN simplification**: one error hierarchy per tile, any number of
//!   crack-free meshes extracted from it
//! - **Quantized encoding**: 15-bit vertex planes, skirts, edge lists,
//!   bounding volumes and a horizon occlusion point
//! - **Bounded concurrency**: at most `max_concurrent_tiles` tiles synthesize
//!   at once; extra requests get `Busy` instead of queueing
//! - **Graceful degradation**: every accepted request yields a renderable
//!   tile, falling back to a flat placeholder on failure
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use quantized_terrain::{ProviderConfig, TerrainProvider, TileCoordinate, TileRequest};
//!
//! let provider = TerrainProvider::new(Arc::new(my_source), ProviderConfig::default())?;
//!
//! if let TileRequest::Pending(tile) = provider.request_tile_geometry(TileCoordinate::new(9, 5, 4)) {
//!     let response = tile.wait();
//!     println!("{} vertices, placeholder: {}",
//!         response.tile.vertex_count(), response.is_placeholder());
//! }
//! ```

pub mod constants;
pub mod error;
pub mod types;

// Re-export commonly used items
pub use constants::{QUANTIZED_MAX, SKIRT_ERROR_MULTIPLE};
pub use error::{ConfigError, Degradation, SynthesisError};
pub use types::{
  Edge, EdgeIndices, ElevationGrid, Mesh, QuantizedTile, QuantizedVertices, SkirtHeights,
  TileCoordinate,
};

// Globe geometry and tiling
pub mod geo;
pub use geo::{Ellipsoid, Rectangle, TilingScheme, WebMercatorTilingScheme};

// Raster input
pub mod decode;
pub mod source;
pub use decode::{HeightDecoder, HeightEncoding, PixelBuffer, PixelData};
pub use source::{HeightmapSource, MemorySource, ZoomAvailability};

// Error budget and RTIN simplification
pub mod error_model;
pub mod rtin;
pub use error_model::ErrorModel;
pub use rtin::{Rtin, RtinTile};

// Quantized-mesh encoding
pub mod encode;
pub use encode::MeshEncoder;

// Configuration
pub mod config;
pub use config::ProviderConfig;

// Concurrency: in-flight cap and worker threads
pub mod governor;
pub mod threading;
pub use governor::{ConcurrencyGovernor, InFlightPermit};
pub use threading::{TaskId, WorkerPool};

pub mod metrics;
pub use metrics::{MetricsSnapshot, ProviderMetrics};

// Request pipeline
pub mod pipeline;
pub use pipeline::{
  drain_ready, PendingTile, TerrainProvider, TerrainTileConsumer, TileBatch, TileQuality,
  TileRequest, TileResponse, TileStage,
};
