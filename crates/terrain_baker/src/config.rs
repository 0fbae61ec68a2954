//! Configuration loading for terrain baking.

use anyhow::{Context, Result};
use quantized_terrain::ProviderConfig;
use std::path::Path;

/// Load provider settings from a TOML file, or defaults when no file is given.
///
/// Baking schedules its own parallelism, so the provider's worker pool is
/// disabled.
pub fn load(path: Option<&Path>) -> Result<ProviderConfig> {
	let config = match path {
		Some(path) => ProviderConfig::load(path)
			.with_context(|| format!("Failed to load config: {}", path.display()))?,
		None => ProviderConfig::default(),
	};
	Ok(config.with_worker_threads(0))
}
