//! Quantized-mesh terrain baker.
//!
//! Reads terrain-RGB PNG tiles from a `{z}/{x}/{y}.png` tree, synthesizes a
//! quantized-mesh tile for each, and writes a `{z}/{x}/{y}.terrain` tree plus
//! a `layer.json` index.
//!
//! ```text
//! bake_tiles --source rasters/ --level 10 --output terrain/
//! bake_tiles --source rasters/ --tile 12/2141/1428 --output terrain/ --config provider.toml
//! ```

mod config;
mod source;
mod writer;

use anyhow::{Context, Result};
use clap::Parser;
use quantized_terrain::{
	TerrainProvider, TileBatch, TileCoordinate, TilingScheme, ZoomAvailability,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use source::PngDirectorySource;
use writer::BakeSummary;

/// Tiles synthesized per batch tick.
const BATCH_SIZE: usize = 256;

/// Quantized-mesh terrain baker.
#[derive(Parser, Debug)]
#[command(name = "bake_tiles")]
#[command(about = "Bakes terrain-RGB raster tiles into quantized-mesh terrain tiles")]
struct Args {
	/// Provider configuration TOML (defaults apply when omitted).
	#[arg(short, long)]
	config: Option<PathBuf>,

	/// Directory holding `{z}/{x}/{y}.png` terrain-RGB tiles.
	#[arg(short, long)]
	source: PathBuf,

	/// Bake every available tile at this zoom level.
	#[arg(short, long, required_unless_present = "tile", conflicts_with = "tile")]
	level: Option<u32>,

	/// Bake a single tile, given as `z/x/y`.
	#[arg(short, long, value_parser = parse_tile)]
	tile: Option<TileCoordinate>,

	/// Output directory for `.terrain` files and `layer.json`.
	#[arg(short, long)]
	output: PathBuf,
}

fn main() -> Result<()> {
	tracing_subscriber::fmt()
		.with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
		.init();

	let args = Args::parse();
	let config = config::load(args.config.as_deref())?;

	tracing::info!(source = %args.source.display(), output = %args.output.display(), "baking");

	let source = Arc::new(PngDirectorySource::new(
		&args.source,
		config.tile_size as usize,
		ZoomAvailability::new(config.max_zoom, config.skip_odd_levels),
	));
	let provider =
		TerrainProvider::new(source, config).context("Failed to start terrain provider")?;

	let coords = match (args.tile, args.level) {
		(Some(tile), _) => vec![tile],
		(None, Some(level)) => level_coords(&provider, level),
		(None, None) => anyhow::bail!("either --level or --tile is required"),
	};
	if coords.is_empty() {
		tracing::warn!("no source tiles found, nothing to bake");
	}

	let mut summary = BakeSummary::default();
	let mut batch = TileBatch::new();
	for chunk in coords.chunks(BATCH_SIZE) {
		for &coord in chunk {
			batch.enqueue(coord);
		}
		batch.tick(&provider);
		for done in batch.drain_completions() {
			writer::write_tile(&args.output, &done.response)?;
			summary.record(&done.response);
		}
		tracing::info!(written = summary.tiles, total = coords.len(), "progress");
	}

	let name = args
		.source
		.file_name()
		.map(|n| n.to_string_lossy().into_owned())
		.unwrap_or_else(|| "terrain".to_string());
	let layer_path = writer::write_layer_json(&args.output, &summary.layer_json(&name))?;

	let metrics = provider.metrics();
	tracing::info!(
		tiles = summary.tiles,
		placeholders = summary.placeholders,
		avg_synthesis_us = metrics.synthesis_time_avg_us,
		layer = %layer_path.display(),
		"done"
	);

	Ok(())
}

/// Every tile at `level` the source has raster data for.
fn level_coords(provider: &TerrainProvider, level: u32) -> Vec<TileCoordinate> {
	let tiling = provider.tiling_scheme();
	let tiles_x = tiling.tiles_x_at_level(level) as u32;
	let tiles_y = tiling.tiles_y_at_level(level) as u32;
	(0..tiles_y)
		.flat_map(|y| (0..tiles_x).map(move |x| TileCoordinate::new(x, y, level)))
		.filter(|&coord| provider.tile_data_available(coord))
		.collect()
}

/// Parse `z/x/y`.
fn parse_tile(text: &str) -> Result<TileCoordinate, String> {
	let parts: Vec<&str> = text.split('/').collect();
	let [z, x, y] = parts.as_slice() else {
		return Err(format!("expected z/x/y, got {text:?}"));
	};
	let number = |s: &str| s.parse::<u32>().map_err(|e| format!("{s:?}: {e}"));
	let coord = TileCoordinate::new(number(*x)?, number(*y)?, number(*z)?);
	let side = 1u64 << coord.z.min(32);
	if coord.x as u64 >= side || coord.y as u64 >= side {
		return Err(format!("tile {text} is outside level {}", coord.z));
	}
	Ok(coord)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_parse_tile() {
		assert_eq!(parse_tile("12/2141/1428"), Ok(TileCoordinate::new(2141, 1428, 12)));
		assert!(parse_tile("12/2141").is_err());
		assert!(parse_tile("a/1/1").is_err());
		assert!(parse_tile("2/4/0").is_err());
	}

	#[test]
	fn test_args_require_level_or_tile() {
		assert!(Args::try_parse_from(["bake_tiles", "-s", "in", "-o", "out"]).is_err());
		assert!(Args::try_parse_from(["bake_tiles", "-s", "in", "-o", "out", "-l", "3", "-t", "3/1/1"]).is_err());

		let args = Args::try_parse_from(["bake_tiles", "-s", "in", "-o", "out", "-t", "3/1/2"]).unwrap();
		assert_eq!(args.tile, Some(TileCoordinate::new(1, 2, 3)));
		assert_eq!(args.level, None);
	}
}
