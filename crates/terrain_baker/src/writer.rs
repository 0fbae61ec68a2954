//! quantized-mesh-1.0 tile files and the `layer.json` that indexes them.
//!
//! Tile layout (little-endian):
//! - header: center (3×f64), min/max height (2×f32), bounding sphere
//!   (4×f64), horizon occlusion point (3×f64)
//! - vertex count (u32), then the u, v and height planes as zig-zag deltas
//! - triangle count (u32), then high-water-mark indices
//! - west, south, east, north edge lists (count + indices)
//!
//! Indices are u16 unless the tile has more than 65536 vertices, in which case
//! they are u32 aligned to 4 bytes.

use anyhow::{Context, Result};
use quantized_terrain::{QuantizedTile, TileCoordinate, TileResponse};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::source::tile_file;

/// Header size in bytes.
pub const HEADER_LEN: usize = 88;

/// Vertex count above which indices are written as u32.
const U16_INDEX_LIMIT: usize = 65536;

/// Serialize a tile to quantized-mesh bytes.
pub fn encode_tile(tile: &QuantizedTile) -> Vec<u8> {
	let tile = reorder_for_high_water_mark(tile);
	let vertex_count = tile.vertex_count();
	let wide = vertex_count > U16_INDEX_LIMIT;

	let mut out = Vec::with_capacity(HEADER_LEN + vertex_count * 6 + tile.indices.len() * 4 + 64);

	// Header
	let center = match &tile.oriented_bounding_box {
		Some(obb) => obb.center,
		None => tile.bounding_sphere.center,
	};
	put_f64s(&mut out, &[center.x, center.y, center.z]);
	out.extend_from_slice(&(tile.minimum_height as f32).to_le_bytes());
	out.extend_from_slice(&(tile.maximum_height as f32).to_le_bytes());
	let sphere = &tile.bounding_sphere;
	put_f64s(
		&mut out,
		&[sphere.center.x, sphere.center.y, sphere.center.z, sphere.radius],
	);
	let horizon = tile.horizon_occlusion_point;
	put_f64s(&mut out, &[horizon.x, horizon.y, horizon.z]);

	// Vertex planes
	out.extend_from_slice(&(vertex_count as u32).to_le_bytes());
	for plane in [&tile.vertices.u, &tile.vertices.v, &tile.vertices.height] {
		let mut previous = 0i32;
		for &value in plane.iter() {
			let value = value as i32;
			out.extend_from_slice(&zig_zag(value - previous).to_le_bytes());
			previous = value;
		}
	}

	// Triangles
	if wide {
		while out.len() % 4 != 0 {
			out.push(0);
		}
	}
	out.extend_from_slice(&(tile.triangle_count() as u32).to_le_bytes());
	let mut highest = 0u32;
	for &index in &tile.indices {
		put_index(&mut out, highest - index, wide);
		if index == highest {
			highest += 1;
		}
	}

	// Edges
	for side in [
		&tile.edges.west,
		&tile.edges.south,
		&tile.edges.east,
		&tile.edges.north,
	] {
		out.extend_from_slice(&(side.len() as u32).to_le_bytes());
		for &index in side.iter() {
			put_index(&mut out, index, wide);
		}
	}

	out
}

/// Renumber vertices in order of first use by the index buffer, which
/// high-water-mark coding requires. Unreferenced vertices keep their relative
/// order at the end.
pub fn reorder_for_high_water_mark(tile: &QuantizedTile) -> QuantizedTile {
	const UNSET: u32 = u32::MAX;
	let count = tile.vertex_count();
	let mut remap = vec![UNSET; count];
	let mut next = 0u32;
	for &index in &tile.indices {
		let slot = &mut remap[index as usize];
		if *slot == UNSET {
			*slot = next;
			next += 1;
		}
	}
	for slot in remap.iter_mut().filter(|slot| **slot == UNSET) {
		*slot = next;
		next += 1;
	}

	let mut reordered = tile.clone();
	for (old, &new) in remap.iter().enumerate() {
		let new = new as usize;
		reordered.vertices.u[new] = tile.vertices.u[old];
		reordered.vertices.v[new] = tile.vertices.v[old];
		reordered.vertices.height[new] = tile.vertices.height[old];
	}
	let renumber = |list: &[u32]| -> Vec<u32> { list.iter().map(|&i| remap[i as usize]).collect() };
	reordered.indices = renumber(&tile.indices);
	reordered.edges.west = renumber(&tile.edges.west);
	reordered.edges.south = renumber(&tile.edges.south);
	reordered.edges.east = renumber(&tile.edges.east);
	reordered.edges.north = renumber(&tile.edges.north);
	reordered
}

#[inline]
fn zig_zag(value: i32) -> u16 {
	((value << 1) ^ (value >> 31)) as u16
}

fn put_f64s(out: &mut Vec<u8>, values: &[f64]) {
	for value in values {
		out.extend_from_slice(&value.to_le_bytes());
	}
}

fn put_index(out: &mut Vec<u8>, value: u32, wide: bool) {
	if wide {
		out.extend_from_slice(&value.to_le_bytes());
	} else {
		out.extend_from_slice(&(value as u16).to_le_bytes());
	}
}

/// Write `response` to `output/z/x/y.terrain`.
pub fn write_tile(output: &Path, response: &TileResponse) -> Result<PathBuf> {
	let path = tile_file(output, response.coord, "terrain");
	if let Some(parent) = path.parent() {
		std::fs::create_dir_all(parent)
			.with_context(|| format!("Failed to create dir: {}", parent.display()))?;
	}
	std::fs::write(&path, encode_tile(&response.tile))
		.with_context(|| format!("Failed to write: {}", path.display()))?;
	Ok(path)
}

/// Inclusive tile range at one level.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TileRange {
	pub start_x: u32,
	pub start_y: u32,
	pub end_x: u32,
	pub end_y: u32,
}

impl TileRange {
	fn single(coord: TileCoordinate) -> Self {
		Self {
			start_x: coord.x,
			start_y: coord.y,
			end_x: coord.x,
			end_y: coord.y,
		}
	}

	fn include(&mut self, coord: TileCoordinate) {
		self.start_x = self.start_x.min(coord.x);
		self.start_y = self.start_y.min(coord.y);
		self.end_x = self.end_x.max(coord.x);
		self.end_y = self.end_y.max(coord.y);
	}
}

/// `layer.json` contents.
#[derive(Debug, Serialize)]
pub struct LayerJson {
	pub tilejson: &'static str,
	pub name: String,
	pub version: &'static str,
	pub format: &'static str,
	pub scheme: &'static str,
	pub tiles: Vec<String>,
	pub minzoom: u32,
	pub maxzoom: u32,
	/// One entry per level from 0 to `maxzoom`.
	pub available: Vec<Vec<TileRange>>,
}

/// Running record of what a bake wrote.
#[derive(Debug, Default)]
pub struct BakeSummary {
	ranges: BTreeMap<u32, TileRange>,
	pub tiles: usize,
	pub placeholders: usize,
}

impl BakeSummary {
	pub fn record(&mut self, response: &TileResponse) {
		let coord = response.coord;
		self.ranges
			.entry(coord.z)
			.and_modify(|range| range.include(coord))
			.or_insert_with(|| TileRange::single(coord));
		self.tiles += 1;
		if response.is_placeholder() {
			self.placeholders += 1;
		}
	}

	pub fn layer_json(&self, name: &str) -> LayerJson {
		let minzoom = self.ranges.keys().next().copied().unwrap_or(0);
		let maxzoom = self.ranges.keys().next_back().copied().unwrap_or(0);
		let available: Vec<Vec<TileRange>> = (0..=maxzoom)
			.map(|z| self.ranges.get(&z).copied().into_iter().collect::<Vec<_>>())
			.collect();
		LayerJson {
			tilejson: "2.1.0",
			name: name.to_string(),
			version: "1.0.0",
			format: "quantized-mesh-1.0",
			scheme: "slippyMap",
			tiles: vec!["{z}/{x}/{y}.terrain".to_string()],
			minzoom,
			maxzoom,
			available,
		}
	}
}

/// Write `output/layer.json`.
pub fn write_layer_json(output: &Path, layer: &LayerJson) -> Result<PathBuf> {
	std::fs::create_dir_all(output)
		.with_context(|| format!("Failed to create output dir: {}", output.display()))?;
	let path = output.join("layer.json");
	let json = serde_json::to_string_pretty(layer).context("Failed to serialize layer.json")?;
	std::fs::write(&path, json).with_context(|| format!("Failed to write: {}", path.display()))?;
	Ok(path)
}

#[cfg(test)]
#[path = "writer_test.rs"]
mod writer_test;
