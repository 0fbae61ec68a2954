//! Terrain-RGB PNG tiles read from a `{z}/{x}/{y}.png` directory tree.

use quantized_terrain::{HeightmapSource, PixelBuffer, TileCoordinate, ZoomAvailability};
use std::path::{Path, PathBuf};

/// Raster source backed by PNG files on disk.
pub struct PngDirectorySource {
	root: PathBuf,
	tile_size: usize,
	zoom: ZoomAvailability,
}

impl PngDirectorySource {
	pub fn new(root: impl Into<PathBuf>, tile_size: usize, zoom: ZoomAvailability) -> Self {
		Self {
			root: root.into(),
			tile_size,
			zoom,
		}
	}

	/// Where the PNG for `coord` lives.
	pub fn tile_path(&self, coord: TileCoordinate) -> PathBuf {
		tile_file(&self.root, coord, "png")
	}
}

/// `root/z/x/y.ext`
pub fn tile_file(root: &Path, coord: TileCoordinate, ext: &str) -> PathBuf {
	root.join(coord.z.to_string())
		.join(coord.x.to_string())
		.join(format!("{}.{ext}", coord.y))
}

impl HeightmapSource for PngDirectorySource {
	fn sample_size(&self) -> usize {
		self.tile_size
	}

	fn get_samples(&self, coord: TileCoordinate) -> Option<PixelBuffer> {
		let path = self.tile_path(coord);
		let image = match image::open(&path) {
			Ok(image) => image.to_rgb8(),
			Err(err) => {
				tracing::warn!(tile = %coord, path = %path.display(), error = %err, "failed to read raster");
				return None;
			}
		};

		let (width, height) = image.dimensions();
		if width as usize != self.tile_size || height as usize != self.tile_size {
			tracing::warn!(
				tile = %coord,
				width,
				height,
				expected = self.tile_size,
				"raster has the wrong size"
			);
			return None;
		}

		PixelBuffer::from_rgb8(self.tile_size, 3, image.into_raw()).ok()
	}

	fn is_available(&self, coord: TileCoordinate) -> bool {
		self.zoom.is_available(coord.z) && self.tile_path(coord).is_file()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use image::{Rgb, RgbImage};

	fn write_png(root: &Path, coord: TileCoordinate, size: u32) {
		let path = tile_file(root, coord, "png");
		std::fs::create_dir_all(path.parent().unwrap()).unwrap();
		// 812.5 m in terrain-RGB.
		RgbImage::from_pixel(size, size, Rgb([1, 166, 93]))
			.save(&path)
			.unwrap();
	}

	#[test]
	fn test_reads_rgb_tile() {
		let dir = tempfile::tempdir().unwrap();
		let coord = TileCoordinate::new(3, 5, 4);
		write_png(dir.path(), coord, 16);

		let source = PngDirectorySource::new(dir.path(), 16, ZoomAvailability::new(10, false));
		assert!(source.is_available(coord));

		let pixels = source.get_samples(coord).unwrap();
		assert_eq!(pixels.size, 16);
		assert_eq!(pixels.channels, 3);
		assert_eq!(pixels.data.len(), 16 * 16 * 3);
	}

	#[test]
	fn test_missing_and_wrong_size_tiles() {
		let dir = tempfile::tempdir().unwrap();
		let small = TileCoordinate::new(0, 0, 2);
		write_png(dir.path(), small, 8);

		let source = PngDirectorySource::new(dir.path(), 16, ZoomAvailability::new(10, false));
		assert!(source.get_samples(small).is_none());

		let absent = TileCoordinate::new(1, 1, 2);
		assert!(!source.is_available(absent));
		assert!(source.get_samples(absent).is_none());
	}

	#[test]
	fn test_availability_follows_zoom_rule() {
		let dir = tempfile::tempdir().unwrap();
		let odd = TileCoordinate::new(0, 0, 3);
		write_png(dir.path(), odd, 16);

		let skipping = PngDirectorySource::new(dir.path(), 16, ZoomAvailability::new(10, true));
		assert!(!skipping.is_available(odd));
	}
}
