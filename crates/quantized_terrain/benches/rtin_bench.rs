//! RTIN benchmarks: error hierarchy construction, mesh extraction at several
//! error budgets, and the full decode → triangulate → encode path.

use std::f64::consts::FRAC_PI_2;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use quantized_terrain::{
  decode::decode_grid, ElevationGrid, Ellipsoid, HeightEncoding, MeshEncoder, PixelBuffer,
  Rectangle, Rtin, TileCoordinate,
};

/// Rolling hills with a ridge, in metres.
fn hills(size: usize) -> Vec<f32> {
  let mut heights = Vec::with_capacity(size * size);
  for y in 0..size {
    for x in 0..size {
      let fx = x as f32 / size as f32;
      let fy = y as f32 / size as f32;
      let h = 800.0 * (fx * 9.0).sin() * (fy * 7.0).cos()
        + 300.0 * ((fx + fy) * 23.0).sin()
        + 1200.0 * (1.0 - (fx - fy).abs());
      heights.push(h);
    }
  }
  heights
}

fn bench_create_tile(c: &mut Criterion) {
  let mut group = c.benchmark_group("rtin_create_tile");
  for tile_size in [64usize, 256, 512] {
    let grid_size = tile_size + 1;
    let rtin = Rtin::new(grid_size).unwrap();
    let grid = ElevationGrid::from_heights(grid_size, hills(grid_size)).unwrap();
    group.bench_with_input(BenchmarkId::from_parameter(tile_size), &grid, |b, grid| {
      b.iter(|| black_box(rtin.create_tile(black_box(grid)).unwrap()))
    });
  }
  group.finish();
}

fn bench_extract_mesh(c: &mut Criterion) {
  let rtin = Rtin::new(257).unwrap();
  let grid = ElevationGrid::from_heights(257, hills(257)).unwrap();
  let tile = rtin.create_tile(&grid).unwrap();

  let mut group = c.benchmark_group("rtin_mesh");
  for max_error in [0.5, 5.0, 50.0] {
    group.bench_with_input(
      BenchmarkId::new("max_error", max_error),
      &max_error,
      |b, &max_error| b.iter(|| black_box(tile.mesh(max_error, None))),
    );
  }
  group.bench_function("max_error=5 max_length=8", |b| {
    b.iter(|| black_box(tile.mesh(5.0, Some(8.0))))
  });
  group.finish();
}

fn bench_full_tile(c: &mut Criterion) {
  let pixels = PixelBuffer::from_f32(256, hills(256)).unwrap();
  let decoder = HeightEncoding::Float32;
  let rtin = Rtin::new(257).unwrap();
  let encoder = MeshEncoder::new(Ellipsoid::wgs84(), FRAC_PI_2);
  let rect = Rectangle::new(0.20, -0.10, 0.21, -0.09);
  let coord = TileCoordinate::new(300, 260, 9);

  c.bench_function("decode+rtin+encode (256px, err 5)", |b| {
    b.iter(|| {
      let grid = decode_grid(&decoder, black_box(&pixels), 256).unwrap();
      let mesh = rtin.create_tile(&grid).unwrap().mesh(5.0, None);
      black_box(encoder.encode(coord, &mesh, &grid, &rect, 5.0).unwrap())
    })
  });
}

criterion_group!(benches, bench_create_tile, bench_extract_mesh, bench_full_tile);
criterion_main!(benches);
