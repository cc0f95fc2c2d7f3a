//! Dominant-color extraction benchmarks

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use image::{Rgba, RgbaImage};
use swatchmatch_core::extract_clusters;

fn checkerboard(width: u32, height: u32, tile: u32) -> RgbaImage {
    let mut image = RgbaImage::new(width, height);
    for y in 0..height {
        for x in 0..width {
            let on = ((x / tile) + (y / tile)) % 2 == 0;
            let rgba = if on { [220, 40, 40, 255] } else { [40, 60, 220, 255] };
            image.put_pixel(x, y, Rgba(rgba));
        }
    }
    image
}

/// Benchmark cluster extraction across a range of raster sizes
fn bench_extract_clusters_by_size(c: &mut Criterion) {
    let mut group = c.benchmark_group("extract_clusters_by_size");
    for &(width, height) in [(64u32, 64u32), (256, 256), (512, 512), (800, 800)].iter() {
        let image = checkerboard(width, height, 8);
        group.bench_with_input(BenchmarkId::new("pixels", width * height), &image, |b, image| {
            b.iter(|| black_box(extract_clusters(image, 50.0, true, None, 220_000)))
        });
    }
    group.finish();
}

/// Benchmark the effect of the noise dial on a fixed raster
fn bench_extract_clusters_by_noise(c: &mut Criterion) {
    let image = checkerboard(400, 400, 6);

    let mut group = c.benchmark_group("extract_clusters_by_noise");
    for noise in [5.0, 35.0, 70.0, 100.0].iter() {
        group.bench_with_input(BenchmarkId::new("noise", format!("{noise:.0}")), noise, |b, &noise| {
            b.iter(|| black_box(extract_clusters(&image, noise, false, None, 220_000)))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_extract_clusters_by_size, bench_extract_clusters_by_noise);
criterion_main!(benches);
