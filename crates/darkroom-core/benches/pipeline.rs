//! Benchmarks for the Darkroom processing pipeline.
//!
//! Run with: cargo bench -p darkroom-core

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use darkroom_core::config::{BackendMode, Config};
use darkroom_core::geometry::contained_size;
use darkroom_core::pipeline::{compress, thumbnail, CompressParams, DecodedImage, ThumbnailParams};
use darkroom_core::{CompressOptions, ImageInput, ImageProcessor};
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat};
use std::io::Cursor;

fn source_image() -> DecodedImage {
    DecodedImage::from_image(DynamicImage::new_rgb8(1920, 1080), ImageFormat::Png)
}

fn benchmark_contained_size(c: &mut Criterion) {
    c.bench_function("contained_size", |b| {
        b.iter(|| contained_size(black_box(4000), black_box(3000), 1920, 1920))
    });
}

fn benchmark_compress(c: &mut Criterion) {
    let params = CompressParams {
        max_width: 960,
        max_height: 960,
        quality: 0.8,
    };

    for (name, filter) in [
        ("compress_lanczos3", FilterType::Lanczos3),
        ("compress_triangle", FilterType::Triangle),
    ] {
        c.bench_function(name, |b| {
            b.iter_batched(
                source_image,
                |image| compress::compress(image, black_box(&params), filter),
                criterion::BatchSize::LargeInput,
            )
        });
    }
}

fn benchmark_thumbnail(c: &mut Criterion) {
    let params = ThumbnailParams { size: 150 };

    c.bench_function("thumbnail_150px", |b| {
        b.iter_batched(
            source_image,
            |image| thumbnail::thumbnail(image, black_box(&params), FilterType::Triangle),
            criterion::BatchSize::LargeInput,
        )
    });
}

fn benchmark_process_image(c: &mut Criterion) {
    let mut bytes = Vec::new();
    DynamicImage::new_rgb8(1280, 720)
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .unwrap();
    let input = ImageInput::new("bench.png", bytes);
    let options = CompressOptions {
        max_width: 640,
        max_height: 640,
        quality: 0.8,
    };
    let rt = tokio::runtime::Runtime::new().unwrap();

    for (name, mode) in [
        ("process_image_offloaded", BackendMode::Offloaded),
        ("process_image_fallback", BackendMode::Fallback),
    ] {
        let mut config = Config::default();
        config.backend.mode = mode;
        let processor = rt.block_on(async { ImageProcessor::new(&config) }).unwrap();

        c.bench_function(name, |b| {
            b.iter(|| rt.block_on(processor.process_image(black_box(&input), &options)))
        });
    }
}

criterion_group!(
    benches,
    benchmark_contained_size,
    benchmark_compress,
    benchmark_thumbnail,
    benchmark_process_image
);
criterion_main!(benches);
