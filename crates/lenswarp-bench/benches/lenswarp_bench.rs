//! Benchmarks for lenswarp hot paths.
//!
//! Run with: `cargo bench`

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use std::f64::consts::PI;
use std::hint::black_box;

use lenswarp_core::{ChannelLayout, Image, LensModel};
use lenswarp_ops::{ColorProcessor, Kernel, Resampler, reproject};

fn lenses() -> [LensModel; 3] {
    [
        LensModel::rectilinear(12.0, 36.0, 24.0).unwrap(),
        LensModel::fisheye_equisolid(8.0, 36.0, 24.0, PI).unwrap(),
        LensModel::fisheye_equidistant(36.0, 24.0, PI).unwrap(),
    ]
}

fn gradient(width: u32, height: u32, lens: LensModel) -> Image {
    let data = (0..width * height)
        .flat_map(|i| {
            let x = (i % width) as f32 / width as f32;
            let y = (i / width) as f32 / height as f32;
            [x, y, 0.5 * (x + y)]
        })
        .collect();
    Image::from_data(width, height, ChannelLayout::Rgb, data, lens).unwrap()
}

/// Benchmark per-pixel lens mapping.
fn bench_lens(c: &mut Criterion) {
    let mut group = c.benchmark_group("lens");
    let (w, h) = (1920, 1280);
    let pixels: Vec<(f64, f64)> = (0..10_000)
        .map(|i| ((i % 100) as f64 * 19.2 + 0.5, (i / 100) as f64 * 12.8 + 0.5))
        .collect();
    group.throughput(Throughput::Elements(pixels.len() as u64));

    for lens in lenses() {
        group.bench_with_input(BenchmarkId::new("unproject", lens.name()), &lens, |b, l| {
            b.iter(|| {
                pixels
                    .iter()
                    .filter_map(|&(x, y)| l.unproject(black_box(x), black_box(y), w, h))
                    .count()
            })
        });

        let rays: Vec<_> = pixels
            .iter()
            .filter_map(|&(x, y)| lens.unproject(x, y, w, h))
            .collect();
        group.bench_with_input(BenchmarkId::new("project", lens.name()), &lens, |b, l| {
            b.iter(|| rays.iter().filter_map(|&r| l.project(black_box(r), w, h)).count())
        });
    }

    group.finish();
}

/// Benchmark single-point sampling per kernel.
fn bench_resample(c: &mut Criterion) {
    let mut group = c.benchmark_group("resample");
    let image = gradient(512, 512, lenses()[0]);
    let points: Vec<(f64, f64)> = (0..10_000)
        .map(|i| ((i % 100) as f64 * 5.07 + 0.3, (i / 100) as f64 * 5.03 + 0.7))
        .collect();
    group.throughput(Throughput::Elements(points.len() as u64));

    for kernel in [Kernel::Nearest, Kernel::Bilinear, Kernel::Bicubic] {
        let resampler = Resampler::new(kernel);
        group.bench_function(kernel.name(), |b| {
            let mut out = [0.0f32; 3];
            b.iter(|| {
                for &(x, y) in &points {
                    resampler.sample(&image, black_box(x), black_box(y), &mut out);
                }
                out
            })
        });
    }

    group.finish();
}

/// Benchmark full-image reprojection at several supersampling levels.
fn bench_reproject(c: &mut Criterion) {
    let mut group = c.benchmark_group("reproject");
    group.sample_size(10);

    let [rect, _, equidistant] = lenses();
    let input = gradient(512, 512, equidistant);
    let (w, h) = (256, 256);
    group.throughput(Throughput::Elements((w * h) as u64));

    for n in [1u32, 2, 4] {
        group.bench_with_input(BenchmarkId::new("fisheye_to_rect", n), &n, |b, &n| {
            b.iter(|| reproject(black_box(&input), &rect, w, h, n, Kernel::Bicubic).unwrap())
        });
    }

    group.finish();
}

/// Benchmark colour post-processing.
fn bench_color(c: &mut Criterion) {
    let mut group = c.benchmark_group("color");
    let image = gradient(1024, 1024, lenses()[0]);
    group.throughput(Throughput::Elements(image.pixel_count() as u64));

    let manual = ColorProcessor {
        exposure_ev: 1.0,
        reinhard_max: Some(4.0),
        auto_exposure: false,
    };
    let auto = ColorProcessor {
        auto_exposure: true,
        ..manual
    };

    group.bench_function("exposure_reinhard", |b| {
        b.iter_batched(|| image.clone(), |img| manual.process(img), criterion::BatchSize::LargeInput)
    });
    group.bench_function("auto_exposure", |b| {
        b.iter_batched(|| image.clone(), |img| auto.process(img), criterion::BatchSize::LargeInput)
    });

    group.finish();
}

criterion_group!(benches, bench_lens, bench_resample, bench_reproject, bench_color);
criterion_main!(benches);
