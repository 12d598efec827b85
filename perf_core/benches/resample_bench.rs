//! Criterion benchmarks for volume resizing and the error metric.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use ndarray::{Array3, Array4};
use perf_core::prelude::*;

fn make_volume(side: usize) -> Volume {
    let data = Array3::from_shape_fn((side, side, side), |(i, j, k)| {
        ((i * 31 + j * 17 + k * 7) % 255) as f32
    });
    Volume::from_array3(data, Affine::from_zooms([1.0; 3], [-(side as f64) / 2.0; 3]))
}

fn bench_resize(c: &mut Criterion) {
    let mut group = c.benchmark_group("resize_img");

    for side in [32, 64, 128] {
        let volume = make_volume(side);
        let target = [side / 2; 3];
        group.throughput(Throughput::Elements((target[0] * target[1] * target[2]) as u64));

        group.bench_with_input(BenchmarkId::new("cubic_spline", side), &volume, |b, volume| {
            b.iter(|| black_box(resize_img(black_box(volume), target).unwrap()))
        });

        group.bench_with_input(BenchmarkId::new("trilinear", side), &volume, |b, volume| {
            b.iter(|| {
                black_box(
                    resize_img_with(black_box(volume), target, Interpolation::Trilinear).unwrap(),
                )
            })
        });

        group.bench_with_input(BenchmarkId::new("nearest", side), &volume, |b, volume| {
            b.iter(|| {
                black_box(resize_img_with(black_box(volume), target, Interpolation::Nearest).unwrap())
            })
        });
    }

    group.finish();
}

fn bench_resize_4d(c: &mut Criterion) {
    let data = Array4::from_shape_fn((64, 64, 16, 20), |(i, j, k, t)| (i + j + k + t) as f32);
    let volume = Volume::from_array4(data, Affine::identity());

    c.bench_function("resize_4d_64x64x16x20", |b| {
        b.iter(|| black_box(resize_img(black_box(&volume), [32, 32, 16]).unwrap()))
    });
}

fn bench_mae(c: &mut Criterion) {
    let mut group = c.benchmark_group("mae");

    for side in [64, 256] {
        let a = Array3::<f32>::from_elem((side, side, 4), 0.25);
        let b = Array3::<f32>::from_elem((side, side, 4), -0.5);
        group.throughput(Throughput::Elements(a.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(side), &(a, b), |bench, (a, b)| {
            bench.iter(|| black_box(mae(black_box(a), black_box(b)).unwrap()))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_resize, bench_resize_4d, bench_mae);
criterion_main!(benches);
