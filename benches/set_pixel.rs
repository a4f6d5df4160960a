// Run with:  cargo bench --bench set_pixel

use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use scan_matrix::{compute_stride, PixelBuffer};
use std::hint::black_box;

const WIDTH: usize = 64;
const HEIGHT: usize = 16;
const STRIDE: usize = compute_stride(WIDTH);

fn set_pixel(c: &mut Criterion) {
    let mut group = c.benchmark_group("set_pixel");
    group.throughput(Throughput::Elements((WIDTH * HEIGHT) as u64));

    group.bench_function("set_every_pixel", |b| {
        let mut buffer = PixelBuffer::<WIDTH, HEIGHT, STRIDE>::new();

        b.iter(|| {
            for y in 0..HEIGHT {
                for x in 0..WIDTH {
                    black_box(&mut buffer).set_pixel(black_box(x), black_box(y));
                }
            }
        });
    });

    group.bench_function("mask_every_pixel", |b| {
        let mut buffer = PixelBuffer::<WIDTH, HEIGHT, STRIDE>::new();

        b.iter(|| {
            for y in 0..HEIGHT {
                for x in 0..WIDTH {
                    black_box(&mut buffer).mask_pixel(black_box(x), black_box(y), true);
                }
            }
        });
    });

    group.bench_function("mask_region", |b| {
        let mut buffer = PixelBuffer::<WIDTH, HEIGHT, STRIDE>::new();

        b.iter(|| {
            black_box(&mut buffer).mask_region(0, 0, WIDTH, HEIGHT, true);
        });
    });

    group.finish();
}

criterion_group!(benches, set_pixel);
criterion_main!(benches);
