//! Benchmark array traversal orders.
//!
//! Run with: `cargo bench --bench iterate_benchmark`

#![allow(clippy::cast_possible_truncation)]

use cachebench_core::kernels::{
    jump_increment, reverse_jump_increment, reverse_sequential_increment, sequential_increment,
    simd_reverse_sequential_increment, simd_sequential_increment,
};
use cachebench_core::partition::interleaved_increment;
use cachebench_core::{Buffer, VECTOR_ALIGNMENT};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

const SIZES: [usize; 4] = [1_000, 100_000, 1_000_000, 2_000_000];
const PASSES: usize = 4;

type RangeKernel = fn(&mut [i32], std::ops::Range<usize>, usize);

fn bench_single_threaded(c: &mut Criterion) {
    let kernels: [(&str, RangeKernel); 6] = [
        ("sequential", sequential_increment::<i32>),
        ("reverse", reverse_sequential_increment::<i32>),
        ("jump", jump_increment::<i32>),
        ("reverse_jump", reverse_jump_increment::<i32>),
        ("simd_sequential", simd_sequential_increment::<i32>),
        ("simd_reverse", simd_reverse_sequential_increment::<i32>),
    ];

    let mut group = c.benchmark_group("iterate_int");
    for size in SIZES {
        let mut data = Buffer::<i32>::allocate_aligned(size, VECTOR_ALIGNMENT).unwrap();
        group.throughput(Throughput::Elements((size * PASSES) as u64));

        for (name, kernel) in kernels {
            group.bench_with_input(BenchmarkId::new(name, size), &size, |bencher, &size| {
                bencher.iter(|| {
                    kernel(&mut data, 0..size, PASSES);
                    black_box(&data);
                });
            });
        }
    }
    group.finish();
}

fn bench_interleaved(c: &mut Criterion) {
    let mut group = c.benchmark_group("iterate_interleaved_int");
    let size = 1_000_000;
    group.throughput(Throughput::Elements((size * PASSES) as u64));

    for workers in [2, 4, 8] {
        let mut data = Buffer::<i32>::allocate_aligned(size, VECTOR_ALIGNMENT).unwrap();
        group.bench_with_input(
            BenchmarkId::new("interleaved", workers),
            &workers,
            |bencher, &workers| {
                bencher.iter(|| {
                    interleaved_increment(&mut data, workers, PASSES).unwrap();
                    black_box(&data);
                });
            },
        );
    }
    group.finish();
}

fn bench_element_width(c: &mut Criterion) {
    let mut group = c.benchmark_group("iterate_jump_by_type");
    let size = 1_000_000;

    let mut ints = Buffer::<i32>::allocate_aligned(size, VECTOR_ALIGNMENT).unwrap();
    group.bench_function("int", |b| {
        b.iter(|| jump_increment(black_box(&mut ints[..]), 0..size, PASSES));
    });
    let mut longs = Buffer::<i64>::allocate_aligned(size, VECTOR_ALIGNMENT).unwrap();
    group.bench_function("long", |b| {
        b.iter(|| jump_increment(black_box(&mut longs[..]), 0..size, PASSES));
    });
    let mut floats = Buffer::<f32>::allocate_aligned(size, VECTOR_ALIGNMENT).unwrap();
    group.bench_function("float", |b| {
        b.iter(|| jump_increment(black_box(&mut floats[..]), 0..size, PASSES));
    });
    let mut doubles = Buffer::<f64>::allocate_aligned(size, VECTOR_ALIGNMENT).unwrap();
    group.bench_function("double", |b| {
        b.iter(|| jump_increment(black_box(&mut doubles[..]), 0..size, PASSES));
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_single_threaded,
    bench_interleaved,
    bench_element_width
);
criterion_main!(benches);
