//! Benchmark matrix multiply orders on both layouts.
//!
//! Run with: `cargo bench --bench matrix_benchmark`

use cachebench_core::kernels::{multiply, multiply_parallel};
use cachebench_core::{DenseMatrix, FlatMatrix, MultiplyOrder, RowMatrix};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

const SIZES: [usize; 3] = [64, 128, 256];

fn filled<M: DenseMatrix<f32>>(mut m: M) -> M {
    m.fill(3.0);
    m
}

fn bench_orders(c: &mut Criterion) {
    let mut group = c.benchmark_group("matmul_float");
    group.sample_size(20);

    for n in SIZES {
        let a = filled(FlatMatrix::<f32>::allocate(n).unwrap());
        let b = filled(FlatMatrix::<f32>::allocate(n).unwrap());
        let mut out = FlatMatrix::<f32>::allocate(n).unwrap();
        for order in MultiplyOrder::ALL {
            group.bench_with_input(BenchmarkId::new(order.name(), n), &n, |bencher, _| {
                bencher.iter(|| {
                    multiply(order, &a, &b, &mut out).unwrap();
                    black_box(&out);
                });
            });
        }
    }
    group.finish();
}

fn bench_layouts(c: &mut Criterion) {
    let mut group = c.benchmark_group("matmul_layout");
    group.sample_size(20);
    let n = 256;

    let a = filled(RowMatrix::<f32>::allocate(n).unwrap());
    let b = filled(RowMatrix::<f32>::allocate(n).unwrap());
    let mut out = RowMatrix::<f32>::allocate(n).unwrap();
    group.bench_function("rows", |bencher| {
        bencher.iter(|| multiply(MultiplyOrder::Optimized, &a, &b, &mut out).unwrap());
    });

    let a = filled(FlatMatrix::<f32>::allocate(n).unwrap());
    let b = filled(FlatMatrix::<f32>::allocate(n).unwrap());
    let mut out = FlatMatrix::<f32>::allocate(n).unwrap();
    group.bench_function("flat", |bencher| {
        bencher.iter(|| multiply(MultiplyOrder::Optimized, &a, &b, &mut out).unwrap());
    });
    group.finish();
}

fn bench_parallel(c: &mut Criterion) {
    let mut group = c.benchmark_group("matmul_parallel");
    group.sample_size(10);
    let n = 512;

    let a = filled(FlatMatrix::<f32>::allocate(n).unwrap());
    let b = filled(FlatMatrix::<f32>::allocate(n).unwrap());
    let mut out = FlatMatrix::<f32>::allocate(n).unwrap();
    // 4 and 9 use a square grid, 2 and 8 fall back to row bands.
    for workers in [1, 2, 4, 8, 9] {
        group.bench_with_input(
            BenchmarkId::new("vectorized", workers),
            &workers,
            |bencher, &workers| {
                bencher.iter(|| {
                    multiply_parallel(MultiplyOrder::Vectorized, &a, &b, &mut out, workers)
                        .unwrap();
                });
            },
        );
    }
    group.finish();
}

criterion_group!(benches, bench_orders, bench_layouts, bench_parallel);
criterion_main!(benches);
