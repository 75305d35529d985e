//! Criterion micro-benchmarks for derived-coordinate synthesis and update.

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use isobar_bench::{hybrid_grid, reference_grid};
use isobar_core::Coordinate;
use isobar_factory::AuxCoordFactory;

/// Benchmark: points-only synthesis on the 50 x 180 x 360 reference grid.
fn bench_make_coord_points(c: &mut Criterion) {
    let grid = reference_grid(false).unwrap();
    let dims_of = |coord: &dyn Coordinate| grid.dims_of(coord);

    c.bench_function("make_coord_points_reference", |b| {
        b.iter(|| {
            let coord = grid.factory.make_coord(&dims_of).unwrap();
            black_box(coord);
        });
    });
}

/// Benchmark: synthesis with two bounds per cell on the reference grid.
fn bench_make_coord_bounds(c: &mut Criterion) {
    let grid = reference_grid(true).unwrap();
    let dims_of = |coord: &dyn Coordinate| grid.dims_of(coord);

    c.bench_function("make_coord_bounds_reference", |b| {
        b.iter(|| {
            let coord = grid.factory.make_coord(&dims_of).unwrap();
            black_box(coord);
        });
    });
}

/// Benchmark: points-only synthesis as the horizontal grid grows.
fn bench_make_coord_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("make_coord_scaling");
    for side in [16usize, 64, 256] {
        let grid = hybrid_grid(32, side, side, false).unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(side), &grid, |b, grid| {
            let dims_of = |coord: &dyn Coordinate| grid.dims_of(coord);
            b.iter(|| black_box(grid.factory.make_coord(&dims_of).unwrap()));
        });
    }
    group.finish();
}

/// Benchmark: validate-and-swap update of `delta`, alternating between two
/// coordinates.
fn bench_update_delta(c: &mut Criterion) {
    let grid = hybrid_grid(50, 4, 4, false).unwrap();
    let other = hybrid_grid(50, 4, 4, false).unwrap();
    let mut factory = grid.factory.clone();
    let pair = [grid.delta.clone(), other.delta.clone()];
    let mut current = 0;

    c.bench_function("update_delta", |b| {
        b.iter(|| {
            let next = 1 - current;
            factory
                .update(&pair[current], Some(pair[next].clone()))
                .unwrap();
            current = next;
            black_box(&factory);
        });
    });
}

criterion_group!(
    benches,
    bench_make_coord_points,
    bench_make_coord_bounds,
    bench_make_coord_scaling,
    bench_update_delta,
);
criterion_main!(benches);
