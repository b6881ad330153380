//! Tile cache variant benchmarks
//!
//! Compares the three shared-memory layouts on the simulation-size grid and
//! a wider one, plus the sequential golden output as a baseline.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use tilestencil::prelude::*;

/// Benchmark each variant over two grid sizes
fn bench_variants(c: &mut Criterion) {
    let mut group = c.benchmark_group("stencil/variant");
    let stencil = TiledStencil::new(SimtConfig::default());

    for size in [64usize, 256] {
        let grid = GridShape::new(size, size);
        let input = populate_random(grid, 0);
        let mut output = vec![0; grid.len()];
        group.throughput(Throughput::Elements(grid.len() as u64));

        for variant in TilingVariant::ALL {
            group.bench_with_input(BenchmarkId::new(variant.as_str(), size), &grid, |b, &grid| {
                b.iter(|| {
                    let stats = stencil
                        .run_into(variant, black_box(&input), grid, &mut output)
                        .unwrap();
                    black_box(stats);
                });
            });
        }
    }

    group.finish();
}

/// Benchmark block scheduling modes
fn bench_schedule(c: &mut Criterion) {
    let mut group = c.benchmark_group("stencil/schedule");
    let grid = GridShape::new(128, 128);
    let input = populate_random(grid, 1);

    for mode in [ExecutionMode::Parallel, ExecutionMode::Sequential] {
        let stencil = TiledStencil::new(SimtConfig::default()).with_mode(mode);
        group.bench_function(format!("{mode:?}").to_lowercase(), |b| {
            b.iter(|| {
                let run = stencil.run(TilingVariant::Masked, black_box(&input), grid).unwrap();
                black_box(run);
            });
        });
    }

    group.finish();
}

/// Benchmark the sequential reference
fn bench_golden(c: &mut Criterion) {
    let grid = GridShape::new(256, 256);
    let input = populate_product(grid);

    c.bench_function("stencil/golden_256", |b| {
        b.iter(|| black_box(golden_output(black_box(&input), grid)));
    });
}

criterion_group!(benches, bench_variants, bench_schedule, bench_golden);
criterion_main!(benches);
