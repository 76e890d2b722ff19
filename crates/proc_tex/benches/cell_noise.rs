mod common;

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use proc_tex::metric::{DistanceMetric, Metric};
use proc_tex::noise::{CellNoise2D, CellNoise3D, CellNoiseConfig, NeighborSearch};
use proc_tex::texture::Texture;
use rand::rngs::StdRng;
use rand::SeedableRng;

const GRID_SIDES: [usize; 4] = [2, 8, 32, 128];
const IMAGE_SIDE: usize = 128;

fn cell_noise_2d_benches(c: &mut Criterion) {
    let grid = common::unit_grid(IMAGE_SIDE);
    let pixels = IMAGE_SIDE * IMAGE_SIDE;

    for search in [NeighborSearch::Exact, NeighborSearch::Fixed] {
        let mut group = c.benchmark_group(format!("cell_noise/2d/{search:?}"));
        group.throughput(common::elements_throughput(pixels));

        for &side in &GRID_SIDES {
            let config = CellNoiseConfig::grid(side, side)
                .with_points_per_cell(1, 3)
                .with_search(search);
            let mut rng = StdRng::seed_from_u64(0xCE11 ^ side as u64);
            let noise = CellNoise2D::new(&config, &mut rng).expect("noise");

            group.bench_with_input(BenchmarkId::from_parameter(side), &side, |b, _| {
                b.iter(|| {
                    let out = noise.evaluate(grid.points()).expect("evaluate");
                    black_box(out.data()[0]);
                });
            });
        }
        group.finish();
    }
}

fn cell_noise_3d_benches(c: &mut Criterion) {
    let grid = common::unit_slice(IMAGE_SIDE / 2, 0.5);
    let pixels = (IMAGE_SIDE / 2) * (IMAGE_SIDE / 2);

    let mut group = c.benchmark_group("cell_noise/3d");
    group.throughput(common::elements_throughput(pixels));
    for &side in &GRID_SIDES[..3] {
        let config = CellNoiseConfig::cube(side, 1);
        let mut rng = StdRng::seed_from_u64(0x3D ^ side as u64);
        let noise = CellNoise3D::new(&config, &mut rng).expect("noise");

        group.bench_with_input(BenchmarkId::from_parameter(side), &side, |b, _| {
            b.iter(|| {
                let out = noise.evaluate(grid.points()).expect("evaluate");
                black_box(out.data()[0]);
            });
        });
    }
    group.finish();
}

fn cell_noise_query_vs_brute_force(c: &mut Criterion) {
    let config = CellNoiseConfig::grid(16, 16).with_points_per_cell(1, 4);
    let mut rng = StdRng::seed_from_u64(0xB0B);
    let noise = CellNoise2D::new(&config, &mut rng).expect("noise");
    let metric: &dyn DistanceMetric = &Metric::SquaredEuclidean;
    let queries: Vec<[f32; 2]> = (0..1024)
        .map(|i| [(i % 32) as f32 / 32.0, (i / 32) as f32 / 32.0])
        .collect();

    let mut group = c.benchmark_group("cell_noise/nearest");
    group.throughput(common::elements_throughput(queries.len()));
    group.bench_function("grid", |b| {
        b.iter(|| {
            for q in &queries {
                black_box(noise.grid().nearest(black_box(q), metric));
            }
        });
    });
    group.bench_function("brute_force", |b| {
        b.iter(|| {
            for q in &queries {
                black_box(noise.grid().nearest_brute_force(black_box(q), metric));
            }
        });
    });
    group.finish();
}

fn cell_noise_step_benches(c: &mut Criterion) {
    let mut group = c.benchmark_group("cell_noise/step_frame");
    for &side in &GRID_SIDES {
        let config = CellNoiseConfig::square(side, 2);
        let mut rng = StdRng::seed_from_u64(0x57E9 ^ side as u64);
        let mut noise = CellNoise2D::new(&config, &mut rng).expect("noise");
        group.throughput(common::elements_throughput(noise.grid().points().len()));

        group.bench_with_input(BenchmarkId::from_parameter(side), &side, |b, _| {
            b.iter(|| noise.step_frame());
        });
    }
    group.finish();
}

criterion_group! {
    name = benches;
    config = common::default_criterion();
    targets = cell_noise_2d_benches, cell_noise_3d_benches, cell_noise_query_vs_brute_force,
        cell_noise_step_benches
}
criterion_main!(benches);
