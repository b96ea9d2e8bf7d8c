//! Criterion benchmarks for u-evolve.
//!
//! Uses synthetic problems (Sphere function, OneMax, NSGA-II ranking) to
//! measure engine overhead independent of any domain.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::Rng;
use u_evolve::codec::VectorCodec;
use u_evolve::engine::{Engine, EngineConfig, Executor};
use u_evolve::objective::rank_and_crowding;
use u_evolve::problem::fitness_fn;
use u_evolve::random::create_rng;

fn sphere(x: &Vec<f64>) -> f64 {
    x.iter().map(|v| v * v).sum()
}

fn onemax(x: &Vec<bool>) -> f64 {
    x.iter().filter(|b| **b).count() as f64
}

// ===========================================================================
// Benchmarks
// ===========================================================================

fn bench_engine_sphere(c: &mut Criterion) {
    let mut group = c.benchmark_group("engine_sphere");
    group.sample_size(10);

    for (dim, pop, gen) in [(10usize, 50usize, 50usize), (50, 100, 30), (100, 100, 20)] {
        let config = EngineConfig::default()
            .with_population_size(pop)
            .with_max_generations(gen)
            .with_seed(42);
        group.bench_with_input(
            BenchmarkId::new(format!("d{}_p{}_g{}", dim, pop, gen), dim),
            &config,
            |b, config| {
                b.iter(|| {
                    let codec = VectorCodec::float(dim, -5.12..5.12).unwrap();
                    let mut engine =
                        Engine::new(codec, fitness_fn(sphere), black_box(config.clone())).unwrap();
                    black_box(engine.run().unwrap().score)
                })
            },
        );
    }
    group.finish();
}

fn bench_engine_onemax_executors(c: &mut Criterion) {
    let mut group = c.benchmark_group("engine_onemax");
    group.sample_size(10);

    for executor in [Executor::Serial, Executor::WorkerPool(4)] {
        let config = EngineConfig::default()
            .with_population_size(200)
            .with_max_generations(30)
            .with_executor(executor)
            .with_seed(7);
        group.bench_with_input(
            BenchmarkId::from_parameter(executor.name()),
            &config,
            |b, config| {
                b.iter(|| {
                    let codec = VectorCodec::bit(256).unwrap();
                    let mut engine =
                        Engine::new(codec, fitness_fn(onemax), black_box(config.clone())).unwrap();
                    black_box(engine.run().unwrap().score)
                })
            },
        );
    }
    group.finish();
}

fn bench_rank_and_crowding(c: &mut Criterion) {
    let mut group = c.benchmark_group("rank_and_crowding");

    for n in [100usize, 400] {
        let mut rng = create_rng(1);
        let objectives: Vec<Vec<f64>> = (0..n)
            .map(|_| vec![rng.random_range(0.0..1.0), rng.random_range(0.0..1.0)])
            .collect();
        group.bench_with_input(BenchmarkId::from_parameter(n), &objectives, |b, objs| {
            b.iter(|| black_box(rank_and_crowding(black_box(objs))))
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_engine_sphere,
    bench_engine_onemax_executors,
    bench_rank_and_crowding
);
criterion_main!(benches);
