//! Benchmarks for feature search strategies.

use std::convert::Infallible;

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};

use feature_search::{
    FeatureId, SearchDriver, SearchStrategy,
    schema::{EvolutionParams, PopulationConfig, SearchConfig, StrategyKind},
};

fn weighted_oracle(features: &[FeatureId]) -> Result<f64, Infallible> {
    Ok(features
        .iter()
        .map(|&f| if f % 3 == 0 { 1.0 } else { -0.5 })
        .sum())
}

fn bench_evolutionary_run(c: &mut Criterion) {
    let mut group = c.benchmark_group("evolutionary_run");

    for features in [16, 64, 256, 1024] {
        let config = SearchConfig {
            population: PopulationConfig {
                size: 32,
                max_generations: 10,
            },
            evolution: EvolutionParams {
                elitism: 2,
                mutation_rate: 0.02,
            },
            ..SearchConfig::with_feature_count(features).with_seed(42)
        };

        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{} features", features)),
            &features,
            |b, _| {
                b.iter(|| {
                    let mut strategy = SearchStrategy::from_config(&config).unwrap();
                    let result = SearchDriver::new()
                        .run(black_box(&mut strategy), &weighted_oracle)
                        .unwrap();
                    black_box(result.best_score)
                });
            },
        );
    }

    group.finish();
}

fn bench_sequential_forward(c: &mut Criterion) {
    let mut group = c.benchmark_group("sequential_forward");

    for features in [8, 32, 64] {
        let config =
            SearchConfig::with_feature_count(features).with_strategy(StrategyKind::SequentialForward);

        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{} features", features)),
            &features,
            |b, _| {
                b.iter(|| {
                    let mut strategy = SearchStrategy::from_config(&config).unwrap();
                    let result = SearchDriver::new()
                        .run(black_box(&mut strategy), &weighted_oracle)
                        .unwrap();
                    black_box(result.best_score)
                });
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_evolutionary_run, bench_sequential_forward);
criterion_main!(benches);
