//! Pipeline benchmark: generate → train, and the live collect → score cycle.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use procwatch::collectors::{live_table, HeuristicMapper, LiveCollector, SysinfoSource};
use procwatch::config::TrainerConfig;
use procwatch::generator::{DatasetGenerator, GeneratorProfile};
use procwatch::scoring::Scorer;
use procwatch::training::Trainer;
use std::time::Duration;

fn bench_generate(c: &mut Criterion) {
    let generator = DatasetGenerator::new(GeneratorProfile::realistic()).with_seed(42);
    c.bench_function("generate_realistic_1200_rows", |b| {
        b.iter(|| black_box(generator.generate()))
    });
}

fn bench_train(c: &mut Criterion) {
    let data = DatasetGenerator::new(GeneratorProfile::realistic())
        .with_seed(42)
        .generate()
        .expect("generate");
    let trainer = Trainer::new(TrainerConfig {
        n_estimators: 20,
        ..TrainerConfig::default()
    });

    let mut g = c.benchmark_group("train");
    g.sample_size(10);
    g.bench_function("train_20_trees_1200_rows", |b| {
        b.iter(|| black_box(trainer.train(black_box(&data))))
    });
    g.finish();
}

fn bench_live_cycle(c: &mut Criterion) {
    let data = DatasetGenerator::new(GeneratorProfile::compact().with_counts(100, 100))
        .with_seed(42)
        .generate()
        .expect("generate");
    let outcome = Trainer::new(TrainerConfig {
        n_estimators: 20,
        ..TrainerConfig::default()
    })
    .train(&data)
    .expect("train");
    let scorer = Scorer::new(&outcome.artifacts);
    let mut collector = LiveCollector::new(
        SysinfoSource::new(Duration::from_millis(0)),
        HeuristicMapper::seeded(42),
    );

    let mut g = c.benchmark_group("live");
    g.sample_size(10);
    g.bench_function("collect_and_score", |b| {
        b.iter(|| {
            let records = collector.collect();
            black_box(scorer.score_table(live_table(&records)))
        })
    });
    g.finish();
}

criterion_group!(benches, bench_generate, bench_train, bench_live_cycle);
criterion_main!(benches);
