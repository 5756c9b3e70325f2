//! Scoring benchmark: observations → scaler → forest → threat score.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use procwatch::config::TrainerConfig;
use procwatch::features::ObservationTable;
use procwatch::generator::{DatasetGenerator, GeneratorProfile};
use procwatch::scoring::{threat_scores, Scorer};
use procwatch::training::Trainer;

fn trained() -> (procwatch::ArtifactPair, Vec<procwatch::Observation>) {
    let data = DatasetGenerator::new(GeneratorProfile::realistic().with_counts(200, 50))
        .with_seed(42)
        .generate()
        .expect("generate");
    let outcome = Trainer::new(TrainerConfig {
        n_estimators: 50,
        ..TrainerConfig::default()
    })
    .train(&data)
    .expect("train");
    (outcome.artifacts, data.observations())
}

fn bench_score_observations(c: &mut Criterion) {
    let (artifacts, observations) = trained();
    let scorer = Scorer::new(&artifacts);

    let mut g = c.benchmark_group("score_by_batch");
    for n in [1, 50, 500] {
        let batch: Vec<_> = observations.iter().copied().take(n).collect();
        g.bench_function(format!("{}_rows", n), |b| {
            b.iter(|| black_box(scorer.score_observations(black_box(&batch))))
        });
    }
    g.finish();
}

fn bench_score_table(c: &mut Criterion) {
    let (artifacts, observations) = trained();
    let scorer = Scorer::new(&artifacts);
    let table = ObservationTable::from_observations(&observations);

    c.bench_function("score_table_500_rows", |b| {
        b.iter(|| black_box(scorer.score_table(black_box(table.clone()))))
    });
}

fn bench_threat_scores(c: &mut Criterion) {
    let (_, observations) = trained();
    c.bench_function("threat_scores_500_rows", |b| {
        b.iter(|| black_box(threat_scores(black_box(&observations))))
    });
}

criterion_group!(
    benches,
    bench_score_observations,
    bench_score_table,
    bench_threat_scores
);
criterion_main!(benches);
