//! Artifact benchmark: save and load of the scaler + classifier pair.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use procwatch::config::TrainerConfig;
use procwatch::generator::{DatasetGenerator, GeneratorProfile};
use procwatch::model::ArtifactPair;
use procwatch::training::Trainer;

fn bench_artifacts(c: &mut Criterion) {
    let data = DatasetGenerator::new(GeneratorProfile::realistic().with_counts(200, 50))
        .with_seed(42)
        .generate()
        .expect("generate");
    let artifacts = Trainer::new(TrainerConfig {
        n_estimators: 50,
        ..TrainerConfig::default()
    })
    .train(&data)
    .expect("train")
    .artifacts;
    let dir = tempfile::tempdir().expect("tempdir");
    artifacts.save(dir.path()).expect("save");

    c.bench_function("artifact_save_50_trees", |b| {
        b.iter(|| artifacts.save(black_box(dir.path())).expect("save"))
    });
    c.bench_function("artifact_load_50_trees", |b| {
        b.iter(|| black_box(ArtifactPair::load(dir.path()).expect("load")))
    });
}

criterion_group!(benches, bench_artifacts);
criterion_main!(benches);
