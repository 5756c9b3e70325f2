//! Training: reproducible split, scaler fit on the train partition only, random
//! forest fit on scaled features, held-out evaluation.

mod metrics;
mod split;

pub use metrics::{ConfusionMatrix, EvaluationReport};
pub use split::{train_test_split, Split};

use crate::config::TrainerConfig;
use crate::error::{ProcwatchError, Result};
use crate::features::{feature_names, Label, LabeledDataset, FEATURE_NAMES};
use crate::model::{ArtifactPair, ForestParams, RandomForest, StandardScaler};
use ndarray::Axis;
use tracing::{info, warn};

pub struct TrainingOutcome {
    pub artifacts: ArtifactPair,
    pub report: EvaluationReport,
    pub train_rows: usize,
    pub test_rows: usize,
}

pub struct Trainer {
    config: TrainerConfig,
}

impl Trainer {
    pub fn new(config: TrainerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TrainerConfig {
        &self.config
    }

    /// Fit and evaluate. Same dataset and config give the same model and metrics.
    pub fn train(&self, dataset: &LabeledDataset) -> Result<TrainingOutcome> {
        if dataset.is_empty() {
            return Err(ProcwatchError::EmptyDataset("training table has no rows".into()));
        }
        for label in [Label::Normal, Label::Suspicious] {
            if dataset.count(label) == 0 {
                warn!(missing = ?label, "training table contains a single class");
            }
        }

        let split = train_test_split(dataset.len(), self.config.test_fraction, self.config.seed)?;
        let x = dataset.features();
        let labels = dataset.labels();
        let x_train = x.select(Axis(0), &split.train);
        let x_test = x.select(Axis(0), &split.test);
        let y_train: Vec<Label> = split.train.iter().map(|&i| labels[i]).collect();
        let y_test: Vec<Label> = split.test.iter().map(|&i| labels[i]).collect();

        let scaler = StandardScaler::fit(feature_names(), x_train.view())?;
        let x_train = scaler.transform(&FEATURE_NAMES, x_train.view())?;
        let x_test = scaler.transform(&FEATURE_NAMES, x_test.view())?;

        let params = ForestParams::from(&self.config);
        let classifier = RandomForest::fit(x_train.view(), &y_train, params)?;
        let predicted = classifier.predict(x_test.view())?;
        let report = EvaluationReport::from_predictions(&y_test, &predicted);

        info!(
            train_rows = split.train.len(),
            test_rows = split.test.len(),
            trees = classifier.n_trees(),
            accuracy = report.accuracy,
            precision = report.precision,
            recall = report.recall,
            f1 = report.f1,
            baseline = report.majority_baseline,
            "training complete"
        );
        if !report.beats_baseline() {
            warn!(
                accuracy = report.accuracy,
                baseline = report.majority_baseline,
                "classifier does not beat the majority-class baseline"
            );
        }

        Ok(TrainingOutcome {
            artifacts: ArtifactPair::new(scaler, classifier),
            report,
            train_rows: split.train.len(),
            test_rows: split.test.len(),
        })
    }
}
