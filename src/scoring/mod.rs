//! Scoring: schema-checked scaling, forest prediction and probability, and the
//! batch-relative threat score.

mod threat;

pub use threat::{threat_score, threat_scores, BatchMaxima};

use crate::error::Result;
use crate::features::{observation_matrix, Label, Observation, ObservationTable, FEATURE_NAMES};
use crate::model::{label_for, ArtifactPair};
use serde::Serialize;
use std::cmp::Ordering;
use std::io::Write;
use std::path::Path;
use tracing::debug;

pub const PREDICTION_COLUMN: &str = "prediction";
pub const PROBABILITY_COLUMN: &str = "threat_probability";
pub const THREAT_SCORE_COLUMN: &str = "threat_score";

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Score {
    pub prediction: Label,
    /// Forest probability of the suspicious class
    pub threat_probability: f64,
    /// Batch-relative, unbounded
    pub threat_score: f64,
}

/// Scores a batch against one artifact pair. Holds no state of its own.
pub struct Scorer<'a> {
    artifacts: &'a ArtifactPair,
}

impl<'a> Scorer<'a> {
    pub fn new(artifacts: &'a ArtifactPair) -> Self {
        Self { artifacts }
    }

    /// Score every row of `table`. Non-feature columns are carried through untouched;
    /// feature columns out of order or missing fail with `SchemaMismatch`.
    pub fn score_table(&self, table: ObservationTable) -> Result<ScoredTable> {
        self.artifacts.scaler().check_columns(&table.feature_columns())?;
        let observations = table.observations()?;
        let scores = self.score_observations(&observations)?;
        debug!(rows = scores.len(), "scored table");
        Ok(ScoredTable {
            table,
            observations,
            scores,
        })
    }

    /// Score observations already in schema order. The threat score is relative to this slice.
    pub fn score_observations(&self, observations: &[Observation]) -> Result<Vec<Score>> {
        let x = observation_matrix(observations);
        let scaled = self.artifacts.scaler().transform(&FEATURE_NAMES, x.view())?;
        let probabilities = self.artifacts.classifier().predict_proba(scaled.view())?;
        let threat = threat_scores(observations);
        Ok(probabilities
            .into_iter()
            .zip(threat)
            .map(|(p, t)| Score {
                prediction: label_for(p),
                threat_probability: p,
                threat_score: t,
            })
            .collect())
    }
}

/// Input table plus one [`Score`] per row.
#[derive(Debug, Clone)]
pub struct ScoredTable {
    table: ObservationTable,
    observations: Vec<Observation>,
    scores: Vec<Score>,
}

impl ScoredTable {
    pub fn table(&self) -> &ObservationTable {
        &self.table
    }

    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    pub fn scores(&self) -> &[Score] {
        &self.scores
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    pub fn suspicious_count(&self) -> usize {
        self.scores
            .iter()
            .filter(|s| s.prediction.is_suspicious())
            .count()
    }

    pub fn normal_count(&self) -> usize {
        self.len() - self.suspicious_count()
    }

    /// Pass-through cell of `column` at `row`, if the input had that column.
    pub fn cell(&self, row: usize, column: &str) -> Option<&str> {
        let idx = self.table.columns().iter().position(|c| c == column)?;
        self.table.rows().get(row)?.get(idx).map(String::as_str)
    }

    /// Row indices by descending threat score; equal scores keep input order.
    pub fn ranked(&self) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.scores.len()).collect();
        order.sort_by(|&a, &b| {
            self.scores[b]
                .threat_score
                .partial_cmp(&self.scores[a].threat_score)
                .unwrap_or(Ordering::Equal)
        });
        order
    }

    /// Input columns followed by `prediction`, `threat_probability`, `threat_score`.
    pub fn header(&self) -> Vec<&str> {
        let mut h: Vec<&str> = self.table.columns().iter().map(String::as_str).collect();
        h.extend([PREDICTION_COLUMN, PROBABILITY_COLUMN, THREAT_SCORE_COLUMN]);
        h
    }

    pub fn write_csv(&self, path: &Path) -> Result<()> {
        self.write_rows(create_file(path)?, 0..self.len())
    }

    /// Same as [`ScoredTable::write_csv`], most threatening rows first.
    pub fn write_ranked_csv(&self, path: &Path) -> Result<()> {
        self.write_rows(create_file(path)?, self.ranked())
    }

    pub fn to_writer<W: Write>(&self, writer: W) -> Result<()> {
        self.write_rows(writer, 0..self.len())
    }

    fn write_rows<W, I>(&self, writer: W, order: I) -> Result<()>
    where
        W: Write,
        I: IntoIterator<Item = usize>,
    {
        let mut wtr = csv::Writer::from_writer(writer);
        wtr.write_record(self.header())?;
        for i in order {
            let score = &self.scores[i];
            let mut record: Vec<String> = self.table.rows()[i].clone();
            record.push(score.prediction.as_u8().to_string());
            record.push(score.threat_probability.to_string());
            record.push(score.threat_score.to_string());
            wtr.write_record(&record)?;
        }
        wtr.flush()?;
        Ok(())
    }
}

fn create_file(path: &Path) -> Result<std::fs::File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    Ok(std::fs::File::create(path)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::feature_names;
    use crate::generator::{DatasetGenerator, GeneratorProfile};
    use crate::model::{ForestParams, RandomForest, StandardScaler};

    fn pair() -> ArtifactPair {
        let data = DatasetGenerator::new(GeneratorProfile::compact().with_counts(30, 0))
            .with_seed(1)
            .generate()
            .unwrap();
        let x = data.features();
        let scaler = StandardScaler::fit(feature_names(), x.view()).unwrap();
        let scaled = scaler.transform(&FEATURE_NAMES, x.view()).unwrap();
        let params = ForestParams {
            n_estimators: 5,
            ..ForestParams::default()
        };
        let forest = RandomForest::fit(scaled.view(), &data.labels(), params).unwrap();
        ArtifactPair::new(scaler, forest)
    }

    fn input() -> ObservationTable {
        let csv = "name,file_access_count,cpu_usage,memory_usage,network_packets,network_ports,privilege_escalation_attempt,file_entropy\n\
                   a,2,10.0,120.0,20,0,0,1.0\n\
                   b,90,92.0,1900.0,900,4,1,7.5\n";
        ObservationTable::from_reader(csv.as_bytes()).unwrap()
    }

    #[test]
    fn scores_carry_passthrough_columns() {
        let artifacts = pair();
        let scored = Scorer::new(&artifacts).score_table(input()).unwrap();
        assert_eq!(scored.len(), 2);
        assert_eq!(scored.cell(1, "name"), Some("b"));
        assert_eq!(scored.cell(0, "missing"), None);
        assert_eq!(
            &scored.header()[8..],
            &[PREDICTION_COLUMN, PROBABILITY_COLUMN, THREAT_SCORE_COLUMN]
        );
        assert_eq!(scored.ranked(), vec![1, 0]);
        assert_eq!(scored.suspicious_count() + scored.normal_count(), 2);
        assert_eq!(scored.scores()[1].prediction, Label::Suspicious);
    }

    #[test]
    fn csv_output_appends_score_columns() {
        let artifacts = pair();
        let scored = Scorer::new(&artifacts).score_table(input()).unwrap();
        let mut buf = Vec::new();
        scored.to_writer(&mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let mut lines = text.lines();
        assert!(lines
            .next()
            .unwrap()
            .ends_with("file_entropy,prediction,threat_probability,threat_score"));
        assert!(lines.next().unwrap().starts_with("a,2,10.0,120.0,"));
    }

    #[test]
    fn empty_batch_scores_nothing() {
        let artifacts = pair();
        let table = ObservationTable::from_observations(&[]);
        let scored = Scorer::new(&artifacts).score_table(table).unwrap();
        assert!(scored.is_empty());
    }
}
