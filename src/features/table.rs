//! CSV tables: labeled training data and unlabeled scoring input with pass-through columns.

use super::{
    check_columns, Label, LabeledObservation, Observation, FEATURE_COUNT, FEATURE_NAMES,
    LABEL_COLUMN,
};
use crate::error::{ProcwatchError, Result};
use ndarray::Array2;
use std::io::{Read, Write};
use std::path::Path;

/// Labeled observations in schema order, as produced by the generator and read by the trainer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LabeledDataset {
    pub rows: Vec<LabeledObservation>,
}

impl LabeledDataset {
    pub fn new(rows: Vec<LabeledObservation>) -> Self {
        Self { rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn count(&self, label: Label) -> usize {
        self.rows.iter().filter(|r| r.label == label).count()
    }

    /// Header: the 7 feature names followed by `label`.
    pub fn header() -> Vec<&'static str> {
        let mut h = FEATURE_NAMES.to_vec();
        h.push(LABEL_COLUMN);
        h
    }

    pub fn observations(&self) -> Vec<Observation> {
        self.rows.iter().map(|r| r.observation).collect()
    }

    pub fn labels(&self) -> Vec<Label> {
        self.rows.iter().map(|r| r.label).collect()
    }

    /// `[n, FEATURE_COUNT]` matrix of raw feature values.
    pub fn features(&self) -> Array2<f64> {
        observation_matrix(self.rows.iter().map(|r| &r.observation))
    }

    /// The feature columns only, label dropped; suitable as scoring input.
    pub fn to_observation_table(&self) -> ObservationTable {
        ObservationTable::from_observations(&self.observations())
    }

    pub fn read_csv(path: &Path) -> Result<Self> {
        let f = std::fs::File::open(path)?;
        Self::from_reader(f)
    }

    /// Header must be exactly the feature names in order plus `label`.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut rdr = csv::Reader::from_reader(reader);
        let headers: Vec<String> = rdr.headers()?.iter().map(|s| s.trim().to_string()).collect();
        check_columns(&Self::header(), &headers)?;

        let mut rows = Vec::new();
        for (idx, result) in rdr.records().enumerate() {
            let record = result?;
            let mut cells = [""; FEATURE_COUNT];
            for (i, cell) in cells.iter_mut().enumerate() {
                *cell = record.get(i).unwrap_or("");
            }
            let observation = Observation::parse_record(idx, &cells)?;
            let raw_label = record.get(FEATURE_COUNT).unwrap_or("").trim();
            let label = parse_label(raw_label)
                .ok_or_else(|| ProcwatchError::InvalidLabel {
                    row: idx,
                    value: raw_label.to_string(),
                })?;
            rows.push(LabeledObservation { observation, label });
        }
        Ok(Self { rows })
    }

    pub fn write_csv(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let f = std::fs::File::create(path)?;
        self.to_writer(f)
    }

    pub fn to_writer<W: Write>(&self, writer: W) -> Result<()> {
        let mut wtr = csv::Writer::from_writer(writer);
        wtr.write_record(Self::header())?;
        for row in &self.rows {
            let mut record: Vec<String> = row.observation.to_record().to_vec();
            record.push(row.label.as_u8().to_string());
            wtr.write_record(&record)?;
        }
        wtr.flush()?;
        Ok(())
    }
}

fn parse_label(raw: &str) -> Option<Label> {
    let v: u8 = match raw.parse::<u8>() {
        Ok(v) => v,
        Err(_) => match raw.parse::<f64>() {
            Ok(f) if f == 0.0 || f == 1.0 => f as u8,
            _ => return None,
        },
    };
    Label::try_from(v).ok()
}

pub(crate) fn observation_matrix<'a, I>(observations: I) -> Array2<f64>
where
    I: IntoIterator<Item = &'a Observation>,
{
    let flat: Vec<f64> = observations
        .into_iter()
        .flat_map(|o| o.to_vector())
        .collect();
    let n = flat.len() / FEATURE_COUNT;
    // Length is a multiple of FEATURE_COUNT by construction.
    Array2::from_shape_vec((n, FEATURE_COUNT), flat).unwrap_or_else(|_| Array2::zeros((0, FEATURE_COUNT)))
}

/// Unlabeled scoring input. Columns outside the feature schema (process name, pid,
/// timestamp, a stray `label`) are kept verbatim and never reach the scaler.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObservationTable {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl ObservationTable {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { columns, rows }
    }

    /// Table holding exactly the feature columns.
    pub fn from_observations(observations: &[Observation]) -> Self {
        let columns = super::feature_names();
        let rows = observations
            .iter()
            .map(|o| o.to_record().to_vec())
            .collect();
        Self { columns, rows }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Columns that name a feature, in the order they appear in this table.
    pub fn feature_columns(&self) -> Vec<&str> {
        self.columns
            .iter()
            .map(String::as_str)
            .filter(|c| FEATURE_NAMES.contains(c))
            .collect()
    }

    /// Parse every row into an [`Observation`]. Fails with `SchemaMismatch` unless the
    /// feature columns appear exactly once each, in schema order.
    pub fn observations(&self) -> Result<Vec<Observation>> {
        check_columns(&FEATURE_NAMES, &self.feature_columns())?;
        let mut positions = [0usize; FEATURE_COUNT];
        for (slot, name) in positions.iter_mut().zip(FEATURE_NAMES) {
            *slot = self
                .columns
                .iter()
                .position(|c| c == name)
                .ok_or_else(|| ProcwatchError::schema_mismatch(&FEATURE_NAMES, &self.feature_columns()))?;
        }

        self.rows
            .iter()
            .enumerate()
            .map(|(idx, row)| {
                let mut cells = [""; FEATURE_COUNT];
                for (cell, &pos) in cells.iter_mut().zip(&positions) {
                    *cell = row.get(pos).map(String::as_str).unwrap_or("");
                }
                Observation::parse_record(idx, &cells)
            })
            .collect()
    }

    pub fn read_csv(path: &Path) -> Result<Self> {
        let f = std::fs::File::open(path)?;
        Self::from_reader(f)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut rdr = csv::Reader::from_reader(reader);
        let columns: Vec<String> = rdr.headers()?.iter().map(|s| s.trim().to_string()).collect();
        let mut rows = Vec::new();
        for result in rdr.records() {
            let record = result?;
            rows.push(record.iter().map(String::from).collect());
        }
        Ok(Self { columns, rows })
    }

    /// Append a column; `values` must have one entry per row.
    pub fn push_column(&mut self, name: impl Into<String>, values: Vec<String>) {
        self.columns.push(name.into());
        for (row, v) in self.rows.iter_mut().zip(values) {
            row.push(v);
        }
    }
}
