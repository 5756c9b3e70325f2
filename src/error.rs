use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by the classification pipeline.
#[derive(Debug, Error)]
pub enum ProcwatchError {
    #[error("schema mismatch: expected feature columns {expected:?}, found {found:?}")]
    SchemaMismatch {
        expected: Vec<String>,
        found: Vec<String>,
    },

    #[error("missing artifact {path}: {reason} (train the model first: `procwatch train`)")]
    MissingArtifact { path: PathBuf, reason: String },

    #[error("artifact pair mismatch: scaler {scaler} does not belong with classifier {classifier}")]
    ArtifactMismatch { scaler: String, classifier: String },

    #[error("invalid value {value:?} in column {column} at row {row}")]
    InvalidValue {
        row: usize,
        column: String,
        value: String,
    },

    #[error("invalid label {value:?} at row {row} (expected 0 or 1)")]
    InvalidLabel { row: usize, value: String },

    #[error("empty dataset: {0}")]
    EmptyDataset(String),

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ProcwatchError>;

impl ProcwatchError {
    pub fn schema_mismatch<E, F>(expected: &[E], found: &[F]) -> Self
    where
        E: AsRef<str>,
        F: AsRef<str>,
    {
        Self::SchemaMismatch {
            expected: expected.iter().map(|s| s.as_ref().to_string()).collect(),
            found: found.iter().map(|s| s.as_ref().to_string()).collect(),
        }
    }

    pub fn missing_artifact<P: Into<PathBuf>, S: Into<String>>(path: P, reason: S) -> Self {
        Self::MissingArtifact {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn invalid_value<C: Into<String>, V: Into<String>>(row: usize, column: C, value: V) -> Self {
        Self::InvalidValue {
            row,
            column: column.into(),
            value: value.into(),
        }
    }

    /// True for errors caused by a feature layout disagreement.
    pub fn is_schema_mismatch(&self) -> bool {
        matches!(self, Self::SchemaMismatch { .. })
    }
}
