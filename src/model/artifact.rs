//! Persisted (scaler, classifier) pair.
//!
//! Two JSON files in one directory, written together and marked read-only. Each
//! carries the pair id and the feature schema fingerprint; a lone file, a file from
//! another pair, or a pair fit on another schema refuses to load.

use super::{RandomForest, StandardScaler};
use crate::error::{ProcwatchError, Result};
use crate::features::{feature_names, schema_fingerprint, FEATURE_SCHEMA_VERSION};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;
use uuid::Uuid;

pub const SCALER_FILE: &str = "scaler.json";
pub const CLASSIFIER_FILE: &str = "classifier.json";

const SCALER_KIND: &str = "standard_scaler";
const CLASSIFIER_KIND: &str = "random_forest";

#[derive(Serialize, Deserialize)]
struct Envelope<T> {
    artifact_id: String,
    kind: String,
    schema_version: u8,
    schema_fingerprint: String,
    created_at: DateTime<Utc>,
    state: T,
}

/// Immutable handle to a trained pair; pass it to [`crate::scoring::Scorer`].
#[derive(Debug, Clone, PartialEq)]
pub struct ArtifactPair {
    id: String,
    created_at: DateTime<Utc>,
    scaler: StandardScaler,
    classifier: RandomForest,
}

impl ArtifactPair {
    pub fn new(scaler: StandardScaler, classifier: RandomForest) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            created_at: Utc::now(),
            scaler,
            classifier,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn scaler(&self) -> &StandardScaler {
        &self.scaler
    }

    pub fn classifier(&self) -> &RandomForest {
        &self.classifier
    }

    pub fn scaler_path(dir: &Path) -> PathBuf {
        dir.join(SCALER_FILE)
    }

    pub fn classifier_path(dir: &Path) -> PathBuf {
        dir.join(CLASSIFIER_FILE)
    }

    /// Both files present (not validated).
    pub fn exists(dir: &Path) -> bool {
        Self::scaler_path(dir).exists() && Self::classifier_path(dir).exists()
    }

    /// Write both files, replacing any previous pair, then mark them read-only.
    pub fn save(&self, dir: &Path) -> Result<()> {
        std::fs::create_dir_all(dir)?;
        self.write_envelope(&Self::scaler_path(dir), SCALER_KIND, &self.scaler)?;
        self.write_envelope(&Self::classifier_path(dir), CLASSIFIER_KIND, &self.classifier)?;
        info!(dir = %dir.display(), artifact_id = %self.id, "artifacts saved");
        Ok(())
    }

    fn write_envelope<T: Serialize>(&self, path: &Path, kind: &str, state: &T) -> Result<()> {
        let envelope = Envelope {
            artifact_id: self.id.clone(),
            kind: kind.to_string(),
            schema_version: FEATURE_SCHEMA_VERSION,
            schema_fingerprint: schema_fingerprint(),
            created_at: self.created_at,
            state,
        };
        let bytes = serde_json::to_vec(&envelope)?;
        // Previous pair is read-only; replace rather than overwrite in place.
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        std::fs::write(path, bytes)?;
        let mut perms = std::fs::metadata(path)?.permissions();
        perms.set_readonly(true);
        std::fs::set_permissions(path, perms)?;
        Ok(())
    }

    /// Load a matched pair. Missing or unreadable files are `MissingArtifact`.
    pub fn load(dir: &Path) -> Result<Self> {
        let scaler: Envelope<StandardScaler> = read_envelope(&Self::scaler_path(dir), SCALER_KIND)?;
        let classifier: Envelope<RandomForest> =
            read_envelope(&Self::classifier_path(dir), CLASSIFIER_KIND)?;

        classifier.state.check_structure().map_err(|reason| {
            ProcwatchError::missing_artifact(
                Self::classifier_path(dir),
                format!("corrupt: {}", reason),
            )
        })?;

        if scaler.artifact_id != classifier.artifact_id {
            return Err(ProcwatchError::ArtifactMismatch {
                scaler: scaler.artifact_id,
                classifier: classifier.artifact_id,
            });
        }
        let expected = schema_fingerprint();
        if scaler.schema_fingerprint != expected {
            return Err(ProcwatchError::schema_mismatch(
                &feature_names(),
                scaler.state.feature_names(),
            ));
        }
        if classifier.schema_fingerprint != expected {
            return Err(ProcwatchError::schema_mismatch(
                &[format!("schema fingerprint {}", expected)],
                &[format!("schema fingerprint {}", classifier.schema_fingerprint)],
            ));
        }
        if classifier.state.n_features() != scaler.state.feature_names().len() {
            return Err(ProcwatchError::schema_mismatch(
                scaler.state.feature_names(),
                &[format!("{} classifier features", classifier.state.n_features())],
            ));
        }

        info!(
            dir = %dir.display(),
            artifact_id = %scaler.artifact_id,
            trees = classifier.state.n_trees(),
            "artifacts loaded"
        );
        Ok(Self {
            id: scaler.artifact_id,
            created_at: scaler.created_at,
            scaler: scaler.state,
            classifier: classifier.state,
        })
    }
}

fn read_envelope<T: DeserializeOwned>(path: &Path, kind: &str) -> Result<Envelope<T>> {
    if !path.exists() {
        return Err(ProcwatchError::missing_artifact(path, "file not found"));
    }
    let data = std::fs::read(path)
        .map_err(|e| ProcwatchError::missing_artifact(path, format!("unreadable: {}", e)))?;
    let envelope: Envelope<T> = serde_json::from_slice(&data)
        .map_err(|e| ProcwatchError::missing_artifact(path, format!("corrupt: {}", e)))?;
    if envelope.kind != kind {
        return Err(ProcwatchError::missing_artifact(
            path,
            format!("expected {} artifact, found {}", kind, envelope.kind),
        ));
    }
    Ok(envelope)
}
