//! Application configuration. JSON on disk, every section optional.

use crate::generator::{ProfileName, DEFAULT_BORDERLINE_PER_CLASS, DEFAULT_SAMPLES_PER_CLASS};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const CONFIG_ENV_VAR: &str = "PROCWATCH_CONFIG";
const LOCAL_CONFIG_FILE: &str = "procwatch.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Generated datasets, prediction output, monitor snapshots
    pub data_dir: PathBuf,
    /// Scaler + classifier pair
    pub artifacts_dir: PathBuf,
    pub generator: GeneratorConfig,
    pub trainer: TrainerConfig,
    pub monitor: MonitorConfig,
    /// Probability bands for reporting
    pub risk: RiskConfig,
    pub log: LogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub profile: ProfileName,
    pub samples_per_class: usize,
    pub borderline_per_class: usize,
    /// None = OS entropy (a fresh dataset every run)
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainerConfig {
    /// Held-out share, rounded up
    pub test_fraction: f64,
    /// Seeds the split and the forest
    pub seed: u64,
    pub n_estimators: usize,
    /// None = grow until leaves are pure
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Poll interval (seconds); 0 = single cycle
    pub interval_secs: u64,
    /// Pause between the priming and sampling passes, lets CPU% settle
    pub prime_pause_ms: u64,
    /// Write a CSV snapshot of every scored cycle to `data_dir`
    pub export_snapshots: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskConfig {
    /// Probability at or above this is high risk (0.0–1.0)
    pub high_threshold: f64,
    /// Probability at or above this is medium risk
    pub medium_threshold: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
    pub json: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            artifacts_dir: PathBuf::from("models"),
            generator: GeneratorConfig::default(),
            trainer: TrainerConfig::default(),
            monitor: MonitorConfig::default(),
            risk: RiskConfig::default(),
            log: LogConfig::default(),
        }
    }
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            profile: ProfileName::Realistic,
            samples_per_class: DEFAULT_SAMPLES_PER_CLASS,
            borderline_per_class: DEFAULT_BORDERLINE_PER_CLASS,
            seed: None,
        }
    }
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            test_fraction: 0.25,
            seed: 42,
            n_estimators: 200,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
        }
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            interval_secs: 5,
            prime_pause_ms: 200,
            export_snapshots: false,
        }
    }
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            high_threshold: 0.8,
            medium_threshold: 0.5,
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl AppConfig {
    /// Load from JSON file if present and valid; otherwise return default
    pub fn load(path: &Path) -> Self {
        if path.exists() {
            if let Ok(data) = std::fs::read_to_string(path) {
                if let Ok(c) = serde_json::from_str::<AppConfig>(&data) {
                    return c;
                }
            }
        }
        Self::default()
    }

    /// `$PROCWATCH_CONFIG`, then `./procwatch.json`, then `<config dir>/procwatch/config.json`.
    pub fn default_path() -> PathBuf {
        if let Ok(p) = std::env::var(CONFIG_ENV_VAR) {
            return PathBuf::from(p);
        }
        let local = PathBuf::from(LOCAL_CONFIG_FILE);
        if local.exists() {
            return local;
        }
        dirs::config_dir()
            .map(|d| d.join("procwatch").join("config.json"))
            .unwrap_or(local)
    }

    pub fn dataset_path(&self) -> PathBuf {
        self.data_dir.join("generated_behavior.csv")
    }

    pub fn predictions_path(&self) -> PathBuf {
        self.data_dir.join("predicted_logs.csv")
    }
}
