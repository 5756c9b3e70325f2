//! procwatch: behavioral process classifier.
//!
//! Modular structure:
//! - [`features`]: 7-feature observation schema and CSV tables
//! - [`generator`]: synthetic labeled data with deliberate class overlap
//! - [`training`]: reproducible split, scaler + random forest fit, held-out metrics
//! - [`model`]: scaler, forest and the persisted artifact pair
//! - [`scoring`]: prediction, threat probability, batch-relative threat score
//! - [`collectors`]: live per-process metrics and heuristic feature mapping
//! - [`risk`]: probability bands for reporting
//! - [`monitor`]: collect → score → report cycle
//! - [`logging`]: structured logging

pub mod collectors;
pub mod config;
pub mod error;
pub mod features;
pub mod generator;
pub mod logging;
pub mod model;
pub mod monitor;
pub mod risk;
pub mod scoring;
pub mod training;

pub use collectors::{HeuristicMapper, LiveCollector, LiveObservation, SysinfoSource};
pub use config::AppConfig;
pub use error::{ProcwatchError, Result};
pub use features::{Label, LabeledDataset, Observation, ObservationTable};
pub use generator::{DatasetGenerator, GeneratorProfile};
pub use logging::StructuredLogger;
pub use model::ArtifactPair;
pub use risk::RiskEngine;
pub use scoring::{ScoredTable, Scorer};
pub use training::{EvaluationReport, Trainer};
