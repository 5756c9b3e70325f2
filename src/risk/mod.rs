//! Probability bands for reporting scored processes.

mod engine;

pub use engine::{RiskEngine, RiskLevel, RiskResult};
