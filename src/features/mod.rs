//! Feature schema: the fixed 7-dimensional observation vector and its label.
//!
//! The order of [`FEATURE_NAMES`] is the column order the scaler and classifier
//! were fit on. Changing it (or any name) requires retraining; persisted
//! artifacts carry [`schema_fingerprint`] and refuse to load against another layout.

mod table;

pub use table::{LabeledDataset, ObservationTable};
pub(crate) use table::observation_matrix;

use crate::error::{ProcwatchError, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Bump whenever [`FEATURE_NAMES`] changes.
pub const FEATURE_SCHEMA_VERSION: u8 = 1;

pub const FEATURE_COUNT: usize = 7;

/// Feature names in vector order.
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "file_access_count",
    "cpu_usage",
    "memory_usage",
    "network_packets",
    "network_ports",
    "privilege_escalation_attempt",
    "file_entropy",
];

pub const LABEL_COLUMN: &str = "label";

pub const MAX_CPU_PERCENT: f64 = 100.0;
/// Upper bound of the byte-entropy proxy (bits per byte)
pub const MAX_ENTROPY: f64 = 8.0;

/// SHA-256 over the schema version and the ordered feature names.
pub fn schema_fingerprint() -> String {
    let mut h = Sha256::new();
    h.update([FEATURE_SCHEMA_VERSION]);
    for name in FEATURE_NAMES {
        h.update(name.as_bytes());
        h.update([0u8]);
    }
    format!("{:x}", h.finalize())
}

/// Owned copy of [`FEATURE_NAMES`], as stored in the fitted scaler.
pub fn feature_names() -> Vec<String> {
    FEATURE_NAMES.iter().map(|s| s.to_string()).collect()
}

/// Exact, ordered comparison of column names. Never reorders.
pub fn check_columns<E, F>(expected: &[E], found: &[F]) -> Result<()>
where
    E: AsRef<str>,
    F: AsRef<str>,
{
    let same = expected.len() == found.len()
        && expected
            .iter()
            .zip(found)
            .all(|(e, f)| e.as_ref() == f.as_ref());
    if same {
        Ok(())
    } else {
        Err(ProcwatchError::schema_mismatch(expected, found))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Label {
    Normal,
    Suspicious,
}

impl Label {
    pub fn as_u8(self) -> u8 {
        match self {
            Label::Normal => 0,
            Label::Suspicious => 1,
        }
    }

    pub fn is_suspicious(self) -> bool {
        self == Label::Suspicious
    }
}

impl TryFrom<u8> for Label {
    type Error = u8;

    fn try_from(v: u8) -> std::result::Result<Self, u8> {
        match v {
            0 => Ok(Label::Normal),
            1 => Ok(Label::Suspicious),
            other => Err(other),
        }
    }
}

/// One process snapshot in schema order.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Observation {
    pub file_access_count: u32,
    /// Percent, 0..=100
    pub cpu_usage: f64,
    /// Resident memory in MB
    pub memory_usage: f64,
    pub network_packets: u32,
    pub network_ports: u32,
    /// 0, 1, occasionally 2
    pub privilege_escalation_attempt: u8,
    /// Shannon-entropy proxy, 0..=8
    pub file_entropy: f64,
}

impl Observation {
    pub fn to_vector(&self) -> [f64; FEATURE_COUNT] {
        [
            self.file_access_count as f64,
            self.cpu_usage,
            self.memory_usage,
            self.network_packets as f64,
            self.network_ports as f64,
            self.privilege_escalation_attempt as f64,
            self.file_entropy,
        ]
    }

    /// Inverse of [`Observation::to_vector`]; count fields are rounded.
    pub fn from_vector(v: &[f64; FEATURE_COUNT]) -> Self {
        Self {
            file_access_count: v[0].max(0.0).round() as u32,
            cpu_usage: v[1].clamp(0.0, MAX_CPU_PERCENT),
            memory_usage: v[2].max(0.0),
            network_packets: v[3].max(0.0).round() as u32,
            network_ports: v[4].max(0.0).round() as u32,
            privilege_escalation_attempt: v[5].max(0.0).round() as u8,
            file_entropy: v[6],
        }
    }

    /// CSV cells in schema order.
    pub fn to_record(&self) -> [String; FEATURE_COUNT] {
        [
            self.file_access_count.to_string(),
            self.cpu_usage.to_string(),
            self.memory_usage.to_string(),
            self.network_packets.to_string(),
            self.network_ports.to_string(),
            self.privilege_escalation_attempt.to_string(),
            self.file_entropy.to_string(),
        ]
    }

    /// Parse cells given in schema order. `row` is only used for error reporting.
    ///
    /// cpu_usage is clamped to [0, 100]; negative memory or entropy outside [0, 8]
    /// is an `InvalidValue`.
    pub fn parse_record(row: usize, cells: &[&str; FEATURE_COUNT]) -> Result<Self> {
        let memory_usage = parse_float(row, 2, cells[2])?;
        if memory_usage < 0.0 {
            return Err(ProcwatchError::invalid_value(row, FEATURE_NAMES[2], cells[2]));
        }
        let file_entropy = parse_float(row, 6, cells[6])?;
        if !(0.0..=MAX_ENTROPY).contains(&file_entropy) {
            return Err(ProcwatchError::invalid_value(row, FEATURE_NAMES[6], cells[6]));
        }
        Ok(Self {
            file_access_count: parse_count(row, 0, cells[0])?,
            cpu_usage: parse_float(row, 1, cells[1])?.clamp(0.0, MAX_CPU_PERCENT),
            memory_usage,
            network_packets: parse_count(row, 3, cells[3])?,
            network_ports: parse_count(row, 4, cells[4])?,
            privilege_escalation_attempt: parse_count(row, 5, cells[5])?
                .try_into()
                .map_err(|_| ProcwatchError::invalid_value(row, FEATURE_NAMES[5], cells[5]))?,
            file_entropy,
        })
    }
}

fn parse_float(row: usize, col: usize, cell: &str) -> Result<f64> {
    match cell.trim().parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(ProcwatchError::invalid_value(row, FEATURE_NAMES[col], cell)),
    }
}

// Accepts "12" as well as "12.0" (pandas writes integral floats that way).
fn parse_count(row: usize, col: usize, cell: &str) -> Result<u32> {
    let trimmed = cell.trim();
    if let Ok(v) = trimmed.parse::<u32>() {
        return Ok(v);
    }
    match trimmed.parse::<f64>() {
        Ok(v) if v >= 0.0 && v.fract() == 0.0 && v <= u32::MAX as f64 => Ok(v as u32),
        _ => Err(ProcwatchError::invalid_value(row, FEATURE_NAMES[col], cell)),
    }
}

/// Training row: an observation plus its ground-truth label.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LabeledObservation {
    pub observation: Observation,
    pub label: Label,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fingerprint_is_stable_hex() {
        let a = schema_fingerprint();
        assert_eq!(a, schema_fingerprint());
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn permuted_columns_rejected() {
        let mut found = feature_names();
        found.swap(1, 2);
        let err = check_columns(&FEATURE_NAMES, &found).unwrap_err();
        assert!(err.is_schema_mismatch());
        assert!(check_columns(&FEATURE_NAMES, &feature_names()).is_ok());
    }

    #[test]
    fn counts_accept_integral_floats() {
        let cells = ["3.0", "12.5", "300", "40", "1", "2", "4.25"];
        let obs = Observation::parse_record(0, &cells).unwrap();
        assert_eq!(obs.file_access_count, 3);
        assert_eq!(obs.privilege_escalation_attempt, 2);
        assert_eq!(obs.to_vector()[6], 4.25);

        let bad = ["3.5", "12.5", "300", "40", "1", "2", "4.25"];
        assert!(Observation::parse_record(0, &bad).is_err());
    }

    #[test]
    fn cpu_is_clamped_on_parse() {
        let hot = ["1", "250.0", "40.0", "0", "0", "0", "1.0"];
        assert_eq!(Observation::parse_record(0, &hot).unwrap().cpu_usage, 100.0);
        let cold = ["1", "-3", "40.0", "0", "0", "0", "1.0"];
        assert_eq!(Observation::parse_record(0, &cold).unwrap().cpu_usage, 0.0);
    }

    #[test]
    fn out_of_range_memory_and_entropy_rejected() {
        let negative_memory = ["1", "10.0", "-40.0", "0", "0", "0", "1.0"];
        assert!(matches!(
            Observation::parse_record(4, &negative_memory),
            Err(ProcwatchError::InvalidValue { row: 4, ref column, .. }) if column == "memory_usage"
        ));
        let high_entropy = ["1", "10.0", "40.0", "0", "0", "0", "11.5"];
        assert!(matches!(
            Observation::parse_record(0, &high_entropy),
            Err(ProcwatchError::InvalidValue { ref column, .. }) if column == "file_entropy"
        ));
        let edge = ["1", "10.0", "0", "0", "0", "0", "8"];
        assert!(Observation::parse_record(0, &edge).is_ok());
    }
}
