//! Live observation collection: an OS metrics source plus a mapping layer that turns
//! raw per-process counters into schema observations.
//!
//! Both halves sit behind traits so a real file/network accounting source can
//! replace the sysinfo counters and the heuristic proxies without touching scoring.

mod mapper;
mod process;

pub use mapper::{
    HeuristicMapper, ESCALATION_MEMORY_MB, FILE_ACCESS_PER_THREAD, PACKETS_PER_CPU_PERCENT,
    PORT_CPU_THRESHOLD,
};
pub use process::SysinfoSource;

use crate::features::{Observation, ObservationTable, FEATURE_NAMES};
use chrono::{DateTime, Local};
use thiserror::Error;
use tracing::debug;

/// Raw counters for one process; `None` where the OS would not tell us.
#[derive(Debug, Clone, PartialEq)]
pub struct RawProcessMetrics {
    pub pid: u32,
    pub name: Option<String>,
    pub cpu_percent: Option<f32>,
    pub memory_bytes: Option<u64>,
    pub thread_count: Option<u32>,
}

/// A single process could not be observed. The row is skipped, the batch goes on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CollectError {
    #[error("process {pid}: {metric} unavailable")]
    MetricUnavailable { pid: u32, metric: &'static str },

    #[error("process {pid} exited during sampling")]
    Vanished { pid: u32 },
}

/// Per-process OS counters.
pub trait MetricsSource {
    fn poll(&mut self) -> Vec<Result<RawProcessMetrics, CollectError>>;
}

/// Raw counters to a schema observation.
pub trait ObservationMapper {
    fn map(&mut self, raw: &RawProcessMetrics) -> Result<Observation, CollectError>;
}

/// One scored-to-be row from the live system.
#[derive(Debug, Clone, PartialEq)]
pub struct LiveObservation {
    pub process_name: String,
    pub pid: u32,
    pub timestamp: DateTime<Local>,
    pub observation: Observation,
}

pub const PROCESS_NAME_COLUMN: &str = "process_name";
pub const PID_COLUMN: &str = "pid";
pub const TIMESTAMP_COLUMN: &str = "timestamp";

pub struct LiveCollector<S, M> {
    source: S,
    mapper: M,
    excluded_pid: u32,
}

impl<S: MetricsSource, M: ObservationMapper> LiveCollector<S, M> {
    /// Excludes the current process from every collection.
    pub fn new(source: S, mapper: M) -> Self {
        Self {
            source,
            mapper,
            excluded_pid: std::process::id(),
        }
    }

    pub fn with_excluded_pid(mut self, pid: u32) -> Self {
        self.excluded_pid = pid;
        self
    }

    pub fn collect(&mut self) -> Vec<LiveObservation> {
        let timestamp = Local::now();
        let mut out = Vec::new();
        let mut skipped = 0usize;

        for polled in self.source.poll() {
            let raw = match polled {
                Ok(raw) => raw,
                Err(e) => {
                    debug!(error = %e, "skipping process");
                    skipped += 1;
                    continue;
                }
            };
            if raw.pid == self.excluded_pid {
                continue;
            }
            match self.mapper.map(&raw) {
                Ok(observation) => out.push(LiveObservation {
                    process_name: raw.name.clone().unwrap_or_else(|| "Unknown".to_string()),
                    pid: raw.pid,
                    timestamp,
                    observation,
                }),
                Err(e) => {
                    debug!(error = %e, "skipping process");
                    skipped += 1;
                }
            }
        }

        debug!(collected = out.len(), skipped, "live collection");
        out
    }
}

/// `process_name, pid, <features>, timestamp`; only the feature columns are scored.
pub fn live_table(records: &[LiveObservation]) -> ObservationTable {
    let mut columns = vec![PROCESS_NAME_COLUMN.to_string(), PID_COLUMN.to_string()];
    columns.extend(FEATURE_NAMES.iter().map(|s| s.to_string()));
    columns.push(TIMESTAMP_COLUMN.to_string());

    let rows = records
        .iter()
        .map(|r| {
            let mut row = vec![r.process_name.clone(), r.pid.to_string()];
            row.extend(r.observation.to_record());
            row.push(r.timestamp.format("%H:%M:%S").to_string());
            row
        })
        .collect();
    ObservationTable::new(columns, rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedSource(Vec<Result<RawProcessMetrics, CollectError>>);

    impl MetricsSource for FixedSource {
        fn poll(&mut self) -> Vec<Result<RawProcessMetrics, CollectError>> {
            self.0.clone()
        }
    }

    fn raw(pid: u32, cpu: Option<f32>) -> RawProcessMetrics {
        RawProcessMetrics {
            pid,
            name: Some(format!("proc_{}", pid)),
            cpu_percent: cpu,
            memory_bytes: Some(64 * 1024 * 1024),
            thread_count: Some(3),
        }
    }

    #[test]
    fn unreadable_rows_and_own_pid_are_skipped() {
        let source = FixedSource(vec![
            Ok(raw(10, Some(5.0))),
            Err(CollectError::Vanished { pid: 11 }),
            Ok(raw(12, None)),
            Ok(raw(99, Some(1.0))),
            Ok(raw(13, Some(30.0))),
        ]);
        let mut collector =
            LiveCollector::new(source, HeuristicMapper::seeded(1)).with_excluded_pid(99);
        let rows = collector.collect();
        let pids: Vec<u32> = rows.iter().map(|r| r.pid).collect();
        assert_eq!(pids, vec![10, 13]);
        assert_eq!(rows[0].process_name, "proc_10");
    }

    #[test]
    fn live_table_keeps_feature_order() {
        let source = FixedSource(vec![Ok(raw(10, Some(5.0)))]);
        let mut collector = LiveCollector::new(source, HeuristicMapper::seeded(1)).with_excluded_pid(0);
        let table = live_table(&collector.collect());
        assert_eq!(table.feature_columns(), FEATURE_NAMES.to_vec());
        assert_eq!(table.columns()[0], PROCESS_NAME_COLUMN);
        assert_eq!(table.observations().unwrap().len(), 1);
    }
}
