//! Live monitoring: collect, score, report. One cycle per poll interval.

use crate::collectors::{live_table, LiveCollector, MetricsSource, ObservationMapper};
use crate::error::Result;
use crate::risk::{RiskEngine, RiskLevel};
use crate::scoring::{ScoredTable, Scorer};
use chrono::Local;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Summary of one monitoring cycle.
#[derive(Debug, Clone)]
pub struct CycleReport {
    pub total: usize,
    pub normal: usize,
    pub suspicious: usize,
    pub high_risk: usize,
    pub snapshot: Option<PathBuf>,
    pub scored: ScoredTable,
}

pub fn snapshot_file_name() -> String {
    format!("threat_snapshot_{}.csv", Local::now().format("%Y%m%d_%H%M%S"))
}

/// Collect one batch from the live system, score it and log the outcome. With
/// `export_dir`, the ranked batch is also written there as CSV.
pub fn run_one_cycle<S, M>(
    collector: &mut LiveCollector<S, M>,
    scorer: &Scorer<'_>,
    risk: &RiskEngine,
    export_dir: Option<&Path>,
) -> Result<CycleReport>
where
    S: MetricsSource,
    M: ObservationMapper,
{
    let records = collector.collect();
    if records.is_empty() {
        warn!("no processes collected; check permissions");
    }
    let scored = scorer.score_table(live_table(&records))?;

    let suspicious = scored.suspicious_count();
    info!(
        total = scored.len(),
        normal = scored.normal_count(),
        suspicious,
        "cycle scored"
    );
    if suspicious > 0 {
        warn!(suspicious, "suspicious processes detected");
    }

    let elevated = risk.elevated(scored.scores(), RiskLevel::High);
    for r in &elevated {
        let rec = &records[r.row];
        warn!(
            process = %rec.process_name,
            pid = rec.pid,
            probability = r.probability,
            threat_score = r.threat_score,
            level = r.level.as_str(),
            "high risk process"
        );
    }

    let snapshot = match export_dir {
        Some(dir) => {
            let path = dir.join(snapshot_file_name());
            scored.write_ranked_csv(&path)?;
            info!(path = %path.display(), "snapshot exported");
            Some(path)
        }
        None => None,
    };

    Ok(CycleReport {
        total: scored.len(),
        normal: scored.normal_count(),
        suspicious,
        high_risk: elevated.len(),
        snapshot,
        scored,
    })
}
