//! Heuristic proxies for signals the OS counters do not expose.
//!
//! File access, packet counts, ports, and escalation are derived from threads, CPU
//! and memory; entropy is drawn uniformly. Values stay inside the schema ranges.

use super::{CollectError, ObservationMapper, RawProcessMetrics};
use crate::features::{Observation, MAX_CPU_PERCENT, MAX_ENTROPY};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub const FILE_ACCESS_PER_THREAD: u32 = 2;
pub const PACKETS_PER_CPU_PERCENT: f64 = 5.0;
/// CPU% above which the process is assumed to hold a port open
pub const PORT_CPU_THRESHOLD: f64 = 20.0;
/// Resident MB above which an escalation signal is raised
pub const ESCALATION_MEMORY_MB: f64 = 500.0;

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

pub struct HeuristicMapper {
    rng: StdRng,
}

impl Default for HeuristicMapper {
    fn default() -> Self {
        Self::new()
    }
}

impl HeuristicMapper {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Deterministic entropy draws.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl ObservationMapper for HeuristicMapper {
    fn map(&mut self, raw: &RawProcessMetrics) -> Result<Observation, CollectError> {
        let cpu = raw
            .cpu_percent
            .filter(|c| c.is_finite())
            .ok_or(CollectError::MetricUnavailable {
                pid: raw.pid,
                metric: "cpu_percent",
            })?;
        let memory_bytes = raw.memory_bytes.ok_or(CollectError::MetricUnavailable {
            pid: raw.pid,
            metric: "memory",
        })?;
        let threads = raw.thread_count.unwrap_or(1).max(1);

        let cpu_usage = (cpu as f64).clamp(0.0, MAX_CPU_PERCENT);
        let memory_usage = memory_bytes as f64 / BYTES_PER_MB;
        Ok(Observation {
            file_access_count: threads.saturating_mul(FILE_ACCESS_PER_THREAD),
            cpu_usage,
            memory_usage,
            network_packets: (cpu_usage * PACKETS_PER_CPU_PERCENT).round() as u32,
            network_ports: u32::from(cpu_usage > PORT_CPU_THRESHOLD),
            privilege_escalation_attempt: u8::from(memory_usage > ESCALATION_MEMORY_MB),
            file_entropy: self.rng.gen_range(0.0..MAX_ENTROPY),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(cpu: f32, mem_mb: u64, threads: Option<u32>) -> RawProcessMetrics {
        RawProcessMetrics {
            pid: 1,
            name: None,
            cpu_percent: Some(cpu),
            memory_bytes: Some(mem_mb * 1024 * 1024),
            thread_count: threads,
        }
    }

    #[test]
    fn busy_large_process() {
        let mut m = HeuristicMapper::seeded(3);
        let o = m.map(&raw(40.0, 800, Some(6))).unwrap();
        assert_eq!(o.file_access_count, 12);
        assert_eq!(o.cpu_usage, 40.0);
        assert_eq!(o.memory_usage, 800.0);
        assert_eq!(o.network_packets, 200);
        assert_eq!(o.network_ports, 1);
        assert_eq!(o.privilege_escalation_attempt, 1);
        assert!((0.0..8.0).contains(&o.file_entropy));
    }

    #[test]
    fn idle_small_process_with_unknown_threads() {
        let mut m = HeuristicMapper::seeded(3);
        let o = m.map(&raw(20.0, 500, None)).unwrap();
        assert_eq!(o.file_access_count, 2);
        // thresholds are strict
        assert_eq!(o.network_ports, 0);
        assert_eq!(o.privilege_escalation_attempt, 0);
    }

    #[test]
    fn cpu_is_clamped() {
        let mut m = HeuristicMapper::seeded(3);
        let o = m.map(&raw(350.0, 10, Some(1))).unwrap();
        assert_eq!(o.cpu_usage, 100.0);
        assert_eq!(o.network_packets, 500);
    }

    #[test]
    fn packets_grow_with_cpu() {
        let mut m = HeuristicMapper::seeded(3);
        let low = m.map(&raw(10.0, 10, Some(1))).unwrap().network_packets;
        let high = m.map(&raw(11.0, 10, Some(1))).unwrap().network_packets;
        assert!(high > low);
    }

    #[test]
    fn missing_cpu_is_an_error() {
        let mut m = HeuristicMapper::seeded(3);
        let mut r = raw(1.0, 10, Some(1));
        r.cpu_percent = Some(f32::NAN);
        assert!(matches!(
            m.map(&r),
            Err(CollectError::MetricUnavailable { metric: "cpu_percent", .. })
        ));
    }
}
