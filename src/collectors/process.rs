//! Per-process counters via sysinfo (cross-platform, best-effort).

use super::{CollectError, MetricsSource, RawProcessMetrics};
use std::time::Duration;
use sysinfo::{Process, ProcessStatus, System};

pub struct SysinfoSource {
    sys: System,
    prime_pause: Duration,
}

impl SysinfoSource {
    /// `prime_pause` separates the priming refresh from the sampling refresh;
    /// CPU% is a delta between the two.
    pub fn new(prime_pause: Duration) -> Self {
        Self {
            sys: System::new(),
            prime_pause,
        }
    }
}

/// Zombie and dead entries exited between the two passes; their counters are stale.
fn exited(status: ProcessStatus) -> bool {
    matches!(status, ProcessStatus::Zombie | ProcessStatus::Dead)
}

fn read_process(pid: u32, proc_: &Process) -> Result<RawProcessMetrics, CollectError> {
    if exited(proc_.status()) {
        return Err(CollectError::Vanished { pid });
    }
    let name = proc_.name();
    Ok(RawProcessMetrics {
        pid,
        name: (!name.is_empty()).then(|| name.to_string()),
        cpu_percent: Some(proc_.cpu_usage()),
        memory_bytes: Some(proc_.memory()),
        // Only populated on Linux; the mapper falls back to one thread
        thread_count: proc_.tasks().map(|t| t.len() as u32),
    })
}

impl MetricsSource for SysinfoSource {
    fn poll(&mut self) -> Vec<Result<RawProcessMetrics, CollectError>> {
        self.sys.refresh_processes();
        std::thread::sleep(self.prime_pause);
        self.sys.refresh_processes();

        let mut out: Vec<(u32, Result<RawProcessMetrics, CollectError>)> = self
            .sys
            .processes()
            .iter()
            .map(|(pid, proc_)| (pid.as_u32(), read_process(pid.as_u32(), proc_)))
            .collect();
        out.sort_by_key(|(pid, _)| *pid);
        out.into_iter().map(|(_, r)| r).collect()
    }
}
