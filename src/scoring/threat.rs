//! Batch-relative threat score: a ranking aid, not a probability.
//!
//! `cpu/100 + mem/max(mem) + packets/max(packets) + escalation`, where a term whose
//! batch maximum is zero contributes 0.

use crate::features::Observation;

/// Per-batch denominators for the memory and packet terms.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BatchMaxima {
    pub memory_usage: f64,
    pub network_packets: f64,
}

impl BatchMaxima {
    pub fn of(batch: &[Observation]) -> Self {
        batch.iter().fold(Self::default(), |m, o| Self {
            memory_usage: m.memory_usage.max(o.memory_usage),
            network_packets: m.network_packets.max(o.network_packets as f64),
        })
    }
}

fn relative(value: f64, max: f64) -> f64 {
    if max > 0.0 {
        value / max
    } else {
        0.0
    }
}

pub fn threat_score(o: &Observation, maxima: &BatchMaxima) -> f64 {
    o.cpu_usage / 100.0
        + relative(o.memory_usage, maxima.memory_usage)
        + relative(o.network_packets as f64, maxima.network_packets)
        + o.privilege_escalation_attempt as f64
}

/// One score per observation, normalized against this batch only.
pub fn threat_scores(batch: &[Observation]) -> Vec<f64> {
    let maxima = BatchMaxima::of(batch);
    batch.iter().map(|o| threat_score(o, &maxima)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_zero_row_scores_zero() {
        assert_eq!(threat_scores(&[Observation::default()]), vec![0.0]);
    }

    #[test]
    fn two_row_batch() {
        let a = Observation {
            cpu_usage: 80.0,
            memory_usage: 100.0,
            network_packets: 50,
            ..Default::default()
        };
        let b = Observation {
            cpu_usage: 10.0,
            memory_usage: 1000.0,
            network_packets: 10,
            privilege_escalation_attempt: 1,
            ..Default::default()
        };
        let s = threat_scores(&[a, b]);
        assert!((s[0] - 1.9).abs() < 1e-12, "{}", s[0]);
        assert!((s[1] - 2.3).abs() < 1e-12, "{}", s[1]);
    }

    #[test]
    fn empty_batch() {
        assert!(threat_scores(&[]).is_empty());
    }
}
