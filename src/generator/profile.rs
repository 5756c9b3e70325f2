//! Per-class sampling ranges. Two named profiles are kept: `realistic` (wide
//! overlap) and `compact` (tighter classes, overlap only on ports and escalation).

use serde::{Deserialize, Serialize};

/// Half-open integer range `[low, high)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntRange {
    pub low: u32,
    pub high: u32,
}

/// Half-open float range `[low, high)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FloatRange {
    pub low: f64,
    pub high: f64,
}

const fn ints(low: u32, high: u32) -> IntRange {
    IntRange { low, high }
}

const fn floats(low: f64, high: f64) -> FloatRange {
    FloatRange { low, high }
}

impl IntRange {
    pub fn overlaps(&self, other: &IntRange) -> bool {
        self.low < other.high && other.low < self.high
    }
}

impl FloatRange {
    pub fn overlaps(&self, other: &FloatRange) -> bool {
        self.low < other.high && other.low < self.high
    }
}

/// Sampling distribution for every feature of one class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassProfile {
    pub file_access_count: IntRange,
    pub cpu_usage: FloatRange,
    pub memory_usage: FloatRange,
    pub network_packets: IntRange,
    pub network_ports: IntRange,
    /// Weight of escalation level `i` at index `i`
    pub privilege_escalation_weights: Vec<f64>,
    pub file_entropy: FloatRange,
}

impl ClassProfile {
    /// Escalation levels that can actually be drawn.
    fn escalation_levels(&self) -> impl Iterator<Item = usize> + '_ {
        self.privilege_escalation_weights
            .iter()
            .enumerate()
            .filter(|(_, w)| **w > 0.0)
            .map(|(i, _)| i)
    }

    /// Number of features whose sampling ranges intersect with `other`.
    pub fn overlapping_features(&self, other: &ClassProfile) -> usize {
        let escalation = self
            .escalation_levels()
            .any(|l| other.escalation_levels().any(|m| m == l));
        [
            self.file_access_count.overlaps(&other.file_access_count),
            self.cpu_usage.overlaps(&other.cpu_usage),
            self.memory_usage.overlaps(&other.memory_usage),
            self.network_packets.overlaps(&other.network_packets),
            self.network_ports.overlaps(&other.network_ports),
            escalation,
            self.file_entropy.overlaps(&other.file_entropy),
        ]
        .into_iter()
        .filter(|o| *o)
        .count()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileName {
    #[default]
    Realistic,
    Compact,
}

impl std::str::FromStr for ProfileName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "realistic" => Ok(ProfileName::Realistic),
            "compact" => Ok(ProfileName::Compact),
            other => Err(format!("unknown generator profile: {}", other)),
        }
    }
}

/// Full generator configuration: class ranges, borderline ranges and subset sizes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratorProfile {
    pub name: ProfileName,
    pub normal: ClassProfile,
    pub suspicious: ClassProfile,
    /// Drawn from suspicious-looking ranges, labeled normal
    pub borderline_normal: ClassProfile,
    /// Drawn from normal-looking ranges, labeled suspicious
    pub borderline_suspicious: ClassProfile,
    pub samples_per_class: usize,
    pub borderline_per_class: usize,
}

pub const DEFAULT_SAMPLES_PER_CLASS: usize = 500;
pub const DEFAULT_BORDERLINE_PER_CLASS: usize = 100;

fn borderline_normal() -> ClassProfile {
    ClassProfile {
        file_access_count: ints(25, 40),
        cpu_usage: floats(50.0, 70.0),
        memory_usage: floats(600.0, 900.0),
        network_packets: ints(200, 400),
        network_ports: ints(1, 3),
        privilege_escalation_weights: vec![0.7, 0.3],
        file_entropy: floats(3.0, 5.0),
    }
}

fn borderline_suspicious() -> ClassProfile {
    ClassProfile {
        file_access_count: ints(10, 25),
        cpu_usage: floats(35.0, 55.0),
        memory_usage: floats(300.0, 700.0),
        network_packets: ints(100, 250),
        network_ports: ints(0, 2),
        privilege_escalation_weights: vec![0.5, 0.5],
        file_entropy: floats(2.0, 4.0),
    }
}

impl GeneratorProfile {
    pub fn named(name: ProfileName) -> Self {
        match name {
            ProfileName::Realistic => Self::realistic(),
            ProfileName::Compact => Self::compact(),
        }
    }

    /// Wide overlap on every feature; the default.
    pub fn realistic() -> Self {
        Self {
            name: ProfileName::Realistic,
            normal: ClassProfile {
                file_access_count: ints(1, 30),
                cpu_usage: floats(5.0, 60.0),
                memory_usage: floats(100.0, 800.0),
                network_packets: ints(10, 300),
                network_ports: ints(0, 3),
                privilege_escalation_weights: vec![0.95, 0.05],
                file_entropy: floats(0.0, 5.0),
            },
            suspicious: ClassProfile {
                file_access_count: ints(15, 100),
                cpu_usage: floats(40.0, 95.0),
                memory_usage: floats(400.0, 2000.0),
                network_packets: ints(150, 1000),
                network_ports: ints(1, 5),
                privilege_escalation_weights: vec![0.1, 0.5, 0.4],
                file_entropy: floats(2.0, 8.0),
            },
            borderline_normal: borderline_normal(),
            borderline_suspicious: borderline_suspicious(),
            samples_per_class: DEFAULT_SAMPLES_PER_CLASS,
            borderline_per_class: DEFAULT_BORDERLINE_PER_CLASS,
        }
    }

    /// Tighter class ranges; separation is carried by borderline rows, ports and escalation.
    pub fn compact() -> Self {
        Self {
            name: ProfileName::Compact,
            normal: ClassProfile {
                file_access_count: ints(1, 10),
                cpu_usage: floats(5.0, 30.0),
                memory_usage: floats(100.0, 500.0),
                network_packets: ints(10, 100),
                network_ports: ints(0, 2),
                privilege_escalation_weights: vec![1.0],
                file_entropy: floats(0.0, 3.0),
            },
            suspicious: ClassProfile {
                file_access_count: ints(20, 100),
                cpu_usage: floats(50.0, 95.0),
                memory_usage: floats(500.0, 2000.0),
                network_packets: ints(200, 1000),
                network_ports: ints(1, 5),
                privilege_escalation_weights: vec![0.5, 0.5],
                file_entropy: floats(3.0, 8.0),
            },
            borderline_normal: borderline_normal(),
            borderline_suspicious: borderline_suspicious(),
            samples_per_class: DEFAULT_SAMPLES_PER_CLASS,
            borderline_per_class: DEFAULT_BORDERLINE_PER_CLASS,
        }
    }

    pub fn with_counts(mut self, samples_per_class: usize, borderline_per_class: usize) -> Self {
        self.samples_per_class = samples_per_class;
        self.borderline_per_class = borderline_per_class;
        self
    }

    pub fn total_rows(&self) -> usize {
        2 * (self.samples_per_class + self.borderline_per_class)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn realistic_classes_overlap_on_several_features() {
        let p = GeneratorProfile::realistic();
        assert_eq!(p.normal.overlapping_features(&p.suspicious), 7);
    }

    #[test]
    fn compact_classes_still_overlap() {
        let p = GeneratorProfile::compact();
        // ports {1} and escalation level 0
        assert_eq!(p.normal.overlapping_features(&p.suspicious), 2);
    }

    #[test]
    fn borderline_ranges_lean_toward_the_opposite_class() {
        let p = GeneratorProfile::realistic();
        assert!(p.borderline_normal.cpu_usage.low > p.normal.cpu_usage.low);
        assert!(p.borderline_normal.cpu_usage.overlaps(&p.suspicious.cpu_usage));
        assert!(p.borderline_suspicious.cpu_usage.high < p.suspicious.cpu_usage.high);
    }

    #[test]
    fn profile_names_parse() {
        assert_eq!("Compact".parse::<ProfileName>().unwrap(), ProfileName::Compact);
        assert!("loose".parse::<ProfileName>().is_err());
    }
}
