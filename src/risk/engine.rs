//! Maps the forest's threat probability onto reporting bands with configurable thresholds.

use crate::config::RiskConfig;
use crate::scoring::Score;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn from_probability(probability: f64, config: &RiskConfig) -> Self {
        if probability >= config.high_threshold {
            RiskLevel::High
        } else if probability >= config.medium_threshold {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
        }
    }
}

/// Risk assessment for one scored row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskResult {
    pub row: usize,
    pub probability: f64,
    pub threat_score: f64,
    pub level: RiskLevel,
}

pub struct RiskEngine {
    config: RiskConfig,
}

impl RiskEngine {
    pub fn new(config: RiskConfig) -> Self {
        Self { config }
    }

    pub fn assess(&self, row: usize, score: &Score) -> RiskResult {
        RiskResult {
            row,
            probability: score.threat_probability,
            threat_score: score.threat_score,
            level: RiskLevel::from_probability(score.threat_probability, &self.config),
        }
    }

    /// Rows at or above `min`, most probable first.
    pub fn elevated(&self, scores: &[Score], min: RiskLevel) -> Vec<RiskResult> {
        let mut out: Vec<RiskResult> = scores
            .iter()
            .enumerate()
            .map(|(i, s)| self.assess(i, s))
            .filter(|r| r.level >= min)
            .collect();
        out.sort_by(|a, b| b.probability.total_cmp(&a.probability));
        out
    }

    pub fn config(&self) -> &RiskConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::Label;

    fn score(p: f64) -> Score {
        Score {
            prediction: crate::model::label_for(p),
            threat_probability: p,
            threat_score: p * 2.0,
        }
    }

    #[test]
    fn bands_are_inclusive_at_thresholds() {
        let c = RiskConfig::default();
        assert_eq!(RiskLevel::from_probability(0.8, &c), RiskLevel::High);
        assert_eq!(RiskLevel::from_probability(0.5, &c), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_probability(0.49, &c), RiskLevel::Low);
    }

    #[test]
    fn elevated_filters_and_orders() {
        let engine = RiskEngine::new(RiskConfig::default());
        let scores = [score(0.6), score(0.1), score(0.95), score(0.85)];
        let high = engine.elevated(&scores, RiskLevel::High);
        let rows: Vec<usize> = high.iter().map(|r| r.row).collect();
        assert_eq!(rows, vec![2, 3]);
        assert_eq!(engine.elevated(&scores, RiskLevel::Medium).len(), 3);
        assert_eq!(scores[0].prediction, Label::Suspicious);
    }
}
