//! Held-out classification metrics. Suspicious is the positive class; a ratio with a
//! zero denominator is reported as 0.

use crate::features::Label;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    pub true_positives: usize,
    pub false_positives: usize,
    pub true_negatives: usize,
    pub false_negatives: usize,
}

impl ConfusionMatrix {
    pub fn from_predictions(truth: &[Label], predicted: &[Label]) -> Self {
        let mut m = Self::default();
        for (t, p) in truth.iter().zip(predicted) {
            match (t, p) {
                (Label::Suspicious, Label::Suspicious) => m.true_positives += 1,
                (Label::Normal, Label::Suspicious) => m.false_positives += 1,
                (Label::Normal, Label::Normal) => m.true_negatives += 1,
                (Label::Suspicious, Label::Normal) => m.false_negatives += 1,
            }
        }
        m
    }

    pub fn total(&self) -> usize {
        self.true_positives + self.false_positives + self.true_negatives + self.false_negatives
    }
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    /// Accuracy of always predicting the most frequent true label
    pub majority_baseline: f64,
    pub support: usize,
    pub confusion: ConfusionMatrix,
}

impl EvaluationReport {
    pub fn from_predictions(truth: &[Label], predicted: &[Label]) -> Self {
        let c = ConfusionMatrix::from_predictions(truth, predicted);
        let total = c.total();
        let precision = ratio(c.true_positives, c.true_positives + c.false_positives);
        let recall = ratio(c.true_positives, c.true_positives + c.false_negatives);
        let f1 = if precision + recall == 0.0 {
            0.0
        } else {
            2.0 * precision * recall / (precision + recall)
        };
        let positives = c.true_positives + c.false_negatives;
        Self {
            accuracy: ratio(c.true_positives + c.true_negatives, total),
            precision,
            recall,
            f1,
            majority_baseline: ratio(positives.max(total - positives), total),
            support: total,
            confusion: c,
        }
    }

    pub fn beats_baseline(&self) -> bool {
        self.accuracy > self.majority_baseline
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::Label::{Normal as N, Suspicious as S};

    #[test]
    fn metrics_match_hand_computation() {
        let truth = [S, S, S, N, N, N, N, N];
        let pred = [S, S, N, S, N, N, N, N];
        let r = EvaluationReport::from_predictions(&truth, &pred);
        assert_eq!(r.confusion.true_positives, 2);
        assert_eq!(r.confusion.false_positives, 1);
        assert_eq!(r.confusion.false_negatives, 1);
        assert_eq!(r.accuracy, 0.75);
        assert!((r.precision - 2.0 / 3.0).abs() < 1e-12);
        assert!((r.recall - 2.0 / 3.0).abs() < 1e-12);
        assert!((r.f1 - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(r.majority_baseline, 0.625);
        assert!(r.beats_baseline());
    }

    #[test]
    fn no_positive_predictions_gives_zero_precision() {
        let r = EvaluationReport::from_predictions(&[S, N], &[N, N]);
        assert_eq!(r.precision, 0.0);
        assert_eq!(r.f1, 0.0);
    }
}
