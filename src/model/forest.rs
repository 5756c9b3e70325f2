//! Random forest of bootstrapped CART trees; suspicious-class probability is the
//! mean of the per-tree leaf fractions.

use super::tree::{DecisionTree, TreeParams};
use crate::config::TrainerConfig;
use crate::error::{ProcwatchError, Result};
use crate::features::Label;
use ndarray::ArrayView2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForestParams {
    pub n_estimators: usize,
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    pub bootstrap: bool,
    pub seed: u64,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self::from(&TrainerConfig::default())
    }
}

impl From<&TrainerConfig> for ForestParams {
    fn from(c: &TrainerConfig) -> Self {
        Self {
            n_estimators: c.n_estimators,
            max_depth: c.max_depth,
            min_samples_split: c.min_samples_split,
            min_samples_leaf: c.min_samples_leaf,
            bootstrap: true,
            seed: c.seed,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    params: ForestParams,
    n_features: usize,
    trees: Vec<DecisionTree>,
}

/// `floor(sqrt(n))`, at least 1.
fn sqrt_features(n: usize) -> usize {
    ((n as f64).sqrt() as usize).max(1)
}

impl RandomForest {
    /// Fit on scaled features `x` with one label per row. Same inputs and seed give the same forest.
    pub fn fit(x: ArrayView2<f64>, labels: &[Label], params: ForestParams) -> Result<Self> {
        let n = x.nrows();
        if n == 0 {
            return Err(ProcwatchError::EmptyDataset("cannot fit classifier on zero rows".into()));
        }
        if labels.len() != n {
            return Err(ProcwatchError::Configuration(format!(
                "{} feature rows but {} labels",
                n,
                labels.len()
            )));
        }
        if params.n_estimators == 0 {
            return Err(ProcwatchError::Configuration("n_estimators must be at least 1".into()));
        }

        let y: Vec<bool> = labels.iter().map(|l| l.is_suspicious()).collect();
        let tree_params = TreeParams {
            max_depth: params.max_depth,
            min_samples_split: params.min_samples_split.max(2),
            min_samples_leaf: params.min_samples_leaf.max(1),
            max_features: sqrt_features(x.ncols()),
        };

        let mut master = StdRng::seed_from_u64(params.seed);
        let trees = (0..params.n_estimators)
            .map(|_| {
                let mut rng = StdRng::seed_from_u64(master.gen());
                let samples: Vec<usize> = if params.bootstrap {
                    (0..n).map(|_| rng.gen_range(0..n)).collect()
                } else {
                    (0..n).collect()
                };
                DecisionTree::fit(x, &y, samples, &tree_params, &mut rng)
            })
            .collect();

        Ok(Self {
            params,
            n_features: x.ncols(),
            trees,
        })
    }

    pub fn params(&self) -> &ForestParams {
        &self.params
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    /// Every tree must be well formed for `n_features` inputs.
    pub fn check_structure(&self) -> std::result::Result<(), String> {
        if self.trees.is_empty() {
            return Err("forest has no trees".into());
        }
        self.trees
            .iter()
            .enumerate()
            .try_for_each(|(i, t)| {
                t.check_structure(self.n_features)
                    .map_err(|e| format!("tree {}: {}", i, e))
            })
    }

    /// Probability of [`Label::Suspicious`] per row, in [0, 1].
    pub fn predict_proba(&self, x: ArrayView2<f64>) -> Result<Vec<f64>> {
        if x.ncols() != self.n_features {
            return Err(ProcwatchError::schema_mismatch(
                &[format!("{} features", self.n_features)],
                &[format!("{} features", x.ncols())],
            ));
        }
        let n_trees = self.trees.len().max(1) as f64;
        Ok(x.rows()
            .into_iter()
            .map(|row| {
                let sum: f64 = self.trees.iter().map(|t| t.predict_proba(row)).sum();
                (sum / n_trees).clamp(0.0, 1.0)
            })
            .collect())
    }

    /// Suspicious when the averaged probability is strictly above 0.5; ties go to normal.
    pub fn predict(&self, x: ArrayView2<f64>) -> Result<Vec<Label>> {
        Ok(self
            .predict_proba(x)?
            .into_iter()
            .map(label_for)
            .collect())
    }
}

pub fn label_for(proba: f64) -> Label {
    if proba > 0.5 {
        Label::Suspicious
    } else {
        Label::Normal
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    fn toy() -> (Array2<f64>, Vec<Label>) {
        let mut flat = Vec::new();
        let mut labels = Vec::new();
        for i in 0..40 {
            let v = i as f64;
            flat.extend([v, (i % 3) as f64]);
            labels.push(if i >= 20 { Label::Suspicious } else { Label::Normal });
        }
        (Array2::from_shape_vec((40, 2), flat).unwrap(), labels)
    }

    #[test]
    fn same_seed_same_forest() {
        let (x, y) = toy();
        let p = ForestParams {
            n_estimators: 10,
            ..ForestParams::default()
        };
        let a = RandomForest::fit(x.view(), &y, p).unwrap();
        let b = RandomForest::fit(x.view(), &y, p).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.n_trees(), 10);
    }

    #[test]
    fn learns_a_threshold() {
        let (x, y) = toy();
        let p = ForestParams {
            n_estimators: 15,
            ..ForestParams::default()
        };
        let f = RandomForest::fit(x.view(), &y, p).unwrap();
        let preds = f.predict(x.view()).unwrap();
        let correct = preds.iter().zip(&y).filter(|(a, b)| a == b).count();
        assert!(correct >= 38, "correct = {}", correct);
    }

    #[test]
    fn wrong_width_rejected() {
        let (x, y) = toy();
        let f = RandomForest::fit(
            x.view(),
            &y,
            ForestParams {
                n_estimators: 2,
                ..ForestParams::default()
            },
        )
        .unwrap();
        let narrow = Array2::<f64>::zeros((3, 1));
        assert!(f.predict_proba(narrow.view()).unwrap_err().is_schema_mismatch());
    }

    #[test]
    fn ties_are_normal() {
        assert_eq!(label_for(0.5), Label::Normal);
        assert_eq!(label_for(0.51), Label::Suspicious);
    }
}
