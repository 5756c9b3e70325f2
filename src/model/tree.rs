//! Binary CART tree with Gini impurity, stored as a flat node arena.

use ndarray::{ArrayView1, ArrayView2};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum Node {
    Leaf {
        /// Fraction of suspicious training samples that reached this leaf
        proba: f64,
        samples: usize,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

/// Growth limits for a single tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeParams {
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    /// Features examined per split before settling for the best one found
    pub max_features: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    nodes: Vec<Node>,
}

struct Candidate {
    feature: usize,
    threshold: f64,
    impurity: f64,
}

fn gini(positives: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let p = positives as f64 / total as f64;
    2.0 * p * (1.0 - p)
}

impl DecisionTree {
    /// Grow a tree on the rows listed in `samples` (duplicates allowed, e.g. a bootstrap draw).
    pub fn fit<'d, R: Rng + ?Sized>(
        x: ArrayView2<'d, f64>,
        y: &[bool],
        samples: Vec<usize>,
        params: &TreeParams,
        rng: &mut R,
    ) -> Self {
        let mut builder = Builder {
            x,
            y,
            params,
            rng,
            nodes: Vec::new(),
        };
        builder.grow(samples, 0);
        Self {
            nodes: builder.nodes,
        }
    }

    /// Probability of the suspicious class for one scaled row.
    pub fn predict_proba(&self, row: ArrayView1<f64>) -> f64 {
        let mut id = 0;
        loop {
            match self.nodes.get(id) {
                Some(Node::Leaf { proba, .. }) => return *proba,
                Some(Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                }) => {
                    id = if row[*feature] <= *threshold { *left } else { *right };
                }
                None => return 0.0,
            }
        }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn leaf_count(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| matches!(n, Node::Leaf { .. }))
            .count()
    }

    pub fn depth(&self) -> usize {
        fn walk(nodes: &[Node], id: usize) -> usize {
            match nodes.get(id) {
                Some(Node::Split { left, right, .. }) => 1 + walk(nodes, *left).max(walk(nodes, *right)),
                _ => 0,
            }
        }
        walk(&self.nodes, 0)
    }

    /// Structural check for trees read back from disk. Nodes are stored parent
    /// before children, so every child index must point forward.
    pub fn check_structure(&self, n_features: usize) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err("tree has no nodes".into());
        }
        for (id, node) in self.nodes.iter().enumerate() {
            match *node {
                Node::Leaf { proba, .. } => {
                    if !(0.0..=1.0).contains(&proba) {
                        return Err(format!("node {}: leaf probability {} out of range", id, proba));
                    }
                }
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    if feature >= n_features {
                        return Err(format!("node {}: feature {} out of range", id, feature));
                    }
                    if threshold.is_nan() {
                        return Err(format!("node {}: threshold is NaN", id));
                    }
                    for child in [left, right] {
                        if child <= id || child >= self.nodes.len() {
                            return Err(format!("node {}: child {} out of range", id, child));
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

struct Builder<'a, 'd, R: Rng + ?Sized> {
    x: ArrayView2<'d, f64>,
    y: &'a [bool],
    params: &'a TreeParams,
    rng: &'a mut R,
    nodes: Vec<Node>,
}

impl<'a, 'd, R: Rng + ?Sized> Builder<'a, 'd, R> {
    fn leaf(&mut self, id: usize, positives: usize, total: usize) {
        self.nodes[id] = Node::Leaf {
            proba: if total == 0 { 0.0 } else { positives as f64 / total as f64 },
            samples: total,
        };
    }

    fn grow(&mut self, samples: Vec<usize>, depth: usize) -> usize {
        let id = self.nodes.len();
        self.nodes.push(Node::Leaf { proba: 0.0, samples: 0 });

        let total = samples.len();
        let positives = samples.iter().filter(|&&i| self.y[i]).count();
        let depth_reached = self.params.max_depth.is_some_and(|d| depth >= d);
        if depth_reached
            || total < self.params.min_samples_split
            || total < 2 * self.params.min_samples_leaf
            || positives == 0
            || positives == total
        {
            self.leaf(id, positives, total);
            return id;
        }

        let Some(best) = self.best_split(&samples) else {
            self.leaf(id, positives, total);
            return id;
        };

        let (left, right): (Vec<usize>, Vec<usize>) = samples
            .into_iter()
            .partition(|&i| self.x[[i, best.feature]] <= best.threshold);
        let left_id = self.grow(left, depth + 1);
        let right_id = self.grow(right, depth + 1);
        self.nodes[id] = Node::Split {
            feature: best.feature,
            threshold: best.threshold,
            left: left_id,
            right: right_id,
        };
        id
    }

    fn best_split(&mut self, samples: &[usize]) -> Option<Candidate> {
        let mut features: Vec<usize> = (0..self.x.ncols()).collect();
        features.shuffle(&mut *self.rng);

        let min_leaf = self.params.min_samples_leaf.max(1);
        let total = samples.len();
        let mut best: Option<Candidate> = None;
        let mut pairs: Vec<(f64, bool)> = Vec::with_capacity(total);

        for (visited, &feature) in features.iter().enumerate() {
            // Keep looking past max_features only while nothing usable was found.
            if visited >= self.params.max_features && best.is_some() {
                break;
            }
            pairs.clear();
            pairs.extend(samples.iter().map(|&i| (self.x[[i, feature]], self.y[i])));
            pairs.sort_by(|a, b| a.0.total_cmp(&b.0));
            if pairs[0].0 == pairs[total - 1].0 {
                continue;
            }

            let all_pos = pairs.iter().filter(|p| p.1).count();
            let mut left_pos = 0usize;
            for k in 1..total {
                if pairs[k - 1].1 {
                    left_pos += 1;
                }
                let (lo, hi) = (pairs[k - 1].0, pairs[k].0);
                if lo == hi || k < min_leaf || total - k < min_leaf {
                    continue;
                }
                let right_pos = all_pos - left_pos;
                let impurity = (k as f64 * gini(left_pos, k)
                    + (total - k) as f64 * gini(right_pos, total - k))
                    / total as f64;
                if best.as_ref().map_or(true, |b| impurity < b.impurity) {
                    let mut threshold = lo / 2.0 + hi / 2.0;
                    if threshold >= hi {
                        threshold = lo;
                    }
                    best = Some(Candidate {
                        feature,
                        threshold,
                        impurity,
                    });
                }
            }
        }
        best
    }
}
