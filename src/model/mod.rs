//! Classifier stack: standard scaler, random forest, and the persisted artifact pair.

mod artifact;
mod forest;
mod scaler;
mod tree;

pub use artifact::{ArtifactPair, CLASSIFIER_FILE, SCALER_FILE};
pub use forest::{label_for, ForestParams, RandomForest};
pub use scaler::StandardScaler;
pub use tree::{DecisionTree, TreeParams};
