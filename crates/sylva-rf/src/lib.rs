//! CART decision trees and Random Forest classification.
//!
//! Provides Gini/Entropy split search, recursive tree building, a
//! bootstrap-aggregated forest trained in parallel via rayon, majority-vote
//! prediction, out-of-bag evaluation, MDI feature importance, and
//! accuracy / macro-F1 metrics.

mod config;
mod confusion;
mod error;
mod forest;
mod importance;
mod metrics;
mod node;
mod oob;
mod predict;
mod result;
mod split;
mod tree;

pub use config::{MaxFeatures, OobMode, RandomForestConfig};
pub use confusion::{ClassMetrics, ConfusionMatrix};
pub use error::{InputError, RfError};
pub use forest::RandomForest;
pub use importance::RankedFeature;
pub use metrics::{accuracy, macro_f1};
pub use node::{FeatureIndex, Impurity, Node};
pub use oob::OobScore;
pub use predict::ClassDistribution;
pub use result::{RandomForestResult, TrainingMetadata, TreeSample};
pub use split::SplitCriterion;
pub use tree::{DecisionTree, DecisionTreeConfig};
