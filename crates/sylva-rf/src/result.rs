//! Everything a forest fit produces besides the trees.

use crate::forest::RandomForest;
use crate::importance::RankedFeature;
use crate::oob::OobScore;

/// The training rows one member drew, and the ones it never saw.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct TreeSample {
    /// Drawn row indices in draw order. Rows repeat.
    pub in_bag: Vec<usize>,
    /// Rows never drawn, ascending.
    pub out_of_bag: Vec<usize>,
}

/// Shape of the fit after every setting has been resolved.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct TrainingMetadata {
    pub n_trees: usize,
    pub n_samples: usize,
    pub n_features: usize,
    pub n_classes: usize,
    /// Columns each split examined.
    pub max_features_resolved: usize,
    /// Rows drawn per member.
    pub draw_count: usize,
}

/// Output of [`RandomForestConfig::fit`](crate::RandomForestConfig::fit).
#[derive(Debug)]
pub struct RandomForestResult {
    pub(crate) forest: RandomForest,
    pub(crate) importances: Vec<RankedFeature>,
    pub(crate) oob_score: Option<OobScore>,
    pub(crate) samples: Vec<TreeSample>,
    pub(crate) metadata: TrainingMetadata,
}

impl RandomForestResult {
    #[must_use]
    pub fn forest(&self) -> &RandomForest {
        &self.forest
    }

    #[must_use]
    pub fn into_forest(self) -> RandomForest {
        self.forest
    }

    /// Mean-decrease-in-impurity ranking, most important first.
    #[must_use]
    pub fn importances(&self) -> &[RankedFeature] {
        &self.importances
    }

    /// `Some` only when the forest was fit with [`OobMode::Enabled`](crate::OobMode::Enabled).
    #[must_use]
    pub fn oob_score(&self) -> Option<&OobScore> {
        self.oob_score.as_ref()
    }

    /// One entry per tree, in tree order.
    #[must_use]
    pub fn samples(&self) -> &[TreeSample] {
        &self.samples
    }

    #[must_use]
    pub fn metadata(&self) -> &TrainingMetadata {
        &self.metadata
    }
}
