//! Forest-level settings layered over a per-tree growth template.

use crate::error::RfError;
use crate::result::RandomForestResult;
use crate::tree::DecisionTreeConfig;

/// How many columns each split may look at.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MaxFeatures {
    /// `floor(sqrt(F))`, at least 1.
    Sqrt,
    /// `floor(log2(F))`, at least 1.
    Log2,
    /// `floor(f * F)` for `f` in (0, 1], at least 1.
    Fraction(f64),
    /// Exactly this many, which must lie in `[1, F]`.
    Fixed(usize),
    /// Every column.
    All,
}

/// Whether `fit` scores each training row on the trees that never saw it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OobMode {
    Enabled,
    Disabled,
}

/// Settings for a bagged ensemble of [`DecisionTree`](crate::DecisionTree)s.
///
/// Depth, split and leaf limits and the criterion come from the tree
/// template set with [`with_tree`](Self::with_tree). Its `max_features` and
/// `seed` are ignored: every member gets the resolved [`MaxFeatures`] and a
/// seed drawn from the forest seed.
///
/// # Defaults
///
/// | Parameter            | Default                         |
/// |----------------------|---------------------------------|
/// | `tree`               | [`DecisionTreeConfig::new()`]   |
/// | `max_features`       | `Sqrt`                          |
/// | `seed`               | 0                               |
/// | `oob_mode`           | `Disabled`                      |
/// | `bootstrap_fraction` | 1.0                             |
#[derive(Debug, Clone)]
pub struct RandomForestConfig {
    pub(crate) n_trees: usize,
    pub(crate) tree: DecisionTreeConfig,
    pub(crate) max_features: MaxFeatures,
    pub(crate) seed: u64,
    pub(crate) oob_mode: OobMode,
    pub(crate) bootstrap_fraction: f64,
}

impl RandomForestConfig {
    /// Start a config for `n_trees` members.
    ///
    /// # Errors
    ///
    /// [`RfError::InvalidTreeCount`] when `n_trees` is zero.
    pub fn new(n_trees: usize) -> Result<Self, RfError> {
        if n_trees == 0 {
            return Err(RfError::InvalidTreeCount { n_trees });
        }
        Ok(Self {
            n_trees,
            tree: DecisionTreeConfig::new(),
            max_features: MaxFeatures::Sqrt,
            seed: 0,
            oob_mode: OobMode::Disabled,
            bootstrap_fraction: 1.0,
        })
    }

    /// Grow every member with `tree`'s criterion and stopping rules.
    #[must_use]
    pub fn with_tree(mut self, tree: DecisionTreeConfig) -> Self {
        self.tree = tree;
        self
    }

    #[must_use]
    pub fn with_max_features(mut self, max_features: MaxFeatures) -> Self {
        self.max_features = max_features;
        self
    }

    /// Seed of the master stream that hands each member its own seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    #[must_use]
    pub fn with_oob_mode(mut self, oob_mode: OobMode) -> Self {
        self.oob_mode = oob_mode;
        self
    }

    /// Draw `ceil(fraction * n)` rows per member instead of `n`.
    #[must_use]
    pub fn with_bootstrap_fraction(mut self, fraction: f64) -> Self {
        self.bootstrap_fraction = fraction;
        self
    }

    #[must_use]
    pub fn n_trees(&self) -> usize {
        self.n_trees
    }

    /// The growth template shared by all members.
    #[must_use]
    pub fn tree(&self) -> &DecisionTreeConfig {
        &self.tree
    }

    #[must_use]
    pub fn max_features(&self) -> MaxFeatures {
        self.max_features
    }

    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    #[must_use]
    pub fn oob_mode(&self) -> OobMode {
        self.oob_mode
    }

    #[must_use]
    pub fn bootstrap_fraction(&self) -> f64 {
        self.bootstrap_fraction
    }

    /// Bag `n_trees` trees over row-major `features` and zero-based `labels`.
    ///
    /// `feature_names` labels the ranked importances; pass `&[]` for
    /// `f0, f1, ...`.
    ///
    /// # Errors
    ///
    /// | Variant                               | When                                                 |
    /// |---------------------------------------|------------------------------------------------------|
    /// | [`RfError::InvalidInput`]             | the data fails validation, or names and columns differ in count |
    /// | [`RfError::InvalidMaxFeatures`]       | `max_features` resolves outside `[1, n_features]`    |
    /// | [`RfError::InvalidBootstrapFraction`] | fraction outside (0, 1]                              |
    /// | tree config errors                    | the template is invalid, see [`DecisionTreeConfig::fit`] |
    /// | [`RfError::OobEvaluationFailed`]      | OOB enabled but no row was left out by any tree      |
    pub fn fit(
        &self,
        features: &[Vec<f64>],
        labels: &[usize],
        feature_names: &[String],
    ) -> Result<RandomForestResult, RfError> {
        crate::forest::train(self, features, labels, feature_names)
    }
}
