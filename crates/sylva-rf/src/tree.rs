use std::collections::BTreeSet;
use std::fmt::Write as _;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, instrument};

use crate::{
    InputError, RfError,
    error::{class_count, validate_training_data},
    node::{Impurity, Node},
    split::{SplitCriterion, find_best_split},
};

/// Growth rules for one CART tree.
///
/// | Parameter           | Default               |
/// |---------------------|-----------------------|
/// | `criterion`         | `Gini`                |
/// | `max_depth`         | `None` (unlimited)    |
/// | `min_samples_split` | 2                     |
/// | `min_samples_leaf`  | 1                     |
/// | `max_features`      | `None` (every column) |
/// | `seed`              | 0                     |
///
/// The seed only matters when `max_features` is below the column count.
#[derive(Debug, Clone)]
pub struct DecisionTreeConfig {
    pub(crate) criterion: SplitCriterion,
    pub(crate) max_depth: Option<usize>,
    pub(crate) min_samples_split: usize,
    pub(crate) min_samples_leaf: usize,
    pub(crate) max_features: Option<usize>,
    pub(crate) seed: u64,
}

impl DecisionTreeConfig {
    #[must_use]
    pub fn new() -> Self {
        Self {
            criterion: SplitCriterion::Gini,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: None,
            seed: 0,
        }
    }

    #[must_use]
    pub fn with_criterion(mut self, criterion: SplitCriterion) -> Self {
        self.criterion = criterion;
        self
    }

    /// Stop splitting at depth `d` (the root is depth 0). `None` grows
    /// until the other rules stop it.
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: Option<usize>) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Nodes with fewer rows become leaves.
    #[must_use]
    pub fn with_min_samples_split(mut self, n: usize) -> Self {
        self.min_samples_split = n;
        self
    }

    /// Splits leaving either child with fewer rows are skipped.
    #[must_use]
    pub fn with_min_samples_leaf(mut self, n: usize) -> Self {
        self.min_samples_leaf = n;
        self
    }

    /// Examine only this many non-constant columns per split, in a fresh
    /// random order each time.
    #[must_use]
    pub fn with_max_features(mut self, max_features: Option<usize>) -> Self {
        self.max_features = max_features;
        self
    }

    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    #[must_use]
    pub fn criterion(&self) -> SplitCriterion {
        self.criterion
    }

    #[must_use]
    pub fn max_depth(&self) -> Option<usize> {
        self.max_depth
    }

    #[must_use]
    pub fn min_samples_split(&self) -> usize {
        self.min_samples_split
    }

    #[must_use]
    pub fn min_samples_leaf(&self) -> usize {
        self.min_samples_leaf
    }

    #[must_use]
    pub fn max_features(&self) -> Option<usize> {
        self.max_features
    }

    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Grow a tree on row-major `features` with zero-based `labels`.
    ///
    /// # Errors
    ///
    /// - [`RfError::InvalidInput`] when the data fails validation (empty,
    ///   ragged, non-finite, mismatched label count, zero columns) or a
    ///   label is `usize::MAX`.
    /// - [`RfError::InvalidMaxDepth`], [`RfError::InvalidMinSamplesSplit`],
    ///   [`RfError::InvalidMinSamplesLeaf`] or [`RfError::InvalidMaxFeatures`]
    ///   when a rule is out of range.
    #[instrument(skip_all, fields(n_samples = features.len()))]
    pub fn fit(&self, features: &[Vec<f64>], labels: &[usize]) -> Result<DecisionTree, RfError> {
        let n_classes = class_count(labels)?;
        self.fit_with_n_classes(features, labels, n_classes)
    }

    /// Check the rules against `n_features` and return the number of
    /// columns each split examines.
    ///
    /// Requires `max_depth != Some(0)`, `min_samples_split >= 2`,
    /// `min_samples_leaf >= 1` and `max_features` in `[1, n_features]`.
    fn resolve(&self, n_features: usize) -> Result<usize, RfError> {
        if self.max_depth == Some(0) {
            return Err(RfError::InvalidMaxDepth { max_depth: 0 });
        }
        if self.min_samples_split < 2 {
            return Err(RfError::InvalidMinSamplesSplit {
                min_samples_split: self.min_samples_split,
            });
        }
        if self.min_samples_leaf == 0 {
            return Err(RfError::InvalidMinSamplesLeaf {
                min_samples_leaf: 0,
            });
        }
        match self.max_features.unwrap_or(n_features) {
            m @ 1.. if m <= n_features => Ok(m),
            max_features => Err(RfError::InvalidMaxFeatures {
                max_features,
                n_features,
            }),
        }
    }

    /// Fit with distributions sized to `n_classes`, which may exceed the
    /// labels present in this particular sample.
    pub(crate) fn fit_with_n_classes(
        &self,
        features: &[Vec<f64>],
        labels: &[usize],
        n_classes: usize,
    ) -> Result<DecisionTree, RfError> {
        let (n_samples, n_features) = validate_training_data(features, labels)?;
        let max_features = self.resolve(n_features)?;
        debug!(n_samples, n_features, n_classes, max_features, "growing tree");

        // The splitter scans one column at a time.
        let columns: Vec<Vec<f64>> = (0..n_features)
            .map(|col| features.iter().map(|row| row[col]).collect())
            .collect();

        let mut builder = TreeBuilder {
            col_features: &columns,
            labels,
            n_classes,
            config: self,
            max_features,
            rng: ChaCha8Rng::seed_from_u64(self.seed),
        };
        let all_rows: Vec<usize> = (0..n_samples).collect();
        let root = builder.build(&all_rows, 0);
        debug!(n_nodes = root.n_nodes(), depth = root.depth(), "tree grown");

        Ok(DecisionTree {
            root,
            n_features,
            n_classes,
        })
    }
}

impl Default for DecisionTreeConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// State shared by every recursive step of one tree build.
struct TreeBuilder<'a> {
    col_features: &'a [Vec<f64>],
    labels: &'a [usize],
    n_classes: usize,
    config: &'a DecisionTreeConfig,
    max_features: usize,
    rng: ChaCha8Rng,
}

impl TreeBuilder<'_> {
    /// Build the subtree for `sample_indices`, whose root sits at `depth`.
    fn build(&mut self, sample_indices: &[usize], depth: usize) -> Node {
        let n_samples = sample_indices.len();

        let mut class_counts = vec![0usize; self.n_classes];
        for &si in sample_indices {
            class_counts[self.labels[si]] += 1;
        }
        let impurity = self.config.criterion.impurity(&class_counts, n_samples);

        let depth_exceeded = self.config.max_depth.is_some_and(|max_d| depth >= max_d);
        let too_few = n_samples < self.config.min_samples_split;
        let pure = class_counts.iter().filter(|&&c| c > 0).count() <= 1;

        if too_few || pure || depth_exceeded {
            return make_leaf(&class_counts, impurity, n_samples);
        }

        let Some(split) = find_best_split(
            self.col_features,
            self.labels,
            sample_indices,
            self.n_classes,
            &self.config.criterion,
            self.max_features,
            self.config.min_samples_leaf,
            &mut self.rng,
        ) else {
            return make_leaf(&class_counts, impurity, n_samples);
        };

        let left = self.build(&split.left_indices, depth + 1);
        let right = self.build(&split.right_indices, depth + 1);

        Node::Split {
            feature: split.feature,
            threshold: split.threshold,
            left: Box::new(left),
            right: Box::new(right),
            impurity,
            n_samples,
            impurity_decrease: split.impurity_decrease,
        }
    }
}

/// Build a leaf predicting the majority class.
fn make_leaf(class_counts: &[usize], impurity: Impurity, n_samples: usize) -> Node {
    let total = n_samples as f64;
    let distribution: Vec<f64> = class_counts.iter().map(|&c| c as f64 / total).collect();
    Node::Leaf {
        prediction: majority_class(class_counts),
        distribution,
        impurity,
        n_samples,
    }
}

/// Index of the largest count; ties go to the lowest index.
pub(crate) fn majority_class(counts: &[usize]) -> usize {
    counts
        .iter()
        .enumerate()
        .fold((0usize, 0usize), |best, (class, &count)| {
            if count > best.1 { (class, count) } else { best }
        })
        .0
}

/// A fitted CART decision tree.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct DecisionTree {
    pub(crate) root: Node,
    pub(crate) n_features: usize,
    pub(crate) n_classes: usize,
}

impl DecisionTree {
    /// Assemble a tree from an existing root node.
    #[must_use]
    pub fn from_root(root: Node, n_features: usize, n_classes: usize) -> Self {
        Self {
            root,
            n_features,
            n_classes,
        }
    }

    /// Predict the class label for a single sample.
    ///
    /// Traverses from the root: at each `Split`, goes left when
    /// `sample[feature] <= threshold`, right otherwise.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`RfError::InvalidInput`] | `sample.len() != n_features` |
    /// | [`RfError::UnknownFeatureIndex`] | a split references a feature beyond `sample.len()` |
    pub fn predict(&self, sample: &[f64]) -> Result<usize, RfError> {
        self.leaf_for(sample).map(|(prediction, _)| prediction)
    }

    /// Return the class probability distribution for a single sample.
    ///
    /// The returned `Vec` has length `n_classes`, summing to 1.0.
    ///
    /// # Errors
    ///
    /// Same as [`DecisionTree::predict`].
    pub fn predict_proba(&self, sample: &[f64]) -> Result<Vec<f64>, RfError> {
        self.leaf_for(sample)
            .map(|(_, distribution)| distribution.to_vec())
    }

    /// Predict class labels for a batch of samples, in input order.
    ///
    /// # Errors
    ///
    /// Returns the first error from [`DecisionTree::predict`].
    pub fn predict_batch(&self, features: &[Vec<f64>]) -> Result<Vec<usize>, RfError> {
        features.iter().map(|sample| self.predict(sample)).collect()
    }

    /// Compute Mean Decrease in Impurity (MDI) feature importances.
    ///
    /// For each `Split` node, the `impurity_decrease` is accumulated by
    /// feature index, then the totals are normalized so they sum to 1.0.
    /// Returns a `Vec` of length `n_features`; all zeros when the tree is
    /// a single leaf.
    #[must_use]
    pub fn feature_importances(&self) -> Vec<f64> {
        let mut totals = vec![0.0f64; self.n_features];
        self.root.visit(&mut |node| {
            if let Node::Split {
                feature,
                impurity_decrease,
                ..
            } = node
                && let Some(total) = totals.get_mut(feature.index())
            {
                *total += impurity_decrease;
            }
        });
        let sum: f64 = totals.iter().sum();
        if sum > 0.0 {
            totals.iter_mut().for_each(|v| *v /= sum);
        }
        totals
    }

    /// Borrow the root node.
    #[must_use]
    pub fn root(&self) -> &Node {
        &self.root
    }

    /// Return the number of features the tree was trained on.
    #[must_use]
    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// Return the number of classes.
    #[must_use]
    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    /// Return the total number of nodes in the tree (both splits and leaves).
    #[must_use]
    pub fn n_nodes(&self) -> usize {
        self.root.n_nodes()
    }

    /// Return the number of leaf nodes.
    #[must_use]
    pub fn n_leaves(&self) -> usize {
        self.root.n_leaves()
    }

    /// Return the maximum depth of the tree. A single root leaf has depth 0.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.root.depth()
    }

    /// Return the distinct classes predicted by any leaf.
    #[must_use]
    pub fn leaf_predictions(&self) -> BTreeSet<usize> {
        let mut classes = BTreeSet::new();
        self.root.visit(&mut |node| {
            if let Node::Leaf { prediction, .. } = node {
                classes.insert(*prediction);
            }
        });
        classes
    }

    /// Render the tree as indented text, one node per line.
    ///
    /// Names are looked up by index; missing names fall back to `f{i}` for
    /// features and the bare class index for labels.
    #[must_use]
    pub fn render(&self, feature_names: &[String], class_names: &[String]) -> String {
        let mut out = String::new();
        render_node(&self.root, 0, feature_names, class_names, &mut out);
        out
    }

    /// Walk from the root to the leaf that `sample` falls into and return
    /// its prediction and class distribution.
    fn leaf_for(&self, sample: &[f64]) -> Result<(usize, &[f64]), RfError> {
        if sample.len() != self.n_features {
            return Err(InputError::PredictionFeatureMismatch {
                expected: self.n_features,
                got: sample.len(),
            }
            .into());
        }
        let mut node = &self.root;
        loop {
            match node {
                Node::Leaf {
                    prediction,
                    distribution,
                    ..
                } => return Ok((*prediction, distribution.as_slice())),
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                    ..
                } => {
                    let value = sample.get(feature.index()).ok_or(RfError::UnknownFeatureIndex {
                        feature: feature.index(),
                        n_features: sample.len(),
                    })?;
                    node = if *value <= *threshold { &**left } else { &**right };
                }
            }
        }
    }
}

fn render_node(
    node: &Node,
    indent: usize,
    feature_names: &[String],
    class_names: &[String],
    out: &mut String,
) {
    let pad = "  ".repeat(indent);
    match node {
        Node::Leaf {
            prediction,
            impurity,
            n_samples,
            ..
        } => {
            let label = class_names
                .get(*prediction)
                .cloned()
                .unwrap_or_else(|| prediction.to_string());
            let _ = writeln!(out, "{pad}leaf: {label} (n={n_samples}, impurity={impurity})");
        }
        Node::Split {
            feature,
            threshold,
            left,
            right,
            impurity,
            n_samples,
            ..
        } => {
            let name = feature_names
                .get(feature.index())
                .cloned()
                .unwrap_or_else(|| format!("f{feature}"));
            let _ = writeln!(
                out,
                "{pad}{name} <= {threshold:.4} (n={n_samples}, impurity={impurity})"
            );
            render_node(left, indent + 1, feature_names, class_names, out);
            render_node(right, indent + 1, feature_names, class_names, out);
        }
    }
}
