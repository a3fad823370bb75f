use std::fmt;

/// Zero-based feature column index.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash,
    serde::Serialize, serde::Deserialize,
)]
pub struct FeatureIndex(usize);

impl FeatureIndex {
    /// Create a new feature index from a zero-based column position.
    #[must_use]
    pub fn new(index: usize) -> Self {
        Self(index)
    }

    /// Return the zero-based feature column index.
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for FeatureIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Criterion-agnostic impurity value (Gini or Entropy).
#[derive(
    Debug, Clone, Copy, PartialEq, PartialOrd,
    serde::Serialize, serde::Deserialize,
)]
pub struct Impurity(f64);

impl Impurity {
    /// Create a new impurity value.
    pub(crate) fn new(value: f64) -> Self {
        Self(value)
    }

    /// Return the raw impurity value.
    #[must_use]
    pub fn value(self) -> f64 {
        self.0
    }
}

impl fmt::Display for Impurity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6}", self.0)
    }
}

/// A node in a decision tree.
///
/// Interior nodes own their two children; a tree is a single owned value
/// rooted at one `Node`.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum Node {
    /// An interior split node.
    Split {
        /// Feature used for the split.
        feature: FeatureIndex,
        /// Threshold value: samples with feature <= threshold go left.
        threshold: f64,
        /// Subtree for samples with `feature <= threshold`.
        left: Box<Node>,
        /// Subtree for samples with `feature > threshold`.
        right: Box<Node>,
        /// Impurity at this node before splitting.
        impurity: Impurity,
        /// Number of training samples that reached this node.
        n_samples: usize,
        /// Weighted decrease in impurity from this split.
        impurity_decrease: f64,
    },
    /// A terminal leaf node.
    Leaf {
        /// Predicted class (majority of the training samples in this leaf).
        prediction: usize,
        /// Normalized class probability distribution.
        distribution: Vec<f64>,
        /// Impurity at this leaf.
        impurity: Impurity,
        /// Number of training samples in this leaf.
        n_samples: usize,
    },
}

impl Node {
    /// Return the impurity at this node (before splitting for interior nodes).
    #[must_use]
    pub fn impurity(&self) -> Impurity {
        match self {
            Node::Split { impurity, .. } | Node::Leaf { impurity, .. } => *impurity,
        }
    }

    /// Return the number of training samples that reached this node.
    #[must_use]
    pub fn n_samples(&self) -> usize {
        match self {
            Node::Split { n_samples, .. } | Node::Leaf { n_samples, .. } => *n_samples,
        }
    }

    /// Return `true` if this node is a leaf.
    #[must_use]
    pub fn is_leaf(&self) -> bool {
        matches!(self, Node::Leaf { .. })
    }

    /// Number of nodes in the subtree rooted here, this node included.
    #[must_use]
    pub fn n_nodes(&self) -> usize {
        match self {
            Node::Leaf { .. } => 1,
            Node::Split { left, right, .. } => 1 + left.n_nodes() + right.n_nodes(),
        }
    }

    /// Number of leaves in the subtree rooted here.
    #[must_use]
    pub fn n_leaves(&self) -> usize {
        match self {
            Node::Leaf { .. } => 1,
            Node::Split { left, right, .. } => left.n_leaves() + right.n_leaves(),
        }
    }

    /// Length of the longest root-to-leaf path below this node. A leaf has depth 0.
    #[must_use]
    pub fn depth(&self) -> usize {
        match self {
            Node::Leaf { .. } => 0,
            Node::Split { left, right, .. } => 1 + left.depth().max(right.depth()),
        }
    }

    /// Visit every node of the subtree in pre-order (node, left, right).
    pub fn visit<'a>(&'a self, f: &mut impl FnMut(&'a Node)) {
        f(self);
        if let Node::Split { left, right, .. } = self {
            left.visit(f);
            right.visit(f);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{FeatureIndex, Impurity, Node};

    // --- FeatureIndex ---

    #[test]
    fn feature_index_roundtrip() {
        let fi = FeatureIndex::new(7);
        assert_eq!(fi.index(), 7);
    }

    #[test]
    fn feature_index_display() {
        let fi = FeatureIndex::new(3);
        assert_eq!(format!("{fi}"), "3");
    }

    #[test]
    fn feature_index_ordering() {
        assert!(FeatureIndex::new(1) < FeatureIndex::new(5));
    }

    // --- Impurity ---

    #[test]
    fn impurity_display() {
        let imp = Impurity::new(0.333333);
        assert_eq!(format!("{imp}"), "0.333333");
    }

    #[test]
    fn impurity_ordering() {
        assert!(Impurity::new(0.1) < Impurity::new(0.5));
    }

    // --- Node ---

    fn leaf(prediction: usize, n_samples: usize) -> Node {
        let mut distribution = vec![0.0; 2];
        distribution[prediction] = 1.0;
        Node::Leaf {
            prediction,
            distribution,
            impurity: Impurity::new(0.0),
            n_samples,
        }
    }

    fn stump() -> Node {
        Node::Split {
            feature: FeatureIndex::new(0),
            threshold: 0.5,
            left: Box::new(leaf(0, 2)),
            right: Box::new(leaf(1, 2)),
            impurity: Impurity::new(0.5),
            n_samples: 4,
            impurity_decrease: 2.0,
        }
    }

    #[test]
    fn leaf_shape() {
        let node = leaf(1, 10);
        assert!(node.is_leaf());
        assert_eq!(node.n_samples(), 10);
        assert_eq!(node.n_nodes(), 1);
        assert_eq!(node.depth(), 0);
    }

    #[test]
    fn stump_shape() {
        let node = stump();
        assert!(!node.is_leaf());
        assert_eq!(node.n_samples(), 4);
        assert_eq!(node.n_nodes(), 3);
        assert_eq!(node.n_leaves(), 2);
        assert_eq!(node.depth(), 1);
        assert!((node.impurity().value() - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn nested_depth_takes_longest_branch() {
        let node = Node::Split {
            feature: FeatureIndex::new(1),
            threshold: 2.0,
            left: Box::new(stump()),
            right: Box::new(leaf(0, 3)),
            impurity: Impurity::new(0.4),
            n_samples: 7,
            impurity_decrease: 1.0,
        };
        assert_eq!(node.depth(), 2);
        assert_eq!(node.n_leaves(), 3);
    }

    #[test]
    fn visit_is_preorder() {
        let mut seen = Vec::new();
        stump().visit(&mut |n| seen.push(n.n_samples()));
        assert_eq!(seen, vec![4, 2, 2]);
    }
}
