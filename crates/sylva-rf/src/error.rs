/// Errors from decision tree and random forest operations.
#[derive(Debug, thiserror::Error)]
pub enum RfError {
    /// Returned when the training or prediction data is malformed.
    #[error("invalid input: {0}")]
    InvalidInput(#[from] InputError),

    /// Returned when a split references a feature outside the input vector.
    ///
    /// Trees built by this crate never produce such a split; this guards
    /// traversal of hand-assembled or corrupted trees.
    #[error("split references feature {feature}, but vectors have {n_features} features")]
    UnknownFeatureIndex {
        /// The feature index stored in the split node.
        feature: usize,
        /// The number of features in the vector being traversed.
        n_features: usize,
    },

    /// Returned when n_trees is zero.
    #[error("n_trees must be at least 1, got {n_trees}")]
    InvalidTreeCount {
        /// The invalid n_trees value provided.
        n_trees: usize,
    },

    /// Returned when max_depth is zero.
    #[error("max_depth must be at least 1, got {max_depth}")]
    InvalidMaxDepth {
        /// The invalid max_depth value provided.
        max_depth: usize,
    },

    /// Returned when min_samples_split is less than 2.
    #[error("min_samples_split must be at least 2, got {min_samples_split}")]
    InvalidMinSamplesSplit {
        /// The invalid min_samples_split value provided.
        min_samples_split: usize,
    },

    /// Returned when min_samples_leaf is zero.
    #[error("min_samples_leaf must be at least 1, got {min_samples_leaf}")]
    InvalidMinSamplesLeaf {
        /// The invalid min_samples_leaf value provided.
        min_samples_leaf: usize,
    },

    /// Returned when max_features resolves to 0 or exceeds n_features.
    #[error("max_features resolved to {max_features}, but must be in [1, {n_features}]")]
    InvalidMaxFeatures {
        /// The resolved max_features value.
        max_features: usize,
        /// The number of features in the dataset.
        n_features: usize,
    },

    /// Returned when bootstrap_fraction is not in (0.0, 1.0].
    #[error("bootstrap_fraction must be in (0.0, 1.0], got {fraction}")]
    InvalidBootstrapFraction {
        /// The invalid bootstrap_fraction value provided.
        fraction: f64,
    },

    /// Returned when OOB evaluation fails (no sample has any OOB tree).
    #[error("OOB evaluation failed: {reason}")]
    OobEvaluationFailed {
        /// Human-readable description of why OOB evaluation failed.
        reason: String,
    },
}

/// Ways in which a dataset or prediction input can be malformed.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InputError {
    /// Zero samples were supplied.
    #[error("dataset has zero samples")]
    EmptyDataset,

    /// Samples have zero feature columns.
    #[error("dataset has zero feature columns")]
    ZeroFeatures,

    /// The number of label entries differs from the number of feature rows.
    #[error("{n_samples} feature rows but {n_labels} labels")]
    LabelCountMismatch {
        /// The number of feature rows.
        n_samples: usize,
        /// The number of labels.
        n_labels: usize,
    },

    /// A training sample has a different number of features than the first one.
    #[error("sample {sample_index} has {got} features, expected {expected}")]
    FeatureCountMismatch {
        /// The expected number of features.
        expected: usize,
        /// The actual number of features in the sample.
        got: usize,
        /// The zero-based index of the offending sample.
        sample_index: usize,
    },

    /// A training value is NaN or infinite.
    #[error("non-finite value at sample {sample_index}, feature {feature_index}")]
    NonFiniteValue {
        /// The zero-based index of the offending sample.
        sample_index: usize,
        /// The zero-based index of the offending feature column.
        feature_index: usize,
    },

    /// The number of feature names differs from the number of feature columns.
    #[error("{got} feature names supplied for {expected} feature columns")]
    FeatureNameCountMismatch {
        /// The number of feature columns.
        expected: usize,
        /// The number of names supplied.
        got: usize,
    },

    /// A label is too large to size a class-count table from.
    #[error("label {label} at sample {sample_index} leaves no room for a class count")]
    LabelOutOfRange {
        /// The offending label.
        label: usize,
        /// The zero-based index of the sample carrying it.
        sample_index: usize,
    },

    /// A prediction input has a different number of features than the model.
    #[error("prediction input has {got} features, expected {expected}")]
    PredictionFeatureMismatch {
        /// The number of features the model was trained on.
        expected: usize,
        /// The actual number of features in the prediction input.
        got: usize,
    },
}

/// Validate a row-major training set and return `(n_samples, n_features)`.
pub(crate) fn validate_training_data(
    features: &[Vec<f64>],
    labels: &[usize],
) -> Result<(usize, usize), InputError> {
    if features.is_empty() {
        return Err(InputError::EmptyDataset);
    }
    let n_samples = features.len();
    if labels.len() != n_samples {
        return Err(InputError::LabelCountMismatch {
            n_samples,
            n_labels: labels.len(),
        });
    }

    let n_features = features[0].len();
    if n_features == 0 {
        return Err(InputError::ZeroFeatures);
    }

    for (sample_index, row) in features.iter().enumerate() {
        if row.len() != n_features {
            return Err(InputError::FeatureCountMismatch {
                expected: n_features,
                got: row.len(),
                sample_index,
            });
        }
        if let Some(feature_index) = row.iter().position(|v| !v.is_finite()) {
            return Err(InputError::NonFiniteValue {
                sample_index,
                feature_index,
            });
        }
    }

    Ok((n_samples, n_features))
}

/// Number of classes implied by zero-based `labels`: the largest label plus
/// one, or 1 for no labels.
pub(crate) fn class_count(labels: &[usize]) -> Result<usize, InputError> {
    let Some((sample_index, &label)) = labels.iter().enumerate().max_by_key(|&(_, l)| *l) else {
        return Ok(1);
    };
    label
        .checked_add(1)
        .ok_or(InputError::LabelOutOfRange {
            label,
            sample_index,
        })
}
