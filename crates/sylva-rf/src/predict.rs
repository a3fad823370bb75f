//! Prediction methods for the Random Forest ensemble.

use rayon::iter::{IntoParallelIterator, ParallelIterator};

use crate::error::{InputError, RfError};
use crate::forest::RandomForest;
use crate::tree::{DecisionTree, majority_class};

/// Class probability distribution from a prediction.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassDistribution {
    probs: Vec<f64>,
}

impl ClassDistribution {
    /// Create a new class distribution.
    pub(crate) fn new(probs: Vec<f64>) -> Self {
        Self { probs }
    }

    /// Return the most probable class; ties go to the lowest class index.
    #[must_use]
    pub fn predicted_class(&self) -> usize {
        self.probs
            .iter()
            .enumerate()
            .fold((0usize, f64::NEG_INFINITY), |best, (idx, &p)| {
                if p > best.1 { (idx, p) } else { best }
            })
            .0
    }

    /// Return the top-k classes sorted by descending probability.
    #[must_use]
    pub fn top_k(&self, k: usize) -> Vec<(usize, f64)> {
        let mut indexed: Vec<(usize, f64)> = self.probs.iter().copied().enumerate().collect();
        // Stable sort keeps lower class indices first among equal probabilities.
        indexed.sort_by(|a, b| b.1.total_cmp(&a.1));
        indexed.truncate(k);
        indexed
    }

    /// Return the probability distribution as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        &self.probs
    }
}

impl RandomForest {
    /// Predict the class label for a single sample by majority vote.
    ///
    /// Each tree casts one vote; ties go to the lowest class index.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`RfError::InvalidInput`] | `sample.len() != n_features` |
    /// | [`RfError::UnknownFeatureIndex`] | a tree references a feature beyond `sample.len()` |
    pub fn predict(&self, sample: &[f64]) -> Result<usize, RfError> {
        Ok(majority_class(&self.votes(sample)?))
    }

    /// Count the votes each class receives for a single sample.
    ///
    /// # Errors
    ///
    /// Same as [`RandomForest::predict`].
    pub fn votes(&self, sample: &[f64]) -> Result<Vec<usize>, RfError> {
        self.check_width(sample)?;
        let mut votes = vec![0usize; self.n_classes];
        for tree in &self.trees {
            votes[tree.predict(sample)?] += 1;
        }
        Ok(votes)
    }

    /// Return the averaged class probability distribution for a single sample.
    ///
    /// Averages the leaf distributions from all trees.
    ///
    /// # Errors
    ///
    /// Same as [`RandomForest::predict`].
    pub fn predict_proba(&self, sample: &[f64]) -> Result<ClassDistribution, RfError> {
        self.check_width(sample)?;

        let mut avg = vec![0.0f64; self.n_classes];
        for tree in &self.trees {
            let proba = tree.predict_proba(sample)?;
            for (i, p) in proba.iter().enumerate() {
                avg[i] += p;
            }
        }
        let n = self.trees.len() as f64;
        avg.iter_mut().for_each(|v| *v /= n);

        Ok(ClassDistribution::new(avg))
    }

    /// Predict class labels for a batch of samples in parallel.
    ///
    /// # Errors
    ///
    /// Returns an error if any sample fails [`RandomForest::predict`].
    pub fn predict_batch(&self, features: &[Vec<f64>]) -> Result<Vec<usize>, RfError> {
        features
            .into_par_iter()
            .map(|sample| self.predict(sample))
            .collect()
    }

    /// Return probability distributions for a batch of samples in parallel.
    ///
    /// # Errors
    ///
    /// Returns an error if any sample fails [`RandomForest::predict_proba`].
    pub fn predict_proba_batch(
        &self,
        features: &[Vec<f64>],
    ) -> Result<Vec<ClassDistribution>, RfError> {
        features
            .into_par_iter()
            .map(|sample| self.predict_proba(sample))
            .collect()
    }

    /// Borrow the member trees in training order.
    #[must_use]
    pub fn trees(&self) -> &[DecisionTree] {
        &self.trees
    }

    /// Return the number of features this forest was trained on.
    #[must_use]
    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// Return the number of classes.
    #[must_use]
    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    /// Return the number of trees in the ensemble.
    #[must_use]
    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    /// Return the feature names.
    #[must_use]
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    fn check_width(&self, sample: &[f64]) -> Result<(), InputError> {
        if sample.len() != self.n_features {
            return Err(InputError::PredictionFeatureMismatch {
                expected: self.n_features,
                got: sample.len(),
            });
        }
        Ok(())
    }
}
