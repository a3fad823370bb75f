//! String label to class index mapping.

use crate::error::PrepError;

/// Maps string labels to dense class indices `0..n_classes`.
///
/// Classes are the distinct fitted labels in sorted order, so index 0 is the
/// lexicographically first label. That order is what "lowest class index"
/// means for every tie-break downstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelEncoder {
    classes: Vec<String>,
}

impl LabelEncoder {
    /// Record the sorted distinct labels of `labels`.
    ///
    /// # Errors
    ///
    /// Returns [`PrepError::EmptyInput`] if `labels` is empty.
    pub fn fit<S: AsRef<str>>(labels: &[S]) -> Result<Self, PrepError> {
        if labels.is_empty() {
            return Err(PrepError::EmptyInput);
        }
        let mut classes: Vec<String> = labels.iter().map(|s| s.as_ref().to_string()).collect();
        classes.sort();
        classes.dedup();
        Ok(Self { classes })
    }

    /// Return the class index of `label`.
    ///
    /// # Errors
    ///
    /// Returns [`PrepError::UnknownLabel`] if `label` was not fitted.
    pub fn encode(&self, label: &str) -> Result<usize, PrepError> {
        self.classes
            .binary_search_by(|c| c.as_str().cmp(label))
            .map_err(|_| PrepError::UnknownLabel {
                label: label.to_string(),
            })
    }

    /// Encode every label in order.
    ///
    /// # Errors
    ///
    /// Returns [`PrepError::UnknownLabel`] for the first unfitted label.
    pub fn transform<S: AsRef<str>>(&self, labels: &[S]) -> Result<Vec<usize>, PrepError> {
        labels.iter().map(|l| self.encode(l.as_ref())).collect()
    }

    /// Return the label for a class index, if it exists.
    pub fn decode(&self, class: usize) -> Option<&str> {
        self.classes.get(class).map(String::as_str)
    }

    /// Return the fitted labels in class-index order.
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    /// Return the number of classes.
    pub fn n_classes(&self) -> usize {
        self.classes.len()
    }
}
