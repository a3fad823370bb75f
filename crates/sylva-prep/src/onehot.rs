//! One-hot encoding of a nominal column.

use tracing::debug;

use crate::error::PrepError;

/// Fitted one-hot encoding for one nominal column.
///
/// Categories are the distinct fitted values in sorted order. Each value maps
/// to one indicator per category; a value not seen at fit time maps to all
/// zeros.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OneHotEncoder {
    column: String,
    categories: Vec<String>,
}

impl OneHotEncoder {
    /// Record the sorted distinct values of the column.
    ///
    /// # Errors
    ///
    /// Returns [`PrepError::EmptyInput`] if `values` is empty.
    pub fn fit<S: AsRef<str>>(column: &str, values: &[S]) -> Result<Self, PrepError> {
        if values.is_empty() {
            return Err(PrepError::EmptyInput);
        }
        let mut categories: Vec<String> = values.iter().map(|v| v.as_ref().to_string()).collect();
        categories.sort();
        categories.dedup();
        debug!(column, n_categories = categories.len(), "fitted one-hot encoder");
        Ok(Self {
            column: column.to_string(),
            categories,
        })
    }

    /// Encode a single value as indicator columns.
    #[must_use]
    pub fn encode(&self, value: &str) -> Vec<f64> {
        let mut indicators = vec![0.0; self.categories.len()];
        if let Ok(pos) = self.categories.binary_search_by(|c| c.as_str().cmp(value)) {
            indicators[pos] = 1.0;
        }
        indicators
    }

    /// Encode every value, one indicator row per value.
    #[must_use]
    pub fn transform<S: AsRef<str>>(&self, values: &[S]) -> Vec<Vec<f64>> {
        values.iter().map(|v| self.encode(v.as_ref())).collect()
    }

    /// Return output column names as `{column}_{category}`.
    #[must_use]
    pub fn feature_names(&self) -> Vec<String> {
        self.categories
            .iter()
            .map(|c| format!("{}_{c}", self.column))
            .collect()
    }

    /// Return the source column name.
    pub fn column(&self) -> &str {
        &self.column
    }

    /// Return the fitted categories in output order.
    pub fn categories(&self) -> &[String] {
        &self.categories
    }
}
