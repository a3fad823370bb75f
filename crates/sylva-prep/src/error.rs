//! Error types for sylva-prep.

use sylva_io::IoError;

/// Errors from fitting and applying preprocessing steps.
#[derive(Debug, thiserror::Error)]
pub enum PrepError {
    /// Returned when `fit` receives zero values or rows.
    #[error("cannot fit on empty input")]
    EmptyInput,

    /// Returned when the test fraction is not strictly between 0 and 1.
    #[error("test_fraction must be in (0.0, 1.0), got {fraction}")]
    InvalidTestFraction {
        /// The invalid fraction provided.
        fraction: f64,
    },

    /// Returned when a split would leave the train or the test side empty.
    #[error("{n_samples} samples cannot be split into {n_test} test rows and a non-empty train set")]
    TooFewSamples {
        /// Number of samples to split.
        n_samples: usize,
        /// Number of test rows the fraction asked for.
        n_test: usize,
    },

    /// Returned when an encoded label is too large to size a class table.
    #[error("label {label} at row {row_index} is out of range")]
    LabelOutOfRange {
        /// The offending label.
        label: usize,
        /// Zero-based index of its row.
        row_index: usize,
    },

    /// Returned when a label is encoded that was not seen at fit time.
    #[error("label \"{label}\" was not seen when the encoder was fitted")]
    UnknownLabel {
        /// The unseen label.
        label: String,
    },

    /// Returned when a row has a different width than the fitted scaler.
    #[error("row {row_index} has {got} features, expected {expected}")]
    FeatureCountMismatch {
        /// Width seen at fit time.
        expected: usize,
        /// Width of the offending row.
        got: usize,
        /// Zero-based index of the offending row.
        row_index: usize,
    },

    /// Returned when the target column is also listed as nominal.
    #[error("target column \"{column}\" cannot also be a feature")]
    TargetIsFeature {
        /// The target column name.
        column: String,
    },

    /// Returned when no feature column remains besides the target.
    #[error("table has no feature columns besides the target")]
    NoFeatureColumns,

    /// Wraps a table lookup or parse failure.
    #[error("table error: {0}")]
    Io(#[from] IoError),
}
