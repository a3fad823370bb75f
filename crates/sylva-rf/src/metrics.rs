//! Scalar classification metrics over label slices.

use crate::confusion::ConfusionMatrix;
use crate::error::{InputError, RfError};

/// Fraction of positions where `y_pred` equals `y_true`.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`RfError::InvalidInput`] | Empty input, or the slices differ in length |
pub fn accuracy(y_true: &[usize], y_pred: &[usize]) -> Result<f64, RfError> {
    check_pair(y_true, y_pred)?;
    let matches = y_true.iter().zip(y_pred).filter(|(t, p)| t == p).count();
    Ok(matches as f64 / y_true.len() as f64)
}

/// Unweighted mean of per-class F1 over every class in `y_true ∪ y_pred`.
///
/// Precision, recall and F1 each fall back to 0.0 when their denominator
/// is zero.
///
/// # Errors
///
/// Same as [`accuracy`].
pub fn macro_f1(y_true: &[usize], y_pred: &[usize]) -> Result<f64, RfError> {
    check_pair(y_true, y_pred)?;
    Ok(ConfusionMatrix::from_labels(y_true, y_pred, 0)?.macro_f1())
}

fn check_pair(y_true: &[usize], y_pred: &[usize]) -> Result<(), InputError> {
    if y_true.is_empty() {
        return Err(InputError::EmptyDataset);
    }
    if y_true.len() != y_pred.len() {
        return Err(InputError::LabelCountMismatch {
            n_samples: y_true.len(),
            n_labels: y_pred.len(),
        });
    }
    Ok(())
}
