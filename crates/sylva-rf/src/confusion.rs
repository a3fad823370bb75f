//! Truth-by-prediction counts and the per-class scores derived from them.

use std::fmt;

use crate::error::{InputError, RfError};

/// Counts of `(true class, predicted class)` pairs.
///
/// `rows()[t][p]` is how many samples of class `t` were predicted as `p`.
/// A class is *present* when it occurs on either side at least once.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ConfusionMatrix {
    rows: Vec<Vec<usize>>,
}

/// Precision, recall and F1 for one class. Each is 0.0 when its
/// denominator is zero.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct ClassMetrics {
    pub class: usize,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    /// Samples whose true class is `class`.
    pub support: usize,
    /// Samples predicted as `class`.
    pub predicted: usize,
}

impl ClassMetrics {
    /// Whether the class occurs as a true or a predicted label.
    #[must_use]
    pub fn is_present(&self) -> bool {
        self.support > 0 || self.predicted > 0
    }
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 { 0.0 } else { num as f64 / den as f64 }
}

impl ConfusionMatrix {
    /// Tally paired labels into a square matrix of at least `n_classes`
    /// classes, grown to cover the largest label on either side.
    ///
    /// # Errors
    ///
    /// [`RfError::InvalidInput`] for empty or unequal-length slices, or a
    /// label of `usize::MAX`.
    pub fn from_labels(
        true_labels: &[usize],
        predicted: &[usize],
        n_classes: usize,
    ) -> Result<Self, RfError> {
        if true_labels.is_empty() {
            return Err(InputError::EmptyDataset.into());
        }
        if true_labels.len() != predicted.len() {
            return Err(InputError::LabelCountMismatch {
                n_samples: true_labels.len(),
                n_labels: predicted.len(),
            }
            .into());
        }
        let mut width = n_classes;
        for (sample_index, (&t, &p)) in true_labels.iter().zip(predicted).enumerate() {
            let label = t.max(p);
            let needed = label
                .checked_add(1)
                .ok_or(InputError::LabelOutOfRange {
                    label,
                    sample_index,
                })?;
            width = width.max(needed);
        }

        let mut rows = vec![vec![0usize; width]; width];
        for (&t, &p) in true_labels.iter().zip(predicted) {
            rows[t][p] += 1;
        }
        Ok(Self { rows })
    }

    #[must_use]
    pub fn n_classes(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn rows(&self) -> &[Vec<usize>] {
        &self.rows
    }

    /// Number of samples tallied.
    #[must_use]
    pub fn total(&self) -> usize {
        self.rows.iter().flatten().sum()
    }

    /// Trace over total.
    #[must_use]
    pub fn accuracy(&self) -> f64 {
        let correct = (0..self.n_classes()).map(|c| self.rows[c][c]).sum();
        ratio(correct, self.total())
    }

    /// Scores for every class index, present or not.
    #[must_use]
    pub fn class_metrics(&self) -> Vec<ClassMetrics> {
        let mut predicted = vec![0usize; self.n_classes()];
        for row in &self.rows {
            for (col, &count) in predicted.iter_mut().zip(row) {
                *col += count;
            }
        }

        self.rows
            .iter()
            .zip(predicted)
            .enumerate()
            .map(|(class, (row, predicted))| {
                let hits = row[class];
                let support: usize = row.iter().sum();
                let precision = ratio(hits, predicted);
                let recall = ratio(hits, support);
                let f1 = if precision + recall == 0.0 {
                    0.0
                } else {
                    2.0 * precision * recall / (precision + recall)
                };
                ClassMetrics {
                    class,
                    precision,
                    recall,
                    f1,
                    support,
                    predicted,
                }
            })
            .collect()
    }

    /// Unweighted mean F1 over the present classes.
    #[must_use]
    pub fn macro_f1(&self) -> f64 {
        let (sum, count) = self
            .class_metrics()
            .iter()
            .filter(|m| m.is_present())
            .fold((0.0, 0usize), |(sum, count), m| (sum + m.f1, count + 1));
        if count == 0 { 0.0 } else { sum / count as f64 }
    }
}

impl fmt::Display for ConfusionMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cell = self
            .total()
            .to_string()
            .len()
            .max(self.n_classes().to_string().len())
            .max(1);
        write!(f, "{:>w$} |", "t\\p", w = cell.max(3))?;
        for p in 0..self.n_classes() {
            write!(f, " {p:>cell$}")?;
        }
        writeln!(f)?;
        for (t, row) in self.rows.iter().enumerate() {
            write!(f, "{t:>w$} |", w = cell.max(3))?;
            for count in row {
                write!(f, " {count:>cell$}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diagonal_matrix_scores_one() {
        let labels = vec![0, 0, 1, 1, 2, 2];
        let cm = ConfusionMatrix::from_labels(&labels, &labels, 3).unwrap();
        assert!((cm.accuracy() - 1.0).abs() < f64::EPSILON);
        assert!((cm.macro_f1() - 1.0).abs() < f64::EPSILON);
        assert!(cm.class_metrics().iter().all(|m| (m.f1 - 1.0).abs() < f64::EPSILON));
    }

    #[test]
    fn cyclic_errors() {
        // Each class loses one sample to the next class.
        let truth = vec![0, 0, 0, 1, 1, 1, 2, 2, 2];
        let pred = vec![0, 0, 1, 1, 1, 2, 2, 2, 0];
        let cm = ConfusionMatrix::from_labels(&truth, &pred, 3).unwrap();
        assert_eq!(cm.rows()[0], vec![2, 1, 0]);
        assert_eq!(cm.total(), 9);
        for m in cm.class_metrics() {
            assert!((m.precision - 2.0 / 3.0).abs() < 1e-12);
            assert!((m.recall - 2.0 / 3.0).abs() < 1e-12);
            assert_eq!((m.support, m.predicted), (3, 3));
        }
        assert!((cm.accuracy() - 6.0 / 9.0).abs() < 1e-12);
    }

    #[test]
    fn rejects_bad_input() {
        assert!(matches!(
            ConfusionMatrix::from_labels(&[], &[], 3),
            Err(RfError::InvalidInput(InputError::EmptyDataset))
        ));
        assert!(matches!(
            ConfusionMatrix::from_labels(&[0, 1], &[0], 2),
            Err(RfError::InvalidInput(InputError::LabelCountMismatch {
                n_samples: 2,
                n_labels: 1
            }))
        ));
        assert!(matches!(
            ConfusionMatrix::from_labels(&[0, 1], &[0, usize::MAX], 2),
            Err(RfError::InvalidInput(InputError::LabelOutOfRange { sample_index: 1, .. }))
        ));
    }

    #[test]
    fn grows_to_largest_label() {
        let cm = ConfusionMatrix::from_labels(&[0, 3], &[1, 3], 2).unwrap();
        assert_eq!(cm.n_classes(), 4);
        assert_eq!(cm.rows()[3][3], 1);
    }

    #[test]
    fn macro_f1_ignores_absent_classes() {
        // Class 2 never occurs.
        let cm = ConfusionMatrix::from_labels(&[0, 0, 1, 1], &[0, 1, 1, 1], 3).unwrap();
        // Class 0: P=1, R=0.5, F1=2/3. Class 1: P=2/3, R=1, F1=0.8.
        assert!((cm.macro_f1() - (2.0 / 3.0 + 0.8) / 2.0).abs() < 1e-12);
        assert!(!cm.class_metrics()[2].is_present());
    }

    #[test]
    fn predicted_only_class_counts_toward_macro_f1() {
        // Class 1 is never true but is predicted once; its F1 of 0 is averaged in.
        let cm = ConfusionMatrix::from_labels(&[0, 0], &[0, 1], 2).unwrap();
        let metrics = cm.class_metrics();
        assert!(metrics[1].is_present());
        assert_eq!(metrics[1].support, 0);
        // Class 0: P=1, R=0.5, F1=2/3.
        assert!((cm.macro_f1() - (2.0 / 3.0) / 2.0).abs() < 1e-12);
    }

    #[test]
    fn display_has_one_line_per_class_plus_header() {
        let cm = ConfusionMatrix::from_labels(&[0, 1, 1], &[0, 1, 0], 2).unwrap();
        let text = cm.to_string();
        assert_eq!(text.lines().count(), 3);
        assert!(text.starts_with("t\\p |"), "{text}");
    }
}
