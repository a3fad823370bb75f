//! Per-feature standardization with training-set statistics.

use tracing::debug;

use crate::error::PrepError;

/// Fitted per-feature mean and scale.
///
/// Scale is the population standard deviation (divides by n, not n-1). A
/// zero-variance feature gets scale 1.0, so it transforms to 0.0.
#[derive(Debug, Clone, PartialEq)]
pub struct StandardScaler {
    means: Vec<f64>,
    scales: Vec<f64>,
}

impl StandardScaler {
    /// Compute means and scales over row-major `rows`.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`PrepError::EmptyInput`] | Zero rows |
    /// | [`PrepError::FeatureCountMismatch`] | A row is wider or narrower than the first |
    pub fn fit(rows: &[Vec<f64>]) -> Result<Self, PrepError> {
        let first = rows.first().ok_or(PrepError::EmptyInput)?;
        let n_features = first.len();
        check_widths(rows, n_features)?;

        let n = rows.len() as f64;
        let mut means = vec![0.0f64; n_features];
        for row in rows {
            for (m, &x) in means.iter_mut().zip(row) {
                *m += x;
            }
        }
        means.iter_mut().for_each(|m| *m /= n);

        let mut scales = vec![0.0f64; n_features];
        for row in rows {
            for ((s, &x), &m) in scales.iter_mut().zip(row).zip(&means) {
                *s += (x - m).powi(2);
            }
        }
        for s in &mut scales {
            let std = (*s / n).sqrt();
            *s = if std == 0.0 { 1.0 } else { std };
        }

        debug!(n_features, n_rows = rows.len(), "fitted standard scaler");
        Ok(Self { means, scales })
    }

    /// Apply `(x - mean) / scale` column-wise.
    ///
    /// # Errors
    ///
    /// Returns [`PrepError::FeatureCountMismatch`] if a row's width differs
    /// from the fitted width.
    #[must_use = "returns new rows; the input is unchanged"]
    pub fn transform(&self, rows: &[Vec<f64>]) -> Result<Vec<Vec<f64>>, PrepError> {
        check_widths(rows, self.means.len())?;
        Ok(rows
            .iter()
            .map(|row| {
                row.iter()
                    .zip(&self.means)
                    .zip(&self.scales)
                    .map(|((&x, &m), &s)| (x - m) / s)
                    .collect()
            })
            .collect())
    }

    /// Return the fitted means.
    pub fn means(&self) -> &[f64] {
        &self.means
    }

    /// Return the fitted scales.
    pub fn scales(&self) -> &[f64] {
        &self.scales
    }
}

fn check_widths(rows: &[Vec<f64>], expected: usize) -> Result<(), PrepError> {
    match rows.iter().position(|r| r.len() != expected) {
        Some(row_index) => Err(PrepError::FeatureCountMismatch {
            expected,
            got: rows[row_index].len(),
            row_index,
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::StandardScaler;
    use crate::PrepError;

    #[test]
    fn population_statistics() {
        let rows = vec![vec![1.0, 10.0], vec![2.0, 10.0], vec![3.0, 10.0], vec![4.0, 10.0]];
        let scaler = StandardScaler::fit(&rows).unwrap();
        assert_eq!(scaler.means(), &[2.5, 10.0]);
        // Population std of [1,2,3,4] is sqrt(1.25).
        assert!((scaler.scales()[0] - 1.25f64.sqrt()).abs() < 1e-12);
        assert_eq!(scaler.scales()[1], 1.0);
    }

    #[test]
    fn transformed_training_data_is_standard() {
        let rows: Vec<Vec<f64>> = (0..50).map(|i| vec![i as f64 * 0.3 - 2.0]).collect();
        let scaler = StandardScaler::fit(&rows).unwrap();
        let out = scaler.transform(&rows).unwrap();
        let n = out.len() as f64;
        let mean = out.iter().map(|r| r[0]).sum::<f64>() / n;
        let var = out.iter().map(|r| (r[0] - mean).powi(2)).sum::<f64>() / n;
        assert!(mean.abs() < 1e-12);
        assert!((var - 1.0).abs() < 1e-12);
    }

    #[test]
    fn constant_feature_maps_to_zero() {
        let scaler = StandardScaler::fit(&[vec![5.0], vec![5.0]]).unwrap();
        assert_eq!(scaler.transform(&[vec![5.0], vec![7.0]]).unwrap(), vec![vec![0.0], vec![2.0]]);
    }

    #[test]
    fn statistics_reused_on_new_data() {
        let scaler = StandardScaler::fit(&[vec![0.0], vec![2.0]]).unwrap();
        assert_eq!(scaler.transform(&[vec![4.0]]).unwrap(), vec![vec![3.0]]);
    }

    #[test]
    fn width_mismatch_is_an_error() {
        let scaler = StandardScaler::fit(&[vec![0.0, 1.0]]).unwrap();
        let err = scaler.transform(&[vec![0.0, 1.0], vec![2.0]]).unwrap_err();
        assert!(matches!(
            err,
            PrepError::FeatureCountMismatch { expected: 2, got: 1, row_index: 1 }
        ));
    }

    #[test]
    fn empty_fit_is_an_error() {
        assert!(matches!(StandardScaler::fit(&[]), Err(PrepError::EmptyInput)));
    }
}
