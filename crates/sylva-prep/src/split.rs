//! Seeded train/test partitioning of row indices.

use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use tracing::debug;

use crate::error::PrepError;

/// Configuration for a train/test split.
///
/// # Defaults
///
/// | Parameter       | Default |
/// |-----------------|---------|
/// | `test_fraction` | 0.25    |
/// | `seed`          | 0       |
#[derive(Debug, Clone, PartialEq)]
pub struct TrainTestConfig {
    test_fraction: f64,
    seed: u64,
}

impl Default for TrainTestConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl TrainTestConfig {
    /// Create a config with the defaults above.
    #[must_use]
    pub fn new() -> Self {
        Self {
            test_fraction: 0.25,
            seed: 0,
        }
    }

    /// Set the fraction of rows held out for testing.
    #[must_use]
    pub fn with_test_fraction(mut self, test_fraction: f64) -> Self {
        self.test_fraction = test_fraction;
        self
    }

    /// Set the shuffle seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Return the test fraction.
    #[must_use]
    pub fn test_fraction(&self) -> f64 {
        self.test_fraction
    }

    /// Return the shuffle seed.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Number of test rows for `n_samples`: `ceil(n_samples * test_fraction)`.
    fn n_test(&self, n_samples: usize) -> Result<usize, PrepError> {
        if !(self.test_fraction > 0.0 && self.test_fraction < 1.0) {
            return Err(PrepError::InvalidTestFraction {
                fraction: self.test_fraction,
            });
        }
        let n_test = ((n_samples as f64) * self.test_fraction).ceil() as usize;
        if n_test == 0 || n_test >= n_samples {
            return Err(PrepError::TooFewSamples { n_samples, n_test });
        }
        Ok(n_test)
    }
}

/// Disjoint train and test row indices covering `0..n_samples`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainTestSplit {
    /// Row indices of the training set.
    pub train: Vec<usize>,
    /// Row indices of the test set.
    pub test: Vec<usize>,
}

/// Shuffle `0..n_samples` and take the first `ceil(n·f)` as test.
///
/// The shuffle uses `ChaCha8Rng::seed_from_u64(config.seed())`, so the same
/// seed and `n_samples` always give the same split.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`PrepError::InvalidTestFraction`] | Fraction outside (0, 1) |
/// | [`PrepError::TooFewSamples`] | Train or test side would be empty |
pub fn train_test_split(
    n_samples: usize,
    config: &TrainTestConfig,
) -> Result<TrainTestSplit, PrepError> {
    let n_test = config.n_test(n_samples)?;
    let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
    let mut order: Vec<usize> = (0..n_samples).collect();
    order.shuffle(&mut rng);
    let train = order.split_off(n_test);
    debug!(n_train = train.len(), n_test, "split rows");
    Ok(TrainTestSplit { train, test: order })
}

/// Split so each class keeps roughly its overall share in the test set.
///
/// The total test size is still `ceil(n·f)`. Each class gets
/// `floor(n_c·f)` test rows, and the rows left over go one each to the
/// classes with the largest fractional remainder (lower class first on
/// ties). Within a class, rows are chosen by a seeded shuffle; the final
/// train and test lists are shuffled again.
///
/// # Errors
///
/// Same as [`train_test_split`], plus [`PrepError::EmptyInput`] for zero
/// labels and [`PrepError::LabelOutOfRange`] for a label of `usize::MAX`.
pub fn stratified_train_test_split(
    labels: &[usize],
    config: &TrainTestConfig,
) -> Result<TrainTestSplit, PrepError> {
    if labels.is_empty() {
        return Err(PrepError::EmptyInput);
    }
    let n_samples = labels.len();
    let n_test = config.n_test(n_samples)?;
    let mut rng = ChaCha8Rng::seed_from_u64(config.seed);

    let (row_index, &max_label) = labels
        .iter()
        .enumerate()
        .max_by_key(|&(_, label)| *label)
        .ok_or(PrepError::EmptyInput)?;
    let n_classes = max_label
        .checked_add(1)
        .ok_or(PrepError::LabelOutOfRange {
            label: max_label,
            row_index,
        })?;
    let mut class_indices: Vec<Vec<usize>> = vec![vec![]; n_classes];
    for (i, &label) in labels.iter().enumerate() {
        class_indices[label].push(i);
    }

    let exact: Vec<f64> = class_indices
        .iter()
        .map(|idx| idx.len() as f64 * config.test_fraction)
        .collect();
    let mut quota: Vec<usize> = exact.iter().map(|q| q.floor() as usize).collect();
    let mut by_remainder: Vec<usize> = (0..n_classes).collect();
    by_remainder.sort_by(|&a, &b| {
        let ra = exact[a] - exact[a].floor();
        let rb = exact[b] - exact[b].floor();
        rb.total_cmp(&ra)
    });
    let mut missing = n_test.saturating_sub(quota.iter().sum());
    for class in by_remainder {
        if missing == 0 {
            break;
        }
        if quota[class] < class_indices[class].len() {
            quota[class] += 1;
            missing -= 1;
        }
    }

    let mut train = Vec::with_capacity(n_samples - n_test);
    let mut test = Vec::with_capacity(n_test);
    for (indices, &take) in class_indices.iter_mut().zip(&quota) {
        indices.shuffle(&mut rng);
        test.extend_from_slice(&indices[..take]);
        train.extend_from_slice(&indices[take..]);
    }
    train.shuffle(&mut rng);
    test.shuffle(&mut rng);

    debug!(n_train = train.len(), n_test = test.len(), n_classes, "stratified split rows");
    Ok(TrainTestSplit { train, test })
}
