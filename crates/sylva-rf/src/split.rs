use std::cmp::Ordering;

use rand::Rng;
use rand::seq::SliceRandom;

use crate::node::{FeatureIndex, Impurity};

/// Criterion for measuring the quality of a split.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum SplitCriterion {
    /// Gini impurity: 1 - Σ(p_i²)
    Gini,
    /// Information entropy: -Σ(p_i · ln(p_i))
    Entropy,
}

impl SplitCriterion {
    /// Compute the impurity of a node from its class counts.
    ///
    /// Returns [`Impurity::new(0.0)`] when `n_samples` is zero (pure node).
    ///
    /// For `Gini`: `1 - Σ(p_i²)` where `p_i = count_i / n_samples`.
    /// For `Entropy`: `-Σ(p_i · ln(p_i))` summed only over classes where `p_i > 0`.
    #[must_use]
    pub fn impurity(&self, class_counts: &[usize], n_samples: usize) -> Impurity {
        if n_samples == 0 {
            return Impurity::new(0.0);
        }
        let n = n_samples as f64;
        let value = match self {
            SplitCriterion::Gini => {
                let sum_sq: f64 = class_counts
                    .iter()
                    .map(|&c| {
                        let p = c as f64 / n;
                        p * p
                    })
                    .sum();
                1.0 - sum_sq
            }
            SplitCriterion::Entropy => {
                -class_counts
                    .iter()
                    .filter(|&&c| c > 0)
                    .map(|&c| {
                        let p = c as f64 / n;
                        p * p.ln()
                    })
                    .sum::<f64>()
            }
        };
        Impurity::new(value)
    }
}

/// Result of finding the best split for a node.
#[derive(Debug, Clone)]
pub(crate) struct SplitResult {
    /// Feature used for the split.
    pub(crate) feature: FeatureIndex,
    /// Threshold value.
    pub(crate) threshold: f64,
    /// Weighted impurity decrease from this split (MDI formula).
    pub(crate) impurity_decrease: f64,
    /// Sample indices going to the left child.
    pub(crate) left_indices: Vec<usize>,
    /// Sample indices going to the right child.
    pub(crate) right_indices: Vec<usize>,
}

/// Relative tolerance under which two entropy scores count as tied.
const SCORE_RTOL: f64 = 1e-12;

/// Weighted child impurity `n_left · I(left) + n_right · I(right)` of one
/// candidate split.
///
/// For Gini that equals `n - q` with `q = Σl²/n_left + Σr²/n_right`, and
/// `exact` holds `q` as the integer fraction `(num, den)`, so equal splits
/// compare equal whatever the float rounding.
#[derive(Debug, Clone, Copy)]
struct Score {
    value: f64,
    exact: Option<(u128, u128)>,
}

impl Score {
    fn new(
        criterion: &SplitCriterion,
        left_counts: &[usize],
        right_counts: &[usize],
        n_left: usize,
        n_right: usize,
    ) -> Self {
        let value = (n_left as f64) * criterion.impurity(left_counts, n_left).value()
            + (n_right as f64) * criterion.impurity(right_counts, n_right).value();
        let exact = match criterion {
            SplitCriterion::Gini => gini_quality(left_counts, right_counts, n_left, n_right),
            SplitCriterion::Entropy => None,
        };
        Self { value, exact }
    }

    /// `Less` when `self` is the purer split.
    fn compare(&self, other: &Score) -> Ordering {
        if let (Some((a_num, a_den)), Some((b_num, b_den))) = (self.exact, other.exact)
            && let (Some(lhs), Some(rhs)) = (b_num.checked_mul(a_den), a_num.checked_mul(b_den))
        {
            return lhs.cmp(&rhs);
        }
        let tolerance = SCORE_RTOL * self.value.abs().max(other.value.abs()).max(1.0);
        if (self.value - other.value).abs() <= tolerance {
            Ordering::Equal
        } else {
            self.value.total_cmp(&other.value)
        }
    }
}

/// `Σl²/n_left + Σr²/n_right` as `(Σl²·n_right + Σr²·n_left, n_left·n_right)`,
/// or `None` if it does not fit in `u128`.
fn gini_quality(
    left_counts: &[usize],
    right_counts: &[usize],
    n_left: usize,
    n_right: usize,
) -> Option<(u128, u128)> {
    let sum_sq = |counts: &[usize]| -> Option<u128> {
        counts
            .iter()
            .try_fold(0u128, |acc, &c| acc.checked_add((c as u128).checked_mul(c as u128)?))
    };
    let (n_left, n_right) = (n_left as u128, n_right as u128);
    let num = sum_sq(left_counts)?
        .checked_mul(n_right)?
        .checked_add(sum_sq(right_counts)?.checked_mul(n_left)?)?;
    Some((num, n_left.checked_mul(n_right)?))
}

/// Order in which feature columns are visited for one split.
///
/// With `max_features >= n_features` this is `0..n_features` and `rng` is
/// left untouched. Otherwise it is a fresh random permutation, of which the
/// splitter examines the first `max_features` non-constant columns.
pub(crate) fn feature_order(
    n_features: usize,
    max_features: usize,
    rng: &mut impl Rng,
) -> Vec<usize> {
    let mut order: Vec<usize> = (0..n_features).collect();
    if max_features < n_features {
        order.shuffle(rng);
    }
    order
}

/// Find the split minimizing weighted child impurity among a random subset
/// of features.
///
/// Visits features in [`feature_order`] until `max_features` columns that are
/// not constant within the node have been examined. For each, sorts the
/// `(value, sample)` pairs, scans left-to-right with incremental class count
/// updates, and scores every midpoint between consecutive distinct values by
/// `n_left · I(left) + n_right · I(right)`. The smallest score wins; ties go
/// to the lower feature index, then the lower threshold.
///
/// Returns `None` when no valid split exists (all values identical,
/// or every split would violate `min_samples_leaf`).
///
/// # Column-major layout
///
/// `features` is column-major: `features[feature_idx][sample_idx]`.
/// `sample_indices` are indices into these inner Vecs.
#[allow(clippy::too_many_arguments)]
pub(crate) fn find_best_split(
    features: &[Vec<f64>],
    labels: &[usize],
    sample_indices: &[usize],
    n_classes: usize,
    criterion: &SplitCriterion,
    max_features: usize,
    min_samples_leaf: usize,
    rng: &mut impl Rng,
) -> Option<SplitResult> {
    let n_features = features.len();
    let n_samples = sample_indices.len();

    if n_samples < 2 || n_features == 0 {
        return None;
    }

    let mut parent_counts = vec![0usize; n_classes];
    for &si in sample_indices {
        parent_counts[labels[si]] += 1;
    }
    let parent_impurity = criterion.impurity(&parent_counts, n_samples);

    let mut best: Option<(FeatureIndex, f64, Score)> = None;

    let mut visited = 0usize;
    for feat_idx in feature_order(n_features, max_features, rng) {
        if visited == max_features {
            break;
        }
        let feat_col = &features[feat_idx];

        let mut sorted: Vec<(f64, usize)> = sample_indices
            .iter()
            .map(|&si| (feat_col[si], si))
            .collect();
        sorted.sort_by(|a, b| a.0.total_cmp(&b.0));

        // Constant columns do not count toward max_features.
        if sorted[0].0 == sorted[n_samples - 1].0 {
            continue;
        }
        visited += 1;

        // Left grows from empty, right shrinks from full.
        let mut left_counts = vec![0usize; n_classes];
        let mut right_counts = parent_counts.clone();

        for i in 0..(n_samples - 1) {
            let (val_i, si) = sorted[i];
            let class_i = labels[si];

            left_counts[class_i] += 1;
            right_counts[class_i] -= 1;

            let n_left = i + 1;
            let n_right = n_samples - n_left;

            // No boundary between equal values.
            let val_next = sorted[i + 1].0;
            if val_i == val_next {
                continue;
            }

            if n_left < min_samples_leaf || n_right < min_samples_leaf {
                continue;
            }

            let score = Score::new(criterion, &left_counts, &right_counts, n_left, n_right);

            // Thresholds within a column ascend, so an equal score only
            // wins when it comes from a lower column.
            let better = match &best {
                None => true,
                Some((feature, _, best_score)) => match score.compare(best_score) {
                    Ordering::Less => true,
                    Ordering::Equal => feat_idx < feature.index(),
                    Ordering::Greater => false,
                },
            };
            if better {
                let mut threshold = (val_i + val_next) / 2.0;
                // Rounding can push the midpoint onto the upper value.
                if threshold == val_next {
                    threshold = val_i;
                }
                best = Some((FeatureIndex::new(feat_idx), threshold, score));
            }
        }
    }

    let (best_feature, threshold, best_score) = best?;

    let feat_col = &features[best_feature.index()];
    let (left_indices, right_indices): (Vec<usize>, Vec<usize>) = sample_indices
        .iter()
        .copied()
        .partition(|&si| feat_col[si] <= threshold);

    Some(SplitResult {
        feature: best_feature,
        threshold,
        // MDI formula (matches scikit-learn).
        impurity_decrease: (n_samples as f64) * parent_impurity.value() - best_score.value,
        left_indices,
        right_indices,
    })
}

#[cfg(test)]
mod tests {
    use std::cmp::Ordering;

    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::{Score, SplitCriterion, feature_order, find_best_split};

    #[test]
    fn gini_pure() {
        let imp = SplitCriterion::Gini.impurity(&[10, 0, 0], 10);
        assert!((imp.value() - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn gini_binary_balanced() {
        let imp = SplitCriterion::Gini.impurity(&[5, 5], 10);
        assert!((imp.value() - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn gini_three_class_uniform() {
        let imp = SplitCriterion::Gini.impurity(&[100, 100, 100], 300);
        assert!((imp.value() - (1.0 - 3.0 * (1.0 / 3.0_f64).powi(2))).abs() < 1e-10);
    }

    #[test]
    fn entropy_binary_balanced() {
        let imp = SplitCriterion::Entropy.impurity(&[5, 5], 10);
        assert!((imp.value() - 2.0_f64.ln()).abs() < 1e-10);
    }

    #[test]
    fn two_value_feature_splits_at_midpoint() {
        let features = vec![vec![0.0, 0.0, 1.0, 1.0]];
        let labels = vec![0, 0, 1, 1];
        let sample_indices: Vec<usize> = (0..4).collect();
        let mut rng = ChaCha8Rng::seed_from_u64(0);

        let split = find_best_split(
            &features,
            &labels,
            &sample_indices,
            2,
            &SplitCriterion::Gini,
            1,
            1,
            &mut rng,
        )
        .expect("should find a split");

        assert_eq!(split.feature.index(), 0);
        assert!((split.threshold - 0.5).abs() < f64::EPSILON);
        assert_eq!(split.left_indices, vec![0, 1]);
        assert_eq!(split.right_indices, vec![2, 3]);
        // Parent Gini 0.5 over 4 samples, children pure.
        assert!((split.impurity_decrease - 2.0).abs() < 1e-12);
    }

    #[test]
    fn tie_prefers_lowest_feature_index() {
        // Both columns separate the classes perfectly.
        let features = vec![vec![1.0, 2.0, 8.0, 9.0], vec![5.0, 6.0, 20.0, 21.0]];
        let labels = vec![0, 0, 1, 1];
        let sample_indices: Vec<usize> = (0..4).collect();
        let mut rng = ChaCha8Rng::seed_from_u64(7);

        let split = find_best_split(
            &features,
            &labels,
            &sample_indices,
            2,
            &SplitCriterion::Gini,
            2,
            1,
            &mut rng,
        )
        .unwrap();
        assert_eq!(split.feature.index(), 0);
        assert!((split.threshold - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn tie_prefers_lowest_threshold() {
        // XOR-like column: 0|1 and 1|0 boundaries score the same.
        let features = vec![vec![0.0, 1.0, 2.0]];
        let labels = vec![0, 1, 0];
        let sample_indices: Vec<usize> = (0..3).collect();
        let mut rng = ChaCha8Rng::seed_from_u64(1);

        let split = find_best_split(
            &features,
            &labels,
            &sample_indices,
            2,
            &SplitCriterion::Gini,
            1,
            1,
            &mut rng,
        )
        .unwrap();
        assert!((split.threshold - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn three_class_tie_survives_float_rounding() {
        // Column 0 isolates a class-2 row, column 1 a class-1 row. Both
        // leave (3, 4, 3) or (3, 3, 4) on the right: 6.6 exactly, though the
        // float sums differ in the last bit.
        let labels = vec![0, 0, 0, 1, 1, 1, 1, 2, 2, 2, 2];
        let isolate = |row: usize| -> Vec<f64> {
            (0..11).map(|i| if i == row { 0.0 } else { 1.0 }).collect()
        };
        let features = vec![isolate(7), isolate(3)];
        let sample_indices: Vec<usize> = (0..11).collect();

        for criterion in [SplitCriterion::Gini, SplitCriterion::Entropy] {
            let mut rng = ChaCha8Rng::seed_from_u64(0);
            let split = find_best_split(
                &features,
                &labels,
                &sample_indices,
                3,
                &criterion,
                2,
                1,
                &mut rng,
            )
            .unwrap();
            assert_eq!(split.feature.index(), 0, "{criterion:?}");
            assert_eq!(split.left_indices, vec![7]);
        }
    }

    #[test]
    fn gini_score_orders_exactly() {
        // Left (1, 0) | right (1, 2) against left (2, 0) | right (0, 1).
        let worse = Score::new(&SplitCriterion::Gini, &[1, 0], &[1, 2], 1, 3);
        let better = Score::new(&SplitCriterion::Gini, &[2, 0], &[0, 1], 2, 1);
        assert_eq!(better.compare(&worse), Ordering::Less);
        assert_eq!(worse.compare(&better), Ordering::Greater);
        assert_eq!(worse.compare(&worse), Ordering::Equal);
    }

    #[test]
    fn constant_feature_returns_none() {
        let features = vec![vec![5.0, 5.0, 5.0, 5.0]];
        let labels = vec![0, 0, 1, 1];
        let sample_indices: Vec<usize> = (0..4).collect();
        let mut rng = ChaCha8Rng::seed_from_u64(42);

        let result = find_best_split(
            &features,
            &labels,
            &sample_indices,
            2,
            &SplitCriterion::Gini,
            1,
            1,
            &mut rng,
        );

        assert!(result.is_none());
    }

    #[test]
    fn single_sample_returns_none() {
        let features = vec![vec![1.0]];
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let result = find_best_split(
            &features,
            &[0],
            &[0],
            1,
            &SplitCriterion::Gini,
            1,
            1,
            &mut rng,
        );
        assert!(result.is_none());
    }

    #[test]
    fn min_samples_leaf_enforced() {
        // Each child would hold one sample, below the minimum of 2.
        let features = vec![vec![1.0, 10.0]];
        let labels = vec![0, 1];
        let sample_indices: Vec<usize> = (0..2).collect();
        let mut rng = ChaCha8Rng::seed_from_u64(42);

        let result = find_best_split(
            &features,
            &labels,
            &sample_indices,
            2,
            &SplitCriterion::Gini,
            1,
            2,
            &mut rng,
        );

        assert!(result.is_none());
    }

    #[test]
    fn feature_order_all_is_identity() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        assert_eq!(feature_order(4, 4, &mut rng), vec![0, 1, 2, 3]);
        assert_eq!(feature_order(4, 10, &mut rng), vec![0, 1, 2, 3]);
    }

    #[test]
    fn feature_order_subset_is_permutation() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        for _ in 0..20 {
            let mut order = feature_order(9, 3, &mut rng);
            order.sort_unstable();
            assert_eq!(order, (0..9).collect::<Vec<_>>());
        }
    }

    #[test]
    fn constant_feature_does_not_use_up_budget() {
        // Column 0 is constant; with max_features = 1 the splitter must still
        // reach column 1 whatever order the shuffle produces.
        let features = vec![vec![3.0; 6], vec![1.0, 2.0, 3.0, 7.0, 8.0, 9.0]];
        let labels = vec![0, 0, 0, 1, 1, 1];
        let sample_indices: Vec<usize> = (0..6).collect();
        for seed in 0..16 {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let split = find_best_split(
                &features,
                &labels,
                &sample_indices,
                2,
                &SplitCriterion::Gini,
                1,
                1,
                &mut rng,
            )
            .expect("column 1 separates the classes");
            assert_eq!(split.feature.index(), 1);
            assert!((split.threshold - 5.0).abs() < f64::EPSILON);
        }
    }

    #[test]
    fn shuffled_order_still_breaks_ties_by_index() {
        // Columns 0 and 1 both separate the classes; column 2 does not.
        let features = vec![
            vec![1.0, 2.0, 8.0, 9.0],
            vec![5.0, 6.0, 20.0, 21.0],
            vec![0.0, 2.0, 1.0, 3.0],
        ];
        let labels = vec![0, 0, 1, 1];
        let sample_indices: Vec<usize> = (0..4).collect();
        for seed in 0..16 {
            let mut replay = ChaCha8Rng::seed_from_u64(seed);
            let visited = &feature_order(3, 2, &mut replay)[..2];
            let expected = visited.iter().copied().filter(|&f| f < 2).min().unwrap();

            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let split = find_best_split(
                &features,
                &labels,
                &sample_indices,
                2,
                &SplitCriterion::Gini,
                2,
                1,
                &mut rng,
            )
            .unwrap();
            assert_eq!(split.feature.index(), expected, "seed {seed}, visited {visited:?}");
        }
    }
}
