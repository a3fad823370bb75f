//! Out-of-bag scoring of a bagged forest.

use tracing::debug;

use crate::confusion::ConfusionMatrix;
use crate::error::RfError;
use crate::result::TreeSample;
use crate::tree::{DecisionTree, majority_class};

/// Forest quality measured on the rows each tree did not train on.
#[derive(Debug, Clone, serde::Serialize)]
pub struct OobScore {
    pub accuracy: f64,
    /// Truth against OOB majority vote, over the scored rows only.
    pub confusion: ConfusionMatrix,
    /// Rows left out by at least one tree.
    pub n_oob_samples: usize,
}

/// Score every row by a majority vote of the trees whose bootstrap missed it.
///
/// Vote ties go to the lowest class index. Rows that every tree saw are not
/// scored.
pub(crate) fn compute_oob(
    trees: &[DecisionTree],
    features: &[Vec<f64>],
    labels: &[usize],
    n_classes: usize,
    samples: &[TreeSample],
) -> Result<OobScore, RfError> {
    let mut votes: Vec<Option<Vec<usize>>> = vec![None; features.len()];
    for (tree, sample) in trees.iter().zip(samples) {
        for &row in &sample.out_of_bag {
            let class = tree.predict(&features[row])?;
            votes[row].get_or_insert_with(|| vec![0; n_classes])[class] += 1;
        }
    }

    let (truth, predicted): (Vec<usize>, Vec<usize>) = votes
        .iter()
        .zip(labels)
        .filter_map(|(row_votes, &label)| Some((label, majority_class(row_votes.as_ref()?))))
        .unzip();
    if truth.is_empty() {
        return Err(RfError::OobEvaluationFailed {
            reason: "every row was drawn into every bootstrap".to_string(),
        });
    }

    let confusion = ConfusionMatrix::from_labels(&truth, &predicted, n_classes)?;
    let accuracy = confusion.accuracy();
    debug!(n_oob_samples = truth.len(), accuracy, "oob evaluation complete");

    Ok(OobScore {
        accuracy,
        confusion,
        n_oob_samples: truth.len(),
    })
}
