//! Random Forest training with parallel tree construction.

use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::iter::{IntoParallelIterator, ParallelIterator};
use tracing::{debug, info, instrument};

use crate::config::{MaxFeatures, OobMode, RandomForestConfig};
use crate::error::{InputError, RfError, class_count, validate_training_data};
use crate::importance::aggregate_importances;
use crate::oob::compute_oob;
use crate::result::{RandomForestResult, TrainingMetadata, TreeSample};
use crate::tree::DecisionTree;

/// A fitted Random Forest ensemble.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RandomForest {
    pub(crate) trees: Vec<DecisionTree>,
    pub(crate) n_features: usize,
    pub(crate) n_classes: usize,
    pub(crate) feature_names: Vec<String>,
}

/// Resolve `MaxFeatures` to a concrete count.
pub(crate) fn resolve_max_features(
    max_features: MaxFeatures,
    n_features: usize,
) -> Result<usize, RfError> {
    let n = n_features as f64;
    let resolved = match max_features {
        MaxFeatures::Sqrt => (n.sqrt().floor() as usize).max(1),
        MaxFeatures::Log2 => (n.log2().floor() as usize).max(1),
        MaxFeatures::Fraction(f) if f > 0.0 && f <= 1.0 => ((n * f).floor() as usize).max(1),
        MaxFeatures::Fraction(_) => 0,
        MaxFeatures::Fixed(count) => count,
        MaxFeatures::All => n_features,
    };
    if resolved == 0 || resolved > n_features {
        return Err(RfError::InvalidMaxFeatures {
            max_features: resolved,
            n_features,
        });
    }
    Ok(resolved)
}

/// Draw `draw_count` rows with replacement; the rows never drawn form the
/// out-of-bag set.
fn bootstrap_sample(n_samples: usize, draw_count: usize, rng: &mut impl Rng) -> TreeSample {
    let in_bag: Vec<usize> = (0..draw_count).map(|_| rng.gen_range(0..n_samples)).collect();
    let mut drawn = vec![false; n_samples];
    for &row in &in_bag {
        drawn[row] = true;
    }
    let out_of_bag = (0..n_samples).filter(|&row| !drawn[row]).collect();
    TreeSample { in_bag, out_of_bag }
}

/// Train the Random Forest ensemble.
///
/// Seeding: a master `ChaCha8Rng` seeded with `config.seed` draws one `u64`
/// per tree. Each tree's own `ChaCha8Rng` first draws the bootstrap indices,
/// then one more `u64` that seeds the tree's feature subsampling.
#[instrument(skip_all, fields(n_trees = config.n_trees, n_samples = features.len()))]
pub(crate) fn train(
    config: &RandomForestConfig,
    features: &[Vec<f64>],
    labels: &[usize],
    feature_names: &[String],
) -> Result<RandomForestResult, RfError> {
    let (n_samples, n_features) = validate_training_data(features, labels)?;

    let feature_names: Vec<String> = if feature_names.is_empty() {
        (0..n_features).map(|i| format!("f{i}")).collect()
    } else if feature_names.len() == n_features {
        feature_names.to_vec()
    } else {
        return Err(InputError::FeatureNameCountMismatch {
            expected: n_features,
            got: feature_names.len(),
        }
        .into());
    };

    // --- Validate config ---
    let max_features_resolved = resolve_max_features(config.max_features, n_features)?;

    if config.bootstrap_fraction <= 0.0 || config.bootstrap_fraction > 1.0 {
        return Err(RfError::InvalidBootstrapFraction {
            fraction: config.bootstrap_fraction,
        });
    }

    let n_classes = class_count(labels)?;
    let draw_count = ((n_samples as f64) * config.bootstrap_fraction).ceil() as usize;

    info!(
        n_trees = config.n_trees,
        n_samples,
        n_features,
        n_classes,
        max_features = max_features_resolved,
        draw_count,
        "training random forest"
    );

    let mut master_rng = ChaCha8Rng::seed_from_u64(config.seed);
    let tree_seeds: Vec<u64> = (0..config.n_trees).map(|_| master_rng.r#gen()).collect();

    let member_config = config.tree.clone().with_max_features(Some(max_features_resolved));

    // Each worker owns its bootstrap copy; results keep tree order.
    let (trees, samples): (Vec<DecisionTree>, Vec<TreeSample>) = tree_seeds
        .into_par_iter()
        .map(|seed| {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let sample = bootstrap_sample(n_samples, draw_count, &mut rng);
            let boot_features: Vec<Vec<f64>> =
                sample.in_bag.iter().map(|&i| features[i].clone()).collect();
            let boot_labels: Vec<usize> = sample.in_bag.iter().map(|&i| labels[i]).collect();

            let tree = member_config
                .clone()
                .with_seed(rng.r#gen())
                .fit_with_n_classes(&boot_features, &boot_labels, n_classes)?;
            Ok((tree, sample))
        })
        .collect::<Result<Vec<_>, RfError>>()?
        .into_iter()
        .unzip();

    let per_tree_importances: Vec<Vec<f64>> =
        trees.iter().map(DecisionTree::feature_importances).collect();
    let importances = aggregate_importances(&per_tree_importances, &feature_names);

    debug!(n_trees_trained = trees.len(), "tree training complete");

    let oob_score = if config.oob_mode == OobMode::Enabled {
        Some(compute_oob(&trees, features, labels, n_classes, &samples)?)
    } else {
        None
    };

    let forest = RandomForest {
        trees,
        n_features,
        n_classes,
        feature_names,
    };

    let metadata = TrainingMetadata {
        n_trees: config.n_trees,
        n_samples,
        n_features,
        n_classes,
        max_features_resolved,
        draw_count,
    };

    info!(
        oob_accuracy = oob_score.as_ref().map(|s| s.accuracy),
        "random forest training complete"
    );

    Ok(RandomForestResult {
        forest,
        importances,
        oob_score,
        samples,
        metadata,
    })
}
