use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing::info;

use sylva_io::TableReader;
use sylva_prep::{PreparedData, PreprocessConfig, TrainTestConfig};
use sylva_rf::{
    DecisionTree, DecisionTreeConfig, MaxFeatures, OobMode, RandomForestConfig, RankedFeature,
    SplitCriterion, accuracy, macro_f1,
};

#[derive(Parser)]
#[command(name = "sylva")]
#[command(about = "Tabular preprocessing with CART decision tree and random forest classifiers")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// RNG seed for the train/test split, tree and forest
    #[arg(long, default_value_t = 0, global = true)]
    seed: u64,

    /// Enable verbose (debug-level) logging
    #[arg(long, global = true)]
    verbose: bool,

    /// Suppress all output except errors
    #[arg(long, global = true)]
    quiet: bool,

    /// Number of threads for parallel computation (defaults to all cores)
    #[arg(long, global = true)]
    threads: Option<usize>,
}

/// Input table and preprocessing options shared by every subcommand.
#[derive(Args, Debug, Clone)]
struct DataArgs {
    /// Path to the input CSV file
    #[arg(long)]
    data: PathBuf,

    /// Name of the label column
    #[arg(long)]
    target: String,

    /// Nominal column to one-hot encode (repeatable)
    #[arg(long)]
    nominal: Vec<String>,

    /// Fraction of rows held out for testing
    #[arg(long, default_value_t = 0.25)]
    test_fraction: f64,

    /// Keep raw numeric values instead of standardizing them
    #[arg(long, default_value_t = false)]
    no_standardize: bool,

    /// Keep class proportions in the test set
    #[arg(long, default_value_t = false)]
    stratify: bool,
}

/// Tree growth limits shared by the tree and the forest.
#[derive(Args, Debug, Clone)]
struct TreeArgs {
    /// Maximum tree depth (unlimited if not set)
    #[arg(long)]
    max_depth: Option<usize>,

    /// Minimum samples a node needs before it may split
    #[arg(long, default_value_t = 2)]
    min_samples_split: usize,

    /// Minimum samples each child of a split must keep
    #[arg(long, default_value_t = 1)]
    min_samples_leaf: usize,

    /// Split quality criterion
    #[arg(long, value_enum, default_value_t = CriterionArg::Gini)]
    criterion: CriterionArg,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum CriterionArg {
    Gini,
    Entropy,
}

impl From<CriterionArg> for SplitCriterion {
    fn from(arg: CriterionArg) -> Self {
        match arg {
            CriterionArg::Gini => SplitCriterion::Gini,
            CriterionArg::Entropy => SplitCriterion::Entropy,
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Fit a decision tree and a random forest, then score both on the test split
    Evaluate {
        #[command(flatten)]
        data: DataArgs,

        #[command(flatten)]
        tree: TreeArgs,

        /// Number of trees in the Random Forest
        #[arg(long, default_value_t = 100)]
        n_trees: usize,

        /// Features tried per split in the forest: sqrt, log2, all, a count, or a fraction
        #[arg(long, default_value = "sqrt", value_parser = parse_max_features)]
        max_features: MaxFeatures,

        /// Compute out-of-bag accuracy for the forest
        #[arg(long, default_value_t = false)]
        oob: bool,

        /// Include per-row test predictions in the output
        #[arg(long, default_value_t = false)]
        show_predictions: bool,
    },

    /// Fit a single decision tree and print it
    Tree {
        #[command(flatten)]
        data: DataArgs,

        #[command(flatten)]
        tree: TreeArgs,

        /// Print the tree as JSON instead of indented text
        #[arg(long, default_value_t = false)]
        json: bool,
    },
}

// --- JSON stdout output structs ---

#[derive(Serialize)]
struct EvaluateOutput {
    n_rows: usize,
    n_train: usize,
    n_test: usize,
    n_features: usize,
    classes: Vec<String>,
    decision_tree: TreeSummary,
    random_forest: ForestSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    predictions: Option<PredictionsOutput>,
}

#[derive(Serialize)]
struct TreeSummary {
    accuracy: f64,
    macro_f1: f64,
    n_nodes: usize,
    n_leaves: usize,
    depth: usize,
}

#[derive(Serialize)]
struct ForestSummary {
    n_trees: usize,
    max_features: usize,
    accuracy: f64,
    macro_f1: f64,
    oob_accuracy: Option<f64>,
    confusion_matrix: Vec<Vec<usize>>,
    importances: Vec<RankedFeature>,
}

#[derive(Serialize)]
struct PredictionsOutput {
    rows: Vec<usize>,
    truth: Vec<String>,
    decision_tree: Vec<String>,
    random_forest: Vec<String>,
}

fn parse_max_features(s: &str) -> Result<MaxFeatures, String> {
    match s {
        "sqrt" => Ok(MaxFeatures::Sqrt),
        "log2" => Ok(MaxFeatures::Log2),
        "all" => Ok(MaxFeatures::All),
        other if other.contains('.') => other
            .parse::<f64>()
            .map(MaxFeatures::Fraction)
            .map_err(|e| format!("invalid fraction {other}: {e}")),
        other => other
            .parse::<usize>()
            .map(MaxFeatures::Fixed)
            .map_err(|_| format!("unknown max features: {other} (expected sqrt, log2, all, or a number)")),
    }
}

fn prepare(args: &DataArgs, seed: u64) -> Result<PreparedData> {
    let table = TableReader::new(&args.data)
        .read()
        .context("failed to read input CSV")?;

    let split = TrainTestConfig::new()
        .with_test_fraction(args.test_fraction)
        .with_seed(seed);
    PreprocessConfig::new(args.target.clone())
        .with_nominal(args.nominal.clone())
        .with_standardize(!args.no_standardize)
        .with_stratify(args.stratify)
        .with_split(split)
        .fit(&table)
        .context("preprocessing failed")
}

impl TreeArgs {
    fn config(&self, seed: u64) -> DecisionTreeConfig {
        DecisionTreeConfig::new()
            .with_criterion(self.criterion.into())
            .with_max_depth(self.max_depth)
            .with_min_samples_split(self.min_samples_split)
            .with_min_samples_leaf(self.min_samples_leaf)
            .with_seed(seed)
    }
}

fn fit_tree(prepared: &PreparedData, config: &DecisionTreeConfig) -> Result<DecisionTree> {
    config
        .fit(&prepared.train.features, &prepared.train.labels)
        .context("decision tree training failed")
}

fn decode_all(prepared: &PreparedData, classes: &[usize]) -> Vec<String> {
    classes
        .iter()
        .map(|&c| prepared.label_encoder.decode(c).unwrap_or("?").to_string())
        .collect()
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match (cli.verbose, cli.quiet) {
        (true, _) => "debug",
        (_, true) => "error",
        _ => "info",
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    // Configure Rayon thread pool
    if let Some(threads) = cli.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .context("failed to configure thread pool")?;
        info!(threads, "thread pool configured");
    }

    match cli.command {
        Command::Evaluate {
            data,
            tree,
            n_trees,
            max_features,
            oob,
            show_predictions,
        } => {
            // 1. Read, encode, split, scale
            let prepared = prepare(&data, cli.seed)?;
            let feature_names = prepared.preprocessor.feature_names();
            let test_labels = &prepared.test.labels;

            // 2. Decision tree
            let tree_config = tree.config(cli.seed);
            let decision_tree = fit_tree(&prepared, &tree_config)?;
            let tree_preds = decision_tree
                .predict_batch(&prepared.test.features)
                .context("decision tree prediction failed")?;
            let tree_summary = TreeSummary {
                accuracy: accuracy(test_labels, &tree_preds)?,
                macro_f1: macro_f1(test_labels, &tree_preds)?,
                n_nodes: decision_tree.n_nodes(),
                n_leaves: decision_tree.n_leaves(),
                depth: decision_tree.depth(),
            };
            info!(
                accuracy = tree_summary.accuracy,
                macro_f1 = tree_summary.macro_f1,
                "decision tree evaluated"
            );

            // 3. Random forest
            let rf_config = RandomForestConfig::new(n_trees)?
                .with_tree(tree_config)
                .with_max_features(max_features)
                .with_oob_mode(if oob { OobMode::Enabled } else { OobMode::Disabled })
                .with_seed(cli.seed);
            let result = rf_config
                .fit(&prepared.train.features, &prepared.train.labels, &feature_names)
                .context("random forest training failed")?;
            let forest_preds = result
                .forest()
                .predict_batch(&prepared.test.features)
                .context("random forest prediction failed")?;
            let confusion = sylva_rf::ConfusionMatrix::from_labels(
                test_labels,
                &forest_preds,
                prepared.label_encoder.n_classes(),
            )?;
            let forest_summary = ForestSummary {
                n_trees,
                max_features: result.metadata().max_features_resolved,
                accuracy: accuracy(test_labels, &forest_preds)?,
                macro_f1: macro_f1(test_labels, &forest_preds)?,
                oob_accuracy: result.oob_score().map(|s| s.accuracy),
                confusion_matrix: confusion.rows().to_vec(),
                importances: result.importances().to_vec(),
            };
            info!(
                accuracy = forest_summary.accuracy,
                macro_f1 = forest_summary.macro_f1,
                oob_accuracy = ?forest_summary.oob_accuracy,
                "random forest evaluated"
            );

            // 4. Print summary
            let predictions = show_predictions.then(|| PredictionsOutput {
                rows: prepared.indices.test.clone(),
                truth: decode_all(&prepared, test_labels),
                decision_tree: decode_all(&prepared, &tree_preds),
                random_forest: decode_all(&prepared, &forest_preds),
            });
            let output = EvaluateOutput {
                n_rows: prepared.indices.train.len() + prepared.indices.test.len(),
                n_train: prepared.train.labels.len(),
                n_test: test_labels.len(),
                n_features: feature_names.len(),
                classes: prepared.label_encoder.classes().to_vec(),
                decision_tree: tree_summary,
                random_forest: forest_summary,
                predictions,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }

        Command::Tree { data, tree, json } => {
            let prepared = prepare(&data, cli.seed)?;
            let decision_tree = fit_tree(&prepared, &tree.config(cli.seed))?;

            let preds = decision_tree
                .predict_batch(&prepared.test.features)
                .context("decision tree prediction failed")?;
            info!(
                n_nodes = decision_tree.n_nodes(),
                depth = decision_tree.depth(),
                test_accuracy = accuracy(&prepared.test.labels, &preds)?,
                "decision tree trained"
            );

            if json {
                println!("{}", serde_json::to_string_pretty(&decision_tree)?);
            } else {
                print!(
                    "{}",
                    decision_tree.render(
                        &prepared.preprocessor.feature_names(),
                        prepared.label_encoder.classes()
                    )
                );
            }
        }
    }

    Ok(())
}
