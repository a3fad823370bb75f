//! Fit and predict timings on data shaped like a preprocessed table:
//! standardized numeric columns followed by one-hot indicator blocks.

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use sylva_rf::{DecisionTreeConfig, MaxFeatures, OobMode, RandomForestConfig, SplitCriterion};

const N_ROWS: usize = 600;
const N_NUMERIC: usize = 6;
/// Categories per nominal column.
const NOMINAL_LEVELS: [usize; 2] = [4, 3];
const N_CLASSES: usize = 4;

/// Rows whose class shifts the first two numeric columns and picks the
/// level of the first nominal column most of the time.
fn encoded_table(seed: u64) -> (Vec<Vec<f64>>, Vec<usize>) {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut rows = Vec::with_capacity(N_ROWS);
    let mut labels = Vec::with_capacity(N_ROWS);
    for _ in 0..N_ROWS {
        let class = rng.gen_range(0..N_CLASSES);
        let mut row: Vec<f64> = (0..N_NUMERIC)
            .map(|col| {
                let shift = if col < 2 { class as f64 * 0.8 } else { 0.0 };
                shift + rng.gen_range(-1.0..1.0)
            })
            .collect();
        for (block, &levels) in NOMINAL_LEVELS.iter().enumerate() {
            let level = if block == 0 && rng.gen_bool(0.7) {
                class % levels
            } else {
                rng.gen_range(0..levels)
            };
            row.extend((0..levels).map(|l| if l == level { 1.0 } else { 0.0 }));
        }
        rows.push(row);
        labels.push(class);
    }
    (rows, labels)
}

fn bench_tree_fit(c: &mut Criterion) {
    let (rows, labels) = encoded_table(7);
    let mut group = c.benchmark_group("tree_fit");
    for criterion in [SplitCriterion::Gini, SplitCriterion::Entropy] {
        let config = DecisionTreeConfig::new().with_criterion(criterion);
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{criterion:?}")),
            &config,
            |b, config| b.iter(|| config.fit(&rows, &labels).unwrap()),
        );
    }
    group.finish();
}

fn bench_forest_fit(c: &mut Criterion) {
    let (rows, labels) = encoded_table(7);
    let mut group = c.benchmark_group("forest_fit_100_trees");
    group.sample_size(20);
    for oob in [OobMode::Disabled, OobMode::Enabled] {
        let config = RandomForestConfig::new(100)
            .unwrap()
            .with_max_features(MaxFeatures::Sqrt)
            .with_oob_mode(oob);
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{oob:?}")),
            &config,
            |b, config| b.iter(|| config.fit(&rows, &labels, &[]).unwrap()),
        );
    }
    group.finish();
}

fn bench_forest_predict(c: &mut Criterion) {
    let (rows, labels) = encoded_table(7);
    let (queries, _) = encoded_table(8);
    let forest = RandomForestConfig::new(100)
        .unwrap()
        .fit(&rows, &labels, &[])
        .unwrap()
        .into_forest();

    let mut group = c.benchmark_group("forest_predict");
    group.bench_function("votes", |b| b.iter(|| forest.predict_batch(&queries).unwrap()));
    group.bench_function("proba", |b| {
        b.iter(|| forest.predict_proba_batch(&queries).unwrap())
    });
    group.finish();
}

criterion_group!(benches, bench_tree_fit, bench_forest_fit, bench_forest_predict);
criterion_main!(benches);
