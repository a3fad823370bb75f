//! Table to numeric train/test matrices.

use sylva_io::Table;
use tracing::{info, instrument};

use crate::error::PrepError;
use crate::label::LabelEncoder;
use crate::onehot::OneHotEncoder;
use crate::scaler::StandardScaler;
use crate::split::{TrainTestConfig, TrainTestSplit, stratified_train_test_split, train_test_split};

/// Configuration for turning a [`Table`] into train/test matrices.
///
/// Construct via [`PreprocessConfig::new`], then chain `with_*` methods.
///
/// # Defaults
///
/// | Parameter     | Default                  |
/// |---------------|--------------------------|
/// | `nominal`     | none                     |
/// | `standardize` | `true`                   |
/// | `stratify`    | `false`                  |
/// | `split`       | [`TrainTestConfig::new`] |
#[derive(Debug, Clone)]
pub struct PreprocessConfig {
    target: String,
    nominal: Vec<String>,
    standardize: bool,
    stratify: bool,
    split: TrainTestConfig,
}

impl PreprocessConfig {
    /// Create a config predicting column `target`.
    #[must_use]
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            nominal: Vec::new(),
            standardize: true,
            stratify: false,
            split: TrainTestConfig::new(),
        }
    }

    /// Set the columns to one-hot encode.
    #[must_use]
    pub fn with_nominal(mut self, nominal: Vec<String>) -> Self {
        self.nominal = nominal;
        self
    }

    /// Enable or disable standardization of numeric columns.
    #[must_use]
    pub fn with_standardize(mut self, standardize: bool) -> Self {
        self.standardize = standardize;
        self
    }

    /// Keep class proportions in the test set.
    #[must_use]
    pub fn with_stratify(mut self, stratify: bool) -> Self {
        self.stratify = stratify;
        self
    }

    /// Set the train/test split configuration.
    #[must_use]
    pub fn with_split(mut self, split: TrainTestConfig) -> Self {
        self.split = split;
        self
    }

    /// Return the target column name.
    #[must_use]
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Return the nominal column names.
    #[must_use]
    pub fn nominal(&self) -> &[String] {
        &self.nominal
    }

    /// Return whether numeric columns are standardized.
    #[must_use]
    pub fn standardize(&self) -> bool {
        self.standardize
    }

    /// Return whether the split is stratified.
    #[must_use]
    pub fn stratify(&self) -> bool {
        self.stratify
    }

    /// Return the split configuration.
    #[must_use]
    pub fn split(&self) -> &TrainTestConfig {
        &self.split
    }

    /// Encode, split, and scale `table`.
    ///
    /// Steps, in order:
    /// 1. Encode the target column with a [`LabelEncoder`] over all rows.
    /// 2. One-hot encode each nominal column with categories from all rows.
    /// 3. Split row indices with the seeded (optionally stratified) shuffle.
    /// 4. Fit a [`StandardScaler`] on the training rows' numeric columns only
    ///    and apply it to both sides.
    ///
    /// Feature order is the numeric columns in header order followed by each
    /// nominal column's indicators, in the order the nominal columns were
    /// listed.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`PrepError::TargetIsFeature`] | The target is listed as nominal |
    /// | [`PrepError::NoFeatureColumns`] | Only the target column exists |
    /// | [`PrepError::Io`] | A column is missing or a numeric cell does not parse |
    /// | Split errors | From [`train_test_split`] |
    #[instrument(skip_all, fields(target = %self.target, n_rows = table.n_rows()))]
    pub fn fit(&self, table: &Table) -> Result<PreparedData, PrepError> {
        if self.nominal.iter().any(|c| *c == self.target) {
            return Err(PrepError::TargetIsFeature {
                column: self.target.clone(),
            });
        }

        let label_encoder = LabelEncoder::fit(&table.column(&self.target)?)?;
        let labels = label_encoder.transform(&table.column(&self.target)?)?;

        let numeric_columns: Vec<String> = table
            .columns()
            .iter()
            .filter(|c| **c != self.target && !self.nominal.contains(*c))
            .cloned()
            .collect();

        let encoders = self
            .nominal
            .iter()
            .map(|name| OneHotEncoder::fit(name, &table.column(name)?))
            .collect::<Result<Vec<_>, PrepError>>()?;

        if numeric_columns.is_empty() && encoders.is_empty() {
            return Err(PrepError::NoFeatureColumns);
        }

        let indices = if self.stratify {
            stratified_train_test_split(&labels, &self.split)?
        } else {
            train_test_split(table.n_rows(), &self.split)?
        };

        let numeric = numeric_matrix(table, &numeric_columns)?;
        let scaler = if self.standardize && !numeric_columns.is_empty() {
            let train_numeric: Vec<Vec<f64>> =
                indices.train.iter().map(|&i| numeric[i].clone()).collect();
            Some(StandardScaler::fit(&train_numeric)?)
        } else {
            None
        };

        let preprocessor = FittedPreprocessor {
            numeric_columns,
            encoders,
            scaler,
        };
        let features = preprocessor.transform(table)?;

        let take = |rows: &[usize]| Dataset {
            features: rows.iter().map(|&i| features[i].clone()).collect(),
            labels: rows.iter().map(|&i| labels[i]).collect(),
        };
        let train = take(&indices.train);
        let test = take(&indices.test);

        info!(
            n_train = train.labels.len(),
            n_test = test.labels.len(),
            n_features = preprocessor.n_features(),
            n_classes = label_encoder.n_classes(),
            "preprocessing complete"
        );

        Ok(PreparedData {
            train,
            test,
            indices,
            label_encoder,
            preprocessor,
        })
    }
}

/// Row-major numeric features with their class labels.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    /// `features[sample][feature]`.
    pub features: Vec<Vec<f64>>,
    /// Class index per sample.
    pub labels: Vec<usize>,
}

/// Output of [`PreprocessConfig::fit`].
#[derive(Debug, Clone)]
pub struct PreparedData {
    /// Training rows, in split order.
    pub train: Dataset,
    /// Test rows, in split order.
    pub test: Dataset,
    /// Table row indices behind `train` and `test`.
    pub indices: TrainTestSplit,
    /// Mapping between label strings and class indices.
    pub label_encoder: LabelEncoder,
    /// Fitted feature transform, reusable on new tables.
    pub preprocessor: FittedPreprocessor,
}

/// Fitted feature transform: numeric columns, indicators, optional scaling.
///
/// Immutable once produced by [`PreprocessConfig::fit`].
#[derive(Debug, Clone, PartialEq)]
pub struct FittedPreprocessor {
    numeric_columns: Vec<String>,
    encoders: Vec<OneHotEncoder>,
    scaler: Option<StandardScaler>,
}

impl FittedPreprocessor {
    /// Build the feature matrix for `table`.
    ///
    /// The table needs every fitted column; extra columns are ignored.
    /// Nominal values unseen at fit time encode as all-zero indicators.
    ///
    /// # Errors
    ///
    /// Returns [`PrepError::Io`] if a column is missing or a numeric cell
    /// does not parse.
    pub fn transform(&self, table: &Table) -> Result<Vec<Vec<f64>>, PrepError> {
        let mut rows = numeric_matrix(table, &self.numeric_columns)?;
        if let Some(scaler) = &self.scaler {
            rows = scaler.transform(&rows)?;
        }
        for encoder in &self.encoders {
            let indicators = encoder.transform(&table.column(encoder.column())?);
            for (row, extra) in rows.iter_mut().zip(indicators) {
                row.extend(extra);
            }
        }
        Ok(rows)
    }

    /// Return output feature names in matrix column order.
    #[must_use]
    pub fn feature_names(&self) -> Vec<String> {
        self.numeric_columns
            .iter()
            .cloned()
            .chain(self.encoders.iter().flat_map(OneHotEncoder::feature_names))
            .collect()
    }

    /// Return the number of output features.
    #[must_use]
    pub fn n_features(&self) -> usize {
        self.numeric_columns.len()
            + self
                .encoders
                .iter()
                .map(|e| e.categories().len())
                .sum::<usize>()
    }

    /// Return the fitted scaler, if standardization was enabled.
    pub fn scaler(&self) -> Option<&StandardScaler> {
        self.scaler.as_ref()
    }

    /// Return the fitted one-hot encoders in output order.
    pub fn encoders(&self) -> &[OneHotEncoder] {
        &self.encoders
    }
}

/// Parse `columns` into row-major values, one row per table row.
fn numeric_matrix(table: &Table, columns: &[String]) -> Result<Vec<Vec<f64>>, PrepError> {
    let mut rows = vec![Vec::with_capacity(columns.len()); table.n_rows()];
    for name in columns {
        for (row, value) in rows.iter_mut().zip(table.numeric_column(name)?) {
            row.push(value);
        }
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::PreprocessConfig;
    use crate::{PrepError, TrainTestConfig};
    use sylva_io::Table;

    fn strings(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|s| s.to_string()).collect()
    }

    fn weather() -> Table {
        let rows = [
            ["sunny", "30", "no"],
            ["sunny", "28", "no"],
            ["rainy", "18", "yes"],
            ["overcast", "22", "yes"],
            ["rainy", "16", "yes"],
            ["overcast", "26", "yes"],
            ["sunny", "20", "yes"],
            ["rainy", "14", "no"],
        ];
        Table::new(
            "weather.csv",
            strings(&["outlook", "temp", "play"]),
            rows.iter().map(|r| strings(r)).collect(),
        )
        .unwrap()
    }

    #[test]
    fn feature_layout_numeric_then_indicators() {
        let prepared = PreprocessConfig::new("play")
            .with_nominal(vec!["outlook".to_string()])
            .fit(&weather())
            .unwrap();
        assert_eq!(
            prepared.preprocessor.feature_names(),
            vec!["temp", "outlook_overcast", "outlook_rainy", "outlook_sunny"]
        );
        assert_eq!(prepared.label_encoder.classes(), &["no", "yes"]);
        assert_eq!(prepared.test.labels.len(), 2);
        assert_eq!(prepared.train.labels.len(), 6);
        assert!(prepared.train.features.iter().all(|r| r.len() == 4));
    }

    #[test]
    fn scaler_uses_training_rows_only() {
        let table = weather();
        let prepared = PreprocessConfig::new("play")
            .with_nominal(vec!["outlook".to_string()])
            .fit(&table)
            .unwrap();
        let temps = table.numeric_column("temp").unwrap();
        let train_temps: Vec<f64> = prepared.indices.train.iter().map(|&i| temps[i]).collect();
        let mean = train_temps.iter().sum::<f64>() / train_temps.len() as f64;
        let scaler = prepared.preprocessor.scaler().unwrap();
        assert!((scaler.means()[0] - mean).abs() < 1e-12);

        let standardized_mean = prepared.train.features.iter().map(|r| r[0]).sum::<f64>()
            / prepared.train.features.len() as f64;
        assert!(standardized_mean.abs() < 1e-12);
    }

    #[test]
    fn rows_follow_split_indices() {
        let table = weather();
        let prepared = PreprocessConfig::new("play")
            .with_nominal(vec!["outlook".to_string()])
            .with_standardize(false)
            .fit(&table)
            .unwrap();
        let temps = table.numeric_column("temp").unwrap();
        for (row, &i) in prepared.test.features.iter().zip(&prepared.indices.test) {
            assert_eq!(row[0], temps[i]);
        }
    }

    #[test]
    fn unseen_category_encodes_as_zeros() {
        let prepared = PreprocessConfig::new("play")
            .with_nominal(vec!["outlook".to_string()])
            .fit(&weather())
            .unwrap();
        let fresh = Table::new(
            "fresh.csv",
            strings(&["temp", "outlook"]),
            vec![strings(&["21", "foggy"])],
        )
        .unwrap();
        let rows = prepared.preprocessor.transform(&fresh).unwrap();
        assert_eq!(&rows[0][1..], &[0.0, 0.0, 0.0]);
    }

    #[test]
    fn split_seed_is_respected() {
        let fit = |seed| {
            PreprocessConfig::new("play")
                .with_nominal(vec!["outlook".to_string()])
                .with_split(TrainTestConfig::new().with_seed(seed))
                .fit(&weather())
                .unwrap()
                .indices
        };
        let base = fit(4);
        assert_eq!(base, fit(4));
        assert!(
            (5..13).any(|seed| fit(seed).test != base.test),
            "every seed held out {:?}",
            base.test
        );
    }

    #[test]
    fn target_cannot_be_nominal() {
        let err = PreprocessConfig::new("play")
            .with_nominal(vec!["play".to_string()])
            .fit(&weather())
            .unwrap_err();
        assert!(matches!(err, PrepError::TargetIsFeature { .. }));
    }

    #[test]
    fn nominal_text_left_numeric_is_an_error() {
        let err = PreprocessConfig::new("play").fit(&weather()).unwrap_err();
        assert!(matches!(err, PrepError::Io(_)));
    }

    #[test]
    fn missing_target_is_an_error() {
        let err = PreprocessConfig::new("label").fit(&weather()).unwrap_err();
        assert!(matches!(err, PrepError::Io(_)));
    }
}
