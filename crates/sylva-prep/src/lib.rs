//! Tabular preprocessing: label encoding, one-hot encoding, standardization,
//! and seeded train/test splitting.
//!
//! Every fitted object is an immutable value returned by `fit` and passed
//! explicitly to later `transform` calls.

mod error;
mod label;
mod onehot;
mod pipeline;
mod scaler;
mod split;

pub use error::PrepError;
pub use label::LabelEncoder;
pub use onehot::OneHotEncoder;
pub use pipeline::{Dataset, FittedPreprocessor, PreparedData, PreprocessConfig};
pub use scaler::StandardScaler;
pub use split::{TrainTestConfig, TrainTestSplit, stratified_train_test_split, train_test_split};
