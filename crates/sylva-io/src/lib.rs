//! CSV input and validation for the sylva pipeline.

mod domain;
mod error;
mod reader;

pub use domain::Table;
pub use error::IoError;
pub use reader::TableReader;
