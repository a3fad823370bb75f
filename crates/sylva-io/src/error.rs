//! I/O error types for sylva-io.

use std::path::PathBuf;

/// Errors from reading and validating a CSV table.
#[derive(Debug, thiserror::Error)]
pub enum IoError {
    /// Returned when the input file does not exist or is unreadable.
    #[error("file not found: {path}")]
    FileNotFound {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Returned when the CSV parser encounters a malformed record.
    #[error("CSV parse error in {path} at byte offset {offset}")]
    CsvParse {
        /// Path to the CSV file.
        path: PathBuf,
        /// Byte offset where the error occurred.
        offset: u64,
        /// Underlying CSV error.
        source: csv::Error,
    },

    /// Returned when the table has a header but zero data rows.
    #[error("empty dataset (no data rows) in {path}")]
    EmptyDataset {
        /// Origin of the table.
        path: PathBuf,
    },

    /// Returned when a data row has a different number of fields than the header.
    #[error("inconsistent row length in {path}: row {row_index} has {got} columns, expected {expected}")]
    InconsistentRowLength {
        /// Origin of the table.
        path: PathBuf,
        /// Zero-based row index (excluding header).
        row_index: usize,
        /// Expected number of columns (from header).
        expected: usize,
        /// Actual number of columns in this row.
        got: usize,
    },

    /// Returned when two header fields share a name.
    #[error("duplicate column \"{column}\" in {path}")]
    DuplicateColumn {
        /// Origin of the table.
        path: PathBuf,
        /// The repeated column name.
        column: String,
    },

    /// Returned when a requested column is not in the header.
    #[error("column \"{column}\" not found in {path}")]
    MissingColumn {
        /// Origin of the table.
        path: PathBuf,
        /// The requested column name.
        column: String,
    },

    /// Returned when a numeric column holds NaN, Inf, or an unparseable cell.
    #[error("non-finite value in {path}: row {row_index}, column \"{column}\", raw value \"{raw}\"")]
    NonFiniteValue {
        /// Origin of the table.
        path: PathBuf,
        /// Zero-based row index (excluding header).
        row_index: usize,
        /// Name of the offending column.
        column: String,
        /// The raw string value that failed to parse.
        raw: String,
    },
}
