//! CSV table reader with input validation.

use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument};

use crate::IoError;
use crate::domain::Table;

/// Reads a headed CSV file into a [`Table`].
///
/// Expected CSV format:
/// - Header row required; names must be unique
/// - One record per sample, every record with as many fields as the header
/// - Leading and trailing whitespace around fields is trimmed
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`IoError::FileNotFound`] | File doesn't exist or is unreadable |
/// | [`IoError::CsvParse`] | Malformed CSV record |
/// | [`IoError::DuplicateColumn`] | Header repeats a name |
/// | [`IoError::EmptyDataset`] | Zero data rows after header |
/// | [`IoError::InconsistentRowLength`] | Row has different column count than header |
pub struct TableReader {
    path: PathBuf,
    delimiter: u8,
}

impl TableReader {
    /// Create a new reader for the given CSV file path.
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            delimiter: b',',
        }
    }

    /// Use a field separator other than `,`.
    #[must_use]
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Read and validate the CSV file, returning a [`Table`].
    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub fn read(&self) -> Result<Table, IoError> {
        let file = std::fs::File::open(&self.path).map_err(|e| IoError::FileNotFound {
            path: self.path.clone(),
            source: e,
        })?;

        // flexible(true) so ragged rows reach the InconsistentRowLength check
        // instead of failing as a CsvParse error.
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .delimiter(self.delimiter)
            .trim(csv::Trim::All)
            .from_reader(file);

        let columns: Vec<String> = rdr
            .headers()
            .map_err(|e| self.parse_error(e))?
            .iter()
            .map(str::to_string)
            .collect();
        debug!(n_columns = columns.len(), "read CSV header");

        let mut rows = Vec::new();
        for result in rdr.records() {
            let record = result.map_err(|e| self.parse_error(e))?;
            rows.push(record.iter().map(str::to_string).collect());
        }

        let table = Table::new(self.path.clone(), columns, rows)?;
        info!(
            n_rows = table.n_rows(),
            n_columns = table.n_columns(),
            "dataset loaded"
        );
        Ok(table)
    }

    fn parse_error(&self, e: csv::Error) -> IoError {
        IoError::CsvParse {
            path: self.path.clone(),
            offset: e.position().map_or(0, |p| p.byte()),
            source: e,
        }
    }
}
