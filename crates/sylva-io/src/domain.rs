//! Domain types for sylva-io.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::IoError;

/// A rectangular table of string cells with a named header.
///
/// Produced by [`TableReader`](crate::TableReader) or [`Table::new`]. Every
/// row has exactly one cell per column, column names are unique, and there
/// is at least one row. Cells stay as text; numeric interpretation happens
/// per column through [`Table::numeric_column`].
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    origin: PathBuf,
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    /// Build a validated table.
    ///
    /// `origin` names where the data came from and is carried into errors.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`IoError::DuplicateColumn`] | Two columns share a name |
    /// | [`IoError::EmptyDataset`] | `rows` is empty |
    /// | [`IoError::InconsistentRowLength`] | A row's length differs from `columns.len()` |
    pub fn new(
        origin: impl Into<PathBuf>,
        columns: Vec<String>,
        rows: Vec<Vec<String>>,
    ) -> Result<Self, IoError> {
        let origin = origin.into();

        let duplicate = {
            let mut seen = HashSet::with_capacity(columns.len());
            columns.iter().find(|c| !seen.insert(*c)).cloned()
        };
        if let Some(column) = duplicate {
            return Err(IoError::DuplicateColumn {
                path: origin,
                column,
            });
        }

        if rows.is_empty() {
            return Err(IoError::EmptyDataset { path: origin });
        }

        if let Some((row_index, row)) = rows
            .iter()
            .enumerate()
            .find(|(_, row)| row.len() != columns.len())
        {
            return Err(IoError::InconsistentRowLength {
                path: origin,
                row_index,
                expected: columns.len(),
                got: row.len(),
            });
        }

        Ok(Self {
            origin,
            columns,
            rows,
        })
    }

    /// Return where the table was read from.
    pub fn origin(&self) -> &Path {
        &self.origin
    }

    /// Return the header names in file order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Return all rows in file order.
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Return the number of data rows.
    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    /// Return the number of columns.
    pub fn n_columns(&self) -> usize {
        self.columns.len()
    }

    /// Return the position of `name` in the header.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::MissingColumn`] if no column has that name.
    pub fn column_index(&self, name: &str) -> Result<usize, IoError> {
        self.columns
            .iter()
            .position(|c| c == name)
            .ok_or_else(|| IoError::MissingColumn {
                path: self.origin.clone(),
                column: name.to_string(),
            })
    }

    /// Return the cells of column `name`, one per row.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::MissingColumn`] if no column has that name.
    pub fn column(&self, name: &str) -> Result<Vec<&str>, IoError> {
        let idx = self.column_index(name)?;
        Ok(self.rows.iter().map(|row| row[idx].as_str()).collect())
    }

    /// Parse column `name` as finite `f64` values.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`IoError::MissingColumn`] | No column has that name |
    /// | [`IoError::NonFiniteValue`] | A cell is unparseable, NaN, or infinite |
    pub fn numeric_column(&self, name: &str) -> Result<Vec<f64>, IoError> {
        let idx = self.column_index(name)?;
        self.rows
            .iter()
            .enumerate()
            .map(|(row_index, row)| {
                let raw = &row[idx];
                match raw.parse::<f64>() {
                    Ok(value) if value.is_finite() => Ok(value),
                    _ => Err(IoError::NonFiniteValue {
                        path: self.origin.clone(),
                        row_index,
                        column: name.to_string(),
                        raw: raw.clone(),
                    }),
                }
            })
            .collect()
    }

}
