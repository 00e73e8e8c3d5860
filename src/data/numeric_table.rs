//! Column-oriented numeric table with explicit missing values.

use crate::error::{Result, StatError};
use crate::testing::utils::valid_values;

/// Named columns of equal length; `None` marks a missing cell.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NumericTable {
    column_names: Vec<String>,
    columns: Vec<Vec<Option<f64>>>,
}

impl NumericTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from `(name, values)` pairs.
    pub fn from_columns<S: Into<String>>(columns: Vec<(S, Vec<Option<f64>>)>) -> Result<Self> {
        let mut table = Self::new();
        for (name, values) in columns {
            table.push_column(name, values)?;
        }
        Ok(table)
    }

    /// Build a table from fully observed columns.
    pub fn from_dense<S: Into<String>>(columns: Vec<(S, Vec<f64>)>) -> Result<Self> {
        Self::from_columns(
            columns
                .into_iter()
                .map(|(name, values)| (name, values.into_iter().map(Some).collect::<Vec<_>>()))
                .collect(),
        )
    }

    /// Append a column; its length must match the existing rows.
    pub fn push_column(&mut self, name: impl Into<String>, values: Vec<Option<f64>>) -> Result<()> {
        if let Some(first) = self.columns.first() {
            if first.len() != values.len() {
                return Err(StatError::LengthMismatch {
                    expected: first.len(),
                    actual: values.len(),
                });
            }
        }
        self.column_names.push(name.into());
        self.columns.push(values);
        Ok(())
    }

    pub fn n_rows(&self) -> usize {
        self.columns.first().map_or(0, |c| c.len())
    }

    pub fn n_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn column_names(&self) -> &[String] {
        &self.column_names
    }

    pub fn column_index(&self, name: &str) -> Result<usize> {
        self.column_names
            .iter()
            .position(|n| n == name)
            .ok_or_else(|| StatError::UnknownColumn(name.to_string()))
    }

    pub fn column(&self, name: &str) -> Result<&[Option<f64>]> {
        let idx = self.column_index(name)?;
        Ok(&self.columns[idx])
    }

    pub fn column_at(&self, index: usize) -> Result<&[Option<f64>]> {
        self.columns
            .get(index)
            .map(|c| c.as_slice())
            .ok_or(StatError::InvalidRange {
                index,
                len: self.columns.len(),
            })
    }

    pub fn name_at(&self, index: usize) -> Result<&str> {
        self.column_names
            .get(index)
            .map(|n| n.as_str())
            .ok_or(StatError::InvalidRange {
                index,
                len: self.column_names.len(),
            })
    }

    /// Non-missing values of one column.
    pub fn valid_column_at(&self, index: usize) -> Result<Vec<f64>> {
        Ok(valid_values(self.column_at(index)?))
    }

    /// Fails with `InvalidRange` on the first index outside the table.
    pub fn check_indices(&self, indices: &[usize]) -> Result<()> {
        match indices.iter().find(|&&i| i >= self.columns.len()) {
            Some(&index) => Err(StatError::InvalidRange {
                index,
                len: self.columns.len(),
            }),
            None => Ok(()),
        }
    }
}
