//! Dense count table: labelled category rows × named count columns.

use crate::error::{Result, StatError};
use ndarray::{Array2, ArrayView1};

/// Counts per category (rows) and per grouping such as a taxonomic rank (columns).
///
/// A `Total` column holding the population size of each category is the usual
/// background for enrichment.
#[derive(Debug, Clone, PartialEq)]
pub struct CountTable {
    data: Array2<u64>,
    row_labels: Vec<String>,
    column_labels: Vec<String>,
}

impl CountTable {
    pub fn new(data: Array2<u64>, row_labels: Vec<String>, column_labels: Vec<String>) -> Result<Self> {
        let (nrows, ncols) = data.dim();
        if nrows != row_labels.len() {
            return Err(StatError::LengthMismatch {
                expected: nrows,
                actual: row_labels.len(),
            });
        }
        if ncols != column_labels.len() {
            return Err(StatError::LengthMismatch {
                expected: ncols,
                actual: column_labels.len(),
            });
        }
        Ok(Self {
            data,
            row_labels,
            column_labels,
        })
    }

    /// Build a table from named columns of equal length.
    pub fn from_columns<R, C>(row_labels: Vec<R>, columns: Vec<(C, Vec<u64>)>) -> Result<Self>
    where
        R: Into<String>,
        C: Into<String>,
    {
        let row_labels: Vec<String> = row_labels.into_iter().map(Into::into).collect();
        let nrows = row_labels.len();
        let ncols = columns.len();

        let mut data = Array2::<u64>::zeros((nrows, ncols));
        let mut column_labels = Vec::with_capacity(ncols);
        for (j, (label, values)) in columns.into_iter().enumerate() {
            if values.len() != nrows {
                return Err(StatError::LengthMismatch {
                    expected: nrows,
                    actual: values.len(),
                });
            }
            for (i, v) in values.into_iter().enumerate() {
                data[[i, j]] = v;
            }
            column_labels.push(label.into());
        }

        Self::new(data, row_labels, column_labels)
    }

    pub fn n_rows(&self) -> usize {
        self.data.nrows()
    }

    pub fn n_columns(&self) -> usize {
        self.data.ncols()
    }

    pub fn row_labels(&self) -> &[String] {
        &self.row_labels
    }

    pub fn column_labels(&self) -> &[String] {
        &self.column_labels
    }

    pub fn column_index(&self, label: &str) -> Result<usize> {
        self.column_labels
            .iter()
            .position(|l| l == label)
            .ok_or_else(|| StatError::UnknownColumn(label.to_string()))
    }

    pub fn column(&self, index: usize) -> Result<ArrayView1<'_, u64>> {
        self.check_column(index)?;
        Ok(self.data.column(index))
    }

    pub fn column_sum(&self, index: usize) -> Result<u64> {
        Ok(self.column(index)?.sum())
    }

    pub fn get(&self, row: usize, column: usize) -> Option<u64> {
        self.data.get([row, column]).copied()
    }

    pub fn check_column(&self, index: usize) -> Result<()> {
        if index >= self.data.ncols() {
            return Err(StatError::InvalidRange {
                index,
                len: self.data.ncols(),
            });
        }
        Ok(())
    }
}
