//! Error types shared by the evaluators, the threshold search and the enrichment scans.

use thiserror::Error;

/// Failure kinds of the statistical engine.
///
/// `InsufficientData` and `DegenerateTable` are data-quality conditions: scans
/// record them per entry and keep going. The remaining variants describe caller
/// configuration mistakes and abort the operation immediately.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StatError {
    #[error("Insufficient data: a group has {found} valid observations, at least {required} needed")]
    InsufficientData { found: usize, required: usize },

    #[error("Degenerate contingency table: row totals {row_totals:?}, column totals {column_totals:?}")]
    DegenerateTable {
        row_totals: (u64, u64),
        column_totals: (u64, u64),
    },

    #[error("Index {index} is out of range for {len} entries")]
    InvalidRange { index: usize, len: usize },

    #[error("Unknown column '{0}'")]
    UnknownColumn(String),

    #[error("Length mismatch: expected {expected}, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("Inconsistent counts for '{label}': subset {subset} exceeds total {total}")]
    InconsistentCounts {
        label: String,
        subset: u64,
        total: u64,
    },

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Numerical failure: {0}")]
    NumericalFailure(String),
}

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, StatError>;
