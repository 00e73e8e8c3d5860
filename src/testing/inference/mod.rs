//! The significance evaluator: two groups in, `{statistic, p_value, direction}` out.
//!
//! Numeric groups are compared with a [`GroupComparison`] (Welch's t-test unless the
//! caller picks another [`TestMethod`] or supplies a closure). Count groups are
//! compared as a 2x2 [`ContingencyTable`] with Fisher's exact test.

use crate::error::Result;
use crate::testing::{Alternative, TestMethod, TestResult};

pub mod discrete;

pub mod parametric;

pub mod nonparametric;

pub use discrete::ContingencyTable;

/// A two-sample test over borrowed numeric groups.
///
/// Implementations must be pure: the same inputs always give the same result.
pub trait GroupComparison: Sync {
    fn compare(&self, first: &[f64], second: &[f64]) -> Result<TestResult<f64>>;
}

impl GroupComparison for TestMethod {
    fn compare(&self, first: &[f64], second: &[f64]) -> Result<TestResult<f64>> {
        match *self {
            TestMethod::TTest(test_type) => parametric::t_test(first, second, test_type),
            TestMethod::MannWhitney => nonparametric::mann_whitney(first, second, Alternative::TwoSided),
        }
    }
}

impl<F> GroupComparison for F
where
    F: Fn(&[f64], &[f64]) -> Result<TestResult<f64>> + Sync,
{
    fn compare(&self, first: &[f64], second: &[f64]) -> Result<TestResult<f64>> {
        self(first, second)
    }
}

/// Compare two numeric groups with Welch's t-test.
pub fn compare_groups(first: &[f64], second: &[f64]) -> Result<TestResult<f64>> {
    parametric::welch_t_test(first, second)
}

/// Compare target against background counts with Fisher's exact test.
pub fn compare_counts(table: &ContingencyTable, alternative: Alternative) -> Result<TestResult<f64>> {
    discrete::fisher_exact(table, alternative)
}
