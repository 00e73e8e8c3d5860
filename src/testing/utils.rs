use crate::error::{Result, StatError};
use single_utilities::traits::FloatOps;
use std::cmp::Ordering;

/// `None` and `NaN` both count as missing.
#[inline]
pub fn present(value: Option<f64>) -> Option<f64> {
    value.filter(|v| !v.is_nan())
}

/// Drop missing entries from a column.
pub fn valid_values(values: &[Option<f64>]) -> Vec<f64> {
    values.iter().filter_map(|&v| present(v)).collect()
}

/// Pair covariate and response row by row, dropping rows where either is missing.
pub fn valid_pairs(covariate: &[Option<f64>], response: &[Option<f64>]) -> Result<Vec<(f64, f64)>> {
    if covariate.len() != response.len() {
        return Err(StatError::LengthMismatch {
            expected: covariate.len(),
            actual: response.len(),
        });
    }

    Ok(covariate
        .iter()
        .zip(response.iter())
        .filter_map(|(&x, &y)| Some((present(x)?, present(y)?)))
        .collect())
}

/// Stable ascending sort on the covariate.
pub fn sort_by_covariate(pairs: &mut [(f64, f64)]) {
    pairs.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal));
}

/// Distinct values of an ascending slice, minimum and maximum excluded.
pub fn interior_distinct(sorted: &[f64]) -> Vec<f64> {
    let mut distinct = sorted.to_vec();
    distinct.dedup();
    if distinct.len() <= 2 {
        return Vec::new();
    }
    distinct[1..distinct.len() - 1].to_vec()
}

/// Sample mean and unbiased variance (n - 1 denominator).
///
/// Two-pass so that a constant sample has exactly zero variance.
pub fn sample_moments<T>(values: &[T]) -> (f64, f64)
where
    T: FloatOps,
{
    let n = values.len();
    if n == 0 {
        return (f64::NAN, f64::NAN);
    }

    let mut sum = 0.0;
    for &val in values {
        sum += val.to_f64().unwrap_or(f64::NAN);
    }
    let mean = sum / n as f64;

    if n < 2 {
        return (mean, f64::NAN);
    }

    let mut sum_sq = 0.0;
    for &val in values {
        let d = val.to_f64().unwrap_or(f64::NAN) - mean;
        sum_sq += d * d;
    }

    (mean, sum_sq / (n - 1) as f64)
}
