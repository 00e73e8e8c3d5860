//! Multiple testing correction methods to control for false positives
//! when performing many statistical tests simultaneously.

use crate::testing::{Direction, SkippedTest, TestBatch};
use anyhow::{Result, anyhow};
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CorrectionMethod {
    #[default]
    BenjaminiHochberg,
    BenjaminiYekutieli,
    Bonferroni,
    Holm,
    Hochberg,
}

impl CorrectionMethod {
    pub fn apply(&self, p_values: &[f64]) -> Result<Vec<f64>> {
        match self {
            CorrectionMethod::BenjaminiHochberg => benjamini_hochberg_correction(p_values),
            CorrectionMethod::BenjaminiYekutieli => benjamini_yekutieli_correction(p_values),
            CorrectionMethod::Bonferroni => bonferroni_correction(p_values),
            CorrectionMethod::Holm => holm_bonferroni_correction(p_values),
            CorrectionMethod::Hochberg => hochberg_correction(p_values),
        }
    }
}

fn validate_p_values(p_values: &[f64]) -> Result<()> {
    for (i, &p) in p_values.iter().enumerate() {
        if !(0.0..=1.0).contains(&p) {
            return Err(anyhow!("Invalid p-value at index {}: {}", i, p));
        }
    }
    Ok(())
}

/// Indices of `p_values` in ascending order; ties keep input order.
fn ascending_order(p_values: &[f64]) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..p_values.len()).collect();
    indices.sort_by(|&a, &b| p_values[a].partial_cmp(&p_values[b]).unwrap_or(Ordering::Equal));
    indices
}

/// Step-up adjustment shared by BH and BY: `min over j >= i of p_j * factor / j`.
fn step_up(p_values: &[f64], factor: f64) -> Vec<f64> {
    let n = p_values.len();
    let order = ascending_order(p_values);

    let mut adjusted_p_values = vec![0.0; n];
    let mut current_min: f64 = 1.0;

    // Process from largest to smallest p-value
    for i in (0..n).rev() {
        let orig_idx = order[i];
        let rank = (i + 1) as f64;
        let adjustment = (p_values[orig_idx] * factor / rank).min(1.0);
        current_min = adjustment.min(current_min);
        adjusted_p_values[orig_idx] = current_min;
    }

    adjusted_p_values
}

/// Apply Bonferroni correction to p-values
///
/// Bonferroni correction is a simple but conservative method that multiplies
/// each p-value by the number of tests.
pub fn bonferroni_correction(p_values: &[f64]) -> Result<Vec<f64>> {
    validate_p_values(p_values)?;
    let n = p_values.len() as f64;
    Ok(p_values.iter().map(|&p| (p * n).min(1.0)).collect())
}

/// Apply Benjamini-Hochberg (BH) procedure for controlling false discovery rate
///
/// The BH procedure controls the false discovery rate (FDR), which is the expected
/// proportion of false positives among all rejected null hypotheses.
///
/// # Arguments
/// * `p_values` - A slice of p-values to adjust, each in [0, 1]
///
/// # Returns
/// * `Result<Vec<f64>>` - Adjusted p-values in input order; empty for empty input
///
/// # Example
/// ```
/// use cutoff_enrichment::testing::correction::benjamini_hochberg_correction;
///
/// let p_values = vec![0.01, 0.03, 0.05];
/// let adjusted = benjamini_hochberg_correction(&p_values).unwrap();
/// assert_eq!(adjusted.len(), 3);
/// ```
pub fn benjamini_hochberg_correction(p_values: &[f64]) -> Result<Vec<f64>> {
    validate_p_values(p_values)?;
    Ok(step_up(p_values, p_values.len() as f64))
}

/// Apply Benjamini-Yekutieli (BY) procedure for controlling false discovery rate under dependence
///
/// The BY procedure is a more conservative variant of the BH procedure that is valid
/// under arbitrary dependence structures among the tests.
pub fn benjamini_yekutieli_correction(p_values: &[f64]) -> Result<Vec<f64>> {
    validate_p_values(p_values)?;
    let n = p_values.len();
    let c_n: f64 = (1..=n).map(|i| 1.0 / i as f64).sum();
    Ok(step_up(p_values, c_n * n as f64))
}

/// Apply Holm-Bonferroni (step-down) method for controlling family-wise error rate
///
/// `adj_(i) = max over j <= i of (n - j + 1) * p_(j)`, capped at 1.
pub fn holm_bonferroni_correction(p_values: &[f64]) -> Result<Vec<f64>> {
    validate_p_values(p_values)?;
    let n = p_values.len();
    let order = ascending_order(p_values);

    let mut adjusted_p_values = vec![0.0; n];
    let mut current_max: f64 = 0.0;
    for (i, &orig_idx) in order.iter().enumerate() {
        let adjustment = (p_values[orig_idx] * (n - i) as f64).min(1.0);
        current_max = current_max.max(adjustment);
        adjusted_p_values[orig_idx] = current_max;
    }

    Ok(adjusted_p_values)
}

/// Apply Hochberg's step-up method for controlling family-wise error rate
///
/// `adj_(i) = min over j >= i of (n - j + 1) * p_(j)`, capped at 1.
pub fn hochberg_correction(p_values: &[f64]) -> Result<Vec<f64>> {
    validate_p_values(p_values)?;
    let n = p_values.len();
    let order = ascending_order(p_values);

    let mut adjusted_p_values = vec![0.0; n];
    let mut current_min: f64 = 1.0;
    for i in (0..n).rev() {
        let orig_idx = order[i];
        let adjustment = (p_values[orig_idx] * (n - i) as f64).min(1.0);
        current_min = current_min.min(adjustment);
        adjusted_p_values[orig_idx] = current_min;
    }

    Ok(adjusted_p_values)
}

/// One row of a corrected batch.
#[derive(Debug, Clone)]
pub struct AdjustedResult {
    pub label: String,
    pub group: Option<String>,
    pub statistic: f64,
    pub direction: Direction,
    pub raw_p: f64,
    pub adjusted_p: f64,
}

/// A test batch after multiple-testing correction, in the batch's own order.
#[derive(Debug, Clone)]
pub struct AdjustedBatch {
    pub method: CorrectionMethod,
    pub rows: Vec<AdjustedResult>,
    /// Entries that never produced a p-value, carried through for reporting
    pub skipped: Vec<SkippedTest>,
}

impl AdjustedBatch {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn adjusted_p_values(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.adjusted_p).collect()
    }

    /// Rows whose adjusted p-value is below `alpha`.
    pub fn significant(&self, alpha: f64) -> Vec<&AdjustedResult> {
        self.rows.iter().filter(|r| r.adjusted_p < alpha).collect()
    }

    pub fn num_significant(&self, alpha: f64) -> usize {
        self.significant(alpha).len()
    }
}

/// Correct every p-value of a batch with the given method.
///
/// The whole batch is adjusted at once; no row is dropped.
pub fn adjust_batch(batch: &TestBatch, method: CorrectionMethod) -> Result<AdjustedBatch> {
    let raw = batch.p_values();
    let adjusted = method.apply(&raw)?;

    log::debug!(
        "Adjusted {} p-values with {:?} ({} skipped entries)",
        raw.len(),
        method,
        batch.skipped.len()
    );

    let rows = batch
        .entries
        .iter()
        .zip(adjusted)
        .map(|(entry, adjusted_p)| AdjustedResult {
            label: entry.label.clone(),
            group: entry.group.clone(),
            statistic: entry.result.statistic,
            direction: entry.result.direction,
            raw_p: entry.result.p_value,
            adjusted_p,
        })
        .collect();

    Ok(AdjustedBatch {
        method,
        rows,
        skipped: batch.skipped.clone(),
    })
}

/// Benjamini-Hochberg adjustment of a whole batch, order-preserving.
pub fn adjust_fdr(batch: &TestBatch) -> Result<AdjustedBatch> {
    adjust_batch(batch, CorrectionMethod::BenjaminiHochberg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::TestResult;

    fn assert_vec_relative_eq(a: &[f64], b: &[f64], epsilon: f64) {
        assert_eq!(a.len(), b.len(), "Vectors have different lengths");
        for (i, (x, y)) in a.iter().zip(b.iter()).enumerate() {
            if (x - y).abs() > epsilon {
                panic!("Vectors differ at index {}: {} != {}", i, x, y);
            }
        }
    }

    #[test]
    fn test_bonferroni() {
        let p_values = vec![0.01, 0.02, 0.03, 0.1, 0.2];
        let expected = vec![0.05, 0.1, 0.15, 0.5, 1.0];
        let adjusted = bonferroni_correction(&p_values).unwrap();
        assert_vec_relative_eq(&adjusted, &expected, 1e-10);
    }

    use approx::assert_relative_eq;

    #[test]
    fn test_benjamini_hochberg_empty_input() {
        let adjusted = benjamini_hochberg_correction(&[]).unwrap();
        assert!(adjusted.is_empty());
    }

    #[test]
    fn test_benjamini_hochberg_invalid_pvalues() {
        let result = benjamini_hochberg_correction(&[0.01, -0.5, 0.03]);
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("Invalid p-value at index 1")
        );

        let result = benjamini_hochberg_correction(&[0.01, 1.5, 0.03]);
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("Invalid p-value at index 1")
        );

        assert!(benjamini_hochberg_correction(&[f64::NAN]).is_err());
    }

    #[test]
    fn test_benjamini_hochberg_identical_pvalues() {
        let adjusted = benjamini_hochberg_correction(&[0.05, 0.05, 0.05]).unwrap();
        for a in adjusted {
            assert_relative_eq!(a, 0.05, epsilon = 1e-10);
        }
    }

    #[test]
    fn test_benjamini_hochberg_unordered_pvalues() {
        let p_values = vec![0.05, 0.01, 0.1, 0.04, 0.02];
        let expected = vec![0.0625, 0.05, 0.1, 0.0625, 0.05];
        let adjusted = benjamini_hochberg_correction(&p_values).unwrap();
        assert_vec_relative_eq(&adjusted, &expected, 1e-10);
    }

    #[test]
    fn test_benjamini_hochberg_real_example() {
        let pvalues = vec![0.1, 0.2, 0.3, 0.4, 0.1];
        let expected = [0.25, 0.3333333333333333, 0.375, 0.4, 0.25];
        let adjusted = benjamini_hochberg_correction(&pvalues).unwrap();
        assert_vec_relative_eq(&adjusted, &expected, 1e-10);
    }

    #[test]
    fn test_benjamini_hochberg_edge_cases() {
        let adjusted = benjamini_hochberg_correction(&[1e-10, 1e-9, 1e-8]).unwrap();
        assert!(adjusted.iter().all(|&p| p > 0.0 && p < 0.001));

        let adjusted = benjamini_hochberg_correction(&[0.1, 0.2, 1.0]).unwrap();
        assert_relative_eq!(adjusted[2], 1.0, epsilon = 1e-10);
    }

    #[test]
    fn test_benjamini_yekutieli_is_more_conservative() {
        let p_values = vec![0.01, 0.02, 0.03, 0.2];
        let bh = benjamini_hochberg_correction(&p_values).unwrap();
        let by = benjamini_yekutieli_correction(&p_values).unwrap();
        for (b, y) in bh.iter().zip(by.iter()) {
            assert!(y >= b);
        }
    }

    #[test]
    fn test_holm_bonferroni() {
        let p_values = vec![0.01, 0.02, 0.03];
        let expected = vec![0.03, 0.04, 0.04];
        let adjusted = holm_bonferroni_correction(&p_values).unwrap();
        assert_vec_relative_eq(&adjusted, &expected, 1e-10);
    }

    #[test]
    fn test_hochberg() {
        let p_values = vec![0.01, 0.02, 0.03];
        let expected = vec![0.03, 0.03, 0.03];
        let adjusted = hochberg_correction(&p_values).unwrap();
        assert_vec_relative_eq(&adjusted, &expected, 1e-10);
    }

    #[test]
    fn test_adjust_fdr_preserves_labels() {
        let mut batch = TestBatch::new();
        for (label, p) in [("J", 0.01), ("K", 0.20), ("L", 0.03), ("C", 0.50), ("E", 0.04)] {
            batch.push(label, None, TestResult::new(0.0, p));
        }

        let adjusted = adjust_fdr(&batch).unwrap();
        let labels: Vec<&str> = adjusted.rows.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels, vec!["J", "K", "L", "C", "E"]);
        assert_vec_relative_eq(
            &adjusted.adjusted_p_values(),
            &[0.05, 0.25, 0.2 / 3.0, 0.5, 0.2 / 3.0],
            1e-10,
        );
        for row in &adjusted.rows {
            assert!(row.adjusted_p >= row.raw_p);
        }
        assert_eq!(adjusted.num_significant(0.06), 1);
    }

    #[test]
    fn test_adjust_empty_batch() {
        let adjusted = adjust_fdr(&TestBatch::new()).unwrap();
        assert!(adjusted.is_empty());
    }
}
