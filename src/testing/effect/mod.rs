use crate::testing::utils::sample_moments;
use anyhow::anyhow;
use single_utilities::traits::FloatOps;

/// Difference of group means, second minus first
pub fn mean_difference<T>(first: &[T], second: &[T]) -> anyhow::Result<f64>
where
    T: FloatOps,
{
    if first.is_empty() || second.is_empty() {
        return Err(anyhow!("Groups cannot be empty"));
    }

    let (mean1, _) = sample_moments(first);
    let (mean2, _) = sample_moments(second);
    Ok(mean2 - mean1)
}

/// Calculate Cohen's d effect size, second group relative to the first
pub fn cohens_d<T>(first: &[T], second: &[T]) -> anyhow::Result<f64>
where
    T: FloatOps,
{
    if first.len() < 2 || second.len() < 2 {
        return Err(anyhow!(
            "Each group must have at least 2 samples for Cohen's d"
        ));
    }

    let (mean1, var1) = sample_moments(first);
    let (mean2, var2) = sample_moments(second);

    // Calculate pooled standard deviation
    let n1 = first.len() as f64;
    let n2 = second.len() as f64;
    let pooled_sd = ((n1 - 1.0) * var1 + (n2 - 1.0) * var2).sqrt() / ((n1 + n2 - 2.0).sqrt());

    if pooled_sd == 0.0 {
        return Err(anyhow!("Pooled standard deviation is zero"));
    }

    Ok((mean2 - mean1) / pooled_sd)
}

/// Sample odds ratio `(a * d) / (b * c)` of a 2x2 table.
///
/// Infinite when only the denominator is zero, NaN when both products are zero.
pub fn odds_ratio(a: u64, b: u64, c: u64, d: u64) -> f64 {
    let numerator = a as f64 * d as f64;
    let denominator = b as f64 * c as f64;
    if denominator == 0.0 {
        if numerator == 0.0 { f64::NAN } else { f64::INFINITY }
    } else {
        numerator / denominator
    }
}
