//! Parametric tests: two-sample t-tests and one-way ANOVA.
//!
//! The t-test is the numeric branch of the significance evaluator. It is called once
//! per candidate split by the threshold search, so it works on borrowed slices and
//! allocates nothing.

use crate::data::NumericTable;
use crate::error::{Result, StatError};
use crate::testing::effect::cohens_d;
use crate::testing::utils::sample_moments;
use crate::testing::{Direction, TTestType, TestResult};
use single_utilities::traits::FloatOps;
use statrs::distribution::{ContinuousCDF, FisherSnedecor, StudentsT};

/// Perform a t-test comparing two samples.
///
/// This function performs either Student's t-test (assuming equal variances) or
/// Welch's t-test (allowing unequal variances) on two samples.
///
/// # Arguments
///
/// * `x` - First sample
/// * `y` - Second sample
/// * `test_type` - Type of t-test to perform
///
/// # Returns
///
/// `TestResult` containing the t-statistic (sign of `mean(x) - mean(y)`), the
/// two-sided p-value and the direction, or `InsufficientData` when a sample has
/// fewer than 2 observations.
pub fn t_test<T>(x: &[T], y: &[T], test_type: TTestType) -> Result<TestResult<f64>>
where
    T: FloatOps,
{
    let nx = x.len();
    let ny = y.len();

    if nx < 2 || ny < 2 {
        return Err(StatError::InsufficientData {
            found: nx.min(ny),
            required: 2,
        });
    }

    let (mean1, var1) = sample_moments(x);
    let (mean2, var2) = sample_moments(y);

    let mut result = t_test_from_moments(mean1, var1, nx as f64, mean2, var2, ny as f64, test_type);
    if let Ok(d) = cohens_d(x, y) {
        result = result.with_effect_size(d);
    }
    Ok(result)
}

/// Welch's unequal-variance t-test.
pub fn welch_t_test<T>(x: &[T], y: &[T]) -> Result<TestResult<f64>>
where
    T: FloatOps,
{
    t_test(x, y, TTestType::Welch)
}

/// Perform a t-test using precomputed means and variances.
///
/// Zero standard error is resolved without dividing: identical means give
/// `t = 0, p = 1`, differing means give `t = ±inf, p = 0`.
pub fn t_test_from_moments(
    mean1: f64,
    var1: f64,
    n1: f64,
    mean2: f64,
    var2: f64,
    n2: f64,
    test_type: TTestType,
) -> TestResult<f64> {
    let direction = Direction::from_difference(mean1, mean2);
    let mean_diff = mean1 - mean2;

    let (std_err, df) = match test_type {
        TTestType::Student => {
            // Student's t-test (pooled variance)
            let pooled_var = ((n1 - 1.0) * var1 + (n2 - 1.0) * var2) / (n1 + n2 - 2.0);
            ((pooled_var * (1.0 / n1 + 1.0 / n2)).sqrt(), n1 + n2 - 2.0)
        }
        TTestType::Welch => {
            let term1 = var1 / n1;
            let term2 = var2 / n2;
            let combined_var = term1 + term2;

            // Welch-Satterthwaite equation for degrees of freedom
            let df = combined_var * combined_var
                / (term1 * term1 / (n1 - 1.0) + term2 * term2 / (n2 - 1.0));
            (combined_var.sqrt(), df)
        }
    };

    let t_stat = if std_err == 0.0 {
        if mean_diff == 0.0 {
            0.0
        } else {
            mean_diff.signum() * f64::INFINITY
        }
    } else {
        mean_diff / std_err
    };

    let p_value = t_two_sided_p_value(t_stat, df);
    let mut result = TestResult::new(t_stat, p_value).with_direction(direction);
    if df.is_finite() {
        result = result.with_degrees_of_freedom(df);
    }
    if std_err.is_finite() {
        result = result.with_standard_error(std_err);
    }
    result
}

#[inline]
fn t_two_sided_p_value(t_stat: f64, df: f64) -> f64 {
    // Fast path for non-finite inputs
    if !t_stat.is_finite() {
        return if t_stat.is_infinite() { 0.0 } else { 1.0 };
    }

    if t_stat == 0.0 {
        return 1.0;
    }

    if df <= 0.0 || !df.is_finite() {
        return 1.0;
    }

    match StudentsT::new(0.0, 1.0, df) {
        Ok(t_dist) => (2.0 * t_dist.sf(t_stat.abs())).min(1.0),
        Err(_) => 1.0,
    }
}

/// One-way analysis of variance across `k >= 2` groups.
///
/// Every group needs at least one observation and the pooled sample must exceed
/// the number of groups. The result carries the F statistic; direction is
/// `Neither` since no single pair of groups is compared.
pub fn one_way_anova<T>(groups: &[Vec<T>]) -> Result<TestResult<f64>>
where
    T: FloatOps,
{
    let k = groups.len();
    if k < 2 {
        return Err(StatError::InsufficientData {
            found: k,
            required: 2,
        });
    }

    let smallest = groups.iter().map(|g| g.len()).min().unwrap_or(0);
    if smallest == 0 {
        return Err(StatError::InsufficientData {
            found: 0,
            required: 1,
        });
    }

    let n_total: usize = groups.iter().map(|g| g.len()).sum();
    if n_total <= k {
        return Err(StatError::InsufficientData {
            found: n_total,
            required: k + 1,
        });
    }

    let moments: Vec<(f64, f64, f64)> = groups
        .iter()
        .map(|g| {
            let (mean, var) = sample_moments(g);
            (mean, if g.len() < 2 { 0.0 } else { var }, g.len() as f64)
        })
        .collect();

    let grand_mean = moments.iter().map(|&(m, _, n)| m * n).sum::<f64>() / n_total as f64;
    let ss_between: f64 = moments
        .iter()
        .map(|&(m, _, n)| n * (m - grand_mean) * (m - grand_mean))
        .sum();
    let ss_within: f64 = moments.iter().map(|&(_, v, n)| (n - 1.0) * v).sum();

    let df_between = (k - 1) as f64;
    let df_within = (n_total - k) as f64;
    let ms_between = ss_between / df_between;
    let ms_within = ss_within / df_within;

    let (f_stat, p_value) = if ms_within == 0.0 {
        if ms_between == 0.0 {
            (0.0, 1.0)
        } else {
            (f64::INFINITY, 0.0)
        }
    } else {
        let f = ms_between / ms_within;
        let p = match FisherSnedecor::new(df_between, df_within) {
            Ok(dist) => dist.sf(f).min(1.0),
            Err(_) => 1.0,
        };
        (f, p)
    };

    Ok(TestResult::new(f_stat, p_value)
        .with_degrees_of_freedom(df_between)
        .with_metadata("df_within", df_within)
        .with_metadata("ss_between", ss_between)
        .with_metadata("ss_within", ss_within))
}

/// One-way ANOVA across the given columns of a table, one group per column.
///
/// Missing values are dropped per column. An out-of-range index fails with
/// `InvalidRange` before anything is computed.
pub fn anova_columns(table: &NumericTable, indices: &[usize]) -> Result<TestResult<f64>> {
    table.check_indices(indices)?;
    let groups = indices
        .iter()
        .map(|&i| table.valid_column_at(i))
        .collect::<Result<Vec<Vec<f64>>>>()?;
    one_way_anova(&groups)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_welch_known_value() {
        // t = -5, df = 8
        let x = [1.0, 2.0, 3.0, 4.0, 5.0];
        let y = [6.0, 7.0, 8.0, 9.0, 10.0];
        let result = welch_t_test(&x, &y).unwrap();
        assert_relative_eq!(result.statistic, -5.0, epsilon = 1e-12);
        assert_relative_eq!(result.degrees_of_freedom.unwrap(), 8.0, epsilon = 1e-12);
        assert!(result.p_value > 0.0009 && result.p_value < 0.0012, "p = {}", result.p_value);
        assert_eq!(result.direction, Direction::FavorsSecond);
    }

    #[test]
    fn test_insufficient_data() {
        let err = welch_t_test(&[1.0], &[1.0, 2.0, 3.0]).unwrap_err();
        assert_eq!(err, StatError::InsufficientData { found: 1, required: 2 });
    }

    #[test]
    fn test_constant_groups_with_different_means() {
        let result = welch_t_test(&[1.0, 1.0, 1.0], &[9.0, 9.0]).unwrap();
        assert!(result.statistic.is_infinite());
        assert_eq!(result.p_value, 0.0);
        assert_eq!(result.direction, Direction::FavorsSecond);
    }

    #[test]
    fn test_constant_identical_groups() {
        let result = t_test(&[5.0, 5.0, 5.0], &[5.0, 5.0], TTestType::Student).unwrap();
        assert_eq!(result.statistic, 0.0);
        assert_eq!(result.p_value, 1.0);
        assert_eq!(result.direction, Direction::FavorsFirst);
    }

    #[test]
    fn test_one_constant_group() {
        let result = welch_t_test(&[2.0, 2.0, 2.0], &[1.0, 2.0, 3.0, 4.0]).unwrap();
        assert!(result.p_value.is_finite());
        assert!(result.p_value > 0.05);
        assert_relative_eq!(result.degrees_of_freedom.unwrap(), 3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_student_matches_welch_for_balanced_equal_variance() {
        let x = [1.0, 2.0, 3.0, 4.0, 5.0];
        let y = [2.0, 3.0, 4.0, 5.0, 6.0];
        let student = t_test(&x, &y, TTestType::Student).unwrap();
        let welch = t_test(&x, &y, TTestType::Welch).unwrap();
        assert_relative_eq!(student.statistic, welch.statistic, epsilon = 1e-12);
        assert_relative_eq!(student.p_value, welch.p_value, epsilon = 1e-10);
    }

    #[test]
    fn test_anova_known_value() {
        // F = 12 with (2, 6) df, p = (1 + 2 * 12 / 6)^-3 = 0.008
        let groups = vec![vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0], vec![7.0, 8.0, 9.0]];
        let result = one_way_anova(&groups).unwrap();
        assert_relative_eq!(result.statistic, 12.0, epsilon = 1e-10);
        assert_relative_eq!(result.p_value, 0.008, epsilon = 1e-6);
        assert_eq!(result.direction, Direction::Neither);
    }

    #[test]
    fn test_anova_needs_two_groups() {
        assert!(one_way_anova(&[vec![1.0, 2.0]]).is_err());
        assert!(one_way_anova(&[vec![1.0, 2.0], vec![]]).is_err());
    }

    #[test]
    fn test_anova_over_table_columns() {
        let table = NumericTable::from_columns(vec![
            ("a", vec![Some(1.0), Some(2.0), Some(3.0), None]),
            ("b", vec![Some(4.0), None, Some(5.0), Some(6.0)]),
            ("c", vec![Some(7.0), Some(8.0), Some(9.0), Some(f64::NAN)]),
        ])
        .unwrap();
        let result = anova_columns(&table, &[0, 1, 2]).unwrap();
        assert_relative_eq!(result.statistic, 12.0, epsilon = 1e-10);

        let err = anova_columns(&table, &[0, 7]).unwrap_err();
        assert_eq!(err, StatError::InvalidRange { index: 7, len: 3 });
    }
}
