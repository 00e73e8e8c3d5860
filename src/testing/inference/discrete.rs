//! Exact and asymptotic tests on 2x2 contingency tables.
//!
//! Layout used throughout the crate:
//!
//! |                  | target | background |
//! |------------------|--------|------------|
//! | in category      | `a`    | `b`        |
//! | not in category  | `c`    | `d`        |
//!
//! Direction compares the category rate of the target column (second group)
//! against that of the background column (first group), so an enriched
//! category reports `FavorsSecond`.

use crate::error::{Result, StatError};
use crate::testing::effect::odds_ratio;
use crate::testing::{Alternative, Direction, TestResult};
use statrs::distribution::{ChiSquared, ContinuousCDF, Discrete, Hypergeometric};

/// Relative tolerance when collecting tables "no more probable" than the observed one.
const FISHER_RELATIVE_TOLERANCE: f64 = 1e-7;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContingencyTable {
    /// Target in category
    pub a: u64,
    /// Background in category
    pub b: u64,
    /// Target not in category
    pub c: u64,
    /// Background not in category
    pub d: u64,
}

impl ContingencyTable {
    pub fn new(a: u64, b: u64, c: u64, d: u64) -> Self {
        ContingencyTable { a, b, c, d }
    }

    /// Build a table from in-category subsets and their totals.
    ///
    /// Fails with `InconsistentCounts` when a subset exceeds its total, which
    /// would otherwise produce a negative cell.
    pub fn from_subsets(
        label: &str,
        target_in: u64,
        target_total: u64,
        background_in: u64,
        background_total: u64,
    ) -> Result<Self> {
        let c = target_total
            .checked_sub(target_in)
            .ok_or_else(|| StatError::InconsistentCounts {
                label: label.to_string(),
                subset: target_in,
                total: target_total,
            })?;
        let d = background_total
            .checked_sub(background_in)
            .ok_or_else(|| StatError::InconsistentCounts {
                label: label.to_string(),
                subset: background_in,
                total: background_total,
            })?;
        Ok(ContingencyTable::new(target_in, background_in, c, d))
    }

    pub fn row_totals(&self) -> (u64, u64) {
        (self.a + self.b, self.c + self.d)
    }

    pub fn column_totals(&self) -> (u64, u64) {
        (self.a + self.c, self.b + self.d)
    }

    pub fn total(&self) -> u64 {
        self.a + self.b + self.c + self.d
    }

    /// Fails with `DegenerateTable` when any margin is zero.
    pub fn check_margins(&self) -> Result<()> {
        let rows = self.row_totals();
        let cols = self.column_totals();
        if rows.0 == 0 || rows.1 == 0 || cols.0 == 0 || cols.1 == 0 {
            return Err(StatError::DegenerateTable {
                row_totals: rows,
                column_totals: cols,
            });
        }
        Ok(())
    }

    pub fn odds_ratio(&self) -> f64 {
        odds_ratio(self.a, self.b, self.c, self.d)
    }

    /// Sign of (target rate - background rate), compared via cross products.
    pub fn direction(&self) -> Direction {
        let ad = self.a as f64 * self.d as f64;
        let bc = self.b as f64 * self.c as f64;
        Direction::from_difference(bc, ad)
    }

    fn annotate(&self, result: TestResult<f64>) -> TestResult<f64> {
        result
            .with_direction(self.direction())
            .with_metadata("target_in", self.a as f64)
            .with_metadata("background_in", self.b as f64)
            .with_metadata("target_out", self.c as f64)
            .with_metadata("background_out", self.d as f64)
    }
}

/// Fisher's exact test on a 2x2 table.
///
/// The statistic is the sample odds ratio. `Greater` is the one-sided enrichment
/// test (target rate above background rate), `TwoSided` sums every table with
/// the observed margins that is no more probable than the observed table.
pub fn fisher_exact(table: &ContingencyTable, alternative: Alternative) -> Result<TestResult<f64>> {
    table.check_margins()?;

    let population = table.total();
    let successes = table.row_totals().0;
    let draws = table.column_totals().0;

    let dist = Hypergeometric::new(population, successes, draws)
        .map_err(|e| StatError::InvalidParameter(e.to_string()))?;

    // Support of the top-left cell given the margins
    let low = (draws + successes).saturating_sub(population);
    let high = successes.min(draws);
    let observed = table.a;

    // Terms underflow or overflow in linear space once the total reaches the thousands
    let ln_p_value = match alternative {
        Alternative::Greater => ln_sum_exp((observed..=high).map(|x| dist.ln_pmf(x))),
        Alternative::Less => ln_sum_exp((low..=observed).map(|x| dist.ln_pmf(x))),
        Alternative::TwoSided => {
            let cutoff = dist.ln_pmf(observed) + FISHER_RELATIVE_TOLERANCE.ln_1p();
            ln_sum_exp(
                (low..=high)
                    .map(|x| dist.ln_pmf(x))
                    .filter(|&ln_p| ln_p <= cutoff),
            )
        }
    };

    let result = TestResult::new(table.odds_ratio(), checked_p_value(ln_p_value.exp())?);
    Ok(table.annotate(result))
}

/// `ln(sum(exp(terms)))`, scaled by the largest term.
fn ln_sum_exp<I>(terms: I) -> f64
where
    I: Iterator<Item = f64> + Clone,
{
    let max = terms.clone().fold(f64::NEG_INFINITY, f64::max);
    if !max.is_finite() {
        return max;
    }
    max + terms.map(|t| (t - max).exp()).sum::<f64>().ln()
}

/// Clamp a probability into [0, 1]; NaN or infinite values are an error.
fn checked_p_value(p_value: f64) -> Result<f64> {
    if !p_value.is_finite() {
        return Err(StatError::NumericalFailure(format!(
            "p-value evaluated to {p_value}"
        )));
    }
    // -0.0 normalised to 0.0
    Ok(p_value.clamp(0.0, 1.0) + 0.0)
}

/// Pearson chi-square test of independence on a 2x2 table, 1 degree of freedom.
///
/// One-sided alternatives halve the upper tail when the observed association
/// points in the requested direction.
pub fn chi_square_test(table: &ContingencyTable, alternative: Alternative) -> Result<TestResult<f64>> {
    table.check_margins()?;

    let total = table.total() as f64;
    let (row1, row2) = table.row_totals();
    let (col1, col2) = table.column_totals();

    let expected = [
        row1 as f64 * col1 as f64 / total,
        row1 as f64 * col2 as f64 / total,
        row2 as f64 * col1 as f64 / total,
        row2 as f64 * col2 as f64 / total,
    ];
    let observed = [table.a as f64, table.b as f64, table.c as f64, table.d as f64];

    let chi_square: f64 = observed
        .iter()
        .zip(expected.iter())
        .map(|(&o, &e)| (o - e).powi(2) / e)
        .sum();

    let chi_dist = ChiSquared::new(1.0).map_err(|e| StatError::InvalidParameter(e.to_string()))?;
    let upper = chi_dist.sf(chi_square);
    let direction = table.direction();

    let p_value = match (alternative, direction) {
        (Alternative::TwoSided, _) => upper,
        (Alternative::Greater, Direction::FavorsSecond) | (Alternative::Less, Direction::FavorsFirst) => {
            upper / 2.0
        }
        _ => 1.0 - upper / 2.0,
    };

    let result = TestResult::new(chi_square, checked_p_value(p_value)?).with_degrees_of_freedom(1.0);
    Ok(table.annotate(result))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_fisher_enrichment_scenario() {
        let table = ContingencyTable::new(50, 10, 50, 90);
        let result = fisher_exact(&table, Alternative::Greater).unwrap();
        assert!(result.p_value < 1e-6, "p = {}", result.p_value);
        assert_relative_eq!(result.statistic, 9.0);
        assert_eq!(result.direction, Direction::FavorsSecond);
    }

    #[test]
    fn test_fisher_one_sided_known_value() {
        // P(X >= 8) = (C(10,8) C(6,1) + C(10,9) C(6,0)) / C(16,9) = 280 / 11440
        let table = ContingencyTable::new(8, 2, 1, 5);
        let result = fisher_exact(&table, Alternative::Greater).unwrap();
        assert_relative_eq!(result.p_value, 280.0 / 11440.0, epsilon = 1e-9);
    }

    #[test]
    fn test_fisher_two_sided_known_value() {
        let table = ContingencyTable::new(1, 9, 11, 3);
        let result = fisher_exact(&table, Alternative::TwoSided).unwrap();
        assert_relative_eq!(result.p_value, 0.0027594561852200836, epsilon = 1e-9);
        assert_eq!(result.direction, Direction::FavorsFirst);
    }

    #[test]
    fn test_fisher_tails_sum_past_one() {
        let table = ContingencyTable::new(3, 3, 3, 3);
        let greater = fisher_exact(&table, Alternative::Greater).unwrap();
        let less = fisher_exact(&table, Alternative::Less).unwrap();
        let two_sided = fisher_exact(&table, Alternative::TwoSided).unwrap();
        assert!(greater.p_value + less.p_value >= 1.0);
        assert_relative_eq!(two_sided.p_value, 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_degenerate_table() {
        let table = ContingencyTable::new(0, 0, 4, 7);
        let err = fisher_exact(&table, Alternative::TwoSided).unwrap_err();
        assert_eq!(
            err,
            StatError::DegenerateTable {
                row_totals: (0, 11),
                column_totals: (4, 7),
            }
        );
        assert!(chi_square_test(&table, Alternative::TwoSided).is_err());
    }

    #[test]
    fn test_from_subsets_rejects_negative_cells() {
        let err = ContingencyTable::from_subsets("K", 12, 10, 1, 5).unwrap_err();
        assert_eq!(
            err,
            StatError::InconsistentCounts {
                label: "K".to_string(),
                subset: 12,
                total: 10,
            }
        );
        let table = ContingencyTable::from_subsets("K", 3, 10, 1, 5).unwrap();
        assert_eq!(table, ContingencyTable::new(3, 1, 7, 4));
    }

    #[test]
    fn test_chi_square_matches_direction() {
        let table = ContingencyTable::new(50, 10, 50, 90);
        let two_sided = chi_square_test(&table, Alternative::TwoSided).unwrap();
        let greater = chi_square_test(&table, Alternative::Greater).unwrap();
        assert_relative_eq!(greater.p_value, two_sided.p_value / 2.0, epsilon = 1e-15);
        assert!(two_sided.statistic > 30.0);
    }

    #[test]
    fn test_fisher_balanced_large_table() {
        let table = ContingencyTable::new(500, 500, 500, 500);
        let two_sided = fisher_exact(&table, Alternative::TwoSided).unwrap();
        let greater = fisher_exact(&table, Alternative::Greater).unwrap();
        assert_relative_eq!(two_sided.p_value, 1.0, epsilon = 1e-6);
        assert_relative_eq!(greater.p_value, 0.517834551951791, max_relative = 1e-6);
    }

    #[test]
    fn test_fisher_genome_scale_counts() {
        // Total of 11838 genes; reference values from exact rational sums
        let table = ContingencyTable::new(404, 2373, 3418, 5643);
        let two_sided = fisher_exact(&table, Alternative::TwoSided).unwrap();
        let greater = fisher_exact(&table, Alternative::Greater).unwrap();
        let less = fisher_exact(&table, Alternative::Less).unwrap();
        assert_relative_eq!(two_sided.p_value, 7.059528921388048e-128, max_relative = 1e-6);
        assert_relative_eq!(less.p_value, 5.100767946644597e-128, max_relative = 1e-6);
        assert_relative_eq!(greater.p_value, 1.0, epsilon = 1e-9);
        assert_eq!(two_sided.direction, Direction::FavorsFirst);
    }

    #[test]
    fn test_fisher_moderate_total_known_value() {
        let table = ContingencyTable::new(77, 200, 717, 3310);
        let two_sided = fisher_exact(&table, Alternative::TwoSided).unwrap();
        let greater = fisher_exact(&table, Alternative::Greater).unwrap();
        assert_relative_eq!(two_sided.p_value, 7.888272926058757e-05, max_relative = 1e-6);
        assert_relative_eq!(greater.p_value, 5.155158335935969e-05, max_relative = 1e-6);
    }

    #[test]
    fn test_non_finite_p_value_is_an_error() {
        assert!(matches!(
            checked_p_value(f64::NAN),
            Err(StatError::NumericalFailure(_))
        ));
        assert!(checked_p_value(f64::INFINITY).is_err());
        assert_eq!(checked_p_value(-0.0).unwrap().to_bits(), 0.0f64.to_bits());
        assert_eq!(checked_p_value(1.0 + 1e-12).unwrap(), 1.0);
    }

    #[test]
    fn test_ln_sum_exp() {
        let terms = [-1000.0, -1000.0];
        assert_relative_eq!(ln_sum_exp(terms.iter().copied()), -1000.0 + 2f64.ln(), epsilon = 1e-12);
        assert_eq!(ln_sum_exp(std::iter::empty::<f64>()), f64::NEG_INFINITY);
    }
}
