//! Cut-off search: find the covariate value that best separates a response into
//! two groups.
//!
//! Observations are sorted by covariate once, so every candidate split is a pair
//! of borrowed sub-slices of the sorted responses:
//!
//! ```text
//! covariate  1  2  3 | 4  5  6      cutoff = 4
//! response   a  b  c | d  e  f      below = [a, b, c], at_or_above = [d, e, f]
//! ```
//!
//! Every interior distinct covariate value is tried and the split with the
//! smallest p-value wins; on ties the smallest cutoff is kept. Scanning `m`
//! candidates is `O(m * n)` evaluator work, which suits tables of tens to
//! hundreds of rows. Larger inputs should be pre-bucketed by the caller.
//!
//! The winning p-value is the minimum over many tests and is optimistic. Set
//! [`SplitConfig::candidate_correction`] to [`CandidateCorrection::Bonferroni`] to
//! multiply it by the number of evaluated candidates before the `alpha` check.

use crate::data::NumericTable;
use crate::error::{Result, StatError};
use crate::testing::inference::GroupComparison;
use crate::testing::utils::{interior_distinct, sort_by_covariate, valid_pairs};
use crate::testing::{Direction, TestMethod, TestResult};
use log::debug;
use rayon::prelude::*;

/// Smallest group a two-sample test can run on.
pub const MIN_GROUP_SIZE: usize = 2;

/// Adjustment of the best p-value for the number of candidates scanned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CandidateCorrection {
    /// Report the best p-value as observed.
    #[default]
    None,
    /// Multiply by the number of evaluated candidates, capped at 1.
    Bonferroni,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SplitConfig {
    /// Significance threshold, in (0, 1)
    pub alpha: f64,
    /// Test used to compare the two groups of each candidate
    pub method: TestMethod,
    /// Minimum observations on each side; values below 2 are raised to 2
    pub min_group_size: usize,
    pub candidate_correction: CandidateCorrection,
}

impl Default for SplitConfig {
    fn default() -> Self {
        SplitConfig {
            alpha: 0.05,
            method: TestMethod::default(),
            min_group_size: MIN_GROUP_SIZE,
            candidate_correction: CandidateCorrection::None,
        }
    }
}

impl SplitConfig {
    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    pub fn with_method(mut self, method: TestMethod) -> Self {
        self.method = method;
        self
    }

    pub fn with_min_group_size(mut self, min_group_size: usize) -> Self {
        self.min_group_size = min_group_size;
        self
    }

    pub fn with_candidate_correction(mut self, correction: CandidateCorrection) -> Self {
        self.candidate_correction = correction;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.alpha > 0.0 && self.alpha < 1.0) {
            return Err(StatError::InvalidParameter(format!(
                "alpha must be in (0, 1), got {}",
                self.alpha
            )));
        }
        Ok(())
    }

    fn group_floor(&self) -> usize {
        self.min_group_size.max(MIN_GROUP_SIZE)
    }
}

/// One evaluated candidate split.
#[derive(Debug, Clone)]
pub struct SplitEvaluation {
    pub cutoff: f64,
    pub n_below: usize,
    pub n_at_or_above: usize,
    pub result: TestResult<f64>,
}

/// Every candidate a scan evaluated, in ascending cutoff order.
#[derive(Debug, Clone, Default)]
pub struct SplitScan {
    pub evaluations: Vec<SplitEvaluation>,
    /// Interior distinct covariate values
    pub n_candidates: usize,
    /// Candidates rejected by the group-size floor or by the evaluator
    pub n_skipped: usize,
    /// Reason the first skipped candidate was rejected
    pub first_failure: Option<StatError>,
}

impl SplitScan {
    fn skip(&mut self, reason: StatError) {
        self.n_skipped += 1;
        if self.first_failure.is_none() {
            self.first_failure = Some(reason);
        }
    }

    /// Fails when candidates existed but none of them could be evaluated.
    ///
    /// A scan without any candidate (constant covariate) is not a failure.
    pub fn check_usable(&self) -> Result<()> {
        if self.n_candidates == 0 || !self.evaluations.is_empty() {
            return Ok(());
        }
        log::warn!(
            "All {} candidate cutoffs were skipped",
            self.n_candidates
        );
        Err(self.first_failure.clone().unwrap_or(StatError::InsufficientData {
            found: 0,
            required: MIN_GROUP_SIZE,
        }))
    }

    /// Candidate with the smallest p-value; the first one wins ties.
    pub fn best(&self) -> Option<&SplitEvaluation> {
        let mut best: Option<&SplitEvaluation> = None;
        for evaluation in &self.evaluations {
            let p = evaluation.result.p_value;
            match best {
                None if !p.is_nan() => best = Some(evaluation),
                Some(current) if p < current.result.p_value => best = Some(evaluation),
                _ => {}
            }
        }
        best
    }
}

/// A significant cut-off.
#[derive(Debug, Clone, PartialEq)]
pub struct BestSplit {
    pub cutoff: f64,
    /// p-value compared against `alpha` (candidate-corrected when configured)
    pub p_value: f64,
    /// p-value of the winning test before candidate correction
    pub raw_p_value: f64,
    /// `FavorsSecond` when the response is higher at or above the cutoff
    pub direction: Direction,
    pub statistic: f64,
    pub effect_size: Option<f64>,
    pub n_below: usize,
    pub n_at_or_above: usize,
    pub candidates_evaluated: usize,
}

/// Evaluate every candidate split of `response` along `covariate`.
///
/// Rows with a missing value in either column are dropped first. Candidates
/// leaving fewer than `min_group_size` (at least 2) observations on a side are
/// skipped, as are candidates the evaluator rejects for insufficient data.
pub fn scan_splits<E>(
    covariate: &[Option<f64>],
    response: &[Option<f64>],
    evaluator: &E,
    min_group_size: usize,
) -> Result<SplitScan>
where
    E: GroupComparison + ?Sized,
{
    let floor = min_group_size.max(MIN_GROUP_SIZE);

    let mut pairs = valid_pairs(covariate, response)?;
    sort_by_covariate(&mut pairs);
    let (covs, responses): (Vec<f64>, Vec<f64>) = pairs.into_iter().unzip();

    let candidates = interior_distinct(&covs);
    let n = responses.len();
    let mut scan = SplitScan {
        evaluations: Vec::with_capacity(candidates.len()),
        n_candidates: candidates.len(),
        n_skipped: 0,
        first_failure: None,
    };

    for cutoff in candidates {
        let split = covs.partition_point(|&x| x < cutoff);
        if split < floor || n - split < floor {
            debug!(
                "Skipping cutoff {}: group sizes {} and {} below {}",
                cutoff,
                split,
                n - split,
                floor
            );
            scan.skip(StatError::InsufficientData {
                found: split.min(n - split),
                required: floor,
            });
            continue;
        }

        let (below, at_or_above) = responses.split_at(split);
        match evaluator.compare(below, at_or_above) {
            Ok(result) => scan.evaluations.push(SplitEvaluation {
                cutoff,
                n_below: below.len(),
                n_at_or_above: at_or_above.len(),
                result,
            }),
            Err(e @ (StatError::InsufficientData { .. } | StatError::DegenerateTable { .. })) => {
                debug!("Skipping cutoff {}: {}", cutoff, e);
                scan.skip(e);
            }
            Err(e) => return Err(e),
        }
    }

    debug!(
        "Scanned {} observations: {} candidates, {} evaluated, {} skipped",
        n,
        scan.n_candidates,
        scan.evaluations.len(),
        scan.n_skipped
    );

    Ok(scan)
}

/// Find the most significant cut-off with Welch's t-test.
///
/// Returns `None` when no candidate reaches `alpha`, including when the
/// covariate offers no interior candidate at all. Fails with
/// `InsufficientData` when candidates exist but every one was skipped.
pub fn find_best_split(
    covariate: &[Option<f64>],
    response: &[Option<f64>],
    alpha: f64,
) -> Result<Option<BestSplit>> {
    find_best_split_with(covariate, response, &SplitConfig::default().with_alpha(alpha))
}

/// Find the most significant cut-off using the configured test method.
pub fn find_best_split_with(
    covariate: &[Option<f64>],
    response: &[Option<f64>],
    config: &SplitConfig,
) -> Result<Option<BestSplit>> {
    find_best_split_by(covariate, response, &config.method, config)
}

/// Find the most significant cut-off with a caller-supplied evaluator.
///
/// `config.method` is ignored in favour of `evaluator`.
pub fn find_best_split_by<E>(
    covariate: &[Option<f64>],
    response: &[Option<f64>],
    evaluator: &E,
    config: &SplitConfig,
) -> Result<Option<BestSplit>>
where
    E: GroupComparison + ?Sized,
{
    config.validate()?;
    let scan = scan_splits(covariate, response, evaluator, config.group_floor())?;
    scan.check_usable()?;
    Ok(select_split(&scan, config))
}

fn select_split(scan: &SplitScan, config: &SplitConfig) -> Option<BestSplit> {
    let best = scan.best()?;
    let evaluated = scan.evaluations.len();
    let raw_p = best.result.p_value;
    let p_value = match config.candidate_correction {
        CandidateCorrection::None => raw_p,
        CandidateCorrection::Bonferroni => (raw_p * evaluated as f64).min(1.0),
    };

    if p_value >= config.alpha {
        debug!(
            "Best cutoff {} has p = {} (not below alpha = {})",
            best.cutoff, p_value, config.alpha
        );
        return None;
    }

    Some(BestSplit {
        cutoff: best.cutoff,
        p_value,
        raw_p_value: raw_p,
        direction: best.result.direction,
        statistic: best.result.statistic,
        effect_size: best.result.effect_size,
        n_below: best.n_below,
        n_at_or_above: best.n_at_or_above,
        candidates_evaluated: evaluated,
    })
}

/// Result of one covariate column's search.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnSplit {
    pub covariate: String,
    pub split: Option<BestSplit>,
    /// Set when no candidate of this column could be evaluated
    pub skipped: Option<StatError>,
}

/// Search each covariate column of a table against one response column.
///
/// Every column is an independent analysis, so columns are scanned in parallel;
/// results come back in the order of `covariates`. Unknown column names fail
/// before any scan starts. A column whose every candidate was skipped reports
/// its reason in [`ColumnSplit::skipped`] instead of failing the whole call.
pub fn find_best_splits(
    table: &NumericTable,
    response: &str,
    covariates: &[&str],
    config: &SplitConfig,
) -> Result<Vec<ColumnSplit>> {
    config.validate()?;
    let response_values = table.column(response)?;
    let columns = covariates
        .iter()
        .map(|&name| Ok((name, table.column(name)?)))
        .collect::<Result<Vec<_>>>()?;

    columns
        .into_par_iter()
        .map(|(name, covariate)| {
            let (split, skipped) = match find_best_split_with(covariate, response_values, config) {
                Ok(split) => (split, None),
                Err(e @ StatError::InsufficientData { .. }) => {
                    debug!("Column '{}': no candidate could be evaluated: {}", name, e);
                    (None, Some(e))
                }
                Err(e) => return Err(e),
            };
            match &split {
                Some(s) => debug!(
                    "Column '{}': cutoff {} (p = {}, direction {:?})",
                    name, s.cutoff, s.p_value, s.direction
                ),
                None => debug!("Column '{}': no significant cutoff", name),
            }
            Ok(ColumnSplit {
                covariate: name.to_string(),
                split,
                skipped,
            })
        })
        .collect()
}
