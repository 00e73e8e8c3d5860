use crate::error::{Result, StatError};
use single_utilities::traits::FloatOps;
use std::collections::HashMap;

pub mod correction;
pub mod effect;
pub mod inference;

pub mod utils;

/// Two-sample test applied to numeric groups.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TestMethod {
    TTest(TTestType),
    MannWhitney,
}

impl Default for TestMethod {
    fn default() -> Self {
        TestMethod::TTest(TTestType::Welch)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TTestType {
    Student, // Equal variance
    Welch,   // Unequal variance
}

/// Alternative hypothesis. For contingency tables `Greater` is the one-sided
/// enrichment mode and `Less` the depletion mode.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Alternative {
    #[default]
    TwoSided,
    Less,
    Greater,
}

/// Which of the two compared groups shows the larger mean (or rate).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Direction {
    FavorsFirst,
    FavorsSecond,
    /// The test could not run.
    #[default]
    Neither,
}

impl Direction {
    /// `FavorsSecond` iff `second > first`, mirroring how a cut-off reports
    /// whether the response rises above it.
    pub fn from_difference(first: f64, second: f64) -> Self {
        if second > first {
            Direction::FavorsSecond
        } else {
            Direction::FavorsFirst
        }
    }

    /// +1 / -1 / 0 encoding used in result tables.
    pub fn sign(&self) -> i8 {
        match self {
            Direction::FavorsFirst => -1,
            Direction::FavorsSecond => 1,
            Direction::Neither => 0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TestResult<T> {
    /// The test statistic value (e.g., t-statistic, U statistic, odds ratio)
    pub statistic: T,
    /// The p-value of the test
    pub p_value: T,
    /// Which group the data favors
    pub direction: Direction,
    /// Degrees of freedom (for parametric inference)
    pub degrees_of_freedom: Option<T>,
    /// Effect size measurement
    pub effect_size: Option<T>,
    /// Standard error of the effect size or test statistic
    pub standard_error: Option<T>,
    /// Additional test-specific information
    pub metadata: HashMap<String, T>,
}

impl<T> TestResult<T>
where
    T: FloatOps,
{
    /// Create a new test result with minimal information
    pub fn new(statistic: T, p_value: T) -> Self {
        TestResult {
            statistic,
            p_value,
            direction: Direction::Neither,
            degrees_of_freedom: None,
            effect_size: None,
            standard_error: None,
            metadata: HashMap::new(),
        }
    }

    pub fn with_direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    /// Add effect size to the result
    pub fn with_effect_size(mut self, effect_size: T) -> Self {
        self.effect_size = Some(effect_size);
        self
    }

    /// Add degrees of freedom to the result
    pub fn with_degrees_of_freedom(mut self, df: T) -> Self {
        self.degrees_of_freedom = Some(df);
        self
    }

    /// Add standard error to the result
    pub fn with_standard_error(mut self, se: T) -> Self {
        self.standard_error = Some(se);
        self
    }

    /// Add additional metadata
    pub fn with_metadata(mut self, key: &str, value: T) -> Self {
        self.metadata.insert(key.to_string(), value);
        self
    }

    /// Check if the result is statistically significant at the given threshold
    pub fn is_significant(&self, alpha: T) -> bool {
        self.p_value < alpha
    }
}

/// A test result tagged with the label it was computed for.
#[derive(Debug, Clone)]
pub struct LabeledResult {
    /// Category, column or sheet name
    pub label: String,
    /// Outer grouping, e.g. the count column a category was tested in
    pub group: Option<String>,
    pub result: TestResult<f64>,
}

/// An entry of a batch that could not be tested.
#[derive(Debug, Clone)]
pub struct SkippedTest {
    pub label: String,
    pub group: Option<String>,
    pub reason: StatError,
}

/// All tests performed together in one analysis run.
///
/// Multiple-testing correction must see a whole batch; splitting one batch
/// across corrections understates the false discovery rate.
#[derive(Debug, Clone, Default)]
pub struct TestBatch {
    pub entries: Vec<LabeledResult>,
    pub skipped: Vec<SkippedTest>,
}

impl TestBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, label: impl Into<String>, group: Option<String>, result: TestResult<f64>) {
        self.entries.push(LabeledResult {
            label: label.into(),
            group,
            result,
        });
    }

    pub fn skip(&mut self, label: impl Into<String>, group: Option<String>, reason: StatError) {
        self.skipped.push(SkippedTest {
            label: label.into(),
            group,
            reason,
        });
    }

    /// Append another batch, keeping its order after the current entries.
    pub fn append(&mut self, mut other: TestBatch) {
        self.entries.append(&mut other.entries);
        self.skipped.append(&mut other.skipped);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn labels(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.label.as_str()).collect()
    }

    pub fn p_values(&self) -> Vec<f64> {
        self.entries.iter().map(|e| e.result.p_value).collect()
    }

    pub fn get(&self, label: &str) -> Option<&LabeledResult> {
        self.entries.iter().find(|e| e.label == label)
    }

    /// Fails with the first recorded reason when every entry was skipped.
    pub fn into_usable(self) -> Result<Self> {
        if self.entries.is_empty() {
            if let Some(first) = self.skipped.first() {
                log::warn!(
                    "All {} tests in batch were skipped, first reason: {}",
                    self.skipped.len(),
                    first.reason
                );
                return Err(first.reason.clone());
            }
        }
        Ok(self)
    }

    /// Get indices of entries whose raw p-value is below the threshold
    pub fn significant_indices(&self, alpha: f64) -> Vec<usize> {
        self.entries
            .iter()
            .enumerate()
            .filter_map(|(i, e)| if e.result.p_value < alpha { Some(i) } else { None })
            .collect()
    }

    /// Get top n entries by raw p-value
    pub fn top_entries(&self, n: usize) -> Vec<usize> {
        let mut indices: Vec<usize> = (0..self.entries.len()).collect();
        indices.sort_by(|&a, &b| {
            self.entries[a]
                .result
                .p_value
                .partial_cmp(&self.entries[b].result.p_value)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        indices.truncate(n);
        indices
    }
}
