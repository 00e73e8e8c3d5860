use crate::data::CountTable;
use crate::error::{Result, StatError};
use crate::testing::inference::{ContingencyTable, compare_counts};
use crate::testing::{Alternative, TestBatch};
use log::debug;
use rayon::prelude::*;

/// Counts of one category in the target and in the background.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryCounts {
    pub label: String,
    pub target: u64,
    pub background: u64,
}

impl CategoryCounts {
    pub fn new(label: impl Into<String>, target: u64, background: u64) -> Self {
        CategoryCounts {
            label: label.into(),
            target,
            background,
        }
    }
}

/// Sizes of the whole target and background populations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Totals {
    pub target: u64,
    pub background: u64,
}

impl Totals {
    pub fn new(target: u64, background: u64) -> Self {
        Totals { target, background }
    }

    /// Sum of the per-category counts; valid when categories do not overlap.
    pub fn from_categories(categories: &[CategoryCounts]) -> Self {
        Totals {
            target: categories.iter().map(|c| c.target).sum(),
            background: categories.iter().map(|c| c.background).sum(),
        }
    }
}

/// Test every category for association with the target.
///
/// The table of category `A` is `[[target_A, background_A], [target_total -
/// target_A, background_total - background_A]]`: the not-in-category cells
/// exclude `A`'s own counts, so `A` never acts as its own background.
///
/// Categories with a zero margin are skipped and listed in the batch. The call
/// fails when a category count exceeds its total, or when every category was
/// skipped.
pub fn enrich_categories(
    categories: &[CategoryCounts],
    totals: Totals,
    mode: Alternative,
) -> Result<TestBatch> {
    category_batch(categories, totals, mode, None)?.into_usable()
}

fn category_batch(
    categories: &[CategoryCounts],
    totals: Totals,
    mode: Alternative,
    group: Option<&str>,
) -> Result<TestBatch> {
    let mut batch = TestBatch::new();

    for category in categories {
        let table = ContingencyTable::from_subsets(
            &category.label,
            category.target,
            totals.target,
            category.background,
            totals.background,
        )?;

        match compare_counts(&table, mode) {
            Ok(result) => batch.push(category.label.clone(), group.map(str::to_string), result),
            Err(e @ (StatError::DegenerateTable { .. } | StatError::InsufficientData { .. })) => {
                debug!("Skipping category '{}': {}", category.label, e);
                batch.skip(category.label.clone(), group.map(str::to_string), e);
            }
            Err(e) => return Err(e),
        }
    }

    Ok(batch)
}

/// Enrichment of every category (row) within each target column of a count table.
///
/// For row `i` and column `c` the target is `table[i, c]` and the background is
/// `table[i, total_column] - table[i, c]`; totals are the column sums. All
/// (column, row) tests form a single batch in column-major order, with the
/// column label as each entry's group. Columns are evaluated in parallel.
///
/// Out-of-range column indices fail with `InvalidRange` before any test runs.
pub fn enrich_count_table(
    table: &CountTable,
    target_columns: &[usize],
    total_column: usize,
    mode: Alternative,
) -> Result<TestBatch> {
    table.check_column(total_column)?;
    for &c in target_columns {
        table.check_column(c)?;
    }

    let totals_column = table.column(total_column)?;
    let grand_total: u64 = totals_column.sum();

    let batches = target_columns
        .par_iter()
        .map(|&c| {
            let column = table.column(c)?;
            let column_label = &table.column_labels()[c];

            let categories = table
                .row_labels()
                .iter()
                .zip(column.iter().zip(totals_column.iter()))
                .map(|(label, (&in_column, &row_total))| {
                    let background = row_total.checked_sub(in_column).ok_or_else(|| {
                        StatError::InconsistentCounts {
                            label: label.clone(),
                            subset: in_column,
                            total: row_total,
                        }
                    })?;
                    Ok(CategoryCounts::new(label.clone(), in_column, background))
                })
                .collect::<Result<Vec<_>>>()?;

            let column_total = column.sum();
            let background_total =
                grand_total
                    .checked_sub(column_total)
                    .ok_or_else(|| StatError::InconsistentCounts {
                        label: column_label.clone(),
                        subset: column_total,
                        total: grand_total,
                    })?;

            category_batch(
                &categories,
                Totals::new(column_total, background_total),
                mode,
                Some(column_label),
            )
        })
        .collect::<Vec<Result<TestBatch>>>();

    let mut batch = TestBatch::new();
    for column_batch in batches {
        batch.append(column_batch?);
    }

    debug!(
        "Count table enrichment: {} tests over {} columns, {} skipped",
        batch.len(),
        target_columns.len(),
        batch.skipped.len()
    );

    batch.into_usable()
}
