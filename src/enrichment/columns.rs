use crate::data::NumericTable;
use crate::error::{Result, StatError};
use crate::testing::inference::{ContingencyTable, compare_counts};
use crate::testing::{Alternative, TestBatch, TestResult};
use crate::testing::utils::valid_values;
use log::debug;

/// Outcome of testing one column's share of values above a cutoff.
#[derive(Debug, Clone)]
pub struct ColumnEnrichment {
    pub label: String,
    pub table: ContingencyTable,
    pub result: TestResult<f64>,
}

/// Is column `index` enriched in values above `cutoff` compared to every other
/// column of the table?
///
/// The background pools the non-missing values of all other columns. The
/// category is "value > cutoff", so the table is
/// `[[target above, background above], [target at or below, background at or below]]`.
pub fn enrich_column_above(
    table: &NumericTable,
    index: usize,
    cutoff: f64,
    mode: Alternative,
) -> Result<ColumnEnrichment> {
    let label = table.name_at(index)?.to_string();
    let target = table.valid_column_at(index)?;

    let mut background_above = 0u64;
    let mut background_total = 0u64;
    for other in (0..table.n_columns()).filter(|&i| i != index) {
        for value in valid_values(table.column_at(other)?) {
            background_total += 1;
            if value > cutoff {
                background_above += 1;
            }
        }
    }

    let target_above = target.iter().filter(|&&v| v > cutoff).count() as u64;
    let contingency = ContingencyTable::from_subsets(
        &label,
        target_above,
        target.len() as u64,
        background_above,
        background_total,
    )?;

    let result = compare_counts(&contingency, mode)?;
    Ok(ColumnEnrichment {
        label,
        table: contingency,
        result,
    })
}

/// Run [`enrich_column_above`] for each requested column as one batch.
///
/// Every index is checked before testing starts; an out-of-range index fails
/// the whole call with `InvalidRange`. Columns whose table has a zero margin
/// (for example an all-missing column) are skipped.
pub fn enrich_columns_above(
    table: &NumericTable,
    indices: &[usize],
    cutoff: f64,
    mode: Alternative,
) -> Result<TestBatch> {
    table.check_indices(indices)?;

    let mut batch = TestBatch::new();
    for &index in indices {
        match enrich_column_above(table, index, cutoff, mode) {
            Ok(enrichment) => batch.push(enrichment.label, None, enrichment.result),
            Err(e @ (StatError::DegenerateTable { .. } | StatError::InsufficientData { .. })) => {
                let label = table.name_at(index)?;
                debug!("Skipping column '{}': {}", label, e);
                batch.skip(label, None, e);
            }
            Err(e) => return Err(e),
        }
    }

    batch.into_usable()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::Direction;

    fn ratio_table() -> NumericTable {
        NumericTable::from_columns(vec![
            (
                "complementary",
                vec![Some(0.9), Some(0.8), Some(0.7), Some(0.95), Some(0.6), Some(0.85), None, Some(0.2)],
            ),
            (
                "config_a",
                vec![Some(0.1), Some(0.2), Some(0.3), Some(0.4), Some(0.6), Some(0.1), Some(0.2), Some(0.3)],
            ),
            (
                "config_b",
                vec![Some(0.2), Some(0.5), Some(0.3), Some(0.1), Some(0.2), Some(0.7), Some(0.4), Some(0.3)],
            ),
        ])
        .unwrap()
    }

    #[test]
    fn test_column_enriched_above_half() {
        let table = ratio_table();
        let enrichment = enrich_column_above(&table, 0, 0.5, Alternative::Greater).unwrap();
        // 6 of 7 target values above 0.5, 2 of 16 background values
        assert_eq!(enrichment.table, ContingencyTable::new(6, 2, 1, 14));
        assert!(enrichment.result.p_value < 0.01);
        assert_eq!(enrichment.result.direction, Direction::FavorsSecond);
    }

    #[test]
    fn test_columns_batch() {
        let table = ratio_table();
        let batch = enrich_columns_above(&table, &[0, 1, 2], 0.5, Alternative::Greater).unwrap();
        assert_eq!(batch.labels(), vec!["complementary", "config_a", "config_b"]);
        assert!(batch.entries[1].result.p_value > 0.5);
    }

    #[test]
    fn test_out_of_range_index() {
        let table = ratio_table();
        let err = enrich_columns_above(&table, &[1, 3], 0.5, Alternative::Greater).unwrap_err();
        assert_eq!(err, StatError::InvalidRange { index: 3, len: 3 });
    }

    #[test]
    fn test_all_missing_column_is_skipped() {
        let mut table = ratio_table();
        table.push_column("empty", vec![None; 8]).unwrap();
        let batch = enrich_columns_above(&table, &[0, 3], 0.5, Alternative::Greater).unwrap();
        assert_eq!(batch.labels(), vec!["complementary"]);
        assert_eq!(batch.skipped[0].label, "empty");
    }
}
