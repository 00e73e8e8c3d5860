//! Categorical enrichment: is a category over- or under-represented in a target
//! set compared to a background?
//!
//! Every category becomes a 2x2 [`ContingencyTable`](crate::testing::inference::ContingencyTable)
//! scored with Fisher's exact test, and all categories of one run land in a single
//! [`TestBatch`](crate::testing::TestBatch) so that the false discovery rate
//! correction sees the whole run.
//!
//! ## Available Methods
//!
//! - **Category counts** (`enrich_categories`): per-category target and background
//!   counts against fixed totals
//! - **Count tables** (`enrich_count_table`): every (count column, category) pair of a
//!   table with a per-category total column, as one batch
//! - **Column thresholds** (`enrich_columns_above`): share of values above a cutoff in
//!   one column versus all other columns
//! - **Membership tallies** (`tally_memberships`): category counts from per-row tag
//!   strings such as COG codes
//!
//! ## Quick Example
//!
//! ```rust
//! use cutoff_enrichment::enrichment::{CategoryCounts, Totals, enrich_categories};
//! use cutoff_enrichment::testing::Alternative;
//! use cutoff_enrichment::testing::correction::adjust_fdr;
//!
//! let categories = vec![
//!     CategoryCounts::new("K", 50, 10),
//!     CategoryCounts::new("L", 20, 30),
//! ];
//! let totals = Totals::new(100, 100);
//! let batch = enrich_categories(&categories, totals, Alternative::Greater).unwrap();
//! let adjusted = adjust_fdr(&batch).unwrap();
//! assert_eq!(adjusted.rows[0].label, "K");
//! ```

mod categories;
mod columns;
pub(crate) mod utils;

pub use categories::{CategoryCounts, Totals, enrich_categories, enrich_count_table};
pub use columns::{ColumnEnrichment, enrich_column_above, enrich_columns_above};
pub use utils::{MembershipTally, category_counts, tally_memberships, tally_memberships_where};
