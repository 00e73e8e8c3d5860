//! # cutoff-enrichment
//!
//! Significance-driven threshold search and categorical enrichment for tabular data.
//!
//! The crate answers two questions. Given a numeric covariate and a numeric response,
//! at which cutoff of the covariate does the response differ most significantly between
//! the rows below and the rows at or above it? And given per-category counts in a target
//! and a background population, which categories are over- or under-represented in the
//! target? Results from many tests are corrected for multiple testing before they are
//! reported.
//!
//! ## Core Features
//!
//! - **Threshold Search**: exhaustive scan of candidate cutoffs with Welch's t-test (or any
//!   other [`testing::inference::GroupComparison`]), single or many covariates in parallel
//! - **Categorical Enrichment**: Fisher's exact test per category with self-excluding
//!   backgrounds, over category lists, count tables and numeric columns
//! - **Multiple Testing Correction**: Benjamini-Hochberg plus BY, Bonferroni, Holm and Hochberg
//! - **Effect Sizes**: Cohen's d and odds ratios alongside every p-value
//!
//! ## Quick Start
//!
//! ```
//! use cutoff_enrichment::{find_best_split, adjust_fdr};
//! use cutoff_enrichment::enrichment::{CategoryCounts, Totals, enrich_categories};
//! use cutoff_enrichment::testing::Alternative;
//!
//! let covariate: Vec<Option<f64>> = (1..=10).map(|v| Some(v as f64)).collect();
//! let response: Vec<Option<f64>> = [1.0, 1.1, 0.9, 1.0, 1.2, 5.0, 5.1, 4.9, 5.2, 5.0]
//!     .into_iter()
//!     .map(Some)
//!     .collect();
//! let split = find_best_split(&covariate, &response, 0.05).unwrap().unwrap();
//! assert_eq!(split.cutoff, 6.0);
//!
//! let categories = vec![CategoryCounts::new("A", 50, 10), CategoryCounts::new("B", 50, 90)];
//! let batch = enrich_categories(&categories, Totals::new(100, 100), Alternative::Greater).unwrap();
//! let adjusted = adjust_fdr(&batch).unwrap();
//! assert_eq!(adjusted.significant(0.05)[0].label, "A");
//! ```
//!
//! ## Module Organization
//!
//! - **[`testing`]**: Statistical tests, effect sizes and multiple testing correction
//! - **[`threshold`]**: Cutoff search over one or many covariates
//! - **[`enrichment`]**: Category and column enrichment against a background
//! - **[`data`]**: Numeric and count tables the searches run over
//! - **[`error`]**: The crate error type

pub mod data;
pub mod enrichment;
pub mod error;
pub mod testing;
pub mod threshold;

pub use enrichment::{enrich_categories, enrich_count_table};
pub use error::{Result, StatError};
pub use testing::correction::adjust_fdr;
pub use threshold::{find_best_split, find_best_splits};
