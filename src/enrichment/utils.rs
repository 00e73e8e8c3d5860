use crate::enrichment::CategoryCounts;
use crate::error::{Result, StatError};

/// Per-tag row counts over a set of annotated rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MembershipTally {
    pub vocabulary: Vec<char>,
    /// Rows carrying each tag, aligned with `vocabulary`
    pub counts: Vec<u64>,
    /// Rows that were counted (missing codes excluded)
    pub rows: u64,
}

impl MembershipTally {
    pub fn count(&self, tag: char) -> Option<u64> {
        self.vocabulary
            .iter()
            .position(|&t| t == tag)
            .map(|i| self.counts[i])
    }
}

/// Count, for each tag of `vocabulary`, the rows whose code contains it.
///
/// A row coded `"KL"` counts once for `K` and once for `L`. Rows without a
/// code are left out of `rows`.
pub fn tally_memberships(codes: &[Option<&str>], vocabulary: &[char]) -> MembershipTally {
    tally_memberships_where(codes, |_| true, vocabulary)
}

/// [`tally_memberships`] restricted to the rows for which `keep(row_index)` holds.
pub fn tally_memberships_where<F>(codes: &[Option<&str>], keep: F, vocabulary: &[char]) -> MembershipTally
where
    F: Fn(usize) -> bool,
{
    let mut counts = vec![0u64; vocabulary.len()];
    let mut rows = 0u64;

    for (i, code) in codes.iter().enumerate() {
        let Some(code) = code else { continue };
        if !keep(i) {
            continue;
        }
        rows += 1;
        for (slot, &tag) in counts.iter_mut().zip(vocabulary.iter()) {
            if code.contains(tag) {
                *slot += 1;
            }
        }
    }

    MembershipTally {
        vocabulary: vocabulary.to_vec(),
        counts,
        rows,
    }
}

/// Pair a target tally with a background tally over the same vocabulary.
pub fn category_counts(target: &MembershipTally, background: &MembershipTally) -> Result<Vec<CategoryCounts>> {
    if target.vocabulary != background.vocabulary {
        return Err(StatError::LengthMismatch {
            expected: target.vocabulary.len(),
            actual: background.vocabulary.len(),
        });
    }

    Ok(target
        .vocabulary
        .iter()
        .zip(target.counts.iter().zip(background.counts.iter()))
        .map(|(tag, (&t, &b))| CategoryCounts::new(tag.to_string(), t, b))
        .collect())
}
