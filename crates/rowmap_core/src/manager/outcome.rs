//! Flush results.

use crate::entity::EntityHandle;
use rowmap_codec::Value;

/// What flushing one tracked instance did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlushOutcome {
    /// The instance was inserted and is now tracked.
    Inserted {
        /// Identifier written back to the autoincrement field, if any.
        generated_id: Option<Value>,
    },
    /// The instance was dirty and exactly one row was updated.
    Updated,
    /// The instance was dirty but the update did not affect exactly one row.
    NotApplied {
        /// Rows the update statement affected.
        affected: u64,
    },
    /// The instance was clean; no statement was issued.
    Unchanged,
    /// The instance was deleted and is no longer tracked.
    Deleted {
        /// Rows the delete statement affected.
        affected: u64,
    },
}

impl FlushOutcome {
    /// Returns `true` if a write statement was issued.
    #[must_use]
    pub const fn issued_write(&self) -> bool {
        !matches!(self, Self::Unchanged)
    }

    /// Returns `false` only for [`FlushOutcome::NotApplied`].
    #[must_use]
    pub const fn is_applied(&self) -> bool {
        !matches!(self, Self::NotApplied { .. })
    }
}

/// Per-instance outcomes of a full flush, in processing order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlushReport {
    outcomes: Vec<(EntityHandle, FlushOutcome)>,
}

impl FlushReport {
    pub(crate) fn push(&mut self, handle: EntityHandle, outcome: FlushOutcome) {
        self.outcomes.push((handle, outcome));
    }

    /// Returns the outcome for `handle`, if it was processed.
    #[must_use]
    pub fn outcome(&self, handle: EntityHandle) -> Option<&FlushOutcome> {
        self.outcomes
            .iter()
            .find_map(|(h, outcome)| (*h == handle).then_some(outcome))
    }

    /// Iterates over `(handle, outcome)` pairs in processing order.
    pub fn iter(&self) -> impl Iterator<Item = (EntityHandle, &FlushOutcome)> {
        self.outcomes.iter().map(|(h, outcome)| (*h, outcome))
    }

    /// Returns the number of processed instances.
    #[must_use]
    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    /// Returns `true` if nothing was tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    /// Returns the number of write statements issued.
    #[must_use]
    pub fn writes(&self) -> usize {
        self.count(FlushOutcome::issued_write)
    }

    /// Returns the number of updates that did not apply.
    #[must_use]
    pub fn not_applied(&self) -> usize {
        self.count(|outcome| !outcome.is_applied())
    }

    fn count(&self, pred: impl Fn(&FlushOutcome) -> bool) -> usize {
        self.outcomes.iter().filter(|(_, outcome)| pred(outcome)).count()
    }
}

impl IntoIterator for FlushReport {
    type Item = (EntityHandle, FlushOutcome);
    type IntoIter = std::vec::IntoIter<(EntityHandle, FlushOutcome)>;

    fn into_iter(self) -> Self::IntoIter {
        self.outcomes.into_iter()
    }
}
