//! The identity map.

use crate::entity::{EntityHandle, TrackedInstance};
use rowmap_codec::ContentHash;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Lifecycle state of a tracked instance.
///
/// There is no "untracked" variant: an instance without an entry in the
/// identity map is untracked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleFlag {
    /// Persisted; the next flush inserts it.
    PendingInsert,
    /// Loaded or inserted; the next flush updates it if dirty.
    Tracked,
    /// Marked for deletion; the next flush deletes it.
    PendingDelete,
}

impl fmt::Display for LifecycleFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::PendingInsert => "pending-insert",
            Self::Tracked => "tracked",
            Self::PendingDelete => "pending-delete",
        })
    }
}

/// One identity map entry.
pub(crate) struct TrackedRecord {
    pub(crate) instance: Arc<dyn TrackedInstance>,
    /// Qualified entity type name.
    pub(crate) entity_type: String,
    pub(crate) flag: LifecycleFlag,
    pub(crate) baseline: ContentHash,
}

impl fmt::Debug for TrackedRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrackedRecord")
            .field("entity_type", &self.entity_type)
            .field("flag", &self.flag)
            .field("baseline", &self.baseline)
            .finish_non_exhaustive()
    }
}

/// Entries keyed by handle. At most one entry per instance.
#[derive(Debug, Default)]
pub(crate) struct IdentityMap {
    records: BTreeMap<EntityHandle, TrackedRecord>,
}

impl IdentityMap {
    /// Inserts or replaces the entry for `handle`.
    pub(crate) fn register(&mut self, handle: EntityHandle, record: TrackedRecord) {
        self.records.insert(handle, record);
    }

    pub(crate) fn get(&self, handle: EntityHandle) -> Option<&TrackedRecord> {
        self.records.get(&handle)
    }

    pub(crate) fn get_mut(&mut self, handle: EntityHandle) -> Option<&mut TrackedRecord> {
        self.records.get_mut(&handle)
    }

    pub(crate) fn remove(&mut self, handle: EntityHandle) -> Option<TrackedRecord> {
        self.records.remove(&handle)
    }

    pub(crate) fn contains(&self, handle: EntityHandle) -> bool {
        self.records.contains_key(&handle)
    }

    pub(crate) fn len(&self) -> usize {
        self.records.len()
    }

    /// Snapshot of the current handles, in allocation order.
    pub(crate) fn handles(&self) -> Vec<EntityHandle> {
        self.records.keys().copied().collect()
    }
}
