//! Connection statistics.

use std::sync::atomic::{AtomicU64, Ordering};

/// Statement counters for a connection.
///
/// All counters are atomic and monotonically increasing. Clones of an
/// [`crate::InMemoryConnection`] share one instance.
#[derive(Debug, Default)]
pub struct ConnectionStats {
    /// Number of successful `open` calls that changed state.
    opens: AtomicU64,
    /// Number of select statements (single and multi-row).
    selects: AtomicU64,
    /// Number of insert statements.
    inserts: AtomicU64,
    /// Number of update statements.
    updates: AtomicU64,
    /// Number of delete statements.
    deletes: AtomicU64,
}

impl ConnectionStats {
    /// Creates a new stats instance.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_open(&self) {
        self.opens.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_select(&self) {
        self.selects.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_insert(&self) {
        self.inserts.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_update(&self) {
        self.updates.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_delete(&self) {
        self.deletes.fetch_add(1, Ordering::Relaxed);
    }

    /// Returns the number of opens.
    pub fn opens(&self) -> u64 {
        self.opens.load(Ordering::Relaxed)
    }

    /// Returns the number of select statements.
    pub fn selects(&self) -> u64 {
        self.selects.load(Ordering::Relaxed)
    }

    /// Returns the number of insert statements.
    pub fn inserts(&self) -> u64 {
        self.inserts.load(Ordering::Relaxed)
    }

    /// Returns the number of update statements.
    pub fn updates(&self) -> u64 {
        self.updates.load(Ordering::Relaxed)
    }

    /// Returns the number of delete statements.
    pub fn deletes(&self) -> u64 {
        self.deletes.load(Ordering::Relaxed)
    }

    /// Returns a snapshot of all counters.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            opens: self.opens(),
            selects: self.selects(),
            inserts: self.inserts(),
            updates: self.updates(),
            deletes: self.deletes(),
        }
    }
}

/// A point-in-time copy of [`ConnectionStats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatsSnapshot {
    /// Number of opens.
    pub opens: u64,
    /// Number of select statements.
    pub selects: u64,
    /// Number of insert statements.
    pub inserts: u64,
    /// Number of update statements.
    pub updates: u64,
    /// Number of delete statements.
    pub deletes: u64,
}

impl StatsSnapshot {
    /// Returns the number of write statements (insert, update, delete).
    #[must_use]
    pub const fn writes(&self) -> u64 {
        self.inserts + self.updates + self.deletes
    }

    /// Returns the per-counter difference `self - earlier`.
    #[must_use]
    pub const fn since(&self, earlier: &StatsSnapshot) -> StatsSnapshot {
        StatsSnapshot {
            opens: self.opens - earlier.opens,
            selects: self.selects - earlier.selects,
            inserts: self.inserts - earlier.inserts,
            updates: self.updates - earlier.updates,
            deletes: self.deletes - earlier.deletes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_stats_are_zero() {
        let stats = ConnectionStats::new();
        assert_eq!(stats.snapshot(), StatsSnapshot::default());
    }

    #[test]
    fn writes_and_since() {
        let stats = ConnectionStats::new();
        stats.record_insert();
        let before = stats.snapshot();
        stats.record_update();
        stats.record_delete();
        stats.record_select();

        let delta = stats.snapshot().since(&before);
        assert_eq!(delta.writes(), 2);
        assert_eq!(delta.selects, 1);
        assert_eq!(stats.snapshot().writes(), 3);
    }

    #[test]
    fn concurrent_updates() {
        use std::sync::Arc;
        use std::thread;

        let stats = Arc::new(ConnectionStats::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let s = Arc::clone(&stats);
                thread::spawn(move || {
                    for _ in 0..100 {
                        s.record_insert();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(stats.inserts(), 800);
    }
}
