//! Cross-crate integration test helpers.
//!
//! Provides a harness that mirrors every write it makes through the manager
//! in an expected-state model, and verifies the store against that model
//! through an independent manager.

use crate::fixtures::{TestManager, User};
use rowmap_core::{EntityRef, FlushOutcome};
use std::collections::BTreeMap;

/// A test harness for integration testing.
pub struct IntegrationHarness {
    /// The manager under test.
    pub test: TestManager,
    /// Expected stored users by id.
    expected: BTreeMap<i64, User>,
}

impl IntegrationHarness {
    /// Creates a harness over a fresh manager.
    pub fn new() -> Self {
        Self {
            test: TestManager::new(),
            expected: BTreeMap::new(),
        }
    }

    /// Persists and flushes `user`, returning the tracked reference.
    pub fn insert_user(&mut self, user: User) -> EntityRef<User> {
        let user = EntityRef::new(user);
        self.test.persist(&user).expect("Failed to persist user");
        let outcome = self.test.flush_entity(&user).expect("Failed to insert user");
        assert!(matches!(outcome, FlushOutcome::Inserted { generated_id: Some(_) }));
        let stored = user.snapshot();
        self.expected.insert(stored.id, stored);
        user
    }

    /// Applies `edit` to a tracked user and flushes it.
    pub fn edit_user(&mut self, user: &EntityRef<User>, edit: impl FnOnce(&mut User)) -> FlushOutcome {
        edit(&mut user.write());
        let outcome = self.test.flush_entity(user).expect("Failed to flush user");
        if outcome == FlushOutcome::Updated {
            let stored = user.snapshot();
            self.expected.insert(stored.id, stored);
        }
        outcome
    }

    /// Deletes a tracked user and flushes it.
    pub fn delete_user(&mut self, user: &EntityRef<User>) {
        self.test.delete(user).expect("Failed to delete user");
        let outcome = self.test.flush_entity(user).expect("Failed to flush delete");
        assert_eq!(outcome, FlushOutcome::Deleted { affected: 1 });
        self.expected.remove(&user.read().id);
    }

    /// Verifies the store holds exactly the expected users.
    pub fn verify_all(&self) {
        assert_eq!(self.test.row_count("users"), self.expected.len());
        let mut reader = self.test.second_manager();
        for (id, expected) in &self.expected {
            let found = reader
                .find::<User>(&[(*id).into()])
                .expect("Failed to find user")
                .unwrap_or_else(|| panic!("user {id} missing from store"));
            assert_eq!(&found.snapshot(), expected, "stored user {id} differs");
        }
    }

    /// Returns the number of users expected in the store.
    pub fn expected_count(&self) -> usize {
        self.expected.len()
    }
}

impl Default for IntegrationHarness {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integration_harness() {
        let mut harness = IntegrationHarness::new();
        let ann = harness.insert_user(User::new("ann", Some("ann@example.com")));
        let bob = harness.insert_user(User::new("bob", None));
        assert_eq!(harness.expected_count(), 2);
        harness.verify_all();

        let outcome = harness.edit_user(&ann, |u| u.active = false);
        assert_eq!(outcome, FlushOutcome::Updated);
        harness.verify_all();

        harness.delete_user(&bob);
        assert_eq!(harness.expected_count(), 1);
        harness.verify_all();
    }

    #[test]
    fn unchanged_edit_issues_no_write() {
        let mut harness = IntegrationHarness::new();
        let ann = harness.insert_user(User::new("ann", None));
        let before = harness.test.writes();
        let outcome = harness.edit_user(&ann, |u| u.name = "ann".into());
        assert_eq!(outcome, FlushOutcome::Unchanged);
        assert_eq!(harness.test.writes(), before);
    }
}
