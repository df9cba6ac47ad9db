//! Property-based test generators.
//!
//! Provides proptest strategies for fixture entities and for sequences of
//! in-memory edits applied between flushes.

use crate::fixtures::{Membership, Setting, User};
use proptest::prelude::*;

/// Strategy for user names.
pub fn name_strategy() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_]{0,15}"
}

/// Strategy for optional email addresses.
pub fn email_strategy() -> impl Strategy<Value = Option<String>> {
    prop::option::of("[a-z]{1,8}@[a-z]{1,8}\\.(com|org|net)")
}

/// Strategy for unsaved users.
pub fn user_strategy() -> impl Strategy<Value = User> {
    (name_strategy(), email_strategy(), any::<bool>()).prop_map(|(name, email, active)| User {
        id: 0,
        name,
        email,
        active,
    })
}

/// Strategy for memberships with small keys, so collisions happen.
pub fn membership_strategy() -> impl Strategy<Value = Membership> {
    (1i64..50, 1i64..10, prop::sample::select(vec!["member", "admin", "owner"])).prop_map(
        |(user_id, group_id, role)| Membership {
            user_id,
            group_id,
            role: role.to_owned(),
        },
    )
}

/// Strategy for settings, including ones with a `NULL` value.
pub fn setting_strategy() -> impl Strategy<Value = Setting> {
    ("[a-z]{1,6}(\\.[a-z]{1,6})?", prop::option::of(".{0,12}"))
        .prop_map(|(key, value)| Setting { key, value })
}

/// An in-memory change to a loaded user.
#[derive(Debug, Clone)]
pub enum UserEdit {
    /// Replace the name.
    Rename(String),
    /// Replace the email.
    SetEmail(Option<String>),
    /// Flip the active flag.
    ToggleActive,
    /// Touch nothing.
    Noop,
}

impl UserEdit {
    /// Applies the edit.
    pub fn apply(&self, user: &mut User) {
        match self {
            Self::Rename(name) => user.name.clone_from(name),
            Self::SetEmail(email) => user.email.clone_from(email),
            Self::ToggleActive => user.active = !user.active,
            Self::Noop => {}
        }
    }
}

/// Strategy for a single edit.
pub fn user_edit_strategy() -> impl Strategy<Value = UserEdit> {
    prop_oneof![
        2 => name_strategy().prop_map(UserEdit::Rename),
        1 => email_strategy().prop_map(UserEdit::SetEmail),
        2 => Just(UserEdit::ToggleActive),
        1 => Just(UserEdit::Noop),
    ]
}

/// Strategy for a sequence of edits.
pub fn edit_sequence_strategy(min_ops: usize, max_ops: usize) -> impl Strategy<Value = Vec<UserEdit>> {
    prop::collection::vec(user_edit_strategy(), min_ops..max_ops)
}

/// Configuration for property tests.
#[derive(Debug, Clone)]
pub struct PropTestConfig {
    /// Number of test cases to run.
    pub cases: u32,
    /// Maximum shrink iterations.
    pub max_shrink_iters: u32,
}

impl Default for PropTestConfig {
    fn default() -> Self {
        Self {
            cases: 256,
            max_shrink_iters: 1000,
        }
    }
}

impl PropTestConfig {
    /// Creates a configuration for quick tests.
    #[must_use]
    pub fn quick() -> Self {
        Self {
            cases: 32,
            max_shrink_iters: 100,
        }
    }

    /// Converts to proptest config.
    #[must_use]
    pub fn to_proptest_config(&self) -> ProptestConfig {
        ProptestConfig {
            cases: self.cases,
            max_shrink_iters: self.max_shrink_iters,
            ..ProptestConfig::default()
        }
    }
}
