//! Test fixtures and manager helpers.
//!
//! Provides three sample entity types covering the key layouts the manager
//! supports, a registry for them, and a [`TestManager`] that owns its
//! temporary proxies directory.

use rowmap_core::{
    entity_accessors, Entity, EntityAttributes, EntityManager, EntityRegistry, ManagerConfig,
};
use rowmap_storage::{Connection, InMemoryConnection};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

/// Entity with a generated key and a renamed column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    /// Generated on insert.
    pub id: i64,
    /// Display name.
    pub name: String,
    /// Stored in the `email_address` column.
    pub email: Option<String>,
    /// Account flag.
    pub active: bool,
}

impl User {
    /// Creates an unsaved active user.
    pub fn new(name: impl Into<String>, email: Option<&str>) -> Self {
        Self {
            id: 0,
            name: name.into(),
            email: email.map(str::to_owned),
            active: true,
        }
    }
}

impl Entity for User {
    const ENTITY_TYPE: &'static str = "User";
    entity_accessors!(id, name, email, active);
}

/// Entity with a two-field natural key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Membership {
    /// First key part.
    pub user_id: i64,
    /// Second key part.
    pub group_id: i64,
    /// Role within the group.
    pub role: String,
}

impl Entity for Membership {
    const ENTITY_TYPE: &'static str = "Membership";
    entity_accessors!(user_id, group_id, role);
}

/// Entity with a single text key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Setting {
    /// Setting name.
    pub key: String,
    /// Setting value.
    pub value: Option<String>,
}

impl Entity for Setting {
    const ENTITY_TYPE: &'static str = "Setting";
    entity_accessors!(key, value);
}

/// Metadata for [`User`].
pub fn user_attributes() -> EntityAttributes {
    EntityAttributes::new(User::ENTITY_TYPE, "users")
        .properties(["id", "name"])
        .property("email", "email_address")
        .property("active", "active")
        .primary_key(["id"])
        .auto_increment("id")
}

/// Metadata for [`Membership`].
pub fn membership_attributes() -> EntityAttributes {
    EntityAttributes::new(Membership::ENTITY_TYPE, "memberships")
        .properties(["user_id", "group_id", "role"])
        .primary_key(["user_id", "group_id"])
}

/// Metadata for [`Setting`].
pub fn setting_attributes() -> EntityAttributes {
    EntityAttributes::new(Setting::ENTITY_TYPE, "settings")
        .property("key", "setting_key")
        .property("value", "setting_value")
        .primary_key(["key"])
}

/// Registry with all fixture types, optionally qualified with `namespace`.
pub fn registry(namespace: Option<&str>) -> Arc<EntityRegistry> {
    let registry = EntityRegistry::new();
    for attributes in [user_attributes(), membership_attributes(), setting_attributes()] {
        let attributes = match namespace {
            Some(ns) => {
                let qualified = format!("{ns}::{}", attributes.entity_type());
                attributes.renamed(qualified)
            }
            None => attributes,
        };
        registry
            .register(attributes)
            .expect("fixture metadata is valid");
    }
    Arc::new(registry)
}

/// A manager over a fresh in-memory store with automatic cleanup.
pub struct TestManager {
    /// The manager under test.
    pub manager: EntityManager<InMemoryConnection>,
    registry: Arc<EntityRegistry>,
    config: ManagerConfig,
    /// Kept alive so the proxies directory exists for the manager's lifetime.
    proxies: TempDir,
}

impl TestManager {
    /// Creates a manager without an entity namespace.
    pub fn new() -> Self {
        Self::build(None)
    }

    /// Creates a manager whose entity types live under `namespace`.
    pub fn with_namespace(namespace: &str) -> Self {
        Self::build(Some(namespace))
    }

    fn build(namespace: Option<&str>) -> Self {
        let proxies = TempDir::new().expect("Failed to create proxies directory");
        let mut config = ManagerConfig::new().proxies_path(proxies.path());
        if let Some(ns) = namespace {
            config = config.entity_namespace(ns);
        }
        let registry = registry(namespace);
        let manager =
            EntityManager::open(&config, Arc::clone(&registry)).expect("Failed to open manager");
        Self {
            manager,
            registry,
            config,
            proxies,
        }
    }

    /// Returns the proxies directory.
    pub fn proxies_dir(&self) -> &Path {
        self.proxies.path()
    }

    /// Returns the configuration the manager was built from.
    pub fn config(&self) -> &ManagerConfig {
        &self.config
    }

    /// Writes the configuration as JSON into the proxies directory and
    /// returns the file path.
    pub fn write_config_file(&self) -> PathBuf {
        let path = self.proxies.path().join("rowmap.json");
        let json = serde_json::to_string_pretty(&self.config).expect("Failed to encode config");
        std::fs::write(&path, json).expect("Failed to write config file");
        path
    }

    /// Opens a second connection to the same store, bypassing the manager.
    pub fn probe(&self) -> InMemoryConnection {
        let mut probe = self.manager.connection().clone();
        probe.open().expect("Failed to open probe connection");
        probe
    }

    /// Creates a second, independent manager over the same store.
    pub fn second_manager(&self) -> EntityManager<InMemoryConnection> {
        EntityManager::with_connection(
            &self.config,
            self.manager.connection().clone(),
            Arc::clone(&self.registry),
        )
        .expect("Failed to create second manager")
    }

    /// Returns the number of write statements issued so far.
    pub fn writes(&self) -> u64 {
        self.manager.connection().stats().snapshot().writes()
    }

    /// Returns the number of rows in `table`.
    pub fn row_count(&self, table: &str) -> usize {
        self.manager.connection().row_count(table)
    }
}

impl Default for TestManager {
    fn default() -> Self {
        Self::new()
    }
}

impl std::ops::Deref for TestManager {
    type Target = EntityManager<InMemoryConnection>;

    fn deref(&self) -> &Self::Target {
        &self.manager
    }
}

impl std::ops::DerefMut for TestManager {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.manager
    }
}

/// Runs a test with a fresh manager.
///
/// # Example
///
/// ```rust
/// use rowmap_core::EntityRef;
/// use rowmap_testkit::{with_test_manager, User};
///
/// with_test_manager(|manager| {
///     let user = EntityRef::new(User::new("ann", None));
///     manager.persist(&user).unwrap();
///     manager.flush().unwrap();
///     assert_eq!(user.read().id, 1);
/// });
/// ```
pub fn with_test_manager<F, R>(f: F) -> R
where
    F: FnOnce(&mut EntityManager<InMemoryConnection>) -> R,
{
    let mut test = TestManager::new();
    f(&mut test.manager)
}

/// Test scenario helpers.
pub mod scenarios {
    use super::*;
    use rowmap_core::EntityRef;

    /// Creates a manager with `count` flushed users named `user0`, `user1`,
    /// and so on.
    pub fn populated_users(count: usize) -> (TestManager, Vec<EntityRef<User>>) {
        let mut test = TestManager::new();
        let users: Vec<_> = (0..count)
            .map(|i| EntityRef::new(User::new(format!("user{i}"), None)))
            .collect();
        for user in &users {
            test.persist(user).expect("Failed to persist user");
        }
        test.flush().expect("Failed to flush users");
        (test, users)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixture_metadata_is_valid() {
        for attributes in [user_attributes(), membership_attributes(), setting_attributes()] {
            attributes.validate().unwrap();
        }
    }

    #[test]
    fn namespaced_registry() {
        let registry = registry(Some("app"));
        assert_eq!(
            registry.entity_types(),
            vec!["app::Membership", "app::Setting", "app::User"]
        );
    }

    #[test]
    fn test_manager_keeps_proxies_dir() {
        let test = TestManager::new();
        assert!(test.proxies_dir().is_dir());
        assert_eq!(test.proxies_path(), test.proxies_dir());
    }

    #[test]
    fn populated_scenario() {
        let (test, users) = scenarios::populated_users(5);
        assert_eq!(test.row_count("users"), 5);
        assert_eq!(test.tracked_count(), 5);
        assert_eq!(users[4].read().id, 5);
    }
}
