//! The entity manager: identity map, lifecycle and flush dispatch.

mod identity;
mod ops;
mod outcome;

pub use identity::LifecycleFlag;
pub use outcome::{FlushOutcome, FlushReport};

use crate::config::{ManagerConfig, MEMORY_DRIVER};
use crate::entity::{Entity, EntityHandle, EntityRef};
use crate::error::{CoreError, CoreResult};
use crate::metadata::{EntityAttributes, EntityRegistry, MetadataProvider};
use crate::query::QueryBuilder;
use crate::repository::Repository;
use identity::{IdentityMap, TrackedRecord};
use rowmap_codec::{ContentHash, Row, Value};
use rowmap_storage::{Connection, InMemoryConnection, Predicate, TableSchema};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

/// Unit of work over a single connection.
///
/// The manager keeps an identity map of every instance it loaded or was asked
/// to persist or delete, and turns the accumulated changes into insert, update
/// and delete statements on [`EntityManager::flush`]. Dirty checking compares
/// a content hash of the instance against the hash captured when it last
/// matched the store.
///
/// A manager is single-threaded: every operation takes `&mut self` and runs
/// to completion against the connection, which is opened lazily on first use.
///
/// # Example
///
/// ```rust
/// use rowmap_core::{entity_accessors, Entity, EntityAttributes, EntityManager,
///     EntityRef, EntityRegistry, ManagerConfig};
/// use std::sync::Arc;
///
/// #[derive(Debug, Clone, PartialEq)]
/// struct User {
///     id: i64,
///     name: String,
/// }
///
/// impl Entity for User {
///     const ENTITY_TYPE: &'static str = "User";
///     entity_accessors!(id, name);
/// }
///
/// let registry = Arc::new(EntityRegistry::new());
/// registry.register(
///     EntityAttributes::new("User", "users")
///         .properties(["id", "name"])
///         .primary_key(["id"])
///         .auto_increment("id"),
/// )?;
///
/// let proxies = std::env::temp_dir();
/// let config = ManagerConfig::new().proxies_path(&proxies);
/// let mut manager = EntityManager::open(&config, registry)?;
///
/// let alice = EntityRef::new(User { id: 0, name: "alice".into() });
/// manager.persist(&alice)?;
/// manager.flush()?;
/// assert_eq!(alice.read().id, 1);
///
/// let found = manager.find::<User>(&[1.into()])?.expect("row exists");
/// assert_eq!(found.snapshot(), alice.snapshot());
/// # Ok::<(), rowmap_core::CoreError>(())
/// ```
pub struct EntityManager<C: Connection> {
    connection: C,
    metadata: Arc<dyn MetadataProvider>,
    identity_map: IdentityMap,
    proxies_path: PathBuf,
    entity_namespace: Option<String>,
}

impl EntityManager<InMemoryConnection> {
    /// Opens a manager over a fresh in-memory store with one table per type
    /// registered in `registry`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Configuration`] if the configuration is invalid
    /// or names a driver other than `memory`, or a storage error if two
    /// registered types share a table.
    pub fn open(config: &ManagerConfig, registry: Arc<EntityRegistry>) -> CoreResult<Self> {
        if config.database.driver != MEMORY_DRIVER {
            return Err(CoreError::configuration(format!(
                "driver {} cannot be opened from configuration",
                config.database.driver
            )));
        }

        let connection = InMemoryConnection::new();
        for attributes in registry.attributes() {
            connection.create_table(table_schema(&attributes)?)?;
        }
        Self::with_connection(config, connection, registry)
    }
}

impl<C: Connection> EntityManager<C> {
    /// Creates a manager over `connection`.
    ///
    /// The connection is not opened until the first operation that needs it.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Configuration`] if the proxies path is missing or
    /// not an existing directory.
    pub fn with_connection(
        config: &ManagerConfig,
        connection: C,
        metadata: impl MetadataProvider + 'static,
    ) -> CoreResult<Self> {
        let proxies_path = config.validate()?.to_path_buf();
        debug!(
            proxies_path = %proxies_path.display(),
            namespace = config.entity_namespace.as_deref().unwrap_or(""),
            "entity manager created"
        );
        Ok(Self {
            connection,
            metadata: Arc::new(metadata),
            identity_map: IdentityMap::default(),
            proxies_path,
            entity_namespace: config.entity_namespace.clone(),
        })
    }

    /// Loads the instance of `T` whose primary key equals `key`.
    ///
    /// Key parts pair positionally with the primary key fields. A found
    /// instance is tracked; `Ok(None)` means no row matched.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Arity`] before any statement is issued if the key
    /// has the wrong number of parts, or a metadata, storage or construction
    /// error.
    pub fn find<T: Entity>(&mut self, key: &[Value]) -> CoreResult<Option<EntityRef<T>>> {
        let attributes = self.attributes_of::<T>()?;
        let expected = attributes.primary_key_fields().len();
        if key.len() != expected {
            return Err(CoreError::Arity {
                entity_type: attributes.entity_type().to_owned(),
                expected,
                actual: key.len(),
            });
        }

        self.ensure_open()?;
        let predicate = ops::lookup_predicate(&attributes, key)?;
        match ops::select_one(&self.connection, &attributes, &predicate)? {
            Some(row) => {
                let (entity, baseline) = Self::load(&attributes, &row)?;
                Ok(Some(self.track_loaded(&attributes, entity, baseline)))
            }
            None => {
                debug!(entity_type = attributes.entity_type(), ?key, "no row found");
                Ok(None)
            }
        }
    }

    /// Schedules `entity` for insertion on the next flush.
    ///
    /// Persisting an instance that is already tracked schedules it for
    /// insertion again.
    ///
    /// # Errors
    ///
    /// Returns a metadata error for an unknown type, or
    /// [`CoreError::InvalidState`] if the caller holds a write guard on it.
    pub fn persist<T: Entity>(&mut self, entity: &EntityRef<T>) -> CoreResult<()> {
        let attributes = self.attributes_of::<T>()?;
        let instance = entity.erased();
        let baseline = ops::fingerprint(instance.as_ref(), &attributes)?;
        self.identity_map.register(
            entity.handle(),
            TrackedRecord {
                instance,
                entity_type: attributes.entity_type().to_owned(),
                flag: LifecycleFlag::PendingInsert,
                baseline,
            },
        );
        debug!(
            entity_type = attributes.entity_type(),
            handle = %entity.handle(),
            "registered for insert"
        );
        Ok(())
    }

    /// Schedules a tracked `entity` for deletion on the next flush.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NotTracked`] if the manager does not track it.
    pub fn delete<T: Entity>(&mut self, entity: &EntityRef<T>) -> CoreResult<()> {
        let handle = entity.handle();
        let record = self
            .identity_map
            .get_mut(handle)
            .ok_or(CoreError::NotTracked { handle })?;
        record.flag = LifecycleFlag::PendingDelete;
        debug!(entity_type = %record.entity_type, %handle, "registered for delete");
        Ok(())
    }

    /// Flushes a single tracked instance.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NotTracked`] if the manager does not track it, or
    /// the first error of the write operation.
    pub fn flush_entity<T: Entity>(&mut self, entity: &EntityRef<T>) -> CoreResult<FlushOutcome> {
        self.flush_handle(entity.handle())
    }

    /// Flushes every tracked instance.
    ///
    /// Works on a snapshot of the identity map taken at call time. The first
    /// error stops the flush; statements already issued stay applied.
    ///
    /// # Errors
    ///
    /// Returns the first error of any write operation.
    pub fn flush(&mut self) -> CoreResult<FlushReport> {
        let handles = self.identity_map.handles();
        debug!(tracked = handles.len(), "flush");
        let mut report = FlushReport::default();
        for handle in handles {
            let outcome = self.flush_handle(handle)?;
            report.push(handle, outcome);
        }
        debug!(
            processed = report.len(),
            writes = report.writes(),
            not_applied = report.not_applied(),
            "flush complete"
        );
        Ok(report)
    }

    /// Returns a repository for `T`.
    ///
    /// # Errors
    ///
    /// Returns a metadata error if `T` is not registered.
    pub fn get_repository<T: Entity>(&mut self) -> CoreResult<Repository<'_, C, T>> {
        let attributes = self.attributes_of::<T>()?;
        Ok(Repository::new(self, attributes))
    }

    /// Returns a query builder on the (opened) connection.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the connection cannot be opened.
    pub fn create_query(&mut self) -> CoreResult<QueryBuilder<'_, C>> {
        self.ensure_open()?;
        Ok(QueryBuilder::new(&mut self.connection))
    }

    /// Returns `name` qualified with the entity namespace.
    #[must_use]
    pub fn entity_type_name(&self, name: &str) -> String {
        match &self.entity_namespace {
            Some(namespace) => format!("{namespace}::{name}"),
            None => name.to_owned(),
        }
    }

    /// Returns the entity namespace.
    #[must_use]
    pub fn entity_namespace(&self) -> Option<&str> {
        self.entity_namespace.as_deref()
    }

    /// Changes the entity namespace used for later lookups.
    ///
    /// Instances already tracked keep the qualified name they were
    /// registered with.
    pub fn set_entity_namespace(&mut self, namespace: impl Into<String>) {
        self.entity_namespace = Some(namespace.into());
    }

    /// Returns the proxies directory.
    #[must_use]
    pub fn proxies_path(&self) -> &Path {
        &self.proxies_path
    }

    /// Returns the resolved metadata for `T`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::UnknownEntityType`] or
    /// [`CoreError::InvalidMetadata`].
    pub fn attributes_of<T: Entity>(&self) -> CoreResult<EntityAttributes> {
        self.resolve(&self.entity_type_name(T::ENTITY_TYPE))
    }

    /// Returns `true` if `entity` has an identity map entry.
    #[must_use]
    pub fn is_tracked<T: Entity>(&self, entity: &EntityRef<T>) -> bool {
        self.identity_map.contains(entity.handle())
    }

    /// Returns the lifecycle flag of `handle`, or `None` if untracked.
    #[must_use]
    pub fn state_of(&self, handle: EntityHandle) -> Option<LifecycleFlag> {
        self.identity_map.get(handle).map(|record| record.flag)
    }

    /// Returns the number of identity map entries.
    #[must_use]
    pub fn tracked_count(&self) -> usize {
        self.identity_map.len()
    }

    /// Returns the connection.
    #[must_use]
    pub fn connection(&self) -> &C {
        &self.connection
    }

    /// Returns the connection mutably.
    pub fn connection_mut(&mut self) -> &mut C {
        &mut self.connection
    }

    /// Closes the connection. Tracked instances stay tracked and the next
    /// operation reopens it.
    ///
    /// # Errors
    ///
    /// Returns the connection's error.
    pub fn close(&mut self) -> CoreResult<()> {
        if self.connection.is_open() {
            self.connection.close()?;
            debug!("connection closed");
        }
        Ok(())
    }

    /// Loads and tracks every `T` matching a property-keyed predicate.
    pub(crate) fn find_matching<T: Entity>(
        &mut self,
        attributes: &EntityAttributes,
        by_property: &Row,
    ) -> CoreResult<Vec<EntityRef<T>>> {
        let predicate: Predicate = ops::column_predicate(attributes, by_property)?;
        self.ensure_open()?;
        let rows = ops::select_all(&self.connection, attributes, &predicate)?;
        // nothing is tracked unless every row loads
        let loaded = rows
            .iter()
            .map(|row| Self::load(attributes, row))
            .collect::<CoreResult<Vec<_>>>()?;
        Ok(loaded
            .into_iter()
            .map(|(entity, baseline)| self.track_loaded(attributes, entity, baseline))
            .collect())
    }

    fn load<T: Entity>(
        attributes: &EntityAttributes,
        row: &Row,
    ) -> CoreResult<(EntityRef<T>, ContentHash)> {
        let entity = EntityRef::new(T::from_row(row)?);
        let baseline = ops::fingerprint(entity.erased().as_ref(), attributes)?;
        Ok((entity, baseline))
    }

    fn track_loaded<T: Entity>(
        &mut self,
        attributes: &EntityAttributes,
        entity: EntityRef<T>,
        baseline: ContentHash,
    ) -> EntityRef<T> {
        let instance = entity.erased();
        self.identity_map.register(
            entity.handle(),
            TrackedRecord {
                instance,
                entity_type: attributes.entity_type().to_owned(),
                flag: LifecycleFlag::Tracked,
                baseline,
            },
        );
        debug!(
            entity_type = attributes.entity_type(),
            handle = %entity.handle(),
            "loaded and tracked"
        );
        entity
    }

    fn flush_handle(&mut self, handle: EntityHandle) -> CoreResult<FlushOutcome> {
        let record = self
            .identity_map
            .get(handle)
            .ok_or(CoreError::NotTracked { handle })?;
        let instance = Arc::clone(&record.instance);
        let flag = record.flag;
        let baseline = record.baseline;
        let attributes = self.resolve(&record.entity_type)?;
        self.ensure_open()?;

        let entity_type = attributes.entity_type();
        match flag {
            LifecycleFlag::PendingInsert => {
                let inserted = ops::insert(&mut self.connection, instance.as_ref(), &attributes)?;
                if let Some(record) = self.identity_map.get_mut(handle) {
                    record.flag = LifecycleFlag::Tracked;
                    record.baseline = inserted.baseline;
                }
                debug!(entity_type, %handle, generated_id = ?inserted.generated_id, "inserted");
                Ok(FlushOutcome::Inserted {
                    generated_id: inserted.generated_id,
                })
            }
            LifecycleFlag::Tracked => {
                let outcome = ops::update(&mut self.connection, instance.as_ref(), &attributes, baseline)?;
                match &outcome {
                    FlushOutcome::NotApplied { affected } => {
                        warn!(entity_type, %handle, affected, "update not applied");
                    }
                    FlushOutcome::Updated => debug!(entity_type, %handle, "updated"),
                    _ => {}
                }
                Ok(outcome)
            }
            LifecycleFlag::PendingDelete => {
                let affected = ops::delete(&mut self.connection, instance.as_ref(), &attributes)?;
                self.identity_map.remove(handle);
                if affected == 0 {
                    warn!(entity_type, %handle, "delete affected no rows");
                } else {
                    debug!(entity_type, %handle, affected, "deleted");
                }
                Ok(FlushOutcome::Deleted { affected })
            }
        }
    }

    fn resolve(&self, entity_type: &str) -> CoreResult<EntityAttributes> {
        let attributes = self.metadata.resolve(entity_type)?;
        attributes.validate()?;
        Ok(attributes)
    }

    fn ensure_open(&mut self) -> CoreResult<()> {
        if !self.connection.is_open() {
            self.connection.open()?;
            debug!("connection opened");
        }
        Ok(())
    }
}

impl<C: Connection> std::fmt::Debug for EntityManager<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityManager")
            .field("proxies_path", &self.proxies_path)
            .field("entity_namespace", &self.entity_namespace)
            .field("tracked", &self.identity_map.len())
            .field("connection_open", &self.connection.is_open())
            .finish_non_exhaustive()
    }
}

/// Table layout the in-memory store needs for `attributes`.
fn table_schema(attributes: &EntityAttributes) -> CoreResult<TableSchema> {
    attributes.validate()?;
    let key_columns = attributes
        .primary_key_fields()
        .iter()
        .map(|field| attributes.column_for(field))
        .collect::<CoreResult<Vec<_>>>()?;
    let mut schema = TableSchema::new(attributes.table())
        .columns(attributes.columns())
        .primary_key(key_columns);
    if let Some(field) = attributes.auto_increment_field() {
        schema = schema.auto_increment(attributes.column_for(field)?);
    }
    Ok(schema)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity_accessors;

    #[derive(Debug, Clone, PartialEq)]
    struct Pair {
        left: i64,
        right: i64,
        label: String,
    }

    impl Entity for Pair {
        const ENTITY_TYPE: &'static str = "Pair";
        entity_accessors!(left, right, label);
    }

    fn registry(entity_type: &str) -> Arc<EntityRegistry> {
        let registry = Arc::new(EntityRegistry::new());
        registry
            .register(
                EntityAttributes::new(entity_type, "pairs")
                    .properties(["left", "right", "label"])
                    .primary_key(["left", "right"]),
            )
            .unwrap();
        registry
    }

    fn manager(dir: &tempfile::TempDir) -> EntityManager<InMemoryConnection> {
        let config = ManagerConfig::new().proxies_path(dir.path());
        EntityManager::open(&config, registry("Pair")).unwrap()
    }

    fn pair(left: i64, right: i64) -> EntityRef<Pair> {
        EntityRef::new(Pair {
            left,
            right,
            label: format!("{left}-{right}"),
        })
    }

    #[test]
    fn construction_validates_proxies_path() {
        let err = EntityManager::open(&ManagerConfig::new(), registry("Pair")).unwrap_err();
        assert!(matches!(err, CoreError::Configuration { .. }));
    }

    #[test]
    fn unknown_driver_is_a_configuration_error() {
        let dir = tempfile::tempdir().unwrap();
        let config = ManagerConfig::new().proxies_path(dir.path()).driver("mysql");
        let err = EntityManager::open(&config, registry("Pair")).unwrap_err();
        assert!(matches!(err, CoreError::Configuration { ref message } if message.contains("mysql")));
    }

    #[test]
    fn connection_opens_lazily() {
        let dir = tempfile::tempdir().unwrap();
        let mut manager = manager(&dir);
        assert!(!manager.connection().is_open());
        manager.persist(&pair(1, 2)).unwrap();
        assert!(!manager.connection().is_open());
        manager.flush().unwrap();
        assert!(manager.connection().is_open());

        manager.close().unwrap();
        assert!(!manager.connection().is_open());
        assert!(manager.find::<Pair>(&[1.into(), 2.into()]).unwrap().is_some());
    }

    #[test]
    fn arity_is_checked_before_any_statement() {
        let dir = tempfile::tempdir().unwrap();
        let mut manager = manager(&dir);
        let err = manager.find::<Pair>(&[1.into()]).unwrap_err();
        assert!(matches!(
            err,
            CoreError::Arity {
                expected: 2,
                actual: 1,
                ..
            }
        ));
        assert!(!manager.connection().is_open());
        assert_eq!(manager.connection().stats().selects(), 0);
    }

    #[test]
    fn lifecycle_flags() {
        let dir = tempfile::tempdir().unwrap();
        let mut manager = manager(&dir);
        let p = pair(3, 4);

        assert_eq!(manager.state_of(p.handle()), None);
        manager.persist(&p).unwrap();
        assert_eq!(manager.state_of(p.handle()), Some(LifecycleFlag::PendingInsert));

        let outcome = manager.flush_entity(&p).unwrap();
        assert_eq!(outcome, FlushOutcome::Inserted { generated_id: None });
        assert_eq!(manager.state_of(p.handle()), Some(LifecycleFlag::Tracked));

        manager.delete(&p).unwrap();
        assert_eq!(manager.state_of(p.handle()), Some(LifecycleFlag::PendingDelete));
        assert_eq!(
            manager.flush_entity(&p).unwrap(),
            FlushOutcome::Deleted { affected: 1 }
        );
        assert!(!manager.is_tracked(&p));
        assert_eq!(manager.tracked_count(), 0);
    }

    #[test]
    fn untracked_instances_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut manager = manager(&dir);
        let p = pair(5, 6);
        assert!(matches!(
            manager.delete(&p),
            Err(CoreError::NotTracked { handle }) if handle == p.handle()
        ));
        assert!(matches!(
            manager.flush_entity(&p),
            Err(CoreError::NotTracked { .. })
        ));
    }

    #[test]
    fn persist_while_write_locked_is_invalid_state() {
        let dir = tempfile::tempdir().unwrap();
        let mut manager = manager(&dir);
        let p = pair(7, 8);
        let guard = p.write();
        assert!(matches!(
            manager.persist(&p),
            Err(CoreError::InvalidState { .. })
        ));
        drop(guard);
        manager.persist(&p).unwrap();
    }

    #[test]
    fn namespace_qualifies_type_names() {
        let dir = tempfile::tempdir().unwrap();
        let config = ManagerConfig::new()
            .proxies_path(dir.path())
            .entity_namespace("app");
        let mut manager = EntityManager::open(&config, registry("app::Pair")).unwrap();
        assert_eq!(manager.entity_type_name("Pair"), "app::Pair");
        manager.persist(&pair(1, 1)).unwrap();

        manager.set_entity_namespace("other");
        assert_eq!(manager.entity_namespace(), Some("other"));
        assert!(matches!(
            manager.persist(&pair(2, 2)),
            Err(CoreError::UnknownEntityType { ref entity_type }) if entity_type == "other::Pair"
        ));

        // already tracked instances keep their registered name
        let report = manager.flush().unwrap();
        assert_eq!(report.len(), 1);
        assert_eq!(manager.connection().row_count("pairs"), 1);
    }

    #[test]
    fn proxies_path_is_kept() {
        let dir = tempfile::tempdir().unwrap();
        let manager = manager(&dir);
        assert_eq!(manager.proxies_path(), dir.path());
    }
}
