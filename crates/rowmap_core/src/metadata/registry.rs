//! In-process metadata registry.

use super::{EntityAttributes, MetadataProvider};
use crate::error::{CoreError, CoreResult};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use tracing::debug;

/// A [`MetadataProvider`] backed by explicitly registered attributes.
///
/// Entries are keyed by their qualified entity type name. The registry can be
/// shared through an `Arc` and extended after the manager is constructed.
#[derive(Debug, Default)]
pub struct EntityRegistry {
    entries: RwLock<BTreeMap<String, EntityAttributes>>,
}

impl EntityRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates and registers `attributes`, replacing any previous entry for
    /// the same type.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidMetadata`] if validation fails.
    pub fn register(&self, attributes: EntityAttributes) -> CoreResult<()> {
        attributes.validate()?;
        debug!(
            entity_type = attributes.entity_type(),
            table = attributes.table(),
            "registered entity metadata"
        );
        self.entries
            .write()
            .insert(attributes.entity_type().to_owned(), attributes);
        Ok(())
    }

    /// Builder form of [`EntityRegistry::register`].
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidMetadata`] if validation fails.
    pub fn with(self, attributes: EntityAttributes) -> CoreResult<Self> {
        self.register(attributes)?;
        Ok(self)
    }

    /// Returns `true` if `entity_type` is registered.
    #[must_use]
    pub fn contains(&self, entity_type: &str) -> bool {
        self.entries.read().contains_key(entity_type)
    }

    /// Returns the registered type names in sorted order.
    #[must_use]
    pub fn entity_types(&self) -> Vec<String> {
        self.entries.read().keys().cloned().collect()
    }

    /// Returns a copy of every registered entry.
    #[must_use]
    pub fn attributes(&self) -> Vec<EntityAttributes> {
        self.entries.read().values().cloned().collect()
    }

    /// Returns the number of registered types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Returns `true` if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl MetadataProvider for EntityRegistry {
    fn resolve(&self, entity_type: &str) -> CoreResult<EntityAttributes> {
        self.entries
            .read()
            .get(entity_type)
            .cloned()
            .ok_or_else(|| CoreError::unknown_entity_type(entity_type))
    }
}
