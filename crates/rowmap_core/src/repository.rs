//! Per-type repositories.

use crate::entity::{Entity, EntityRef};
use crate::error::CoreResult;
use crate::manager::EntityManager;
use crate::metadata::EntityAttributes;
use rowmap_codec::{Row, Value};
use rowmap_storage::Connection;
use std::marker::PhantomData;

/// Typed lookups for one entity type.
///
/// A repository borrows its manager; every instance it returns is tracked by
/// that manager exactly as if it came from [`EntityManager::find`].
pub struct Repository<'m, C: Connection, T: Entity> {
    manager: &'m mut EntityManager<C>,
    attributes: EntityAttributes,
    _entity: PhantomData<fn() -> T>,
}

impl<'m, C: Connection, T: Entity> Repository<'m, C, T> {
    pub(crate) fn new(manager: &'m mut EntityManager<C>, attributes: EntityAttributes) -> Self {
        Self {
            manager,
            attributes,
            _entity: PhantomData,
        }
    }

    /// Returns the metadata of `T`.
    #[must_use]
    pub fn attributes(&self) -> &EntityAttributes {
        &self.attributes
    }

    /// Looks up by primary key. See [`EntityManager::find`].
    ///
    /// # Errors
    ///
    /// Same as [`EntityManager::find`].
    pub fn find(&mut self, key: &[Value]) -> CoreResult<Option<EntityRef<T>>> {
        self.manager.find(key)
    }

    /// Returns every instance whose properties equal `criteria`, keyed by
    /// property name.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CoreError::UnknownField`] if `criteria` names an
    /// unmapped property, or a storage or construction error.
    pub fn find_by(&mut self, criteria: &Row) -> CoreResult<Vec<EntityRef<T>>> {
        self.manager.find_matching(&self.attributes, criteria)
    }

    /// Returns every instance of `T`.
    ///
    /// # Errors
    ///
    /// Returns a storage or construction error.
    pub fn find_all(&mut self) -> CoreResult<Vec<EntityRef<T>>> {
        self.find_by(&Row::new())
    }
}
