//! Shared entity references.

use super::access::{Entity, TrackedInstance};
use super::handle::EntityHandle;
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::fmt;
use std::sync::Arc;

/// A shared, mutable reference to an entity instance.
///
/// The manager and the caller hold clones of the same reference: changes made
/// through [`EntityRef::write`] are visible to the next flush, and generated
/// keys written back by the manager are visible to the caller. Identity is
/// the [`EntityHandle`] allocated at construction, never the field values.
///
/// ```rust
/// use rowmap_core::{entity_accessors, Entity, EntityRef};
///
/// struct Counter {
///     id: i64,
///     hits: i64,
/// }
///
/// impl Entity for Counter {
///     const ENTITY_TYPE: &'static str = "Counter";
///     entity_accessors!(id, hits);
/// }
///
/// let a = EntityRef::new(Counter { id: 1, hits: 0 });
/// let b = a.clone();
/// b.write().hits += 1;
/// assert_eq!(a.read().hits, 1);
/// assert_eq!(a.handle(), b.handle());
/// ```
pub struct EntityRef<T: Entity> {
    handle: EntityHandle,
    cell: Arc<RwLock<T>>,
}

impl<T: Entity> EntityRef<T> {
    /// Wraps `value` with a fresh handle.
    pub fn new(value: T) -> Self {
        Self {
            handle: EntityHandle::next(),
            cell: Arc::new(RwLock::new(value)),
        }
    }

    /// Returns the identity handle.
    #[inline]
    #[must_use]
    pub fn handle(&self) -> EntityHandle {
        self.handle
    }

    /// Locks the instance for reading.
    ///
    /// Holding the guard across a flush of this instance makes the flush
    /// fail with [`crate::CoreError::InvalidState`] when it needs to write a
    /// generated key back.
    pub fn read(&self) -> RwLockReadGuard<'_, T> {
        self.cell.read()
    }

    /// Locks the instance for writing.
    ///
    /// Holding the guard across any manager call that reads this instance
    /// makes the call fail with [`crate::CoreError::InvalidState`].
    pub fn write(&self) -> RwLockWriteGuard<'_, T> {
        self.cell.write()
    }

    /// Returns a copy of the current value.
    #[must_use]
    pub fn snapshot(&self) -> T
    where
        T: Clone,
    {
        self.cell.read().clone()
    }

    /// Returns `true` if both references point at the same instance.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.cell, &other.cell)
    }

    pub(crate) fn erased(&self) -> Arc<dyn TrackedInstance> {
        self.cell.clone()
    }
}

impl<T: Entity> Clone for EntityRef<T> {
    fn clone(&self) -> Self {
        Self {
            handle: self.handle,
            cell: Arc::clone(&self.cell),
        }
    }
}

impl<T: Entity> From<T> for EntityRef<T> {
    fn from(value: T) -> Self {
        Self::new(value)
    }
}

impl<T: Entity + fmt::Debug> fmt::Debug for EntityRef<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("EntityRef");
        s.field("handle", &self.handle);
        match self.cell.try_read() {
            Some(value) => s.field("value", &*value),
            None => s.field("value", &"<locked>"),
        };
        s.finish()
    }
}
