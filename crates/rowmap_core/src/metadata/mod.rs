//! Entity mapping metadata.
//!
//! The manager asks a [`MetadataProvider`] for the [`EntityAttributes`] of
//! each entity type it touches. [`EntityRegistry`] is the in-process provider;
//! anything that can answer `resolve` by qualified type name will do.

mod attributes;
mod registry;

pub use attributes::EntityAttributes;
pub use registry::EntityRegistry;

use crate::error::CoreResult;
use std::sync::Arc;

/// Source of per-type mapping metadata.
pub trait MetadataProvider: Send + Sync {
    /// Returns the attributes registered for the qualified `entity_type`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CoreError::UnknownEntityType`] if the type is not
    /// known.
    fn resolve(&self, entity_type: &str) -> CoreResult<EntityAttributes>;
}

impl<P: MetadataProvider + ?Sized> MetadataProvider for Arc<P> {
    fn resolve(&self, entity_type: &str) -> CoreResult<EntityAttributes> {
        (**self).resolve(entity_type)
    }
}
