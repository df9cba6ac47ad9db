//! # rowmap core
//!
//! Unit of work and identity map over a relational [`Connection`].
//!
//! This crate provides:
//! - [`EntityManager`]: tracks instances and flushes their changes
//! - [`Entity`] and [`EntityRef`]: field access and shared instance identity
//! - [`MetadataProvider`] and [`EntityRegistry`]: table and key mappings
//! - [`Repository`] and [`QueryBuilder`]: lookups and ad-hoc statements
//! - [`ManagerConfig`]: construction settings, loadable from JSON
//!
//! ## Lifecycle
//!
//! ```text
//!            persist               flush
//!   (new) ───────────► PendingInsert ─────► Tracked ◄── find
//!                                            │   ▲
//!                                     delete │   │ flush (update if dirty)
//!                                            ▼   │
//!                                       PendingDelete ──flush──► (gone)
//! ```
//!
//! Dirty checking hashes the text form of every mapped property in
//! declaration order and compares it with the hash captured when the
//! instance last matched the store. The baseline is not refreshed after an
//! update, so an updated instance stays dirty for later flushes.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod entity;
mod error;
mod manager;
mod metadata;
mod query;
mod repository;

pub use config::{DatabaseConfig, ManagerConfig, MEMORY_DRIVER};
pub use entity::{Entity, EntityHandle, EntityRef};
pub use error::{CoreError, CoreResult};
pub use manager::{EntityManager, FlushOutcome, FlushReport, LifecycleFlag};
pub use metadata::{EntityAttributes, EntityRegistry, MetadataProvider};
pub use query::QueryBuilder;
pub use repository::Repository;

// Re-exported for entity implementations and `entity_accessors!`.
pub use rowmap_codec::{ContentHash, FromValue, Row, Value};
pub use rowmap_storage::{Connection, InMemoryConnection, Predicate, StorageError, TableSchema};
