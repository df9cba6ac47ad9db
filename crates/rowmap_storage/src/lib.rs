//! # rowmap storage
//!
//! Connection trait and an in-memory relational store for rowmap.
//!
//! This crate is the lowest layer of rowmap. A [`Connection`] executes
//! primitive statements (select, insert, update, delete) with explicit
//! column lists, value maps and equality predicates, and reports affected
//! rows or generated identifiers. It knows nothing about entities, identity
//! or dirty state.
//!
//! ## Design Principles
//!
//! - Synchronous request/response: every call runs to completion
//! - Connections are opened explicitly; closed connections reject statements
//! - Failures are reported as [`StorageError`] and never retried here
//!
//! ## Available Connections
//!
//! - [`InMemoryConnection`] - For testing and ephemeral stores
//!
//! ## Example
//!
//! ```rust
//! use rowmap_codec::Row;
//! use rowmap_storage::{Connection, InMemoryConnection, TableSchema};
//!
//! let mut conn = InMemoryConnection::new().with_table(TableSchema::new("settings"));
//! conn.open().unwrap();
//! conn.insert("settings", &Row::new().with("key", "theme").with("value", "dark")).unwrap();
//!
//! let row = conn
//!     .select(&["value"], "settings", &Row::new().with("key", "theme"))
//!     .unwrap()
//!     .unwrap();
//! assert_eq!(row.get_as::<String>("value").unwrap(), "dark");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod connection;
mod error;
mod memory;
mod stats;

pub use connection::{Connection, Predicate};
pub use error::{StorageError, StorageResult};
pub use memory::{InMemoryConnection, TableSchema};
pub use stats::{ConnectionStats, StatsSnapshot};
