//! Connection trait definition.

use crate::error::StorageResult;
use rowmap_codec::{Row, Value};

/// An equality conjunction: every `(column, value)` pair must match.
pub type Predicate = Row;

/// A synchronous request/response connection to a relational store.
///
/// The connection speaks in primitives only: explicit column lists, value
/// maps and equality predicates. It owns no knowledge of entities, identity
/// or dirty state.
///
/// # Invariants
///
/// - Every statement fails with [`crate::StorageError::Closed`] until
///   [`Connection::open`] succeeds
/// - `insert` returns the generated identifier for tables with an
///   autoincrement column, `None` otherwise
/// - `update` and `delete` return the number of affected rows
///
/// # Implementors
///
/// - [`super::InMemoryConnection`] - For testing and ephemeral stores
pub trait Connection: Send {
    /// Returns `true` once [`Connection::open`] succeeded and until
    /// [`Connection::close`].
    fn is_open(&self) -> bool;

    /// Opens the connection. Opening an open connection is a no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be reached.
    fn open(&mut self) -> StorageResult<()>;

    /// Closes the connection.
    ///
    /// # Errors
    ///
    /// Returns an error if the store reports a failure while closing.
    fn close(&mut self) -> StorageResult<()>;

    /// Returns the first row of `table` matching `predicate`, projected to
    /// `columns` (all columns when `columns` is empty).
    ///
    /// # Errors
    ///
    /// Returns an error if the table or a column is unknown or the
    /// connection is closed.
    fn select(
        &self,
        columns: &[&str],
        table: &str,
        predicate: &Predicate,
    ) -> StorageResult<Option<Row>>;

    /// Returns every row of `table` matching `predicate`, projected to
    /// `columns`.
    ///
    /// # Errors
    ///
    /// Same as [`Connection::select`].
    fn select_all(
        &self,
        columns: &[&str],
        table: &str,
        predicate: &Predicate,
    ) -> StorageResult<Vec<Row>>;

    /// Inserts one row, returning the generated identifier if the table has
    /// one.
    ///
    /// # Errors
    ///
    /// Returns an error on unknown tables or columns, constraint violations,
    /// or a closed connection.
    fn insert(&mut self, table: &str, values: &Row) -> StorageResult<Option<Value>>;

    /// Sets `values` on every row matching `predicate`.
    ///
    /// # Errors
    ///
    /// Same as [`Connection::insert`].
    fn update(&mut self, table: &str, values: &Row, predicate: &Predicate) -> StorageResult<u64>;

    /// Removes every row matching `predicate`.
    ///
    /// # Errors
    ///
    /// Returns an error on unknown tables or a closed connection.
    fn delete(&mut self, table: &str, predicate: &Predicate) -> StorageResult<u64>;
}
