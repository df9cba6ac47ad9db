//! Ad-hoc statements against the manager's connection.

use crate::error::{CoreError, CoreResult};
use rowmap_codec::{Row, Value};
use rowmap_storage::{Connection, Predicate};
use tracing::trace;

/// Builds and runs primitive statements without involving the identity map.
///
/// Rows read here are not tracked and writes issued here are not seen by
/// dirty checking.
///
/// ```rust
/// use rowmap_core::{EntityManager, EntityRegistry, ManagerConfig};
/// use rowmap_codec::Row;
/// use rowmap_storage::{InMemoryConnection, TableSchema};
///
/// let conn = InMemoryConnection::new().with_table(TableSchema::new("kv"));
/// let config = ManagerConfig::new().proxies_path(std::env::temp_dir());
/// let mut manager = EntityManager::with_connection(&config, conn, EntityRegistry::new())?;
///
/// manager
///     .create_query()?
///     .insert_into("kv", &Row::new().with("k", "a").with("v", "1"))?;
/// let row = manager
///     .create_query()?
///     .select(["v"])
///     .from("kv")
///     .where_eq("k", "a")
///     .fetch_one()?;
/// assert_eq!(row, Some(Row::new().with("v", "1")));
/// # Ok::<(), rowmap_core::CoreError>(())
/// ```
pub struct QueryBuilder<'c, C: Connection> {
    connection: &'c mut C,
    columns: Vec<String>,
    table: Option<String>,
    predicate: Predicate,
}

impl<'c, C: Connection> QueryBuilder<'c, C> {
    pub(crate) fn new(connection: &'c mut C) -> Self {
        Self {
            connection,
            columns: Vec::new(),
            table: None,
            predicate: Predicate::new(),
        }
    }

    /// Sets the projected columns. No columns selects all of them.
    #[must_use]
    pub fn select<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the table to read.
    #[must_use]
    pub fn from(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    /// Adds an equality condition.
    #[must_use]
    pub fn where_eq(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.predicate.insert(column, value);
        self
    }

    /// Returns the first matching row.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidQuery`] without a table, or a storage
    /// error.
    pub fn fetch_one(self) -> CoreResult<Option<Row>> {
        let table = self.table()?;
        trace!(table, predicate = ?self.predicate, "query select one");
        Ok(self
            .connection
            .select(&self.column_refs(), table, &self.predicate)?)
    }

    /// Returns every matching row.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidQuery`] without a table, or a storage
    /// error.
    pub fn fetch_all(self) -> CoreResult<Vec<Row>> {
        let table = self.table()?;
        trace!(table, predicate = ?self.predicate, "query select all");
        Ok(self
            .connection
            .select_all(&self.column_refs(), table, &self.predicate)?)
    }

    /// Inserts `values` into `table`, returning the generated identifier.
    ///
    /// # Errors
    ///
    /// Returns a storage error.
    pub fn insert_into(self, table: &str, values: &Row) -> CoreResult<Option<Value>> {
        trace!(table, ?values, "query insert");
        Ok(self.connection.insert(table, values)?)
    }

    /// Updates the rows of `table` matching the `where_eq` conditions. No
    /// conditions updates every row.
    ///
    /// # Errors
    ///
    /// Returns a storage error.
    pub fn update(self, table: &str, values: &Row) -> CoreResult<u64> {
        trace!(table, ?values, predicate = ?self.predicate, "query update");
        Ok(self.connection.update(table, values, &self.predicate)?)
    }

    /// Deletes the rows of `table` matching the `where_eq` conditions. No
    /// conditions deletes every row.
    ///
    /// # Errors
    ///
    /// Returns a storage error.
    pub fn delete_from(self, table: &str) -> CoreResult<u64> {
        trace!(table, predicate = ?self.predicate, "query delete");
        Ok(self.connection.delete(table, &self.predicate)?)
    }

    fn table(&self) -> CoreResult<&str> {
        self.table
            .as_deref()
            .ok_or_else(|| CoreError::invalid_query("no table given; call from() first"))
    }

    fn column_refs(&self) -> Vec<&str> {
        self.columns.iter().map(String::as_str).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rowmap_storage::{InMemoryConnection, TableSchema};

    fn connection() -> InMemoryConnection {
        let mut conn = InMemoryConnection::new().with_table(
            TableSchema::new("notes")
                .columns(["id", "body", "owner"])
                .primary_key(["id"])
                .auto_increment("id"),
        );
        conn.open().unwrap();
        conn
    }

    #[test]
    fn insert_select_update_delete() {
        let mut conn = connection();
        let id = QueryBuilder::new(&mut conn)
            .insert_into("notes", &Row::new().with("body", "hi").with("owner", "ann"))
            .unwrap();
        assert_eq!(id, Some(Value::Integer(1)));

        let affected = QueryBuilder::new(&mut conn)
            .where_eq("id", 1)
            .update("notes", &Row::new().with("body", "bye"))
            .unwrap();
        assert_eq!(affected, 1);

        let rows = QueryBuilder::new(&mut conn)
            .select(["body"])
            .from("notes")
            .where_eq("owner", "ann")
            .fetch_all()
            .unwrap();
        assert_eq!(rows, vec![Row::new().with("body", "bye")]);

        let deleted = QueryBuilder::new(&mut conn)
            .where_eq("owner", "ann")
            .delete_from("notes")
            .unwrap();
        assert_eq!(deleted, 1);
        assert_eq!(conn.row_count("notes"), 0);
    }

    #[test]
    fn fetch_requires_table() {
        let mut conn = connection();
        let err = QueryBuilder::new(&mut conn).select(["id"]).fetch_one().unwrap_err();
        assert!(matches!(err, CoreError::InvalidQuery { .. }));
    }

    #[test]
    fn storage_errors_pass_through() {
        let mut conn = connection();
        let err = QueryBuilder::new(&mut conn).from("missing").fetch_all().unwrap_err();
        assert!(matches!(
            err,
            CoreError::Storage(rowmap_storage::StorageError::UnknownTable { .. })
        ));
    }
}
