//! In-memory relational store for testing.

use crate::connection::{Connection, Predicate};
use crate::error::{StorageError, StorageResult};
use crate::stats::ConnectionStats;
use parking_lot::RwLock;
use rowmap_codec::{Row, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::trace;

/// Declaration of an in-memory table.
///
/// A schema without declared columns is free-form: any column name is
/// accepted. With declared columns, statements naming other columns fail with
/// [`StorageError::UnknownColumn`] and inserted rows get `NULL` for every
/// declared column they omit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSchema {
    name: String,
    columns: Vec<String>,
    primary_key: Vec<String>,
    auto_increment: Option<String>,
}

impl TableSchema {
    /// Creates a free-form schema for `name`.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            primary_key: Vec::new(),
            auto_increment: None,
        }
    }

    /// Declares a column.
    #[must_use]
    pub fn column(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        if !self.columns.contains(&name) {
            self.columns.push(name);
        }
        self
    }

    /// Declares several columns.
    #[must_use]
    pub fn columns<I, S>(self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        names
            .into_iter()
            .fold(self, |schema, name| schema.column(name))
    }

    /// Declares the primary key; inserts duplicating it are rejected.
    #[must_use]
    pub fn primary_key<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.primary_key = names.into_iter().map(Into::into).collect();
        self
    }

    /// Declares the autoincrement column.
    ///
    /// Inserts that leave it `NULL`, empty or zero get the next identifier.
    #[must_use]
    pub fn auto_increment(mut self, name: impl Into<String>) -> Self {
        self.auto_increment = Some(name.into());
        self
    }

    /// Returns the table name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the declared columns (empty for free-form tables).
    #[must_use]
    pub fn declared_columns(&self) -> &[String] {
        &self.columns
    }
}

#[derive(Debug)]
struct Table {
    schema: TableSchema,
    rows: Vec<Row>,
    next_id: i64,
}

impl Table {
    fn new(schema: TableSchema) -> Self {
        Self {
            schema,
            rows: Vec::new(),
            next_id: 1,
        }
    }

    fn check_columns<'a>(&self, names: impl IntoIterator<Item = &'a str>) -> StorageResult<()> {
        if self.schema.columns.is_empty() {
            return Ok(());
        }
        for name in names {
            if !self.schema.columns.iter().any(|c| c == name) {
                return Err(StorageError::unknown_column(&self.schema.name, name));
            }
        }
        Ok(())
    }

    fn project(row: &Row, columns: &[&str]) -> Row {
        if columns.is_empty() {
            return row.clone();
        }
        columns
            .iter()
            .map(|c| (*c, row.get(c).cloned().unwrap_or(Value::Null)))
            .collect()
    }

    fn key_of(&self, row: &Row) -> Option<Predicate> {
        if self.schema.primary_key.is_empty() {
            return None;
        }
        Some(
            self.schema
                .primary_key
                .iter()
                .map(|c| (c.as_str(), row.get(c).cloned().unwrap_or(Value::Null)))
                .collect(),
        )
    }

    /// Fills the autoincrement column, returning the identifier of the row.
    /// The sequence is left alone until the row is stored.
    fn assign_identifier(&self, row: &mut Row) -> StorageResult<Option<i64>> {
        let Some(column) = self.schema.auto_increment.as_deref() else {
            return Ok(None);
        };
        let id = match row.get(column) {
            Some(value) if !is_blank(value) => {
                value.decode::<i64>().map_err(|e| StorageError::InvalidValue {
                    table: self.schema.name.clone(),
                    column: column.to_owned(),
                    message: e.to_string(),
                })?
            }
            _ => self.next_id,
        };
        row.insert(column, id);
        Ok(Some(id))
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Text(s) => s.is_empty() || s == "0",
        Value::Integer(n) => *n == 0,
        _ => false,
    }
}

#[derive(Debug, Default)]
struct Shared {
    tables: RwLock<HashMap<String, Table>>,
    stats: ConnectionStats,
}

/// An in-memory relational store.
///
/// Suitable for unit and integration tests and for ephemeral stores. Clones
/// share the same tables and statistics but each clone has its own open
/// flag, so a test can keep a clone as a probe while a manager owns the
/// original.
///
/// # Example
///
/// ```rust
/// use rowmap_codec::Row;
/// use rowmap_storage::{Connection, InMemoryConnection, TableSchema};
///
/// let mut conn = InMemoryConnection::new()
///     .with_table(TableSchema::new("users").columns(["id", "name"]).auto_increment("id"));
/// conn.open().unwrap();
///
/// let id = conn.insert("users", &Row::new().with("name", "alice")).unwrap();
/// assert_eq!(id.and_then(|v| v.as_integer()), Some(1));
/// assert_eq!(conn.row_count("users"), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct InMemoryConnection {
    shared: Arc<Shared>,
    open: bool,
}

impl InMemoryConnection {
    /// Creates a closed connection to an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds (or replaces) a table.
    #[must_use]
    pub fn with_table(self, schema: TableSchema) -> Self {
        self.shared
            .tables
            .write()
            .insert(schema.name.clone(), Table::new(schema));
        self
    }

    /// Creates a table.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::TableExists`] if the name is taken.
    pub fn create_table(&self, schema: TableSchema) -> StorageResult<()> {
        let mut tables = self.shared.tables.write();
        if tables.contains_key(&schema.name) {
            return Err(StorageError::TableExists { table: schema.name });
        }
        tables.insert(schema.name.clone(), Table::new(schema));
        Ok(())
    }

    /// Returns a copy of every row in `table`, bypassing the open check.
    ///
    /// Unknown tables yield an empty list.
    #[must_use]
    pub fn rows(&self, table: &str) -> Vec<Row> {
        self.shared
            .tables
            .read()
            .get(table)
            .map(|t| t.rows.clone())
            .unwrap_or_default()
    }

    /// Returns the number of rows in `table`.
    #[must_use]
    pub fn row_count(&self, table: &str) -> usize {
        self.shared
            .tables
            .read()
            .get(table)
            .map_or(0, |t| t.rows.len())
    }

    /// Returns the shared statement counters.
    #[must_use]
    pub fn stats(&self) -> &ConnectionStats {
        &self.shared.stats
    }

    fn ensure_open(&self) -> StorageResult<()> {
        if self.open {
            Ok(())
        } else {
            Err(StorageError::Closed)
        }
    }

    fn scan(
        &self,
        columns: &[&str],
        table: &str,
        predicate: &Predicate,
        limit: Option<usize>,
    ) -> StorageResult<Vec<Row>> {
        self.ensure_open()?;
        self.shared.stats.record_select();
        let tables = self.shared.tables.read();
        let table = tables
            .get(table)
            .ok_or_else(|| StorageError::unknown_table(table))?;
        table.check_columns(columns.iter().copied())?;
        table.check_columns(predicate.names())?;
        let rows: Vec<Row> = table
            .rows
            .iter()
            .filter(|row| row.matches(predicate))
            .take(limit.unwrap_or(usize::MAX))
            .map(|row| Table::project(row, columns))
            .collect();
        trace!(table = %table.schema.name, matched = rows.len(), "select");
        Ok(rows)
    }
}

impl Connection for InMemoryConnection {
    fn is_open(&self) -> bool {
        self.open
    }

    fn open(&mut self) -> StorageResult<()> {
        if !self.open {
            self.open = true;
            self.shared.stats.record_open();
        }
        Ok(())
    }

    fn close(&mut self) -> StorageResult<()> {
        self.open = false;
        Ok(())
    }

    fn select(
        &self,
        columns: &[&str],
        table: &str,
        predicate: &Predicate,
    ) -> StorageResult<Option<Row>> {
        Ok(self.scan(columns, table, predicate, Some(1))?.into_iter().next())
    }

    fn select_all(
        &self,
        columns: &[&str],
        table: &str,
        predicate: &Predicate,
    ) -> StorageResult<Vec<Row>> {
        self.scan(columns, table, predicate, None)
    }

    fn insert(&mut self, table: &str, values: &Row) -> StorageResult<Option<Value>> {
        self.ensure_open()?;
        self.shared.stats.record_insert();
        let mut tables = self.shared.tables.write();
        let table = tables
            .get_mut(table)
            .ok_or_else(|| StorageError::unknown_table(table))?;
        table.check_columns(values.names())?;

        let mut row: Row = table
            .schema
            .columns
            .iter()
            .map(|c| (c.as_str(), Value::Null))
            .collect();
        for (name, value) in values.iter() {
            row.insert(name, value.clone());
        }
        let generated = table.assign_identifier(&mut row)?;

        if let Some(key) = table.key_of(&row) {
            if table.rows.iter().any(|existing| existing.matches(&key)) {
                let rendered: Vec<String> = key.values().map(ToString::to_string).collect();
                return Err(StorageError::DuplicateKey {
                    table: table.schema.name.clone(),
                    key: rendered.join(", "),
                });
            }
        }

        if let Some(id) = generated {
            table.next_id = table.next_id.max(id.saturating_add(1));
        }
        trace!(table = %table.schema.name, generated = ?generated, "insert");
        table.rows.push(row);
        Ok(generated.map(Value::Integer))
    }

    fn update(&mut self, table: &str, values: &Row, predicate: &Predicate) -> StorageResult<u64> {
        self.ensure_open()?;
        self.shared.stats.record_update();
        let mut tables = self.shared.tables.write();
        let table = tables
            .get_mut(table)
            .ok_or_else(|| StorageError::unknown_table(table))?;
        table.check_columns(values.names())?;
        table.check_columns(predicate.names())?;

        let mut affected = 0;
        for row in table.rows.iter_mut().filter(|row| row.matches(predicate)) {
            for (name, value) in values.iter() {
                row.insert(name, value.clone());
            }
            affected += 1;
        }
        trace!(table = %table.schema.name, affected, "update");
        Ok(affected)
    }

    fn delete(&mut self, table: &str, predicate: &Predicate) -> StorageResult<u64> {
        self.ensure_open()?;
        self.shared.stats.record_delete();
        let mut tables = self.shared.tables.write();
        let table = tables
            .get_mut(table)
            .ok_or_else(|| StorageError::unknown_table(table))?;
        table.check_columns(predicate.names())?;

        let before = table.rows.len();
        table.rows.retain(|row| !row.matches(predicate));
        let affected = (before - table.rows.len()) as u64;
        trace!(table = %table.schema.name, affected, "delete");
        Ok(affected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn users() -> InMemoryConnection {
        let mut conn = InMemoryConnection::new().with_table(
            TableSchema::new("users")
                .columns(["id", "name", "email"])
                .primary_key(["id"])
                .auto_increment("id"),
        );
        conn.open().unwrap();
        conn
    }

    fn name(n: &str) -> Row {
        Row::new().with("name", n)
    }

    #[test]
    fn statements_fail_while_closed() {
        let mut conn = InMemoryConnection::new().with_table(TableSchema::new("t"));
        assert!(!conn.is_open());
        assert!(matches!(
            conn.select(&[], "t", &Row::new()),
            Err(StorageError::Closed)
        ));
        assert!(matches!(
            conn.insert("t", &Row::new()),
            Err(StorageError::Closed)
        ));
        conn.open().unwrap();
        assert!(conn.select(&[], "t", &Row::new()).unwrap().is_none());
    }

    #[test]
    fn open_is_counted_once() {
        let mut conn = InMemoryConnection::new();
        conn.open().unwrap();
        conn.open().unwrap();
        assert_eq!(conn.stats().opens(), 1);
        conn.close().unwrap();
        assert!(!conn.is_open());
    }

    #[test]
    fn insert_generates_sequential_ids() {
        let mut conn = users();
        let first = conn.insert("users", &name("a")).unwrap();
        let second = conn.insert("users", &name("b")).unwrap();
        assert_eq!(first, Some(Value::Integer(1)));
        assert_eq!(second, Some(Value::Integer(2)));

        let row = conn
            .select(&["id", "name"], "users", &Row::new().with("id", 2))
            .unwrap()
            .unwrap();
        assert_eq!(row.get_as::<String>("name").unwrap(), "b");
        // undeclared-but-omitted columns are NULL
        let full = conn.select(&[], "users", &Row::new().with("id", 1)).unwrap().unwrap();
        assert_eq!(full.get("email"), Some(&Value::Null));
    }

    #[test]
    fn blank_identifiers_are_generated() {
        let mut conn = users();
        for blank in [Value::Null, Value::Text(String::new()), Value::Text("0".into())] {
            let id = conn
                .insert("users", &name("x").with("id", blank))
                .unwrap()
                .unwrap();
            assert!(id.as_integer().unwrap() > 0);
        }
        assert_eq!(conn.row_count("users"), 3);
    }

    #[test]
    fn explicit_identifier_advances_sequence() {
        let mut conn = users();
        let id = conn.insert("users", &name("x").with("id", "10")).unwrap();
        assert_eq!(id, Some(Value::Integer(10)));
        let next = conn.insert("users", &name("y")).unwrap();
        assert_eq!(next, Some(Value::Integer(11)));
    }

    #[test]
    fn duplicate_key_is_rejected() {
        let mut conn = users();
        conn.insert("users", &name("x").with("id", 3)).unwrap();
        let err = conn.insert("users", &name("y").with("id", "3")).unwrap_err();
        assert!(matches!(err, StorageError::DuplicateKey { .. }));
        assert_eq!(conn.row_count("users"), 1);
    }

    #[test]
    fn rejected_insert_keeps_sequence() {
        let mut conn = InMemoryConnection::new().with_table(
            TableSchema::new("tags")
                .columns(["id", "name"])
                .primary_key(["name"])
                .auto_increment("id"),
        );
        conn.open().unwrap();
        conn.insert("tags", &name("a")).unwrap();
        let err = conn.insert("tags", &name("a")).unwrap_err();
        assert!(matches!(err, StorageError::DuplicateKey { .. }));

        let next = conn.insert("tags", &name("b")).unwrap();
        assert_eq!(next, Some(Value::Integer(2)));
    }

    #[test]
    fn tables_without_autoincrement_return_no_id() {
        let mut conn = InMemoryConnection::new().with_table(TableSchema::new("settings"));
        conn.open().unwrap();
        let id = conn
            .insert("settings", &Row::new().with("key", "theme"))
            .unwrap();
        assert_eq!(id, None);
    }

    #[test]
    fn unknown_table_and_column() {
        let mut conn = users();
        assert!(matches!(
            conn.insert("nope", &Row::new()),
            Err(StorageError::UnknownTable { .. })
        ));
        assert!(matches!(
            conn.update("users", &Row::new().with("age", 3), &Row::new()),
            Err(StorageError::UnknownColumn { .. })
        ));
        assert!(matches!(
            conn.select(&["age"], "users", &Row::new()),
            Err(StorageError::UnknownColumn { .. })
        ));
    }

    #[test]
    fn update_and_delete_report_affected_rows() {
        let mut conn = users();
        conn.insert("users", &name("a")).unwrap();
        conn.insert("users", &name("a")).unwrap();
        conn.insert("users", &name("b")).unwrap();

        let updated = conn
            .update("users", &Row::new().with("email", "x@y"), &name("a"))
            .unwrap();
        assert_eq!(updated, 2);

        let none = conn
            .update("users", &name("c"), &Row::new().with("id", 99))
            .unwrap();
        assert_eq!(none, 0);

        assert_eq!(conn.delete("users", &Row::new().with("id", "1")).unwrap(), 1);
        assert_eq!(conn.delete("users", &Row::new().with("id", 1)).unwrap(), 0);
        assert_eq!(conn.row_count("users"), 2);
    }

    #[test]
    fn select_all_filters_and_projects() {
        let mut conn = users();
        conn.insert("users", &name("a")).unwrap();
        conn.insert("users", &name("b")).unwrap();
        conn.insert("users", &name("a")).unwrap();

        let rows = conn.select_all(&["id"], "users", &name("a")).unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.len() == 1 && r.contains("id")));
        assert_eq!(conn.stats().selects(), 1);
    }

    #[test]
    fn clones_share_tables() {
        let mut conn = users();
        let probe = conn.clone();
        conn.insert("users", &name("a")).unwrap();
        assert_eq!(probe.rows("users").len(), 1);
        assert_eq!(probe.stats().inserts(), 1);
    }

    #[test]
    fn create_table_rejects_duplicates() {
        let conn = InMemoryConnection::new();
        conn.create_table(TableSchema::new("t")).unwrap();
        assert!(matches!(
            conn.create_table(TableSchema::new("t")),
            Err(StorageError::TableExists { .. })
        ));
    }

    mod prop {
        use super::*;
        use proptest::prelude::*;
        use proptest::prelude::prop;

        proptest! {
            #[test]
            fn delete_removes_exactly_matching_rows(
                names in prop::collection::vec(prop::sample::select(vec!["a", "b", "c"]), 0..20),
                target in prop::sample::select(vec!["a", "b", "c"]),
            ) {
                let mut conn = users();
                for n in &names {
                    conn.insert("users", &name(n)).unwrap();
                }
                let expected = names.iter().filter(|n| **n == target).count() as u64;
                prop_assert_eq!(conn.delete("users", &name(target)).unwrap(), expected);
                prop_assert_eq!(conn.row_count("users") as u64, names.len() as u64 - expected);
                prop_assert!(conn.rows("users").iter().all(|r| !r.matches(&name(target))));
            }
        }
    }
}
