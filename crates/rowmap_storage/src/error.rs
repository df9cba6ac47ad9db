//! Error types for connection operations.

use std::io;
use thiserror::Error;

/// Result type for connection operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors reported by a [`crate::Connection`].
#[derive(Debug, Error)]
pub enum StorageError {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The connection is not open.
    #[error("connection is closed")]
    Closed,

    /// The statement names a table the store does not have.
    #[error("unknown table: {table}")]
    UnknownTable {
        /// Name of the table.
        table: String,
    },

    /// The statement names a column the table does not declare.
    #[error("unknown column {column} in table {table}")]
    UnknownColumn {
        /// Name of the table.
        table: String,
        /// Name of the column.
        column: String,
    },

    /// An insert would duplicate an existing primary key.
    #[error("duplicate primary key in table {table}: {key}")]
    DuplicateKey {
        /// Name of the table.
        table: String,
        /// Rendered key values.
        key: String,
    },

    /// A value cannot be stored in its column.
    #[error("invalid value for {table}.{column}: {message}")]
    InvalidValue {
        /// Name of the table.
        table: String,
        /// Name of the column.
        column: String,
        /// Why the value was rejected.
        message: String,
    },

    /// A table with the same name already exists.
    #[error("table already exists: {table}")]
    TableExists {
        /// Name of the table.
        table: String,
    },
}

impl StorageError {
    /// Creates an unknown table error.
    pub fn unknown_table(table: impl Into<String>) -> Self {
        Self::UnknownTable {
            table: table.into(),
        }
    }

    /// Creates an unknown column error.
    pub fn unknown_column(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self::UnknownColumn {
            table: table.into(),
            column: column.into(),
        }
    }
}
