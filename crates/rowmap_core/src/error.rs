//! Error types for rowmap core.

use crate::entity::EntityHandle;
use rowmap_codec::CodecError;
use rowmap_storage::StorageError;
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in rowmap core operations.
///
/// Connection failures pass through unchanged as [`CoreError::Storage`]; the
/// manager never retries or wraps them.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The connection reported a failure.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// A value could not be converted to or from a field.
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    /// The manager was constructed with an invalid configuration.
    #[error("configuration error: {message}")]
    Configuration {
        /// Description of the problem.
        message: String,
    },

    /// A lookup key has the wrong number of parts.
    #[error("{entity_type} has {expected} primary key field(s), got {actual} key value(s)")]
    Arity {
        /// Qualified entity type name.
        entity_type: String,
        /// Number of primary key fields.
        expected: usize,
        /// Number of supplied key values.
        actual: usize,
    },

    /// The instance is not registered in the identity map.
    #[error("{handle} is not tracked by this manager")]
    NotTracked {
        /// Handle of the untracked instance.
        handle: EntityHandle,
    },

    /// An autoincrement insert produced no identifier.
    #[error("insert into {table} returned no generated key for {field}")]
    MissingGeneratedKey {
        /// Table that was written.
        table: String,
        /// The autoincrement field left unset.
        field: String,
    },

    /// The instance cannot be accessed in its current state.
    #[error("invalid state: {message}")]
    InvalidState {
        /// Description of the problem.
        message: String,
    },

    /// No metadata is registered for the entity type.
    #[error("unknown entity type: {entity_type}")]
    UnknownEntityType {
        /// Qualified entity type name.
        entity_type: String,
    },

    /// Registered metadata is inconsistent.
    #[error("invalid metadata for {entity_type}: {message}")]
    InvalidMetadata {
        /// Qualified entity type name.
        entity_type: String,
        /// Description of the inconsistency.
        message: String,
    },

    /// The entity has no field with the given name.
    #[error("{entity_type} has no field {field}")]
    UnknownField {
        /// Entity type name.
        entity_type: String,
        /// Requested field.
        field: String,
    },

    /// A query builder statement is incomplete.
    #[error("invalid query: {message}")]
    InvalidQuery {
        /// Description of what is missing.
        message: String,
    },
}

impl CoreError {
    /// Creates a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Creates an invalid state error.
    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState {
            message: message.into(),
        }
    }

    /// Creates an unknown entity type error.
    pub fn unknown_entity_type(entity_type: impl Into<String>) -> Self {
        Self::UnknownEntityType {
            entity_type: entity_type.into(),
        }
    }

    /// Creates an invalid metadata error.
    pub fn invalid_metadata(entity_type: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidMetadata {
            entity_type: entity_type.into(),
            message: message.into(),
        }
    }

    /// Creates an unknown field error.
    pub fn unknown_field(entity_type: impl Into<String>, field: impl Into<String>) -> Self {
        Self::UnknownField {
            entity_type: entity_type.into(),
            field: field.into(),
        }
    }

    /// Creates an invalid query error.
    pub fn invalid_query(message: impl Into<String>) -> Self {
        Self::InvalidQuery {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_errors_pass_through() {
        let err: CoreError = StorageError::Closed.into();
        assert_eq!(err.to_string(), StorageError::Closed.to_string());
        assert!(matches!(err, CoreError::Storage(StorageError::Closed)));
    }

    #[test]
    fn arity_message_names_counts() {
        let err = CoreError::Arity {
            entity_type: "Membership".into(),
            expected: 2,
            actual: 1,
        };
        assert_eq!(
            err.to_string(),
            "Membership has 2 primary key field(s), got 1 key value(s)"
        );
    }
}
