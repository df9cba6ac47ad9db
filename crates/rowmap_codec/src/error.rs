//! Error types for the codec crate.

use thiserror::Error;

/// Result type for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

/// Errors that can occur while converting column values.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// The value has a variant that cannot be read as the requested type.
    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        /// Name of the requested type.
        expected: &'static str,
        /// Name of the variant that was found.
        found: &'static str,
    },

    /// A text-encoded value could not be parsed as the requested type.
    #[error("cannot parse {text:?} as {expected}")]
    InvalidText {
        /// Name of the requested type.
        expected: &'static str,
        /// The offending text.
        text: String,
    },

    /// A row does not contain the requested column.
    #[error("missing column: {column}")]
    MissingColumn {
        /// Name of the column.
        column: String,
    },
}

impl CodecError {
    /// Creates a type mismatch error.
    pub fn type_mismatch(expected: &'static str, found: &'static str) -> Self {
        Self::TypeMismatch { expected, found }
    }

    /// Creates an invalid text error.
    pub fn invalid_text(expected: &'static str, text: impl Into<String>) -> Self {
        Self::InvalidText {
            expected,
            text: text.into(),
        }
    }

    /// Creates a missing column error.
    pub fn missing_column(column: impl Into<String>) -> Self {
        Self::MissingColumn {
            column: column.into(),
        }
    }
}
