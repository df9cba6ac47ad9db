//! # rowmap codec
//!
//! Column values, rows and content digests for rowmap.
//!
//! This crate provides:
//! - [`Value`], the dynamic column value exchanged with a connection
//! - [`Row`], an ordered name → value map used for rows, write maps and
//!   equality predicates
//! - [`ContentHasher`], the order-sensitive digest behind dirty checking
//!
//! ## Text encoding
//!
//! By convention every non-null value is written to the store in its text
//! form; typed reads accept both forms:
//!
//! ```
//! use rowmap_codec::{Row, Value};
//!
//! let written = Value::Integer(42).text_encoded();
//! assert_eq!(written, Value::Text("42".into()));
//!
//! let row = Row::new().with("id", written);
//! assert_eq!(row.get_as::<i64>("id").unwrap(), 42);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod digest;
mod error;
mod row;
mod value;

pub use digest::{content_hash, ContentHash, ContentHasher};
pub use error::{CodecError, CodecResult};
pub use row::Row;
pub use value::{FromValue, Value};
