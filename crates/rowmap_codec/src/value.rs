//! Dynamic column value type.

use crate::error::{CodecError, CodecResult};
use std::fmt;

/// A dynamic column value.
///
/// Values cross the connection boundary either natively typed or
/// text-encoded (see [`Value::text_encoded`]). Typed reads through
/// [`FromValue`] accept both forms, so an entity built from a row does not
/// care which convention the store used.
///
/// Floats are intentionally not supported: equality of column values must be
/// exact for content hashing to be meaningful.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum Value {
    /// SQL `NULL`.
    #[default]
    Null,
    /// Boolean value.
    Bool(bool),
    /// Signed integer (full i64 range).
    Integer(i64),
    /// Text string (UTF-8).
    Text(String),
    /// Byte string.
    Bytes(Vec<u8>),
}

impl Value {
    /// Returns `true` for [`Value::Null`].
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns the variant name, used in error messages.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Integer(_) => "integer",
            Value::Text(_) => "text",
            Value::Bytes(_) => "bytes",
        }
    }

    /// Returns the text form of the value.
    ///
    /// `Null` renders as the empty string, booleans as `true`/`false`,
    /// bytes as lowercase hex.
    #[must_use]
    pub fn to_text(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Bool(b) => b.to_string(),
            Value::Integer(n) => n.to_string(),
            Value::Text(s) => s.clone(),
            Value::Bytes(bytes) => encode_hex(bytes),
        }
    }

    /// Returns the value as it is written to the store: text for every
    /// non-null value, `Null` otherwise.
    #[must_use]
    pub fn text_encoded(&self) -> Value {
        match self {
            Value::Null => Value::Null,
            Value::Text(s) => Value::Text(s.clone()),
            other => Value::Text(other.to_text()),
        }
    }

    /// Reads the value as `T`.
    pub fn decode<T: FromValue>(&self) -> CodecResult<T> {
        T::from_value(self)
    }

    /// Returns the text slice if this is a text value.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the integer if this is an integer value.
    #[must_use]
    pub const fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(n) => Some(*n),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("NULL"),
            Value::Text(s) => write!(f, "{s:?}"),
            other => f.write_str(&other.to_text()),
        }
    }
}

/// Conversion from a column value into a Rust type.
///
/// Implementations accept the native variant and its text encoding.
pub trait FromValue: Sized {
    /// Converts `value` into `Self`.
    fn from_value(value: &Value) -> CodecResult<Self>;
}

impl FromValue for Value {
    fn from_value(value: &Value) -> CodecResult<Self> {
        Ok(value.clone())
    }
}

impl FromValue for i64 {
    fn from_value(value: &Value) -> CodecResult<Self> {
        match value {
            Value::Integer(n) => Ok(*n),
            Value::Text(s) => s
                .trim()
                .parse()
                .map_err(|_| CodecError::invalid_text("i64", s.as_str())),
            other => Err(CodecError::type_mismatch("i64", other.type_name())),
        }
    }
}

impl FromValue for i32 {
    fn from_value(value: &Value) -> CodecResult<Self> {
        let wide = i64::from_value(value)?;
        i32::try_from(wide).map_err(|_| CodecError::invalid_text("i32", wide.to_string()))
    }
}

impl FromValue for u32 {
    fn from_value(value: &Value) -> CodecResult<Self> {
        let wide = i64::from_value(value)?;
        u32::try_from(wide).map_err(|_| CodecError::invalid_text("u32", wide.to_string()))
    }
}

impl FromValue for u64 {
    fn from_value(value: &Value) -> CodecResult<Self> {
        match value {
            Value::Integer(n) => {
                u64::try_from(*n).map_err(|_| CodecError::invalid_text("u64", n.to_string()))
            }
            Value::Text(s) => s
                .trim()
                .parse()
                .map_err(|_| CodecError::invalid_text("u64", s.as_str())),
            other => Err(CodecError::type_mismatch("u64", other.type_name())),
        }
    }
}

impl FromValue for bool {
    fn from_value(value: &Value) -> CodecResult<Self> {
        match value {
            Value::Bool(b) => Ok(*b),
            Value::Integer(0) => Ok(false),
            Value::Integer(1) => Ok(true),
            Value::Text(s) => match s.trim() {
                "true" | "1" => Ok(true),
                "false" | "0" | "" => Ok(false),
                _ => Err(CodecError::invalid_text("bool", s.as_str())),
            },
            other => Err(CodecError::type_mismatch("bool", other.type_name())),
        }
    }
}

impl FromValue for String {
    fn from_value(value: &Value) -> CodecResult<Self> {
        match value {
            Value::Null => Err(CodecError::type_mismatch("string", "null")),
            Value::Text(s) => Ok(s.clone()),
            other => Ok(other.to_text()),
        }
    }
}

impl FromValue for Vec<u8> {
    fn from_value(value: &Value) -> CodecResult<Self> {
        match value {
            Value::Bytes(bytes) => Ok(bytes.clone()),
            Value::Text(s) => decode_hex(s).ok_or_else(|| CodecError::invalid_text("bytes", s.as_str())),
            other => Err(CodecError::type_mismatch("bytes", other.type_name())),
        }
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: &Value) -> CodecResult<Self> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Integer(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Integer(i64::from(n))
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Value::Integer(i64::from(n))
    }
}

impl From<u64> for Value {
    /// Values above `i64::MAX` are stored in text form.
    fn from(n: u64) -> Self {
        i64::try_from(n).map_or_else(|_| Value::Text(n.to_string()), Value::Integer)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_owned())
    }
}

impl From<&String> for Value {
    fn from(s: &String) -> Self {
        Value::Text(s.clone())
    }
}

impl From<Vec<u8>> for Value {
    fn from(bytes: Vec<u8>) -> Self {
        Value::Bytes(bytes)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

fn encode_hex(bytes: &[u8]) -> String {
    const DIGITS: &[u8; 16] = b"0123456789abcdef";
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        out.push(DIGITS[usize::from(byte >> 4)] as char);
        out.push(DIGITS[usize::from(byte & 0x0f)] as char);
    }
    out
}

fn decode_hex(text: &str) -> Option<Vec<u8>> {
    if text.len() % 2 != 0 {
        return None;
    }
    (0..text.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(text.get(i..i + 2)?, 16).ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn large_unsigned_survives_conversion() {
        assert_eq!(Value::from(7u64), Value::Integer(7));
        let big = Value::from(u64::MAX);
        assert_eq!(big, Value::Text(u64::MAX.to_string()));
        assert_eq!(big.decode::<u64>().unwrap(), u64::MAX);
    }

    #[test]
    fn text_form() {
        assert_eq!(Value::Null.to_text(), "");
        assert_eq!(Value::Bool(true).to_text(), "true");
        assert_eq!(Value::Integer(-7).to_text(), "-7");
        assert_eq!(Value::Text("abc".into()).to_text(), "abc");
        assert_eq!(Value::Bytes(vec![0x00, 0xab, 0x10]).to_text(), "00ab10");
    }

    #[test]
    fn text_encoded_keeps_null() {
        assert_eq!(Value::Null.text_encoded(), Value::Null);
        assert_eq!(Value::Integer(42).text_encoded(), Value::Text("42".into()));
        assert_eq!(Value::Bool(false).text_encoded(), Value::Text("false".into()));
    }

    #[test]
    fn integers_read_from_text() {
        assert_eq!(i64::from_value(&Value::Text(" 12 ".into())).unwrap(), 12);
        assert_eq!(i64::from_value(&Value::Integer(12)).unwrap(), 12);
        assert!(matches!(
            i64::from_value(&Value::Text("twelve".into())),
            Err(CodecError::InvalidText { .. })
        ));
        assert!(matches!(
            i64::from_value(&Value::Bool(true)),
            Err(CodecError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn narrow_integers_reject_overflow() {
        assert!(i32::from_value(&Value::Integer(i64::MAX)).is_err());
        assert!(u64::from_value(&Value::Integer(-1)).is_err());
        assert_eq!(u32::from_value(&Value::Text("7".into())).unwrap(), 7);
    }

    #[test]
    fn bools_read_from_text_and_integers() {
        assert!(bool::from_value(&Value::Text("true".into())).unwrap());
        assert!(bool::from_value(&Value::Text("1".into())).unwrap());
        assert!(!bool::from_value(&Value::Integer(0)).unwrap());
        assert!(bool::from_value(&Value::Text("maybe".into())).is_err());
    }

    #[test]
    fn bytes_survive_text_encoding() {
        let original = Value::Bytes(vec![1, 2, 254, 255]);
        let encoded = original.text_encoded();
        assert_eq!(Vec::<u8>::from_value(&encoded).unwrap(), vec![1, 2, 254, 255]);
        assert!(Vec::<u8>::from_value(&Value::Text("abc".into())).is_err());
    }

    #[test]
    fn options_map_null() {
        assert_eq!(Option::<i64>::from_value(&Value::Null).unwrap(), None);
        assert_eq!(
            Option::<i64>::from_value(&Value::Text("5".into())).unwrap(),
            Some(5)
        );
        assert_eq!(Value::from(None::<i64>), Value::Null);
        assert_eq!(Value::from(Some("x")), Value::Text("x".into()));
    }

    #[test]
    fn strings_reject_null() {
        assert!(String::from_value(&Value::Null).is_err());
        assert_eq!(String::from_value(&Value::Integer(3)).unwrap(), "3");
    }
}
