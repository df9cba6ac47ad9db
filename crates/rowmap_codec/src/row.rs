//! Ordered column → value maps.

use crate::error::{CodecError, CodecResult};
use crate::value::{FromValue, Value};

/// An ordered map from column (or property) name to value.
///
/// The same type carries rows fetched from the store, value maps written to
/// it and equality predicates. Insertion order is preserved; inserting an
/// existing name replaces its value in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Row {
    entries: Vec<(String, Value)>,
}

impl Row {
    /// Creates an empty row.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty row with room for `capacity` columns.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    /// Sets `name` to `value`, returning the previous value if any.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                self.entries.push((name, value));
                None
            }
        }
    }

    /// Builder form of [`Row::insert`].
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    /// Returns the value of `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find_map(|(n, v)| (n == name).then_some(v))
    }

    /// Reads the value of `name` as `T`.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::MissingColumn`] when the column is absent, or a
    /// conversion error from [`FromValue`].
    pub fn get_as<T: FromValue>(&self, name: &str) -> CodecResult<T> {
        let value = self
            .get(name)
            .ok_or_else(|| CodecError::missing_column(name))?;
        T::from_value(value)
    }

    /// Removes `name`, returning its value.
    pub fn remove(&mut self, name: &str) -> Option<Value> {
        let index = self.entries.iter().position(|(n, _)| n == name)?;
        Some(self.entries.remove(index).1)
    }

    /// Returns `true` if the row contains `name`.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Returns the number of columns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the row has no columns.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over `(name, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v))
    }

    /// Iterates over the names in insertion order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    /// Iterates over the values in insertion order.
    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.entries.iter().map(|(_, v)| v)
    }

    /// Returns `true` if every entry of `predicate` is present here with an
    /// equal value. An empty predicate matches every row.
    ///
    /// Values compare by text form, so a text-encoded `"7"` matches
    /// `Integer(7)`. `NULL` only matches `NULL`.
    #[must_use]
    pub fn matches(&self, predicate: &Row) -> bool {
        predicate.iter().all(|(name, expected)| match self.get(name) {
            Some(actual) if actual.is_null() || expected.is_null() => {
                actual.is_null() && expected.is_null()
            }
            Some(actual) => actual.to_text() == expected.to_text(),
            None => false,
        })
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Row {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut row = Row::new();
        for (name, value) in iter {
            row.insert(name, value);
        }
        row
    }
}

impl IntoIterator for Row {
    type Item = (String, Value);
    type IntoIter = std::vec::IntoIter<(String, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_replaces_in_place() {
        let mut row = Row::new().with("a", 1).with("b", 2);
        assert_eq!(row.insert("a", 10), Some(Value::Integer(1)));
        let names: Vec<_> = row.names().collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(row.get("a"), Some(&Value::Integer(10)));
    }

    #[test]
    fn get_as_reports_missing_column() {
        let row = Row::new().with("id", "5");
        assert_eq!(row.get_as::<i64>("id").unwrap(), 5);
        assert_eq!(
            row.get_as::<i64>("age"),
            Err(CodecError::missing_column("age"))
        );
    }

    #[test]
    fn matches_is_subset_equality() {
        let row = Row::new().with("a", 1).with("b", "x");
        assert!(row.matches(&Row::new()));
        assert!(row.matches(&Row::new().with("b", "x")));
        assert!(!row.matches(&Row::new().with("b", "y")));
        assert!(!row.matches(&Row::new().with("c", 1)));
    }

    #[test]
    fn matches_across_encodings() {
        let stored = Row::new().with("id", "7").with("note", Value::Null);
        assert!(stored.matches(&Row::new().with("id", 7)));
        assert!(stored.matches(&Row::new().with("note", Value::Null)));
        assert!(!stored.matches(&Row::new().with("note", "")));
    }

    #[test]
    fn remove_and_collect() {
        let mut row: Row = vec![("x", 1), ("y", 2)].into_iter().collect();
        assert_eq!(row.remove("x"), Some(Value::Integer(1)));
        assert_eq!(row.remove("x"), None);
        assert_eq!(row.len(), 1);
    }
}
