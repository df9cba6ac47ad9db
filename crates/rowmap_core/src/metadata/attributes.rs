//! Per-type mapping metadata.

use crate::error::{CoreError, CoreResult};
use std::collections::HashSet;

/// How an entity type maps onto a table.
///
/// Properties keep their declaration order; that order drives value maps,
/// content hashes and select column lists. A property maps to a column of the
/// same name unless [`EntityAttributes::property`] names one.
///
/// ```rust
/// use rowmap_core::EntityAttributes;
///
/// let attrs = EntityAttributes::new("User", "users")
///     .properties(["id", "name"])
///     .property("email", "email_address")
///     .primary_key(["id"])
///     .auto_increment("id");
/// attrs.validate().unwrap();
/// assert_eq!(attrs.column_of("email"), Some("email_address"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityAttributes {
    entity_type: String,
    table: String,
    properties: Vec<(String, String)>,
    primary_key: Vec<String>,
    auto_increment: Option<String>,
}

impl EntityAttributes {
    /// Creates metadata for `entity_type` stored in `table`.
    pub fn new(entity_type: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            entity_type: entity_type.into(),
            table: table.into(),
            properties: Vec::new(),
            primary_key: Vec::new(),
            auto_increment: None,
        }
    }

    /// Adds a property stored in `column`.
    #[must_use]
    pub fn property(mut self, name: impl Into<String>, column: impl Into<String>) -> Self {
        self.properties.push((name.into(), column.into()));
        self
    }

    /// Adds properties stored in columns of the same name.
    #[must_use]
    pub fn properties<I, S>(self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        names.into_iter().fold(self, |attrs, name| {
            let name = name.into();
            attrs.property(name.clone(), name)
        })
    }

    /// Sets the ordered primary key fields.
    #[must_use]
    pub fn primary_key<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.primary_key = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Marks `field` as generated by the store on insert.
    #[must_use]
    pub fn auto_increment(mut self, field: impl Into<String>) -> Self {
        self.auto_increment = Some(field.into());
        self
    }

    /// Returns a copy registered under `entity_type`.
    #[must_use]
    pub fn renamed(mut self, entity_type: impl Into<String>) -> Self {
        self.entity_type = entity_type.into();
        self
    }

    /// Checks the mapping for consistency.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidMetadata`] when the table name is empty,
    /// there are no properties or primary key fields, a property or column is
    /// declared twice, or a key or autoincrement field is not a property.
    pub fn validate(&self) -> CoreResult<()> {
        let fail = |message: String| Err(CoreError::invalid_metadata(&self.entity_type, message));

        if self.table.is_empty() {
            return fail("table name is empty".into());
        }
        if self.properties.is_empty() {
            return fail("no properties declared".into());
        }
        if self.primary_key.is_empty() {
            return fail("no primary key fields declared".into());
        }

        let mut names = HashSet::new();
        let mut columns = HashSet::new();
        for (name, column) in &self.properties {
            if !names.insert(name.as_str()) {
                return fail(format!("property {name} declared twice"));
            }
            if !columns.insert(column.as_str()) {
                return fail(format!("column {column} mapped twice"));
            }
        }

        let mut key = HashSet::new();
        for field in &self.primary_key {
            if !names.contains(field.as_str()) {
                return fail(format!("primary key field {field} is not a property"));
            }
            if !key.insert(field.as_str()) {
                return fail(format!("primary key field {field} listed twice"));
            }
        }
        if let Some(field) = &self.auto_increment {
            if !names.contains(field.as_str()) {
                return fail(format!("autoincrement field {field} is not a property"));
            }
        }
        Ok(())
    }

    /// Returns the entity type name this metadata is registered under.
    #[must_use]
    pub fn entity_type(&self) -> &str {
        &self.entity_type
    }

    /// Returns the table name.
    #[must_use]
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Returns the primary key fields in key order.
    #[must_use]
    pub fn primary_key_fields(&self) -> &[String] {
        &self.primary_key
    }

    /// Returns the autoincrement field, if any.
    #[must_use]
    pub fn auto_increment_field(&self) -> Option<&str> {
        self.auto_increment.as_deref()
    }

    /// Iterates over `(property, column)` pairs in declaration order.
    pub fn mappings(&self) -> impl Iterator<Item = (&str, &str)> {
        self.properties
            .iter()
            .map(|(name, column)| (name.as_str(), column.as_str()))
    }

    /// Returns the property names in declaration order.
    #[must_use]
    pub fn property_names(&self) -> Vec<&str> {
        self.properties.iter().map(|(name, _)| name.as_str()).collect()
    }

    /// Returns the column names in declaration order.
    #[must_use]
    pub fn columns(&self) -> Vec<&str> {
        self.properties.iter().map(|(_, column)| column.as_str()).collect()
    }

    /// Returns the column `property` is stored in.
    #[must_use]
    pub fn column_of(&self, property: &str) -> Option<&str> {
        self.mappings()
            .find_map(|(name, column)| (name == property).then_some(column))
    }

    /// Like [`EntityAttributes::column_of`], failing for unmapped properties.
    pub(crate) fn column_for(&self, property: &str) -> CoreResult<&str> {
        self.column_of(property)
            .ok_or_else(|| CoreError::unknown_field(&self.entity_type, property))
    }
}
