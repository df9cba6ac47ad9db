//! Statement building and write operations for a single instance.
//!
//! These functions hold no manager state: they read the instance, talk to
//! the connection and report what happened. The manager owns the identity
//! map transitions.

use super::outcome::FlushOutcome;
use crate::entity::TrackedInstance;
use crate::error::{CoreError, CoreResult};
use crate::metadata::EntityAttributes;
use rowmap_codec::{content_hash, ContentHash, Row, Value};
use rowmap_storage::{Connection, Predicate};
use tracing::trace;

/// Result of a successful insert.
#[derive(Debug)]
pub(crate) struct Inserted {
    pub(crate) generated_id: Option<Value>,
    pub(crate) baseline: ContentHash,
}

/// Fingerprint of every mapped property, in declaration order.
pub(crate) fn fingerprint(
    instance: &dyn TrackedInstance,
    attributes: &EntityAttributes,
) -> CoreResult<ContentHash> {
    let values = instance.read_fields(&attributes.property_names())?;
    let hash = content_hash(&values);
    trace!(entity_type = attributes.entity_type(), %hash, "fingerprint");
    Ok(hash)
}

/// Column → text-encoded value for every mapped property.
pub(crate) fn value_map(
    instance: &dyn TrackedInstance,
    attributes: &EntityAttributes,
) -> CoreResult<Row> {
    let values = instance.read_fields(&attributes.property_names())?;
    Ok(attributes
        .columns()
        .into_iter()
        .zip(values)
        .map(|(column, value)| (column, value.text_encoded()))
        .collect())
}

/// Equality predicate over the instance's current primary key values.
pub(crate) fn key_predicate(
    instance: &dyn TrackedInstance,
    attributes: &EntityAttributes,
) -> CoreResult<Predicate> {
    let fields: Vec<&str> = attributes
        .primary_key_fields()
        .iter()
        .map(String::as_str)
        .collect();
    let values = instance.read_fields(&fields)?;
    fields
        .into_iter()
        .zip(values)
        .map(|(field, value)| Ok((attributes.column_for(field)?, value)))
        .collect()
}

/// Equality predicate pairing supplied key parts with the primary key
/// fields. The caller checks arity.
pub(crate) fn lookup_predicate(
    attributes: &EntityAttributes,
    key: &[Value],
) -> CoreResult<Predicate> {
    attributes
        .primary_key_fields()
        .iter()
        .zip(key)
        .map(|(field, value)| Ok((attributes.column_for(field)?, value.clone())))
        .collect()
}

/// Renames a property-keyed predicate to columns.
pub(crate) fn column_predicate(
    attributes: &EntityAttributes,
    by_property: &Row,
) -> CoreResult<Predicate> {
    by_property
        .iter()
        .map(|(property, value)| Ok((attributes.column_for(property)?, value.clone())))
        .collect()
}

/// Renames a fetched row from columns to properties. Columns the row lacks
/// are left out so construction reports them as missing.
pub(crate) fn property_row(attributes: &EntityAttributes, row: &Row) -> Row {
    attributes
        .mappings()
        .filter_map(|(property, column)| row.get(column).map(|v| (property, v.clone())))
        .collect()
}

/// Selects every row matching a column-keyed predicate, keyed by property.
pub(crate) fn select_all<C: Connection + ?Sized>(
    connection: &C,
    attributes: &EntityAttributes,
    predicate: &Predicate,
) -> CoreResult<Vec<Row>> {
    trace!(table = attributes.table(), ?predicate, "select");
    let rows = connection.select_all(&attributes.columns(), attributes.table(), predicate)?;
    Ok(rows.iter().map(|row| property_row(attributes, row)).collect())
}

/// Selects the first row matching a column-keyed predicate, keyed by
/// property. An empty row counts as no match.
pub(crate) fn select_one<C: Connection + ?Sized>(
    connection: &C,
    attributes: &EntityAttributes,
    predicate: &Predicate,
) -> CoreResult<Option<Row>> {
    trace!(table = attributes.table(), ?predicate, "select");
    let row = connection.select(&attributes.columns(), attributes.table(), predicate)?;
    Ok(row
        .filter(|row| !row.is_empty())
        .map(|row| property_row(attributes, &row)))
}

/// Inserts the instance and writes a generated key back.
///
/// The instance stays exclusively borrowed from reading its values until
/// the key is assigned, so a borrowed instance fails before any statement
/// is issued.
pub(crate) fn insert<C: Connection + ?Sized>(
    connection: &mut C,
    instance: &dyn TrackedInstance,
    attributes: &EntityAttributes,
) -> CoreResult<Inserted> {
    let table = attributes.table();
    let field = attributes.auto_increment_field();
    let columns = attributes.columns();
    let mut generated_id = None;

    let current = instance.write_back(&attributes.property_names(), field, &mut |current| {
        let values: Row = columns
            .iter()
            .copied()
            .zip(current)
            .map(|(column, value)| (column, value.text_encoded()))
            .collect();
        trace!(table, ?values, "insert");
        let returned = connection.insert(table, &values)?;

        let Some(field) = field else {
            return Ok(None);
        };
        let id = returned
            .filter(is_generated_key)
            .ok_or_else(|| CoreError::MissingGeneratedKey {
                table: table.to_owned(),
                field: field.to_owned(),
            })?;
        generated_id = Some(id.clone());
        Ok(Some(id))
    })?;

    Ok(Inserted {
        generated_id,
        baseline: content_hash(&current),
    })
}

/// Updates the instance's row if its content differs from `baseline`.
pub(crate) fn update<C: Connection + ?Sized>(
    connection: &mut C,
    instance: &dyn TrackedInstance,
    attributes: &EntityAttributes,
    baseline: ContentHash,
) -> CoreResult<FlushOutcome> {
    if fingerprint(instance, attributes)? == baseline {
        return Ok(FlushOutcome::Unchanged);
    }

    let values = value_map(instance, attributes)?;
    let predicate = key_predicate(instance, attributes)?;
    trace!(table = attributes.table(), ?values, ?predicate, "update");
    let affected = connection.update(attributes.table(), &values, &predicate)?;
    Ok(if affected == 1 {
        FlushOutcome::Updated
    } else {
        FlushOutcome::NotApplied { affected }
    })
}

/// Deletes the instance's row, returning the affected row count.
pub(crate) fn delete<C: Connection + ?Sized>(
    connection: &mut C,
    instance: &dyn TrackedInstance,
    attributes: &EntityAttributes,
) -> CoreResult<u64> {
    let predicate = key_predicate(instance, attributes)?;
    trace!(table = attributes.table(), ?predicate, "delete");
    Ok(connection.delete(attributes.table(), &predicate)?)
}

/// Zero and the empty string are what stores without a generated value
/// report.
fn is_generated_key(value: &Value) -> bool {
    !matches!(value.to_text().as_str(), "" | "0")
}
