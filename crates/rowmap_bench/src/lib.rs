//! Benchmark utilities.

#![deny(unsafe_code)]
#![warn(missing_docs)]

use rowmap_codec::{Row, Value};
use rowmap_storage::{Connection, InMemoryConnection, TableSchema};

/// Generate `width` values cycling through integer, text, bool and null.
pub fn mixed_values(width: usize) -> Vec<Value> {
    (0..width)
        .map(|i| match i % 4 {
            0 => Value::Integer(i as i64 * 7919),
            1 => Value::Text(format!("text value {i}")),
            2 => Value::Bool(i % 3 == 0),
            _ => Value::Null,
        })
        .collect()
}

/// Open an in-memory connection with an `items` table holding `rows` rows.
pub fn populated_items(rows: usize) -> InMemoryConnection {
    let mut conn = InMemoryConnection::new().with_table(
        TableSchema::new("items")
            .columns(["id", "label"])
            .primary_key(["id"])
            .auto_increment("id"),
    );
    conn.open().expect("in-memory open cannot fail");
    for i in 0..rows {
        conn.insert("items", &Row::new().with("label", format!("item{i}")))
            .expect("Failed to seed items");
    }
    conn
}
