//! Record decoder: tokenized fields to typed entities.
//!
//! A single generic function serves every kind. The schema names the entity
//! field each column fills; the row is turned into a JSON object keyed by
//! those names and deserialised into the entity type. No semantic checks are
//! made on any value.

use crate::entities::Entity;
use crate::error::RejectedRow;
use crate::schema::Schema;
use serde_json::{Map, Value};

/// Decodes one tokenized row into an entity of type `E`.
///
/// Rows with fewer than `schema.min_arity` fields are rejected. Schema
/// columns past the end of the row are filled with `""`; fields past the last
/// schema column are ignored.
pub fn decode<E: Entity>(schema: &Schema, fields: &[String]) -> Result<E, RejectedRow> {
    debug_assert_eq!(schema.kind, E::KIND, "schema and entity kind disagree");

    if fields.len() < schema.min_arity {
        return Err(RejectedRow::TooFewFields {
            found: fields.len(),
            required: schema.min_arity,
        });
    }

    let object: Map<String, Value> = schema
        .fields
        .iter()
        .enumerate()
        .map(|(i, column)| {
            let value = fields.get(i).cloned().unwrap_or_default();
            (column.key.to_owned(), Value::String(value))
        })
        .collect();

    serde_json::from_value(Value::Object(object)).map_err(|e| RejectedRow::Shape(e.to_string()))
}
