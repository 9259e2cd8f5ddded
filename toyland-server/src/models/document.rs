//! BSON <-> JSON conversion
//!
//! Outgoing documents render ObjectIds as hex strings and datetimes as
//! RFC 3339 strings with millisecond precision. Whole doubles render as
//! integers. Everything else falls back to relaxed extended JSON.
//!
//! Incoming JSON numbers follow the JavaScript driver's encoding: integers
//! that fit in 32 bits become `Int32`, every other number is a `Double`.

use bson::{Array, Bson, Document};
use chrono::SecondsFormat;
use serde::{Serialize, Serializer};
use serde_json::{Map, Number, Value};

/// Request body could not become a toy document.
#[derive(Debug, thiserror::Error)]
pub enum FieldsError {
    #[error("expected a JSON object, got {0}")]
    NotAnObject(&'static str),
}

/// Largest magnitude a double holds without losing integer precision.
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

pub fn bson_to_json(value: &Bson) -> Value {
    match value {
        Bson::ObjectId(id) => Value::String(id.to_hex()),
        Bson::DateTime(dt) => {
            Value::String(dt.to_chrono().to_rfc3339_opts(SecondsFormat::Millis, true))
        }
        Bson::Document(doc) => document_to_json(doc),
        Bson::Array(items) => Value::Array(items.iter().map(bson_to_json).collect()),
        Bson::String(s) => Value::String(s.clone()),
        Bson::Boolean(b) => Value::Bool(*b),
        Bson::Int32(n) => Value::from(*n),
        Bson::Int64(n) => Value::from(*n),
        Bson::Double(n) if n.fract() == 0.0 && n.abs() <= MAX_SAFE_INTEGER => {
            Value::from(*n as i64)
        }
        Bson::Double(n) => Number::from_f64(*n).map_or(Value::Null, Value::Number),
        Bson::Null | Bson::Undefined => Value::Null,
        other => other.clone().into_relaxed_extjson(),
    }
}

pub fn document_to_json(doc: &Document) -> Value {
    Value::Object(
        doc.iter()
            .map(|(key, value)| (key.clone(), bson_to_json(value)))
            .collect::<Map<String, Value>>(),
    )
}

/// Serde adapter so acknowledgment structs render BSON ids the same way
/// documents do.
pub fn serialize_bson<S: Serializer>(value: &Bson, serializer: S) -> Result<S::Ok, S::Error> {
    bson_to_json(value).serialize(serializer)
}

fn number_to_bson(n: &Number) -> Bson {
    if let Some(small) = n.as_i64().and_then(|i| i32::try_from(i).ok()) {
        return Bson::Int32(small);
    }
    match n.as_f64() {
        Some(f) if f.fract() == 0.0 && f >= f64::from(i32::MIN) && f <= f64::from(i32::MAX) => {
            Bson::Int32(f as i32)
        }
        Some(f) => Bson::Double(f),
        None => Bson::Null,
    }
}

pub fn json_to_bson(value: Value) -> Bson {
    match value {
        Value::Null => Bson::Null,
        Value::Bool(b) => Bson::Boolean(b),
        Value::Number(n) => number_to_bson(&n),
        Value::String(s) => Bson::String(s),
        Value::Array(items) => Bson::Array(items.into_iter().map(json_to_bson).collect::<Array>()),
        Value::Object(map) => Bson::Document(object_to_document(map)),
    }
}

fn object_to_document(map: Map<String, Value>) -> Document {
    map.into_iter()
        .map(|(key, value)| (key, json_to_bson(value)))
        .collect()
}

/// Turn a JSON request body into a document of fields.
pub fn fields_from_json(value: Value) -> Result<Document, FieldsError> {
    match value {
        Value::Object(map) => Ok(object_to_document(map)),
        Value::Array(_) => Err(FieldsError::NotAnObject("array")),
        Value::String(_) => Err(FieldsError::NotAnObject("string")),
        Value::Number(_) => Err(FieldsError::NotAnObject("number")),
        Value::Bool(_) => Err(FieldsError::NotAnObject("boolean")),
        Value::Null => Err(FieldsError::NotAnObject("null")),
    }
}
