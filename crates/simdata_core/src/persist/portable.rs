//! Portable JSON form of structured values.
//!
//! Every value written as JSON goes through [`to_json`]; values without a
//! portable representation are rejected here rather than written lossily.

use crate::error::PersistError;
use crate::model::Value;

/// Convert a value to JSON, failing on opaque objects and non-finite floats.
pub fn to_json(value: &Value) -> Result<serde_json::Value, PersistError> {
    Ok(match value {
        Value::Null => serde_json::Value::Null,
        Value::Bool(b) => serde_json::Value::Bool(*b),
        Value::Int(i) => serde_json::Value::from(*i),
        Value::Float(x) => serde_json::Number::from_f64(*x)
            .map(serde_json::Value::Number)
            .ok_or_else(|| {
                PersistError::Unserializable(format!("float {x} is not JSON serializable"))
            })?,
        Value::Str(s) => serde_json::Value::String(s.clone()),
        Value::List(items) => serde_json::Value::Array(
            items.iter().map(to_json).collect::<Result<_, _>>()?,
        ),
        Value::Map(map) => serde_json::Value::Object(
            map.iter()
                .map(|(k, v)| Ok((k.clone(), to_json(v)?)))
                .collect::<Result<_, PersistError>>()?,
        ),
        Value::Opaque(type_name) => {
            return Err(PersistError::Unserializable(format!(
                "object of type {type_name} is not JSON serializable"
            )));
        }
    })
}
