//! Decoder for structured values delivered as JSON text.
//!
//! The JSON is parsed with key order preserved and number text kept
//! verbatim, then walked alongside the declared schema.

use serde_json::Value;

use crate::error::{Error, Result};
use crate::types::{FieldSchema, SnowflakeType, StructuredValue};

/// Parse JSON text and decode it against `schema`.
pub fn decode_text(text: &str, schema: &FieldSchema) -> Result<StructuredValue> {
    let value: Value = serde_json::from_str(text).map_err(|e| {
        Error::decode(format!(
            "Malformed JSON for {} '{}': {}",
            schema.type_name(),
            schema.name,
            e
        ))
    })?;
    decode_value(&value, schema)
}

/// Decode an already parsed JSON value against `schema`.
pub fn decode_value(value: &Value, schema: &FieldSchema) -> Result<StructuredValue> {
    if value.is_null() {
        return Ok(StructuredValue::Null);
    }

    match &schema.data_type {
        SnowflakeType::Object(fields) if !fields.is_empty() => {
            let object = value
                .as_object()
                .ok_or_else(|| shape_error(schema, "a JSON object", value))?;
            // One entry per declared field; extra keys are ignored.
            let entries = fields
                .iter()
                .map(|field| {
                    let child = match object.get(&field.name) {
                        Some(v) => decode_value(v, field)?,
                        None => StructuredValue::Null,
                    };
                    Ok((field.name.clone(), child))
                })
                .collect::<Result<Vec<_>>>()?;
            Ok(StructuredValue::Struct(entries))
        }
        SnowflakeType::Array(Some(element)) => {
            let items = value
                .as_array()
                .ok_or_else(|| shape_error(schema, "a JSON array", value))?;
            let elements = items
                .iter()
                .map(|item| decode_value(item, element))
                .collect::<Result<Vec<_>>>()?;
            Ok(StructuredValue::Array(elements))
        }
        SnowflakeType::Map { value: value_schema, .. } => {
            let object = value
                .as_object()
                .ok_or_else(|| shape_error(schema, "a JSON object", value))?;
            let entries = object
                .iter()
                .map(|(key, v)| Ok((key.clone(), decode_value(v, value_schema)?)))
                .collect::<Result<Vec<_>>>()?;
            Ok(StructuredValue::Map(entries))
        }
        data_type => decode_scalar(value, schema, data_type),
    }
}

fn decode_scalar(
    value: &Value,
    schema: &FieldSchema,
    data_type: &SnowflakeType,
) -> Result<StructuredValue> {
    let text = match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Object(_) | Value::Array(_) if is_semi_structured(data_type) => {
            serde_json::to_string(value).map_err(|e| {
                Error::decode(format!(
                    "Failed to render semi-structured value of {}: {}",
                    schema.name, e
                ))
            })?
        }
        _ => return Err(shape_error(schema, "a scalar", value)),
    };
    Ok(StructuredValue::text(text, data_type.clone()))
}

fn is_semi_structured(data_type: &SnowflakeType) -> bool {
    matches!(
        data_type,
        SnowflakeType::Variant | SnowflakeType::Object(_) | SnowflakeType::Array(None)
    )
}

fn shape_error(schema: &FieldSchema, expected: &str, value: &Value) -> Error {
    let actual = match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    };
    Error::decode(format!(
        "Expected {} for {} '{}', got {}",
        expected,
        schema.type_name(),
        schema.name,
        actual
    ))
}
