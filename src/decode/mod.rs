//! Decoders turning raw column values into `StructuredValue` trees.
//!
//! Which decoder runs depends on the result format:
//!
//! | Result format | Structured column | Other column |
//! |---------------|-------------------|--------------|
//! | JSON | `json` | text as-is |
//! | Arrow, JSON structured types | `json` (from a string array) | `arrow` |
//! | Native Arrow | `arrow` | `arrow` |
//!
//! Scalar leaves stay textual; coercion to host types happens on projection.

pub mod arrow;
pub mod date;
pub mod format;
pub mod json;
pub mod number;

use ::arrow::array::{Array, ArrayRef, LargeStringArray, StringArray};
use ::arrow::datatypes::DataType;

use crate::error::{Error, Result};
use crate::session::ResultFormat;
use crate::types::{FieldSchema, StructuredValue};

pub use format::SfDateTimeFormat;

/// Raw value of one cell as delivered by the server.
#[derive(Debug, Clone)]
pub enum RawValue {
    /// SQL NULL.
    Null,
    /// JSON-format cell text.
    Text(String),
    /// Cell `row` of an Arrow column.
    Columnar { array: ArrayRef, row: usize },
}

impl RawValue {
    /// Check if the cell is NULL.
    pub fn is_null(&self) -> bool {
        match self {
            RawValue::Null => true,
            RawValue::Text(_) => false,
            RawValue::Columnar { array, row } => array.is_null(*row),
        }
    }
}

impl From<Option<String>> for RawValue {
    fn from(value: Option<String>) -> Self {
        value.map_or(RawValue::Null, RawValue::Text)
    }
}

impl From<&str> for RawValue {
    fn from(value: &str) -> Self {
        RawValue::Text(value.to_string())
    }
}

/// Decode one cell against its column schema.
///
/// # Errors
/// Returns `Error::Decode` when the payload does not match the schema or
/// cannot be parsed.
pub fn decode_column(
    raw: &RawValue,
    schema: &FieldSchema,
    format: ResultFormat,
) -> Result<StructuredValue> {
    tracing::trace!(
        column = %schema.name,
        data_type = schema.type_name(),
        ?format,
        "Decoding column value"
    );

    match raw {
        RawValue::Null => Ok(StructuredValue::Null),
        RawValue::Text(text) if schema.is_structured() => json::decode_text(text, schema),
        RawValue::Text(text) => Ok(StructuredValue::text(
            text.clone(),
            schema.data_type.clone(),
        )),
        RawValue::Columnar { array, row } if schema.is_structured() && !format.is_native() => {
            if array.is_null(*row) {
                return Ok(StructuredValue::Null);
            }
            json::decode_text(string_at(array.as_ref(), *row, schema)?, schema)
        }
        RawValue::Columnar { array, row } => arrow::decode_at(array.as_ref(), *row, schema),
    }
}

fn string_at<'a>(array: &'a dyn Array, row: usize, schema: &FieldSchema) -> Result<&'a str> {
    let text = match array.data_type() {
        DataType::Utf8 => array
            .as_any()
            .downcast_ref::<StringArray>()
            .filter(|a| row < a.len())
            .map(|a| a.value(row)),
        DataType::LargeUtf8 => array
            .as_any()
            .downcast_ref::<LargeStringArray>()
            .filter(|a| row < a.len())
            .map(|a| a.value(row)),
        _ => None,
    };
    text.ok_or_else(|| {
        Error::decode(format!(
            "Expected JSON text for {} '{}', got Arrow {:?}",
            schema.type_name(),
            schema.name,
            array.data_type()
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use ::arrow::array::Int64Array;

    use crate::types::SnowflakeType;

    #[test]
    fn test_null_for_every_format() {
        let schema = FieldSchema::parse("C", "OBJECT(string VARCHAR)").unwrap();
        for format in [
            ResultFormat::Json,
            ResultFormat::ArrowWithJsonStructuredTypes,
            ResultFormat::NativeArrow,
        ] {
            assert!(decode_column(&RawValue::Null, &schema, format)
                .unwrap()
                .is_null());
        }
    }

    #[test]
    fn test_json_text_structured() {
        let schema = FieldSchema::parse("C", "OBJECT(string VARCHAR)").unwrap();
        let raw = RawValue::from(r#"{"string": "a"}"#);
        let val = decode_column(&raw, &schema, ResultFormat::Json).unwrap();
        assert_eq!(val.get("string").and_then(|v| v.as_text()), Some("a"));
    }

    #[test]
    fn test_json_text_scalar_not_parsed() {
        let schema = FieldSchema::parse("C", "VARCHAR").unwrap();
        let raw = RawValue::from("{not json");
        let val = decode_column(&raw, &schema, ResultFormat::Json).unwrap();
        assert_eq!(
            val,
            StructuredValue::text("{not json", SnowflakeType::Text { length: None })
        );
    }

    #[test]
    fn test_arrow_with_json_structured_types() {
        let schema = FieldSchema::parse("C", "ARRAY(INTEGER)").unwrap();
        let array: ArrayRef = Arc::new(StringArray::from(vec![Some("[1,2,3]"), None]));

        let raw = RawValue::Columnar {
            array: Arc::clone(&array),
            row: 0,
        };
        let val = decode_column(&raw, &schema, ResultFormat::ArrowWithJsonStructuredTypes).unwrap();
        assert_eq!(val.len(), 3);
        assert_eq!(val.index(2).and_then(|v| v.as_text()), Some("3"));

        let raw = RawValue::Columnar { array, row: 1 };
        assert!(raw.is_null());
        assert!(decode_column(&raw, &schema, ResultFormat::ArrowWithJsonStructuredTypes)
            .unwrap()
            .is_null());
    }

    #[test]
    fn test_structured_column_requires_string_array() {
        let schema = FieldSchema::parse("C", "ARRAY(INTEGER)").unwrap();
        let raw = RawValue::Columnar {
            array: Arc::new(Int64Array::from(vec![1])),
            row: 0,
        };
        assert!(matches!(
            decode_column(&raw, &schema, ResultFormat::ArrowWithJsonStructuredTypes),
            Err(Error::Decode { .. })
        ));
    }
}
