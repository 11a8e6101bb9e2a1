//! Decoded structured value tree.

use std::fmt;

use super::sf_type::SnowflakeType;

/// Format-independent decoded column value.
///
/// `Null` may stand in for any other variant at any depth. Struct entries
/// follow the declared field order; map entries follow the order the server
/// delivered them in.
#[derive(Debug, Clone, PartialEq)]
pub enum StructuredValue {
    /// NULL value.
    Null,
    /// Scalar leaf, still in textual form. Coercion happens on projection.
    Scalar {
        /// Raw text of the value.
        text: String,
        /// Declared scalar type.
        data_type: SnowflakeType,
        /// True when `text` is the canonical form produced from columnar
        /// values, false when it was copied from server-rendered JSON.
        native: bool,
    },
    /// OBJECT value: one entry per declared field.
    Struct(Vec<(String, StructuredValue)>),
    /// ARRAY value.
    Array(Vec<StructuredValue>),
    /// MAP value with text keys.
    Map(Vec<(String, StructuredValue)>),
}

impl StructuredValue {
    /// Create a scalar copied from server-rendered text.
    pub fn text(text: impl Into<String>, data_type: SnowflakeType) -> Self {
        StructuredValue::Scalar {
            text: text.into(),
            data_type,
            native: false,
        }
    }

    /// Create a scalar in canonical columnar form.
    pub fn native(text: impl Into<String>, data_type: SnowflakeType) -> Self {
        StructuredValue::Scalar {
            text: text.into(),
            data_type,
            native: true,
        }
    }

    /// Check if the value is NULL.
    pub fn is_null(&self) -> bool {
        matches!(self, StructuredValue::Null)
    }

    /// Shape name used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            StructuredValue::Null => "NULL",
            StructuredValue::Scalar { data_type, .. } => data_type.type_name(),
            StructuredValue::Struct(_) => "OBJECT",
            StructuredValue::Array(_) => "ARRAY",
            StructuredValue::Map(_) => "MAP",
        }
    }

    /// Try to get the raw scalar text.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            StructuredValue::Scalar { text, .. } => Some(text),
            _ => None,
        }
    }

    /// Look up a struct field or map entry by name.
    pub fn get(&self, name: &str) -> Option<&StructuredValue> {
        match self {
            StructuredValue::Struct(entries) | StructuredValue::Map(entries) => entries
                .iter()
                .find(|(key, _)| key == name)
                .map(|(_, value)| value),
            _ => None,
        }
    }

    /// Get an array element by index.
    pub fn index(&self, index: usize) -> Option<&StructuredValue> {
        match self {
            StructuredValue::Array(items) => items.get(index),
            _ => None,
        }
    }

    /// Number of struct fields, array elements or map entries (0 for scalars).
    pub fn len(&self) -> usize {
        match self {
            StructuredValue::Struct(entries) | StructuredValue::Map(entries) => entries.len(),
            StructuredValue::Array(items) => items.len(),
            _ => 0,
        }
    }

    /// Check if the value has no children.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Display for StructuredValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StructuredValue::Null => write!(f, "NULL"),
            StructuredValue::Scalar { text, .. } => write!(f, "{}", text),
            StructuredValue::Struct(entries) => write!(f, "<OBJECT: {} fields>", entries.len()),
            StructuredValue::Array(items) => write!(f, "<ARRAY: {} elements>", items.len()),
            StructuredValue::Map(entries) => write!(f, "<MAP: {} entries>", entries.len()),
        }
    }
}
