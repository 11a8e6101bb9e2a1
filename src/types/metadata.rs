//! Column metadata as delivered in the server's rowtype JSON.
//!
//! These structs preserve the wire representation.
//! For user-facing API, use `FieldSchema` which provides a typed descriptor.

use serde::Deserialize;

/// Type information shared by columns and nested fields.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeMetadata {
    /// Lowercase wire type name ("fixed", "text", "object", ...).
    #[serde(rename = "type")]
    pub type_name: String,
    /// Whether NULL values are allowed.
    #[serde(default = "default_nullable")]
    pub nullable: bool,
    /// Numeric precision.
    #[serde(default)]
    pub precision: Option<u8>,
    /// Numeric or fractional-second scale.
    #[serde(default)]
    pub scale: Option<u8>,
    /// Maximum length in characters (text) or bytes (binary).
    #[serde(default)]
    pub length: Option<u64>,
    /// Nested fields: OBJECT fields, ARRAY element, or MAP key and value.
    #[serde(default)]
    pub fields: Option<Vec<FieldMetadata>>,
}

/// A nested field of a structured type.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldMetadata {
    /// Field name (empty for ARRAY elements).
    #[serde(default)]
    pub field_name: String,
    /// Field type.
    pub field_type: TypeMetadata,
}

/// Top-level column metadata.
///
/// Mirrors `TypeMetadata` field by field plus the column name; the type
/// part is kept inline because rowtype entries are flat objects.
#[derive(Debug, Clone, Deserialize)]
pub struct ColumnMetadata {
    /// Column name.
    pub name: String,
    /// Lowercase wire type name.
    #[serde(rename = "type")]
    pub type_name: String,
    /// Whether NULL values are allowed.
    #[serde(default = "default_nullable")]
    pub nullable: bool,
    /// Numeric precision.
    #[serde(default)]
    pub precision: Option<u8>,
    /// Numeric or fractional-second scale.
    #[serde(default)]
    pub scale: Option<u8>,
    /// Maximum length in characters (text) or bytes (binary).
    #[serde(default)]
    pub length: Option<u64>,
    /// Nested fields for structured columns.
    #[serde(default)]
    pub fields: Option<Vec<FieldMetadata>>,
}

fn default_nullable() -> bool {
    true
}

impl ColumnMetadata {
    /// Parse a rowtype JSON array into column metadata.
    pub fn parse_rowtype(rowtype: &str) -> crate::error::Result<Vec<ColumnMetadata>> {
        Ok(serde_json::from_str(rowtype)?)
    }

    /// Type part of the column metadata.
    pub fn type_metadata(&self) -> TypeMetadata {
        TypeMetadata {
            type_name: self.type_name.clone(),
            nullable: self.nullable,
            precision: self.precision,
            scale: self.scale,
            length: self.length,
            fields: self.fields.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_structured_rowtype() {
        let rowtype = r#"[{
            "name": "OBJ",
            "type": "object",
            "nullable": true,
            "fields": [
                {"fieldName": "string", "fieldType": {"type": "text", "length": 16777216, "nullable": true}},
                {"fieldName": "intValue", "fieldType": {"type": "fixed", "precision": 38, "scale": 0, "nullable": false}}
            ]
        }]"#;
        let columns = ColumnMetadata::parse_rowtype(rowtype).unwrap();
        assert_eq!(columns.len(), 1);
        assert_eq!(columns[0].name, "OBJ");
        assert_eq!(columns[0].type_name, "object");

        let fields = columns[0].fields.as_ref().unwrap();
        assert_eq!(fields[0].field_name, "string");
        assert_eq!(fields[0].field_type.length, Some(16777216));
        assert_eq!(fields[1].field_type.precision, Some(38));
        assert!(!fields[1].field_type.nullable);
    }

    #[test]
    fn test_defaults() {
        let columns = ColumnMetadata::parse_rowtype(r#"[{"name": "B", "type": "boolean"}]"#).unwrap();
        assert!(columns[0].nullable);
        assert!(columns[0].fields.is_none());
    }

    #[test]
    fn test_malformed_rowtype() {
        assert!(ColumnMetadata::parse_rowtype(r#"[{"type": "text"}]"#).is_err());
    }
}
