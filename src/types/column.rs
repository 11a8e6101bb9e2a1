//! FieldSchema and ColumnInfo types for user-facing API.
//!
//! These types describe a column's declared type, including the nested
//! field, element and key/value schemas of structured columns. They are
//! built once per result and shared read-only by every row.

use crate::error::Result;

use super::metadata::{ColumnMetadata, FieldMetadata};
use super::sf_type::{SnowflakeType, SqlType};

/// Schema of a column or of a nested field (user-facing representation).
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSchema {
    /// Column or field name (empty for ARRAY elements).
    pub name: String,
    /// Whether NULL values are allowed.
    pub nullable: bool,
    /// Declared data type, including nested schemas.
    pub data_type: SnowflakeType,
}

impl FieldSchema {
    /// Create a nullable field.
    pub fn new(name: impl Into<String>, data_type: SnowflakeType) -> Self {
        Self {
            name: name.into(),
            nullable: true,
            data_type,
        }
    }

    /// Set nullability.
    pub fn with_nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    /// Create a field from a SQL type name such as `OBJECT(string VARCHAR)`.
    pub fn parse(name: impl Into<String>, type_name: &str) -> Result<Self> {
        Ok(Self::new(name, type_name.parse()?))
    }

    /// Create a column schema from rowtype metadata.
    ///
    /// Returns error if the type (or any nested type) is not supported.
    pub fn from_metadata(meta: &ColumnMetadata) -> Result<Self> {
        Ok(Self {
            name: meta.name.clone(),
            nullable: meta.nullable,
            data_type: SnowflakeType::from_metadata(&meta.type_metadata())?,
        })
    }

    /// Create a nested field schema from rowtype metadata.
    pub fn from_field_metadata(meta: &FieldMetadata) -> Result<Self> {
        Ok(Self {
            name: meta.field_name.clone(),
            nullable: meta.field_type.nullable,
            data_type: SnowflakeType::from_metadata(&meta.field_type)?,
        })
    }

    /// Get the SQL type name ("VARCHAR", "OBJECT", ...).
    pub fn type_name(&self) -> &'static str {
        self.data_type.type_name()
    }

    /// Check if this field carries a nested schema.
    pub fn is_structured(&self) -> bool {
        self.data_type.is_structured()
    }

    /// Declared OBJECT fields (empty for every other type).
    pub fn fields(&self) -> &[FieldSchema] {
        match &self.data_type {
            SnowflakeType::Object(fields) => fields,
            _ => &[],
        }
    }

    /// Declared ARRAY element schema.
    pub fn element(&self) -> Option<&FieldSchema> {
        match &self.data_type {
            SnowflakeType::Array(element) => element.as_deref(),
            _ => None,
        }
    }

    /// Declared MAP key and value schemas.
    pub fn key_value(&self) -> Option<(&FieldSchema, &FieldSchema)> {
        match &self.data_type {
            SnowflakeType::Map { key, value } => Some((key, value)),
            _ => None,
        }
    }

    /// Get the SQL type category.
    pub fn sql_type(&self, treat_decimal_as_int: bool) -> SqlType {
        self.data_type.sql_type(treat_decimal_as_int)
    }
}

/// Shared column information for all rows in a result set.
#[derive(Debug, Clone, Default)]
pub struct ColumnInfo {
    /// Column definitions.
    pub columns: Vec<FieldSchema>,
}

impl ColumnInfo {
    /// Create new column info from columns.
    pub fn new(columns: Vec<FieldSchema>) -> Self {
        Self { columns }
    }

    /// Create column info from rowtype metadata.
    ///
    /// Returns error if any column has an unsupported type.
    pub fn from_metadata(metadata: &[ColumnMetadata]) -> Result<Self> {
        let columns: Result<Vec<FieldSchema>> =
            metadata.iter().map(FieldSchema::from_metadata).collect();
        Ok(Self { columns: columns? })
    }

    /// Create column info from a rowtype JSON array.
    pub fn from_rowtype(rowtype: &str) -> Result<Self> {
        Self::from_metadata(&ColumnMetadata::parse_rowtype(rowtype)?)
    }

    /// Get column names.
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Get the number of columns.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Check if there are no columns.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Get column by index.
    pub fn get(&self, index: usize) -> Option<&FieldSchema> {
        self.columns.get(index)
    }

    /// Find column index by name (case-insensitive).
    pub fn find_by_name(&self, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| c.name.eq_ignore_ascii_case(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROWTYPE: &str = r#"[
        {"name": "ID", "type": "fixed", "precision": 10, "scale": 0, "nullable": false},
        {"name": "OBJ", "type": "object", "fields": [
            {"fieldName": "string", "fieldType": {"type": "text", "length": 100}}
        ]},
        {"name": "ARR", "type": "array", "fields": [
            {"fieldName": "", "fieldType": {"type": "fixed", "precision": 38, "scale": 0}}
        ]},
        {"name": "M", "type": "map", "fields": [
            {"fieldName": "key", "fieldType": {"type": "text", "nullable": false}},
            {"fieldName": "value", "fieldType": {"type": "timestamp_ltz", "scale": 9}}
        ]},
        {"name": "SEMI", "type": "object"}
    ]"#;

    #[test]
    fn test_column_info_from_rowtype() {
        let info = ColumnInfo::from_rowtype(ROWTYPE).unwrap();

        assert_eq!(info.len(), 5);
        assert_eq!(info.column_names(), vec!["ID", "OBJ", "ARR", "M", "SEMI"]);
        assert_eq!(info.find_by_name("obj"), Some(1));
        assert_eq!(info.find_by_name("UNKNOWN"), None);

        let id = info.get(0).unwrap();
        assert!(!id.nullable);
        assert_eq!(
            id.data_type,
            SnowflakeType::Fixed {
                precision: 10,
                scale: 0
            }
        );
    }

    #[test]
    fn test_structured_accessors() {
        let info = ColumnInfo::from_rowtype(ROWTYPE).unwrap();

        let obj = info.get(1).unwrap();
        assert_eq!(obj.type_name(), "OBJECT");
        assert_eq!(obj.fields().len(), 1);
        assert_eq!(obj.fields()[0].name, "string");
        assert_eq!(obj.fields()[0].type_name(), "VARCHAR");
        assert_eq!(obj.sql_type(true), SqlType::Struct);

        let arr = info.get(2).unwrap();
        assert_eq!(arr.element().unwrap().type_name(), "NUMBER");
        assert!(arr.fields().is_empty());

        let (key, value) = info.get(3).unwrap().key_value().unwrap();
        assert_eq!(key.type_name(), "VARCHAR");
        assert_eq!(value.data_type, SnowflakeType::TimestampLtz { scale: 9 });

        let semi = info.get(4).unwrap();
        assert!(!semi.is_structured());
        assert_eq!(semi.sql_type(true), SqlType::Varchar);
    }

    #[test]
    fn test_map_metadata_requires_two_fields() {
        let rowtype = r#"[{"name": "M", "type": "map", "fields": [
            {"fieldName": "key", "fieldType": {"type": "text"}}
        ]}]"#;
        assert!(ColumnInfo::from_rowtype(rowtype).is_err());
    }

    #[test]
    fn test_parse_matches_metadata() {
        let parsed = FieldSchema::parse("OBJ", "OBJECT(string VARCHAR(100))").unwrap();
        let info = ColumnInfo::from_rowtype(ROWTYPE).unwrap();
        assert_eq!(&parsed, info.get(1).unwrap());
    }
}
