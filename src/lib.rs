//! Structured type decoding for Snowflake query results
//!
//! Decodes OBJECT, ARRAY and MAP columns from any of the server's result
//! encodings (JSON text, Arrow with JSON-encoded structured columns, or
//! native nested Arrow) into one value tree, and projects that tree into
//! Rust types: scalars, lists, ordered maps, and user records.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use snowflake_structured_rs::types::ColumnInfo;
//! use snowflake_structured_rs::{
//!     FieldValue, ObjectFactories, QueryResult, Result, ResultContext, SessionSettings,
//!     StructuredRecord,
//! };
//!
//! #[derive(Debug, Default)]
//! struct SimpleClass {
//!     string: Option<String>,
//!     int_value: Option<i32>,
//! }
//!
//! impl StructuredRecord for SimpleClass {
//!     fn set_field(&mut self, name: &str, value: FieldValue<'_>) -> Result<()> {
//!         match name {
//!             "string" => self.string = value.read()?,
//!             "intValue" => self.int_value = value.read()?,
//!             _ => {}
//!         }
//!         Ok(())
//!     }
//! }
//!
//! fn main() -> Result<()> {
//!     let columns = ColumnInfo::from_rowtype(
//!         r#"[{"name": "C", "type": "object", "fields": [
//!             {"fieldName": "string", "fieldType": {"type": "text"}},
//!             {"fieldName": "intValue", "fieldType": {"type": "fixed", "scale": 0}}
//!         ]}]"#,
//!     )?;
//!     let context = ResultContext::new(columns, SessionSettings::new(), Arc::new(ObjectFactories::new()));
//!     let rowset = serde_json::json!([[r#"{"string": "a", "intValue": 2}"#]]);
//!     let result = QueryResult::from_json_rowset(Arc::new(context), &rowset)?;
//!
//!     let record: Option<SimpleClass> = result.rows()[0].get_as(0)?;
//!     let record = record.unwrap_or_default();
//!     assert_eq!(record.string.as_deref(), Some("a"));
//!     assert_eq!(record.int_value, Some(2));
//!     Ok(())
//! }
//! ```

pub mod decode;
pub mod error;
pub mod project;
pub mod registry;
pub mod result;
pub mod session;
pub mod types;

// Re-export main types
pub use decode::{decode_column, RawValue};
pub use error::{Error, Result};
pub use project::{
    FieldValue, FromStructured, Projector, RecordTarget, RenderStyle, ScalarKind,
    StructuredRecord, Target,
};
pub use registry::ObjectFactories;
pub use result::{QueryResult, ResultContext};
pub use session::{BinaryFormat, ResultFormat, SessionSettings};
pub use types::{FieldSchema, HostValue, Row, SnowflakeType, StructuredValue};
