//! Snowflake data types for structured query results.

mod column;
mod host;
mod metadata;
mod row;
mod sf_type;
mod value;

pub use column::{ColumnInfo, FieldSchema};
pub use host::{HostValue, RecordValue};
pub use metadata::{ColumnMetadata, FieldMetadata, TypeMetadata};
pub use row::Row;
pub use sf_type::{SnowflakeType, SqlType, DEFAULT_TIME_SCALE};
pub use value::StructuredValue;
