//! Projected host values.
//!
//! `HostValue` is what the projector hands back before conversion into a
//! concrete Rust type, and what untyped accessors return directly.

use std::any::Any;
use std::fmt;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use indexmap::IndexMap;
use rust_decimal::Decimal;

/// Projected value of a column or nested element.
#[derive(Debug, PartialEq)]
pub enum HostValue {
    /// NULL value.
    Null,
    /// Text value.
    String(String),
    /// Integral value.
    Integer(i64),
    /// Floating point value.
    Float(f64),
    /// Exact decimal value.
    Decimal(Decimal),
    /// Boolean value.
    Boolean(bool),
    /// Calendar date.
    Date(NaiveDate),
    /// Time of day.
    Time(NaiveTime),
    /// Wall-clock timestamp without zone.
    TimestampNtz(NaiveDateTime),
    /// Instant with the offset it is rendered in.
    Timestamp(DateTime<FixedOffset>),
    /// Binary value.
    Binary(Vec<u8>),
    /// Generic list.
    Array(Vec<HostValue>),
    /// Generic ordered map.
    Object(IndexMap<String, HostValue>),
    /// Record built by a structured record target.
    Record(RecordValue),
}

impl HostValue {
    /// Check if the value is NULL.
    pub fn is_null(&self) -> bool {
        matches!(self, HostValue::Null)
    }

    /// Variant name used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            HostValue::Null => "NULL",
            HostValue::String(_) => "string",
            HostValue::Integer(_) => "integer",
            HostValue::Float(_) => "float",
            HostValue::Decimal(_) => "decimal",
            HostValue::Boolean(_) => "boolean",
            HostValue::Date(_) => "date",
            HostValue::Time(_) => "time",
            HostValue::TimestampNtz(_) => "timestamp_ntz",
            HostValue::Timestamp(_) => "timestamp",
            HostValue::Binary(_) => "binary",
            HostValue::Array(_) => "array",
            HostValue::Object(_) => "object",
            HostValue::Record(record) => record.type_name(),
        }
    }

    /// Try to get the value as a string reference.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            HostValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Try to get the value as i64.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            HostValue::Integer(v) => Some(*v),
            _ => None,
        }
    }

    /// Look up an entry of a generic map.
    pub fn get(&self, key: &str) -> Option<&HostValue> {
        match self {
            HostValue::Object(map) => map.get(key),
            _ => None,
        }
    }

    /// Get an element of a generic list.
    pub fn index(&self, index: usize) -> Option<&HostValue> {
        match self {
            HostValue::Array(items) => items.get(index),
            _ => None,
        }
    }
}

impl fmt::Display for HostValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostValue::Null => write!(f, "NULL"),
            HostValue::String(s) => write!(f, "{}", s),
            HostValue::Integer(v) => write!(f, "{}", v),
            HostValue::Float(v) => write!(f, "{}", v),
            HostValue::Decimal(v) => write!(f, "{}", v),
            HostValue::Boolean(v) => write!(f, "{}", v),
            HostValue::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            HostValue::Time(t) => write!(f, "{}", t.format("%H:%M:%S%.f")),
            HostValue::TimestampNtz(ts) => write!(f, "{}", ts.format("%Y-%m-%d %H:%M:%S%.f")),
            HostValue::Timestamp(ts) => write!(f, "{}", ts.format("%Y-%m-%d %H:%M:%S%.f %:z")),
            HostValue::Binary(bytes) => write!(f, "{}", hex::encode(bytes)),
            HostValue::Array(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            HostValue::Object(map) => {
                write!(f, "{{")?;
                for (i, (key, value)) in map.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}={}", key, value)?;
                }
                write!(f, "}}")
            }
            HostValue::Record(record) => write!(f, "<{}>", record.type_name()),
        }
    }
}

/// Type-erased record instance.
pub struct RecordValue {
    type_name: &'static str,
    value: Box<dyn Any + Send>,
}

impl RecordValue {
    /// Wrap a record instance.
    pub fn new<T: Any + Send>(value: T) -> Self {
        Self {
            type_name: std::any::type_name::<T>(),
            value: Box::new(value),
        }
    }

    /// Name of the wrapped type.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Recover the concrete record, or give the wrapper back on mismatch.
    pub fn downcast<T: Any>(self) -> std::result::Result<T, Self> {
        let type_name = self.type_name;
        self.value
            .downcast::<T>()
            .map(|boxed| *boxed)
            .map_err(|value| Self { type_name, value })
    }
}

impl fmt::Debug for RecordValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordValue")
            .field("type_name", &self.type_name)
            .finish_non_exhaustive()
    }
}

/// Records have no value equality; two record values never compare equal.
impl PartialEq for RecordValue {
    fn eq(&self, _other: &Self) -> bool {
        false
    }
}
