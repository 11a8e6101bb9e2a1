//! Host type conversions.

use std::collections::HashMap;
use std::hash::BuildHasher;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use indexmap::IndexMap;
use rust_decimal::Decimal;

use super::record::{RecordTarget, StructuredRecord};
use super::{ScalarKind, Target};
use crate::decode::number::narrow;
use crate::error::{Error, Result};
use crate::types::HostValue;

/// A Rust type that values can be projected into.
pub trait FromStructured: Sized + 'static {
    /// Target describing this type.
    fn target() -> Target;

    /// Convert a non-null host value produced for `target()`.
    fn from_host(value: HostValue) -> Result<Self>;
}

fn mismatch<T>(value: &HostValue) -> Error {
    Error::type_mismatch(std::any::type_name::<T>(), value.kind())
}

fn optional<T: FromStructured>(value: HostValue) -> Result<Option<T>> {
    match value {
        HostValue::Null => Ok(None),
        value => T::from_host(value).map(Some),
    }
}

macro_rules! scalar_impl {
    ($ty:ty, $kind:ident, $variant:ident) => {
        impl FromStructured for $ty {
            fn target() -> Target {
                Target::Scalar(ScalarKind::$kind)
            }

            fn from_host(value: HostValue) -> Result<Self> {
                match value {
                    HostValue::$variant(v) => Ok(v),
                    other => Err(mismatch::<Self>(&other)),
                }
            }
        }
    };
}

macro_rules! integer_impl {
    ($ty:ty, $kind:ident) => {
        impl FromStructured for $ty {
            fn target() -> Target {
                Target::Scalar(ScalarKind::$kind)
            }

            fn from_host(value: HostValue) -> Result<Self> {
                match value {
                    HostValue::Integer(v) => narrow(v, stringify!($ty)),
                    other => Err(mismatch::<Self>(&other)),
                }
            }
        }
    };
}

scalar_impl!(String, Text, String);
scalar_impl!(bool, Boolean, Boolean);
scalar_impl!(i64, BigInt, Integer);
scalar_impl!(f64, Double, Float);
scalar_impl!(Decimal, Decimal, Decimal);
scalar_impl!(NaiveDate, Date, Date);
scalar_impl!(NaiveTime, Time, Time);
scalar_impl!(NaiveDateTime, TimestampNtz, TimestampNtz);
scalar_impl!(DateTime<FixedOffset>, Timestamp, Timestamp);
scalar_impl!(Vec<u8>, Binary, Binary);

integer_impl!(i8, TinyInt);
integer_impl!(i16, SmallInt);
integer_impl!(i32, Int);

impl FromStructured for f32 {
    fn target() -> Target {
        Target::Scalar(ScalarKind::Float)
    }

    fn from_host(value: HostValue) -> Result<Self> {
        match value {
            HostValue::Float(v) => Ok(v as f32),
            other => Err(mismatch::<Self>(&other)),
        }
    }
}

impl FromStructured for DateTime<Utc> {
    fn target() -> Target {
        Target::Scalar(ScalarKind::Timestamp)
    }

    fn from_host(value: HostValue) -> Result<Self> {
        match value {
            HostValue::Timestamp(ts) => Ok(ts.with_timezone(&Utc)),
            other => Err(mismatch::<Self>(&other)),
        }
    }
}

impl FromStructured for HostValue {
    fn target() -> Target {
        Target::Generic
    }

    fn from_host(value: HostValue) -> Result<Self> {
        Ok(value)
    }
}

impl<T: FromStructured> FromStructured for Vec<Option<T>> {
    fn target() -> Target {
        Target::Array(Box::new(T::target()))
    }

    fn from_host(value: HostValue) -> Result<Self> {
        match value {
            HostValue::Array(items) => items.into_iter().map(optional).collect(),
            other => Err(mismatch::<Self>(&other)),
        }
    }
}

impl<T: FromStructured> FromStructured for IndexMap<String, Option<T>> {
    fn target() -> Target {
        Target::Map(Box::new(T::target()))
    }

    fn from_host(value: HostValue) -> Result<Self> {
        match value {
            HostValue::Object(map) => map
                .into_iter()
                .map(|(key, v)| Ok((key, optional(v)?)))
                .collect(),
            other => Err(mismatch::<Self>(&other)),
        }
    }
}

impl<T, S> FromStructured for HashMap<String, Option<T>, S>
where
    T: FromStructured,
    S: BuildHasher + Default + 'static,
{
    fn target() -> Target {
        Target::Map(Box::new(T::target()))
    }

    fn from_host(value: HostValue) -> Result<Self> {
        match value {
            HostValue::Object(map) => map
                .into_iter()
                .map(|(key, v)| Ok((key, optional(v)?)))
                .collect(),
            other => Err(mismatch::<Self>(&other)),
        }
    }
}

impl<T: StructuredRecord> FromStructured for T {
    fn target() -> Target {
        Target::Record(RecordTarget::of::<T>())
    }

    fn from_host(value: HostValue) -> Result<Self> {
        match value {
            HostValue::Record(record) => record.downcast::<T>().map_err(|record| {
                Error::type_mismatch(std::any::type_name::<T>(), record.type_name())
            }),
            other => Err(mismatch::<Self>(&other)),
        }
    }
}
