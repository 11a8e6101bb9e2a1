//! Decoder for structured values delivered as native Arrow arrays.
//!
//! OBJECT columns arrive as `StructArray`, ARRAY as `ListArray`, MAP as
//! `MapArray`. Scalar leaves are read into canonical text (see
//! `decode::date` for the temporal forms) and marked as native, so the
//! projector can tell them apart from server-rendered JSON text.
//!
//! Snowflake encodes some scalars as scaled integers:
//!
//! | Declared type | Arrow type | Canonical text |
//! |---------------|------------|----------------|
//! | NUMBER(p,s) | Int8..Int64 / Decimal128 | decimal string with `s` digits |
//! | DATE | Date32 / Int32 | `YYYY-MM-DD` |
//! | TIME(s) | Int32 / Int64 / Time32 / Time64 | `HH:MM:SS[.f]` |
//! | TIMESTAMP_NTZ/LTZ(s) | Int64 / Timestamp / Struct{epoch, fraction} | epoch seconds |
//! | TIMESTAMP_TZ(s) | Struct{epoch, fraction?, timezone} | `epoch seconds` + ` ` + biased offset |

use arrow::array::{
    Array, BinaryArray, BooleanArray, Date32Array, Date64Array, Decimal128Array,
    FixedSizeBinaryArray, Float32Array, Float64Array, Int16Array, Int32Array, Int64Array,
    Int8Array, LargeBinaryArray, LargeListArray, LargeStringArray, ListArray, MapArray,
    StringArray, StructArray, Time32MillisecondArray, Time32SecondArray,
    Time64MicrosecondArray, Time64NanosecondArray, TimestampMicrosecondArray,
    TimestampMillisecondArray, TimestampNanosecondArray, TimestampSecondArray,
};
use arrow::datatypes::{DataType, TimeUnit};
use chrono::NaiveTime;

use super::date::{self, TIMEZONE_BIAS_MINUTES};
use super::number::format_scaled;
use crate::error::{Error, Result};
use crate::types::{FieldSchema, SnowflakeType, StructuredValue};

const TIME_FORMAT: &str = "%H:%M:%S%.f";
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Decode the value at `row` of `array` against `schema`.
pub fn decode_at(array: &dyn Array, row: usize, schema: &FieldSchema) -> Result<StructuredValue> {
    if row >= array.len() {
        return Err(Error::decode(format!(
            "Row {} out of bounds for {} '{}' (length {})",
            row,
            schema.type_name(),
            schema.name,
            array.len()
        )));
    }
    if array.is_null(row) || matches!(array.data_type(), DataType::Null) {
        return Ok(StructuredValue::Null);
    }

    match &schema.data_type {
        SnowflakeType::Object(fields) if !fields.is_empty() => {
            let structs = downcast::<StructArray>(array, schema)?;
            // Children are matched by position only when none match by name
            // and the shapes agree.
            let positional = structs.num_columns() == fields.len()
                && fields
                    .iter()
                    .all(|field| structs.column_by_name(&field.name).is_none());
            let entries = fields
                .iter()
                .enumerate()
                .map(|(i, field)| {
                    let child = if positional {
                        structs.columns().get(i)
                    } else {
                        structs.column_by_name(&field.name)
                    };
                    let value = match child {
                        Some(child) => decode_at(child.as_ref(), row, field)?,
                        None => StructuredValue::Null,
                    };
                    Ok((field.name.clone(), value))
                })
                .collect::<Result<Vec<_>>>()?;
            Ok(StructuredValue::Struct(entries))
        }
        SnowflakeType::Array(Some(element)) => {
            let values = match array.data_type() {
                DataType::LargeList(_) => downcast::<LargeListArray>(array, schema)?.value(row),
                _ => downcast::<ListArray>(array, schema)?.value(row),
            };
            let elements = (0..values.len())
                .map(|i| decode_at(values.as_ref(), i, element))
                .collect::<Result<Vec<_>>>()?;
            Ok(StructuredValue::Array(elements))
        }
        SnowflakeType::Map { key, value } => {
            let entries = downcast::<MapArray>(array, schema)?.value(row);
            if entries.num_columns() < 2 {
                return Err(Error::decode(format!(
                    "MAP '{}' entries need key and value columns, got {}",
                    schema.name,
                    entries.num_columns()
                )));
            }
            let (keys, values) = (entries.column(0), entries.column(1));
            let pairs = (0..entries.len())
                .map(|i| {
                    if keys.is_null(i) {
                        return Err(Error::decode(format!("NULL key in MAP '{}'", schema.name)));
                    }
                    let key_text = scalar_text(keys.as_ref(), i, key)?;
                    Ok((key_text, decode_at(values.as_ref(), i, value)?))
                })
                .collect::<Result<Vec<_>>>()?;
            Ok(StructuredValue::Map(pairs))
        }
        data_type => Ok(StructuredValue::native(
            scalar_text(array, row, schema)?,
            data_type.clone(),
        )),
    }
}

fn downcast<'a, T: Array + 'static>(array: &'a dyn Array, schema: &FieldSchema) -> Result<&'a T> {
    array.as_any().downcast_ref::<T>().ok_or_else(|| unsupported(array, schema))
}

fn unsupported(array: &dyn Array, schema: &FieldSchema) -> Error {
    Error::decode(format!(
        "Unsupported Arrow type {:?} for {} '{}'",
        array.data_type(),
        schema.type_name(),
        schema.name
    ))
}

/// Canonical text of a non-null scalar.
fn scalar_text(array: &dyn Array, row: usize, schema: &FieldSchema) -> Result<String> {
    let data_type = &schema.data_type;
    let text = match array.data_type() {
        DataType::Utf8 => downcast::<StringArray>(array, schema)?.value(row).to_string(),
        DataType::LargeUtf8 => downcast::<LargeStringArray>(array, schema)?
            .value(row)
            .to_string(),
        DataType::Boolean => downcast::<BooleanArray>(array, schema)?.value(row).to_string(),
        DataType::Int8 | DataType::Int16 | DataType::Int32 | DataType::Int64 => {
            integer_text(int_value(array, row, schema)?, data_type)?
        }
        DataType::Float32 => downcast::<Float32Array>(array, schema)?.value(row).to_string(),
        DataType::Float64 => downcast::<Float64Array>(array, schema)?.value(row).to_string(),
        DataType::Decimal128(_, scale) => {
            let unscaled = downcast::<Decimal128Array>(array, schema)?.value(row);
            if *scale >= 0 {
                format_scaled(unscaled, *scale as u8)
            } else {
                let shifted = 10i128
                    .checked_pow(scale.unsigned_abs() as u32)
                    .and_then(|factor| unscaled.checked_mul(factor))
                    .ok_or_else(|| Error::decode(format!("Decimal overflow in '{}'", schema.name)))?;
                format_scaled(shifted, 0)
            }
        }
        DataType::Date32 => date_text(downcast::<Date32Array>(array, schema)?.value_as_date(row))?,
        DataType::Date64 => date_text(downcast::<Date64Array>(array, schema)?.value_as_date(row))?,
        DataType::Time32(TimeUnit::Second) => {
            time_text(downcast::<Time32SecondArray>(array, schema)?.value_as_time(row))?
        }
        DataType::Time32(TimeUnit::Millisecond) => {
            time_text(downcast::<Time32MillisecondArray>(array, schema)?.value_as_time(row))?
        }
        DataType::Time64(TimeUnit::Microsecond) => {
            time_text(downcast::<Time64MicrosecondArray>(array, schema)?.value_as_time(row))?
        }
        DataType::Time64(TimeUnit::Nanosecond) => {
            time_text(downcast::<Time64NanosecondArray>(array, schema)?.value_as_time(row))?
        }
        DataType::Timestamp(unit, _) => {
            let (value, scale) = match unit {
                TimeUnit::Second => (downcast::<TimestampSecondArray>(array, schema)?.value(row), 0),
                TimeUnit::Millisecond => (
                    downcast::<TimestampMillisecondArray>(array, schema)?.value(row),
                    3,
                ),
                TimeUnit::Microsecond => (
                    downcast::<TimestampMicrosecondArray>(array, schema)?.value(row),
                    6,
                ),
                TimeUnit::Nanosecond => (
                    downcast::<TimestampNanosecondArray>(array, schema)?.value(row),
                    9,
                ),
            };
            epoch_text(i128::from(value) * 10i128.pow(9 - scale), None, data_type)
        }
        DataType::Binary => hex::encode(downcast::<BinaryArray>(array, schema)?.value(row)),
        DataType::LargeBinary => {
            hex::encode(downcast::<LargeBinaryArray>(array, schema)?.value(row))
        }
        DataType::FixedSizeBinary(_) => {
            hex::encode(downcast::<FixedSizeBinaryArray>(array, schema)?.value(row))
        }
        DataType::Struct(_) if data_type.is_timestamp() => {
            timestamp_struct_text(downcast::<StructArray>(array, schema)?, row, schema)?
        }
        _ => return Err(unsupported(array, schema)),
    };
    Ok(text)
}

fn int_value(array: &dyn Array, row: usize, schema: &FieldSchema) -> Result<i128> {
    let value = match array.data_type() {
        DataType::Int8 => i128::from(downcast::<Int8Array>(array, schema)?.value(row)),
        DataType::Int16 => i128::from(downcast::<Int16Array>(array, schema)?.value(row)),
        DataType::Int32 => i128::from(downcast::<Int32Array>(array, schema)?.value(row)),
        DataType::Int64 => i128::from(downcast::<Int64Array>(array, schema)?.value(row)),
        _ => return Err(unsupported(array, schema)),
    };
    Ok(value)
}

/// Text of a scaled integer per the declared type.
fn integer_text(unscaled: i128, data_type: &SnowflakeType) -> Result<String> {
    let text = match data_type {
        SnowflakeType::Fixed { scale, .. } => format_scaled(unscaled, *scale),
        SnowflakeType::Date => {
            let days = i64::try_from(unscaled)
                .map_err(|_| Error::decode(format!("Date out of range: {} days", unscaled)))?;
            date::date_from_epoch_days(days)?.format(DATE_FORMAT).to_string()
        }
        SnowflakeType::Time { scale } => {
            let time = date::time_from_seconds(&format_scaled(unscaled, *scale))?;
            time.format(TIME_FORMAT).to_string()
        }
        SnowflakeType::TimestampNtz { scale }
        | SnowflakeType::TimestampLtz { scale }
        | SnowflakeType::TimestampTz { scale } => {
            epoch_text(unscaled * 10i128.pow(9 - u32::from((*scale).min(9))), None, data_type)
        }
        SnowflakeType::Boolean => (unscaled != 0).to_string(),
        _ => unscaled.to_string(),
    };
    Ok(text)
}

/// Epoch seconds with nanosecond precision; TIMESTAMP_TZ gets its biased
/// offset appended (UTC when the array carries none).
fn epoch_text(nanos: i128, timezone: Option<i32>, data_type: &SnowflakeType) -> String {
    let seconds = format_scaled(nanos, 9);
    match data_type {
        SnowflakeType::TimestampTz { .. } => format!(
            "{} {}",
            seconds,
            timezone.unwrap_or(TIMEZONE_BIAS_MINUTES)
        ),
        _ => seconds,
    }
}

/// Snowflake's struct encoding of wide timestamps: `epoch` (seconds when a
/// `fraction` of nanoseconds is present, otherwise scaled), optional
/// `fraction`, and for TIMESTAMP_TZ a biased `timezone`.
fn timestamp_struct_text(array: &StructArray, row: usize, schema: &FieldSchema) -> Result<String> {
    let data_type = &schema.data_type;
    let is_tz = matches!(data_type, SnowflakeType::TimestampTz { .. });
    let columns = array.columns();

    let epoch = array
        .column_by_name("epoch")
        .or_else(|| columns.first())
        .ok_or_else(|| unsupported(array, schema))?;
    let fraction = array.column_by_name("fraction").or_else(|| match columns.len() {
        3 => columns.get(1),
        2 if !is_tz => columns.get(1),
        _ => None,
    });
    let timezone = array.column_by_name("timezone").or_else(|| match columns.len() {
        3 => columns.get(2),
        2 if is_tz => columns.get(1),
        _ => None,
    });

    let epoch = int_value(epoch.as_ref(), row, schema)?;
    let nanos = match fraction {
        Some(fraction) => epoch * 1_000_000_000 + int_value(fraction.as_ref(), row, schema)?,
        None => epoch * 10i128.pow(9 - u32::from(data_type.scale().min(9))),
    };
    let timezone = match timezone {
        Some(tz) => Some(
            i32::try_from(int_value(tz.as_ref(), row, schema)?)
                .map_err(|_| Error::decode(format!("Invalid timezone in '{}'", schema.name)))?,
        ),
        None => None,
    };
    Ok(epoch_text(nanos, timezone, data_type))
}

fn date_text(date: Option<chrono::NaiveDate>) -> Result<String> {
    date.map(|d| d.format(DATE_FORMAT).to_string())
        .ok_or_else(|| Error::decode("Date out of range"))
}

fn time_text(time: Option<NaiveTime>) -> Result<String> {
    time.map(|t| t.format(TIME_FORMAT).to_string())
        .ok_or_else(|| Error::decode("Time out of range"))
}
