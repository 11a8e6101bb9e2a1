//! Shared fixtures for the integration tests: record types and result
//! builders for each result format.

#![allow(dead_code)]

use std::sync::Arc;

use arrow::array::{
    ArrayRef, BinaryArray, BooleanArray, Date32Array, Decimal128Array, Float64Array, Int32Array,
    Int64Array, ListArray, MapArray, StringArray, StructArray,
};
use arrow::buffer::{NullBuffer, OffsetBuffer};
use arrow::datatypes::{DataType, Field, Fields, Schema};
use arrow::record_batch::RecordBatch;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use indexmap::IndexMap;
use rust_decimal::Decimal;
use serde_json::Value;

use snowflake_structured_rs::types::ColumnInfo;
use snowflake_structured_rs::{
    FieldSchema, FieldValue, ObjectFactories, QueryResult, Result, ResultContext, ResultFormat,
    Row, SessionSettings, SnowflakeType, StructuredRecord,
};

pub const ALL_TYPES: &str = "OBJECT(string VARCHAR, b TINYINT, s SMALLINT, i INTEGER, l BIGINT, \
    f FLOAT, d DOUBLE, bd DOUBLE, bool BOOLEAN, timestamp_ltz TIMESTAMP_LTZ, \
    timestamp_ntz TIMESTAMP_NTZ, timestamp_tz TIMESTAMP_TZ, date DATE, time TIME, binary BINARY, \
    simpleClass OBJECT(string VARCHAR, intValue INTEGER))";

/// AllTypes cell as the server renders it in JSON results under
/// `warsaw_settings`.
pub const ALL_TYPES_JSON: &str = r#"{"string": "a","b": 1,"s": 2,"i": 3,"l": 4,"f": 1.100000000000000e+00,"d": 2.200000000000000e+00,"bd": 3.300000000000000e+00,"bool": true,"timestamp_ltz": "Wed, 22 Dec 2021 09:43:44 +0100","timestamp_ntz": "Thu, 23 Dec 2021 09:44:44 Z","timestamp_tz": "Fri, 24 Dec 2021 09:45:45 +0800","date": "2023-12-24","time": "12:34:56","binary": "616263","simpleClass": {"string": "b","intValue": 2}}"#;

pub const NESTED: &str = "OBJECT(simpleClass OBJECT(string VARCHAR, intValue INTEGER), \
    simpleClasses ARRAY(OBJECT(string VARCHAR, intValue INTEGER)), \
    arrayOfSimpleClasses ARRAY(OBJECT(string VARCHAR, intValue INTEGER)), \
    mapOfSimpleClasses MAP(VARCHAR, OBJECT(string VARCHAR, intValue INTEGER)), \
    texts ARRAY(VARCHAR), arrayOfDates ARRAY(DATE), mapOfIntegers MAP(VARCHAR, INTEGER))";

#[derive(Debug, Default, Clone, PartialEq)]
pub struct StringClass {
    pub string: Option<String>,
}

impl StructuredRecord for StringClass {
    fn set_field(&mut self, name: &str, value: FieldValue<'_>) -> Result<()> {
        if name == "string" {
            self.string = value.read()?;
        }
        Ok(())
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct SimpleClass {
    pub string: Option<String>,
    pub int_value: Option<i32>,
}

impl StructuredRecord for SimpleClass {
    fn set_field(&mut self, name: &str, value: FieldValue<'_>) -> Result<()> {
        match name {
            "string" => self.string = value.read()?,
            "intValue" => self.int_value = value.read()?,
            _ => {}
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct AllTypesClass {
    pub string: Option<String>,
    pub b: Option<i8>,
    pub s: Option<i16>,
    pub i: Option<i32>,
    pub l: Option<i64>,
    pub f: Option<f32>,
    pub d: Option<f64>,
    pub bd: Option<Decimal>,
    pub bool: Option<bool>,
    pub timestamp_ltz: Option<DateTime<FixedOffset>>,
    pub timestamp_ntz: Option<NaiveDateTime>,
    pub timestamp_tz: Option<DateTime<FixedOffset>>,
    pub date: Option<NaiveDate>,
    pub time: Option<NaiveTime>,
    pub binary: Option<Vec<u8>>,
    pub simple_class: Option<SimpleClass>,
}

impl StructuredRecord for AllTypesClass {
    fn set_field(&mut self, name: &str, value: FieldValue<'_>) -> Result<()> {
        match name {
            "string" => self.string = value.read()?,
            "b" => self.b = value.read()?,
            "s" => self.s = value.read()?,
            "i" => self.i = value.read()?,
            "l" => self.l = value.read()?,
            "f" => self.f = value.read()?,
            "d" => self.d = value.read()?,
            "bd" => self.bd = value.read()?,
            "bool" => self.bool = value.read()?,
            "timestamp_ltz" => self.timestamp_ltz = value.read()?,
            "timestamp_ntz" => self.timestamp_ntz = value.read()?,
            "timestamp_tz" => self.timestamp_tz = value.read()?,
            "date" => self.date = value.read()?,
            "time" => self.time = value.read()?,
            "binary" => self.binary = value.read()?,
            "simpleClass" => self.simple_class = value.read()?,
            _ => {}
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct NullableFieldsClass {
    pub string: Option<String>,
    pub nullable_int_value: Option<i32>,
    pub nullable_long_value: Option<i64>,
    pub date: Option<NaiveDate>,
    pub bd: Option<Decimal>,
    pub bytes: Option<Vec<u8>>,
    pub long_value: i64,
}

impl StructuredRecord for NullableFieldsClass {
    fn set_field(&mut self, name: &str, value: FieldValue<'_>) -> Result<()> {
        match name {
            "string" => self.string = value.read()?,
            "nullableIntValue" => self.nullable_int_value = value.read()?,
            "nullableLongValue" => self.nullable_long_value = value.read()?,
            "date" => self.date = value.read()?,
            "bd" => self.bd = value.read()?,
            "bytes" => self.bytes = value.read()?,
            "longValue" => self.long_value = value.read_or_default()?,
            _ => {}
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct NestedStructClass {
    pub simple_class: Option<SimpleClass>,
    pub simple_classes: Option<Vec<Option<SimpleClass>>>,
    pub array_of_simple_classes: Option<Vec<Option<SimpleClass>>>,
    pub map_of_simple_classes: Option<IndexMap<String, Option<SimpleClass>>>,
    pub texts: Option<Vec<Option<String>>>,
    pub array_of_dates: Option<Vec<Option<NaiveDate>>>,
    pub map_of_integers: Option<IndexMap<String, Option<i32>>>,
}

impl StructuredRecord for NestedStructClass {
    fn set_field(&mut self, name: &str, value: FieldValue<'_>) -> Result<()> {
        match name {
            "simpleClass" => self.simple_class = value.read()?,
            "simpleClasses" => self.simple_classes = value.read()?,
            "arrayOfSimpleClasses" => self.array_of_simple_classes = value.read()?,
            "mapOfSimpleClasses" => self.map_of_simple_classes = value.read()?,
            "texts" => self.texts = value.read()?,
            "arrayOfDates" => self.array_of_dates = value.read()?,
            "mapOfIntegers" => self.map_of_integers = value.read()?,
            _ => {}
        }
        Ok(())
    }
}

/// Session used by the driver tests: Europe/Warsaw with RFC-like
/// timestamp output formats.
pub fn warsaw_settings() -> SessionSettings {
    SessionSettings::from_parameters([
        ("TIMEZONE", "Europe/Warsaw"),
        ("TIMESTAMP_TYPE_MAPPING", "TIMESTAMP_LTZ"),
        ("TIMESTAMP_OUTPUT_FORMAT", "DY, DD MON YYYY HH24:MI:SS TZHTZM"),
        ("TIMESTAMP_TZ_OUTPUT_FORMAT", "DY, DD MON YYYY HH24:MI:SS TZHTZM"),
        ("TIMESTAMP_LTZ_OUTPUT_FORMAT", "DY, DD MON YYYY HH24:MI:SS TZHTZM"),
        ("TIMESTAMP_NTZ_OUTPUT_FORMAT", "DY, DD MON YYYY HH24:MI:SS TZHTZM"),
    ])
    .unwrap()
}

/// Factories registered the way the driver tests register them.
pub fn factories() -> Arc<ObjectFactories> {
    let factories = ObjectFactories::new();
    factories.register(StringClass::default);
    factories.register(SimpleClass::default);
    factories.register(AllTypesClass::default);
    factories.register(NullableFieldsClass::default);
    Arc::new(factories)
}

fn context(
    columns: &[(&str, &str)],
    settings: SessionSettings,
    format: ResultFormat,
    factories: Arc<ObjectFactories>,
) -> Arc<ResultContext> {
    let columns = ColumnInfo::new(
        columns
            .iter()
            .map(|(name, type_name)| FieldSchema::parse(*name, type_name).unwrap())
            .collect(),
    );
    Arc::new(ResultContext::new(columns, settings, factories).with_format(format))
}

/// One-row JSON result.
pub fn json_row(
    columns: &[(&str, &str)],
    cells: &[Option<&str>],
    settings: SessionSettings,
    factories: Arc<ObjectFactories>,
) -> Row {
    let ctx = context(columns, settings, ResultFormat::Json, factories);
    let rowset = Value::Array(vec![Value::Array(
        cells
            .iter()
            .map(|cell| cell.map_or(Value::Null, |text| Value::String(text.to_string())))
            .collect(),
    )]);
    QueryResult::from_json_rowset(ctx, &rowset)
        .unwrap()
        .into_iter()
        .next()
        .unwrap()
}

/// One-row Arrow result. Cells are given as JSON literals; structured
/// columns become JSON strings unless the format is native, and a string
/// literal for a structured column is taken as the server's JSON text.
pub fn arrow_row(
    columns: &[(&str, &str)],
    cells: &[Value],
    settings: SessionSettings,
    format: ResultFormat,
    factories: Arc<ObjectFactories>,
) -> Row {
    let ctx = context(columns, settings, format, factories);
    let mut fields = Vec::new();
    let mut arrays = Vec::new();
    for (schema, cell) in ctx.columns.columns.iter().zip(cells) {
        let array = if schema.is_structured() && !format.is_native() {
            let text = match cell {
                Value::Null => None,
                Value::String(text) => Some(text.clone()),
                other => Some(other.to_string()),
            };
            Arc::new(StringArray::from(vec![text])) as ArrayRef
        } else {
            arrow_column(schema, &[cell.clone()])
        };
        fields.push(Field::new(schema.name.clone(), array.data_type().clone(), true));
        arrays.push(array);
    }
    let batch = RecordBatch::try_new(Arc::new(Schema::new(fields)), arrays).unwrap();
    QueryResult::from_record_batches(ctx, &[batch])
        .unwrap()
        .into_iter()
        .next()
        .unwrap()
}

fn validity(values: &[Value]) -> Option<NullBuffer> {
    if values.iter().any(Value::is_null) {
        Some(NullBuffer::from(
            values.iter().map(|v| !v.is_null()).collect::<Vec<_>>(),
        ))
    } else {
        None
    }
}

fn scale_factor(scale: u8) -> i64 {
    10i64.pow(u32::from(scale.min(9)))
}

/// Build an Arrow array in Snowflake's native layout from JSON literals.
///
/// Literal forms: numbers and booleans as JSON; DATE as `"YYYY-MM-DD"`;
/// TIME as `"HH:MM:SS"`; TIMESTAMP_NTZ/LTZ as epoch seconds;
/// TIMESTAMP_TZ as `[epoch seconds, offset minutes]`; BINARY as hex text.
pub fn arrow_column(schema: &FieldSchema, values: &[Value]) -> ArrayRef {
    match &schema.data_type {
        SnowflakeType::Fixed { scale: 0, .. } => {
            Arc::new(Int64Array::from(values.iter().map(Value::as_i64).collect::<Vec<_>>()))
        }
        SnowflakeType::Fixed { precision, scale } => {
            let unscaled = values
                .iter()
                .map(|v| {
                    (!v.is_null()).then(|| {
                        let mut d: Decimal = v.to_string().trim_matches('"').parse().unwrap();
                        d.rescale(u32::from(*scale));
                        d.mantissa()
                    })
                })
                .collect::<Vec<_>>();
            Arc::new(
                Decimal128Array::from(unscaled)
                    .with_precision_and_scale(*precision, *scale as i8)
                    .unwrap(),
            )
        }
        SnowflakeType::Real => {
            Arc::new(Float64Array::from(values.iter().map(Value::as_f64).collect::<Vec<_>>()))
        }
        SnowflakeType::Text { .. } | SnowflakeType::Variant => {
            Arc::new(StringArray::from(values.iter().map(Value::as_str).collect::<Vec<_>>()))
        }
        SnowflakeType::Boolean => {
            Arc::new(BooleanArray::from(values.iter().map(Value::as_bool).collect::<Vec<_>>()))
        }
        SnowflakeType::Date => {
            let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap();
            Arc::new(Date32Array::from(
                values
                    .iter()
                    .map(|v| {
                        v.as_str().map(|s| {
                            let date = NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap();
                            (date - epoch).num_days() as i32
                        })
                    })
                    .collect::<Vec<_>>(),
            ))
        }
        SnowflakeType::Time { scale } => Arc::new(Int64Array::from(
            values
                .iter()
                .map(|v| {
                    v.as_str().map(|s| {
                        let time = NaiveTime::parse_from_str(s, "%H:%M:%S").unwrap();
                        i64::from(time.num_seconds_from_midnight()) * scale_factor(*scale)
                    })
                })
                .collect::<Vec<_>>(),
        )),
        SnowflakeType::TimestampNtz { scale } | SnowflakeType::TimestampLtz { scale } => {
            Arc::new(Int64Array::from(
                values
                    .iter()
                    .map(|v| v.as_i64().map(|secs| secs * scale_factor(*scale)))
                    .collect::<Vec<_>>(),
            ))
        }
        SnowflakeType::TimestampTz { .. } => {
            let part = |i: usize| {
                values
                    .iter()
                    .map(|v| v.get(i).and_then(Value::as_i64))
                    .collect::<Vec<_>>()
            };
            let epoch = Int64Array::from(part(0));
            let fraction = Int32Array::from(
                values
                    .iter()
                    .map(|v| (!v.is_null()).then_some(0))
                    .collect::<Vec<_>>(),
            );
            let timezone = Int32Array::from(
                part(1)
                    .into_iter()
                    .map(|m| m.map(|m| m as i32 + 1440))
                    .collect::<Vec<_>>(),
            );
            let fields = Fields::from(vec![
                Field::new("epoch", DataType::Int64, true),
                Field::new("fraction", DataType::Int32, true),
                Field::new("timezone", DataType::Int32, true),
            ]);
            Arc::new(StructArray::new(
                fields,
                vec![Arc::new(epoch), Arc::new(fraction), Arc::new(timezone)],
                validity(values),
            ))
        }
        SnowflakeType::Binary { .. } => {
            let bytes = values
                .iter()
                .map(|v| v.as_str().map(|s| hex::decode(s).unwrap()))
                .collect::<Vec<_>>();
            Arc::new(BinaryArray::from(
                bytes.iter().map(|b| b.as_deref()).collect::<Vec<_>>(),
            ))
        }
        SnowflakeType::Object(fields) => {
            let children = fields
                .iter()
                .map(|field| {
                    let column = values
                        .iter()
                        .map(|v| v.get(&field.name).cloned().unwrap_or(Value::Null))
                        .collect::<Vec<_>>();
                    arrow_column(field, &column)
                })
                .collect::<Vec<_>>();
            let arrow_fields = fields
                .iter()
                .zip(&children)
                .map(|(field, child)| Field::new(field.name.clone(), child.data_type().clone(), true))
                .collect::<Vec<_>>();
            Arc::new(StructArray::new(
                Fields::from(arrow_fields),
                children,
                validity(values),
            ))
        }
        SnowflakeType::Array(Some(element)) => {
            let lengths = values
                .iter()
                .map(|v| v.as_array().map_or(0, Vec::len))
                .collect::<Vec<_>>();
            let flat = values
                .iter()
                .filter_map(Value::as_array)
                .flatten()
                .cloned()
                .collect::<Vec<_>>();
            let child = arrow_column(element, &flat);
            let field = Arc::new(Field::new("item", child.data_type().clone(), true));
            Arc::new(ListArray::new(
                field,
                OffsetBuffer::from_lengths(lengths),
                child,
                validity(values),
            ))
        }
        SnowflakeType::Map { key, value } => {
            let lengths = values
                .iter()
                .map(|v| v.as_object().map_or(0, |m| m.len()))
                .collect::<Vec<_>>();
            let entries = values
                .iter()
                .filter_map(Value::as_object)
                .flatten()
                .collect::<Vec<_>>();
            let keys = arrow_column(
                key,
                &entries
                    .iter()
                    .map(|(k, _)| Value::String(k.to_string()))
                    .collect::<Vec<_>>(),
            );
            let vals = arrow_column(
                value,
                &entries.iter().map(|(_, v)| (*v).clone()).collect::<Vec<_>>(),
            );
            let entry_fields = Fields::from(vec![
                Field::new("key", keys.data_type().clone(), false),
                Field::new("value", vals.data_type().clone(), true),
            ]);
            let entries = StructArray::new(entry_fields.clone(), vec![keys, vals], None);
            let field = Arc::new(Field::new("entries", DataType::Struct(entry_fields), false));
            Arc::new(
                MapArray::try_new(
                    field,
                    OffsetBuffer::from_lengths(lengths),
                    entries,
                    validity(values),
                    false,
                )
                .unwrap(),
            )
        }
        other => panic!("No Arrow fixture for {:?}", other),
    }
}
