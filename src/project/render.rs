//! Text rendering of decoded values.
//!
//! Server-rendered scalars keep their text. Columnar scalars are formatted
//! with the session output formats so that a value renders the same way
//! whichever result format delivered it.

use std::fmt::{Display, Write};

use base64::Engine;
use chrono::TimeZone;

use super::Projector;
use crate::decode::date;
use crate::error::{Error, Result};
use crate::session::BinaryFormat;
use crate::types::{SnowflakeType, StructuredValue};

const INDENT: &str = "  ";

/// Layout of rendered containers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderStyle {
    /// Two-space indented JSON, one entry per line.
    Pretty,
    /// Single-line JSON.
    #[default]
    Compact,
}

pub(crate) fn render(
    projector: &Projector<'_>,
    node: &StructuredValue,
    style: RenderStyle,
) -> Result<String> {
    match node {
        StructuredValue::Null => Ok("null".to_string()),
        StructuredValue::Scalar {
            text,
            data_type,
            native,
        } => scalar_text(projector, text, data_type, *native),
        node => {
            let mut out = String::new();
            write_json(projector, node, style, 0, &mut out)?;
            Ok(out)
        }
    }
}

/// Unquoted text of a scalar.
pub(crate) fn scalar_text(
    projector: &Projector<'_>,
    text: &str,
    data_type: &SnowflakeType,
    native: bool,
) -> Result<String> {
    if !native {
        return Ok(text.to_string());
    }

    let settings = projector.settings();
    match data_type {
        SnowflakeType::Date => {
            let format = settings.date_format();
            let value = date::parse_date(text, &format)?;
            format_with(value.format(format.chrono_format()))
        }
        SnowflakeType::Time { .. } => {
            let format = settings.time_format();
            let value = date::parse_time(text, &format)?;
            format_with(value.format(format.chrono_format()))
        }
        SnowflakeType::TimestampNtz { .. } => {
            let format = settings.timestamp_format(data_type);
            format_with(date::parse_epoch(text)?.format(format.chrono_format()))
        }
        SnowflakeType::TimestampLtz { .. } => {
            let format = settings.timestamp_format(data_type);
            let value = settings
                .timezone
                .from_utc_datetime(&date::parse_epoch(text)?);
            format_with(value.format(format.chrono_format()))
        }
        SnowflakeType::TimestampTz { .. } => {
            let format = settings.timestamp_format(data_type);
            format_with(date::parse_epoch_with_offset(text)?.format(format.chrono_format()))
        }
        SnowflakeType::Binary { .. } if settings.binary_output_format == BinaryFormat::Base64 => {
            let bytes = hex::decode(text)
                .map_err(|e| Error::decode(format!("Invalid hex BINARY value: {}", e)))?;
            Ok(base64::engine::general_purpose::STANDARD.encode(bytes))
        }
        _ => Ok(text.to_string()),
    }
}

/// JSON text of a scalar: numbers and booleans bare, everything else quoted.
fn scalar_json(
    projector: &Projector<'_>,
    text: &str,
    data_type: &SnowflakeType,
    native: bool,
) -> Result<String> {
    match data_type {
        SnowflakeType::Fixed { .. } | SnowflakeType::Real | SnowflakeType::Boolean => {
            Ok(text.to_string())
        }
        SnowflakeType::Variant | SnowflakeType::Object(_) | SnowflakeType::Array(None)
            if serde_json::from_str::<serde_json::Value>(text).is_ok() =>
        {
            Ok(text.to_string())
        }
        _ => {
            let text = scalar_text(projector, text, data_type, native)?;
            Ok(serde_json::Value::String(text).to_string())
        }
    }
}

/// Format through `Display`, surfacing unusable format strings as errors.
fn format_with(value: impl Display) -> Result<String> {
    let mut out = String::new();
    write!(out, "{}", value)
        .map_err(|_| Error::decode("Session output format cannot render value"))?;
    Ok(out)
}

fn write_json(
    projector: &Projector<'_>,
    node: &StructuredValue,
    style: RenderStyle,
    depth: usize,
    out: &mut String,
) -> Result<()> {
    match node {
        StructuredValue::Null => out.push_str("null"),
        StructuredValue::Scalar {
            text,
            data_type,
            native,
        } => out.push_str(&scalar_json(projector, text, data_type, *native)?),
        StructuredValue::Struct(entries) | StructuredValue::Map(entries) => {
            if entries.is_empty() {
                out.push_str("{}");
                return Ok(());
            }
            out.push('{');
            for (i, (key, value)) in entries.iter().enumerate() {
                separator(out, style, depth + 1, i > 0);
                out.push_str(&serde_json::Value::String(key.clone()).to_string());
                out.push_str(": ");
                write_json(projector, value, style, depth + 1, out)?;
            }
            close(out, style, depth);
            out.push('}');
        }
        StructuredValue::Array(items) => {
            if items.is_empty() {
                out.push_str("[]");
                return Ok(());
            }
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                separator(out, style, depth + 1, i > 0);
                write_json(projector, item, style, depth + 1, out)?;
            }
            close(out, style, depth);
            out.push(']');
        }
    }
    Ok(())
}

fn separator(out: &mut String, style: RenderStyle, depth: usize, comma: bool) {
    if comma {
        out.push(',');
    }
    if style == RenderStyle::Pretty {
        out.push('\n');
        out.push_str(&INDENT.repeat(depth));
    }
}

fn close(out: &mut String, style: RenderStyle, depth: usize) {
    if style == RenderStyle::Pretty {
        out.push('\n');
        out.push_str(&INDENT.repeat(depth));
    }
}
