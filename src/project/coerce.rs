//! Scalar coercion from decoded text to host values.
//!
//! Each scalar leaf carries its declared type and whether its text is the
//! canonical columnar form or server-rendered JSON text. Both forms of the
//! same value coerce to the same host value; only the parsing differs.

use base64::Engine;
use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone};

use super::{render, Projector, ScalarKind};
use crate::decode::date::{self, ParsedTimestamp};
use crate::decode::number::{narrow, parse_decimal, parse_double, parse_integer};
use crate::error::{Error, Result};
use crate::session::BinaryFormat;
use crate::types::{HostValue, SnowflakeType};

/// Coerce one scalar into the requested host kind.
pub(crate) fn coerce(
    projector: &Projector<'_>,
    text: &str,
    data_type: &SnowflakeType,
    native: bool,
    kind: ScalarKind,
) -> Result<HostValue> {
    let mismatch = || Error::type_mismatch(kind.name(), data_type.type_name());

    match kind {
        ScalarKind::Text => Ok(HostValue::String(render::scalar_text(
            projector, text, data_type, native,
        )?)),
        ScalarKind::TinyInt => integer(projector, text, data_type)
            .ok_or_else(mismatch)?
            .and_then(|v| narrow::<i8>(v, kind.name()))
            .map(|v| HostValue::Integer(i64::from(v))),
        ScalarKind::SmallInt => integer(projector, text, data_type)
            .ok_or_else(mismatch)?
            .and_then(|v| narrow::<i16>(v, kind.name()))
            .map(|v| HostValue::Integer(i64::from(v))),
        ScalarKind::Int => integer(projector, text, data_type)
            .ok_or_else(mismatch)?
            .and_then(|v| narrow::<i32>(v, kind.name()))
            .map(|v| HostValue::Integer(i64::from(v))),
        ScalarKind::BigInt => integer(projector, text, data_type)
            .ok_or_else(mismatch)?
            .map(HostValue::Integer),
        ScalarKind::Float | ScalarKind::Double => match data_type {
            SnowflakeType::Fixed { .. }
            | SnowflakeType::Real
            | SnowflakeType::Text { .. }
            | SnowflakeType::Variant => parse_double(text).map(HostValue::Float),
            _ => Err(mismatch()),
        },
        ScalarKind::Decimal => match data_type {
            SnowflakeType::Fixed { .. }
            | SnowflakeType::Real
            | SnowflakeType::Text { .. }
            | SnowflakeType::Variant => parse_decimal(text).map(HostValue::Decimal),
            _ => Err(mismatch()),
        },
        ScalarKind::Boolean => match data_type {
            SnowflakeType::Boolean
            | SnowflakeType::Fixed { .. }
            | SnowflakeType::Real
            | SnowflakeType::Text { .. }
            | SnowflakeType::Variant => boolean(text).map(HostValue::Boolean),
            _ => Err(mismatch()),
        },
        ScalarKind::Date => match data_type {
            SnowflakeType::Date | SnowflakeType::Text { .. } | SnowflakeType::Variant => {
                date::parse_date(text, &projector.settings().date_format()).map(HostValue::Date)
            }
            _ => Err(mismatch()),
        },
        ScalarKind::Time => match data_type {
            SnowflakeType::Time { .. } | SnowflakeType::Text { .. } | SnowflakeType::Variant => {
                date::parse_time(text, &projector.settings().time_format()).map(HostValue::Time)
            }
            _ => Err(mismatch()),
        },
        ScalarKind::TimestampNtz => wall_clock(projector, text, data_type, native)
            .ok_or_else(mismatch)?
            .map(HostValue::TimestampNtz),
        ScalarKind::Timestamp => instant(projector, text, data_type, native)
            .ok_or_else(mismatch)?
            .map(HostValue::Timestamp),
        ScalarKind::Binary => match data_type {
            SnowflakeType::Binary { .. } => binary(projector, text, native).map(HostValue::Binary),
            _ => Err(mismatch()),
        },
    }
}

/// Default host form of a scalar.
///
/// NUMBER(p,0) becomes an integer when the session treats decimals as
/// integers and the value fits, otherwise a decimal. TIMESTAMP_LTZ and
/// TIMESTAMP_TZ become instants, TIMESTAMP_NTZ stays a wall clock.
pub(crate) fn generic(
    projector: &Projector<'_>,
    text: String,
    data_type: &SnowflakeType,
    native: bool,
) -> Result<HostValue> {
    let kind = match data_type {
        SnowflakeType::Fixed { scale: 0, .. } if projector.settings().treat_decimal_as_int => {
            return Ok(match parse_integer(&text) {
                Ok(v) => HostValue::Integer(v),
                Err(_) => HostValue::Decimal(parse_decimal(&text)?),
            });
        }
        SnowflakeType::Fixed { .. } => ScalarKind::Decimal,
        SnowflakeType::Real => ScalarKind::Double,
        SnowflakeType::Boolean => ScalarKind::Boolean,
        SnowflakeType::Date => ScalarKind::Date,
        SnowflakeType::Time { .. } => ScalarKind::Time,
        SnowflakeType::TimestampNtz { .. } => ScalarKind::TimestampNtz,
        SnowflakeType::TimestampLtz { .. } | SnowflakeType::TimestampTz { .. } => {
            ScalarKind::Timestamp
        }
        SnowflakeType::Binary { .. } => ScalarKind::Binary,
        SnowflakeType::Text { .. }
        | SnowflakeType::Variant
        | SnowflakeType::Object(_)
        | SnowflakeType::Array(_)
        | SnowflakeType::Map { .. } => return Ok(HostValue::String(text)),
    };
    coerce(projector, &text, data_type, native, kind)
}

/// Integral value of NUMBER(p,0) or text; `None` when the declared type
/// cannot produce an integer. NUMBER columns qualify only while the session
/// treats decimals as integers.
fn integer(projector: &Projector<'_>, text: &str, data_type: &SnowflakeType) -> Option<Result<i64>> {
    match data_type {
        SnowflakeType::Fixed { scale: 0, .. } if projector.settings().treat_decimal_as_int => {
            Some(parse_integer(text))
        }
        SnowflakeType::Text { .. } | SnowflakeType::Variant => Some(parse_integer(text)),
        _ => None,
    }
}

fn boolean(text: &str) -> Result<bool> {
    let text = text.trim();
    if text.eq_ignore_ascii_case("true") {
        return Ok(true);
    }
    if text.eq_ignore_ascii_case("false") {
        return Ok(false);
    }
    parse_double(text)
        .map(|v| v != 0.0)
        .map_err(|_| Error::decode(format!("Invalid BOOLEAN value: '{}'", text)))
}

fn binary(projector: &Projector<'_>, text: &str, native: bool) -> Result<Vec<u8>> {
    let text = text.trim();
    if !native && projector.settings().binary_output_format == BinaryFormat::Base64 {
        return base64::engine::general_purpose::STANDARD
            .decode(text)
            .map_err(|e| Error::decode(format!("Invalid base64 BINARY value: {}", e)));
    }
    hex::decode(text).map_err(|e| Error::decode(format!("Invalid hex BINARY value: {}", e)))
}

/// Parse server-rendered timestamp text with the format of its type.
fn rendered(
    projector: &Projector<'_>,
    text: &str,
    data_type: &SnowflakeType,
) -> Result<ParsedTimestamp> {
    date::parse_timestamp(text, &projector.settings().timestamp_format(data_type))
}

/// Place a wall clock in the session timezone.
fn localize(projector: &Projector<'_>, wall: NaiveDateTime) -> Result<DateTime<FixedOffset>> {
    projector
        .settings()
        .timezone
        .from_local_datetime(&wall)
        .earliest()
        .map(|dt| dt.fixed_offset())
        .ok_or_else(|| {
            Error::decode(format!(
                "{} does not exist in timezone {}",
                wall,
                projector.settings().timezone.name()
            ))
        })
}

fn instant(
    projector: &Projector<'_>,
    text: &str,
    data_type: &SnowflakeType,
    native: bool,
) -> Option<Result<DateTime<FixedOffset>>> {
    let tz = projector.settings().timezone;
    let result = match data_type {
        SnowflakeType::TimestampNtz { .. } if native => {
            date::parse_epoch(text).and_then(|wall| localize(projector, wall))
        }
        SnowflakeType::TimestampLtz { .. } if native => {
            date::parse_epoch(text).map(|utc| tz.from_utc_datetime(&utc).fixed_offset())
        }
        SnowflakeType::TimestampTz { .. } if native => date::parse_epoch_with_offset(text),
        SnowflakeType::TimestampLtz { .. } => match rendered(projector, text, data_type) {
            Ok(ParsedTimestamp::Zoned(dt)) => Ok(dt.with_timezone(&tz).fixed_offset()),
            Ok(ParsedTimestamp::Naive(wall)) => localize(projector, wall),
            Err(e) => Err(e),
        },
        SnowflakeType::TimestampNtz { .. }
        | SnowflakeType::TimestampTz { .. }
        | SnowflakeType::Text { .. }
        | SnowflakeType::Variant => match rendered(projector, text, data_type) {
            Ok(ParsedTimestamp::Zoned(dt)) => Ok(dt),
            Ok(ParsedTimestamp::Naive(wall)) => localize(projector, wall),
            Err(e) => Err(e),
        },
        SnowflakeType::Date => date::parse_date(text, &projector.settings().date_format())
            .and_then(|d| localize(projector, d.and_time(chrono::NaiveTime::MIN))),
        _ => return None,
    };
    Some(result)
}

fn wall_clock(
    projector: &Projector<'_>,
    text: &str,
    data_type: &SnowflakeType,
    native: bool,
) -> Option<Result<NaiveDateTime>> {
    let result = match data_type {
        SnowflakeType::TimestampNtz { .. } if native => date::parse_epoch(text),
        SnowflakeType::TimestampNtz { .. } | SnowflakeType::Text { .. } | SnowflakeType::Variant => {
            rendered(projector, text, data_type).map(|parsed| match parsed {
                ParsedTimestamp::Naive(wall) => wall,
                ParsedTimestamp::Zoned(dt) => dt.naive_local(),
            })
        }
        SnowflakeType::TimestampLtz { .. } | SnowflakeType::TimestampTz { .. } => {
            instant(projector, text, data_type, native)?.map(|dt| dt.naive_local())
        }
        SnowflakeType::Date => date::parse_date(text, &projector.settings().date_format())
            .map(|d| d.and_time(chrono::NaiveTime::MIN)),
        _ => return None,
    };
    Some(result)
}
