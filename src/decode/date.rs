//! DATE, TIME and TIMESTAMP value helpers.
//!
//! Temporal values reach the projector in one of two textual forms:
//! - server-rendered text in the session output format (JSON payloads)
//! - canonical columnar text: `YYYY-MM-DD` dates, `HH:MM:SS[.fffffffff]`
//!   times, decimal epoch seconds for TIMESTAMP_NTZ/LTZ, and
//!   `"<epoch seconds> <offset minutes + 1440>"` for TIMESTAMP_TZ.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, TimeZone};

use super::format::SfDateTimeFormat;
use crate::error::{Error, Result};

const NANOS_PER_SECOND: i128 = 1_000_000_000;
/// TIMESTAMP_TZ offsets are stored as minutes shifted by this bias.
pub const TIMEZONE_BIAS_MINUTES: i32 = 1440;

/// Timestamp parsed from text, with or without an offset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParsedTimestamp {
    Naive(NaiveDateTime),
    Zoned(DateTime<FixedOffset>),
}

/// Parse decimal epoch seconds (`"1640162624.123"`) into nanoseconds.
pub fn epoch_to_nanos(text: &str) -> Result<i128> {
    let text = text.trim();
    let (negative, digits) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };
    let (int_part, frac_part) = digits.split_once('.').unwrap_or((digits, ""));

    let invalid = || Error::decode(format!("Invalid epoch value: '{}'", text));
    if int_part.is_empty() || !int_part.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    if !frac_part.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }

    let seconds: i128 = int_part.parse().map_err(|_| invalid())?;
    let mut fraction: i128 = 0;
    for (i, b) in frac_part.bytes().take(9).enumerate() {
        fraction += i128::from(b - b'0') * 10i128.pow(8 - i as u32);
    }

    let nanos = seconds
        .checked_mul(NANOS_PER_SECOND)
        .and_then(|n| n.checked_add(fraction))
        .ok_or_else(|| Error::decode(format!("Epoch value out of range: '{}'", text)))?;
    Ok(if negative { -nanos } else { nanos })
}

/// Convert nanoseconds since the epoch to a UTC wall clock.
pub fn nanos_to_datetime(nanos: i128) -> Result<NaiveDateTime> {
    let seconds = nanos.div_euclid(NANOS_PER_SECOND);
    let subsec = nanos.rem_euclid(NANOS_PER_SECOND) as u32;
    i64::try_from(seconds)
        .ok()
        .and_then(|s| DateTime::from_timestamp(s, subsec))
        .map(|dt| dt.naive_utc())
        .ok_or_else(|| Error::decode(format!("Timestamp out of range: {} ns", nanos)))
}

/// Parse decimal epoch seconds into a UTC wall clock.
pub fn parse_epoch(text: &str) -> Result<NaiveDateTime> {
    nanos_to_datetime(epoch_to_nanos(text)?)
}

/// Parse canonical TIMESTAMP_TZ text (`"<epoch seconds> <biased offset>"`).
pub fn parse_epoch_with_offset(text: &str) -> Result<DateTime<FixedOffset>> {
    let (epoch, tz) = text
        .trim()
        .split_once(' ')
        .ok_or_else(|| Error::decode(format!("Invalid TIMESTAMP_TZ value: '{}'", text)))?;
    let biased: i32 = tz
        .trim()
        .parse()
        .map_err(|_| Error::decode(format!("Invalid TIMESTAMP_TZ offset: '{}'", tz)))?;
    let minutes = biased
        .checked_sub(TIMEZONE_BIAS_MINUTES)
        .ok_or_else(|| Error::decode(format!("Invalid TIMESTAMP_TZ offset: '{}'", tz)))?;
    let offset = offset_from_minutes(minutes)?;
    Ok(offset.from_utc_datetime(&parse_epoch(epoch)?))
}

/// Build a fixed offset from minutes east of UTC.
pub fn offset_from_minutes(minutes: i32) -> Result<FixedOffset> {
    minutes
        .checked_mul(60)
        .and_then(FixedOffset::east_opt)
        .ok_or_else(|| Error::decode(format!("Invalid timezone offset: {} minutes", minutes)))
}

/// Convert days since the epoch to a date.
pub fn date_from_epoch_days(days: i64) -> Result<NaiveDate> {
    NaiveDate::from_ymd_opt(1970, 1, 1)
        .zip(TimeDelta::try_days(days))
        .and_then(|(epoch, delta)| epoch.checked_add_signed(delta))
        .ok_or_else(|| Error::decode(format!("Date out of range: {} days", days)))
}

/// Parse decimal seconds since midnight (`"45296.5"`).
pub fn time_from_seconds(text: &str) -> Result<NaiveTime> {
    let nanos = epoch_to_nanos(text)?;
    if !(0..86_400 * NANOS_PER_SECOND).contains(&nanos) {
        return Err(Error::decode(format!("Time out of range: '{}'", text)));
    }
    let seconds = (nanos / NANOS_PER_SECOND) as u32;
    let subsec = (nanos % NANOS_PER_SECOND) as u32;
    NaiveTime::from_num_seconds_from_midnight_opt(seconds, subsec)
        .ok_or_else(|| Error::decode(format!("Invalid TIME value: '{}'", text)))
}

/// Parse a DATE from epoch days or formatted text.
pub fn parse_date(text: &str, format: &SfDateTimeFormat) -> Result<NaiveDate> {
    let text = text.trim();
    if let Ok(days) = text.parse::<i64>() {
        return date_from_epoch_days(days);
    }

    [format.chrono_format(), "%Y-%m-%d"]
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
        .ok_or_else(|| Error::decode(format!("Invalid DATE value: '{}'", text)))
}

/// Parse a TIME from seconds since midnight or formatted text.
pub fn parse_time(text: &str, format: &SfDateTimeFormat) -> Result<NaiveTime> {
    let text = text.trim();
    if !text.contains(':') {
        return time_from_seconds(text);
    }

    [format.chrono_format(), "%H:%M:%S%.f", "%H:%M"]
        .iter()
        .find_map(|fmt| NaiveTime::parse_from_str(text, fmt).ok())
        .ok_or_else(|| Error::decode(format!("Invalid TIME value: '{}'", text)))
}

/// Parse server-rendered TIMESTAMP text.
///
/// The session format is tried first, then ISO 8601 / RFC 3339 / RFC 2822
/// variants with and without an offset.
pub fn parse_timestamp(text: &str, format: &SfDateTimeFormat) -> Result<ParsedTimestamp> {
    let text = text.trim();

    if format.has_offset() {
        if let Ok(dt) = DateTime::parse_from_str(text, format.chrono_format()) {
            return Ok(ParsedTimestamp::Zoned(dt));
        }
    } else if let Ok(dt) = NaiveDateTime::parse_from_str(text, format.chrono_format()) {
        return Ok(ParsedTimestamp::Naive(dt));
    }

    for fmt in ["%Y-%m-%d %H:%M:%S%.f %z", "%Y-%m-%d %H:%M:%S%.f %:z"] {
        if let Ok(dt) = DateTime::parse_from_str(text, fmt) {
            return Ok(ParsedTimestamp::Zoned(dt));
        }
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Ok(ParsedTimestamp::Zoned(dt));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(text) {
        return Ok(ParsedTimestamp::Zoned(dt));
    }
    for fmt in [
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S%.f Z",
    ] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, fmt) {
            return Ok(ParsedTimestamp::Naive(dt));
        }
    }

    Err(Error::decode(format!("Invalid TIMESTAMP value: '{}'", text)))
}
