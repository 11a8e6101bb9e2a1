//! NUMBER and REAL value helpers.
//!
//! Columnar NUMBER values arrive as unscaled integers plus the declared
//! scale. They are turned into decimal strings here so that the projector
//! sees the same text whether a value came from JSON or from Arrow.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::error::{Error, Result};

/// Format an unscaled integer with `scale` fractional digits.
///
/// Preserves full precision by returning the number as a string.
pub fn format_scaled(unscaled: i128, scale: u8) -> String {
    let negative = unscaled < 0;
    let digits = unscaled.unsigned_abs().to_string();
    let scale = scale as usize;

    let mut result = String::with_capacity(digits.len() + scale + 3);
    if negative {
        result.push('-');
    }

    if scale == 0 {
        result.push_str(&digits);
    } else if digits.len() <= scale {
        // Number is less than 1: 0.00...digits
        result.push_str("0.");
        for _ in digits.len()..scale {
            result.push('0');
        }
        result.push_str(&digits);
    } else {
        // Decimal point in the middle
        let (int_part, frac_part) = digits.split_at(digits.len() - scale);
        result.push_str(int_part);
        result.push('.');
        result.push_str(frac_part);
    }

    result
}

/// Parse decimal text, accepting scientific notation.
pub fn parse_decimal(text: &str) -> Result<Decimal> {
    let text = text.trim();
    let parsed = if text.contains(['e', 'E']) {
        Decimal::from_scientific(text)
    } else {
        text.parse::<Decimal>()
    };
    parsed.map_err(|e| Error::decode(format!("Invalid decimal '{}': {}", text, e)))
}

/// Parse integral text.
///
/// Text with a fractional part or exponent is accepted when its value is
/// integral, e.g. `"1.000"` or `"1e3"`.
pub fn parse_integer(text: &str) -> Result<i64> {
    let text = text.trim();
    if let Ok(v) = text.parse::<i64>() {
        return Ok(v);
    }

    let decimal = parse_decimal(text)?;
    if !decimal.fract().is_zero() {
        return Err(Error::decode(format!("Not an integral value: '{}'", text)));
    }
    decimal
        .trunc()
        .to_i64()
        .ok_or_else(|| Error::decode(format!("Integer out of range: '{}'", text)))
}

/// Parse floating point text, including `inf`, `-inf` and `NaN`.
pub fn parse_double(text: &str) -> Result<f64> {
    let text = text.trim();
    match text.to_ascii_lowercase().as_str() {
        "inf" | "infinity" => return Ok(f64::INFINITY),
        "-inf" | "-infinity" => return Ok(f64::NEG_INFINITY),
        "nan" => return Ok(f64::NAN),
        _ => {}
    }
    text.parse::<f64>()
        .map_err(|e| Error::decode(format!("Invalid floating point '{}': {}", text, e)))
}

/// Narrow an i64 to a smaller integer type.
pub fn narrow<T: TryFrom<i64>>(value: i64, type_name: &str) -> Result<T> {
    T::try_from(value)
        .map_err(|_| Error::decode(format!("Value {} out of range for {}", value, type_name)))
}
