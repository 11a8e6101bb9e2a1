//! Session-owned settings that influence decoding and projection.
//!
//! The server reports these as session parameters when a session opens or a
//! query result arrives; `SessionSettings::from_parameters` applies them by
//! name. Settings are read-only while rows are decoded.

use chrono_tz::Tz;

use crate::decode::format::SfDateTimeFormat;
use crate::error::{Error, Result};
use crate::types::SnowflakeType;

/// Default session timezone.
pub const DEFAULT_TIMEZONE: Tz = chrono_tz::America::Los_Angeles;
/// Default DATE output format.
pub const DEFAULT_DATE_FORMAT: &str = "YYYY-MM-DD";
/// Default TIME output format.
pub const DEFAULT_TIME_FORMAT: &str = "HH24:MI:SS";
/// Default TIMESTAMP output format.
pub const DEFAULT_TIMESTAMP_FORMAT: &str = "YYYY-MM-DD HH24:MI:SS.FF3 TZHTZM";

/// Encoding the server uses for the result's structured columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResultFormat {
    /// Every cell is JSON text.
    #[default]
    Json,
    /// Arrow batches; structured columns still arrive as JSON strings.
    ArrowWithJsonStructuredTypes,
    /// Arrow batches with structured columns as nested Arrow arrays.
    NativeArrow,
}

impl ResultFormat {
    /// Check if structured columns arrive as nested Arrow arrays.
    pub fn is_native(&self) -> bool {
        matches!(self, ResultFormat::NativeArrow)
    }
}

/// Session binary output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BinaryFormat {
    #[default]
    Hex,
    Base64,
}

/// Result encoding requested from the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum QueryResultFormat {
    #[default]
    Json,
    Arrow,
}

/// Session settings.
#[derive(Debug, Clone)]
pub struct SessionSettings {
    /// Session timezone, used for TIMESTAMP_LTZ and for localizing NTZ values.
    pub timezone: Tz,
    /// Report NUMBER(p,0) as integers.
    pub treat_decimal_as_int: bool,
    /// DATE output format.
    pub date_output_format: String,
    /// TIME output format.
    pub time_output_format: String,
    /// Fallback TIMESTAMP output format.
    pub timestamp_output_format: String,
    /// TIMESTAMP_LTZ output format (`None` falls back to the TIMESTAMP format).
    pub timestamp_ltz_output_format: Option<String>,
    /// TIMESTAMP_NTZ output format (`None` falls back to the TIMESTAMP format).
    pub timestamp_ntz_output_format: Option<String>,
    /// TIMESTAMP_TZ output format (`None` falls back to the TIMESTAMP format).
    pub timestamp_tz_output_format: Option<String>,
    /// Binary output format.
    pub binary_output_format: BinaryFormat,
    query_result_format: QueryResultFormat,
    native_arrow_structured_types: bool,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            timezone: DEFAULT_TIMEZONE,
            treat_decimal_as_int: true,
            date_output_format: DEFAULT_DATE_FORMAT.to_string(),
            time_output_format: DEFAULT_TIME_FORMAT.to_string(),
            timestamp_output_format: DEFAULT_TIMESTAMP_FORMAT.to_string(),
            timestamp_ltz_output_format: None,
            timestamp_ntz_output_format: None,
            timestamp_tz_output_format: None,
            binary_output_format: BinaryFormat::Hex,
            query_result_format: QueryResultFormat::Json,
            native_arrow_structured_types: false,
        }
    }
}

impl SessionSettings {
    /// Create settings with server defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the session timezone by IANA name.
    ///
    /// # Example
    ///
    /// ```
    /// use snowflake_structured_rs::SessionSettings;
    ///
    /// let settings = SessionSettings::new()
    ///     .with_timezone("Europe/Warsaw")
    ///     .unwrap()
    ///     .with_treat_decimal_as_int(false);
    /// assert_eq!(settings.timezone.name(), "Europe/Warsaw");
    /// ```
    pub fn with_timezone(mut self, name: &str) -> Result<Self> {
        self.timezone = parse_timezone(name)?;
        Ok(self)
    }

    /// Set the session timezone.
    pub fn with_tz(mut self, timezone: Tz) -> Self {
        self.timezone = timezone;
        self
    }

    /// Set whether NUMBER(p,0) is treated as an integer.
    pub fn with_treat_decimal_as_int(mut self, enabled: bool) -> Self {
        self.treat_decimal_as_int = enabled;
        self
    }

    /// Set the DATE output format.
    pub fn with_date_output_format(mut self, format: impl Into<String>) -> Self {
        self.date_output_format = format.into();
        self
    }

    /// Set the TIME output format.
    pub fn with_time_output_format(mut self, format: impl Into<String>) -> Self {
        self.time_output_format = format.into();
        self
    }

    /// Set the TIMESTAMP output format.
    pub fn with_timestamp_output_format(mut self, format: impl Into<String>) -> Self {
        self.timestamp_output_format = format.into();
        self
    }

    /// Set the TIMESTAMP_LTZ output format.
    pub fn with_timestamp_ltz_output_format(mut self, format: impl Into<String>) -> Self {
        self.timestamp_ltz_output_format = non_empty(format.into());
        self
    }

    /// Set the TIMESTAMP_NTZ output format.
    pub fn with_timestamp_ntz_output_format(mut self, format: impl Into<String>) -> Self {
        self.timestamp_ntz_output_format = non_empty(format.into());
        self
    }

    /// Set the TIMESTAMP_TZ output format.
    pub fn with_timestamp_tz_output_format(mut self, format: impl Into<String>) -> Self {
        self.timestamp_tz_output_format = non_empty(format.into());
        self
    }

    /// Set the binary output format.
    pub fn with_binary_output_format(mut self, format: BinaryFormat) -> Self {
        self.binary_output_format = format;
        self
    }

    /// Set the result format directly.
    pub fn with_result_format(mut self, format: ResultFormat) -> Self {
        (self.query_result_format, self.native_arrow_structured_types) = match format {
            ResultFormat::Json => (QueryResultFormat::Json, self.native_arrow_structured_types),
            ResultFormat::ArrowWithJsonStructuredTypes => (QueryResultFormat::Arrow, false),
            ResultFormat::NativeArrow => (QueryResultFormat::Arrow, true),
        };
        self
    }

    /// Result format implied by the query result format and the native Arrow
    /// structured types switch.
    pub fn result_format(&self) -> ResultFormat {
        match (self.query_result_format, self.native_arrow_structured_types) {
            (QueryResultFormat::Json, _) => ResultFormat::Json,
            (QueryResultFormat::Arrow, false) => ResultFormat::ArrowWithJsonStructuredTypes,
            (QueryResultFormat::Arrow, true) => ResultFormat::NativeArrow,
        }
    }

    /// Build settings from server session parameters.
    pub fn from_parameters<I, K, V>(parameters: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut settings = Self::default();
        for (name, value) in parameters {
            settings.apply_parameter(name.as_ref(), value.as_ref())?;
        }
        Ok(settings)
    }

    /// Apply one server session parameter. Names are case-insensitive;
    /// unknown names are ignored.
    pub fn apply_parameter(&mut self, name: &str, value: &str) -> Result<()> {
        match name.to_ascii_uppercase().as_str() {
            "TIMEZONE" => self.timezone = parse_timezone(value)?,
            "JDBC_TREAT_DECIMAL_AS_INT" => self.treat_decimal_as_int = parse_bool(name, value)?,
            "DATE_OUTPUT_FORMAT" => self.date_output_format = value.to_string(),
            "TIME_OUTPUT_FORMAT" => self.time_output_format = value.to_string(),
            "TIMESTAMP_OUTPUT_FORMAT" => self.timestamp_output_format = value.to_string(),
            "TIMESTAMP_LTZ_OUTPUT_FORMAT" => {
                self.timestamp_ltz_output_format = non_empty(value.to_string())
            }
            "TIMESTAMP_NTZ_OUTPUT_FORMAT" => {
                self.timestamp_ntz_output_format = non_empty(value.to_string())
            }
            "TIMESTAMP_TZ_OUTPUT_FORMAT" => {
                self.timestamp_tz_output_format = non_empty(value.to_string())
            }
            "BINARY_OUTPUT_FORMAT" => {
                self.binary_output_format = match value.to_ascii_uppercase().as_str() {
                    "HEX" => BinaryFormat::Hex,
                    "BASE64" => BinaryFormat::Base64,
                    other => return Err(invalid_parameter(name, other)),
                }
            }
            "JDBC_QUERY_RESULT_FORMAT" | "QUERY_RESULT_FORMAT" => {
                self.query_result_format = match value.to_ascii_uppercase().as_str() {
                    "JSON" => QueryResultFormat::Json,
                    "ARROW" => QueryResultFormat::Arrow,
                    other => return Err(invalid_parameter(name, other)),
                }
            }
            "ENABLE_STRUCTURED_TYPES_NATIVE_ARROW_FORMAT" => {
                self.native_arrow_structured_types = parse_bool(name, value)?
            }
            _ => {
                tracing::trace!(parameter = name, "Ignoring session parameter");
            }
        }
        Ok(())
    }

    /// DATE output format.
    pub fn date_format(&self) -> SfDateTimeFormat {
        SfDateTimeFormat::new(&self.date_output_format)
    }

    /// TIME output format.
    pub fn time_format(&self) -> SfDateTimeFormat {
        SfDateTimeFormat::new(&self.time_output_format)
    }

    /// Output format for a TIMESTAMP type; other types use the general
    /// TIMESTAMP format. Zone elements render `Z` for TIMESTAMP_NTZ.
    pub fn timestamp_format(&self, data_type: &SnowflakeType) -> SfDateTimeFormat {
        let specific = match data_type {
            SnowflakeType::TimestampLtz { .. } => self.timestamp_ltz_output_format.as_deref(),
            SnowflakeType::TimestampNtz { .. } => self.timestamp_ntz_output_format.as_deref(),
            SnowflakeType::TimestampTz { .. } => self.timestamp_tz_output_format.as_deref(),
            _ => None,
        };
        let format = specific.unwrap_or(&self.timestamp_output_format);
        match data_type {
            SnowflakeType::TimestampNtz { .. } => SfDateTimeFormat::without_zone(format),
            _ => SfDateTimeFormat::new(format),
        }
    }
}

fn parse_timezone(name: &str) -> Result<Tz> {
    name.parse::<Tz>().map_err(|e| Error::InvalidParameter {
        name: "TIMEZONE".to_string(),
        message: e.to_string(),
    })
}

fn parse_bool(name: &str, value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        other => Err(invalid_parameter(name, other)),
    }
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

fn invalid_parameter(name: &str, value: &str) -> Error {
    Error::InvalidParameter {
        name: name.to_string(),
        message: format!("unsupported value '{}'", value),
    }
}
