//! Snowflake data type enum with type-specific attributes.
//!
//! Structured variants carry their nested schemas, so a type is exactly one
//! of: a scalar, an OBJECT with fields, an ARRAY with an element type, or a
//! MAP with key and value types. An OBJECT without fields or an ARRAY without
//! an element type is semi-structured and decodes as plain text.
//!
//! Note: Nullability is a field property, not a type property.

use std::fmt;
use std::iter::Peekable;
use std::str::FromStr;
use std::vec::IntoIter;

use super::column::FieldSchema;
use super::metadata::TypeMetadata;
use crate::error::{Error, Result};

/// Default fractional-second scale for TIME and TIMESTAMP types.
pub const DEFAULT_TIME_SCALE: u8 = 9;

/// Snowflake data type with type-specific attributes.
#[derive(Debug, Clone, PartialEq)]
pub enum SnowflakeType {
    /// NUMBER(precision, scale) and its integer synonyms.
    Fixed { precision: u8, scale: u8 },
    /// FLOAT / DOUBLE / REAL.
    Real,
    /// VARCHAR(length) and its synonyms.
    Text { length: Option<u64> },
    /// BOOLEAN.
    Boolean,
    /// DATE.
    Date,
    /// TIME(scale).
    Time { scale: u8 },
    /// TIMESTAMP_LTZ(scale) - instant rendered in the session timezone.
    TimestampLtz { scale: u8 },
    /// TIMESTAMP_NTZ(scale) - wall clock without zone.
    TimestampNtz { scale: u8 },
    /// TIMESTAMP_TZ(scale) - instant with its own offset.
    TimestampTz { scale: u8 },
    /// BINARY(length).
    Binary { length: Option<u64> },
    /// VARIANT - semi-structured JSON.
    Variant,
    /// OBJECT with declared fields (empty for semi-structured OBJECT).
    Object(Vec<FieldSchema>),
    /// ARRAY with a declared element type (`None` for semi-structured ARRAY).
    Array(Option<Box<FieldSchema>>),
    /// MAP with declared key and value types.
    Map {
        key: Box<FieldSchema>,
        value: Box<FieldSchema>,
    },
}

/// Column type category reported to callers inspecting result metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlType {
    Varchar,
    BigInt,
    Decimal,
    Double,
    Boolean,
    Date,
    Time,
    Timestamp,
    TimestampWithTimezone,
    Binary,
    Struct,
    Array,
}

impl SnowflakeType {
    /// Create from rowtype metadata.
    ///
    /// Returns `Err(Error::InvalidTypeName)` for unknown type names or
    /// MAP metadata without key and value fields.
    pub fn from_metadata(meta: &TypeMetadata) -> Result<Self> {
        let fields = meta.fields.as_deref().unwrap_or(&[]);
        let ty = match meta.type_name.to_ascii_lowercase().as_str() {
            "fixed" => SnowflakeType::Fixed {
                precision: meta.precision.unwrap_or(38),
                scale: meta.scale.unwrap_or(0),
            },
            "real" => SnowflakeType::Real,
            "text" => SnowflakeType::Text {
                length: meta.length,
            },
            "boolean" => SnowflakeType::Boolean,
            "date" => SnowflakeType::Date,
            "time" => SnowflakeType::Time {
                scale: meta.scale.unwrap_or(DEFAULT_TIME_SCALE),
            },
            "timestamp_ltz" => SnowflakeType::TimestampLtz {
                scale: meta.scale.unwrap_or(DEFAULT_TIME_SCALE),
            },
            "timestamp_ntz" => SnowflakeType::TimestampNtz {
                scale: meta.scale.unwrap_or(DEFAULT_TIME_SCALE),
            },
            "timestamp_tz" => SnowflakeType::TimestampTz {
                scale: meta.scale.unwrap_or(DEFAULT_TIME_SCALE),
            },
            "binary" => SnowflakeType::Binary {
                length: meta.length,
            },
            "variant" => SnowflakeType::Variant,
            "object" => SnowflakeType::Object(
                fields
                    .iter()
                    .map(FieldSchema::from_field_metadata)
                    .collect::<Result<Vec<_>>>()?,
            ),
            "array" => SnowflakeType::Array(match fields.first() {
                Some(element) => Some(Box::new(FieldSchema::from_field_metadata(element)?)),
                None => None,
            }),
            "map" => match fields {
                [key, value] => SnowflakeType::Map {
                    key: Box::new(FieldSchema::from_field_metadata(key)?),
                    value: Box::new(FieldSchema::from_field_metadata(value)?),
                },
                _ => {
                    return Err(Error::invalid_type_name(format!(
                        "MAP metadata requires key and value fields, got {}",
                        fields.len()
                    )))
                }
            },
            other => {
                return Err(Error::invalid_type_name(format!(
                    "unknown column type: {}",
                    other
                )))
            }
        };
        Ok(ty)
    }

    /// Get the SQL type name.
    pub fn type_name(&self) -> &'static str {
        match self {
            SnowflakeType::Fixed { .. } => "NUMBER",
            SnowflakeType::Real => "DOUBLE",
            SnowflakeType::Text { .. } => "VARCHAR",
            SnowflakeType::Boolean => "BOOLEAN",
            SnowflakeType::Date => "DATE",
            SnowflakeType::Time { .. } => "TIME",
            SnowflakeType::TimestampLtz { .. } => "TIMESTAMP_LTZ",
            SnowflakeType::TimestampNtz { .. } => "TIMESTAMP_NTZ",
            SnowflakeType::TimestampTz { .. } => "TIMESTAMP_TZ",
            SnowflakeType::Binary { .. } => "BINARY",
            SnowflakeType::Variant => "VARIANT",
            SnowflakeType::Object(_) => "OBJECT",
            SnowflakeType::Array(_) => "ARRAY",
            SnowflakeType::Map { .. } => "MAP",
        }
    }

    /// Check if the type carries a nested schema (OBJECT with fields,
    /// ARRAY with an element type, or MAP).
    pub fn is_structured(&self) -> bool {
        match self {
            SnowflakeType::Object(fields) => !fields.is_empty(),
            SnowflakeType::Array(element) => element.is_some(),
            SnowflakeType::Map { .. } => true,
            _ => false,
        }
    }

    /// Check for DATE, TIME and the TIMESTAMP family.
    pub fn is_temporal(&self) -> bool {
        matches!(
            self,
            SnowflakeType::Date
                | SnowflakeType::Time { .. }
                | SnowflakeType::TimestampLtz { .. }
                | SnowflakeType::TimestampNtz { .. }
                | SnowflakeType::TimestampTz { .. }
        )
    }

    /// Check for the TIMESTAMP family.
    pub fn is_timestamp(&self) -> bool {
        matches!(
            self,
            SnowflakeType::TimestampLtz { .. }
                | SnowflakeType::TimestampNtz { .. }
                | SnowflakeType::TimestampTz { .. }
        )
    }

    /// Get scale (for NUMBER, TIME and TIMESTAMP types, 0 otherwise).
    pub fn scale(&self) -> u8 {
        match self {
            SnowflakeType::Fixed { scale, .. }
            | SnowflakeType::Time { scale }
            | SnowflakeType::TimestampLtz { scale }
            | SnowflakeType::TimestampNtz { scale }
            | SnowflakeType::TimestampTz { scale } => *scale,
            _ => 0,
        }
    }

    /// Get the SQL type category.
    ///
    /// `treat_decimal_as_int` reports NUMBER columns with scale 0 as BIGINT.
    pub fn sql_type(&self, treat_decimal_as_int: bool) -> SqlType {
        match self {
            SnowflakeType::Fixed { scale: 0, .. } if treat_decimal_as_int => SqlType::BigInt,
            SnowflakeType::Fixed { .. } => SqlType::Decimal,
            SnowflakeType::Real => SqlType::Double,
            SnowflakeType::Text { .. } | SnowflakeType::Variant => SqlType::Varchar,
            SnowflakeType::Boolean => SqlType::Boolean,
            SnowflakeType::Date => SqlType::Date,
            SnowflakeType::Time { .. } => SqlType::Time,
            SnowflakeType::TimestampNtz { .. } => SqlType::Timestamp,
            SnowflakeType::TimestampLtz { .. } | SnowflakeType::TimestampTz { .. } => {
                SqlType::TimestampWithTimezone
            }
            SnowflakeType::Binary { .. } => SqlType::Binary,
            SnowflakeType::Object(_) | SnowflakeType::Map { .. } if self.is_structured() => {
                SqlType::Struct
            }
            SnowflakeType::Array(Some(_)) => SqlType::Array,
            SnowflakeType::Object(_) | SnowflakeType::Array(None) | SnowflakeType::Map { .. } => {
                SqlType::Varchar
            }
        }
    }
}

impl fmt::Display for SnowflakeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SnowflakeType::Fixed { precision, scale } => {
                write!(f, "NUMBER({},{})", precision, scale)
            }
            SnowflakeType::Text { length: Some(n) } => write!(f, "VARCHAR({})", n),
            SnowflakeType::Binary { length: Some(n) } => write!(f, "BINARY({})", n),
            SnowflakeType::Time { scale }
            | SnowflakeType::TimestampLtz { scale }
            | SnowflakeType::TimestampNtz { scale }
            | SnowflakeType::TimestampTz { scale } => {
                write!(f, "{}({})", self.type_name(), scale)
            }
            SnowflakeType::Object(fields) if !fields.is_empty() => {
                write!(f, "OBJECT(")?;
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{} {}", field.name, field.data_type)?;
                    if !field.nullable {
                        write!(f, " NOT NULL")?;
                    }
                }
                write!(f, ")")
            }
            SnowflakeType::Array(Some(element)) => write!(f, "ARRAY({})", element.data_type),
            SnowflakeType::Map { key, value } => {
                write!(f, "MAP({}, {})", key.data_type, value.data_type)
            }
            _ => write!(f, "{}", self.type_name()),
        }
    }
}

impl FromStr for SnowflakeType {
    type Err = Error;

    /// Parse a SQL type name such as `OBJECT(x VARCHAR, y INTEGER)` or
    /// `MAP(VARCHAR, ARRAY(DATE))`.
    fn from_str(s: &str) -> Result<Self> {
        let mut parser = TypeParser::new(s)?;
        let ty = parser.parse_type()?;
        match parser.tokens.next() {
            None => Ok(ty),
            Some(token) => Err(Error::invalid_type_name(format!(
                "unexpected {:?} after type in '{}'",
                token, s
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Ident(String),
    Quoted(String),
    Number(u64),
    LParen,
    RParen,
    Comma,
}

fn tokenize(source: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = source.chars().peekable();

    while let Some(&c) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                chars.next();
            }
            '(' => {
                chars.next();
                tokens.push(Token::LParen);
            }
            ')' => {
                chars.next();
                tokens.push(Token::RParen);
            }
            ',' => {
                chars.next();
                tokens.push(Token::Comma);
            }
            '"' => {
                chars.next();
                let mut name = String::new();
                loop {
                    match chars.next() {
                        Some('"') if chars.peek() == Some(&'"') => {
                            chars.next();
                            name.push('"');
                        }
                        Some('"') => break,
                        Some(ch) => name.push(ch),
                        None => {
                            return Err(Error::invalid_type_name(format!(
                                "unterminated quoted identifier in '{}'",
                                source
                            )))
                        }
                    }
                }
                tokens.push(Token::Quoted(name));
            }
            c if c.is_ascii_digit() => {
                let mut digits = String::new();
                while let Some(&d) = chars.peek() {
                    if !d.is_ascii_digit() {
                        break;
                    }
                    digits.push(d);
                    chars.next();
                }
                let n = digits.parse::<u64>().map_err(|_| {
                    Error::invalid_type_name(format!("number out of range: {}", digits))
                })?;
                tokens.push(Token::Number(n));
            }
            c if c.is_alphanumeric() || c == '_' || c == '$' => {
                let mut ident = String::new();
                while let Some(&d) = chars.peek() {
                    if !(d.is_alphanumeric() || d == '_' || d == '$') {
                        break;
                    }
                    ident.push(d);
                    chars.next();
                }
                tokens.push(Token::Ident(ident));
            }
            other => {
                return Err(Error::invalid_type_name(format!(
                    "unexpected character '{}' in '{}'",
                    other, source
                )))
            }
        }
    }

    Ok(tokens)
}

/// Recursive-descent parser over type name tokens.
/// Nested OBJECT/ARRAY/MAP levels accepted in one type name.
const MAX_TYPE_DEPTH: usize = 64;

struct TypeParser {
    tokens: Peekable<IntoIter<Token>>,
    depth: usize,
}

impl TypeParser {
    fn new(source: &str) -> Result<Self> {
        Ok(Self {
            tokens: tokenize(source)?.into_iter().peekable(),
            depth: 0,
        })
    }

    fn expect(&mut self, expected: Token) -> Result<()> {
        match self.tokens.next() {
            Some(token) if token == expected => Ok(()),
            Some(token) => Err(Error::invalid_type_name(format!(
                "expected {:?}, got {:?}",
                expected, token
            ))),
            None => Err(Error::invalid_type_name(format!(
                "expected {:?}, got end of input",
                expected
            ))),
        }
    }

    fn eat(&mut self, expected: &Token) -> bool {
        if self.tokens.peek() == Some(expected) {
            self.tokens.next();
            true
        } else {
            false
        }
    }

    fn eat_keyword(&mut self, keyword: &str) -> bool {
        match self.tokens.peek() {
            Some(Token::Ident(ident)) if ident.eq_ignore_ascii_case(keyword) => {
                self.tokens.next();
                true
            }
            _ => false,
        }
    }

    fn number(&mut self) -> Result<u64> {
        match self.tokens.next() {
            Some(Token::Number(n)) => Ok(n),
            other => Err(Error::invalid_type_name(format!(
                "expected number, got {:?}",
                other
            ))),
        }
    }

    fn small_number(&mut self) -> Result<u8> {
        let n = self.number()?;
        u8::try_from(n).map_err(|_| Error::invalid_type_name(format!("value too large: {}", n)))
    }

    /// Optional `(n)` suffix.
    fn optional_length(&mut self) -> Result<Option<u64>> {
        if !self.eat(&Token::LParen) {
            return Ok(None);
        }
        let n = self.number()?;
        self.expect(Token::RParen)?;
        Ok(Some(n))
    }

    /// Optional `(scale)` suffix for TIME and TIMESTAMP types.
    fn optional_scale(&mut self) -> Result<u8> {
        if !self.eat(&Token::LParen) {
            return Ok(DEFAULT_TIME_SCALE);
        }
        let scale = self.small_number()?;
        self.expect(Token::RParen)?;
        Ok(scale)
    }

    fn parse_type(&mut self) -> Result<SnowflakeType> {
        if self.depth >= MAX_TYPE_DEPTH {
            return Err(Error::invalid_type_name(format!(
                "type nesting deeper than {} levels",
                MAX_TYPE_DEPTH
            )));
        }
        self.depth += 1;
        let ty = self.parse_named_type();
        self.depth -= 1;
        ty
    }

    fn parse_named_type(&mut self) -> Result<SnowflakeType> {
        let name = match self.tokens.next() {
            Some(Token::Ident(ident)) => ident.to_ascii_uppercase(),
            other => {
                return Err(Error::invalid_type_name(format!(
                    "expected type name, got {:?}",
                    other
                )))
            }
        };

        let ty = match name.as_str() {
            "NUMBER" | "DECIMAL" | "NUMERIC" => {
                let (mut precision, mut scale) = (38, 0);
                if self.eat(&Token::LParen) {
                    precision = self.small_number()?;
                    if self.eat(&Token::Comma) {
                        scale = self.small_number()?;
                    }
                    self.expect(Token::RParen)?;
                }
                SnowflakeType::Fixed { precision, scale }
            }
            "INT" | "INTEGER" | "BIGINT" | "SMALLINT" | "TINYINT" | "BYTEINT" => {
                SnowflakeType::Fixed {
                    precision: 38,
                    scale: 0,
                }
            }
            "FLOAT" | "FLOAT4" | "FLOAT8" | "REAL" => SnowflakeType::Real,
            "DOUBLE" => {
                self.eat_keyword("PRECISION");
                SnowflakeType::Real
            }
            "VARCHAR" | "STRING" | "TEXT" | "CHAR" | "CHARACTER" | "NCHAR" | "NVARCHAR" => {
                SnowflakeType::Text {
                    length: self.optional_length()?,
                }
            }
            "BOOLEAN" => SnowflakeType::Boolean,
            "DATE" => SnowflakeType::Date,
            "TIME" => SnowflakeType::Time {
                scale: self.optional_scale()?,
            },
            "TIMESTAMP" | "DATETIME" | "TIMESTAMP_NTZ" => SnowflakeType::TimestampNtz {
                scale: self.optional_scale()?,
            },
            "TIMESTAMP_LTZ" => SnowflakeType::TimestampLtz {
                scale: self.optional_scale()?,
            },
            "TIMESTAMP_TZ" => SnowflakeType::TimestampTz {
                scale: self.optional_scale()?,
            },
            "BINARY" | "VARBINARY" => SnowflakeType::Binary {
                length: self.optional_length()?,
            },
            "VARIANT" => SnowflakeType::Variant,
            "OBJECT" => {
                let mut fields = Vec::new();
                if self.eat(&Token::LParen) && !self.eat(&Token::RParen) {
                    loop {
                        fields.push(self.parse_field()?);
                        if self.eat(&Token::Comma) {
                            continue;
                        }
                        self.expect(Token::RParen)?;
                        break;
                    }
                }
                SnowflakeType::Object(fields)
            }
            "ARRAY" => {
                if self.eat(&Token::LParen) {
                    let element = self.parse_type()?;
                    let nullable = !self.parse_not_null();
                    self.expect(Token::RParen)?;
                    SnowflakeType::Array(Some(Box::new(
                        FieldSchema::new("", element).with_nullable(nullable),
                    )))
                } else {
                    SnowflakeType::Array(None)
                }
            }
            "MAP" => {
                self.expect(Token::LParen)?;
                let key = self.parse_type()?;
                self.expect(Token::Comma)?;
                let value = self.parse_type()?;
                let nullable = !self.parse_not_null();
                self.expect(Token::RParen)?;
                SnowflakeType::Map {
                    key: Box::new(FieldSchema::new("key", key).with_nullable(false)),
                    value: Box::new(FieldSchema::new("value", value).with_nullable(nullable)),
                }
            }
            other => {
                return Err(Error::invalid_type_name(format!(
                    "unknown type: {}",
                    other
                )))
            }
        };

        Ok(ty)
    }

    /// `name TYPE [NOT NULL]`
    fn parse_field(&mut self) -> Result<FieldSchema> {
        let name = match self.tokens.next() {
            Some(Token::Ident(ident)) | Some(Token::Quoted(ident)) => ident,
            other => {
                return Err(Error::invalid_type_name(format!(
                    "expected field name, got {:?}",
                    other
                )))
            }
        };
        let data_type = self.parse_type()?;
        let nullable = !self.parse_not_null();
        Ok(FieldSchema::new(name, data_type).with_nullable(nullable))
    }

    fn parse_not_null(&mut self) -> bool {
        if self.eat_keyword("NOT") {
            self.eat_keyword("NULL");
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_scalars() {
        assert_eq!(
            "INTEGER".parse::<SnowflakeType>().unwrap(),
            SnowflakeType::Fixed {
                precision: 38,
                scale: 0
            }
        );
        assert_eq!(
            "decimal(20,2)".parse::<SnowflakeType>().unwrap(),
            SnowflakeType::Fixed {
                precision: 20,
                scale: 2
            }
        );
        assert_eq!(
            "DOUBLE PRECISION".parse::<SnowflakeType>().unwrap(),
            SnowflakeType::Real
        );
        assert_eq!(
            "TIMESTAMP".parse::<SnowflakeType>().unwrap(),
            SnowflakeType::TimestampNtz { scale: 9 }
        );
        assert_eq!(
            "TIME(3)".parse::<SnowflakeType>().unwrap(),
            SnowflakeType::Time { scale: 3 }
        );
        assert_eq!(
            "varchar(16)".parse::<SnowflakeType>().unwrap(),
            SnowflakeType::Text { length: Some(16) }
        );
    }

    #[test]
    fn test_parse_object() {
        let ty: SnowflakeType = "OBJECT(string VARCHAR, intValue INTEGER NOT NULL)"
            .parse()
            .unwrap();
        let SnowflakeType::Object(fields) = ty else {
            panic!("Expected Object type");
        };
        assert_eq!(fields.len(), 2);
        assert_eq!(fields[0].name, "string");
        assert_eq!(fields[0].data_type.type_name(), "VARCHAR");
        assert!(fields[0].nullable);
        assert_eq!(fields[1].name, "intValue");
        assert!(!fields[1].nullable);
    }

    #[test]
    fn test_parse_nested() {
        let ty: SnowflakeType = "MAP(VARCHAR, ARRAY(OBJECT(x VARCHAR, \"Y y\" INTEGER)))"
            .parse()
            .unwrap();
        let SnowflakeType::Map { key, value } = &ty else {
            panic!("Expected Map type");
        };
        assert_eq!(key.data_type, SnowflakeType::Text { length: None });
        let SnowflakeType::Array(Some(element)) = &value.data_type else {
            panic!("Expected structured Array type");
        };
        let SnowflakeType::Object(fields) = &element.data_type else {
            panic!("Expected Object element");
        };
        assert_eq!(fields[1].name, "Y y");
        assert!(ty.is_structured());
    }

    #[test]
    fn test_semi_structured() {
        let object: SnowflakeType = "OBJECT".parse().unwrap();
        assert!(!object.is_structured());
        assert_eq!(object.sql_type(true), SqlType::Varchar);

        let array: SnowflakeType = "ARRAY".parse().unwrap();
        assert_eq!(array, SnowflakeType::Array(None));
        assert!(!array.is_structured());
    }

    #[test]
    fn test_parse_errors() {
        assert!("GEOGRAPHY".parse::<SnowflakeType>().is_err());
        assert!("OBJECT(x VARCHAR".parse::<SnowflakeType>().is_err());
        assert!("MAP(VARCHAR)".parse::<SnowflakeType>().is_err());
        assert!("VARCHAR VARCHAR".parse::<SnowflakeType>().is_err());
        assert!(matches!(
            "NUMBER(999)".parse::<SnowflakeType>(),
            Err(Error::InvalidTypeName { .. })
        ));
    }

    #[test]
    fn test_nesting_limit() {
        let nested = |depth: usize| {
            format!("{}INTEGER{}", "ARRAY(".repeat(depth), ")".repeat(depth))
        };
        assert!(nested(10).parse::<SnowflakeType>().is_ok());
        assert!(nested(MAX_TYPE_DEPTH - 1).parse::<SnowflakeType>().is_ok());
        assert!(matches!(
            nested(MAX_TYPE_DEPTH).parse::<SnowflakeType>(),
            Err(Error::InvalidTypeName { .. })
        ));
        assert!(matches!(
            nested(100_000).parse::<SnowflakeType>(),
            Err(Error::InvalidTypeName { .. })
        ));
    }

    #[test]
    fn test_sql_type() {
        let object: SnowflakeType = "OBJECT(string VARCHAR)".parse().unwrap();
        assert_eq!(object.sql_type(true), SqlType::Struct);
        let fixed: SnowflakeType = "NUMBER(10,0)".parse().unwrap();
        assert_eq!(fixed.sql_type(true), SqlType::BigInt);
        assert_eq!(fixed.sql_type(false), SqlType::Decimal);
    }

    #[test]
    fn test_display() {
        let ty: SnowflakeType = "object(s varchar, n number(10,2) not null)".parse().unwrap();
        assert_eq!(
            ty.to_string(),
            "OBJECT(s VARCHAR, n NUMBER(10,2) NOT NULL)"
        );
        let map: SnowflakeType = "MAP(VARCHAR, BOOLEAN)".parse().unwrap();
        assert_eq!(map.to_string(), "MAP(VARCHAR, BOOLEAN)");
    }
}
