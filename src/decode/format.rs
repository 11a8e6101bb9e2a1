//! Snowflake datetime format strings.
//!
//! Session output formats use Snowflake's format elements
//! (`YYYY-MM-DD HH24:MI:SS.FF3 TZHTZM`). They are translated once into
//! `chrono` format strings, which are then used both to render columnar
//! values as text and to parse server-rendered text back.
//!
//! | Element | chrono |
//! |---------|--------|
//! | `YYYY` / `YY` | `%Y` / `%y` |
//! | `MM` / `MON` / `MMMM` | `%m` / `%b` / `%B` |
//! | `DD` / `DY` | `%d` / `%a` |
//! | `HH24` / `HH` / `HH12` / `AM` | `%H` / `%H` / `%I` / `%p` |
//! | `MI` / `SS` | `%M` / `%S` |
//! | `FF0`..`FF9` / `FF` | `%3f`, `%6f`, `%9f` |
//! | `TZH:TZM` / `TZHTZM` / `TZH` | `%:z` / `%z` / `%z` |

use std::fmt;

/// Elements in match order; longer elements first where prefixes overlap.
const ELEMENTS: &[&str] = &[
    "YYYY", "YY", "MMMM", "MON", "MM", "DD", "DY", "HH24", "HH12", "HH", "AM", "PM", "MI", "SS",
    "TZH:TZM", "TZHTZM", "TZH", "TZM", "FF",
];

/// A Snowflake datetime format translated to `chrono` syntax.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SfDateTimeFormat {
    source: String,
    chrono: String,
}

impl SfDateTimeFormat {
    /// Translate a format whose zone elements render the value's offset.
    pub fn new(format: &str) -> Self {
        Self {
            source: format.to_string(),
            chrono: translate(format, true),
        }
    }

    /// Translate a format for zone-less values; zone elements render `Z`.
    pub fn without_zone(format: &str) -> Self {
        Self {
            source: format.to_string(),
            chrono: translate(format, false),
        }
    }

    /// Original Snowflake format string.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Equivalent `chrono` format string.
    pub fn chrono_format(&self) -> &str {
        &self.chrono
    }

    /// Check if the format carries an offset.
    pub fn has_offset(&self) -> bool {
        self.chrono.contains("%z") || self.chrono.contains("%:z")
    }
}

impl fmt::Display for SfDateTimeFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.source)
    }
}

fn translate(format: &str, with_zone: bool) -> String {
    let mut out = String::with_capacity(format.len() * 2);
    let upper = format.to_ascii_uppercase();
    let bytes = format.as_bytes();
    let mut i = 0;

    while i < format.len() {
        if bytes[i] == b'"' {
            // Quoted literal text.
            i += 1;
            while i < format.len() && bytes[i] != b'"' {
                push_literal(&mut out, format[i..].chars().next().unwrap_or_default());
                i += format[i..].chars().next().map_or(1, char::len_utf8);
            }
            i += 1;
            continue;
        }

        let rest = &upper[i..];
        match ELEMENTS.iter().find(|element| rest.starts_with(*element)) {
            Some(&"FF") => {
                let digits = rest[2..].chars().next().and_then(|c| c.to_digit(10));
                i += if digits.is_some() { 3 } else { 2 };
                match digits {
                    Some(0) => {}
                    Some(1..=3) => out.push_str("%3f"),
                    Some(4..=6) => out.push_str("%6f"),
                    _ => out.push_str("%9f"),
                }
            }
            Some(element) => {
                i += element.len();
                out.push_str(match *element {
                    "YYYY" => "%Y",
                    "YY" => "%y",
                    "MMMM" => "%B",
                    "MON" => "%b",
                    "MM" => "%m",
                    "DD" => "%d",
                    "DY" => "%a",
                    "HH24" | "HH" => "%H",
                    "HH12" => "%I",
                    "AM" | "PM" => "%p",
                    "MI" => "%M",
                    "SS" => "%S",
                    "TZH:TZM" if with_zone => "%:z",
                    "TZHTZM" | "TZH" if with_zone => "%z",
                    "TZM" => "",
                    _ => "Z",
                });
            }
            None => {
                let c = format[i..].chars().next().unwrap_or_default();
                push_literal(&mut out, c);
                i += c.len_utf8();
            }
        }
    }

    out
}

fn push_literal(out: &mut String, c: char) {
    if c == '%' {
        out.push_str("%%");
    } else {
        out.push(c);
    }
}
