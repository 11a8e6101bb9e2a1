//! Projection of decoded values into host types.
//!
//! A requested host type is described by a `Target`. `Projector::project`
//! walks a `StructuredValue` alongside the target and produces a
//! `HostValue`, which `FromStructured` then turns into the concrete Rust
//! type. Record targets build user types through `StructuredRecord`.

mod coerce;
mod convert;
mod record;
mod render;

use std::fmt;

use indexmap::IndexMap;

use crate::error::{Error, Result};
use crate::registry::ObjectFactories;
use crate::session::{ResultFormat, SessionSettings};
use crate::types::{HostValue, StructuredValue};

pub use convert::FromStructured;
pub use record::{FieldValue, RecordTarget, StructuredRecord};
pub use render::RenderStyle;

/// Scalar host types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarKind {
    Text,
    Boolean,
    TinyInt,
    SmallInt,
    Int,
    BigInt,
    Float,
    Double,
    Decimal,
    Date,
    Time,
    TimestampNtz,
    Timestamp,
    Binary,
}

impl ScalarKind {
    /// Name used in error messages.
    pub fn name(&self) -> &'static str {
        match self {
            ScalarKind::Text => "String",
            ScalarKind::Boolean => "bool",
            ScalarKind::TinyInt => "i8",
            ScalarKind::SmallInt => "i16",
            ScalarKind::Int => "i32",
            ScalarKind::BigInt => "i64",
            ScalarKind::Float => "f32",
            ScalarKind::Double => "f64",
            ScalarKind::Decimal => "Decimal",
            ScalarKind::Date => "NaiveDate",
            ScalarKind::Time => "NaiveTime",
            ScalarKind::TimestampNtz => "NaiveDateTime",
            ScalarKind::Timestamp => "DateTime",
            ScalarKind::Binary => "Vec<u8>",
        }
    }
}

/// Requested host type.
#[derive(Debug, Clone)]
pub enum Target {
    /// Scalar host type.
    Scalar(ScalarKind),
    /// Sequence of the element target.
    Array(Box<Target>),
    /// Text-keyed map of the value target.
    Map(Box<Target>),
    /// User record type.
    Record(RecordTarget),
    /// Default host form for whatever was decoded.
    Generic,
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Scalar(kind) => write!(f, "{}", kind.name()),
            Target::Array(element) => write!(f, "Vec<{}>", element),
            Target::Map(value) => write!(f, "Map<String, {}>", value),
            Target::Record(record) => write!(f, "{}", record.type_name()),
            Target::Generic => write!(f, "HostValue"),
        }
    }
}

/// Projects decoded values using session settings and registered factories.
#[derive(Debug, Clone, Copy)]
pub struct Projector<'a> {
    settings: &'a SessionSettings,
    factories: &'a ObjectFactories,
    format: ResultFormat,
}

impl<'a> Projector<'a> {
    /// Create a projector.
    pub fn new(
        settings: &'a SessionSettings,
        factories: &'a ObjectFactories,
        format: ResultFormat,
    ) -> Self {
        Self {
            settings,
            factories,
            format,
        }
    }

    /// Session settings.
    pub fn settings(&self) -> &'a SessionSettings {
        self.settings
    }

    /// Registered record factories.
    pub fn factories(&self) -> &'a ObjectFactories {
        self.factories
    }

    /// Result format the values were decoded from.
    pub fn format(&self) -> ResultFormat {
        self.format
    }

    /// Project `node` into the host form described by `target`.
    ///
    /// NULL projects to `HostValue::Null` for every target.
    ///
    /// # Errors
    /// Returns `Error::TypeMismatch` when the node's shape or declared type
    /// cannot produce the target, and `Error::Decode` when a scalar does not
    /// parse.
    pub fn project(&self, node: StructuredValue, target: &Target) -> Result<HostValue> {
        match (node, target) {
            (StructuredValue::Null, _) => Ok(HostValue::Null),
            (
                StructuredValue::Scalar {
                    text,
                    data_type,
                    native,
                },
                Target::Scalar(kind),
            ) => coerce::coerce(self, &text, &data_type, native, *kind),
            (
                StructuredValue::Scalar {
                    text,
                    data_type,
                    native,
                },
                Target::Generic,
            ) => coerce::generic(self, text, &data_type, native),
            (StructuredValue::Struct(fields), Target::Record(record)) => record.build(self, fields),
            (StructuredValue::Array(items), Target::Array(element)) => items
                .into_iter()
                .map(|item| self.project(item, element))
                .collect::<Result<Vec<_>>>()
                .map(HostValue::Array),
            (
                StructuredValue::Map(entries) | StructuredValue::Struct(entries),
                Target::Map(value),
            ) => self.project_entries(entries, value),
            (StructuredValue::Array(items), Target::Generic) => items
                .into_iter()
                .map(|item| self.project(item, &Target::Generic))
                .collect::<Result<Vec<_>>>()
                .map(HostValue::Array),
            (
                StructuredValue::Map(entries) | StructuredValue::Struct(entries),
                Target::Generic,
            ) => self.project_entries(entries, &Target::Generic),
            (node, target) => Err(Error::type_mismatch(target.to_string(), node.kind())),
        }
    }

    fn project_entries(
        &self,
        entries: Vec<(String, StructuredValue)>,
        value: &Target,
    ) -> Result<HostValue> {
        let mut map = IndexMap::with_capacity(entries.len());
        for (key, node) in entries {
            map.insert(key, self.project(node, value)?);
        }
        Ok(HostValue::Object(map))
    }

    /// Project `node` into `T`; NULL gives `None`.
    pub fn project_as<T: FromStructured>(&self, node: StructuredValue) -> Result<Option<T>> {
        match self.project(node, &T::target())? {
            HostValue::Null => Ok(None),
            host => T::from_host(host).map(Some),
        }
    }

    /// Project without a requested type.
    ///
    /// OBJECT values become their pretty-printed JSON text and MAP values a
    /// generic map; both are rejected for native Arrow results. Everything
    /// else takes its generic form.
    pub fn project_untyped(&self, node: StructuredValue) -> Result<HostValue> {
        match node {
            StructuredValue::Struct(_) | StructuredValue::Map(_) if self.format.is_native() => {
                Err(Error::unsupported(format!(
                    "{} values need a target type in native Arrow results",
                    node.kind()
                )))
            }
            StructuredValue::Struct(_) => Ok(HostValue::String(
                self.render(&node, RenderStyle::Pretty)?,
            )),
            node => self.project(node, &Target::Generic),
        }
    }

    /// Project into a generic map.
    ///
    /// OBJECT and MAP values become ordered maps, ARRAY values generic
    /// lists and scalars their rendered text. Rejected for native Arrow
    /// results.
    pub fn project_object_map(&self, node: StructuredValue) -> Result<HostValue> {
        if self.format.is_native() {
            return Err(Error::unsupported(
                "generic map projection is not available for native Arrow results",
            ));
        }
        match node {
            StructuredValue::Scalar { .. } => self.project(node, &Target::Scalar(ScalarKind::Text)),
            node => self.project(node, &Target::Generic),
        }
    }

    /// Render `node` as text.
    ///
    /// Containers render as JSON in the given style; a top-level scalar
    /// renders as its unquoted text.
    pub fn render(&self, node: &StructuredValue, style: RenderStyle) -> Result<String> {
        render::render(self, node, style)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SnowflakeType;

    fn varchar(text: &str) -> StructuredValue {
        StructuredValue::text(text, SnowflakeType::Text { length: None })
    }

    fn integer(text: &str) -> StructuredValue {
        StructuredValue::text(
            text,
            SnowflakeType::Fixed {
                precision: 38,
                scale: 0,
            },
        )
    }

    fn with_projector<R>(format: ResultFormat, f: impl FnOnce(Projector<'_>) -> R) -> R {
        let settings = SessionSettings::default();
        let factories = ObjectFactories::new();
        f(Projector::new(&settings, &factories, format))
    }

    #[test]
    fn test_null_for_every_target() {
        with_projector(ResultFormat::Json, |p| {
            for target in [
                Target::Scalar(ScalarKind::Int),
                Target::Array(Box::new(Target::Generic)),
                Target::Map(Box::new(Target::Generic)),
                Target::Generic,
            ] {
                assert_eq!(p.project(StructuredValue::Null, &target).unwrap(), HostValue::Null);
            }
        });
    }

    #[test]
    fn test_array_keeps_null_slots() {
        with_projector(ResultFormat::Json, |p| {
            let node = StructuredValue::Array(vec![varchar("one"), StructuredValue::Null]);
            let target = Target::Array(Box::new(Target::Scalar(ScalarKind::Text)));
            assert_eq!(
                p.project(node, &target).unwrap(),
                HostValue::Array(vec![HostValue::String("one".to_string()), HostValue::Null])
            );
        });
    }

    #[test]
    fn test_struct_as_map() {
        with_projector(ResultFormat::Json, |p| {
            let node = StructuredValue::Struct(vec![
                ("x".to_string(), varchar("abc")),
                ("y".to_string(), integer("1")),
            ]);
            let host = p.project(node, &Target::Generic).unwrap();
            assert_eq!(host.get("x"), Some(&HostValue::String("abc".to_string())));
            assert_eq!(host.get("y"), Some(&HostValue::Integer(1)));
        });
    }

    #[test]
    fn test_shape_mismatch() {
        with_projector(ResultFormat::Json, |p| {
            let node = StructuredValue::Array(vec![integer("1")]);
            let err = p
                .project(node, &Target::Scalar(ScalarKind::BigInt))
                .unwrap_err();
            assert!(matches!(err, Error::TypeMismatch { .. }));
            assert_eq!(err.to_string(), "Type mismatch: cannot project ARRAY as i64");
        });
    }

    #[test]
    fn test_untyped_struct_depends_on_format() {
        let node = StructuredValue::Struct(vec![("string".to_string(), varchar("a"))]);

        with_projector(ResultFormat::Json, |p| {
            assert_eq!(
                p.project_untyped(node.clone()).unwrap(),
                HostValue::String("{\n  \"string\": \"a\"\n}".to_string())
            );
        });
        with_projector(ResultFormat::NativeArrow, |p| {
            assert!(matches!(
                p.project_untyped(node.clone()),
                Err(Error::UnsupportedProjection { .. })
            ));
            assert!(matches!(
                p.project_object_map(node.clone()),
                Err(Error::UnsupportedProjection { .. })
            ));
        });
    }

    #[test]
    fn test_object_map_of_scalar() {
        with_projector(ResultFormat::Json, |p| {
            assert_eq!(
                p.project_object_map(integer("42")).unwrap(),
                HostValue::String("42".to_string())
            );
        });
    }

    #[test]
    fn test_projection_is_repeatable() {
        with_projector(ResultFormat::Json, |p| {
            let node = StructuredValue::Map(vec![
                ("x".to_string(), integer("1")),
                ("y".to_string(), StructuredValue::Null),
            ]);
            let target = Target::Map(Box::new(Target::Scalar(ScalarKind::BigInt)));
            let first = p.project(node.clone(), &target).unwrap();
            let second = p.project(node, &target).unwrap();
            assert_eq!(first, second);
        });
    }

    #[test]
    fn test_target_display() {
        let target = Target::Map(Box::new(Target::Array(Box::new(Target::Scalar(
            ScalarKind::Date,
        )))));
        assert_eq!(target.to_string(), "Map<String, Vec<NaiveDate>>");
    }
}
