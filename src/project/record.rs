//! User record types built from OBJECT values.

use std::any::type_name;
use std::fmt;

use super::convert::FromStructured;
use super::Projector;
use crate::error::Result;
use crate::types::{HostValue, RecordValue, StructuredValue};

/// A user type that can be populated from an OBJECT value.
///
/// Instances come from the constructor registered in `ObjectFactories`, or
/// from `Default` when none is registered. Either way `set_field` is then
/// called once per declared field, in declaration order. Names the record
/// does not know should be ignored; fields never set keep their initial
/// value.
///
/// # Example
///
/// ```
/// use snowflake_structured_rs::{FieldValue, Result, StructuredRecord};
///
/// #[derive(Default)]
/// struct SimpleClass {
///     string: Option<String>,
///     int_value: Option<i32>,
/// }
///
/// impl StructuredRecord for SimpleClass {
///     fn set_field(&mut self, name: &str, value: FieldValue<'_>) -> Result<()> {
///         match name {
///             "string" => self.string = value.read()?,
///             "intValue" => self.int_value = value.read()?,
///             _ => {}
///         }
///         Ok(())
///     }
/// }
/// ```
pub trait StructuredRecord: Default + Send + 'static {
    /// Populate one field from its decoded value.
    fn set_field(&mut self, name: &str, value: FieldValue<'_>) -> Result<()>;
}

/// Decoded value of one record field, ready to be read as a host type.
pub struct FieldValue<'p> {
    node: StructuredValue,
    projector: &'p Projector<'p>,
}

impl<'p> FieldValue<'p> {
    /// Create a field value projected with `projector`.
    pub fn new(node: StructuredValue, projector: &'p Projector<'p>) -> Self {
        Self { node, projector }
    }

    /// Read the field as `T`; NULL gives `None`.
    pub fn read<T: FromStructured>(self) -> Result<Option<T>> {
        self.projector.project_as(self.node)
    }

    /// Read the field as `T`, using `T::default()` for NULL.
    pub fn read_or_default<T: FromStructured + Default>(self) -> Result<T> {
        Ok(self.read()?.unwrap_or_default())
    }

    /// Check if the field is NULL.
    pub fn is_null(&self) -> bool {
        self.node.is_null()
    }

    /// Decoded value.
    pub fn value(&self) -> &StructuredValue {
        &self.node
    }
}

impl fmt::Debug for FieldValue<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("FieldValue").field(&self.node).finish()
    }
}

type BuildFn = for<'a> fn(&Projector<'a>, Vec<(String, StructuredValue)>) -> Result<HostValue>;

/// Record target: how to build one record type.
#[derive(Clone, Copy)]
pub struct RecordTarget {
    type_name: &'static str,
    build: BuildFn,
}

impl RecordTarget {
    /// Target for record type `T`.
    pub fn of<T: StructuredRecord>() -> Self {
        Self {
            type_name: type_name::<T>(),
            build: build_record::<T>,
        }
    }

    /// Name of the record type.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub(crate) fn build(
        &self,
        projector: &Projector<'_>,
        fields: Vec<(String, StructuredValue)>,
    ) -> Result<HostValue> {
        (self.build)(projector, fields)
    }
}

impl fmt::Debug for RecordTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordTarget")
            .field("type_name", &self.type_name)
            .finish()
    }
}

/// Instantiate `T` and populate it. The registered constructor and the
/// `Default` fallback share the population loop.
fn build_record<T: StructuredRecord>(
    projector: &Projector<'_>,
    fields: Vec<(String, StructuredValue)>,
) -> Result<HostValue> {
    let mut record = match projector.factories().create::<T>() {
        Some(record) => record,
        None => {
            tracing::debug!(
                record = type_name::<T>(),
                "No factory registered, constructing with Default"
            );
            T::default()
        }
    };

    for (name, node) in fields {
        record.set_field(&name, FieldValue::new(node, projector))?;
    }

    Ok(HostValue::Record(RecordValue::new(record)))
}
