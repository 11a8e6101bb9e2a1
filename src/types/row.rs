//! Row type for query results.
//!
//! Cells are kept raw and decoded on access, so a row can be read through
//! any number of accessors and each call decodes and projects afresh.

use std::sync::Arc;

use indexmap::IndexMap;

use super::column::FieldSchema;
use super::host::HostValue;
use super::value::StructuredValue;
use crate::decode::{decode_column, RawValue};
use crate::error::{Error, Result};
use crate::project::{FromStructured, Projector, RenderStyle, Target};
use crate::result::ResultContext;

/// A row of query results.
#[derive(Debug, Clone)]
pub struct Row {
    /// Raw cell values.
    values: Vec<RawValue>,
    /// Shared result context (reference counted).
    context: Arc<ResultContext>,
}

impl Row {
    /// Create a new row with raw values and the shared result context.
    pub fn new(values: Vec<RawValue>, context: Arc<ResultContext>) -> Self {
        Self { values, context }
    }

    /// Get the raw value by column index (0-based).
    pub fn get(&self, index: usize) -> Option<&RawValue> {
        self.values.get(index)
    }

    /// Get the number of columns.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if the row is empty.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Get column schemas.
    pub fn columns(&self) -> &[FieldSchema] {
        &self.context.columns.columns
    }

    /// Get column names.
    pub fn column_names(&self) -> Vec<&str> {
        self.context.columns.column_names()
    }

    /// Find a column index by name (case-insensitive).
    pub fn column_index(&self, name: &str) -> Result<usize> {
        self.context
            .columns
            .find_by_name(name)
            .ok_or_else(|| Error::ColumnNotFound {
                name: name.to_string(),
            })
    }

    /// Iterate over raw values.
    pub fn iter(&self) -> impl Iterator<Item = &RawValue> {
        self.values.iter()
    }

    fn projector(&self) -> Projector<'_> {
        self.context.projector()
    }

    /// Decode a column into its value tree.
    ///
    /// # Errors
    /// Returns `Error::ColumnIndexOutOfBounds` for an unknown index and
    /// `Error::Decode` when the cell does not match its schema.
    pub fn get_value(&self, index: usize) -> Result<StructuredValue> {
        let out_of_bounds = || Error::ColumnIndexOutOfBounds {
            index,
            count: self.values.len(),
        };
        let raw = self.values.get(index).ok_or_else(out_of_bounds)?;
        let schema = self.context.columns.get(index).ok_or_else(out_of_bounds)?;
        decode_column(raw, schema, self.context.format)
    }

    /// Read a column as `T`; NULL gives `None`.
    ///
    /// # Example
    ///
    /// ```
    /// use std::sync::Arc;
    /// use snowflake_structured_rs::types::{ColumnInfo, FieldSchema};
    /// use snowflake_structured_rs::{ObjectFactories, QueryResult, ResultContext, SessionSettings};
    ///
    /// let columns = ColumnInfo::new(vec![FieldSchema::parse("C", "ARRAY(INTEGER)").unwrap()]);
    /// let context = ResultContext::new(columns, SessionSettings::new(), Arc::new(ObjectFactories::new()));
    /// let rowset = serde_json::json!([["[1,2,3]"]]);
    /// let result = QueryResult::from_json_rowset(Arc::new(context), &rowset).unwrap();
    ///
    /// let values: Option<Vec<Option<i64>>> = result.rows()[0].get_as(0).unwrap();
    /// assert_eq!(values, Some(vec![Some(1), Some(2), Some(3)]));
    /// ```
    pub fn get_as<T: FromStructured>(&self, index: usize) -> Result<Option<T>> {
        let value = self.get_value(index)?;
        self.projector().project_as(value)
    }

    /// Read an ARRAY column as a boxed slice of `T`.
    pub fn get_array_as<T: FromStructured>(&self, index: usize) -> Result<Option<Box<[Option<T>]>>> {
        Ok(self.get_list_as(index)?.map(Vec::into_boxed_slice))
    }

    /// Read an ARRAY column as a list of `T`.
    pub fn get_list_as<T: FromStructured>(&self, index: usize) -> Result<Option<Vec<Option<T>>>> {
        self.get_as::<Vec<Option<T>>>(index)
    }

    /// Read a MAP or OBJECT column as an ordered map of `T`.
    pub fn get_map_as<T: FromStructured>(
        &self,
        index: usize,
    ) -> Result<Option<IndexMap<String, Option<T>>>> {
        self.get_as::<IndexMap<String, Option<T>>>(index)
    }

    /// Read a column without a requested type.
    ///
    /// In text formats OBJECT columns give their pretty-printed JSON text;
    /// native Arrow results reject OBJECT and MAP columns with
    /// `Error::UnsupportedProjection`.
    pub fn get_object(&self, index: usize) -> Result<HostValue> {
        let value = self.get_value(index)?;
        self.projector().project_untyped(value)
    }

    /// Read a column as a generic map. Rejected for native Arrow results.
    pub fn get_object_map(&self, index: usize) -> Result<HostValue> {
        let value = self.get_value(index)?;
        self.projector().project_object_map(value)
    }

    /// Read an ARRAY column as generic elements.
    pub fn get_array(&self, index: usize) -> Result<Option<Vec<HostValue>>> {
        match self.get_value(index)? {
            StructuredValue::Null => Ok(None),
            value @ StructuredValue::Array(_) => {
                match self.projector().project(value, &Target::Generic)? {
                    HostValue::Array(items) => Ok(Some(items)),
                    other => Err(Error::type_mismatch("array", other.kind())),
                }
            }
            value => Err(Error::type_mismatch("array", value.kind())),
        }
    }

    /// Read a column as text. Containers render as single-line JSON.
    pub fn get_string(&self, index: usize) -> Result<Option<String>> {
        match self.get_value(index)? {
            StructuredValue::Null => Ok(None),
            value => self.projector().render(&value, RenderStyle::Compact).map(Some),
        }
    }
}

impl IntoIterator for Row {
    type Item = RawValue;
    type IntoIter = std::vec::IntoIter<RawValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.into_iter()
    }
}

impl<'a> IntoIterator for &'a Row {
    type Item = &'a RawValue;
    type IntoIter = std::slice::Iter<'a, RawValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.iter()
    }
}
