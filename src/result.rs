//! Query result assembly.
//!
//! A `QueryResult` pairs raw rows with the context every row shares: the
//! column schemas, the result format, the session settings and the record
//! factories. Rows come either from a JSON rowset or from Arrow batches.

use std::sync::Arc;

use arrow::array::Array;
use arrow::record_batch::RecordBatch;
use serde_json::Value;

use crate::decode::RawValue;
use crate::error::{Error, Result};
use crate::project::Projector;
use crate::registry::ObjectFactories;
use crate::session::{ResultFormat, SessionSettings};
use crate::types::{ColumnInfo, Row};

/// State shared by all rows of one result.
#[derive(Debug)]
pub struct ResultContext {
    /// Column schemas.
    pub columns: ColumnInfo,
    /// Encoding of the result's cells.
    pub format: ResultFormat,
    /// Session settings in effect for the result.
    pub settings: SessionSettings,
    /// Record factories of the owning session.
    pub factories: Arc<ObjectFactories>,
}

impl ResultContext {
    /// Create a context; the result format follows the session settings.
    pub fn new(
        columns: ColumnInfo,
        settings: SessionSettings,
        factories: Arc<ObjectFactories>,
    ) -> Self {
        Self {
            columns,
            format: settings.result_format(),
            settings,
            factories,
        }
    }

    /// Override the result format.
    pub fn with_format(mut self, format: ResultFormat) -> Self {
        self.format = format;
        self
    }

    /// Projector over this context.
    pub fn projector(&self) -> Projector<'_> {
        Projector::new(&self.settings, &self.factories, self.format)
    }
}

/// Rows of a query result.
#[derive(Debug, Clone)]
pub struct QueryResult {
    /// Shared result context.
    pub context: Arc<ResultContext>,
    /// Rows returned.
    pub rows: Vec<Row>,
}

impl QueryResult {
    /// Build a result from a JSON rowset: an array of rows, each an array of
    /// cell strings or nulls.
    ///
    /// # Errors
    /// Returns `Error::Decode` when the rowset is not an array of arrays, a
    /// cell is neither string nor null, or a row's width differs from the
    /// column count.
    pub fn from_json_rowset(context: Arc<ResultContext>, rowset: &Value) -> Result<Self> {
        let rows = rowset
            .as_array()
            .ok_or_else(|| Error::decode("Rowset must be a JSON array"))?;
        let width = context.columns.len();

        let rows = rows
            .iter()
            .enumerate()
            .map(|(i, row)| {
                let cells = row
                    .as_array()
                    .ok_or_else(|| Error::decode(format!("Row {} is not a JSON array", i)))?;
                if cells.len() != width {
                    return Err(Error::decode(format!(
                        "Row {} has {} cells, expected {}",
                        i,
                        cells.len(),
                        width
                    )));
                }
                let values = cells
                    .iter()
                    .map(|cell| match cell {
                        Value::Null => Ok(RawValue::Null),
                        Value::String(text) => Ok(RawValue::Text(text.clone())),
                        other => Err(Error::decode(format!(
                            "Row {} has a non-string cell: {}",
                            i, other
                        ))),
                    })
                    .collect::<Result<Vec<_>>>()?;
                Ok(Row::new(values, Arc::clone(&context)))
            })
            .collect::<Result<Vec<_>>>()?;

        tracing::debug!(rows = rows.len(), columns = width, "Assembled JSON rowset");
        Ok(Self { context, rows })
    }

    /// Build a result from Arrow record batches, one row per batch row.
    ///
    /// # Errors
    /// Returns `Error::Decode` when a batch's column count differs from the
    /// schema.
    pub fn from_record_batches(context: Arc<ResultContext>, batches: &[RecordBatch]) -> Result<Self> {
        let width = context.columns.len();
        let mut rows = Vec::with_capacity(batches.iter().map(RecordBatch::num_rows).sum());

        for (i, batch) in batches.iter().enumerate() {
            if batch.num_columns() != width {
                return Err(Error::decode(format!(
                    "Batch {} has {} columns, expected {}",
                    i,
                    batch.num_columns(),
                    width
                )));
            }
            for row in 0..batch.num_rows() {
                let values = batch
                    .columns()
                    .iter()
                    .map(|array| {
                        if array.is_null(row) {
                            RawValue::Null
                        } else {
                            RawValue::Columnar {
                                array: Arc::clone(array),
                                row,
                            }
                        }
                    })
                    .collect();
                rows.push(Row::new(values, Arc::clone(&context)));
            }
        }

        tracing::debug!(
            rows = rows.len(),
            batches = batches.len(),
            format = ?context.format,
            "Assembled Arrow result"
        );
        Ok(Self { context, rows })
    }

    /// Get the number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Check if the result is empty.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Get rows.
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Get column names.
    pub fn column_names(&self) -> Vec<&str> {
        self.context.columns.column_names()
    }

    /// Iterate over rows.
    pub fn iter(&self) -> impl Iterator<Item = &Row> {
        self.rows.iter()
    }
}

impl IntoIterator for QueryResult {
    type Item = Row;
    type IntoIter = std::vec::IntoIter<Row>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.into_iter()
    }
}

impl<'a> IntoIterator for &'a QueryResult {
    type Item = &'a Row;
    type IntoIter = std::slice::Iter<'a, Row>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}
