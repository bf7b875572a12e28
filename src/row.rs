//! Result rows.

use crate::error::DecodeError;
use crate::schema::Column;
use crate::value::{FromValue, Value};
use std::any::type_name;
use std::sync::Arc;

/// One row of a result, holding stored values in projection order
#[derive(Debug, Clone, PartialEq)]
pub struct ResultRow {
    columns: Arc<[Column]>,
    values: Vec<Value>,
}

impl ResultRow {
    pub(crate) fn new(columns: Arc<[Column]>, values: Vec<Value>) -> Self {
        Self { columns, values }
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Stored value at a projection position
    pub fn raw(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// Decoded value of a projected column
    pub fn value(&self, column: &Column) -> Result<Value, DecodeError> {
        let index = self
            .columns
            .iter()
            .position(|c| c == column)
            .ok_or_else(|| DecodeError::MissingColumn {
                table: column.table_name().to_string(),
                column: column.name().to_string(),
            })?;
        let stored = &self.values[index];

        // Use the projected descriptor; it carries the transform
        let projected = &self.columns[index];
        match projected.transform() {
            Some(transform) => transform
                .decode(stored)
                .map_err(|source| DecodeError::Transform {
                    table: projected.table_name().to_string(),
                    column: projected.name().to_string(),
                    source,
                }),
            None => Ok(stored.clone()),
        }
    }

    /// Decoded value converted to `T`
    pub fn get<T: FromValue>(&self, column: &Column) -> Result<T, DecodeError> {
        let value = self.value(column)?;
        T::from_value(value).map_err(|value| DecodeError::Conversion {
            table: column.table_name().to_string(),
            column: column.name().to_string(),
            value,
            target: type_name::<T>(),
        })
    }

    /// Every decoded value in projection order
    pub fn decoded(&self) -> Result<Vec<Value>, DecodeError> {
        self.columns.iter().map(|c| self.value(c)).collect()
    }
}
