//! Single-row INSERT.

use crate::emit::{SqlRenderer, Statement};
use crate::error::{BuildError, Result};
use crate::schema::{Column, ColumnType, Table};
use crate::session::Session;
use crate::value::Value;

/// Values for one new row of a table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Insert {
    table: Table,
    values: Vec<(Column, Value)>,
}

impl Insert {
    pub fn new(table: &Table) -> Self {
        Self {
            table: table.clone(),
            values: Vec::new(),
        }
    }

    /// Assign a column; the value is checked and encoded immediately.
    /// Assigning a column twice keeps the latest value.
    pub fn set(mut self, column: &Column, value: impl Into<Value>) -> std::result::Result<Self, BuildError> {
        self.table.check_columns([column])?;
        let value = value.into();
        if value.is_null() && !column.is_nullable() {
            return Err(BuildError::NullNotAllowed {
                table: column.table_name().to_string(),
                column: column.name().to_string(),
            });
        }
        if column.transform().is_none() {
            check_length(column, &value)?;
        }
        let stored = column.to_stored(value)?;

        match self.values.iter_mut().find(|(c, _)| c == column) {
            Some(slot) => slot.1 = stored,
            None => self.values.push((column.clone(), stored)),
        }
        Ok(self)
    }

    /// Fail when a NOT NULL column without a generated value is unassigned
    fn check_complete(&self) -> std::result::Result<(), BuildError> {
        for column in self.table.columns() {
            if column.is_nullable() || column.is_auto_increment() {
                continue;
            }
            if !self.values.iter().any(|(c, _)| c == column) {
                return Err(BuildError::NullNotAllowed {
                    table: column.table_name().to_string(),
                    column: column.name().to_string(),
                });
            }
        }
        Ok(())
    }

    /// Values in table declaration order
    fn ordered_values(&self) -> Vec<(Column, Value)> {
        self.table
            .columns()
            .iter()
            .filter_map(|column| {
                self.values
                    .iter()
                    .find(|(c, _)| c == column)
                    .cloned()
            })
            .collect()
    }

    pub fn statement(&self, renderer: &SqlRenderer) -> std::result::Result<Statement, BuildError> {
        self.check_complete()?;
        Ok(renderer.insert(&self.table, &self.ordered_values()))
    }

    /// Execute and return the generated key, if the table has one
    pub fn execute(&self, session: &Session) -> Result<Option<Value>> {
        let statement = self.statement(&SqlRenderer::new(session.dialect()))?;
        let outcome = session.execute(&statement)?;
        Ok(outcome.generated_key)
    }
}

impl Table {
    pub fn insert(&self) -> Insert {
        Insert::new(self)
    }
}

fn check_length(column: &Column, value: &Value) -> std::result::Result<(), BuildError> {
    let (max, actual) = match (column.column_type(), value) {
        (ColumnType::Varchar(max), Value::String(s)) => (max, s.chars().count()),
        (ColumnType::Binary(Some(max)), Value::Bytes(b)) => (max, b.len()),
        _ => return Ok(()),
    };
    if actual > max as usize {
        return Err(BuildError::ValueTooLong {
            table: column.table_name().to_string(),
            column: column.name().to_string(),
            max,
            actual,
        });
    }
    Ok(())
}
