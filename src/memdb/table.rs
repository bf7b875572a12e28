//! Row storage of the in-memory backend.

use crate::schema::Table;
use crate::value::{DataType, Value};
use anyhow::{bail, Result};

#[derive(Debug, Clone)]
pub struct MemColumn {
    pub name: String,
    pub data_type: DataType,
    pub nullable: bool,
    pub auto_increment: bool,
}

#[derive(Debug, Clone)]
pub struct MemTable {
    pub columns: Vec<MemColumn>,
    pub rows: Vec<Vec<Value>>,
    next_id: i64,
}

impl MemTable {
    pub fn from_table(table: &Table) -> Self {
        let columns = table
            .columns()
            .iter()
            .map(|c| MemColumn {
                name: c.name().to_string(),
                data_type: c.stored_type(),
                nullable: c.is_nullable(),
                auto_increment: c.is_auto_increment(),
            })
            .collect();
        Self {
            columns,
            rows: Vec::new(),
            next_id: 1,
        }
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    /// Append a row from `(column, value)` assignments; returns the generated key
    pub fn insert(&mut self, assignments: Vec<(String, Value)>) -> Result<Option<Value>> {
        let mut row = vec![Value::Null; self.columns.len()];
        let mut assigned = vec![false; self.columns.len()];

        for (name, value) in assignments {
            let Some(index) = self.columns.iter().position(|c| c.name.eq_ignore_ascii_case(&name)) else {
                bail!("Unknown column {}", name);
            };
            if assigned[index] {
                bail!("Column {} assigned twice", name);
            }
            assigned[index] = true;
            row[index] = coerce(&self.columns[index], value)?;
        }

        let mut generated = None;
        for (index, column) in self.columns.iter().enumerate() {
            if column.auto_increment {
                match row[index].as_i64() {
                    Some(explicit) => self.next_id = self.next_id.max(explicit + 1),
                    None => {
                        let id = self.next_id;
                        self.next_id += 1;
                        row[index] = coerce(column, Value::Int64(id))?;
                        generated = Some(row[index].clone());
                    }
                }
            }
            if row[index].is_null() && !column.nullable {
                bail!("NULL value in column {} violates NOT NULL constraint", column.name);
            }
        }

        self.rows.push(row);
        Ok(generated)
    }
}

/// Check a value against the column type, narrowing integers to the declared width
fn coerce(column: &MemColumn, value: Value) -> Result<Value> {
    if !value.is_compatible_with(column.data_type) {
        bail!(
            "Value {} is not compatible with column {} of type {:?}",
            value,
            column.name,
            column.data_type
        );
    }
    match (column.data_type, value) {
        (DataType::Int32, Value::Int64(v)) => match i32::try_from(v) {
            Ok(v) => Ok(Value::Int32(v)),
            Err(_) => bail!("Value {} out of range for column {}", v, column.name),
        },
        (DataType::Int64, Value::Int32(v)) => Ok(Value::Int64(v as i64)),
        (_, value) => Ok(value),
    }
}
