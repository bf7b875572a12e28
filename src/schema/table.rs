//! Table descriptors.

use crate::error::BuildError;
use crate::schema::column::{Column, ColumnDef};
use std::collections::HashSet;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

#[derive(Debug)]
struct TableDef {
    name: Arc<str>,
    columns: Vec<Column>,
    batch_key: Option<usize>,
}

/// Immutable, shareable table descriptor. Identity is the table name.
#[derive(Clone)]
pub struct Table {
    inner: Arc<TableDef>,
}

impl Table {
    pub fn builder(name: impl Into<String>) -> TableBuilder {
        TableBuilder {
            name: name.into(),
            columns: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn columns(&self) -> &[Column] {
        &self.inner.columns
    }

    /// Look up a column by name
    pub fn column(&self, name: &str) -> Result<Column, BuildError> {
        self.inner
            .columns
            .iter()
            .find(|c| c.name() == name)
            .cloned()
            .ok_or_else(|| BuildError::UnknownColumn {
                table: self.name().to_string(),
                column: name.to_string(),
            })
    }

    /// Whether the column is one this table declares
    pub fn contains(&self, column: &Column) -> bool {
        column.table_name() == self.name() && self.inner.columns.contains(column)
    }

    /// Auto-increment integer column used for keyset pagination
    pub fn batch_key(&self) -> Option<&Column> {
        self.inner.batch_key.map(|i| &self.inner.columns[i])
    }

    /// Fail unless every column belongs to this table
    pub(crate) fn check_columns<'a>(
        &self,
        columns: impl IntoIterator<Item = &'a Column>,
    ) -> Result<(), BuildError> {
        for column in columns {
            if !self.contains(column) {
                return Err(BuildError::ColumnNotInTable {
                    table: column.table_name().to_string(),
                    column: column.name().to_string(),
                    target: self.name().to_string(),
                });
            }
        }
        Ok(())
    }

    /// Non-empty list of columns of this table
    pub(crate) fn check_projection(&self, columns: &[Column]) -> Result<(), BuildError> {
        if columns.is_empty() {
            return Err(BuildError::EmptyProjection {
                table: self.name().to_string(),
            });
        }
        self.check_columns(columns)
    }
}

impl PartialEq for Table {
    fn eq(&self, other: &Self) -> bool {
        self.inner.name == other.inner.name
    }
}

impl Eq for Table {}

impl Hash for Table {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.inner.name.hash(state);
    }
}

impl fmt::Debug for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Table")
            .field("name", &self.inner.name)
            .field("columns", &self.inner.columns)
            .finish()
    }
}

/// Collects column declarations for a new [`Table`]
pub struct TableBuilder {
    name: String,
    columns: Vec<ColumnDef>,
}

impl TableBuilder {
    pub fn column(mut self, def: ColumnDef) -> Self {
        self.columns.push(def);
        self
    }

    pub fn build(self) -> Result<Table, BuildError> {
        if self.columns.is_empty() {
            return Err(BuildError::EmptyTable { table: self.name });
        }

        let mut seen = HashSet::new();
        for def in &self.columns {
            if !seen.insert(def.name.clone()) {
                return Err(BuildError::DuplicateColumn {
                    table: self.name.clone(),
                    column: def.name.clone(),
                });
            }
        }

        let batch_key = self
            .columns
            .iter()
            .position(|d| d.auto_increment && d.column_type.is_integer());

        let name: Arc<str> = Arc::from(self.name);
        let columns = self
            .columns
            .into_iter()
            .map(|def| Column::new(name.clone(), def))
            .collect();

        Ok(Table {
            inner: Arc::new(TableDef {
                name,
                columns,
                batch_key,
            }),
        })
    }
}
