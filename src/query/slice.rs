//! Predicate-first calling convention.
//!
//! ```text
//! table.slice(cols)?.select_where(op)      SELECT cols FROM table WHERE op
//! table.slice(cols)?.select_all()          SELECT cols FROM table
//! table.select_where(op)                   every column, WHERE op
//! table.select_batched(n, op)?             keyset-paginated execution
//! query.adjust_slice(|t| t.slice(cols))?   same query, new projection
//! ```

use crate::error::BuildError;
use crate::expression::Op;
use crate::query::batch::BatchedQuery;
use crate::query::Query;
use crate::schema::{Column, Table};

/// A source table together with the fields to return from it
pub trait FieldSet {
    fn source(&self) -> &Table;

    fn fields(&self) -> Vec<Column>;

    fn select_where(&self, predicate: Op) -> Query {
        Query::over(self.source().clone(), self.fields()).with_predicate(Some(predicate))
    }

    fn select_batched(&self, batch_size: usize, predicate: Op) -> Result<BatchedQuery, BuildError> {
        BatchedQuery::new(self.select_where(predicate), batch_size)
    }

    fn select_all_batched(&self, batch_size: usize) -> Result<BatchedQuery, BuildError> {
        BatchedQuery::new(Query::over(self.source().clone(), self.fields()), batch_size)
    }
}

impl FieldSet for Table {
    fn source(&self) -> &Table {
        self
    }

    fn fields(&self) -> Vec<Column> {
        self.columns().to_vec()
    }
}

/// Subset of a table's columns
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slice {
    table: Table,
    columns: Vec<Column>,
}

impl Slice {
    /// Query returning the slice's fields without a predicate
    pub fn select_all(&self) -> Query {
        Query::over(self.table.clone(), self.columns.clone())
    }
}

impl FieldSet for Slice {
    fn source(&self) -> &Table {
        &self.table
    }

    fn fields(&self) -> Vec<Column> {
        self.columns.clone()
    }
}

impl Table {
    pub fn slice(&self, columns: impl IntoIterator<Item = Column>) -> Result<Slice, BuildError> {
        let columns: Vec<Column> = columns.into_iter().collect();
        self.check_projection(&columns)?;
        Ok(Slice {
            table: self.clone(),
            columns,
        })
    }
}

impl Query {
    /// Replace the projection with the fields of the slice `f` builds
    pub fn adjust_slice(
        self,
        f: impl FnOnce(&Table) -> Result<Slice, BuildError>,
    ) -> Result<Self, BuildError> {
        let slice = f(self.table())?;
        self.with_projection(slice.columns)
    }
}
