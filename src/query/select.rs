//! Projection-first calling convention.
//!
//! ```text
//! table.select(cols)?.filter(op)        SELECT cols FROM table WHERE op
//! table.select_all().filter(op)         SELECT * columns ... WHERE op
//! query.adjust_select(|t| cols)?        same query, new projection
//! query.fetch_batched_results(n)?       keyset-paginated execution
//! ```

use crate::error::BuildError;
use crate::expression::Op;
use crate::query::batch::BatchedQuery;
use crate::query::Query;
use crate::schema::{Column, Table};

impl Table {
    /// Query projecting the given columns of this table
    pub fn select(&self, columns: impl IntoIterator<Item = Column>) -> Result<Query, BuildError> {
        let columns: Vec<Column> = columns.into_iter().collect();
        self.check_projection(&columns)?;
        Ok(Query::over(self.clone(), columns))
    }

    /// Query projecting every column of this table
    pub fn select_all(&self) -> Query {
        Query::over(self.clone(), self.columns().to_vec())
    }
}

impl Query {
    /// Set the WHERE predicate, replacing any previous one
    pub fn filter(self, predicate: Op) -> Self {
        self.with_predicate(Some(predicate))
    }

    /// AND the predicate onto the current one
    pub fn and_filter(self, predicate: Op) -> Self {
        self.adjust_where(|current| {
            Some(match current {
                Some(current) => current.and(predicate),
                None => predicate,
            })
        })
    }

    /// OR the predicate onto the current one
    pub fn or_filter(self, predicate: Op) -> Self {
        self.adjust_where(|current| {
            Some(match current {
                Some(current) => current.or(predicate),
                None => predicate,
            })
        })
    }

    /// Replace the projection with the columns `f` picks from the source table
    pub fn adjust_select(self, f: impl FnOnce(&Table) -> Vec<Column>) -> Result<Self, BuildError> {
        let projection = f(self.table());
        self.with_projection(projection)
    }

    pub fn fetch_batched_results(self, batch_size: usize) -> Result<BatchedQuery, BuildError> {
        BatchedQuery::new(self, batch_size)
    }
}
