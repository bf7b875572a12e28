//! Query intermediate representation and execution.
//!
//! A [`Query`] is an immutable description of a single-table SELECT: source
//! table, ordered projection, DISTINCT flag, optional predicate, ordering and
//! row limit. It can be reached through two calling conventions:
//!
//! - **predicate-first** ([`slice`]): pick a field set, then attach a predicate
//!   (`table.slice(cols)?.select_where(op)`)
//! - **projection-first** ([`select`]): pick a projection, then refine it
//!   (`table.select(cols)?.filter(op)`)
//!
//! Both conventions call the same constructors below, so equivalent intent
//! yields structurally equal `Query` values and therefore identical SQL.

pub mod batch;
pub mod select;
pub mod slice;

use crate::cursor::Cursor;
use crate::emit::{Dialect, SqlRenderer, Statement};
use crate::error::{BuildError, DecodeError, EmitError, Error, Result};
use crate::expression::Op;
use crate::row::ResultRow;
use crate::schema::{Column, Table};
use crate::session::Session;
use crate::value::Value;
use std::sync::Arc;

pub use batch::BatchedQuery;
pub use slice::{FieldSet, Slice};

/// Sort direction of an ORDER BY entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortOrder {
    Asc,
    Desc,
}

/// Row limit with optional offset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Limit {
    pub count: u64,
    pub offset: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    table: Table,
    projection: Vec<Column>,
    distinct: bool,
    predicate: Option<Op>,
    order_by: Vec<(Column, SortOrder)>,
    limit: Option<Limit>,
}

impl Query {
    /// Shared constructor of both calling conventions; the projection must
    /// already be validated against the table.
    pub(crate) fn over(table: Table, projection: Vec<Column>) -> Self {
        Self {
            table,
            projection,
            distinct: false,
            predicate: None,
            order_by: Vec::new(),
            limit: None,
        }
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    pub fn projection(&self) -> &[Column] {
        &self.projection
    }

    pub fn is_distinct(&self) -> bool {
        self.distinct
    }

    pub fn predicate(&self) -> Option<&Op> {
        self.predicate.as_ref()
    }

    pub fn ordering(&self) -> &[(Column, SortOrder)] {
        &self.order_by
    }

    pub fn row_limit(&self) -> Option<Limit> {
        self.limit
    }

    /// Replace the predicate
    pub(crate) fn with_predicate(mut self, predicate: Option<Op>) -> Self {
        self.predicate = predicate;
        self
    }

    /// Replace the projection after validating it against the table
    pub(crate) fn with_projection(
        mut self,
        projection: Vec<Column>,
    ) -> std::result::Result<Self, BuildError> {
        self.table.check_projection(&projection)?;
        self.projection = projection;
        Ok(self)
    }

    /// Replace the predicate with the result of `f` applied to the current one
    pub fn adjust_where(self, f: impl FnOnce(Option<Op>) -> Option<Op>) -> Self {
        let predicate = f(self.predicate.clone());
        self.with_predicate(predicate)
    }

    pub fn with_distinct(mut self, distinct: bool) -> Self {
        self.distinct = distinct;
        self
    }

    /// Append an ORDER BY entry
    pub fn order_by(mut self, column: &Column, order: SortOrder) -> Self {
        self.order_by.push((column.clone(), order));
        self
    }

    pub fn limit(self, count: u64) -> Self {
        self.limit_offset(count, 0)
    }

    pub fn limit_offset(mut self, count: u64, offset: u64) -> Self {
        self.limit = Some(Limit { count, offset });
        self
    }

    /// Render for the given dialect
    pub fn statement(&self, dialect: Dialect) -> std::result::Result<Statement, EmitError> {
        SqlRenderer::new(dialect).select(self)
    }

    /// Execute and stream the resulting rows
    pub fn iter(&self, session: &Session) -> Result<Cursor> {
        let statement = self.statement(session.dialect())?;
        let stream = session.open(&statement)?;
        Ok(Cursor::new(Arc::from(self.projection.clone()), stream))
    }

    pub fn to_vec(&self, session: &Session) -> Result<Vec<ResultRow>> {
        self.iter(session)?.collect()
    }

    /// Number of rows the query returns
    pub fn count(&self, session: &Session) -> Result<u64> {
        let statement = SqlRenderer::new(session.dialect()).count(self)?;
        let mut stream = session.open(&statement)?;
        let row = stream.next_row();
        stream.close();
        match row? {
            Some(values) => match values.first().and_then(Value::as_i64) {
                Some(count) => Ok(count.max(0) as u64),
                None => Err(DecodeError::Conversion {
                    table: self.table.name().to_string(),
                    column: "COUNT(*)".to_string(),
                    value: values.into_iter().next().unwrap_or(Value::Null),
                    target: "integer",
                }
                .into()),
            },
            None => Ok(0),
        }
    }

    /// Whether the query returns no rows; fetches at most one row
    pub fn empty(&self, session: &Session) -> Result<bool> {
        Ok(self.first(session)?.is_none())
    }

    pub fn first(&self, session: &Session) -> Result<Option<ResultRow>> {
        let (count, offset) = match self.limit {
            Some(l) => (l.count.min(1), l.offset),
            None => (1, 0),
        };
        if count == 0 {
            return Ok(None);
        }
        let mut cursor = self.clone().limit_offset(count, offset).iter(session)?;
        cursor.next().transpose()
    }

    /// The only row of the result; fails unless exactly one row is returned
    pub fn single(&self, session: &Session) -> Result<ResultRow> {
        let offset = self.limit.map(|l| l.offset).unwrap_or(0);
        let count = self.limit.map(|l| l.count.min(2)).unwrap_or(2);
        let mut rows = self.clone().limit_offset(count, offset).to_vec(session)?;
        match rows.len() {
            1 => Ok(rows.remove(0)),
            count => Err(Error::NotSingle { count }),
        }
    }
}
