//! Keyset-paginated execution of a query.

use crate::cursor::BatchedCursor;
use crate::error::{BuildError, Result};
use crate::query::{Query, SortOrder};
use crate::row::ResultRow;
use crate::schema::Column;
use crate::session::Session;
use crate::value::Value;

/// A query executed as a sequence of batches of at most `batch_size` rows.
///
/// Every batch is rendered as
/// `<query> [AND key > last] ORDER BY key ASC LIMIT batch_size`
/// where `key` is the table's auto-increment integer column and `last` is
/// the key of the final row of the previous batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchedQuery {
    query: Query,
    key: Column,
    key_index: usize,
    batch_size: usize,
}

impl BatchedQuery {
    pub(crate) fn new(query: Query, batch_size: usize) -> std::result::Result<Self, BuildError> {
        if batch_size == 0 {
            return Err(BuildError::InvalidBatchSize);
        }
        if !query.ordering().is_empty() || query.row_limit().is_some() {
            return Err(BuildError::BatchOrdering {
                table: query.table().name().to_string(),
            });
        }
        let key = query
            .table()
            .batch_key()
            .cloned()
            .ok_or_else(|| BuildError::NoBatchKey {
                table: query.table().name().to_string(),
            })?;

        let mut projection = query.projection().to_vec();
        let key_index = match projection.iter().position(|c| c == &key) {
            Some(index) => index,
            None => {
                projection.push(key.clone());
                projection.len() - 1
            }
        };
        let query = query.with_projection(projection)?;

        Ok(Self {
            query,
            key,
            key_index,
            batch_size,
        })
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn key(&self) -> &Column {
        &self.key
    }

    /// Query with the key appended to the projection when it was missing
    pub fn query(&self) -> &Query {
        &self.query
    }

    pub(crate) fn key_index(&self) -> usize {
        self.key_index
    }

    /// Query fetching the batch that follows the row with key `after`
    pub fn batch(&self, after: Option<&Value>) -> std::result::Result<Query, BuildError> {
        let query = match after {
            Some(last) => self.query.clone().and_filter(self.key.greater_than(last.clone())?),
            None => self.query.clone(),
        };
        Ok(query
            .order_by(&self.key, SortOrder::Asc)
            .limit(self.batch_size as u64))
    }

    /// Stream every row batch by batch
    pub fn iter<'s>(&self, session: &'s Session) -> BatchedCursor<'s> {
        BatchedCursor::new(self.clone(), session)
    }

    /// Collect the rows of every batch, one vector per batch
    pub fn batches(&self, session: &Session) -> Result<Vec<Vec<ResultRow>>> {
        let mut batches = Vec::new();
        let mut last = None;
        loop {
            let rows = self.batch(last.as_ref())?.to_vec(session)?;
            let full = rows.len() == self.batch_size;
            if let Some(row) = rows.last() {
                last = row.raw(self.key_index).cloned();
            }
            if !rows.is_empty() {
                batches.push(rows);
            }
            if !full {
                return Ok(batches);
            }
        }
    }
}
