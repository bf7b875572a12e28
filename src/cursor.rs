//! Result cursors.
//!
//! A [`Cursor`] owns the backend stream of one executed SELECT and releases
//! it exactly once: when the stream is exhausted, when it fails, on an
//! explicit [`Cursor::close`] or when the cursor is dropped.

use crate::backend::RowStream;
use crate::error::{DecodeError, Error, Result};
use crate::query::BatchedQuery;
use crate::row::ResultRow;
use crate::schema::Column;
use crate::session::Session;
use crate::value::Value;
use log::trace;
use std::sync::Arc;

pub struct Cursor {
    columns: Arc<[Column]>,
    stream: Option<Box<dyn RowStream>>,
}

impl Cursor {
    pub(crate) fn new(columns: Arc<[Column]>, stream: Box<dyn RowStream>) -> Self {
        Self {
            columns,
            stream: Some(stream),
        }
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn is_closed(&self) -> bool {
        self.stream.is_none()
    }

    /// Release the backend stream; later calls to `next` return `None`
    pub fn close(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            stream.close();
            trace!("Released row stream");
        }
    }
}

impl Iterator for Cursor {
    type Item = Result<ResultRow>;

    fn next(&mut self) -> Option<Self::Item> {
        let stream = self.stream.as_mut()?;
        match stream.next_row() {
            Ok(Some(values)) => {
                if values.len() != self.columns.len() {
                    let err = DecodeError::RowWidth {
                        expected: self.columns.len(),
                        actual: values.len(),
                    };
                    self.close();
                    return Some(Err(err.into()));
                }
                Some(Ok(ResultRow::new(self.columns.clone(), values)))
            }
            Ok(None) => {
                self.close();
                None
            }
            Err(e) => {
                self.close();
                Some(Err(Error::from(e)))
            }
        }
    }
}

impl Drop for Cursor {
    fn drop(&mut self) {
        self.close();
    }
}

/// Rows of a [`BatchedQuery`], fetched one batch at a time.
///
/// At most one batch is open at any moment. Iteration stops after the first
/// batch that returns fewer rows than the batch size, or at the first error.
pub struct BatchedCursor<'s> {
    batched: BatchedQuery,
    session: &'s Session,
    current: Option<Cursor>,
    last_key: Option<Value>,
    fetched: usize,
    done: bool,
}

impl<'s> BatchedCursor<'s> {
    pub(crate) fn new(batched: BatchedQuery, session: &'s Session) -> Self {
        Self {
            batched,
            session,
            current: None,
            last_key: None,
            fetched: 0,
            done: false,
        }
    }

    fn open_next_batch(&mut self) -> Result<Cursor> {
        self.batched
            .batch(self.last_key.as_ref())?
            .iter(self.session)
    }

    /// Release the open batch and stop iteration
    pub fn close(&mut self) {
        self.done = true;
        if let Some(mut cursor) = self.current.take() {
            cursor.close();
        }
    }
}

impl Iterator for BatchedCursor<'_> {
    type Item = Result<ResultRow>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.done {
                return None;
            }
            if self.current.is_none() {
                match self.open_next_batch() {
                    Ok(cursor) => {
                        self.current = Some(cursor);
                        self.fetched = 0;
                    }
                    Err(e) => {
                        self.close();
                        return Some(Err(e));
                    }
                }
            }

            let cursor = self.current.as_mut()?;
            match cursor.next() {
                Some(Ok(row)) => {
                    self.fetched += 1;
                    self.last_key = row.raw(self.batched.key_index()).cloned();
                    return Some(Ok(row));
                }
                Some(Err(e)) => {
                    self.close();
                    return Some(Err(e));
                }
                None => {
                    self.current = None;
                    if self.fetched < self.batched.batch_size() {
                        self.done = true;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ExecutionError;
    use crate::schema::{ColumnDef, Table};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct VecStream {
        rows: std::vec::IntoIter<Vec<Value>>,
        fail_after: Option<usize>,
        closes: Arc<AtomicUsize>,
    }

    impl RowStream for VecStream {
        fn next_row(&mut self) -> std::result::Result<Option<Vec<Value>>, ExecutionError> {
            if let Some(n) = self.fail_after.as_mut() {
                if *n == 0 {
                    return Err(ExecutionError::Backend {
                        sql: "SELECT".to_string(),
                        source: anyhow::anyhow!("connection reset"),
                    });
                }
                *n -= 1;
            }
            Ok(self.rows.next())
        }

        fn close(&mut self) {
            self.closes.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn open_cursor(rows: Vec<Vec<Value>>, fail_after: Option<usize>) -> (Cursor, Arc<AtomicUsize>) {
        let table = Table::builder("cities")
            .column(ColumnDef::integer("id").auto_increment())
            .build()
            .unwrap();
        let closes = Arc::new(AtomicUsize::new(0));
        let stream = VecStream {
            rows: rows.into_iter(),
            fail_after,
            closes: closes.clone(),
        };
        (
            Cursor::new(Arc::from(table.columns().to_vec()), Box::new(stream)),
            closes,
        )
    }

    #[test]
    fn test_closes_on_exhaustion() {
        let (mut cursor, closes) = open_cursor(vec![vec![Value::Int32(1)], vec![Value::Int32(2)]], None);
        assert!(cursor.next().is_some());
        assert!(cursor.next().is_some());
        assert_eq!(closes.load(Ordering::SeqCst), 0);
        assert!(cursor.next().is_none());
        assert!(cursor.is_closed());
        assert!(cursor.next().is_none());
        drop(cursor);
        assert_eq!(closes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_closes_on_drop_and_close() {
        let (cursor, closes) = open_cursor(vec![vec![Value::Int32(1)]], None);
        drop(cursor);
        assert_eq!(closes.load(Ordering::SeqCst), 1);

        let (mut cursor, closes) = open_cursor(vec![vec![Value::Int32(1)]], None);
        cursor.close();
        cursor.close();
        assert!(cursor.next().is_none());
        drop(cursor);
        assert_eq!(closes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_closes_on_error() {
        let (mut cursor, closes) = open_cursor(vec![vec![Value::Int32(1)], vec![Value::Int32(2)]], Some(1));
        assert!(cursor.next().unwrap().is_ok());
        assert!(matches!(cursor.next(), Some(Err(Error::Execution(_)))));
        assert_eq!(closes.load(Ordering::SeqCst), 1);
        assert!(cursor.next().is_none());
    }

    #[test]
    fn test_row_width_mismatch() {
        let (mut cursor, closes) = open_cursor(vec![vec![Value::Int32(1), Value::Null]], None);
        assert!(matches!(
            cursor.next(),
            Some(Err(Error::Decode(DecodeError::RowWidth { expected: 1, actual: 2 })))
        ));
        assert_eq!(closes.load(Ordering::SeqCst), 1);
    }
}
