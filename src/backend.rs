//! Boundary to the database that executes rendered statements.

use crate::emit::{Dialect, Statement};
use crate::error::ExecutionError;
use crate::value::Value;

/// Executes statements rendered for its dialect.
///
/// Values passed in and out are stored representations; column transforms
/// are applied on the caller side.
pub trait Backend: Send + Sync {
    /// Dialect statements must be rendered in
    fn dialect(&self) -> Dialect;

    /// Execute a SELECT and stream its rows in projection order
    fn query(&self, statement: &Statement) -> Result<Box<dyn RowStream>, ExecutionError>;

    /// Execute a statement that returns no rows
    fn execute(&self, statement: &Statement) -> Result<UpdateOutcome, ExecutionError>;
}

/// Forward-only stream of rows holding a backend resource until closed
pub trait RowStream: Send {
    /// Next row, or `None` once the stream is exhausted
    fn next_row(&mut self) -> Result<Option<Vec<Value>>, ExecutionError>;

    /// Release the underlying resource. Idempotent.
    fn close(&mut self);
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UpdateOutcome {
    pub affected_rows: u64,
    /// Value assigned to the auto-increment column, if any
    pub generated_key: Option<Value>,
}
