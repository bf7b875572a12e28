//! Error types for building, rendering, executing and decoding queries.

use crate::emit::Dialect;
use crate::value::{DataType, Value};
use thiserror::Error;

/// Errors raised while constructing predicates, queries or inserts.
/// These never reach the backend.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BuildError {
    #[error("Tuple arity mismatch on {table}({columns}): expected {expected} values, got {actual}")]
    ArityMismatch {
        table: String,
        columns: String,
        expected: usize,
        actual: usize,
    },

    #[error("Subquery on {table} projects {actual} columns but {expected} are compared")]
    SubqueryColumnCount {
        table: String,
        expected: usize,
        actual: usize,
    },

    #[error("Column {table}.{column} is not part of table {target}")]
    ColumnNotInTable {
        table: String,
        column: String,
        target: String,
    },

    #[error("Table {table} has no column named {column}")]
    UnknownColumn { table: String, column: String },

    #[error("Table {table} is already declared")]
    DuplicateTable { table: String },

    #[error("Table {table} declares column {column} twice")]
    DuplicateColumn { table: String, column: String },

    #[error("Table {table} declares no columns")]
    EmptyTable { table: String },

    #[error("Query on {table} must project at least one column")]
    EmptyProjection { table: String },

    #[error("Column group must contain at least one column")]
    EmptyColumnGroup,

    #[error("Column group mixes tables {first} and {second}")]
    MixedColumnGroup { first: String, second: String },

    #[error("Value {value} is not compatible with {table}.{column} ({expected:?})")]
    TypeMismatch {
        table: String,
        column: String,
        expected: DataType,
        value: Value,
    },

    #[error("Value for {table}.{column} is {actual} characters long, maximum is {max}")]
    ValueTooLong {
        table: String,
        column: String,
        max: u32,
        actual: usize,
    },

    #[error("Column {table}.{column} is NOT NULL")]
    NullNotAllowed { table: String, column: String },

    #[error("Batch size must be at least 1")]
    InvalidBatchSize,

    #[error("Table {table} has no auto-increment integer key to paginate batches on")]
    NoBatchKey { table: String },

    #[error("Batched queries on {table} are ordered and limited by their key; remove explicit ORDER BY/LIMIT")]
    BatchOrdering { table: String },

    #[error("Transform failed for {table}.{column}: {source}")]
    Transform {
        table: String,
        column: String,
        #[source]
        source: TransformError,
    },
}

/// A query shape the target dialect cannot express
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EmitError {
    #[error("{feature} is not supported by {dialect:?}")]
    Unsupported {
        dialect: Dialect,
        feature: &'static str,
    },
}

/// Failure reported by the backend collaborator, propagated unchanged
#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("Statement failed: {sql}: {source}")]
    Backend {
        sql: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Row stream already closed")]
    StreamClosed,
}

/// Failure while materializing a value from a result row
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DecodeError {
    #[error("Column {table}.{column} is not part of this row")]
    MissingColumn { table: String, column: String },

    #[error("Cannot decode {table}.{column}: {source}")]
    Transform {
        table: String,
        column: String,
        #[source]
        source: TransformError,
    },

    #[error("Value {value} of {table}.{column} cannot be read as {target}")]
    Conversion {
        table: String,
        column: String,
        value: Value,
        target: &'static str,
    },

    #[error("Row has {actual} values but {expected} columns were projected")]
    RowWidth { expected: usize, actual: usize },
}

/// Errors raised by a column transform plugin
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransformError {
    #[error("Unsupported input {value:?}, expected {expected}")]
    UnsupportedInput { value: Value, expected: &'static str },

    #[error("Ciphertext is malformed: {0}")]
    Malformed(String),

    #[error("Decryption failed")]
    Decryption,

    #[error("Encryption failed")]
    Encryption,
}

/// Top-level error type of the crate
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Build(#[from] BuildError),

    #[error(transparent)]
    Emit(#[from] EmitError),

    #[error(transparent)]
    Execution(#[from] ExecutionError),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("Expected exactly one row, got {count}")]
    NotSingle { count: usize },
}

pub type Result<T> = std::result::Result<T, Error>;
