//! Column transforms applied between the caller's values and stored values.
//!
//! A transform is opaque to the builder and the emitter: predicate operands and
//! inserted values are passed through [`ColumnTransform::encode`] when they are
//! built, and [`ResultRow`](crate::row::ResultRow) calls
//! [`ColumnTransform::decode`] when a value is read back.

pub mod cipher;

use crate::error::TransformError;
use crate::value::{DataType, Value};
use std::fmt;

pub use cipher::AesGcmEncryptor;

/// Reversible mapping between plain and stored values
pub trait ColumnTransform: fmt::Debug + Send + Sync {
    /// Data type of the stored (encoded) representation
    fn stored_type(&self) -> DataType;

    fn encode(&self, plain: &Value) -> Result<Value, TransformError>;

    fn decode(&self, stored: &Value) -> Result<Value, TransformError>;
}
