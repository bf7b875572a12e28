//! Column definitions and column references.

use crate::error::BuildError;
use crate::transform::{AesGcmEncryptor, ColumnTransform};
use crate::value::{DataType, Value};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Declared SQL type of a column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnType {
    Integer,
    BigInt,
    Varchar(u32),
    Text,
    Boolean,
    Binary(Option<u32>),
}

impl ColumnType {
    /// Data type of values the caller reads and writes
    pub fn data_type(&self) -> DataType {
        match self {
            ColumnType::Integer => DataType::Int32,
            ColumnType::BigInt => DataType::Int64,
            ColumnType::Varchar(_) | ColumnType::Text => DataType::Varchar,
            ColumnType::Boolean => DataType::Boolean,
            ColumnType::Binary(_) => DataType::Binary,
        }
    }

    pub fn is_integer(&self) -> bool {
        matches!(self, ColumnType::Integer | ColumnType::BigInt)
    }
}

/// Declaration of a single column, consumed by [`TableBuilder`](crate::schema::TableBuilder)
#[derive(Debug, Clone)]
pub struct ColumnDef {
    pub(crate) name: String,
    pub(crate) column_type: ColumnType,
    pub(crate) nullable: bool,
    pub(crate) auto_increment: bool,
    pub(crate) primary_key: bool,
    pub(crate) transform: Option<Arc<dyn ColumnTransform>>,
}

impl ColumnDef {
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
            nullable: false,
            auto_increment: false,
            primary_key: false,
            transform: None,
        }
    }

    pub fn integer(name: impl Into<String>) -> Self {
        Self::new(name, ColumnType::Integer)
    }

    pub fn big_integer(name: impl Into<String>) -> Self {
        Self::new(name, ColumnType::BigInt)
    }

    pub fn varchar(name: impl Into<String>, length: u32) -> Self {
        Self::new(name, ColumnType::Varchar(length))
    }

    pub fn text(name: impl Into<String>) -> Self {
        Self::new(name, ColumnType::Text)
    }

    pub fn boolean(name: impl Into<String>) -> Self {
        Self::new(name, ColumnType::Boolean)
    }

    pub fn binary(name: impl Into<String>) -> Self {
        Self::new(name, ColumnType::Binary(None))
    }

    /// Varchar column whose values are stored encrypted (base64 ciphertext)
    pub fn encrypted_varchar(name: impl Into<String>, length: u32, encryptor: AesGcmEncryptor) -> Self {
        Self::varchar(name, length).with_transform(Arc::new(encryptor.into_text()))
    }

    /// Binary column whose values are stored encrypted (raw ciphertext)
    pub fn encrypted_binary(name: impl Into<String>, length: u32, encryptor: AesGcmEncryptor) -> Self {
        Self::new(name, ColumnType::Binary(Some(length)))
            .with_transform(Arc::new(encryptor.into_binary()))
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// Mark as auto-increment primary key
    pub fn auto_increment(mut self) -> Self {
        self.auto_increment = true;
        self.primary_key = true;
        self
    }

    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    pub fn with_transform(mut self, transform: Arc<dyn ColumnTransform>) -> Self {
        self.transform = Some(transform);
        self
    }
}

/// Reference to a column of a declared table.
///
/// Equality and hashing use the qualified name only.
#[derive(Clone)]
pub struct Column {
    table: Arc<str>,
    def: Arc<ColumnDef>,
}

impl Column {
    pub(crate) fn new(table: Arc<str>, def: ColumnDef) -> Self {
        Self {
            table,
            def: Arc::new(def),
        }
    }

    pub fn name(&self) -> &str {
        &self.def.name
    }

    pub fn table_name(&self) -> &str {
        &self.table
    }

    pub fn column_type(&self) -> ColumnType {
        self.def.column_type
    }

    pub fn is_nullable(&self) -> bool {
        self.def.nullable
    }

    pub fn is_auto_increment(&self) -> bool {
        self.def.auto_increment
    }

    pub fn is_primary_key(&self) -> bool {
        self.def.primary_key
    }

    pub fn transform(&self) -> Option<&Arc<dyn ColumnTransform>> {
        self.def.transform.as_ref()
    }

    /// Data type of the representation the backend stores
    pub fn stored_type(&self) -> DataType {
        match &self.def.transform {
            Some(t) => t.stored_type(),
            None => self.def.column_type.data_type(),
        }
    }

    /// `table.column`
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.table, self.def.name)
    }

    /// Convert a caller value into the value bound to the backend:
    /// type-checked against the declared type, then encoded by the transform.
    pub fn to_stored(&self, value: Value) -> Result<Value, BuildError> {
        if !value.is_compatible_with(self.def.column_type.data_type()) {
            return Err(BuildError::TypeMismatch {
                table: self.table.to_string(),
                column: self.def.name.clone(),
                expected: self.def.column_type.data_type(),
                value,
            });
        }
        match &self.def.transform {
            Some(t) => t.encode(&value).map_err(|source| BuildError::Transform {
                table: self.table.to_string(),
                column: self.def.name.clone(),
                source,
            }),
            None => Ok(value),
        }
    }
}

impl PartialEq for Column {
    fn eq(&self, other: &Self) -> bool {
        self.table == other.table && self.def.name == other.def.name
    }
}

impl Eq for Column {}

impl Hash for Column {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.table.hash(state);
        self.def.name.hash(state);
    }
}

impl fmt::Debug for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.table, self.def.name)
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.table, self.def.name)
    }
}
