pub mod backend;
pub mod cursor;
pub mod emit;
pub mod error;
pub mod expression;
pub mod insert;
pub mod memdb;
pub mod query;
pub mod row;
pub mod schema;
pub mod session;
pub mod transform;
pub mod value;

pub use emit::{Dialect, SqlRenderer, Statement};
pub use error::{Error, Result};
pub use expression::{compound_and, compound_or, not, ColumnGroup, CompoundOp, Op};
pub use query::{FieldSet, Query, SortOrder};
pub use schema::{Column, ColumnDef, Table};
pub use session::{Session, SessionConfig};
pub use value::Value;
