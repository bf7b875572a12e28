//! Schema descriptors.
//!
//! This module provides the immutable catalog the builder works against:
//!
//! - **Table**: a named relation owning an ordered list of columns
//! - **Column**: a cheap, shareable reference into a table, usable both as a
//!   projection target and as a predicate operand
//! - **Catalog**: an explicit lookup-by-name context; there is no global registry
//!
//! Descriptors are reference counted and never mutated after `build()`, so
//! they can be shared freely between threads.

pub mod catalog;
pub mod column;
pub mod table;

pub use catalog::Catalog;
pub use column::{Column, ColumnDef, ColumnType};
pub use table::{Table, TableBuilder};
