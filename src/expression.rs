//! Predicate trees.
//!
//! This module provides:
//! - `Op`, a data-only predicate tree the emitter interprets
//! - comparison, IN-list and subquery combinators on `Column` and `ColumnGroup`
//! - n-ary AND/OR folding with explicit identity elements

pub mod builder;
pub mod op;
pub mod operator;

pub use builder::{ColumnGroup, IntoRow};
pub use op::{compound_and, compound_or, not, CompoundOp, Op};
pub use operator::CompareOp;
