//! Predicate tree definitions.

use crate::expression::operator::CompareOp;
use crate::query::Query;
use crate::schema::Column;
use crate::value::Value;

/// Boolean-valued expression tree filtering rows.
///
/// Values held by leaves are already in their stored representation
/// (type-checked and passed through the column transform).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Op {
    /// Constant predicate
    Literal(bool),

    /// `column <op> value` with a non-null value
    Compare {
        column: Column,
        op: CompareOp,
        value: Value,
    },

    /// `column IS [NOT] NULL`
    IsNull { column: Column, negated: bool },

    /// Conjunction of two or more operands
    And(Vec<Op>),

    /// Disjunction of two or more operands
    Or(Vec<Op>),

    Not(Box<Op>),

    /// `(columns) [NOT] IN (rows)`; every row has one value per column
    /// and `rows` is never empty
    InList {
        columns: Vec<Column>,
        rows: Vec<Vec<Value>>,
        negated: bool,
    },

    /// `(columns) [NOT] IN (subquery)`; the subquery projects one column per column
    InSubquery {
        columns: Vec<Column>,
        query: Box<Query>,
        negated: bool,
    },
}

impl Op {
    pub const TRUE: Op = Op::Literal(true);
    pub const FALSE: Op = Op::Literal(false);

    /// Conjunction; nested conjunctions are flattened
    pub fn and(self, other: Op) -> Op {
        let mut operands = Vec::new();
        for op in [self, other] {
            match op {
                Op::And(inner) => operands.extend(inner),
                op => operands.push(op),
            }
        }
        Op::And(operands)
    }

    /// Disjunction; nested disjunctions are flattened
    pub fn or(self, other: Op) -> Op {
        let mut operands = Vec::new();
        for op in [self, other] {
            match op {
                Op::Or(inner) => operands.extend(inner),
                op => operands.push(op),
            }
        }
        Op::Or(operands)
    }

    /// Whether this is one of the constant predicates
    pub fn is_literal(&self) -> bool {
        matches!(self, Op::Literal(_))
    }
}

impl std::ops::Not for Op {
    type Output = Op;

    fn not(self) -> Op {
        Op::Not(Box::new(self))
    }
}

impl std::ops::BitAnd for Op {
    type Output = Op;

    fn bitand(self, rhs: Op) -> Op {
        self.and(rhs)
    }
}

impl std::ops::BitOr for Op {
    type Output = Op;

    fn bitor(self, rhs: Op) -> Op {
        self.or(rhs)
    }
}

/// Negate a predicate
pub fn not(op: Op) -> Op {
    !op
}

/// Fold predicates with AND. An empty collection yields the always-true
/// predicate and a single predicate is returned unchanged.
pub fn compound_and(ops: impl IntoIterator<Item = Op>) -> Op {
    ops.into_iter().reduce(Op::and).unwrap_or(Op::TRUE)
}

/// Fold predicates with OR. An empty collection yields the always-false
/// predicate and a single predicate is returned unchanged.
pub fn compound_or(ops: impl IntoIterator<Item = Op>) -> Op {
    ops.into_iter().reduce(Op::or).unwrap_or(Op::FALSE)
}

/// Postfix folding for collections of predicates
pub trait CompoundOp {
    fn compound_and(self) -> Op;
    fn compound_or(self) -> Op;
}

impl<I> CompoundOp for I
where
    I: IntoIterator<Item = Op>,
{
    fn compound_and(self) -> Op {
        compound_and(self)
    }

    fn compound_or(self) -> Op {
        compound_or(self)
    }
}
