// Abstract syntax tree of the statements the in-memory backend executes

use crate::value::Value;

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Select(SelectStatement),
    Insert(InsertStatement),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelectStatement {
    pub distinct: bool,
    pub projections: Vec<SelectItem>,
    pub from: FromClause,
    pub where_clause: Option<Expression>,
    pub order_by: Vec<OrderByItem>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SelectItem {
    AllColumns,
    CountAll,
    Expression(Expression),
}

#[derive(Debug, Clone, PartialEq)]
pub enum FromClause {
    Table(String),
    Subquery {
        query: Box<SelectStatement>,
        alias: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderByItem {
    pub expression: Expression,
    pub direction: OrderDirection,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OrderDirection {
    Asc,
    Desc,
}

/// `INSERT INTO t (cols) VALUES (exprs)`; both lists are empty for default values
#[derive(Debug, Clone, PartialEq)]
pub struct InsertStatement {
    pub table_name: String,
    pub columns: Vec<String>,
    pub values: Vec<Expression>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Literal(Value),
    /// Zero-based index into the bound parameters
    Placeholder(usize),
    Column(String),
    QualifiedColumn(String, String),
    /// Row value constructor `(a, b, ...)`
    Row(Vec<Expression>),
    BinaryOp {
        left: Box<Expression>,
        op: BinaryOperator,
        right: Box<Expression>,
    },
    Not(Box<Expression>),
    Negate(Box<Expression>),
    IsNull {
        expression: Box<Expression>,
        negated: bool,
    },
    InList {
        expression: Box<Expression>,
        list: Vec<Expression>,
        negated: bool,
    },
    InSubquery {
        expression: Box<Expression>,
        subquery: Box<SelectStatement>,
        negated: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BinaryOperator {
    Equal,
    NotEqual,
    Less,
    Greater,
    LessEqual,
    GreaterEqual,
    And,
    Or,
}
