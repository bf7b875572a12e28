//! Combinators that build predicates from columns.

use crate::error::BuildError;
use crate::expression::op::Op;
use crate::expression::operator::CompareOp;
use crate::query::Query;
use crate::schema::Column;
use crate::value::Value;

impl Column {
    /// `column = value`, or `column IS NULL` when the value is NULL
    pub fn equals(&self, value: impl Into<Value>) -> Result<Op, BuildError> {
        match value.into() {
            Value::Null => Ok(Op::IsNull {
                column: self.clone(),
                negated: false,
            }),
            value => self.compare(CompareOp::Eq, value),
        }
    }

    /// `column <> value`, or `column IS NOT NULL` when the value is NULL
    pub fn not_equals(&self, value: impl Into<Value>) -> Result<Op, BuildError> {
        match value.into() {
            Value::Null => Ok(Op::IsNull {
                column: self.clone(),
                negated: true,
            }),
            value => self.compare(CompareOp::Ne, value),
        }
    }

    pub fn less_than(&self, value: impl Into<Value>) -> Result<Op, BuildError> {
        self.compare(CompareOp::Lt, value.into())
    }

    pub fn less_eq(&self, value: impl Into<Value>) -> Result<Op, BuildError> {
        self.compare(CompareOp::Le, value.into())
    }

    pub fn greater_than(&self, value: impl Into<Value>) -> Result<Op, BuildError> {
        self.compare(CompareOp::Gt, value.into())
    }

    pub fn greater_eq(&self, value: impl Into<Value>) -> Result<Op, BuildError> {
        self.compare(CompareOp::Ge, value.into())
    }

    pub fn is_null(&self) -> Op {
        Op::IsNull {
            column: self.clone(),
            negated: false,
        }
    }

    pub fn is_not_null(&self) -> Op {
        Op::IsNull {
            column: self.clone(),
            negated: true,
        }
    }

    /// `column IN (values)`; an empty list matches nothing
    pub fn in_list<V: Into<Value>>(&self, values: impl IntoIterator<Item = V>) -> Result<Op, BuildError> {
        ColumnGroup::single(self.clone()).in_list(values.into_iter().map(|v| -> Vec<Value> { vec![v.into()] }))
    }

    /// `column NOT IN (values)`; an empty list matches everything
    pub fn not_in_list<V: Into<Value>>(&self, values: impl IntoIterator<Item = V>) -> Result<Op, BuildError> {
        ColumnGroup::single(self.clone()).not_in_list(values.into_iter().map(|v| -> Vec<Value> { vec![v.into()] }))
    }

    pub fn in_subquery(&self, query: &Query) -> Result<Op, BuildError> {
        ColumnGroup::single(self.clone()).in_subquery(query)
    }

    pub fn not_in_subquery(&self, query: &Query) -> Result<Op, BuildError> {
        ColumnGroup::single(self.clone()).not_in_subquery(query)
    }

    fn compare(&self, op: CompareOp, value: Value) -> Result<Op, BuildError> {
        Ok(Op::Compare {
            column: self.clone(),
            op,
            value: self.to_stored(value)?,
        })
    }
}

/// Conversion of a tuple of values into one IN-list row
pub trait IntoRow {
    fn into_row(self) -> Vec<Value>;
}

impl IntoRow for Vec<Value> {
    fn into_row(self) -> Vec<Value> {
        self
    }
}

impl<A: Into<Value>, B: Into<Value>> IntoRow for (A, B) {
    fn into_row(self) -> Vec<Value> {
        vec![self.0.into(), self.1.into()]
    }
}

impl<A: Into<Value>, B: Into<Value>, C: Into<Value>> IntoRow for (A, B, C) {
    fn into_row(self) -> Vec<Value> {
        vec![self.0.into(), self.1.into(), self.2.into()]
    }
}

/// Ordered group of columns of one table, compared as a row value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnGroup {
    columns: Vec<Column>,
}

impl ColumnGroup {
    pub fn new(columns: impl IntoIterator<Item = Column>) -> Result<Self, BuildError> {
        let columns: Vec<Column> = columns.into_iter().collect();
        let first = columns.first().ok_or(BuildError::EmptyColumnGroup)?;
        if let Some(other) = columns.iter().find(|c| c.table_name() != first.table_name()) {
            return Err(BuildError::MixedColumnGroup {
                first: first.table_name().to_string(),
                second: other.table_name().to_string(),
            });
        }
        Ok(Self { columns })
    }

    fn single(column: Column) -> Self {
        Self {
            columns: vec![column],
        }
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn in_list<R: IntoRow>(&self, rows: impl IntoIterator<Item = R>) -> Result<Op, BuildError> {
        self.list(rows, false)
    }

    pub fn not_in_list<R: IntoRow>(&self, rows: impl IntoIterator<Item = R>) -> Result<Op, BuildError> {
        self.list(rows, true)
    }

    pub fn in_subquery(&self, query: &Query) -> Result<Op, BuildError> {
        self.subquery(query, false)
    }

    pub fn not_in_subquery(&self, query: &Query) -> Result<Op, BuildError> {
        self.subquery(query, true)
    }

    fn list<R: IntoRow>(&self, rows: impl IntoIterator<Item = R>, negated: bool) -> Result<Op, BuildError> {
        let mut stored_rows = Vec::new();
        for row in rows {
            let row = row.into_row();
            if row.len() != self.width() {
                return Err(BuildError::ArityMismatch {
                    table: self.columns[0].table_name().to_string(),
                    columns: self.column_names(),
                    expected: self.width(),
                    actual: row.len(),
                });
            }
            let stored = self
                .columns
                .iter()
                .zip(row)
                .map(|(column, value)| column.to_stored(value))
                .collect::<Result<Vec<_>, _>>()?;
            stored_rows.push(stored);
        }

        if stored_rows.is_empty() {
            // x IN () is false for every row, x NOT IN () is true
            return Ok(Op::Literal(negated));
        }

        Ok(Op::InList {
            columns: self.columns.clone(),
            rows: stored_rows,
            negated,
        })
    }

    fn subquery(&self, query: &Query, negated: bool) -> Result<Op, BuildError> {
        let actual = query.projection().len();
        if actual != self.width() {
            return Err(BuildError::SubqueryColumnCount {
                table: query.table().name().to_string(),
                expected: self.width(),
                actual,
            });
        }
        Ok(Op::InSubquery {
            columns: self.columns.clone(),
            query: Box::new(query.clone()),
            negated,
        })
    }

    fn column_names(&self) -> String {
        self.columns
            .iter()
            .map(|c| c.name())
            .collect::<Vec<_>>()
            .join(", ")
    }
}
