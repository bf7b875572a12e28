//! Statement execution and expression evaluation with SQL three-valued logic.

use super::ast::*;
use super::table::MemTable;
use crate::value::Value;
use anyhow::{anyhow, bail, Result};
use dashmap::DashMap;
use std::cmp::Ordering;
use std::collections::HashSet;

/// Rows produced by a SELECT
#[derive(Debug, Clone, PartialEq)]
pub struct ResultSet {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

/// Columns of one row visible to expressions under a table name or alias
struct Scope<'a> {
    name: &'a str,
    columns: &'a [String],
    values: &'a [Value],
}

pub struct Executor<'a> {
    tables: &'a DashMap<String, MemTable>,
    params: &'a [Value],
}

impl<'a> Executor<'a> {
    pub fn new(tables: &'a DashMap<String, MemTable>, params: &'a [Value]) -> Self {
        Self { tables, params }
    }

    pub fn select(&self, select: &SelectStatement) -> Result<ResultSet> {
        self.select_in(select, &[])
    }

    pub fn insert(&self, insert: &InsertStatement) -> Result<Option<Value>> {
        let assignments = insert
            .columns
            .iter()
            .zip(&insert.values)
            .map(|(column, expr)| Ok((column.clone(), self.evaluate(expr, &[])?)))
            .collect::<Result<Vec<_>>>()?;

        let mut table = self
            .tables
            .get_mut(&insert.table_name)
            .ok_or_else(|| anyhow!("Table {} does not exist", insert.table_name))?;
        table.insert(assignments)
    }

    /// Evaluate a SELECT; `outer` holds the rows of enclosing queries
    fn select_in(&self, select: &SelectStatement, outer: &[Scope]) -> Result<ResultSet> {
        let (source_name, source) = match &select.from {
            FromClause::Table(name) => {
                // Snapshot so no map guard is held while subqueries run
                let table = self
                    .tables
                    .get(name)
                    .ok_or_else(|| anyhow!("Table {} does not exist", name))?;
                let source = ResultSet {
                    columns: table.column_names(),
                    rows: table.rows.clone(),
                };
                (name.as_str(), source)
            }
            FromClause::Subquery { query, alias } => (alias.as_str(), self.select_in(query, outer)?),
        };

        let mut rows = Vec::new();
        for row in source.rows {
            let keep = match &select.where_clause {
                Some(predicate) => {
                    let scopes = with_scope(outer, source_name, &source.columns, &row);
                    self.predicate(predicate, &scopes)? == Some(true)
                }
                None => true,
            };
            if keep {
                rows.push(row);
            }
        }

        if select.projections == [SelectItem::CountAll] {
            return Ok(ResultSet {
                columns: vec!["count".to_string()],
                rows: vec![vec![Value::Int64(rows.len() as i64)]],
            });
        }

        if !select.order_by.is_empty() {
            let mut keyed = rows
                .into_iter()
                .map(|row| {
                    let keys = {
                        let scopes = with_scope(outer, source_name, &source.columns, &row);
                        select
                            .order_by
                            .iter()
                            .map(|item| self.evaluate(&item.expression, &scopes))
                            .collect::<Result<Vec<_>>>()?
                    };
                    Ok((keys, row))
                })
                .collect::<Result<Vec<_>>>()?;
            keyed.sort_by(|(a, _), (b, _)| {
                for (item, (x, y)) in select.order_by.iter().zip(a.iter().zip(b)) {
                    let ordering = match item.direction {
                        OrderDirection::Asc => x.sort_cmp(y),
                        OrderDirection::Desc => y.sort_cmp(x),
                    };
                    if ordering != Ordering::Equal {
                        return ordering;
                    }
                }
                Ordering::Equal
            });
            rows = keyed.into_iter().map(|(_, row)| row).collect();
        }

        let mut columns = Vec::new();
        for item in &select.projections {
            match item {
                SelectItem::AllColumns => columns.extend(source.columns.iter().cloned()),
                SelectItem::Expression(Expression::Column(name))
                | SelectItem::Expression(Expression::QualifiedColumn(_, name)) => {
                    columns.push(name.clone())
                }
                SelectItem::Expression(_) => columns.push("?column?".to_string()),
                SelectItem::CountAll => bail!("COUNT(*) cannot be mixed with other select items"),
            }
        }

        let mut projected = Vec::with_capacity(rows.len());
        for row in &rows {
            let scopes = with_scope(outer, source_name, &source.columns, row);
            let mut values = Vec::with_capacity(columns.len());
            for item in &select.projections {
                match item {
                    SelectItem::AllColumns => values.extend(row.iter().cloned()),
                    SelectItem::Expression(expr) => values.push(self.evaluate(expr, &scopes)?),
                    SelectItem::CountAll => unreachable!("rejected above"),
                }
            }
            projected.push(values);
        }

        if select.distinct {
            let mut seen = HashSet::new();
            projected.retain(|row| seen.insert(row.clone()));
        }

        let offset = select.offset.unwrap_or(0) as usize;
        let limit = select.limit.map(|l| l as usize).unwrap_or(usize::MAX);
        let rows = projected.into_iter().skip(offset).take(limit).collect();

        Ok(ResultSet { columns, rows })
    }

    /// Evaluate to a truth value; `None` is UNKNOWN
    fn predicate(&self, expr: &Expression, scopes: &[Scope]) -> Result<Option<bool>> {
        match self.evaluate(expr, scopes)? {
            Value::Boolean(b) => Ok(Some(b)),
            Value::Null => Ok(None),
            other => bail!("Expected a boolean condition, got {}", other),
        }
    }

    fn evaluate(&self, expr: &Expression, scopes: &[Scope]) -> Result<Value> {
        match expr {
            Expression::Literal(value) => Ok(value.clone()),
            Expression::Placeholder(index) => self
                .params
                .get(*index)
                .cloned()
                .ok_or_else(|| anyhow!("No value bound for parameter {}", index + 1)),
            Expression::Column(name) => resolve(scopes, None, name),
            Expression::QualifiedColumn(table, name) => resolve(scopes, Some(table), name),
            Expression::Row(_) => bail!("Row value used outside of a comparison"),
            Expression::BinaryOp { left, op, right } => match op {
                BinaryOperator::And => {
                    let l = self.predicate(left, scopes)?;
                    if l == Some(false) {
                        return Ok(Value::Boolean(false));
                    }
                    let r = self.predicate(right, scopes)?;
                    Ok(truth(match (l, r) {
                        (_, Some(false)) => Some(false),
                        (Some(true), Some(true)) => Some(true),
                        _ => None,
                    }))
                }
                BinaryOperator::Or => {
                    let l = self.predicate(left, scopes)?;
                    if l == Some(true) {
                        return Ok(Value::Boolean(true));
                    }
                    let r = self.predicate(right, scopes)?;
                    Ok(truth(match (l, r) {
                        (_, Some(true)) => Some(true),
                        (Some(false), Some(false)) => Some(false),
                        _ => None,
                    }))
                }
                op => {
                    let l = self.operand(left, scopes)?;
                    let r = self.operand(right, scopes)?;
                    Ok(truth(compare_rows(*op, &l, &r)?))
                }
            },
            Expression::Not(inner) => Ok(truth(self.predicate(inner, scopes)?.map(|b| !b))),
            Expression::Negate(inner) => match self.evaluate(inner, scopes)? {
                Value::Null => Ok(Value::Null),
                Value::Int32(v) => match v.checked_neg() {
                    Some(v) => Ok(Value::Int32(v)),
                    None => bail!("Integer overflow negating {}", v),
                },
                Value::Int64(v) => match v.checked_neg() {
                    Some(v) => Ok(Value::Int64(v)),
                    None => bail!("Integer overflow negating {}", v),
                },
                other => bail!("Cannot negate {}", other),
            },
            Expression::IsNull {
                expression,
                negated,
            } => {
                let is_null = self.evaluate(expression, scopes)?.is_null();
                Ok(Value::Boolean(is_null != *negated))
            }
            Expression::InList {
                expression,
                list,
                negated,
            } => {
                let needle = self.operand(expression, scopes)?;
                let candidates = list
                    .iter()
                    .map(|item| self.operand(item, scopes))
                    .collect::<Result<Vec<_>>>()?;
                Ok(truth(membership(&needle, &candidates, *negated)?))
            }
            Expression::InSubquery {
                expression,
                subquery,
                negated,
            } => {
                let needle = self.operand(expression, scopes)?;
                let result = self.select_in(subquery, scopes)?;
                Ok(truth(membership(&needle, &result.rows, *negated)?))
            }
        }
    }

    /// Evaluate a comparison operand, keeping row values as lists
    fn operand(&self, expr: &Expression, scopes: &[Scope]) -> Result<Vec<Value>> {
        match expr {
            Expression::Row(items) => items.iter().map(|e| self.evaluate(e, scopes)).collect(),
            other => Ok(vec![self.evaluate(other, scopes)?]),
        }
    }
}

fn with_scope<'s>(
    outer: &'s [Scope<'s>],
    name: &'s str,
    columns: &'s [String],
    values: &'s [Value],
) -> Vec<Scope<'s>> {
    let mut scopes: Vec<Scope<'s>> = outer
        .iter()
        .map(|s| Scope {
            name: s.name,
            columns: s.columns,
            values: s.values,
        })
        .collect();
    scopes.push(Scope {
        name,
        columns,
        values,
    });
    scopes
}

/// Innermost scope wins
fn resolve(scopes: &[Scope], table: Option<&String>, column: &str) -> Result<Value> {
    for scope in scopes.iter().rev() {
        if let Some(table) = table {
            if !scope.name.eq_ignore_ascii_case(table) {
                continue;
            }
        }
        if let Some(index) = scope.columns.iter().position(|c| c.eq_ignore_ascii_case(column)) {
            return Ok(scope.values[index].clone());
        }
    }
    match table {
        Some(table) => bail!("Unknown column {}.{}", table, column),
        None => bail!("Unknown column {}", column),
    }
}

fn truth(value: Option<bool>) -> Value {
    value.map(Value::Boolean).unwrap_or(Value::Null)
}

/// Compare row values of equal width
fn compare_rows(op: BinaryOperator, left: &[Value], right: &[Value]) -> Result<Option<bool>> {
    if left.len() != right.len() {
        bail!("Cannot compare rows of width {} and {}", left.len(), right.len());
    }
    if left.len() == 1 {
        return compare(op, &left[0], &right[0]);
    }
    let equal = rows_equal(left, right)?;
    match op {
        BinaryOperator::Equal => Ok(equal),
        BinaryOperator::NotEqual => Ok(equal.map(|b| !b)),
        other => bail!("Operator {:?} is not supported on row values", other),
    }
}

fn compare(op: BinaryOperator, left: &Value, right: &Value) -> Result<Option<bool>> {
    if left.is_null() || right.is_null() {
        return Ok(None);
    }
    let Some(ordering) = left.sql_cmp(right) else {
        bail!("Cannot compare {} with {}", left, right);
    };
    Ok(Some(match op {
        BinaryOperator::Equal => ordering == Ordering::Equal,
        BinaryOperator::NotEqual => ordering != Ordering::Equal,
        BinaryOperator::Less => ordering == Ordering::Less,
        BinaryOperator::Greater => ordering == Ordering::Greater,
        BinaryOperator::LessEqual => ordering != Ordering::Greater,
        BinaryOperator::GreaterEqual => ordering != Ordering::Less,
        BinaryOperator::And | BinaryOperator::Or => unreachable!("logical operators handled by evaluate"),
    }))
}

/// Pairwise equality: FALSE if any pair differs, UNKNOWN if any pair is NULL
fn rows_equal(left: &[Value], right: &[Value]) -> Result<Option<bool>> {
    let mut unknown = false;
    for (l, r) in left.iter().zip(right) {
        match compare(BinaryOperator::Equal, l, r)? {
            Some(false) => return Ok(Some(false)),
            None => unknown = true,
            Some(true) => {}
        }
    }
    Ok(if unknown { None } else { Some(true) })
}

/// `needle [NOT] IN candidates`
fn membership(needle: &[Value], candidates: &[Vec<Value>], negated: bool) -> Result<Option<bool>> {
    let mut unknown = false;
    for candidate in candidates {
        if candidate.len() != needle.len() {
            bail!(
                "IN compares {} values against a row of {}",
                needle.len(),
                candidate.len()
            );
        }
        match rows_equal(needle, candidate)? {
            Some(true) => return Ok(Some(!negated)),
            None => unknown = true,
            Some(false) => {}
        }
    }
    Ok(if unknown { None } else { Some(negated) })
}
