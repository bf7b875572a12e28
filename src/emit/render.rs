//! Query and predicate rendering.

use crate::emit::{Dialect, Statement};
use crate::error::EmitError;
use crate::expression::Op;
use crate::query::{Query, SortOrder};
use crate::schema::{Column, Table};
use crate::value::Value;

/// Accumulates SQL text and bound parameters
#[derive(Default)]
struct Writer {
    sql: String,
    params: Vec<Value>,
}

impl Writer {
    fn push(&mut self, s: &str) {
        self.sql.push_str(s);
    }

    fn bind(&mut self, value: &Value) {
        self.sql.push('?');
        self.params.push(value.clone());
    }

    fn finish(self) -> Statement {
        Statement {
            sql: self.sql,
            params: self.params,
        }
    }
}

/// Renders queries, predicates and inserts for one dialect
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SqlRenderer {
    dialect: Dialect,
}

impl SqlRenderer {
    pub fn new(dialect: Dialect) -> Self {
        Self { dialect }
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub fn select(&self, query: &Query) -> Result<Statement, EmitError> {
        let mut w = Writer::default();
        self.write_select(&mut w, query)?;
        Ok(w.finish())
    }

    /// `SELECT COUNT(*)` over the rows the query would return
    pub fn count(&self, query: &Query) -> Result<Statement, EmitError> {
        let mut w = Writer::default();
        if query.is_distinct() || query.row_limit().is_some() {
            w.push("SELECT COUNT(*) FROM (");
            self.write_select(&mut w, query)?;
            w.push(") subquery");
        } else {
            w.push("SELECT COUNT(*) FROM ");
            w.push(&self.table(query.table()));
            if let Some(predicate) = query.predicate() {
                w.push(" WHERE ");
                self.write_op(&mut w, predicate)?;
            }
        }
        Ok(w.finish())
    }

    /// Predicate alone, as it appears after WHERE
    pub fn predicate(&self, op: &Op) -> Result<Statement, EmitError> {
        let mut w = Writer::default();
        self.write_op(&mut w, op)?;
        Ok(w.finish())
    }

    /// `INSERT INTO t (c1, c2) VALUES (?, ?)`; values are already stored representations
    pub fn insert(&self, table: &Table, values: &[(Column, Value)]) -> Statement {
        let mut w = Writer::default();
        w.push("INSERT INTO ");
        w.push(&self.table(table));
        if values.is_empty() {
            match self.dialect {
                Dialect::MySql => w.push(" () VALUES ()"),
                _ => w.push(" DEFAULT VALUES"),
            }
            return w.finish();
        }

        let names = values
            .iter()
            .map(|(c, _)| self.dialect.quote_identifier(c.name()))
            .collect::<Vec<_>>()
            .join(", ");
        w.push(" (");
        w.push(&names);
        w.push(") VALUES (");
        for (i, (_, value)) in values.iter().enumerate() {
            if i > 0 {
                w.push(", ");
            }
            w.bind(value);
        }
        w.push(")");
        w.finish()
    }

    fn write_select(&self, w: &mut Writer, query: &Query) -> Result<(), EmitError> {
        w.push("SELECT ");
        if query.is_distinct() {
            w.push("DISTINCT ");
        }

        let limit = query.row_limit();
        if self.dialect == Dialect::SqlServer {
            if let Some(limit) = limit.filter(|l| l.offset == 0) {
                w.push(&format!("TOP {} ", limit.count));
            }
        }

        let columns = query
            .projection()
            .iter()
            .map(|c| self.column(c))
            .collect::<Vec<_>>()
            .join(", ");
        w.push(&columns);
        w.push(" FROM ");
        w.push(&self.table(query.table()));

        if let Some(predicate) = query.predicate() {
            w.push(" WHERE ");
            self.write_op(w, predicate)?;
        }

        if !query.ordering().is_empty() {
            let order = query
                .ordering()
                .iter()
                .map(|(c, order)| {
                    let direction = match order {
                        SortOrder::Asc => "ASC",
                        SortOrder::Desc => "DESC",
                    };
                    format!("{} {}", self.column(c), direction)
                })
                .collect::<Vec<_>>()
                .join(", ");
            w.push(" ORDER BY ");
            w.push(&order);
        }

        if let Some(limit) = limit {
            match self.dialect {
                Dialect::Postgres | Dialect::MySql | Dialect::Sqlite => {
                    w.push(&format!(" LIMIT {}", limit.count));
                    if limit.offset > 0 {
                        w.push(&format!(" OFFSET {}", limit.offset));
                    }
                }
                Dialect::SqlServer => {
                    if limit.offset > 0 {
                        if query.ordering().is_empty() {
                            return Err(EmitError::Unsupported {
                                dialect: self.dialect,
                                feature: "OFFSET without ORDER BY",
                            });
                        }
                        w.push(&format!(
                            " OFFSET {} ROWS FETCH NEXT {} ROWS ONLY",
                            limit.offset, limit.count
                        ));
                    }
                }
                Dialect::Oracle => {
                    if limit.offset > 0 {
                        w.push(&format!(
                            " OFFSET {} ROWS FETCH NEXT {} ROWS ONLY",
                            limit.offset, limit.count
                        ));
                    } else {
                        w.push(&format!(" FETCH FIRST {} ROWS ONLY", limit.count));
                    }
                }
            }
        }
        Ok(())
    }

    fn write_op(&self, w: &mut Writer, op: &Op) -> Result<(), EmitError> {
        match op {
            Op::Literal(value) => w.push(self.dialect.boolean_literal(*value)),
            Op::Compare { column, op, value } => {
                w.push(&self.column(column));
                w.push(" ");
                w.push(op.as_str());
                w.push(" ");
                w.bind(value);
            }
            Op::IsNull { column, negated } => {
                w.push(&self.column(column));
                w.push(if *negated { " IS NOT NULL" } else { " IS NULL" });
            }
            Op::And(operands) => self.write_compound(w, operands, " AND ")?,
            Op::Or(operands) => self.write_compound(w, operands, " OR ")?,
            Op::Not(inner) => {
                w.push("NOT (");
                self.write_op(w, inner)?;
                w.push(")");
            }
            Op::InList {
                columns,
                rows,
                negated,
            } => {
                if columns.len() > 1 && !self.dialect.supports_tuple_in_list() {
                    self.write_expanded_in_list(w, columns, rows, *negated);
                } else {
                    self.write_column_list(w, columns);
                    w.push(if *negated { " NOT IN (" } else { " IN (" });
                    for (i, row) in rows.iter().enumerate() {
                        if i > 0 {
                            w.push(", ");
                        }
                        self.write_row(w, row);
                    }
                    w.push(")");
                }
            }
            Op::InSubquery {
                columns,
                query,
                negated,
            } => {
                if columns.len() > 1 && !self.dialect.supports_tuple_in_subquery() {
                    return Err(EmitError::Unsupported {
                        dialect: self.dialect,
                        feature: "tuple IN subquery",
                    });
                }
                self.write_column_list(w, columns);
                w.push(if *negated { " NOT IN (" } else { " IN (" });
                self.write_select(w, query)?;
                w.push(")");
            }
        }
        Ok(())
    }

    /// Every operand parenthesized, so precedence never depends on the dialect
    fn write_compound(&self, w: &mut Writer, operands: &[Op], separator: &str) -> Result<(), EmitError> {
        for (i, operand) in operands.iter().enumerate() {
            if i > 0 {
                w.push(separator);
            }
            w.push("(");
            self.write_op(w, operand)?;
            w.push(")");
        }
        Ok(())
    }

    /// `((a = ?) AND (b = ?)) OR ((a = ?) AND (b = ?))`, wrapped in `NOT (...)` when negated
    fn write_expanded_in_list(&self, w: &mut Writer, columns: &[Column], rows: &[Vec<Value>], negated: bool) {
        if negated {
            w.push("NOT (");
        }
        let wrap = rows.len() > 1;
        for (i, row) in rows.iter().enumerate() {
            if i > 0 {
                w.push(" OR ");
            }
            if wrap {
                w.push("(");
            }
            for (j, (column, value)) in columns.iter().zip(row).enumerate() {
                if j > 0 {
                    w.push(" AND ");
                }
                w.push("(");
                w.push(&self.column(column));
                w.push(" = ");
                w.bind(value);
                w.push(")");
            }
            if wrap {
                w.push(")");
            }
        }
        if negated {
            w.push(")");
        }
    }

    fn write_column_list(&self, w: &mut Writer, columns: &[Column]) {
        let names = columns
            .iter()
            .map(|c| self.column(c))
            .collect::<Vec<_>>()
            .join(", ");
        if columns.len() > 1 {
            w.push(&format!("({})", names));
        } else {
            w.push(&names);
        }
    }

    fn write_row(&self, w: &mut Writer, row: &[Value]) {
        if row.len() > 1 {
            w.push("(");
        }
        for (i, value) in row.iter().enumerate() {
            if i > 0 {
                w.push(", ");
            }
            w.bind(value);
        }
        if row.len() > 1 {
            w.push(")");
        }
    }

    fn table(&self, table: &Table) -> String {
        self.dialect.quote_identifier(table.name())
    }

    fn column(&self, column: &Column) -> String {
        format!(
            "{}.{}",
            self.dialect.quote_identifier(column.table_name()),
            self.dialect.quote_identifier(column.name())
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expression::{compound_or, ColumnGroup};
    use crate::query::FieldSet;
    use crate::schema::ColumnDef;

    fn cities() -> Table {
        Table::builder("cities")
            .column(ColumnDef::integer("id").auto_increment())
            .column(ColumnDef::varchar("name", 50))
            .build()
            .unwrap()
    }

    fn users() -> Table {
        Table::builder("users")
            .column(ColumnDef::varchar("id", 10).primary_key())
            .column(ColumnDef::varchar("name", 50))
            .column(ColumnDef::integer("city_id").nullable())
            .build()
            .unwrap()
    }

    fn sql(dialect: Dialect, query: &Query) -> String {
        SqlRenderer::new(dialect).select(query).unwrap().sql
    }

    #[test]
    fn test_simple_select() -> anyhow::Result<()> {
        let users = users();
        let name = users.column("name")?;
        let query = users.select([users.column("id")?])?.filter(name.equals("Andrey")?);
        let statement = SqlRenderer::new(Dialect::Postgres).select(&query)?;
        assert_eq!(
            statement.sql,
            "SELECT users.id FROM users WHERE users.name = ?"
        );
        assert_eq!(statement.params, vec![Value::from("Andrey")]);

        let all = users.select_all();
        assert_eq!(
            sql(Dialect::Postgres, &all),
            "SELECT users.id, users.name, users.city_id FROM users"
        );
        Ok(())
    }

    #[test]
    fn test_compound_parenthesization() -> anyhow::Result<()> {
        let users = users();
        let id = users.column("id")?;
        let name = users.column("name")?;
        let city = users.column("city_id")?;

        let op = name.equals("Sergey")?.and(city.is_null()).or(!id.equals("alex")?);
        let query = users.select_where(op);
        assert_eq!(
            sql(Dialect::Postgres, &query),
            "SELECT users.id, users.name, users.city_id FROM users \
             WHERE ((users.name = ?) AND (users.city_id IS NULL)) OR (NOT (users.id = ?))"
        );

        let op = compound_or([name.equals("Andrey")?, name.equals("Sergey")?]);
        let statement = SqlRenderer::new(Dialect::Sqlite).predicate(&op)?;
        assert_eq!(statement.sql, "(users.name = ?) OR (users.name = ?)");
        assert_eq!(statement.params, vec![Value::from("Andrey"), Value::from("Sergey")]);
        Ok(())
    }

    #[test]
    fn test_literals_per_dialect() -> anyhow::Result<()> {
        let cities = cities();
        let query = cities.select_where(Op::TRUE);
        assert_eq!(
            sql(Dialect::Postgres, &query),
            "SELECT cities.id, cities.name FROM cities WHERE TRUE"
        );
        assert_eq!(
            sql(Dialect::SqlServer, &query),
            "SELECT cities.id, cities.name FROM cities WHERE 1 = 1"
        );
        let query = cities.select_where(!Op::FALSE);
        assert_eq!(
            sql(Dialect::Oracle, &query),
            "SELECT cities.id, cities.name FROM cities WHERE NOT (1 = 0)"
        );
        Ok(())
    }

    #[test]
    fn test_single_column_in_list() -> anyhow::Result<()> {
        let users = users();
        let id = users.column("id")?;
        let op = id.in_list(["andrey", "alex"])?;
        for dialect in Dialect::ALL {
            let statement = SqlRenderer::new(dialect).predicate(&op)?;
            assert_eq!(statement.sql, "users.id IN (?, ?)");
            assert_eq!(statement.params.len(), 2);
        }
        let op = id.not_in_list(["andrey"])?;
        let statement = SqlRenderer::new(Dialect::Postgres).predicate(&op)?;
        assert_eq!(statement.sql, "users.id NOT IN (?)");
        Ok(())
    }

    #[test]
    fn test_tuple_in_list() -> anyhow::Result<()> {
        let users = users();
        let group = ColumnGroup::new([users.column("id")?, users.column("name")?])?;
        let op = group.in_list([("andrey", "Andrey"), ("sergey", "Sergey")])?;

        let native = SqlRenderer::new(Dialect::Postgres).predicate(&op)?;
        assert_eq!(native.sql, "(users.id, users.name) IN ((?, ?), (?, ?))");

        let expanded = SqlRenderer::new(Dialect::Sqlite).predicate(&op)?;
        assert_eq!(
            expanded.sql,
            "((users.id = ?) AND (users.name = ?)) OR ((users.id = ?) AND (users.name = ?))"
        );
        assert_eq!(expanded.params, native.params);

        let op = group.not_in_list([("alex", "Alex")])?;
        let expanded = SqlRenderer::new(Dialect::SqlServer).predicate(&op)?;
        assert_eq!(expanded.sql, "NOT ((users.id = ?) AND (users.name = ?))");
        let native = SqlRenderer::new(Dialect::MySql).predicate(&op)?;
        assert_eq!(native.sql, "(users.id, users.name) NOT IN ((?, ?))");
        Ok(())
    }

    #[test]
    fn test_in_subquery() -> anyhow::Result<()> {
        let cities = cities();
        let users = users();
        let city_id = users.column("city_id")?;
        let subquery = users
            .select([city_id.clone()])?
            .filter(users.column("name")?.equals("Andrey")?);
        let query = cities
            .select([cities.column("name")?])?
            .filter(cities.column("id")?.in_subquery(&subquery)?);

        let statement = SqlRenderer::new(Dialect::Postgres).select(&query)?;
        assert_eq!(
            statement.sql,
            "SELECT cities.name FROM cities WHERE cities.id IN \
             (SELECT users.city_id FROM users WHERE users.name = ?)"
        );
        assert_eq!(statement.params, vec![Value::from("Andrey")]);
        Ok(())
    }

    #[test]
    fn test_tuple_in_subquery_unsupported_on_sqlserver() -> anyhow::Result<()> {
        let users = users();
        let group = ColumnGroup::new([users.column("id")?, users.column("name")?])?;
        let subquery = users.select([users.column("id")?, users.column("name")?])?;
        let op = group.in_subquery(&subquery)?;

        let statement = SqlRenderer::new(Dialect::Sqlite).predicate(&op)?;
        assert_eq!(
            statement.sql,
            "(users.id, users.name) IN (SELECT users.id, users.name FROM users)"
        );
        assert_eq!(
            SqlRenderer::new(Dialect::SqlServer).predicate(&op).unwrap_err(),
            EmitError::Unsupported {
                dialect: Dialect::SqlServer,
                feature: "tuple IN subquery",
            }
        );
        Ok(())
    }

    #[test]
    fn test_limits_per_dialect() -> anyhow::Result<()> {
        let cities = cities();
        let id = cities.column("id")?;
        let query = cities.select([id.clone()])?.limit(2);
        assert_eq!(sql(Dialect::Postgres, &query), "SELECT cities.id FROM cities LIMIT 2");
        assert_eq!(sql(Dialect::SqlServer, &query), "SELECT TOP 2 cities.id FROM cities");
        assert_eq!(
            sql(Dialect::Oracle, &query),
            "SELECT cities.id FROM cities FETCH FIRST 2 ROWS ONLY"
        );

        let query = cities
            .select([id.clone()])?
            .order_by(&id, SortOrder::Desc)
            .limit_offset(2, 1);
        assert_eq!(
            sql(Dialect::MySql, &query),
            "SELECT cities.id FROM cities ORDER BY cities.id DESC LIMIT 2 OFFSET 1"
        );
        assert_eq!(
            sql(Dialect::SqlServer, &query),
            "SELECT cities.id FROM cities ORDER BY cities.id DESC OFFSET 1 ROWS FETCH NEXT 2 ROWS ONLY"
        );

        let unordered = cities.select([id])?.limit_offset(2, 1);
        assert!(matches!(
            SqlRenderer::new(Dialect::SqlServer).select(&unordered),
            Err(EmitError::Unsupported { .. })
        ));
        Ok(())
    }

    #[test]
    fn test_count() -> anyhow::Result<()> {
        let users = users();
        let name = users.column("name")?;
        let renderer = SqlRenderer::new(Dialect::Postgres);

        let query = users
            .select([name.clone()])?
            .filter(name.equals("Alex")?)
            .order_by(&name, SortOrder::Asc);
        assert_eq!(
            renderer.count(&query)?.sql,
            "SELECT COUNT(*) FROM users WHERE users.name = ?"
        );

        let distinct = users.select([users.column("city_id")?])?.with_distinct(true);
        assert_eq!(
            renderer.count(&distinct)?.sql,
            "SELECT COUNT(*) FROM (SELECT DISTINCT users.city_id FROM users) subquery"
        );
        Ok(())
    }

    #[test]
    fn test_insert() -> anyhow::Result<()> {
        let cities = cities();
        let name = cities.column("name")?;
        let statement = SqlRenderer::new(Dialect::Postgres)
            .insert(&cities, &[(name, Value::from("Munich"))]);
        assert_eq!(statement.sql, "INSERT INTO cities (name) VALUES (?)");
        assert_eq!(statement.params, vec![Value::from("Munich")]);

        assert_eq!(
            SqlRenderer::new(Dialect::Sqlite).insert(&cities, &[]).sql,
            "INSERT INTO cities DEFAULT VALUES"
        );
        assert_eq!(
            SqlRenderer::new(Dialect::MySql).insert(&cities, &[]).sql,
            "INSERT INTO cities () VALUES ()"
        );
        Ok(())
    }

    #[test]
    fn test_quoted_identifiers() -> anyhow::Result<()> {
        let orders = Table::builder("order")
            .column(ColumnDef::integer("id").auto_increment())
            .column(ColumnDef::varchar("user", 10))
            .build()?;
        let query = orders.select([orders.column("user")?])?;
        assert_eq!(
            sql(Dialect::Postgres, &query),
            "SELECT \"order\".\"user\" FROM \"order\""
        );
        Ok(())
    }

    #[test]
    fn test_rendering_is_deterministic() -> anyhow::Result<()> {
        let users = users();
        let op = users.column("id")?.in_list(["andrey", "sergey"])?;
        let query = users.select_where(op);
        let renderer = SqlRenderer::new(Dialect::Postgres);
        assert_eq!(renderer.select(&query)?, renderer.select(&query)?);
        Ok(())
    }
}
