//! In-process backend that parses and executes the emitted SQL subset.
//!
//! Supports single-table SELECT with DISTINCT, qualified columns, `?`
//! parameters, AND/OR/NOT, comparisons, IS [NOT] NULL, [NOT] IN over lists,
//! row values and subqueries, ORDER BY, every row-limit syntax the renderer
//! produces, `COUNT(*)` over a table or a derived table, and single-row
//! INSERT with auto-increment keys. The dialect only decides how statements
//! are rendered; all of them are accepted.

pub mod ast;
pub mod eval;
pub mod lexer;
pub mod parser;
pub mod table;
pub mod token;

use crate::backend::{Backend, RowStream, UpdateOutcome};
use crate::emit::{Dialect, Statement};
use crate::error::ExecutionError;
use crate::schema::Table;
use crate::value::Value;
use anyhow::{bail, Result};
use dashmap::DashMap;
use eval::Executor;
use log::{debug, warn};
use parser::Parser;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use table::MemTable;

pub struct MemoryDatabase {
    dialect: Dialect,
    tables: DashMap<String, MemTable>,
    open_streams: Arc<AtomicUsize>,
}

impl MemoryDatabase {
    pub fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            tables: DashMap::new(),
            open_streams: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn create_table(&self, table: &Table) -> Result<()> {
        if self.tables.contains_key(table.name()) {
            bail!("Table {} already exists", table.name());
        }
        self.tables
            .insert(table.name().to_string(), MemTable::from_table(table));
        debug!("Created table {} ({} columns)", table.name(), table.columns().len());
        Ok(())
    }

    /// Number of rows currently stored in a table
    pub fn row_count(&self, table: &str) -> Option<usize> {
        self.tables.get(table).map(|t| t.rows.len())
    }

    /// Row streams handed out and not yet closed
    pub fn open_streams(&self) -> usize {
        self.open_streams.load(Ordering::SeqCst)
    }

    fn parse(&self, statement: &Statement) -> Result<ast::Statement> {
        let mut parser = Parser::new(&statement.sql)?;
        let parsed = parser.parse()?;
        if parser.placeholder_count() != statement.params.len() {
            bail!(
                "Statement has {} placeholders but {} parameters were bound",
                parser.placeholder_count(),
                statement.params.len()
            );
        }
        Ok(parsed)
    }

    fn run_query(&self, statement: &Statement) -> Result<Vec<Vec<Value>>> {
        match self.parse(statement)? {
            ast::Statement::Select(select) => {
                Ok(Executor::new(&self.tables, &statement.params).select(&select)?.rows)
            }
            ast::Statement::Insert(_) => bail!("INSERT does not return rows"),
        }
    }

    fn run_update(&self, statement: &Statement) -> Result<UpdateOutcome> {
        match self.parse(statement)? {
            ast::Statement::Insert(insert) => {
                let generated_key = Executor::new(&self.tables, &statement.params).insert(&insert)?;
                Ok(UpdateOutcome {
                    affected_rows: 1,
                    generated_key,
                })
            }
            ast::Statement::Select(_) => bail!("SELECT must be executed as a query"),
        }
    }
}

fn backend_error(statement: &Statement, source: anyhow::Error) -> ExecutionError {
    warn!("Statement failed: {}: {}", statement.sql, source);
    ExecutionError::Backend {
        sql: statement.sql.clone(),
        source,
    }
}

impl Backend for MemoryDatabase {
    fn dialect(&self) -> Dialect {
        self.dialect
    }

    fn query(&self, statement: &Statement) -> std::result::Result<Box<dyn RowStream>, ExecutionError> {
        let rows = self
            .run_query(statement)
            .map_err(|e| backend_error(statement, e))?;
        self.open_streams.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MemRowStream {
            rows: rows.into_iter(),
            open: Some(self.open_streams.clone()),
        }))
    }

    fn execute(&self, statement: &Statement) -> std::result::Result<UpdateOutcome, ExecutionError> {
        self.run_update(statement)
            .map_err(|e| backend_error(statement, e))
    }
}

/// Materialized rows of one query; counts as open until closed or dropped
struct MemRowStream {
    rows: std::vec::IntoIter<Vec<Value>>,
    open: Option<Arc<AtomicUsize>>,
}

impl RowStream for MemRowStream {
    fn next_row(&mut self) -> std::result::Result<Option<Vec<Value>>, ExecutionError> {
        if self.open.is_none() {
            return Err(ExecutionError::StreamClosed);
        }
        Ok(self.rows.next())
    }

    fn close(&mut self) {
        if let Some(open) = self.open.take() {
            open.fetch_sub(1, Ordering::SeqCst);
        }
    }
}

impl Drop for MemRowStream {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ColumnDef;

    fn database() -> anyhow::Result<MemoryDatabase> {
        let db = MemoryDatabase::new(Dialect::Postgres);
        let cities = Table::builder("cities")
            .column(ColumnDef::integer("id").auto_increment())
            .column(ColumnDef::varchar("name", 50))
            .build()?;
        db.create_table(&cities)?;
        for name in ["St. Petersburg", "Munich", "Prague"] {
            db.execute(&Statement::new(
                "INSERT INTO cities (name) VALUES (?)",
                vec![Value::from(name)],
            ))?;
        }
        Ok(db)
    }

    fn rows(db: &MemoryDatabase, sql: &str, params: Vec<Value>) -> anyhow::Result<Vec<Vec<Value>>> {
        let mut stream = db.query(&Statement::new(sql, params))?;
        let mut rows = Vec::new();
        while let Some(row) = stream.next_row()? {
            rows.push(row);
        }
        stream.close();
        Ok(rows)
    }

    #[test]
    fn test_insert_and_select() -> anyhow::Result<()> {
        let db = database()?;
        assert_eq!(db.row_count("cities"), Some(3));
        let result = rows(
            &db,
            "SELECT cities.name FROM cities WHERE cities.id = ?",
            vec![Value::Int32(2)],
        )?;
        assert_eq!(result, vec![vec![Value::from("Munich")]]);
        Ok(())
    }

    #[test]
    fn test_generated_key() -> anyhow::Result<()> {
        let db = database()?;
        let outcome = db.execute(&Statement::new(
            "INSERT INTO cities (name) VALUES (?)",
            vec![Value::from("Berlin")],
        ))?;
        assert_eq!(outcome.generated_key, Some(Value::Int32(4)));
        Ok(())
    }

    #[test]
    fn test_order_and_limit() -> anyhow::Result<()> {
        let db = database()?;
        let result = rows(
            &db,
            "SELECT cities.id FROM cities ORDER BY cities.name DESC LIMIT 2 OFFSET 1",
            vec![],
        )?;
        assert_eq!(result, vec![vec![Value::Int32(2)], vec![Value::Int32(1)]]);
        Ok(())
    }

    #[test]
    fn test_count() -> anyhow::Result<()> {
        let db = database()?;
        let result = rows(
            &db,
            "SELECT COUNT(*) FROM cities WHERE cities.id > ?",
            vec![Value::Int32(1)],
        )?;
        assert_eq!(result, vec![vec![Value::Int64(2)]]);
        Ok(())
    }

    #[test]
    fn test_stream_accounting() -> anyhow::Result<()> {
        let db = database()?;
        let mut stream = db.query(&Statement::new("SELECT cities.id FROM cities", vec![]))?;
        assert_eq!(db.open_streams(), 1);
        stream.close();
        assert_eq!(db.open_streams(), 0);
        assert!(matches!(stream.next_row(), Err(ExecutionError::StreamClosed)));

        let stream = db.query(&Statement::new("SELECT cities.id FROM cities", vec![]))?;
        assert_eq!(db.open_streams(), 1);
        drop(stream);
        assert_eq!(db.open_streams(), 0);
        Ok(())
    }

    #[test]
    fn test_errors_are_reported() -> anyhow::Result<()> {
        let db = database()?;
        let err = db
            .query(&Statement::new("SELECT missing.id FROM missing", vec![]))
            .err()
            .expect("unknown table must fail");
        assert!(matches!(err, ExecutionError::Backend { ref sql, .. } if sql == "SELECT missing.id FROM missing"));

        assert!(db
            .query(&Statement::new("SELECT cities.id FROM cities WHERE cities.id = ?", vec![]))
            .is_err());
        assert_eq!(db.open_streams(), 0);
        assert!(db.create_table(&Table::builder("cities").column(ColumnDef::integer("id")).build()?).is_err());
        Ok(())
    }

    #[test]
    fn test_negation_overflow() -> anyhow::Result<()> {
        let db = database()?;
        let sql = "SELECT cities.id FROM cities WHERE cities.id = -?";
        for min in [Value::Int32(i32::MIN), Value::Int64(i64::MIN)] {
            let err = db
                .query(&Statement::new(sql, vec![min]))
                .err()
                .expect("negating the minimum overflows");
            assert!(err.to_string().contains("overflow"));
        }
        assert_eq!(rows(&db, sql, vec![Value::Int32(-2)])?, vec![vec![Value::Int32(2)]]);
        assert_eq!(db.open_streams(), 0);
        Ok(())
    }
}
