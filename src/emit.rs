//! SQL emission.
//!
//! Rendering is a pure function of the query and the dialect: every bound
//! value becomes a `?` placeholder and is appended to the parameter list in
//! placeholder order.

pub mod dialect;
pub mod render;

use crate::value::Value;
use std::fmt;

pub use dialect::Dialect;
pub use render::SqlRenderer;

/// SQL text plus the parameters bound to its placeholders
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<Value>,
}

impl Statement {
    pub fn new(sql: impl Into<String>, params: Vec<Value>) -> Self {
        Self {
            sql: sql.into(),
            params,
        }
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sql)?;
        if !self.params.is_empty() {
            let params = self
                .params
                .iter()
                .map(|p| p.to_string())
                .collect::<Vec<_>>()
                .join(", ");
            write!(f, " -- params: [{}]", params)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_statement_display() {
        let statement = Statement::new("SELECT cities.name FROM cities", vec![]);
        assert_eq!(statement.to_string(), "SELECT cities.name FROM cities");

        let statement = Statement::new(
            "SELECT users.id FROM users WHERE users.name = ? AND users.city_id = ?",
            vec![Value::from("O'Brien"), Value::Int32(2)],
        );
        assert_eq!(
            statement.to_string(),
            "SELECT users.id FROM users WHERE users.name = ? AND users.city_id = ? -- params: ['O''Brien', 2]"
        );
    }
}
