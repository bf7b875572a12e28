//! Target database dialects.

use std::fmt;
use std::str::FromStr;

/// SQL dialect the renderer targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Dialect {
    #[default]
    Postgres,
    MySql,
    Sqlite,
    SqlServer,
    Oracle,
}

impl Dialect {
    pub const ALL: [Dialect; 5] = [
        Dialect::Postgres,
        Dialect::MySql,
        Dialect::Sqlite,
        Dialect::SqlServer,
        Dialect::Oracle,
    ];

    /// Rendering of a constant predicate
    pub fn boolean_literal(&self, value: bool) -> &'static str {
        match (self, value) {
            (Dialect::SqlServer | Dialect::Oracle, true) => "1 = 1",
            (Dialect::SqlServer | Dialect::Oracle, false) => "1 = 0",
            (_, true) => "TRUE",
            (_, false) => "FALSE",
        }
    }

    /// Whether `(a, b) IN ((?, ?), ...)` is accepted
    pub fn supports_tuple_in_list(&self) -> bool {
        matches!(self, Dialect::Postgres | Dialect::MySql | Dialect::Oracle)
    }

    /// Whether `(a, b) IN (SELECT ...)` is accepted
    pub fn supports_tuple_in_subquery(&self) -> bool {
        !matches!(self, Dialect::SqlServer)
    }

    /// Quote an identifier when it is a reserved word or not a plain name
    pub fn quote_identifier(&self, ident: &str) -> String {
        if needs_quoting(ident) {
            format!("\"{}\"", ident.replace('"', "\"\""))
        } else {
            ident.to_string()
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Dialect::Postgres => "postgres",
            Dialect::MySql => "mysql",
            Dialect::Sqlite => "sqlite",
            Dialect::SqlServer => "sqlserver",
            Dialect::Oracle => "oracle",
        };
        f.write_str(name)
    }
}

impl FromStr for Dialect {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(Dialect::Postgres),
            "mysql" => Ok(Dialect::MySql),
            "sqlite" => Ok(Dialect::Sqlite),
            "sqlserver" | "mssql" => Ok(Dialect::SqlServer),
            "oracle" => Ok(Dialect::Oracle),
            other => Err(format!("Unknown dialect: {}", other)),
        }
    }
}

const RESERVED: &[&str] = &[
    "ALL", "AND", "ANY", "AS", "ASC", "BETWEEN", "BY", "CASE", "CHECK", "CREATE", "DEFAULT",
    "DELETE", "DESC", "DISTINCT", "DROP", "ELSE", "END", "EXISTS", "FALSE", "FETCH", "FIRST",
    "FROM", "GROUP", "HAVING", "IN", "INSERT", "INTO", "IS", "JOIN", "KEY", "LIKE", "LIMIT",
    "NEXT", "NOT", "NULL", "OFFSET", "ON", "ONLY", "OR", "ORDER", "PRIMARY", "ROW", "ROWS",
    "SELECT", "SET", "TABLE", "THEN", "TOP", "TRUE", "UNION", "UNIQUE", "UPDATE", "USER",
    "VALUES", "WHEN", "WHERE",
];

fn needs_quoting(ident: &str) -> bool {
    let mut chars = ident.chars();
    let plain = match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    };
    !plain || RESERVED.contains(&ident.to_ascii_uppercase().as_str())
}
