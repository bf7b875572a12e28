//! Sessions bind queries to a backend.

use crate::backend::{Backend, RowStream, UpdateOutcome};
use crate::emit::{Dialect, Statement};
use crate::error::Result;
use log::debug;
use parking_lot::Mutex;
use std::env;
use std::sync::Arc;

/// Log target of executed statements
pub const SQL_LOG_TARGET: &str = "sqlkit::sql";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    /// Emit every statement at debug level under [`SQL_LOG_TARGET`]
    pub log_statements: bool,
    /// Keep every statement in the session's [`StatementLog`]
    pub record_statements: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            log_statements: true,
            record_statements: false,
        }
    }
}

impl SessionConfig {
    /// Defaults overridden by `SQLKIT_LOG_STATEMENTS` and `SQLKIT_RECORD_STATEMENTS`
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            log_statements: env_flag("SQLKIT_LOG_STATEMENTS").unwrap_or(defaults.log_statements),
            record_statements: env_flag("SQLKIT_RECORD_STATEMENTS")
                .unwrap_or(defaults.record_statements),
        }
    }
}

fn env_flag(name: &str) -> Option<bool> {
    env::var(name).ok().map(|v| parse_flag(&v))
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

/// Statements executed by a session, in execution order
#[derive(Debug, Default)]
pub struct StatementLog {
    entries: Mutex<Vec<Statement>>,
}

impl StatementLog {
    fn record(&self, statement: &Statement) {
        self.entries.lock().push(statement.clone());
    }

    pub fn entries(&self) -> Vec<Statement> {
        self.entries.lock().clone()
    }

    /// Drain the log
    pub fn take(&self) -> Vec<Statement> {
        std::mem::take(&mut *self.entries.lock())
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

pub struct Session {
    backend: Arc<dyn Backend>,
    config: SessionConfig,
    log: StatementLog,
}

impl Session {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self::with_config(backend, SessionConfig::default())
    }

    pub fn with_config(backend: Arc<dyn Backend>, config: SessionConfig) -> Self {
        Self {
            backend,
            config,
            log: StatementLog::default(),
        }
    }

    pub fn dialect(&self) -> Dialect {
        self.backend.dialect()
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Recorded statements; empty unless `record_statements` is set
    pub fn statement_log(&self) -> &StatementLog {
        &self.log
    }

    /// Execute a SELECT and return the raw row stream
    pub fn open(&self, statement: &Statement) -> Result<Box<dyn RowStream>> {
        self.trace(statement);
        Ok(self.backend.query(statement)?)
    }

    /// Execute a statement that returns no rows
    pub fn execute(&self, statement: &Statement) -> Result<UpdateOutcome> {
        self.trace(statement);
        Ok(self.backend.execute(statement)?)
    }

    fn trace(&self, statement: &Statement) {
        if self.config.log_statements {
            debug!(target: SQL_LOG_TARGET, "{}", statement);
        }
        if self.config.record_statements {
            self.log.record(statement);
        }
    }
}
