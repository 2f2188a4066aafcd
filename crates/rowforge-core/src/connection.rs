//! The relational command boundary.
//!
//! The engine terminates at this trait: execute a parameterized
//! non-query, read a single row back, and drive one transaction. A driver
//! (or a test double) implements it; the engine never talks to a socket
//! or a file itself.
//!
//! The engine is synchronous and single-threaded within a batch, so the
//! trait is synchronous too. One connection serves one batch at a time.

use crate::error::Result;
use crate::row::Row;
use crate::value::Value;

/// Open/closed state of a connection.
///
/// The save pipeline records this before touching the connection and
/// restores it on every exit path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Connection is open and usable.
    Open,
    /// Connection is closed.
    Closed,
}

/// A named statement parameter.
///
/// Statements render placeholders as `@name`; drivers bind by name.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    /// Bare parameter name (no `@` prefix)
    pub name: String,
    /// Bound value; `Value::Null` binds SQL NULL
    pub value: Value,
}

impl Parameter {
    /// Create a new named parameter.
    pub fn new(name: impl Into<String>, value: Value) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }

    /// The placeholder text for this parameter in SQL.
    pub fn placeholder(&self) -> String {
        format!("@{}", self.name)
    }
}

/// A database connection capable of executing commands in a transaction.
///
/// Transaction verbs are part of the connection itself: one transaction is
/// active at most, spanning whatever statements execute between
/// [`begin_transaction`](Connection::begin_transaction) and
/// [`commit`](Connection::commit)/[`rollback`](Connection::rollback).
pub trait Connection {
    /// Current open/closed state.
    fn state(&self) -> ConnectionState;

    /// Open the connection. Opening an open connection is an error.
    fn open(&mut self) -> Result<()>;

    /// Close the connection.
    fn close(&mut self) -> Result<()>;

    /// Begin a transaction spanning subsequent statements.
    fn begin_transaction(&mut self) -> Result<()>;

    /// Commit the active transaction.
    fn commit(&mut self) -> Result<()>;

    /// Roll back the active transaction.
    fn rollback(&mut self) -> Result<()>;

    /// Execute a statement (INSERT, UPDATE, DELETE) and return rows affected.
    fn execute(&mut self, sql: &str, params: &[Parameter]) -> Result<u64>;

    /// Execute a query and return the first row, if any.
    fn query_one(&mut self, sql: &str, params: &[Parameter]) -> Result<Option<Row>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parameter_placeholder() {
        let param = Parameter::new("city", Value::Text("Vienna".to_string()));
        assert_eq!(param.placeholder(), "@city");
        assert_eq!(param.name, "city");
    }

    #[test]
    fn test_parameter_null_binding() {
        let param = Parameter::new("nick", Value::Null);
        assert!(param.value.is_null());
    }

    #[test]
    fn test_connection_state_equality() {
        assert_eq!(ConnectionState::Open, ConnectionState::Open);
        assert_ne!(ConnectionState::Open, ConnectionState::Closed);
    }
}
