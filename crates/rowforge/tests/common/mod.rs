//! Shared fixtures for the integration suite: a scriptable mock driver
//! and the metadata shapes the scenarios use.

#![allow(dead_code)]

use rowforge::prelude::*;
use std::collections::VecDeque;
use std::sync::Arc;

/// A scripted in-memory driver.
///
/// `execute` answers from a queue of scripted results (defaulting to one
/// affected row), `query_one` from a queue of scripted rows. Every
/// statement and lifecycle event is recorded for assertions.
pub struct MockConnection {
    state: ConnectionState,
    exec_results: VecDeque<Result<u64>>,
    rows: VecDeque<Option<Row>>,
    fail_open: bool,
    /// Executed statements with their bound parameters, in order
    pub executed: Vec<(String, Vec<Parameter>)>,
    /// Lifecycle events: open, close, begin, commit, rollback
    pub events: Vec<&'static str>,
}

impl MockConnection {
    pub fn new() -> Self {
        Self {
            state: ConnectionState::Closed,
            exec_results: VecDeque::new(),
            rows: VecDeque::new(),
            fail_open: false,
            executed: Vec::new(),
            events: Vec::new(),
        }
    }

    /// Start in the open state.
    pub fn opened(mut self) -> Self {
        self.state = ConnectionState::Open;
        self
    }

    /// Script the next `execute` call's affected-row count.
    pub fn script_execute(mut self, affected: u64) -> Self {
        self.exec_results.push_back(Ok(affected));
        self
    }

    /// Script the next `execute` call to fail with a driver error.
    pub fn script_execute_err(mut self, error: Error) -> Self {
        self.exec_results.push_back(Err(error));
        self
    }

    /// Make `open` fail with a connection error.
    pub fn refuse_open(mut self) -> Self {
        self.fail_open = true;
        self
    }

    /// Script the next `query_one` call's row.
    pub fn script_row(mut self, row: Option<Row>) -> Self {
        self.rows.push_back(row);
        self
    }

    /// The SQL texts executed so far.
    pub fn sql(&self) -> Vec<&str> {
        self.executed.iter().map(|(sql, _)| sql.as_str()).collect()
    }

    /// Find the bound value of a parameter on the `index`-th statement.
    pub fn bound(&self, index: usize, name: &str) -> Option<&Value> {
        self.executed[index]
            .1
            .iter()
            .find(|p| p.name == name)
            .map(|p| &p.value)
    }
}

impl Connection for MockConnection {
    fn state(&self) -> ConnectionState {
        self.state
    }

    fn open(&mut self) -> Result<()> {
        if self.fail_open {
            return Err(rowforge::ConnectionError::new(
                rowforge::ConnectionErrorKind::Open,
                "connection refused",
            )
            .into());
        }
        self.state = ConnectionState::Open;
        self.events.push("open");
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.state = ConnectionState::Closed;
        self.events.push("close");
        Ok(())
    }

    fn begin_transaction(&mut self) -> Result<()> {
        self.events.push("begin");
        Ok(())
    }

    fn commit(&mut self) -> Result<()> {
        self.events.push("commit");
        Ok(())
    }

    fn rollback(&mut self) -> Result<()> {
        self.events.push("rollback");
        Ok(())
    }

    fn execute(&mut self, sql: &str, params: &[Parameter]) -> Result<u64> {
        self.executed.push((sql.to_string(), params.to_vec()));
        self.exec_results.pop_front().unwrap_or(Ok(1))
    }

    fn query_one(&mut self, sql: &str, params: &[Parameter]) -> Result<Option<Row>> {
        self.executed.push((sql.to_string(), params.to_vec()));
        Ok(self.rows.pop_front().unwrap_or(None))
    }
}

/// `Order` with an identity key and a plain number column.
pub fn order_type() -> Arc<EntityType> {
    Arc::new(
        EntityType::new("Order", "Orders")
            .query_name("Orders")
            .key(DataProperty::new("id").generation(GenerationPattern::Identity))
            .property(DataProperty::new("number")),
    )
}

/// `OrderLine` referencing `Order` through `order_id`.
pub fn order_line_type() -> Arc<EntityType> {
    Arc::new(
        EntityType::new("OrderLine", "OrderLines")
            .query_name("OrderLines")
            .key(DataProperty::new("id"))
            .property(DataProperty::new("order_id"))
            .property(DataProperty::new("quantity"))
            .navigation(NavigationProperty::new(
                "order",
                "Order",
                vec!["order_id".to_string()],
            )),
    )
}

/// `Customer` with a plain key and a name column.
pub fn customer_type() -> Arc<EntityType> {
    Arc::new(
        EntityType::new("Customer", "Customers")
            .query_name("Customers")
            .key(DataProperty::new("id"))
            .property(DataProperty::new("name")),
    )
}

/// `Customer` variant carrying a concurrency token.
pub fn versioned_customer_type() -> Arc<EntityType> {
    Arc::new(
        EntityType::new("Customer", "Customers")
            .query_name("Customers")
            .key(DataProperty::new("id"))
            .property(DataProperty::new("name"))
            .property(DataProperty::new("row_version").concurrency_token()),
    )
}

/// Single-row result holding one bigint column.
pub fn bigint_row(column: &str, value: i64) -> Option<Row> {
    Some(Row::new(vec![column.to_string()], vec![Value::BigInt(value)]))
}
