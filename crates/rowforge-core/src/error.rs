//! Error types for Rowforge operations.

use std::fmt;

/// Convenience alias used across the workspace.
pub type Result<T> = std::result::Result<T, Error>;

/// The primary error type for all Rowforge operations.
#[derive(Debug)]
pub enum Error {
    /// Metadata/configuration errors (missing keys, unknown types, cycles)
    Metadata(MetadataError),
    /// A write affected an unexpected number of rows
    RowCount(RowCountError),
    /// Constraint validation failures collected before any write
    Validation(ValidationError),
    /// Connection-related errors (open, close, transaction lifecycle)
    Connection(ConnectionError),
    /// Statement execution errors from the underlying driver
    Query(QueryError),
    /// Custom error with message
    Custom(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Metadata(e) => write!(f, "metadata error: {e}"),
            Error::RowCount(e) => write!(f, "row count error: {e}"),
            Error::Validation(e) => write!(f, "validation error: {e}"),
            Error::Connection(e) => write!(f, "connection error: {e}"),
            Error::Query(e) => write!(f, "query error: {e}"),
            Error::Custom(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for Error {}

/// Metadata/configuration error with a specific kind.
#[derive(Debug)]
pub struct MetadataError {
    pub kind: MetadataErrorKind,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetadataErrorKind {
    /// A non-complex entity type declares no key properties
    MissingKey,
    /// No entity type matches the requested name/identity
    UnknownEntityType,
    /// A complex property graph references one of its ancestors
    ComplexTypeCycle,
}

impl MetadataError {
    pub fn missing_key(type_name: &str) -> Self {
        Self {
            kind: MetadataErrorKind::MissingKey,
            message: format!("cannot find any key property for type '{type_name}'"),
        }
    }

    pub fn unknown_type(name: &str) -> Self {
        Self {
            kind: MetadataErrorKind::UnknownEntityType,
            message: format!("entity type '{name}' cannot be found in metadata"),
        }
    }

    pub fn complex_cycle(path: &[String]) -> Self {
        Self {
            kind: MetadataErrorKind::ComplexTypeCycle,
            message: format!("complex type cycle detected: {}", path.join(" -> ")),
        }
    }
}

impl fmt::Display for MetadataError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl From<MetadataError> for Error {
    fn from(e: MetadataError) -> Self {
        Error::Metadata(e)
    }
}

/// The save operation that produced a row-count mismatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOperation {
    Insert,
    Update,
    Delete,
}

impl SaveOperation {
    pub const fn as_str(&self) -> &'static str {
        match self {
            SaveOperation::Insert => "insert",
            SaveOperation::Update => "update",
            SaveOperation::Delete => "delete",
        }
    }
}

/// A write affected a row count other than exactly one.
///
/// For updates a zero count covers both a stale concurrency token and a
/// row that no longer exists; distinguishing the two is a caller concern.
#[derive(Debug)]
pub struct RowCountError {
    pub operation: SaveOperation,
    pub table: String,
    pub affected: u64,
}

impl RowCountError {
    pub fn new(operation: SaveOperation, table: impl Into<String>, affected: u64) -> Self {
        Self {
            operation,
            table: table.into(),
            affected,
        }
    }
}

impl fmt::Display for RowCountError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} on table '{}' affected {} rows, expected exactly 1",
            self.operation.as_str(),
            self.table,
            self.affected
        )
    }
}

impl From<RowCountError> for Error {
    fn from(e: RowCountError) -> Self {
        Error::RowCount(e)
    }
}

/// Aggregate of constraint validation failures across a batch.
#[derive(Debug, Clone, Default)]
pub struct ValidationError {
    pub failures: Vec<ValidationFailure>,
}

/// A single constraint failure on one property of one entity.
#[derive(Debug, Clone)]
pub struct ValidationFailure {
    /// Short name of the owning entity type
    pub entity: String,
    /// Property that failed (dotted path for nested complex values)
    pub property: String,
    /// The kind of constraint that was violated
    pub kind: ValidationFailureKind,
    /// Human-readable error message
    pub message: String,
}

/// The type of constraint that was violated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationFailureKind {
    /// Required (non-nullable) property is null or missing
    Required,
    /// String is longer than the maximum length
    MaxLength,
    /// Value doesn't match the regex pattern
    Pattern,
}

impl ValidationError {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn push(&mut self, failure: ValidationFailure) {
        self.failures.push(failure);
    }

    pub fn extend(&mut self, failures: Vec<ValidationFailure>) {
        self.failures.extend(failures);
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} validation failure(s)", self.failures.len())?;
        for failure in &self.failures {
            write!(
                f,
                "; {}.{}: {}",
                failure.entity, failure.property, failure.message
            )?;
        }
        Ok(())
    }
}

impl From<ValidationError> for Error {
    fn from(e: ValidationError) -> Self {
        Error::Validation(e)
    }
}

/// Connection lifecycle error.
#[derive(Debug)]
pub struct ConnectionError {
    pub kind: ConnectionErrorKind,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionErrorKind {
    /// Failed to open the connection
    Open,
    /// Connection lost during operation
    Disconnected,
    /// Transaction lifecycle violation (begin/commit/rollback mismatch)
    Transaction,
}

impl ConnectionError {
    pub fn new(kind: ConnectionErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for ConnectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl From<ConnectionError> for Error {
    fn from(e: ConnectionError) -> Self {
        Error::Connection(e)
    }
}

/// Statement execution error reported by the underlying driver.
#[derive(Debug)]
pub struct QueryError {
    pub sql: Option<String>,
    pub message: String,
}

impl QueryError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            sql: None,
            message: message.into(),
        }
    }

    pub fn with_sql(message: impl Into<String>, sql: impl Into<String>) -> Self {
        Self {
            sql: Some(sql.into()),
            message: message.into(),
        }
    }
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.sql {
            Some(sql) => write!(f, "{} (sql: {sql})", self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

impl From<QueryError> for Error {
    fn from(e: QueryError) -> Self {
        Error::Query(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_count_display() {
        let err = RowCountError::new(SaveOperation::Update, "Orders", 0);
        let text = err.to_string();
        assert!(text.contains("update"));
        assert!(text.contains("Orders"));
        assert!(text.contains("0 rows"));
    }

    #[test]
    fn test_metadata_error_kinds() {
        assert_eq!(
            MetadataError::missing_key("Order").kind,
            MetadataErrorKind::MissingKey
        );
        assert_eq!(
            MetadataError::unknown_type("Ghost").kind,
            MetadataErrorKind::UnknownEntityType
        );
    }

    #[test]
    fn test_complex_cycle_message_names_path() {
        let err = MetadataError::complex_cycle(&[
            "Address".to_string(),
            "Region".to_string(),
            "Address".to_string(),
        ]);
        assert!(err.message.contains("Address -> Region -> Address"));
    }

    #[test]
    fn test_validation_error_aggregates() {
        let mut err = ValidationError::new();
        assert!(err.is_empty());
        err.push(ValidationFailure {
            entity: "Customer".to_string(),
            property: "name".to_string(),
            kind: ValidationFailureKind::Required,
            message: "value is required".to_string(),
        });
        assert!(!err.is_empty());
        assert!(err.to_string().contains("Customer.name"));
    }

    #[test]
    fn test_error_display_prefixes() {
        let err = Error::from(RowCountError::new(SaveOperation::Insert, "t", 2));
        assert!(err.to_string().starts_with("row count error"));
        let err = Error::Custom("boom".to_string());
        assert_eq!(err.to_string(), "boom");
    }
}
