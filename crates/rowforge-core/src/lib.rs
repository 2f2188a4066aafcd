//! Core types and traits for the Rowforge persistence engine.
//!
//! This crate is the leaf of the workspace: the dynamic [`Value`] type,
//! result [`Row`]s, the entity metadata model, the SQL dialect policy,
//! property access for entity instances, the relational command boundary,
//! the error taxonomy, and metadata-driven constraint validation.
//!
//! Nothing here executes SQL; the save pipeline lives in `rowforge-save`.

pub mod connection;
pub mod dialect;
pub mod entity;
pub mod error;
pub mod meta;
pub mod row;
pub mod validate;
pub mod value;

pub use connection::{Connection, ConnectionState, Parameter};
pub use dialect::{DatabaseKind, quote_ident, quote_ident_brackets, quote_ident_mysql};
pub use entity::{DynamicEntity, PropertyAccessor, descend, descend_mut};
pub use error::{
    ConnectionError, ConnectionErrorKind, Error, MetadataError, MetadataErrorKind, QueryError,
    Result, RowCountError, SaveOperation, ValidationError, ValidationFailure,
    ValidationFailureKind,
};
pub use meta::{
    ComplexProperty, DataProperty, EntityType, GenerationPattern, Metadata, NavigationProperty,
    PropertyMapping,
};
pub use row::{ColumnInfo, Row};
pub use validate::validate_entity;
pub use value::Value;
