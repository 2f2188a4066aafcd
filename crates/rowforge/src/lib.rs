//! Rowforge: metadata-driven batch persistence for relational databases.
//!
//! Rowforge takes a batch of entity change records (inserted, modified,
//! or deleted domain objects, possibly with nested complex values),
//! generates the SQL needed to apply them, executes everything inside one
//! transaction, propagates database-generated key values to dependent
//! records in the same batch, enforces exactly-one-row-affected and
//! optimistic-concurrency checks, and reports affected-row counts plus
//! newly generated values back to the caller.
//!
//! # Quick start
//!
//! ```ignore
//! use rowforge::prelude::*;
//! use std::sync::Arc;
//!
//! // Describe the shapes once (or resolve them through MetadataCache).
//! let order = Arc::new(
//!     EntityType::new("Order", "Orders")
//!         .key(DataProperty::new("id").generation(GenerationPattern::Identity))
//!         .property(DataProperty::new("number")),
//! );
//! let line = Arc::new(
//!     EntityType::new("OrderLine", "OrderLines")
//!         .key(DataProperty::new("id"))
//!         .property(DataProperty::new("order_id"))
//!         .navigation(NavigationProperty::new(
//!             "order",
//!             "Order",
//!             vec!["order_id".to_string()],
//!         )),
//! );
//!
//! // One batch: the order first, its line after (forward propagation).
//! let mut bags = vec![
//!     EntityBag::added(
//!         0,
//!         DynamicEntity::new().with("id", -1i64).with("number", "A-17"),
//!         order,
//!     ),
//!     EntityBag::added(
//!         1,
//!         DynamicEntity::new().with("id", 10i64).with("order_id", -1i64),
//!         line,
//!     ),
//! ];
//!
//! let mut engine = SaveEngine::new(DatabaseKind::SqlServer);
//! let result = engine.save(&mut conn, &mut bags, SaveContext::new())?;
//! assert_eq!(result.affected_count(), 2);
//!
//! // The line's foreign key now holds the database-assigned order id.
//! assert_eq!(bags[1].entity.get("order_id"), bags[0].entity.get("id"));
//! ```
//!
//! # Crates
//!
//! - `rowforge-core`: values, rows, metadata, dialect policy, property
//!   access, the connection boundary, errors, and validation.
//! - `rowforge-save`: statement synthesis, generated-value read-back,
//!   the batch save coordinator, and the metadata cache.

pub use rowforge_core::{
    ColumnInfo, ComplexProperty, Connection, ConnectionError, ConnectionErrorKind,
    ConnectionState, DataProperty, DatabaseKind, DynamicEntity, EntityType, Error,
    GenerationPattern, Metadata, MetadataError, MetadataErrorKind, NavigationProperty, Parameter,
    PropertyAccessor, PropertyMapping, QueryError, Result, Row, RowCountError, SaveOperation,
    ValidationError, ValidationFailure, ValidationFailureKind, Value, descend, descend_mut,
    quote_ident, quote_ident_brackets, quote_ident_mysql, validate_entity,
};
pub use rowforge_save::{
    DeferredColumn, DeletePlan, EntityBag, EntityState, GeneratedValue, InsertPlan, MetadataCache,
    RowFilter, SaveContext, SaveEngine, SaveObserver, SaveResult, SqlStatement, UnmappedHandler,
    UpdatePlan, build_delete, build_insert, build_update, resolve_generated,
};

/// Convenience re-exports for the common save workflow.
pub mod prelude {
    pub use rowforge_core::{
        ComplexProperty, Connection, ConnectionState, DataProperty, DatabaseKind, DynamicEntity,
        EntityType, Error, GenerationPattern, Metadata, NavigationProperty, Parameter,
        PropertyAccessor, Result, Row, SaveOperation, Value,
    };
    pub use rowforge_save::{
        EntityBag, EntityState, GeneratedValue, MetadataCache, SaveContext, SaveEngine,
        SaveObserver, SaveResult, UnmappedHandler,
    };
}
