//! The Rowforge batch save pipeline.
//!
//! Given a batch of change records ([`EntityBag`]s: inserted, modified,
//! or deleted entities, possibly with nested complex values), the
//! [`SaveEngine`] synthesizes the SQL to apply them inside one
//! transaction, reads database-generated values back onto the in-memory
//! instances, propagates generated keys forward to dependent records in
//! the same batch, and reports affected-row counts plus generated values
//! in a [`SaveResult`].
//!
//! The pipeline is synchronous and strictly sequential within a batch:
//! forward key propagation requires each record's generated values to
//! exist before later records are written. Separate batches on separate
//! connections run independently; the only shared state is the
//! [`MetadataCache`].

pub mod bag;
pub mod cache;
pub mod resolver;
pub mod save;
pub mod statement;

pub use bag::{EntityBag, EntityState, GeneratedValue, SaveContext, SaveResult};
pub use cache::MetadataCache;
pub use resolver::resolve_generated;
pub use save::{SaveEngine, SaveObserver, UnmappedHandler};
pub use statement::{
    DeferredColumn, DeletePlan, InsertPlan, RowFilter, SqlStatement, UpdatePlan, build_delete,
    build_insert, build_update,
};
