//! Read-back of database-generated values.
//!
//! After a write that deferred `Identity`/`Computed` columns, one SELECT
//! keyed by the just-written row fetches the database-assigned values and
//! writes them back onto the in-memory instances. Zero rows yields zero
//! assignments; the preceding write already validated that the row
//! exists, so an empty read-back just means nothing was computed.

use crate::statement::{DeferredColumn, RowFilter};
use rowforge_core::{
    Connection, DatabaseKind, Error, PropertyAccessor, Result, Value, descend_mut,
};

/// Resolve deferred columns for one just-written row.
///
/// Returns the applied assignments as `(property path, value)` pairs;
/// nested owners report a dotted path. SQL NULL maps to [`Value::Null`].
pub fn resolve_generated<C: Connection>(
    conn: &mut C,
    kind: DatabaseKind,
    table_name: &str,
    deferred: &[DeferredColumn],
    key_filter: &RowFilter,
    entity: &mut dyn PropertyAccessor,
) -> Result<Vec<(String, Value)>> {
    if deferred.is_empty() {
        return Ok(Vec::new());
    }

    let columns: Vec<String> = deferred
        .iter()
        .map(|d| kind.quote(&d.property.column_name))
        .collect();
    let sql = format!(
        "select {} from {} where {}",
        columns.join(", "),
        kind.quote(table_name),
        key_filter.clause()
    );
    tracing::debug!(table = table_name, sql = %sql, "Reading back generated values");

    let Some(row) = conn.query_one(&sql, &key_filter.parameters)? else {
        tracing::trace!(table = table_name, "No row returned; nothing to assign");
        return Ok(Vec::new());
    };

    let mut assignments = Vec::new();
    for deferred_column in deferred {
        let value = row
            .get_by_name(&deferred_column.property.column_name)
            .cloned()
            .unwrap_or(Value::Null);
        let owner = descend_mut(entity, &deferred_column.owner_path).ok_or_else(|| {
            Error::Custom(format!(
                "cannot reach owner of generated property '{}'",
                deferred_column.property.name
            ))
        })?;
        owner.set(&deferred_column.property.name, value.clone());

        let mut path = deferred_column.owner_path.join(".");
        if path.is_empty() {
            path = deferred_column.property.name.clone();
        } else {
            path.push('.');
            path.push_str(&deferred_column.property.name);
        }
        assignments.push((path, value));
    }
    Ok(assignments)
}
