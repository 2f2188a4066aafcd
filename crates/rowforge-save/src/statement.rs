//! SQL statement synthesis for insert, update, and delete.
//!
//! Builders here are pure: given an entity instance, its metadata, and a
//! dialect, they produce parameterized SQL text plus named parameter
//! lists without executing anything. Table-per-type inheritance yields
//! one plan per level (base rows first for writes, most-derived first
//! for deletes); nested complex values flatten into the owning table's
//! column list; database-generated columns defer to a post-write
//! read-back carried on the plan.

use rowforge_core::{
    ComplexProperty, DataProperty, DatabaseKind, EntityType, Error, GenerationPattern, Parameter,
    PropertyAccessor, Result, Value,
};
use std::collections::HashSet;

/// A parameterized SQL statement.
#[derive(Debug, Clone)]
pub struct SqlStatement {
    /// SQL text with `@name` placeholders
    pub sql: String,
    /// Named parameters in placeholder order
    pub parameters: Vec<Parameter>,
}

/// A column whose value the database generates.
///
/// The owning instance is addressed by `owner_path`, the chain of complex
/// property names leading from the root entity to the instance the value
/// must be written back onto (empty for the root itself).
#[derive(Debug, Clone)]
pub struct DeferredColumn {
    pub property: DataProperty,
    pub owner_path: Vec<String>,
}

/// WHERE-clause fragment identifying one row.
#[derive(Debug, Clone, Default)]
pub struct RowFilter {
    /// Rendered predicates, joined with `and`
    pub predicates: Vec<String>,
    /// Parameters backing the predicates
    pub parameters: Vec<Parameter>,
}

impl RowFilter {
    /// Check if the filter has no predicates.
    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    /// Render the predicates as one clause.
    pub fn clause(&self) -> String {
        self.predicates.join(" and ")
    }
}

/// One INSERT, covering one table of the entity's inheritance chain.
#[derive(Debug, Clone)]
pub struct InsertPlan {
    /// Unescaped table name (for diagnostics and errors)
    pub table: String,
    pub statement: SqlStatement,
    /// Generated columns to read back after the insert
    pub deferred: Vec<DeferredColumn>,
    /// Row filter for the read-back; identity keys use the dialect's
    /// identity-select expression since their value is not in memory yet
    pub key_filter: RowFilter,
}

/// One UPDATE, covering one table of the entity's inheritance chain.
///
/// `statement` is absent when nothing is in the SET list but concurrency
/// filters exist; the level still counts as affected and any computed
/// read-back still runs.
#[derive(Debug, Clone)]
pub struct UpdatePlan {
    pub table: String,
    pub statement: Option<SqlStatement>,
    pub deferred: Vec<DeferredColumn>,
    pub key_filter: RowFilter,
}

/// One DELETE, covering one table of the entity's inheritance chain.
#[derive(Debug, Clone)]
pub struct DeletePlan {
    pub table: String,
    pub statement: SqlStatement,
}

/// Build the INSERT plans for an entity, base-type rows first.
pub fn build_insert(
    entity: &dyn PropertyAccessor,
    entity_type: &EntityType,
    kind: DatabaseKind,
) -> Result<Vec<InsertPlan>> {
    let mut plans = Vec::new();
    build_insert_level(entity, entity_type, kind, &mut plans)?;
    Ok(plans)
}

fn build_insert_level(
    entity: &dyn PropertyAccessor,
    entity_type: &EntityType,
    kind: DatabaseKind,
    plans: &mut Vec<InsertPlan>,
) -> Result<()> {
    // Table-per-type: the base row is written first, so the shared key
    // exists before the derived row references it.
    if let Some(base_type) = &entity_type.base_type {
        build_insert_level(entity, base_type, kind, plans)?;
    }

    let mut columns = Vec::new();
    let mut parameters = Vec::new();
    let mut seen = HashSet::new();
    let mut deferred = Vec::new();

    let mut data_properties: Vec<&DataProperty> = entity_type.data_properties.iter().collect();
    if entity_type.base_type.is_some() {
        // A derived level writes the shared key columns as if they were
        // its own.
        data_properties.extend(entity_type.key_properties.iter());
    }

    for property in data_properties {
        if property.generation == GenerationPattern::None {
            push_column(
                kind,
                &property.column_name,
                true,
                entity.get(&property.name).unwrap_or(Value::Null),
                &mut columns,
                &mut parameters,
                &mut seen,
            );
        } else {
            push_deferred(&mut deferred, property, Vec::new());
        }
    }

    let mut path = Vec::new();
    populate_complex_properties(
        entity,
        entity_type,
        kind,
        true,
        &mut path,
        &mut columns,
        &mut parameters,
        &mut seen,
        &mut deferred,
    )?;

    let placeholders: Vec<String> = parameters.iter().map(Parameter::placeholder).collect();
    let sql = format!(
        "insert into {} ({}) values ({})",
        kind.quote(&entity_type.table_name),
        columns.join(", "),
        placeholders.join(", ")
    );

    let key_filter = if deferred.is_empty() {
        RowFilter::default()
    } else {
        populate_key_filters(entity, entity_type, kind, true)?
    };

    plans.push(InsertPlan {
        table: entity_type.table_name.clone(),
        statement: SqlStatement { sql, parameters },
        deferred,
        key_filter,
    });
    Ok(())
}

/// Build the UPDATE plans for an entity, base-type rows first.
///
/// `modified` names the changed properties; dotted names reach into
/// complex values. An empty list with `force_update` off is a no-op for
/// the whole chain.
pub fn build_update(
    entity: &dyn PropertyAccessor,
    entity_type: &EntityType,
    modified: &[String],
    force_update: bool,
    kind: DatabaseKind,
) -> Result<Vec<UpdatePlan>> {
    let mut plans = Vec::new();
    if !force_update && modified.is_empty() {
        return Ok(plans);
    }
    build_update_level(entity, entity_type, modified, force_update, kind, &mut plans)?;
    Ok(plans)
}

fn build_update_level(
    entity: &dyn PropertyAccessor,
    entity_type: &EntityType,
    modified: &[String],
    force_update: bool,
    kind: DatabaseKind,
    plans: &mut Vec<UpdatePlan>,
) -> Result<()> {
    if let Some(base_type) = &entity_type.base_type {
        build_update_level(entity, base_type, modified, force_update, kind, plans)?;
    }

    let mut set_clauses = Vec::new();
    let mut parameters = Vec::new();
    let mut seen = HashSet::new();
    let mut deferred = Vec::new();

    let mut modified_list: Vec<String> = modified.to_vec();
    if modified_list.is_empty() && force_update {
        // Force-update with no explicit list: every data property is
        // modified, complex subtrees included.
        modified_list = entity_type
            .data_properties
            .iter()
            .map(|p| p.name.clone())
            .collect();
        let mut path = Vec::new();
        populate_complex_properties(
            entity,
            entity_type,
            kind,
            false,
            &mut path,
            &mut set_clauses,
            &mut parameters,
            &mut seen,
            &mut deferred,
        )?;
    }

    for modified_property in &modified_list {
        let segments: Vec<&str> = modified_property.split('.').collect();
        let mut last_property_name: &str = modified_property;
        let mut last_column_name: Option<String> = None;
        let mut loop_entity: &dyn PropertyAccessor = entity;
        let mut loop_entity_type: &EntityType = entity_type;
        let mut owner_path: Vec<String> = Vec::new();

        if segments.len() > 1 {
            let mut owner_property: Option<&ComplexProperty> = None;
            for segment in &segments[..segments.len() - 1] {
                owner_property = loop_entity_type.find_complex_property(segment);
                let Some(complex_property) = owner_property else {
                    break;
                };
                let Some(next) = loop_entity.nested(segment) else {
                    owner_property = None;
                    break;
                };
                loop_entity = next;
                loop_entity_type = &complex_property.complex_type;
                owner_path.push((*segment).to_string());
            }
            // An unresolvable path is a no-op for this one name.
            let Some(owner_property) = owner_property else {
                continue;
            };
            last_property_name = segments[segments.len() - 1];
            last_column_name = owner_property
                .column_for(last_property_name)
                .map(str::to_string);
        }

        // A complex property name marks its whole subtree modified.
        if let Some(complex_property) = loop_entity_type.find_complex_property(last_property_name)
        {
            populate_complex_type(
                loop_entity,
                complex_property,
                kind,
                false,
                &mut owner_path,
                &mut set_clauses,
                &mut parameters,
                &mut seen,
                &mut deferred,
            )?;
            continue;
        }

        let Some(data_property) = loop_entity_type.find_data_property(last_property_name) else {
            continue;
        };
        // Key columns never enter the SET list.
        if entity_type.is_key(&data_property.name) {
            continue;
        }

        let column_name =
            last_column_name.unwrap_or_else(|| data_property.column_name.clone());
        if seen.contains(&column_name) {
            continue;
        }
        match data_property.generation {
            GenerationPattern::None => {
                seen.insert(column_name.clone());
                set_clauses.push(format!("{} = @{}", kind.quote(&column_name), column_name));
                parameters.push(Parameter::new(
                    column_name,
                    loop_entity.get(&data_property.name).unwrap_or(Value::Null),
                ));
            }
            GenerationPattern::Computed => {
                push_deferred(&mut deferred, data_property, owner_path.clone());
            }
            // Identity values are never written by an update.
            GenerationPattern::Identity => {}
        }
    }

    let mut concurrency = RowFilter::default();
    populate_concurrency_filters(entity, entity_type, kind, None, &mut concurrency)?;

    // Nothing to set and nothing to guard: this level is a no-op.
    if parameters.is_empty() && concurrency.is_empty() {
        return Ok(());
    }

    let key_filter = populate_key_filters(entity, entity_type, kind, false)?;

    let statement = if parameters.is_empty() {
        None
    } else {
        let mut predicates = key_filter.predicates.clone();
        for predicate in &concurrency.predicates {
            if !predicates.contains(predicate) {
                predicates.push(predicate.clone());
            }
        }
        let mut all_parameters = parameters;
        for parameter in key_filter
            .parameters
            .iter()
            .chain(concurrency.parameters.iter())
        {
            if !all_parameters.iter().any(|p| p.name == parameter.name) {
                all_parameters.push(parameter.clone());
            }
        }
        let sql = format!(
            "update {} set {} where {}",
            kind.quote(&entity_type.table_name),
            set_clauses.join(", "),
            predicates.join(" and ")
        );
        Some(SqlStatement {
            sql,
            parameters: all_parameters,
        })
    };

    plans.push(UpdatePlan {
        table: entity_type.table_name.clone(),
        statement,
        deferred,
        key_filter,
    });
    Ok(())
}

/// Build the DELETE plans for an entity, most-derived row first.
///
/// The child table's foreign key onto the base table requires the child
/// row to go first, the reverse of insert order.
pub fn build_delete(
    entity: &dyn PropertyAccessor,
    entity_type: &EntityType,
    kind: DatabaseKind,
) -> Result<Vec<DeletePlan>> {
    let mut plans = Vec::new();
    build_delete_level(entity, entity_type, kind, &mut plans)?;
    Ok(plans)
}

fn build_delete_level(
    entity: &dyn PropertyAccessor,
    entity_type: &EntityType,
    kind: DatabaseKind,
    plans: &mut Vec<DeletePlan>,
) -> Result<()> {
    let key_filter = populate_key_filters(entity, entity_type, kind, false)?;
    let sql = format!(
        "delete from {} where {}",
        kind.quote(&entity_type.table_name),
        key_filter.clause()
    );
    plans.push(DeletePlan {
        table: entity_type.table_name.clone(),
        statement: SqlStatement {
            sql,
            parameters: key_filter.parameters,
        },
    });

    if let Some(base_type) = &entity_type.base_type {
        build_delete_level(entity, base_type, kind, plans)?;
    }
    Ok(())
}

/// Build the row filter from an entity's key properties.
///
/// On insert, an identity key's value does not exist in memory yet, so
/// its predicate uses the dialect's identity-select expression instead of
/// a parameter.
pub fn populate_key_filters(
    entity: &dyn PropertyAccessor,
    entity_type: &EntityType,
    kind: DatabaseKind,
    is_insert: bool,
) -> Result<RowFilter> {
    entity_type.ensure_keys()?;
    let mut filter = RowFilter::default();
    for key_property in &entity_type.key_properties {
        push_filter(entity, key_property, kind, is_insert, None, &mut filter);
    }
    Ok(filter)
}

/// Build the concurrency-token filter for an update's WHERE clause.
///
/// Tokens inside complex values participate too, renamed through the
/// immediate owner's mapping table.
pub fn populate_concurrency_filters(
    entity: &dyn PropertyAccessor,
    entity_type: &EntityType,
    kind: DatabaseKind,
    owner: Option<&ComplexProperty>,
    filter: &mut RowFilter,
) -> Result<()> {
    for property in &entity_type.data_properties {
        if property.use_for_concurrency {
            push_filter(entity, property, kind, false, owner, filter);
        }
    }
    for complex_property in &entity_type.complex_properties {
        let nested = entity
            .nested(&complex_property.name)
            .ok_or_else(|| missing_complex(&complex_property.name))?;
        populate_concurrency_filters(
            nested,
            &complex_property.complex_type,
            kind,
            Some(complex_property),
            filter,
        )?;
    }
    Ok(())
}

fn push_filter(
    entity: &dyn PropertyAccessor,
    property: &DataProperty,
    kind: DatabaseKind,
    is_insert: bool,
    owner: Option<&ComplexProperty>,
    filter: &mut RowFilter,
) {
    let column_name = owner
        .and_then(|cp| cp.column_for(&property.name))
        .unwrap_or(property.column_name.as_str());

    if is_insert && property.generation == GenerationPattern::Identity {
        filter.predicates.push(format!(
            "{} = {}",
            kind.quote(column_name),
            kind.identity_select_sql()
        ));
    } else {
        filter
            .predicates
            .push(format!("{} = @{}", kind.quote(column_name), column_name));
        filter.parameters.push(Parameter::new(
            column_name,
            entity.get(&property.name).unwrap_or(Value::Null),
        ));
    }
}

fn populate_complex_properties(
    entity: &dyn PropertyAccessor,
    entity_type: &EntityType,
    kind: DatabaseKind,
    for_insert: bool,
    path: &mut Vec<String>,
    columns: &mut Vec<String>,
    parameters: &mut Vec<Parameter>,
    seen: &mut HashSet<String>,
    deferred: &mut Vec<DeferredColumn>,
) -> Result<()> {
    for complex_property in &entity_type.complex_properties {
        populate_complex_type(
            entity,
            complex_property,
            kind,
            for_insert,
            path,
            columns,
            parameters,
            seen,
            deferred,
        )?;
    }
    Ok(())
}

fn populate_complex_type(
    owner_entity: &dyn PropertyAccessor,
    complex_property: &ComplexProperty,
    kind: DatabaseKind,
    for_insert: bool,
    path: &mut Vec<String>,
    columns: &mut Vec<String>,
    parameters: &mut Vec<Parameter>,
    seen: &mut HashSet<String>,
    deferred: &mut Vec<DeferredColumn>,
) -> Result<()> {
    let complex_value = owner_entity
        .nested(&complex_property.name)
        .ok_or_else(|| missing_complex(&complex_property.name))?;
    path.push(complex_property.name.clone());

    for property in &complex_property.complex_type.data_properties {
        if property.generation == GenerationPattern::None {
            let column_name = complex_property
                .column_for(&property.name)
                .unwrap_or(property.column_name.as_str());
            push_column(
                kind,
                column_name,
                for_insert,
                complex_value.get(&property.name).unwrap_or(Value::Null),
                columns,
                parameters,
                seen,
            );
        } else {
            push_deferred(deferred, property, path.clone());
        }
    }

    populate_complex_properties(
        complex_value,
        &complex_property.complex_type,
        kind,
        for_insert,
        path,
        columns,
        parameters,
        seen,
        deferred,
    )?;
    path.pop();
    Ok(())
}

fn push_column(
    kind: DatabaseKind,
    column_name: &str,
    for_insert: bool,
    value: Value,
    columns: &mut Vec<String>,
    parameters: &mut Vec<Parameter>,
    seen: &mut HashSet<String>,
) {
    // Duplicate columns (mapped twice through complex flattening) are
    // skipped; the first occurrence wins.
    if !seen.insert(column_name.to_string()) {
        return;
    }
    if for_insert {
        columns.push(kind.quote(column_name));
    } else {
        columns.push(format!("{} = @{}", kind.quote(column_name), column_name));
    }
    parameters.push(Parameter::new(column_name, value));
}

fn push_deferred(deferred: &mut Vec<DeferredColumn>, property: &DataProperty, path: Vec<String>) {
    let duplicate = deferred
        .iter()
        .any(|d| d.property.name == property.name && d.property.column_name == property.column_name);
    if !duplicate {
        deferred.push(DeferredColumn {
            property: property.clone(),
            owner_path: path,
        });
    }
}

fn missing_complex(name: &str) -> Error {
    Error::Custom(format!("complex property '{name}' has no value"))
}
