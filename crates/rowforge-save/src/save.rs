//! The batch save coordinator.
//!
//! Drives one batch of change records through validation, statement
//! synthesis, transactional execution, generated-value read-back, and
//! forward foreign-key propagation, and aggregates the outcome into a
//! [`SaveResult`].
//!
//! # Ordering contract
//!
//! The caller supplies entities in an order where any entity whose key is
//! referenced by another appears *before* the referencing entity. The
//! engine never reorders or topologically sorts the batch; generated keys
//! propagate strictly forward. A dependent record placed before its
//! referenced record keeps its placeholder foreign key.

use crate::bag::{EntityBag, EntityState, GeneratedValue, SaveContext, SaveResult};
use crate::resolver;
use crate::statement;
use rowforge_core::{
    Connection, ConnectionState, DatabaseKind, Result, RowCountError, SaveOperation, Value,
    ValidationError, validate_entity,
};
use std::sync::Arc;
use std::time::Instant;

/// Observes and may interfere with a batch before and after it executes.
///
/// `before_save` may mutate the batch list; raising from either hook
/// short-circuits the save.
pub trait SaveObserver {
    /// Called with the full ordered list before any validation or SQL.
    fn before_save(&mut self, entities: &mut Vec<EntityBag>, context: &SaveContext) -> Result<()> {
        let _ = (entities, context);
        Ok(())
    }

    /// Called with the full list and the built result after the commit.
    fn after_save(&mut self, entities: &[EntityBag], result: &SaveResult) -> Result<()> {
        let _ = (entities, result);
        Ok(())
    }
}

/// Converts change records the metadata does not map into additional
/// save-able bags.
pub trait UnmappedHandler {
    fn handle(&mut self, unmapped: Vec<EntityBag>) -> Vec<EntityBag>;
}

/// The batch save coordinator.
///
/// One engine serves any number of sequential batches; it holds no
/// per-batch state. Concurrent batches belong on separate connections.
pub struct SaveEngine {
    kind: DatabaseKind,
    validate_on_save: bool,
    observer: Option<Box<dyn SaveObserver>>,
    unmapped_handler: Option<Box<dyn UnmappedHandler>>,
}

impl SaveEngine {
    /// Create an engine for the given database kind. Validation is on by
    /// default.
    pub fn new(kind: DatabaseKind) -> Self {
        Self {
            kind,
            validate_on_save: true,
            observer: None,
            unmapped_handler: None,
        }
    }

    /// Enable or disable the pre-write validation pass.
    pub fn with_validation(mut self, enabled: bool) -> Self {
        self.validate_on_save = enabled;
        self
    }

    /// Attach a save observer.
    pub fn with_observer(mut self, observer: Box<dyn SaveObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Attach an unmapped-entity handler.
    pub fn with_unmapped_handler(mut self, handler: Box<dyn UnmappedHandler>) -> Self {
        self.unmapped_handler = Some(handler);
        self
    }

    /// The configured database kind.
    pub fn kind(&self) -> DatabaseKind {
        self.kind
    }

    /// Apply a batch of change records inside one transaction.
    ///
    /// The batch is borrowed, not consumed: resolved identity values and
    /// propagated foreign keys are written onto the live entities, which
    /// the caller typically needs afterwards. The sole public entry point
    /// of the pipeline; see the module docs for the ordering contract.
    pub fn save<C: Connection>(
        &mut self,
        conn: &mut C,
        entities: &mut Vec<EntityBag>,
        context: SaveContext,
    ) -> Result<SaveResult> {
        self.save_with_unmapped(conn, entities, Vec::new(), context)
    }

    /// [`save`](Self::save), with additional unmapped change records
    /// routed through the configured handler and appended to the list.
    #[tracing::instrument(level = "info", skip_all)]
    pub fn save_with_unmapped<C: Connection>(
        &mut self,
        conn: &mut C,
        entities: &mut Vec<EntityBag>,
        unmapped: Vec<EntityBag>,
        context: SaveContext,
    ) -> Result<SaveResult> {
        if !unmapped.is_empty() {
            if let Some(handler) = self.unmapped_handler.as_mut() {
                let handled = handler.handle(unmapped);
                tracing::debug!(count = handled.len(), "Appending handled unmapped records");
                entities.extend(handled);
            }
        }

        if entities.is_empty() {
            tracing::debug!("Empty batch; nothing to save");
            return Ok(SaveResult::empty());
        }

        if let Some(observer) = self.observer.as_mut() {
            observer.before_save(entities, &context)?;
        }

        if self.validate_on_save {
            let mut validation = ValidationError::new();
            for bag in entities
                .iter()
                .filter(|b| matches!(b.state, EntityState::Added | EntityState::Modified))
            {
                validation.extend(validate_entity(bag.entity.as_ref(), &bag.entity_type));
            }
            if !validation.is_empty() {
                tracing::warn!(failures = validation.failures.len(), "Batch failed validation");
                return Err(validation.into());
            }
        }

        let start = Instant::now();
        tracing::info!(batch = entities.len(), "Saving batch");

        // One transaction spans the whole batch; the connection's prior
        // open/closed state is restored on every exit path.
        let prior_state = conn.state();
        if prior_state != ConnectionState::Open {
            conn.open()?;
        }

        let mut generated_values = Vec::new();
        let outcome = match conn.begin_transaction() {
            Ok(()) => {
                let batch_outcome = self
                    .run_batch(conn, entities, &mut generated_values)
                    .and_then(|affected| conn.commit().map(|()| affected));
                match batch_outcome {
                    Ok(affected) => Ok(affected),
                    Err(error) => {
                        let _ = conn.rollback();
                        Err(error)
                    }
                }
            }
            Err(error) => Err(error),
        };
        if prior_state == ConnectionState::Closed {
            let _ = conn.close();
        }
        let affected_count = outcome?;

        tracing::info!(
            elapsed_ms = start.elapsed().as_millis(),
            affected = affected_count,
            generated = generated_values.len(),
            "Batch saved"
        );

        let result = SaveResult::new(
            affected_count,
            generated_values,
            context.generated_entities.clone(),
            context.user_data.clone(),
        );
        if let Some(observer) = self.observer.as_mut() {
            observer.after_save(entities, &result)?;
        }
        Ok(result)
    }

    /// The sequential per-record pass: dispatch each record, then
    /// propagate freshly generated key values forward.
    fn run_batch<C: Connection>(
        &self,
        conn: &mut C,
        entities: &mut Vec<EntityBag>,
        generated: &mut Vec<GeneratedValue>,
    ) -> Result<u64> {
        let mut affected: u64 = 0;

        for i in 0..entities.len() {
            let state = entities[i].state;
            if matches!(state, EntityState::Detached | EntityState::Unchanged) {
                continue;
            }
            let entity_type = Arc::clone(&entities[i].entity_type);

            // Snapshot the pre-write values of generated key properties;
            // these placeholders are how dependent foreign keys are
            // recognized after the real values exist.
            let mut placeholders: Vec<GeneratedValue> = Vec::new();
            if state != EntityState::Deleted {
                for (slot, key_property) in entity_type.key_properties.iter().enumerate() {
                    if key_property.is_generated() {
                        let value = entities[i]
                            .entity
                            .get(&key_property.name)
                            .unwrap_or(Value::Null);
                        placeholders.push(GeneratedValue::new(slot, key_property.name.clone(), value));
                    }
                }
            }

            affected += self.save_bag(conn, &mut entities[i], generated)?;

            if placeholders.is_empty() {
                continue;
            }

            let resolved: Vec<Value> = placeholders
                .iter()
                .map(|p| entities[i].entity.get(&p.property).unwrap_or(Value::Null))
                .collect();

            // Forward propagation only: scan the rest of the list for
            // foreign keys still holding the placeholder value.
            for related_index in i..entities.len() {
                let related_type = Arc::clone(&entities[related_index].entity_type);
                for navigation in related_type
                    .navigation_properties
                    .iter()
                    .filter(|n| n.target == entity_type.short_name && !n.foreign_keys.is_empty())
                {
                    for (slot, placeholder) in placeholders.iter().enumerate() {
                        let Some(foreign_key) = navigation.foreign_keys.get(placeholder.index)
                        else {
                            continue;
                        };
                        let current = entities[related_index].entity.get(foreign_key);
                        if current.as_ref() == Some(&placeholder.value) {
                            let key_value = resolved[slot].clone();
                            entities[related_index]
                                .entity
                                .set(foreign_key, key_value.clone());
                            if key_value != placeholder.value {
                                tracing::trace!(
                                    from = i,
                                    to = related_index,
                                    property = %foreign_key,
                                    "Propagated generated key"
                                );
                                generated.push(GeneratedValue::new(
                                    entities[related_index].index,
                                    foreign_key.clone(),
                                    key_value,
                                ));
                            }
                        }
                    }
                }
            }
        }

        Ok(affected)
    }

    fn save_bag<C: Connection>(
        &self,
        conn: &mut C,
        bag: &mut EntityBag,
        generated: &mut Vec<GeneratedValue>,
    ) -> Result<u64> {
        match bag.state {
            EntityState::Added => self.insert_entity(conn, bag, generated),
            EntityState::Modified => self.update_entity(conn, bag, generated),
            EntityState::Deleted => self.delete_entity(conn, bag),
            EntityState::Unchanged | EntityState::Detached => Ok(0),
        }
    }

    fn insert_entity<C: Connection>(
        &self,
        conn: &mut C,
        bag: &mut EntityBag,
        generated: &mut Vec<GeneratedValue>,
    ) -> Result<u64> {
        let plans = statement::build_insert(bag.entity.as_ref(), &bag.entity_type, self.kind)?;
        let mut affected = 0;
        for plan in &plans {
            tracing::debug!(table = %plan.table, sql = %plan.statement.sql, "Executing insert");
            let count = conn.execute(&plan.statement.sql, &plan.statement.parameters)?;
            if count != 1 {
                return Err(RowCountError::new(SaveOperation::Insert, &plan.table, count).into());
            }
            affected += 1;

            if !plan.deferred.is_empty() {
                let assignments = resolver::resolve_generated(
                    conn,
                    self.kind,
                    &plan.table,
                    &plan.deferred,
                    &plan.key_filter,
                    bag.entity.as_mut(),
                )?;
                for (property, value) in assignments {
                    generated.push(GeneratedValue::new(bag.index, property, value));
                }
            }
        }
        Ok(affected)
    }

    fn update_entity<C: Connection>(
        &self,
        conn: &mut C,
        bag: &mut EntityBag,
        generated: &mut Vec<GeneratedValue>,
    ) -> Result<u64> {
        let modified = bag.modified_properties();
        let plans = statement::build_update(
            bag.entity.as_ref(),
            &bag.entity_type,
            &modified,
            bag.force_update,
            self.kind,
        )?;
        let mut affected = 0;
        for plan in &plans {
            if let Some(sql_statement) = &plan.statement {
                tracing::debug!(table = %plan.table, sql = %sql_statement.sql, "Executing update");
                let count = conn.execute(&sql_statement.sql, &sql_statement.parameters)?;
                if count != 1 {
                    // Zero rows: a stale concurrency token or a missing
                    // row; indistinguishable at this layer.
                    return Err(
                        RowCountError::new(SaveOperation::Update, &plan.table, count).into()
                    );
                }
            }
            affected += 1;

            if !plan.deferred.is_empty() {
                let assignments = resolver::resolve_generated(
                    conn,
                    self.kind,
                    &plan.table,
                    &plan.deferred,
                    &plan.key_filter,
                    bag.entity.as_mut(),
                )?;
                for (property, value) in assignments {
                    generated.push(GeneratedValue::new(bag.index, property, value));
                }
            }
        }
        Ok(affected)
    }

    fn delete_entity<C: Connection>(&self, conn: &mut C, bag: &mut EntityBag) -> Result<u64> {
        let plans = statement::build_delete(bag.entity.as_ref(), &bag.entity_type, self.kind)?;
        let mut affected = 0;
        for plan in &plans {
            tracing::debug!(table = %plan.table, sql = %plan.statement.sql, "Executing delete");
            let count = conn.execute(&plan.statement.sql, &plan.statement.parameters)?;
            if count != 1 {
                return Err(RowCountError::new(SaveOperation::Delete, &plan.table, count).into());
            }
            affected += 1;
        }
        Ok(affected)
    }
}
