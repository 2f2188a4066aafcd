//! Batch change records and save results.
//!
//! An [`EntityBag`] is one pending change: the live entity instance, its
//! metadata, the change state, and the original values the client
//! reported. Bags are produced by an upstream merge step, consumed by one
//! save call, and discarded.

use rowforge_core::{EntityType, PropertyAccessor, Value};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

/// The change state of one entity in a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityState {
    /// New entity, to be inserted.
    Added,
    /// Existing entity with changed values, to be updated.
    Modified,
    /// Existing entity to be deleted.
    Deleted,
    /// Tracked but untouched; skipped by the save pipeline.
    Unchanged,
    /// Not tracked at all; skipped by the save pipeline.
    Detached,
}

/// One pending change in a batch.
pub struct EntityBag {
    /// The live entity instance
    pub entity: Box<dyn PropertyAccessor>,
    /// Metadata describing the entity's shape
    pub entity_type: Arc<EntityType>,
    /// The change state
    pub state: EntityState,
    /// Pre-change values keyed by property name; the key set is the
    /// modified-property list for updates
    pub original_values: BTreeMap<String, Value>,
    /// Update every column even when no property is reported modified
    pub force_update: bool,
    /// Position of this record in the client batch; tags the record's
    /// generated values in the save result
    pub index: usize,
}

impl EntityBag {
    /// Create a bag for a new entity.
    pub fn added(
        index: usize,
        entity: impl PropertyAccessor + 'static,
        entity_type: Arc<EntityType>,
    ) -> Self {
        Self {
            entity: Box::new(entity),
            entity_type,
            state: EntityState::Added,
            original_values: BTreeMap::new(),
            force_update: false,
            index,
        }
    }

    /// Create a bag for a modified entity. The keys of `original_values`
    /// name the modified properties (dotted paths reach into complex
    /// values).
    pub fn modified(
        index: usize,
        entity: impl PropertyAccessor + 'static,
        entity_type: Arc<EntityType>,
        original_values: BTreeMap<String, Value>,
    ) -> Self {
        Self {
            entity: Box::new(entity),
            entity_type,
            state: EntityState::Modified,
            original_values,
            force_update: false,
            index,
        }
    }

    /// Create a bag for a deleted entity.
    pub fn deleted(
        index: usize,
        entity: impl PropertyAccessor + 'static,
        entity_type: Arc<EntityType>,
    ) -> Self {
        Self {
            entity: Box::new(entity),
            entity_type,
            state: EntityState::Deleted,
            original_values: BTreeMap::new(),
            force_update: false,
            index,
        }
    }

    /// Create a bag in an explicit state with no original values.
    pub fn with_state(
        index: usize,
        entity: impl PropertyAccessor + 'static,
        entity_type: Arc<EntityType>,
        state: EntityState,
    ) -> Self {
        Self {
            entity: Box::new(entity),
            entity_type,
            state,
            original_values: BTreeMap::new(),
            force_update: false,
            index,
        }
    }

    /// Request a full-column update regardless of the modified set.
    pub fn force_update(mut self, value: bool) -> Self {
        self.force_update = value;
        self
    }

    /// The modified property names, in deterministic order.
    pub fn modified_properties(&self) -> Vec<String> {
        self.original_values.keys().cloned().collect()
    }
}

/// A database-assigned value surfaced by a save.
///
/// `index` locates the owning slot: the key-list position while
/// placeholder keys are being reconciled inside the pipeline, and the
/// owning bag's batch index once the value lands in a [`SaveResult`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeneratedValue {
    pub index: usize,
    pub property: String,
    pub value: Value,
}

impl GeneratedValue {
    /// Create a new generated value record.
    pub fn new(index: usize, property: impl Into<String>, value: Value) -> Self {
        Self {
            index,
            property: property.into(),
            value,
        }
    }
}

/// Batch-scoped caller context echoed through the save.
#[derive(Debug, Clone, Default)]
pub struct SaveContext {
    /// Arbitrary caller data echoed back in the result
    pub user_data: Option<serde_json::Value>,
    /// Entities the save must additionally report as generated
    pub generated_entities: Vec<serde_json::Value>,
}

impl SaveContext {
    /// Create an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach caller data to echo back.
    pub fn user_data(mut self, data: serde_json::Value) -> Self {
        self.user_data = Some(data);
        self
    }

    /// Register an entity to report as generated.
    pub fn generated_entity(mut self, entity: serde_json::Value) -> Self {
        self.generated_entities.push(entity);
        self
    }
}

/// The outcome of one save call. Immutable once constructed.
#[derive(Debug, Clone, Serialize)]
pub struct SaveResult {
    affected_count: u64,
    generated_values: Vec<GeneratedValue>,
    generated_entities: Vec<serde_json::Value>,
    user_data: Option<serde_json::Value>,
}

impl SaveResult {
    /// Build a result from the batch outcome.
    pub fn new(
        affected_count: u64,
        generated_values: Vec<GeneratedValue>,
        generated_entities: Vec<serde_json::Value>,
        user_data: Option<serde_json::Value>,
    ) -> Self {
        Self {
            affected_count,
            generated_values,
            generated_entities,
            user_data,
        }
    }

    /// The result of a batch that wrote nothing.
    pub fn empty() -> Self {
        Self::new(0, Vec::new(), Vec::new(), None)
    }

    /// Total rows affected across the batch.
    pub fn affected_count(&self) -> u64 {
        self.affected_count
    }

    /// Every database-assigned value produced by the batch.
    pub fn generated_values(&self) -> &[GeneratedValue] {
        &self.generated_values
    }

    /// Entities the caller registered as generated.
    pub fn generated_entities(&self) -> &[serde_json::Value] {
        &self.generated_entities
    }

    /// The caller data echoed back.
    pub fn user_data(&self) -> Option<&serde_json::Value> {
        self.user_data.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rowforge_core::{DataProperty, DynamicEntity};

    fn order_type() -> Arc<EntityType> {
        Arc::new(EntityType::new("Order", "Orders").key(DataProperty::new("id")))
    }

    #[test]
    fn test_added_bag_defaults() {
        let bag = EntityBag::added(0, DynamicEntity::new().with("id", 1i64), order_type());
        assert_eq!(bag.state, EntityState::Added);
        assert!(bag.original_values.is_empty());
        assert!(!bag.force_update);
        assert_eq!(bag.index, 0);
    }

    #[test]
    fn test_modified_properties_are_original_value_keys() {
        let mut originals = BTreeMap::new();
        originals.insert("name".to_string(), Value::Text("old".to_string()));
        originals.insert("city".to_string(), Value::Text("Linz".to_string()));
        let bag = EntityBag::modified(2, DynamicEntity::new(), order_type(), originals);
        // BTreeMap keys iterate sorted, so the list is deterministic.
        assert_eq!(bag.modified_properties(), vec!["city", "name"]);
    }

    #[test]
    fn test_force_update_builder() {
        let bag = EntityBag::modified(0, DynamicEntity::new(), order_type(), BTreeMap::new())
            .force_update(true);
        assert!(bag.force_update);
    }

    #[test]
    fn test_save_result_accessors() {
        let result = SaveResult::new(
            3,
            vec![GeneratedValue::new(0, "id", Value::BigInt(42))],
            vec![serde_json::json!({"id": 42})],
            Some(serde_json::json!("echo")),
        );
        assert_eq!(result.affected_count(), 3);
        assert_eq!(result.generated_values().len(), 1);
        assert_eq!(result.generated_entities().len(), 1);
        assert_eq!(result.user_data(), Some(&serde_json::json!("echo")));
    }

    #[test]
    fn test_empty_result() {
        let result = SaveResult::empty();
        assert_eq!(result.affected_count(), 0);
        assert!(result.generated_values().is_empty());
        assert!(result.user_data().is_none());
    }

    #[test]
    fn test_save_context_builder() {
        let context = SaveContext::new()
            .user_data(serde_json::json!({"tag": 7}))
            .generated_entity(serde_json::json!({"id": 1}));
        assert_eq!(context.generated_entities.len(), 1);
        assert!(context.user_data.is_some());
    }
}
