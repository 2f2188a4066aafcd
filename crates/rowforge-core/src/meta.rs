//! Entity metadata model.
//!
//! Immutable description of the persisted shapes the engine works with:
//! entity types, scalar and complex properties, keys, and foreign-key
//! navigations. Metadata is built once per data source (by an external
//! discovery step or by hand), validated, and then shared read-only.

use crate::error::{MetadataError, Result};
use std::sync::Arc;

/// Column provenance: who produces the stored value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GenerationPattern {
    /// Caller-supplied value, written on insert/update.
    #[default]
    None,
    /// Database auto-number; read back after insert.
    Identity,
    /// Database-computed expression; read back after insert and update.
    Computed,
}

/// A scalar (data) property of an entity or complex type.
#[derive(Debug, Clone)]
pub struct DataProperty {
    /// Property name on the entity
    pub name: String,
    /// Database column name (may differ from the property name)
    pub column_name: String,
    /// Who generates the stored value
    pub generation: GenerationPattern,
    /// Compared in UPDATE WHERE clauses to detect stale rows
    pub use_for_concurrency: bool,
    /// Whether NULL is an acceptable stored value
    pub nullable: bool,
    /// Maximum accepted string length, when constrained
    pub max_length: Option<usize>,
    /// Regex pattern the stored text must match, when constrained
    pub pattern: Option<String>,
}

impl DataProperty {
    /// Create a new property whose column name equals the property name.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            column_name: name.clone(),
            name,
            generation: GenerationPattern::None,
            use_for_concurrency: false,
            nullable: true,
            max_length: None,
            pattern: None,
        }
    }

    /// Set the database column name.
    pub fn column(mut self, name: impl Into<String>) -> Self {
        self.column_name = name.into();
        self
    }

    /// Set the generation pattern.
    pub fn generation(mut self, pattern: GenerationPattern) -> Self {
        self.generation = pattern;
        self
    }

    /// Mark this property as a concurrency token.
    pub fn concurrency_token(mut self) -> Self {
        self.use_for_concurrency = true;
        self
    }

    /// Set whether NULL is acceptable.
    pub fn nullable(mut self, value: bool) -> Self {
        self.nullable = value;
        self
    }

    /// Constrain the maximum string length.
    pub fn max_length(mut self, value: usize) -> Self {
        self.max_length = Some(value);
        self
    }

    /// Constrain text values to a regex pattern.
    pub fn pattern(mut self, value: impl Into<String>) -> Self {
        self.pattern = Some(value.into());
        self
    }

    /// Check if the database produces this property's value.
    pub fn is_generated(&self) -> bool {
        self.generation != GenerationPattern::None
    }
}

/// Property-name to column-name override for one complex property.
#[derive(Debug, Clone)]
pub struct PropertyMapping {
    pub property_name: String,
    pub column_name: String,
}

/// A nested complex-typed property.
///
/// The nested type owns scalar and complex properties but no keys; its
/// columns flatten into the owning entity's table, renamed through the
/// mapping table where an override exists.
#[derive(Debug, Clone)]
pub struct ComplexProperty {
    /// Property name on the owning entity
    pub name: String,
    /// The nested type's shape
    pub complex_type: Arc<EntityType>,
    /// Per-property column-name overrides
    pub mappings: Vec<PropertyMapping>,
}

impl ComplexProperty {
    /// Create a new complex property.
    pub fn new(name: impl Into<String>, complex_type: Arc<EntityType>) -> Self {
        Self {
            name: name.into(),
            complex_type,
            mappings: Vec::new(),
        }
    }

    /// Add a property-name to column-name override.
    pub fn map(mut self, property: impl Into<String>, column: impl Into<String>) -> Self {
        self.mappings.push(PropertyMapping {
            property_name: property.into(),
            column_name: column.into(),
        });
        self
    }

    /// Resolve the column override for a nested property, if any.
    pub fn column_for(&self, property: &str) -> Option<&str> {
        self.mappings
            .iter()
            .find(|m| m.property_name == property)
            .map(|m| m.column_name.as_str())
    }
}

/// A foreign-key relationship to another entity type.
///
/// `foreign_keys` is positional: entry `i` names the property on the
/// owning entity that stores the related type's key property `i`.
#[derive(Debug, Clone)]
pub struct NavigationProperty {
    /// Property name on the owning entity
    pub name: String,
    /// Short name of the related entity type
    pub target: String,
    /// Foreign-key property names, aligned with the target's key order
    pub foreign_keys: Vec<String>,
}

impl NavigationProperty {
    /// Create a new navigation property.
    pub fn new(
        name: impl Into<String>,
        target: impl Into<String>,
        foreign_keys: Vec<String>,
    ) -> Self {
        Self {
            name: name.into(),
            target: target.into(),
            foreign_keys,
        }
    }
}

/// Static description of one persisted shape.
///
/// `data_properties` holds the properties declared at this level of the
/// inheritance chain (keys included on the declaring level); derived
/// levels reach their shared key columns through `key_properties`.
#[derive(Debug, Clone)]
pub struct EntityType {
    /// Short type name
    pub short_name: String,
    /// Plural query name
    pub query_name: String,
    /// Runtime-type identity used to resolve instances to metadata
    pub type_identity: String,
    /// Backing table name
    pub table_name: String,
    /// Ordered key properties (empty for complex types)
    pub key_properties: Vec<DataProperty>,
    /// Scalar properties declared at this level
    pub data_properties: Vec<DataProperty>,
    /// Nested complex properties
    pub complex_properties: Vec<ComplexProperty>,
    /// Foreign-key relationships
    pub navigation_properties: Vec<NavigationProperty>,
    /// Base type for table-per-type inheritance
    pub base_type: Option<Arc<EntityType>>,
    /// Whether this shape is a keyless complex type
    pub is_complex: bool,
}

impl EntityType {
    /// Create a new entity type.
    pub fn new(short_name: impl Into<String>, table_name: impl Into<String>) -> Self {
        let short_name = short_name.into();
        Self {
            query_name: short_name.clone(),
            type_identity: short_name.clone(),
            short_name,
            table_name: table_name.into(),
            key_properties: Vec::new(),
            data_properties: Vec::new(),
            complex_properties: Vec::new(),
            navigation_properties: Vec::new(),
            base_type: None,
            is_complex: false,
        }
    }

    /// Create a keyless complex type. Its columns live in the owning
    /// entity's table, so it has no table of its own.
    pub fn new_complex(short_name: impl Into<String>) -> Self {
        let mut entity_type = Self::new(short_name, "");
        entity_type.is_complex = true;
        entity_type
    }

    /// Set the plural query name.
    pub fn query_name(mut self, name: impl Into<String>) -> Self {
        self.query_name = name.into();
        self
    }

    /// Set the runtime-type identity.
    pub fn type_identity(mut self, identity: impl Into<String>) -> Self {
        self.type_identity = identity.into();
        self
    }

    /// Declare a key property. The property is also part of this level's
    /// data properties, so caller-supplied key values are written on insert.
    pub fn key(mut self, property: DataProperty) -> Self {
        self.data_properties.push(property.clone());
        self.key_properties.push(property);
        self
    }

    /// Declare a scalar property.
    pub fn property(mut self, property: DataProperty) -> Self {
        self.data_properties.push(property);
        self
    }

    /// Declare a complex property.
    pub fn complex_property(mut self, property: ComplexProperty) -> Self {
        self.complex_properties.push(property);
        self
    }

    /// Declare a navigation property.
    pub fn navigation(mut self, property: NavigationProperty) -> Self {
        self.navigation_properties.push(property);
        self
    }

    /// Set the base type (table-per-type inheritance). The base's key
    /// properties are inherited when this level declares none itself.
    pub fn base(mut self, base_type: Arc<EntityType>) -> Self {
        if self.key_properties.is_empty() {
            self.key_properties = base_type.key_properties.clone();
        }
        self.base_type = Some(base_type);
        self
    }

    /// Find a data property declared at this level by name.
    pub fn find_data_property(&self, name: &str) -> Option<&DataProperty> {
        self.data_properties.iter().find(|p| p.name == name)
    }

    /// Find a complex property by name.
    pub fn find_complex_property(&self, name: &str) -> Option<&ComplexProperty> {
        self.complex_properties.iter().find(|p| p.name == name)
    }

    /// Check whether a property name is one of this type's keys.
    pub fn is_key(&self, name: &str) -> bool {
        self.key_properties.iter().any(|p| p.name == name)
    }

    /// Ensure this type can identify a row.
    ///
    /// Complex types are keyless by design; every other type must carry at
    /// least one key property.
    pub fn ensure_keys(&self) -> Result<()> {
        if !self.is_complex && self.key_properties.is_empty() {
            return Err(MetadataError::missing_key(&self.short_name).into());
        }
        Ok(())
    }
}

/// The full metadata set for one data source.
#[derive(Debug, Clone, Default)]
pub struct Metadata {
    pub entities: Vec<Arc<EntityType>>,
}

impl Metadata {
    /// Create an empty metadata set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entity type.
    pub fn entity(mut self, entity_type: EntityType) -> Self {
        self.entities.push(Arc::new(entity_type));
        self
    }

    /// Add an already-shared entity type.
    pub fn entity_arc(mut self, entity_type: Arc<EntityType>) -> Self {
        self.entities.push(entity_type);
        self
    }

    /// Look up an entity type by short name.
    pub fn find(&self, short_name: &str) -> Option<&Arc<EntityType>> {
        self.entities.iter().find(|e| e.short_name == short_name)
    }

    /// Look up an entity type by runtime-type identity.
    pub fn find_by_identity(&self, identity: &str) -> Option<&Arc<EntityType>> {
        self.entities.iter().find(|e| e.type_identity == identity)
    }

    /// Look up an entity type by short name, erroring when absent.
    pub fn require(&self, short_name: &str) -> Result<Arc<EntityType>> {
        self.find(short_name)
            .cloned()
            .ok_or_else(|| MetadataError::unknown_type(short_name).into())
    }

    /// Validate the whole set: every non-complex type has at least one key
    /// and no complex property graph references an ancestor of itself.
    pub fn validate(&self) -> Result<()> {
        for entity_type in &self.entities {
            entity_type.ensure_keys()?;
            let mut stack = Vec::new();
            check_complex_cycles(entity_type, &mut stack)?;
        }
        Ok(())
    }
}

/// DFS over the complex-property tree with a name stack; a repeated type
/// name on the stack means the graph loops back onto an ancestor.
fn check_complex_cycles(entity_type: &EntityType, stack: &mut Vec<String>) -> Result<()> {
    for complex_property in &entity_type.complex_properties {
        let type_name = complex_property.complex_type.short_name.clone();
        if stack.contains(&type_name) {
            let mut path = stack.clone();
            path.push(type_name);
            return Err(MetadataError::complex_cycle(&path).into());
        }
        stack.push(type_name);
        check_complex_cycles(&complex_property.complex_type, stack)?;
        stack.pop();
    }
    Ok(())
}
