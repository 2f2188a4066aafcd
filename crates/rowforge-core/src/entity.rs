//! Property access for entity instances.
//!
//! The engine is metadata-driven: it reads and writes entity properties by
//! name rather than through a static struct shape. [`PropertyAccessor`] is
//! the capability interface an entity carrier implements: generated code,
//! a hand-written adapter over a domain struct, or the map-backed
//! [`DynamicEntity`] shipped here.

use crate::value::Value;
use serde::Serialize;
use std::collections::BTreeMap;

/// Named access to an entity instance's scalar and complex properties.
pub trait PropertyAccessor {
    /// Read a scalar property. `None` means the property does not exist;
    /// a present-but-NULL property reads as `Some(Value::Null)`.
    fn get(&self, property: &str) -> Option<Value>;

    /// Write a scalar property. Returns `false` when the property is
    /// unknown to this instance.
    fn set(&mut self, property: &str, value: Value) -> bool;

    /// Borrow a nested complex value.
    fn nested(&self, property: &str) -> Option<&dyn PropertyAccessor>;

    /// Mutably borrow a nested complex value.
    fn nested_mut(&mut self, property: &str) -> Option<&mut dyn PropertyAccessor>;
}

/// Walk a path of complex property names down from `root`.
///
/// An empty path yields `root` itself; an unresolvable segment yields `None`.
pub fn descend<'a>(
    root: &'a dyn PropertyAccessor,
    path: &[String],
) -> Option<&'a dyn PropertyAccessor> {
    let mut current = root;
    for segment in path {
        current = current.nested(segment)?;
    }
    Some(current)
}

/// Mutable variant of [`descend`].
pub fn descend_mut<'a>(
    root: &'a mut dyn PropertyAccessor,
    path: &[String],
) -> Option<&'a mut dyn PropertyAccessor> {
    let mut current = root;
    for segment in path {
        current = current.nested_mut(segment)?;
    }
    Some(current)
}

/// Map-backed entity carrier.
///
/// Scalar values and nested complex values live in ordered maps, so
/// iteration and serialization are deterministic.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DynamicEntity {
    values: BTreeMap<String, Value>,
    nested: BTreeMap<String, DynamicEntity>,
}

impl DynamicEntity {
    /// Create an empty entity.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a scalar property (builder form).
    pub fn with(mut self, property: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values.insert(property.into(), value.into());
        self
    }

    /// Set a nested complex property (builder form).
    pub fn with_nested(mut self, property: impl Into<String>, value: DynamicEntity) -> Self {
        self.nested.insert(property.into(), value);
        self
    }

    /// Insert or replace a scalar property.
    pub fn insert(&mut self, property: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(property.into(), value.into());
    }

    /// Property names present on this instance.
    pub fn property_names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }
}

impl PropertyAccessor for DynamicEntity {
    fn get(&self, property: &str) -> Option<Value> {
        self.values.get(property).cloned()
    }

    fn set(&mut self, property: &str, value: Value) -> bool {
        self.values.insert(property.to_string(), value);
        true
    }

    fn nested(&self, property: &str) -> Option<&dyn PropertyAccessor> {
        self.nested
            .get(property)
            .map(|entity| entity as &dyn PropertyAccessor)
    }

    fn nested_mut(&mut self, property: &str) -> Option<&mut dyn PropertyAccessor> {
        self.nested
            .get_mut(property)
            .map(|entity| entity as &mut dyn PropertyAccessor)
    }
}
