//! Memoized metadata resolution.
//!
//! Metadata discovery is expensive and external; its result is immutable.
//! The cache stores one validated [`Metadata`] per data-source identity
//! (conventionally the connection string) and guarantees at-most-one
//! build per identity even under concurrent first access. Entries never
//! evict; the set of data sources a process talks to is small and
//! fixed, so the cache is intentionally unbounded.

use rowforge_core::{Metadata, Result};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

/// Cache of validated metadata keyed by data-source identity.
#[derive(Debug, Default)]
pub struct MetadataCache {
    // One coarse lock serializes lookups and first-time builds. Builds
    // for different identities therefore block each other; the contract
    // only requires at-most-one build per identity and no deadlock.
    entries: Mutex<HashMap<String, Arc<Metadata>>>,
}

impl MetadataCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide cache instance.
    pub fn global() -> &'static MetadataCache {
        static GLOBAL: OnceLock<MetadataCache> = OnceLock::new();
        GLOBAL.get_or_init(MetadataCache::new)
    }

    /// Resolve the metadata for `identity`, building and validating it on
    /// first access. Build and validation errors propagate to the caller
    /// and are not cached; a later call retries the build.
    pub fn resolve<F>(&self, identity: &str, build: F) -> Result<Arc<Metadata>>
    where
        F: FnOnce() -> Result<Metadata>,
    {
        let mut entries = self
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(found) = entries.get(identity) {
            return Ok(Arc::clone(found));
        }

        tracing::debug!(identity = identity, "Building metadata for new identity");
        let metadata = build()?;
        metadata.validate()?;
        let metadata = Arc::new(metadata);
        entries.insert(identity.to_string(), Arc::clone(&metadata));
        Ok(metadata)
    }

    /// Check whether an identity has been resolved already.
    pub fn contains(&self, identity: &str) -> bool {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(identity)
    }

    /// Number of cached identities.
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Check if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
