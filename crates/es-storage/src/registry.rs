//! Ordered registry of storage resolvers
//!
//! Provides [`ResolverRegistry`]: backend identifier → resolver, where
//! insertion order is the fallback priority.

use crate::resolver::{resolve_content_within, IpfsGatewayStorageResolver, RawContent, StorageResolver};
use indexmap::IndexMap;
use std::sync::Arc;
use std::time::Duration;

/// Ordered mapping from backend identifier to storage resolver
///
/// Cloning is cheap (resolvers are shared), so a registry can be snapshotted
/// per resolution run instead of being mutated under readers.
#[derive(Clone, Default)]
pub struct ResolverRegistry {
    resolvers: IndexMap<String, Arc<dyn StorageResolver>>,
}

impl ResolverRegistry {
    /// Create new empty registry
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            resolvers: IndexMap::new(),
        }
    }

    /// Create registry with the built-in IPFS gateway resolver
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register("ipfs", Arc::new(IpfsGatewayStorageResolver::default()));
        registry
    }

    /// Register a resolver under `name`
    ///
    /// Re-registering an existing name swaps the implementation but keeps its
    /// priority slot. Returns the replaced resolver, if any.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        resolver: Arc<dyn StorageResolver>,
    ) -> Option<Arc<dyn StorageResolver>> {
        self.resolvers.insert(name.into(), resolver)
    }

    /// Builder-style [`register`](Self::register)
    #[inline]
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, resolver: Arc<dyn StorageResolver>) -> Self {
        self.register(name, resolver);
        self
    }

    /// Remove resolver, preserving the order of the others
    #[inline]
    pub fn remove(&mut self, name: &str) -> Option<Arc<dyn StorageResolver>> {
        self.resolvers.shift_remove(name)
    }

    /// Get resolver by name
    #[inline]
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Arc<dyn StorageResolver>> {
        self.resolvers.get(name)
    }

    /// Check if a resolver is registered
    #[inline]
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.resolvers.contains_key(name)
    }

    /// Registered names in priority order
    #[inline]
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.resolvers.keys().map(String::as_str).collect()
    }

    /// Resolvers in priority order
    #[must_use]
    pub fn resolvers(&self) -> Vec<Arc<dyn StorageResolver>> {
        self.resolvers.values().cloned().collect()
    }

    /// Get number of registered resolvers
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.resolvers.len()
    }

    /// Check if registry is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.resolvers.is_empty()
    }

    /// Resolve `pointer` through the chain, bounding each attempt
    pub async fn resolve(&self, pointer: &str, per_attempt: Option<Duration>) -> Option<RawContent> {
        resolve_content_within(pointer, &self.resolvers(), per_attempt).await
    }
}

impl std::fmt::Debug for ResolverRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolverRegistry")
            .field("resolvers", &self.names())
            .finish()
    }
}
