//! Scope-owned collections keyed by name and parameters.
//!
//! A [`CollectionRegistry`] replaces a process-wide query cache: whoever owns
//! the registry (a window, a request, a test) decides how long collections
//! live. Keys are a collection name plus ordered parameters, so
//! `viewFiles[projectId=p1]` is a prefix of
//! `viewFiles[projectId=p1, viewId=v1]` and both can be invalidated at once.

use std::fmt;
use std::sync::Arc;

use horizon_tally_core::logging::targets;
use indexmap::IndexMap;
use parking_lot::RwLock;

use super::controller::PagedCollection;

/// Identifies one collection: a name plus ordered parameters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CollectionKey {
    name: String,
    params: Vec<(String, String)>,
}

impl CollectionKey {
    /// Creates a key with no parameters.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
        }
    }

    /// Appends a parameter.
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((key.into(), value.into()));
        self
    }

    /// The collection name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The parameters in order.
    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }

    /// Looks up a parameter value.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Returns true if `prefix` has the same name and its parameters are a
    /// leading run of this key's parameters.
    pub fn starts_with(&self, prefix: &CollectionKey) -> bool {
        self.name == prefix.name && self.params.starts_with(&prefix.params)
    }
}

impl fmt::Display for CollectionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if !self.params.is_empty() {
            write!(f, "[")?;
            for (i, (key, value)) in self.params.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}={}", key, value)?;
            }
            write!(f, "]")?;
        }
        Ok(())
    }
}

/// A map from [`CollectionKey`] to shared [`PagedCollection`]s.
///
/// Removing a key only drops the registry's handle; fetches already running
/// on that collection complete against it and are not seen by a collection
/// created later under the same key.
pub struct CollectionRegistry<T, S> {
    collections: RwLock<IndexMap<CollectionKey, Arc<PagedCollection<T, S>>>>,
}

impl<T, S> Default for CollectionRegistry<T, S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, S> fmt::Debug for CollectionRegistry<T, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CollectionRegistry")
            .field("keys", &self.keys())
            .finish()
    }
}

impl<T, S> CollectionRegistry<T, S> {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            collections: RwLock::new(IndexMap::new()),
        }
    }

    /// Returns the collection for `key`, creating it with `factory` if
    /// absent.
    pub fn get_or_insert_with(
        &self,
        key: CollectionKey,
        factory: impl FnOnce(&CollectionKey) -> PagedCollection<T, S>,
    ) -> Arc<PagedCollection<T, S>> {
        if let Some(existing) = self.collections.read().get(&key) {
            return Arc::clone(existing);
        }

        let mut collections = self.collections.write();
        // Another caller may have inserted between the two locks.
        if let Some(existing) = collections.get(&key) {
            return Arc::clone(existing);
        }
        tracing::debug!(target: targets::REGISTRY, key = %key, "creating collection");
        let collection = Arc::new(factory(&key));
        collections.insert(key, Arc::clone(&collection));
        collection
    }

    /// Returns the collection for `key`, if any.
    pub fn get(&self, key: &CollectionKey) -> Option<Arc<PagedCollection<T, S>>> {
        self.collections.read().get(key).cloned()
    }

    /// Removes and returns the collection for `key`.
    pub fn remove(&self, key: &CollectionKey) -> Option<Arc<PagedCollection<T, S>>> {
        let removed = self.collections.write().shift_remove(key);
        if removed.is_some() {
            tracing::debug!(target: targets::REGISTRY, key = %key, "collection removed");
        }
        removed
    }

    /// Number of registered collections.
    pub fn len(&self) -> usize {
        self.collections.read().len()
    }

    /// Returns true if no collection is registered.
    pub fn is_empty(&self) -> bool {
        self.collections.read().is_empty()
    }

    /// Registered keys in insertion order.
    pub fn keys(&self) -> Vec<CollectionKey> {
        self.collections.read().keys().cloned().collect()
    }

    /// Invalidates every collection whose key starts with `prefix`.
    ///
    /// Returns the number of collections invalidated. Each of them is empty
    /// afterwards and must be fetched again.
    pub fn invalidate_prefix(&self, prefix: &CollectionKey) -> usize {
        let matching: Vec<Arc<PagedCollection<T, S>>> = self
            .collections
            .read()
            .iter()
            .filter(|(key, _)| key.starts_with(prefix))
            .map(|(_, collection)| Arc::clone(collection))
            .collect();

        // Invalidation emits signals; the registry lock is released first.
        for collection in &matching {
            collection.invalidate();
        }
        tracing::debug!(
            target: targets::REGISTRY,
            prefix = %prefix,
            count = matching.len(),
            "collections invalidated"
        );
        matching.len()
    }

    /// Removes every collection.
    pub fn clear(&self) {
        self.collections.write().clear();
    }
}
