//! Storage for the container
//!
//! Uses DashMap with ahash for lock-free concurrent access. Two tables live
//! here: the binding registry (key -> binding history, plus the singleton
//! flags) and the singleton cache (key -> constructed instance).

use crate::Binding;
use crate::Instance;
use crate::Result;
use ahash::RandomState;
use dashmap::DashMap;
use once_cell::sync::OnceCell;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Build a string-keyed map with a shard count scaled to its expected size.
///
/// Default DashMap uses num_cpus * 4 shards which is overkill for a
/// container holding a few dozen bindings.
fn string_map<V>(capacity: usize) -> DashMap<String, V, RandomState> {
    let shard_amount = if capacity <= 16 {
        8
    } else if capacity <= 64 {
        16
    } else {
        32
    };
    DashMap::with_capacity_and_hasher_and_shard_amount(capacity, RandomState::new(), shard_amount)
}

// =============================================================================
// Binding Registry
// =============================================================================

/// Key -> binding history, plus which keys are singletons.
///
/// Re-binding a key shadows the previous binding: lookups always see the
/// most recent registration, while earlier ones stay in the history.
pub struct BindingRegistry {
    bindings: DashMap<String, Vec<Binding>, RandomState>,
    singletons: DashMap<String, (), RandomState>,
}

impl BindingRegistry {
    #[inline]
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    #[inline]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            bindings: string_map(capacity),
            singletons: string_map(capacity),
        }
    }

    /// Push a binding onto the key's history, returning the history length
    pub fn bind(&self, key: &str, binding: Binding) -> usize {
        let mut history = self.bindings.entry(key.to_string()).or_default();
        history.push(binding);
        history.len()
    }

    /// Flag a key as singleton. The flag is never cleared.
    #[inline]
    pub fn mark_singleton(&self, key: &str) {
        self.singletons.insert(key.to_string(), ());
    }

    /// The binding lookups resolve to: the most recent one
    #[inline]
    pub fn latest(&self, key: &str) -> Option<Binding> {
        self.bindings.get(key).and_then(|h| h.last().cloned())
    }

    /// Every binding registered for the key, oldest first
    pub fn history(&self, key: &str) -> Vec<Binding> {
        self.bindings
            .get(key)
            .map(|h| h.value().clone())
            .unwrap_or_default()
    }

    #[inline]
    pub fn is_bound(&self, key: &str) -> bool {
        self.bindings.contains_key(key)
    }

    #[inline]
    pub fn is_singleton(&self, key: &str) -> bool {
        self.singletons.contains_key(key)
    }

    /// Singleton key whose current binding is an alias to `type_name`.
    ///
    /// When several keys qualify the lexicographically smallest wins, so the
    /// answer does not depend on map iteration order.
    pub fn singleton_key_for(&self, type_name: &str) -> Option<String> {
        self.singletons
            .iter()
            .map(|r| r.key().clone())
            .filter(|key| {
                self.latest(key)
                    .is_some_and(|b| b.alias_target() == Some(type_name))
            })
            .min()
    }

    /// Sorted copy of every key's history
    pub fn snapshot(&self) -> BTreeMap<String, Vec<Binding>> {
        self.bindings
            .iter()
            .map(|r| (r.key().clone(), r.value().clone()))
            .collect()
    }

    /// Number of bound keys
    #[inline]
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

impl Default for BindingRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for BindingRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BindingRegistry")
            .field("keys", &self.len())
            .field("singletons", &self.singletons.len())
            .finish()
    }
}

// =============================================================================
// Singleton Storage
// =============================================================================

/// Key -> constructed singleton.
///
/// Each key owns a `OnceCell`, so the constructor for a key runs at most
/// once even when several threads ask for it at the same moment; the losers
/// block until the winner finishes and then share its instance. A failed
/// construction leaves the cell empty and the next caller tries again.
pub struct SingletonStorage {
    instances: DashMap<String, Arc<OnceCell<Instance>>, RandomState>,
}

impl SingletonStorage {
    #[inline]
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    #[inline]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            instances: string_map(capacity),
        }
    }

    /// The cached instance, if the key has been constructed
    #[inline]
    pub fn get(&self, key: &str) -> Option<Instance> {
        self.instances.get(key).and_then(|cell| cell.get().cloned())
    }

    /// Return the cached instance or construct, store and return it.
    ///
    /// The map shard is not locked while `init` runs, so `init` may resolve
    /// other singletons.
    pub fn get_or_try_init<F>(&self, key: &str, init: F) -> Result<Instance>
    where
        F: FnOnce() -> Result<Instance>,
    {
        let cell = {
            let entry = self.instances.entry(key.to_string()).or_default();
            Arc::clone(entry.value())
        };
        cell.get_or_try_init(init).cloned()
    }

    #[inline]
    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Number of constructed singletons
    pub fn len(&self) -> usize {
        self.instances
            .iter()
            .filter(|r| r.value().get().is_some())
            .count()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Keys with a constructed instance, sorted
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self
            .instances
            .iter()
            .filter(|r| r.value().get().is_some())
            .map(|r| r.key().clone())
            .collect();
        keys.sort();
        keys
    }
}

impl Default for SingletonStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SingletonStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SingletonStorage")
            .field("count", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DiError;

    #[derive(Clone)]
    struct TestService {
        value: i32,
    }

    #[test]
    fn test_registry_shadowing() {
        let registry = BindingRegistry::new();

        assert_eq!(registry.bind("Logger", "FileLogger".into()), 1);
        assert_eq!(registry.bind("Logger", "NullLogger".into()), 2);

        let latest = registry.latest("Logger").unwrap();
        assert_eq!(latest.alias_target(), Some("NullLogger"));
        assert_eq!(registry.history("Logger").len(), 2);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_registry_singleton_flags() {
        let registry = BindingRegistry::new();
        registry.bind("Cache", "RedisCache".into());
        assert!(!registry.is_singleton("Cache"));

        registry.mark_singleton("Cache");
        assert!(registry.is_singleton("Cache"));
        assert!(registry.is_bound("Cache"));
        assert!(!registry.is_bound("Other"));
    }

    #[test]
    fn test_singleton_key_for() {
        let registry = BindingRegistry::new();
        registry.bind("b.cache", "RedisCache".into());
        registry.mark_singleton("b.cache");
        registry.bind("a.cache", "RedisCache".into());
        registry.mark_singleton("a.cache");
        registry.bind("plain", "RedisCache".into());

        assert_eq!(registry.singleton_key_for("RedisCache").as_deref(), Some("a.cache"));
        assert!(registry.singleton_key_for("MemoryCache").is_none());

        // Shadowing the alias removes the key from the reverse lookup
        registry.bind("a.cache", "MemoryCache".into());
        assert_eq!(registry.singleton_key_for("RedisCache").as_deref(), Some("b.cache"));
    }

    #[test]
    fn test_snapshot_is_sorted_copy() {
        let registry = BindingRegistry::new();
        registry.bind("z", Binding::instance(TestService { value: 1 }));
        registry.bind("a", "A".into());

        let snapshot = registry.snapshot();
        assert_eq!(snapshot.keys().collect::<Vec<_>>(), vec!["a", "z"]);

        registry.bind("m", "M".into());
        assert_eq!(snapshot.len(), 2);
    }

    #[test]
    fn test_storage_init_once() {
        let storage = SingletonStorage::new();
        let mut calls = 0;

        let first = storage
            .get_or_try_init("svc", || {
                calls += 1;
                Ok(Instance::new(TestService { value: 42 }))
            })
            .unwrap();
        let second = storage
            .get_or_try_init("svc", || {
                calls += 1;
                Ok(Instance::new(TestService { value: 0 }))
            })
            .unwrap();

        assert_eq!(calls, 1);
        assert!(Instance::ptr_eq(&first, &second));
        assert_eq!(first.downcast::<TestService>().unwrap().value, 42);
    }

    #[test]
    fn test_storage_failed_init_retries() {
        let storage = SingletonStorage::new();

        let err = storage
            .get_or_try_init("svc", || Err(DiError::non_instantiable("svc")))
            .unwrap_err();
        assert_eq!(err.kind(), "non_instantiable");
        assert!(!storage.contains("svc"));
        assert!(storage.is_empty());

        storage
            .get_or_try_init("svc", || Ok(Instance::new(TestService { value: 1 })))
            .unwrap();
        assert!(storage.contains("svc"));
        assert_eq!(storage.keys(), vec!["svc".to_string()]);
    }
}
