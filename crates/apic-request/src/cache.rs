//! Per-field value cache.
//!
//! Values entered by the user are remembered by parameter identity so they
//! can be restored when the same operation is visited again. Each request
//! panel owns a local store registered under its owner id; panels that opt
//! in share a single process-wide store instead.

use crate::value::ParamValue;
use dashmap::DashMap;
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

type LocalStores = DashMap<String, HashMap<String, ParamValue>>;
type GlobalStore = DashMap<String, ParamValue>;

/// Process-wide stores backing [`ValueCache::shared`]
static SHARED_LOCAL: Lazy<Arc<LocalStores>> = Lazy::new(|| Arc::new(DashMap::new()));
static SHARED_GLOBAL: Lazy<Arc<GlobalStore>> = Lazy::new(|| Arc::new(DashMap::new()));

/// Key/value store keyed by (owner, parameter id) or by parameter id alone.
///
/// Cloning a `ValueCache` yields a handle to the same stores. Writes are
/// last-write-wins per key.
#[derive(Clone)]
pub struct ValueCache {
    local: Arc<LocalStores>,
    global: Arc<GlobalStore>,
}

impl ValueCache {
    /// Create a cache with its own, empty stores.
    pub fn new() -> Self {
        Self {
            local: Arc::new(DashMap::new()),
            global: Arc::new(DashMap::new()),
        }
    }

    /// Handle to the process-wide stores.
    pub fn shared() -> Self {
        Self {
            local: Arc::clone(&SHARED_LOCAL),
            global: Arc::clone(&SHARED_GLOBAL),
        }
    }

    /// Create the local store for an owner.
    pub fn register_local(&self, owner_id: &str) {
        self.local.entry(owner_id.to_string()).or_default();
    }

    /// Release every local entry of an owner.
    pub fn unregister_local(&self, owner_id: &str) {
        if self.local.remove(owner_id).is_some() {
            debug!("Released local value cache of {}", owner_id);
        }
    }

    /// Drop all local entries of an owner but keep it registered.
    pub fn clear_local(&self, owner_id: &str) {
        if let Some(mut store) = self.local.get_mut(owner_id) {
            store.clear();
        }
    }

    pub fn get(&self, owner_id: &str, key: &str, use_global: bool) -> Option<ParamValue> {
        if use_global {
            return self.global.get(key).map(|entry| entry.value().clone());
        }
        self.local
            .get(owner_id)
            .and_then(|store| store.get(key).cloned())
    }

    pub fn has(&self, owner_id: &str, key: &str, use_global: bool) -> bool {
        if use_global {
            return self.global.contains_key(key);
        }
        self.local
            .get(owner_id)
            .map(|store| store.contains_key(key))
            .unwrap_or(false)
    }

    /// Store a scalar value.
    pub fn set(&self, owner_id: &str, key: &str, value: impl Into<String>, use_global: bool) {
        self.store(owner_id, key, ParamValue::Single(value.into()), use_global);
    }

    /// Store the element at `index` of an array value, growing the array as needed.
    ///
    /// A scalar stored under the same key is replaced by the array.
    pub fn set_at(
        &self,
        owner_id: &str,
        key: &str,
        value: impl Into<String>,
        use_global: bool,
        index: usize,
    ) {
        let value = value.into();
        self.update(owner_id, key, use_global, move |slot| {
            let mut values = match slot.take() {
                Some(ParamValue::Multiple(values)) => values,
                _ => Vec::new(),
            };
            if values.len() <= index {
                values.resize(index + 1, String::new());
            }
            values[index] = value;
            *slot = Some(ParamValue::Multiple(values));
        });
    }

    /// Store a whole value, replacing what was there.
    pub fn store(&self, owner_id: &str, key: &str, value: ParamValue, use_global: bool) {
        self.update(owner_id, key, use_global, move |slot| *slot = Some(value));
    }

    /// Delete an entry, or a single array element when `index` is given.
    pub fn remove(&self, owner_id: &str, key: &str, use_global: bool, index: Option<usize>) {
        self.update(owner_id, key, use_global, |slot| match index {
            None => *slot = None,
            Some(index) => {
                if let Some(ParamValue::Multiple(values)) = slot
                    && index < values.len()
                {
                    values.remove(index);
                }
            }
        });
    }

    fn update(
        &self,
        owner_id: &str,
        key: &str,
        use_global: bool,
        apply: impl FnOnce(&mut Option<ParamValue>),
    ) {
        if use_global {
            let mut slot = self.global.remove(key).map(|(_, value)| value);
            apply(&mut slot);
            if let Some(value) = slot {
                self.global.insert(key.to_string(), value);
            }
            return;
        }

        let mut store = self.local.entry(owner_id.to_string()).or_default();
        let mut slot = store.remove(key);
        apply(&mut slot);
        if let Some(value) = slot {
            store.insert(key.to_string(), value);
        }
    }
}

impl Default for ValueCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_isolation() {
        let cache = ValueCache::new();
        cache.register_local("a");
        cache.register_local("b");

        cache.set("a", "limit", "10", false);
        cache.set("b", "limit", "20", false);

        assert_eq!(cache.get("a", "limit", false), Some(ParamValue::single("10")));
        assert_eq!(cache.get("b", "limit", false), Some(ParamValue::single("20")));
    }

    #[test]
    fn test_global_is_shared() {
        let cache = ValueCache::new();
        cache.set("a", "limit", "10", true);

        assert_eq!(cache.get("b", "limit", true), Some(ParamValue::single("10")));
        assert!(cache.has("b", "limit", true));
        assert!(!cache.has("b", "limit", false));
    }

    #[test]
    fn test_unregistered_owner_reads_empty() {
        let cache = ValueCache::new();
        assert_eq!(cache.get("ghost", "key", false), None);
        assert!(!cache.has("ghost", "key", false));
        cache.remove("ghost", "key", false, None);

        // Lazily created on first write
        cache.set("ghost", "key", "v", false);
        assert!(cache.has("ghost", "key", false));
    }

    #[test]
    fn test_set_at_grows_array() {
        let cache = ValueCache::new();
        cache.set_at("a", "tags", "x", false, 2);

        assert_eq!(
            cache.get("a", "tags", false),
            Some(ParamValue::Multiple(vec![
                String::new(),
                String::new(),
                "x".to_string()
            ]))
        );

        cache.set_at("a", "tags", "y", false, 0);
        assert_eq!(
            cache.get("a", "tags", false),
            Some(ParamValue::Multiple(vec![
                "y".to_string(),
                String::new(),
                "x".to_string()
            ]))
        );
    }

    #[test]
    fn test_remove_array_element() {
        let cache = ValueCache::new();
        cache.set_at("a", "tags", "x", false, 0);
        cache.set_at("a", "tags", "y", false, 1);

        cache.remove("a", "tags", false, Some(0));
        assert_eq!(
            cache.get("a", "tags", false),
            Some(ParamValue::Multiple(vec!["y".to_string()]))
        );

        // Out of range index is a no-op
        cache.remove("a", "tags", false, Some(5));
        assert!(cache.has("a", "tags", false));

        cache.remove("a", "tags", false, None);
        assert!(!cache.has("a", "tags", false));
    }

    #[test]
    fn test_unregister_releases_entries() {
        let cache = ValueCache::new();
        cache.register_local("a");
        cache.set("a", "limit", "10", false);

        cache.unregister_local("a");
        assert_eq!(cache.get("a", "limit", false), None);
    }

    #[test]
    fn test_clear_local_keeps_global() {
        let cache = ValueCache::new();
        cache.set("a", "local", "1", false);
        cache.set("a", "shared", "2", true);

        cache.clear_local("a");
        assert!(!cache.has("a", "local", false));
        assert!(cache.has("a", "shared", true));
    }
}
