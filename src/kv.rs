// src/kv.rs

//! Thread-safe string-keyed store for heterogeneous payloads.
//!
//! Values are [`serde_json::Value`]s, so nested maps and lists are allowed.
//! Reads return structurally independent snapshots: mutating a snapshot never
//! affects the store, and later writes never show up in an earlier snapshot.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::Value;

/// Cloneable handle; all clones share the same underlying map.
#[derive(Debug, Clone, Default)]
pub struct Kv {
    inner: Arc<RwLock<BTreeMap<String, Value>>>,
}

impl Kv {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a single entry.
    pub fn add_entry(&self, key: impl Into<String>, value: impl Into<Value>) {
        self.inner.write().insert(key.into(), value.into());
    }

    /// Merge every entry of `other` into this store (entries in `other` win).
    pub fn add(&self, other: &Kv) {
        if Arc::ptr_eq(&self.inner, &other.inner) {
            return;
        }
        let snapshot = other.get();
        self.inner.write().extend(snapshot);
    }

    /// Deep snapshot of the whole store.
    pub fn get(&self) -> BTreeMap<String, Value> {
        self.inner.read().clone()
    }

    /// Deep copy of one value.
    pub fn get_value(&self, key: &str) -> Option<Value> {
        self.inner.read().get(key).cloned()
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }
}
