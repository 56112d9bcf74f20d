//! In-memory handbook store
//!
//! Process-wide, read-mostly storage for reference tables. The store is an
//! explicitly-owned object injected into every component that needs it, so
//! tests run against fixture tables.
//!
//! A refresh replaces a table wholesale behind the lock: readers observe
//! either the old snapshot or the new one, never a partially-updated table.
//! Snapshots are `Arc`s, so a reader keeps its version alive even while a
//! sync swaps the entry underneath it.

use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Shared handbook storage
#[derive(Default)]
pub struct HandbookStore {
    tables: RwLock<HashMap<String, Arc<Value>>>,
}

impl HandbookStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of one table
    pub fn get(&self, name: &str) -> Option<Arc<Value>> {
        self.tables
            .read()
            .expect("handbook store lock poisoned")
            .get(name)
            .cloned()
    }

    /// Replace one table wholesale
    pub fn replace(&self, name: impl Into<String>, table: Value) {
        self.tables
            .write()
            .expect("handbook store lock poisoned")
            .insert(name.into(), Arc::new(table));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tables
            .read()
            .expect("handbook store lock poisoned")
            .contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.tables
            .read()
            .expect("handbook store lock poisoned")
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_replace_is_wholesale() {
        let store = HandbookStore::new();
        store.replace("gender", json!({"data": {"М": []}}));

        let old_snapshot = store.get("gender").unwrap();
        store.replace("gender", json!({"data": {"Ж": []}}));

        // The old snapshot is unchanged; new readers see the replacement.
        assert!(old_snapshot["data"]["М"].is_array());
        assert!(store.get("gender").unwrap()["data"]["Ж"].is_array());
    }

    #[test]
    fn test_missing_table() {
        let store = HandbookStore::new();
        assert!(store.get("absent").is_none());
        assert!(!store.contains("absent"));
        assert!(store.is_empty());
    }
}
