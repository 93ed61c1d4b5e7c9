//! Local fallback store
//!
//! A key-value namespace holding one JSON array per collection, newest
//! record first. Writes are whole-collection overwrites with no
//! compare-and-swap, so two processes sharing a namespace can lose updates.

use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::Result;

/// Collection holding build log records
pub const PIPELINES: &str = "pipelines";

/// Collection holding generated code records
pub const GENERATED_CODES: &str = "generatedCodes";

/// String-valued key-value namespace backing the local store
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

/// In-process key-value namespace
#[derive(Default)]
pub struct MemoryKv {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryKv {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryKv {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.entries.lock().remove(key);
        Ok(())
    }
}

/// Collection-level operations over a [`KeyValueStore`]
#[derive(Clone)]
pub struct LocalStore {
    kv: Arc<dyn KeyValueStore>,
}

impl LocalStore {
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self { kv }
    }

    /// Store backed by a fresh in-process namespace
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryKv::new()))
    }

    /// Read every record of a collection. A missing key, an unreadable
    /// namespace or malformed JSON all read as an empty collection.
    pub fn read_all(&self, collection: &str) -> Vec<Value> {
        let raw = match self.kv.get(collection) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                warn!("Local store read of {} failed: {}", collection, e);
                return Vec::new();
            }
        };

        match serde_json::from_str::<Vec<Value>>(&raw) {
            Ok(records) => records,
            Err(e) => {
                warn!("Ignoring malformed local collection {}: {}", collection, e);
                Vec::new()
            }
        }
    }

    /// Replace a collection wholesale
    pub fn write_all(&self, collection: &str, records: &[Value]) -> Result<()> {
        let raw = serde_json::to_string(records)?;
        self.kv.set(collection, &raw)?;
        debug!("Wrote {} records to local {}", records.len(), collection);
        Ok(())
    }

    /// Prepend a record, then keep at most `cap` records when a cap is given
    pub fn insert_front(&self, collection: &str, record: Value, cap: Option<usize>) -> Result<()> {
        let mut records = self.read_all(collection);
        records.insert(0, record);
        if let Some(cap) = cap {
            records.truncate(cap);
        }
        self.write_all(collection, &records)
    }

    /// First record whose `id` equals `id`
    pub fn find_by_id(&self, collection: &str, id: &str) -> Option<Value> {
        self.read_all(collection)
            .into_iter()
            .find(|r| record_id(r) == Some(id))
    }

    /// Keep only the records for which `keep` returns true, returning how
    /// many were dropped. Nothing is written when nothing is dropped.
    pub fn retain<F>(&self, collection: &str, mut keep: F) -> Result<usize>
    where
        F: FnMut(&Value) -> bool,
    {
        let records = self.read_all(collection);
        let before = records.len();
        let kept: Vec<Value> = records.into_iter().filter(|r| keep(r)).collect();
        let removed = before - kept.len();
        if removed > 0 {
            self.write_all(collection, &kept)?;
        }
        Ok(removed)
    }

    /// Remove every record whose `id` equals `id`, returning how many went
    pub fn remove_by_id(&self, collection: &str, id: &str) -> Result<usize> {
        self.retain(collection, |r| record_id(r) != Some(id))
    }

    /// Drop a collection, returning how many records it held
    pub fn clear(&self, collection: &str) -> Result<usize> {
        let count = self.read_all(collection).len();
        self.kv.remove(collection)?;
        Ok(count)
    }
}

fn record_id(record: &Value) -> Option<&str> {
    record.get("id").and_then(Value::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_missing_and_malformed_read_empty() {
        let kv = Arc::new(MemoryKv::new());
        let store = LocalStore::new(kv.clone());
        assert!(store.read_all(PIPELINES).is_empty());

        kv.set(PIPELINES, "{not json").unwrap();
        assert!(store.read_all(PIPELINES).is_empty());

        kv.set(PIPELINES, r#"{"id": "object, not array"}"#).unwrap();
        assert!(store.read_all(PIPELINES).is_empty());
    }

    #[test]
    fn test_insert_front_orders_newest_first_and_caps() {
        let store = LocalStore::in_memory();
        for i in 0..4 {
            store
                .insert_front(GENERATED_CODES, json!({"id": i.to_string()}), Some(3))
                .unwrap();
        }
        let ids: Vec<_> = store
            .read_all(GENERATED_CODES)
            .iter()
            .map(|r| r["id"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(ids, vec!["3", "2", "1"]);
    }

    #[test]
    fn test_find_retain_remove() {
        let store = LocalStore::in_memory();
        store.insert_front(PIPELINES, json!({"id": "a", "n": 1}), None).unwrap();
        store.insert_front(PIPELINES, json!({"id": "b", "n": 2}), None).unwrap();
        store.insert_front(PIPELINES, json!({"id": "c", "n": 3}), None).unwrap();

        assert_eq!(store.find_by_id(PIPELINES, "a").unwrap()["n"], 1);
        assert!(store.find_by_id(PIPELINES, "zzz").is_none());

        assert_eq!(store.retain(PIPELINES, |r| r["n"] != 2).unwrap(), 1);
        assert!(store.find_by_id(PIPELINES, "b").is_none());

        assert_eq!(store.remove_by_id(PIPELINES, "a").unwrap(), 1);
        assert_eq!(store.remove_by_id(PIPELINES, "a").unwrap(), 0);
        assert_eq!(store.read_all(PIPELINES).len(), 1);
    }

    #[test]
    fn test_collections_are_independent() {
        let store = LocalStore::in_memory();
        store.insert_front(PIPELINES, json!({"id": "p"}), None).unwrap();
        store.insert_front(GENERATED_CODES, json!({"id": "g"}), None).unwrap();

        assert_eq!(store.clear(PIPELINES).unwrap(), 1);
        assert!(store.read_all(PIPELINES).is_empty());
        assert_eq!(store.read_all(GENERATED_CODES).len(), 1);
    }
}
