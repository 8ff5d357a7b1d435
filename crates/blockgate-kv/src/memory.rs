use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock};

use crate::error::{KvError, KvResult};
use crate::traits::{validate_namespace, KvBackend, KvStore, KvValue};

/// One in-memory namespace.
///
/// Values live in a `BTreeMap` behind a `RwLock` and are cloned on read and
/// write. Data is lost when the last handle is dropped.
#[derive(Debug)]
pub struct MemoryStore {
    namespace: String,
    values: RwLock<BTreeMap<String, KvValue>>,
}

impl MemoryStore {
    /// Create a new empty namespace.
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            values: RwLock::new(BTreeMap::new()),
        }
    }

    /// Number of keys currently stored.
    pub fn len(&self) -> KvResult<usize> {
        Ok(self.values.read().map_err(poisoned)?.len())
    }

    /// Returns `true` if the namespace holds no keys.
    pub fn is_empty(&self) -> KvResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Total payload bytes across all values.
    pub fn total_bytes(&self) -> KvResult<u64> {
        let values = self.values.read().map_err(poisoned)?;
        Ok(values.values().map(|val| val.len() as u64).sum())
    }
}

fn poisoned(e: impl std::fmt::Display) -> KvError {
    KvError::Poisoned(e.to_string())
}

impl KvStore for MemoryStore {
    fn namespace(&self) -> &str {
        &self.namespace
    }

    fn get(&self, key: &str) -> KvResult<Option<KvValue>> {
        let values = self.values.read().map_err(poisoned)?;
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: KvValue) -> KvResult<()> {
        let mut values = self.values.write().map_err(poisoned)?;
        values.insert(key.to_string(), value);
        Ok(())
    }

    fn delete(&self, key: &str) -> KvResult<bool> {
        let mut values = self.values.write().map_err(poisoned)?;
        Ok(values.remove(key).is_some())
    }

    fn keys(&self) -> KvResult<Vec<String>> {
        let values = self.values.read().map_err(poisoned)?;
        Ok(values.keys().cloned().collect())
    }

    fn clear_all(&self) -> KvResult<()> {
        self.values.write().map_err(poisoned)?.clear();
        Ok(())
    }
}

/// Process-local backend holding every namespace in memory.
///
/// Opening a namespace that is already open returns the same shared store,
/// so independent adapters addressing one logical database see one another's
/// writes.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    namespaces: RwLock<HashMap<String, Arc<MemoryStore>>>,
}

impl MemoryBackend {
    /// Create a backend with no namespaces.
    pub fn new() -> Self {
        Self::default()
    }
}

impl KvBackend for MemoryBackend {
    fn open(&self, name: &str) -> KvResult<Arc<dyn KvStore>> {
        validate_namespace(name)?;
        if let Some(store) = self.namespaces.read().map_err(poisoned)?.get(name) {
            let store: Arc<dyn KvStore> = store.clone();
            return Ok(store);
        }
        let mut namespaces = self.namespaces.write().map_err(poisoned)?;
        let store: Arc<dyn KvStore> = namespaces
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(MemoryStore::new(name)))
            .clone();
        tracing::debug!(namespace = name, "opened in-memory namespace");
        Ok(store)
    }

    fn namespaces(&self) -> KvResult<Vec<String>> {
        let mut names: Vec<String> = self
            .namespaces
            .read()
            .map_err(poisoned)?
            .keys()
            .cloned()
            .collect();
        names.sort();
        Ok(names)
    }
}
