// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::collections::BTreeMap;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Storing {needed} bytes would exceed the capacity of {capacity} bytes")]
    CapacityExceeded { needed: usize, capacity: usize },

    #[error("Failed to access store file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed store file '{path}': {source}")]
    Malformed {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("No method '{0}' in the manifest")]
    UnknownMethod(String),
}

/// String-keyed storage of string values, in the manner of a browser's local storage.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Fails with [`StoreError::CapacityExceeded`] when the store cannot hold the value.
    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError>;

    fn remove(&mut self, key: &str) -> Result<(), StoreError>;

    fn keys(&self) -> Result<Vec<String>, StoreError>;
}

/// An in-memory store, optionally bounded by the total size of its keys and values.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: BTreeMap<String, String>,
    capacity: Option<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store holding at most `capacity` bytes of keys and values.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: BTreeMap::new(),
            capacity: Some(capacity),
        }
    }

    pub(super) fn from_entries(entries: BTreeMap<String, String>, capacity: Option<usize>) -> Self {
        Self { entries, capacity }
    }

    pub(super) fn entries(&self) -> &BTreeMap<String, String> {
        &self.entries
    }

    /// Bytes currently used.
    pub fn size(&self) -> usize {
        self.entries
            .iter()
            .map(|(key, value)| key.len() + value.len())
            .sum()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        if let Some(capacity) = self.capacity {
            let replaced = self
                .entries
                .get(key)
                .map(|old| key.len() + old.len())
                .unwrap_or(0);
            let needed = self.size() - replaced + key.len() + value.len();
            if needed > capacity {
                return Err(StoreError::CapacityExceeded { needed, capacity });
            }
        }
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        self.entries.remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.entries.keys().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use multiplatform_test::multiplatform_test;

    #[multiplatform_test]
    fn basic_operations() {
        let mut store = MemoryStore::new();

        store.set("a", "1").unwrap();
        store.set("b", "2").unwrap();
        store.set("a", "3").unwrap();

        assert_eq!(store.get("a").unwrap().as_deref(), Some("3"));
        assert_eq!(store.keys().unwrap(), vec!["a", "b"]);

        store.remove("a").unwrap();
        assert_eq!(store.get("a").unwrap(), None);
        assert_eq!(store.size(), 2);
    }

    #[multiplatform_test]
    fn capacity_counts_keys_and_values() {
        let mut store = MemoryStore::with_capacity(10);

        store.set("key", "1234567").unwrap();
        // replacing a value only needs room for the difference
        store.set("key", "7654321").unwrap();
        assert!(matches!(
            store.set("key", "12345678"),
            Err(StoreError::CapacityExceeded {
                needed: 11,
                capacity: 10
            })
        ));
        assert!(matches!(
            store.set("k", ""),
            Err(StoreError::CapacityExceeded { .. })
        ));
        assert_eq!(store.get("key").unwrap().as_deref(), Some("7654321"));
    }
}
