// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::collections::BTreeMap;

use chrono::Utc;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use api_reflection::{ApiReflection, PrimitiveType, TypeKind};

use crate::validation::StructuralValidator;
use crate::walk::walk;

use super::entry::{HistoryEntry, MethodHistoryEntry};
use super::kv_store::{KeyValueStore, StoreError};

const HISTORY_KEY_PREFIX: &str = "history:";
const STRINGS_KEY_PREFIX: &str = "strings:";

fn history_key(method_path: &str) -> String {
    format!("{HISTORY_KEY_PREFIX}{method_path}")
}

fn strings_key(field_name: &str) -> String {
    format!("{STRINGS_KEY_PREFIX}{field_name}")
}

/// Request history per method and autocomplete suggestions per field name, kept in a
/// [`KeyValueStore`].
///
/// Keys are `history:<method path>` (a JSON array of [`HistoryEntry`], oldest first) and
/// `strings:<field name>` (a JSON array of strings). Garbage collection removes every other key.
pub struct HistoryStore<S> {
    store: S,
}

impl<S: KeyValueStore> HistoryStore<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn inner(&self) -> &S {
        &self.store
    }

    pub fn into_inner(self) -> S {
        self.store
    }

    /// Remove what the manifest no longer supports: foreign keys, histories of removed methods,
    /// entries whose payloads no longer validate and suggestions for field names no struct has.
    pub fn cleanup(&mut self, api: &ApiReflection) -> Result<(), StoreError> {
        self.collect_garbage(api, None)
    }

    /// Record a submission of `payload` to `method_path`, then harvest its strings for
    /// autocompletion. Earlier entries for the same request are replaced by the new one.
    pub fn store(
        &mut self,
        api: &ApiReflection,
        method_path: &str,
        payload: Value,
        query_string: Option<Value>,
    ) -> Result<HistoryEntry, StoreError> {
        let method = api
            .manifest()
            .method(method_path)
            .ok_or_else(|| StoreError::UnknownMethod(method_path.to_string()))?;

        let key = history_key(method_path);
        let newest = self
            .read_list::<HistoryEntry>(&key)?
            .iter()
            .map(|entry| entry.date_time)
            .max();
        let now = Utc::now().timestamp_millis();
        let entry = HistoryEntry {
            date_time: newest.map_or(now, |newest| now.max(newest + 1)),
            payload,
            query_string,
        };

        self.collect_garbage(api, Some((method_path, &entry)))?;

        let mut entries = self.read_list::<HistoryEntry>(&key)?;
        entries.push(entry.clone());
        self.write_list_evicting(&key, entries)?;

        self.harvest_strings(api, &method.in_type, &entry.payload)?;

        Ok(entry)
    }

    /// Entries for `method_path`, most recent first.
    pub fn history_of(&self, method_path: &str) -> Result<Vec<HistoryEntry>, StoreError> {
        let mut entries = self.read_list::<HistoryEntry>(&history_key(method_path))?;
        entries.reverse();
        Ok(entries)
    }

    /// The most recent entry across all methods.
    pub fn history_latest(&self) -> Result<Option<MethodHistoryEntry>, StoreError> {
        let mut latest: Option<MethodHistoryEntry> = None;

        for key in self.store.keys()? {
            let Some(method_path) = key.strip_prefix(HISTORY_KEY_PREFIX) else {
                continue;
            };
            for entry in self.read_list::<HistoryEntry>(&key)? {
                if latest
                    .as_ref()
                    .is_none_or(|latest| entry.date_time > latest.entry.date_time)
                {
                    latest = Some(MethodHistoryEntry {
                        method_path: method_path.to_string(),
                        entry,
                    });
                }
            }
        }

        Ok(latest)
    }

    /// Strings previously entered into fields named `field_name`.
    pub fn autocomplete(&self, field_name: &str) -> Result<Vec<String>, StoreError> {
        self.read_list(&strings_key(field_name))
    }

    /// Every autocomplete set, by field name.
    pub fn autocomplete_sets(&self) -> Result<BTreeMap<String, Vec<String>>, StoreError> {
        let mut sets = BTreeMap::new();
        for key in self.store.keys()? {
            if let Some(field_name) = key.strip_prefix(STRINGS_KEY_PREFIX) {
                sets.insert(field_name.to_string(), self.read_list(&key)?);
            }
        }
        Ok(sets)
    }

    fn collect_garbage(
        &mut self,
        api: &ApiReflection,
        storing: Option<(&str, &HistoryEntry)>,
    ) -> Result<(), StoreError> {
        let validator = StructuralValidator::new(api);

        for key in self.store.keys()? {
            if let Some(method_path) = key.strip_prefix(HISTORY_KEY_PREFIX) {
                let Some(method) = api.manifest().method(method_path) else {
                    tracing::warn!(
                        method_path,
                        "Dropping history of a method no longer in the API"
                    );
                    self.store.remove(&key)?;
                    continue;
                };
                let Some(entries) = self.parse_list::<HistoryEntry>(&key)? else {
                    self.store.remove(&key)?;
                    continue;
                };

                let count = entries.len();
                let kept: Vec<_> = entries
                    .into_iter()
                    .filter(|entry| {
                        let superseded = storing.is_some_and(|(storing_path, new_entry)| {
                            storing_path == method_path && entry.same_request(new_entry)
                        });
                        let valid = validator
                            .validate_value(&method.in_type, &entry.payload)
                            .is_ok();
                        if !valid {
                            tracing::warn!(
                                method_path,
                                date_time = entry.date_time,
                                "Dropping history entry that no longer validates"
                            );
                        }
                        valid && !superseded
                    })
                    .collect();

                if kept.is_empty() {
                    self.store.remove(&key)?;
                } else if kept.len() != count {
                    self.write_list_evicting(&key, kept)?;
                }
            } else if let Some(field_name) = key.strip_prefix(STRINGS_KEY_PREFIX) {
                let is_empty = self
                    .parse_list::<String>(&key)?
                    .is_none_or(|strings| strings.is_empty());
                if is_empty || !api.manifest().has_field_named(field_name) {
                    self.store.remove(&key)?;
                }
            } else {
                tracing::debug!(key, "Removing foreign store key");
                self.store.remove(&key)?;
            }
        }

        Ok(())
    }

    /// Record every non-empty string the payload holds in a `.string` field.
    fn harvest_strings(
        &mut self,
        api: &ApiReflection,
        type_name: &str,
        payload: &Value,
    ) -> Result<(), StoreError> {
        let mut harvested: Vec<(String, String)> = vec![];
        walk(api, type_name, payload, false, &mut |path, type_name, value| {
            let is_string_field = matches!(
                api.classify(type_name),
                TypeKind::Primitive(PrimitiveType::String)
            );
            if let (Value::String(text), Some(field_name)) = (value, path.autocomplete_name()) {
                if is_string_field && !text.is_empty() {
                    harvested.push((field_name.to_string(), text.clone()));
                }
            }
        });

        for (field_name, text) in harvested {
            let key = strings_key(&field_name);
            let mut strings = self.read_list::<String>(&key)?;
            if strings.contains(&text) {
                continue;
            }
            strings.push(text);
            match self.write_list(&key, &strings) {
                Err(StoreError::CapacityExceeded { .. }) => {
                    tracing::warn!(field_name, "No room left for autocomplete suggestions");
                }
                result => result?,
            }
        }

        Ok(())
    }

    /// Write a history list, dropping its oldest entries while the store has no room for it.
    fn write_list_evicting(
        &mut self,
        key: &str,
        mut entries: Vec<HistoryEntry>,
    ) -> Result<(), StoreError> {
        loop {
            match self.write_list(key, &entries) {
                Err(error @ StoreError::CapacityExceeded { .. }) => {
                    if entries.len() <= 1 {
                        tracing::error!(key, %error, "Could not store history");
                        return self.store.remove(key);
                    }
                    entries.remove(0);
                }
                result => return result,
            }
        }
    }

    fn write_list<T: Serialize>(&mut self, key: &str, list: &[T]) -> Result<(), StoreError> {
        let json = serde_json::to_string(list).map_err(|source| StoreError::Malformed {
            path: key.to_string(),
            source,
        })?;
        self.store.set(key, &json)
    }

    /// The list stored under `key`: `Some(empty)` when absent, `None` when malformed.
    fn parse_list<T: DeserializeOwned>(&self, key: &str) -> Result<Option<Vec<T>>, StoreError> {
        Ok(match self.store.get(key)? {
            None => Some(vec![]),
            Some(json) => serde_json::from_str(&json).ok(),
        })
    }

    fn read_list<T: DeserializeOwned>(&self, key: &str) -> Result<Vec<T>, StoreError> {
        Ok(self.parse_list(key)?.unwrap_or_else(|| {
            tracing::warn!(key, "Ignoring malformed store entry");
            vec![]
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::MemoryStore;
    use api_reflection::{ReflMethod, ReflectionManifest};
    use multiplatform_test::multiplatform_test;
    use serde_json::json;

    fn manifest() -> ReflectionManifest {
        ReflectionManifest::new()
            .with_method(ReflMethod::new("createUser", "CreateUser", "User"))
            .with_method(ReflMethod::new("tagUser", "TagUser", "User"))
            .with_struct("CreateUser", [("Name", ".string"), ("Age", ".int32")])
            .with_struct(
                "TagUser",
                [("Tags", "[.string]"), ("Notes", "{.string:.string}"), ("Role", "?Role")],
            )
            .with_struct("User", [("Name", ".string")])
            .with_enum("Role", ["admin"])
    }

    fn history() -> HistoryStore<MemoryStore> {
        HistoryStore::new(MemoryStore::new())
    }

    #[multiplatform_test]
    fn storing_records_history_and_suggestions() {
        let api = ApiReflection::new(manifest());
        let mut history = history();

        history
            .store(&api, "createUser", json!({"Name": "Bea", "Age": 20}), None)
            .unwrap();
        let stored = history
            .store(
                &api,
                "createUser",
                json!({"Name": "Ana", "Age": 31}),
                Some(json!({"dry": "1"})),
            )
            .unwrap();

        let entries = history.history_of("createUser").unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0], stored);
        assert!(entries[0].date_time > entries[1].date_time);

        let latest = history.history_latest().unwrap().unwrap();
        assert_eq!(latest.method_path, "createUser");
        assert_eq!(latest.entry.payload, json!({"Name": "Ana", "Age": 31}));

        assert_eq!(history.autocomplete("Name").unwrap(), vec!["Bea", "Ana"]);
    }

    #[multiplatform_test]
    fn repeated_requests_replace_earlier_entries() {
        let api = ApiReflection::new(manifest());
        let mut history = history();

        let payload = json!({"Name": "Ana", "Age": 31});
        history.store(&api, "createUser", payload.clone(), None).unwrap();
        history
            .store(&api, "createUser", payload.clone(), Some(json!({"x": "1"})))
            .unwrap();
        let again = history.store(&api, "createUser", payload, None).unwrap();

        let entries = history.history_of("createUser").unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0], again);
        assert_eq!(entries[1].query_string, Some(json!({"x": "1"})));
        // the bumped timestamp stays unique
        assert!(entries[0].date_time > entries[1].date_time);
        assert_eq!(history.autocomplete("Name").unwrap(), vec!["Ana"]);
    }

    #[multiplatform_test]
    fn harvesting_follows_nested_string_fields() {
        let api = ApiReflection::new(manifest());
        let mut history = history();

        history
            .store(
                &api,
                "tagUser",
                json!({"Tags": ["a", "", "b", "a"], "Notes": {"k": "note"}, "Role": "admin"}),
                None,
            )
            .unwrap();

        let sets = history.autocomplete_sets().unwrap();
        assert_eq!(
            sets,
            BTreeMap::from([
                ("Notes".to_string(), vec!["note".to_string()]),
                ("Tags".to_string(), vec!["a".to_string(), "b".to_string()]),
            ])
        );
    }

    #[multiplatform_test]
    fn cleanup_follows_the_manifest() {
        let api = ApiReflection::new(manifest());
        let mut history = history();

        history
            .store(&api, "createUser", json!({"Name": "Ana", "Age": 31}), None)
            .unwrap();
        history
            .store(&api, "tagUser", json!({"Tags": ["a"]}), None)
            .unwrap();

        let mut store = history.into_inner();
        store.set("unrelated", "1").unwrap();
        store
            .set(
                "history:createUser",
                &json!([
                    {"dateTime": 1, "payload": {"Name": 7}},
                    {"dateTime": 2, "payload": {"Name": "Ana", "Age": 31}}
                ])
                .to_string(),
            )
            .unwrap();
        store.set("strings:Empty", "[]").unwrap();
        let mut history = HistoryStore::new(store);

        // the next manifest no longer has tagUser, and Age became a string
        let api = ApiReflection::new(
            ReflectionManifest::new()
                .with_method(ReflMethod::new("createUser", "CreateUser", "User"))
                .with_struct("CreateUser", [("Name", ".string"), ("Age", ".string")])
                .with_struct("User", [("Name", ".string")]),
        );
        history.cleanup(&api).unwrap();

        assert_eq!(history.inner().keys().unwrap(), vec!["strings:Name"]);
        assert!(history.history_of("createUser").unwrap().is_empty());
        assert!(history.history_latest().unwrap().is_none());
    }

    #[multiplatform_test]
    fn cleanup_never_keeps_invalid_payloads() {
        let api = ApiReflection::new(manifest());
        let mut store = MemoryStore::new();
        store
            .set(
                "history:createUser",
                &json!([
                    {"dateTime": 1, "payload": {"Name": "Ana", "Age": 1.5}},
                    {"dateTime": 2, "payload": {"Nick": "A"}},
                    {"dateTime": 3, "payload": {"Name": "Bea"}}
                ])
                .to_string(),
            )
            .unwrap();
        store.set("history:tagUser", "not json").unwrap();
        let mut history = HistoryStore::new(store);

        history.cleanup(&api).unwrap();

        let entries = history.history_of("createUser").unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].payload, json!({"Name": "Bea"}));
        assert_eq!(history.inner().get("history:tagUser").unwrap(), None);
    }

    #[multiplatform_test]
    fn capacity_failures_evict_the_oldest_entries() {
        let api = ApiReflection::new(manifest());
        let mut history = HistoryStore::new(MemoryStore::with_capacity(300));

        for name in ["one", "two", "three", "four", "five"] {
            history
                .store(&api, "createUser", json!({"Name": name, "Age": 1}), None)
                .unwrap();
        }

        let entries = history.history_of("createUser").unwrap();
        assert!(!entries.is_empty() && entries.len() < 5);
        assert_eq!(entries[0].payload["Name"], json!("five"));
        assert!(history.inner().size() <= 300);
    }

    #[multiplatform_test]
    fn unknown_methods_are_rejected() {
        let api = ApiReflection::new(manifest());

        assert!(matches!(
            history().store(&api, "deleteUser", json!({}), None),
            Err(StoreError::UnknownMethod(_))
        ));
    }
}
