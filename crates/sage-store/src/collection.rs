//! Record collection.
//!
//! A collection is a named container of JSON object records keyed by a
//! string id, with zero or more non-unique secondary indexes maintained on
//! every write.

use crate::error::{Error, Result};
use crate::types::{CollectionStats, IndexSpec, RecordKey};
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Interior state guarded by one lock.
///
/// Records live in a `BTreeMap` so that full scans come back in key order,
/// giving callers a deterministic iteration order. Index buckets are
/// `BTreeSet`s for the same reason.
struct CollectionState {
    records: BTreeMap<RecordKey, Value>,
    /// index name -> field value -> keys carrying that value
    indexes: HashMap<String, HashMap<String, BTreeSet<RecordKey>>>,
}

/// A named collection of keyed JSON records.
///
/// All operations take `&self`; interior mutability is a single
/// `parking_lot::RwLock` over the record map and its indexes, which is what
/// makes `put_batch` and `delete_batch` atomic with respect to readers.
pub struct Collection {
    name: String,
    specs: Vec<IndexSpec>,
    state: RwLock<CollectionState>,
}

impl Collection {
    /// Create a new, empty collection with the given secondary indexes.
    pub fn new(name: String, specs: Vec<IndexSpec>) -> Self {
        let indexes = specs
            .iter()
            .map(|spec| (spec.name.clone(), HashMap::new()))
            .collect();

        Self {
            name,
            specs,
            state: RwLock::new(CollectionState {
                records: BTreeMap::new(),
                indexes,
            }),
        }
    }

    /// Get the collection name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the index specifications.
    pub fn index_specs(&self) -> &[IndexSpec] {
        &self.specs
    }

    /// Get the number of records in the collection.
    pub fn len(&self) -> usize {
        self.state.read().records.len()
    }

    /// Check if the collection is empty.
    pub fn is_empty(&self) -> bool {
        self.state.read().records.is_empty()
    }

    /// Insert or overwrite a record.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRecord`] if the value is not a JSON object.
    pub fn put(&self, key: &str, value: Value) -> Result<()> {
        validate_record(key, &value)?;

        let mut state = self.state.write();
        apply_put(&mut state, &self.specs, key, value);
        Ok(())
    }

    /// Insert or overwrite a batch of records atomically.
    ///
    /// The whole batch is validated before any record is written, and the
    /// write happens under a single guard, so readers observe either none
    /// or all of the batch.
    ///
    /// # Returns
    ///
    /// The number of records written.
    pub fn put_batch<I>(&self, entries: I) -> Result<usize>
    where
        I: IntoIterator<Item = (RecordKey, Value)>,
    {
        let entries: Vec<(RecordKey, Value)> = entries.into_iter().collect();
        for (key, value) in &entries {
            validate_record(key, value)?;
        }

        let count = entries.len();
        let mut state = self.state.write();
        for (key, value) in entries {
            apply_put(&mut state, &self.specs, &key, value);
        }
        Ok(count)
    }

    /// Get a record by key.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.state.read().records.get(key).cloned()
    }

    /// Get all records, in key order.
    pub fn get_all(&self) -> Vec<Value> {
        self.state.read().records.values().cloned().collect()
    }

    /// Delete a record by key.
    ///
    /// # Returns
    ///
    /// `true` if the record existed and was removed.
    pub fn delete(&self, key: &str) -> bool {
        let mut state = self.state.write();
        apply_delete(&mut state, &self.specs, key)
    }

    /// Delete a batch of records under a single guard.
    ///
    /// # Returns
    ///
    /// The number of records actually removed.
    pub fn delete_batch(&self, keys: &[RecordKey]) -> usize {
        let mut state = self.state.write();
        keys.iter()
            .filter(|key| apply_delete(&mut state, &self.specs, key))
            .count()
    }

    /// Look up record keys through a secondary index.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IndexNotFound`] if the index was never declared.
    pub fn keys_by_index(&self, index: &str, value: &str) -> Result<Vec<RecordKey>> {
        let state = self.state.read();
        let buckets = state
            .indexes
            .get(index)
            .ok_or_else(|| Error::IndexNotFound {
                collection: self.name.clone(),
                index: index.to_string(),
            })?;

        Ok(buckets
            .get(value)
            .map(|keys| keys.iter().cloned().collect())
            .unwrap_or_default())
    }

    /// Remove every record from the collection.
    pub fn clear(&self) {
        let mut state = self.state.write();
        state.records.clear();
        for buckets in state.indexes.values_mut() {
            buckets.clear();
        }
    }

    /// Get collection statistics.
    pub fn stats(&self) -> CollectionStats {
        CollectionStats {
            name: self.name.clone(),
            record_count: self.len(),
            indexes: self.specs.iter().map(|s| s.name.clone()).collect(),
        }
    }

    /// Snapshot all records for persistence.
    pub(crate) fn snapshot(&self) -> Vec<(RecordKey, Value)> {
        self.state
            .read()
            .records
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

fn validate_record(key: &str, value: &Value) -> Result<()> {
    if !value.is_object() {
        return Err(Error::InvalidRecord(format!(
            "record '{}' is not a JSON object",
            key
        )));
    }
    Ok(())
}

fn indexed_value(spec: &IndexSpec, value: &Value) -> Option<String> {
    value.get(&spec.field)?.as_str().map(str::to_string)
}

fn apply_put(state: &mut CollectionState, specs: &[IndexSpec], key: &str, value: Value) {
    // Drop index entries for the previous version of the record, if any.
    if let Some(old) = state.records.get(key).cloned() {
        unindex(state, specs, key, &old);
    }

    for spec in specs {
        if let Some(field_value) = indexed_value(spec, &value) {
            if let Some(buckets) = state.indexes.get_mut(&spec.name) {
                buckets
                    .entry(field_value)
                    .or_default()
                    .insert(key.to_string());
            }
        }
    }

    state.records.insert(key.to_string(), value);
}

fn apply_delete(state: &mut CollectionState, specs: &[IndexSpec], key: &str) -> bool {
    match state.records.remove(key) {
        Some(old) => {
            unindex(state, specs, key, &old);
            true
        }
        None => false,
    }
}

fn unindex(state: &mut CollectionState, specs: &[IndexSpec], key: &str, old: &Value) {
    for spec in specs {
        if let Some(field_value) = indexed_value(spec, old) {
            if let Some(buckets) = state.indexes.get_mut(&spec.name) {
                if let Some(keys) = buckets.get_mut(&field_value) {
                    keys.remove(key);
                    if keys.is_empty() {
                        buckets.remove(&field_value);
                    }
                }
            }
        }
    }
}
