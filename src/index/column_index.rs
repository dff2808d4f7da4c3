use serde::{Deserialize, Serialize};
use crate::core::ordered_map::OrderedMap;
use crate::core::types::{Record, RecordId, Value};

/// Secondary index over one column: stringified value -> record ids.
///
/// Buckets list ids in insertion order without duplicates. Empty buckets
/// are dropped so the index never reports a value no record holds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColumnIndex {
    buckets: OrderedMap<Vec<RecordId>>,
}

impl ColumnIndex {
    pub fn new() -> Self {
        ColumnIndex { buckets: OrderedMap::new() }
    }

    /// Full scan of `records` bucketing every id by its value of `column`.
    /// Records without the column are skipped.
    pub fn build<'a>(column: &str, records: impl IntoIterator<Item = (&'a str, &'a Record)>) -> Self {
        let mut index = ColumnIndex::new();
        for (id, record) in records {
            if let Some(value) = record.get(column) {
                index.add(value, id);
            }
        }
        index
    }

    pub fn key_of(value: &Value) -> String {
        value.to_string()
    }

    pub fn add(&mut self, value: &Value, id: &str) {
        let key = Self::key_of(value);
        match self.buckets.get_mut(&key) {
            Some(ids) => {
                if !ids.iter().any(|existing| existing == id) {
                    ids.push(id.to_string());
                }
            }
            None => {
                self.buckets.insert(key, vec![id.to_string()]);
            }
        }
    }

    pub fn remove(&mut self, value: &Value, id: &str) {
        let key = Self::key_of(value);
        let now_empty = match self.buckets.get_mut(&key) {
            Some(ids) => {
                ids.retain(|existing| existing != id);
                ids.is_empty()
            }
            None => false,
        };
        if now_empty {
            self.buckets.remove(&key);
        }
    }

    /// Move `old_id` (filed under `old`) to `new_id` under `new`
    pub fn replace(&mut self, old: Option<&Value>, old_id: &str, new: Option<&Value>, new_id: &str) {
        if let Some(value) = old {
            self.remove(value, old_id);
        }
        if let Some(value) = new {
            self.add(value, new_id);
        }
    }

    /// Record ids holding the value whose display is `key`
    pub fn lookup(&self, key: &str) -> &[RecordId] {
        self.buckets.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.buckets.keys()
    }

    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }
}
