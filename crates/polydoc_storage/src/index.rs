//! Index definitions and the hash-based key index used by the in-memory
//! engine.

use crate::error::{StorageError, StorageResult};
use crate::filter::Filter;
use crate::record::{Record, RecordId};
use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Declaration of an index on a collection.
///
/// A unique index with a `partial_filter` only constrains records matching
/// the filter; records outside the filter may share key values freely.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexDefinition {
    /// Name of the index, unique per collection.
    pub name: String,
    /// Indexed fields, in key order.
    pub fields: Vec<String>,
    /// Whether the index enforces uniqueness.
    #[serde(default)]
    pub unique: bool,
    /// Optional predicate restricting which records participate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partial_filter: Option<Filter>,
}

impl IndexDefinition {
    /// Creates a non-unique index definition.
    pub fn new<S: Into<String>>(name: impl Into<String>, fields: impl IntoIterator<Item = S>) -> Self {
        Self {
            name: name.into(),
            fields: fields.into_iter().map(Into::into).collect(),
            unique: false,
            partial_filter: None,
        }
    }

    /// Makes this a unique index.
    #[must_use]
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Restricts the index to records matching `filter`.
    #[must_use]
    pub fn partial(mut self, filter: Filter) -> Self {
        self.partial_filter = Some(filter);
        self
    }

    /// Returns true if this index covers exactly the given single field.
    pub fn is_on_field(&self, field: &str) -> bool {
        self.fields.len() == 1 && self.fields[0] == field
    }

    /// Extracts the index key for a record.
    ///
    /// Returns `None` if the record does not participate: it fails the
    /// partial filter, or it has none of the indexed fields set.
    pub fn key_for(&self, record: &Record) -> Option<Vec<Value>> {
        if let Some(filter) = &self.partial_filter {
            if !filter.matches(record) {
                return None;
            }
        }
        let key: Vec<Value> = self
            .fields
            .iter()
            .map(|f| record.field(f).into_owned())
            .collect();
        if key.iter().all(Value::is_null) {
            None
        } else {
            Some(key)
        }
    }
}

/// Hash-based key index.
///
/// Stores a mapping from key to the set of record IDs holding it. For
/// unique definitions, inserting a key already held by another record is
/// rejected.
#[derive(Debug, Clone)]
pub struct UniqueIndex {
    /// Index definition.
    definition: IndexDefinition,
    /// Key to record IDs mapping.
    entries: HashMap<Vec<Value>, HashSet<RecordId>>,
    /// Total entry count.
    count: usize,
}

impl UniqueIndex {
    /// Creates a new empty index.
    pub fn new(definition: IndexDefinition) -> Self {
        Self {
            definition,
            entries: HashMap::new(),
            count: 0,
        }
    }

    /// Returns the index definition.
    pub fn definition(&self) -> &IndexDefinition {
        &self.definition
    }

    /// Returns true if `record_id` may hold `key` without violating
    /// uniqueness.
    pub fn admits(&self, key: &[Value], record_id: RecordId) -> bool {
        if !self.definition.unique {
            return true;
        }
        match self.entries.get(key) {
            Some(holders) => holders.iter().all(|id| *id == record_id),
            None => true,
        }
    }

    /// Inserts a key-record mapping.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::DuplicateKey`] if the index is unique and the
    /// key is held by a different record.
    pub fn insert(&mut self, collection: &str, key: Vec<Value>, record_id: RecordId) -> StorageResult<()> {
        if !self.admits(&key, record_id) {
            return Err(StorageError::duplicate_key(collection, &self.definition.name));
        }
        let set = self.entries.entry(key).or_default();
        if set.insert(record_id) {
            self.count += 1;
        }
        Ok(())
    }

    /// Removes a key-record mapping.
    pub fn remove(&mut self, key: &[Value], record_id: RecordId) -> bool {
        if let Some(set) = self.entries.get_mut(key) {
            if set.remove(&record_id) {
                self.count -= 1;
                if set.is_empty() {
                    self.entries.remove(key);
                }
                return true;
            }
        }
        false
    }

    /// Looks up records by exact key.
    pub fn lookup(&self, key: &[Value]) -> Vec<RecordId> {
        self.entries
            .get(key)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Returns the number of entries in the index.
    pub fn len(&self) -> usize {
        self.count
    }

    /// Returns true if the index is empty.
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Builds an index over existing records.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::DuplicateKey`] if the records already violate
    /// a unique definition.
    pub fn build<'a>(
        definition: IndexDefinition,
        collection: &str,
        records: impl IntoIterator<Item = &'a Record>,
    ) -> StorageResult<Self> {
        let mut index = Self::new(definition);
        for record in records {
            if let Some(key) = index.definition.key_for(record) {
                index.insert(collection, key, record.id())?;
            }
        }
        Ok(index)
    }
}
