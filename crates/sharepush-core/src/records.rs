use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::error::{Result, SharePushError};

pub const WORKS: &str = "works";
pub const CONTRIBUTORS: &str = "contributors";
pub const FUNDERS: &str = "funders";
pub const AWARDS: &str = "awards";

/// Separator for multi-valued columns. There is no escape for a literal `|`.
pub const MULTI_VALUE_SEPARATOR: char = '|';

/// Split a `|`-joined column into trimmed, non-empty pieces.
pub fn split_multi(value: &str) -> impl Iterator<Item = &str> {
    value
        .split(MULTI_VALUE_SEPARATOR)
        .map(str::trim)
        .filter(|piece| !piece.is_empty())
}

/// One row of a collection: its natural key plus every column as a string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub collection: String,
    pub key: String,
    pub fields: HashMap<String, String>,
}

impl Record {
    pub fn new(collection: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            key: key.into(),
            fields: HashMap::new(),
        }
    }

    pub fn with(mut self, column: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(column.into(), value.into());
        self
    }

    pub fn field(&self, column: &str) -> Option<&str> {
        self.fields.get(column).map(String::as_str)
    }

    /// The trimmed column value, or `None` when absent or blank.
    pub fn non_empty(&self, column: &str) -> Option<&str> {
        self.field(column)
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }

    pub fn multi(&self, column: &str) -> Vec<&str> {
        self.field(column).map(|v| split_multi(v).collect()).unwrap_or_default()
    }

    /// The column value; a missing column is an error, an empty one is not.
    pub fn require(&self, column: &str) -> Result<&str> {
        self.field(column).ok_or_else(|| SharePushError::MissingField {
            collection: self.collection.clone(),
            key: self.key.clone(),
            field: column.to_string(),
        })
    }
}

/// Rows of one collection, ordered by natural key.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Collection {
    pub name: String,
    pub rows: BTreeMap<String, Record>,
}

impl Collection {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rows: BTreeMap::new(),
        }
    }

    pub fn insert(&mut self, record: Record) {
        self.rows.insert(record.key.clone(), record);
    }

    pub fn get(&self, key: &str) -> Option<&Record> {
        self.rows.get(key)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.rows.keys().map(String::as_str)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecordStore {
    collections: HashMap<String, Collection>,
}

impl RecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_collection(&mut self, collection: Collection) {
        self.collections.insert(collection.name.clone(), collection);
    }

    /// Add a record, creating its collection on first use.
    pub fn insert(&mut self, record: Record) {
        self.collections
            .entry(record.collection.clone())
            .or_insert_with(|| Collection::new(record.collection.clone()))
            .insert(record);
    }

    pub fn collection(&self, name: &str) -> Option<&Collection> {
        self.collections.get(name)
    }

    pub fn require_collection(&self, name: &str) -> Result<&Collection> {
        self.collection(name)
            .ok_or_else(|| SharePushError::MissingCollection(name.to_string()))
    }

    /// Resolve a foreign key on behalf of `work`. A missing collection or row
    /// is a lookup failure.
    pub fn resolve(&self, collection: &str, key: &str, work: &str) -> Result<&Record> {
        self.collection(collection)
            .and_then(|c| c.get(key))
            .ok_or_else(|| SharePushError::LookupFailed {
                collection: collection.to_string(),
                key: key.to_string(),
                work: work.to_string(),
            })
    }

    pub fn collection_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.collections.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn record_count(&self) -> usize {
        self.collections.values().map(Collection::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.record_count() == 0
    }
}
