//! In-process record store backend.
//!
//! Documents are held as JSON values keyed by (collection, id) so that the
//! same serde round-trip applies as with Firestore. Single-document
//! read-modify-write runs under the entry's write lock.

use crate::error::AppError;
use dashmap::DashMap;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

type DocKey = (String, String);

#[derive(Default)]
pub struct MemoryBackend {
    docs: DashMap<DocKey, Value>,
}

fn key(collection: &str, id: &str) -> DocKey {
    (collection.to_string(), id.to_string())
}

fn decode<T: DeserializeOwned>(value: Value) -> Result<T, AppError> {
    serde_json::from_value(value).map_err(|e| AppError::Database(format!("Decode failed: {}", e)))
}

fn encode<T: Serialize>(doc: &T) -> Result<Value, AppError> {
    serde_json::to_value(doc).map_err(|e| AppError::Database(format!("Encode failed: {}", e)))
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get<T: DeserializeOwned>(&self, collection: &str, id: &str) -> Result<Option<T>, AppError> {
        self.docs
            .get(&key(collection, id))
            .map(|entry| decode(entry.value().clone()))
            .transpose()
    }

    pub fn put<T: Serialize>(&self, collection: &str, id: &str, doc: &T) -> Result<(), AppError> {
        self.docs.insert(key(collection, id), encode(doc)?);
        Ok(())
    }

    pub fn find_by<T: DeserializeOwned>(
        &self,
        collection: &str,
        field: &str,
        value: &str,
    ) -> Result<Vec<T>, AppError> {
        // Collect matches first so no shard lock is held while decoding.
        let matches: Vec<Value> = self
            .docs
            .iter()
            .filter(|entry| entry.key().0 == collection)
            .filter(|entry| entry.value().get(field).and_then(Value::as_str) == Some(value))
            .map(|entry| entry.value().clone())
            .collect();

        matches.into_iter().map(decode).collect()
    }

    pub fn list<T: DeserializeOwned>(&self, collection: &str) -> Result<Vec<T>, AppError> {
        let docs: Vec<Value> = self
            .docs
            .iter()
            .filter(|entry| entry.key().0 == collection)
            .map(|entry| entry.value().clone())
            .collect();

        docs.into_iter().map(decode).collect()
    }

    pub fn update<T, F>(&self, collection: &str, id: &str, mut apply: F) -> Result<Option<T>, AppError>
    where
        T: Serialize + DeserializeOwned,
        F: FnMut(&mut T) -> Result<(), AppError>,
    {
        let Some(mut entry) = self.docs.get_mut(&key(collection, id)) else {
            return Ok(None);
        };

        let mut doc: T = decode(entry.value().clone())?;
        apply(&mut doc)?;
        *entry.value_mut() = encode(&doc)?;
        Ok(Some(doc))
    }

    pub fn upsert<T, F>(&self, collection: &str, id: &str, mut apply: F) -> Result<T, AppError>
    where
        T: Serialize + DeserializeOwned + Default,
        F: FnMut(&mut T),
    {
        let mut entry = self
            .docs
            .entry(key(collection, id))
            .or_insert(Value::Null);

        let mut doc: T = match entry.value() {
            Value::Null => T::default(),
            value => decode(value.clone())?,
        };
        apply(&mut doc);
        *entry.value_mut() = encode(&doc)?;
        Ok(doc)
    }
}
