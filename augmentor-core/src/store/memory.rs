//! In-process document store.

use super::{Document, DocumentStore, assign_id};
use crate::error::StoreError;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Mutex;

/// Volatile store keeping every collection in memory.
///
/// Records each `insert_many` call so callers can inspect how writes were
/// grouped.
#[derive(Default)]
pub struct MemoryStore {
    collections: Mutex<BTreeMap<String, Vec<Document>>>,
    inserts: Mutex<Vec<(String, usize)>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// `(collection, document count)` for every non-empty insert, in order.
    pub fn insert_log(&self) -> Vec<(String, usize)> {
        self.inserts
            .lock()
            .map(|log| log.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    fn backend(&self) -> &str {
        "memory"
    }

    async fn find_all(&self, collection: &str) -> Result<Vec<Document>, StoreError> {
        let collections = self.collections.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(collections.get(collection).cloned().unwrap_or_default())
    }

    async fn insert_many(
        &self,
        collection: &str,
        documents: Vec<Document>,
    ) -> Result<usize, StoreError> {
        if documents.is_empty() {
            return Ok(0);
        }
        let written = documents.len();
        {
            let mut collections = self.collections.lock().map_err(|_| StoreError::Poisoned)?;
            let target = collections.entry(collection.to_string()).or_default();
            for mut doc in documents {
                assign_id(&mut doc);
                target.push(doc);
            }
        }
        self.inserts
            .lock()
            .map_err(|_| StoreError::Poisoned)?
            .push((collection.to_string(), written));
        Ok(written)
    }

    async fn count(&self, collection: &str) -> Result<usize, StoreError> {
        let collections = self.collections.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(collections.get(collection).map_or(0, Vec::len))
    }

    async fn collections(&self) -> Result<Vec<String>, StoreError> {
        let collections = self.collections.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(collections
            .iter()
            .filter(|(_, docs)| !docs.is_empty())
            .map(|(name, _)| name.clone())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_memory_store_roundtrip() {
        let store = MemoryStore::new();
        let mut doc = Document::new();
        doc.insert("article".into(), json!("hello"));

        assert_eq!(store.insert_many("c", vec![doc]).await.unwrap(), 1);
        assert_eq!(store.insert_many("c", Vec::new()).await.unwrap(), 0);

        let docs = store.find_all("c").await.unwrap();
        assert_eq!(docs.len(), 1);
        assert!(docs[0].contains_key("_id"));
        assert_eq!(store.count("c").await.unwrap(), 1);
        assert_eq!(store.collections().await.unwrap(), vec!["c"]);
        assert_eq!(store.insert_log(), vec![("c".to_string(), 1)]);
    }
}
