//! Document store abstraction.
//!
//! A store holds named collections of JSON object documents. Every document
//! carries an `_id`; stores assign one on insert when it is missing.

pub mod memory;
pub mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use crate::error::StoreError;
use async_trait::async_trait;
use serde_json::Value;

/// A stored document: an ordered map of field name to JSON value.
pub type Document = serde_json::Map<String, Value>;

/// Field holding the store-internal document identifier.
pub const ID_FIELD: &str = "_id";

/// Keyed document storage shared by the source, the sink and the cleaner.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Short backend name for logs.
    fn backend(&self) -> &str;

    /// Every document of a collection, in insertion order.
    async fn find_all(&self, collection: &str) -> Result<Vec<Document>, StoreError>;

    /// Append documents to a collection, assigning `_id` where absent.
    ///
    /// Returns the number of documents written. An empty slice is a no-op.
    async fn insert_many(
        &self,
        collection: &str,
        documents: Vec<Document>,
    ) -> Result<usize, StoreError>;

    /// Number of documents in a collection (zero for unknown collections).
    async fn count(&self, collection: &str) -> Result<usize, StoreError>;

    /// Names of every collection holding at least one document.
    async fn collections(&self) -> Result<Vec<String>, StoreError>;
}

/// Ensure a document has an `_id`, returning its string form.
pub(crate) fn assign_id(document: &mut Document) -> String {
    match document.get(ID_FIELD) {
        Some(Value::String(id)) => id.clone(),
        Some(other) => other.to_string(),
        None => {
            let id = uuid::Uuid::new_v4().simple().to_string();
            document.insert(ID_FIELD.to_string(), Value::String(id.clone()));
            id
        }
    }
}
