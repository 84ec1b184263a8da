//! Record source: loads the input collection and checks it before any work.

use crate::data::record::RecordSet;
use crate::error::{AugmentorError, Result};
use crate::store::DocumentStore;

/// Load every document of `collection` as records.
///
/// Fails with [`AugmentorError::DataUnavailable`] when the collection is empty
/// and with [`AugmentorError::Schema`] when no document carries
/// `required_field`. Both happen before any transform runs.
pub async fn load_records(
    store: &dyn DocumentStore,
    collection: &str,
    required_field: &str,
) -> Result<RecordSet> {
    let documents = store.find_all(collection).await?;
    if documents.is_empty() {
        return Err(AugmentorError::DataUnavailable {
            collection: collection.to_string(),
        });
    }

    let records = RecordSet::from_documents(documents);
    if !records.has_column(required_field) {
        return Err(AugmentorError::Schema {
            field: required_field.to_string(),
            collection: collection.to_string(),
        });
    }

    tracing::info!(
        collection,
        backend = store.backend(),
        records = records.len(),
        columns = records.columns.len(),
        "Loaded records"
    );
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{Document, MemoryStore};
    use serde_json::json;

    fn doc(value: serde_json::Value) -> Document {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn test_empty_collection_is_unavailable() {
        let store = MemoryStore::new();
        let err = load_records(&store, "cleaned_data", "article")
            .await
            .unwrap_err();
        assert!(matches!(err, AugmentorError::DataUnavailable { .. }));
    }

    #[tokio::test]
    async fn test_missing_field_is_schema_error() {
        let store = MemoryStore::new();
        store
            .insert_many("cleaned_data", vec![doc(json!({"title": "no body"}))])
            .await
            .unwrap();
        let err = load_records(&store, "cleaned_data", "article")
            .await
            .unwrap_err();
        match err {
            AugmentorError::Schema { field, collection } => {
                assert_eq!(field, "article");
                assert_eq!(collection, "cleaned_data");
            }
            other => panic!("expected schema error, got {other}"),
        }
    }

    #[tokio::test]
    async fn test_loads_records_without_ids() {
        let store = MemoryStore::new();
        store
            .insert_many(
                "cleaned_data",
                vec![
                    doc(json!({"article": "one", "source": "bbc"})),
                    doc(json!({"article": "two"})),
                ],
            )
            .await
            .unwrap();

        let records = load_records(&store, "cleaned_data", "article").await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records.columns, vec!["article", "source"]);
        assert!(!records.records[0].contains_key("_id"));
    }
}
