//! Cleaning step: copy usable articles from the raw collection.

use crate::error::Result;
use crate::store::DocumentStore;
use serde_json::Value;

/// Copy every document of `from` whose `field` is truthy into `to`.
///
/// Documents are copied unchanged, `_id` included. Nothing is inserted when
/// no document qualifies. Returns the number of copied documents.
pub async fn clean_collection(
    store: &dyn DocumentStore,
    from: &str,
    to: &str,
    field: &str,
) -> Result<usize> {
    let documents = store.find_all(from).await?;
    let total = documents.len();
    let kept: Vec<_> = documents
        .into_iter()
        .filter(|doc| doc.get(field).is_some_and(is_truthy))
        .collect();

    let written = if kept.is_empty() {
        tracing::warn!(from, field, "No documents with a usable field; nothing copied");
        0
    } else {
        store.insert_many(to, kept).await?
    };

    tracing::info!(from, to, total, written, dropped = total - written, "Cleaned collection");
    Ok(written)
}

/// Truthiness of a field value: null, false, zero and empty values are falsy.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{Document, MemoryStore};
    use serde_json::json;

    fn doc(value: Value) -> Document {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_truthiness() {
        assert!(!is_truthy(&json!(null)));
        assert!(!is_truthy(&json!("")));
        assert!(!is_truthy(&json!(0)));
        assert!(!is_truthy(&json!(false)));
        assert!(!is_truthy(&json!([])));
        assert!(is_truthy(&json!(" ")));
        assert!(is_truthy(&json!("text")));
        assert!(is_truthy(&json!(3)));
    }

    #[tokio::test]
    async fn test_clean_keeps_only_articles() {
        let store = MemoryStore::new();
        store
            .insert_many(
                "My_Project",
                vec![
                    doc(json!({"_id": "a", "article": "keep me"})),
                    doc(json!({"_id": "b", "article": ""})),
                    doc(json!({"_id": "c", "title": "no article"})),
                    doc(json!({"_id": "d", "article": null})),
                    doc(json!({"_id": "e", "article": "also kept", "title": "t"})),
                ],
            )
            .await
            .unwrap();

        let written = clean_collection(&store, "My_Project", "cleaned_data", "article")
            .await
            .unwrap();
        assert_eq!(written, 2);

        let cleaned = store.find_all("cleaned_data").await.unwrap();
        let ids: Vec<&Value> = cleaned.iter().map(|d| &d["_id"]).collect();
        assert_eq!(ids, vec![&json!("a"), &json!("e")]);
        assert_eq!(cleaned[1]["title"], json!("t"));
    }

    #[tokio::test]
    async fn test_clean_with_nothing_usable_inserts_nothing() {
        let store = MemoryStore::new();
        store
            .insert_many("My_Project", vec![doc(json!({"article": ""}))])
            .await
            .unwrap();

        let written = clean_collection(&store, "My_Project", "cleaned_data", "article")
            .await
            .unwrap();
        assert_eq!(written, 0);
        assert!(!store
            .collections()
            .await
            .unwrap()
            .contains(&"cleaned_data".to_string()));
    }
}
