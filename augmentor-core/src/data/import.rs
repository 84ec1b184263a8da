//! File importers for seeding store collections.

use crate::error::{AugmentorError, Result};
use crate::store::{Document, DocumentStore};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;

/// Supported import file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportFormat {
    /// A JSON array of objects, or a single object.
    Json,
    /// One JSON object per line.
    Jsonl,
    /// Comma-separated values with a header row.
    Csv,
}

impl ImportFormat {
    /// Pick a format from the file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "json" => Some(Self::Json),
            "jsonl" | "ndjson" => Some(Self::Jsonl),
            "csv" => Some(Self::Csv),
            _ => None,
        }
    }
}

/// Read a file into documents.
///
/// CSV cells are typed, except those of `text_field`, which stay strings.
pub async fn read_documents(
    path: &Path,
    format: ImportFormat,
    text_field: &str,
) -> Result<Vec<Document>> {
    let content = tokio::fs::read_to_string(path).await?;
    match format {
        ImportFormat::Json => parse_json(&content),
        ImportFormat::Jsonl => parse_jsonl(&content),
        ImportFormat::Csv => parse_csv(&content, text_field),
    }
}

/// Import a file into `collection`, returning the number of inserted documents.
pub async fn import_file(
    store: &dyn DocumentStore,
    path: &Path,
    collection: &str,
    text_field: &str,
    format: Option<ImportFormat>,
) -> Result<usize> {
    let format = match format.or_else(|| ImportFormat::from_path(path)) {
        Some(format) => format,
        None => {
            return Err(AugmentorError::config(format!(
                "Cannot infer import format from '{}'; pass one explicitly",
                path.display()
            )));
        }
    };
    let documents = read_documents(path, format, text_field).await?;
    let written = store.insert_many(collection, documents).await?;
    tracing::info!(
        path = %path.display(),
        collection,
        written,
        "Imported documents"
    );
    Ok(written)
}

fn parse_json(content: &str) -> Result<Vec<Document>> {
    let value: Value = serde_json::from_str(content)?;
    match value {
        Value::Array(items) => items.into_iter().map(into_document).collect(),
        Value::Object(map) => Ok(vec![map]),
        _ => Err(AugmentorError::config("JSON must be an array or object")),
    }
}

fn parse_jsonl(content: &str) -> Result<Vec<Document>> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| into_document(serde_json::from_str(line)?))
        .collect()
}

fn parse_csv(content: &str, text_field: &str) -> Result<Vec<Document>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(content.as_bytes());
    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();

    let mut documents = Vec::new();
    for row in reader.records() {
        let row = row?;
        let doc: Document = headers
            .iter()
            .zip(row.iter())
            .map(|(name, cell)| {
                let value = if name == text_field {
                    Value::String(cell.to_string())
                } else {
                    infer_cell(cell)
                };
                (name.clone(), value)
            })
            .collect();
        documents.push(doc);
    }
    Ok(documents)
}

fn into_document(value: Value) -> Result<Document> {
    match value {
        Value::Object(map) => Ok(map),
        // Scalars become single-field documents.
        other => {
            let mut doc = Document::new();
            doc.insert("value".to_string(), other);
            Ok(doc)
        }
    }
}

/// Type a CSV cell: integers, floats and booleans are parsed, empty is null.
/// Zero-padded numbers such as `007` stay strings.
fn infer_cell(cell: &str) -> Value {
    if cell.is_empty() {
        return Value::Null;
    }
    if is_zero_padded(cell) {
        return Value::String(cell.to_string());
    }
    if let Ok(i) = cell.parse::<i64>() {
        return Value::Number(i.into());
    }
    if let Ok(f) = cell.parse::<f64>() {
        if let Some(n) = serde_json::Number::from_f64(f) {
            return Value::Number(n);
        }
    }
    match cell {
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        _ => Value::String(cell.to_string()),
    }
}

fn is_zero_padded(cell: &str) -> bool {
    let digits = cell.strip_prefix('-').unwrap_or(cell);
    digits.len() > 1 && digits.starts_with('0') && !digits.starts_with("0.")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use serde_json::json;
    use std::path::PathBuf;
    use tempfile::TempDir;

    #[test]
    fn test_format_from_path() {
        assert_eq!(
            ImportFormat::from_path(&PathBuf::from("a.JSON")),
            Some(ImportFormat::Json)
        );
        assert_eq!(
            ImportFormat::from_path(&PathBuf::from("a.ndjson")),
            Some(ImportFormat::Jsonl)
        );
        assert_eq!(
            ImportFormat::from_path(&PathBuf::from("a.csv")),
            Some(ImportFormat::Csv)
        );
        assert_eq!(ImportFormat::from_path(&PathBuf::from("a.txt")), None);
    }

    #[test]
    fn test_parse_csv_quoted_and_typed() {
        let docs =
            parse_csv("id,article,score\n1,\"Hello, world\",0.5\n2,,true\n", "article").unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0]["id"], json!(1));
        assert_eq!(docs[0]["article"], json!("Hello, world"));
        assert_eq!(docs[0]["score"], json!(0.5));
        assert_eq!(docs[1]["article"], json!(""));
        assert_eq!(docs[1]["score"], json!(true));
    }

    #[test]
    fn test_parse_csv_keeps_text_field_and_padding() {
        let csv = "code,article,flag\n007,2024,true\n-01,true,0.5\n";
        let docs = parse_csv(csv, "article").unwrap();
        assert_eq!(docs[0]["code"], json!("007"));
        assert_eq!(docs[0]["article"], json!("2024"));
        assert_eq!(docs[0]["flag"], json!(true));
        assert_eq!(docs[1]["code"], json!("-01"));
        assert_eq!(docs[1]["article"], json!("true"));
        assert_eq!(docs[1]["flag"], json!(0.5));
    }

    #[test]
    fn test_parse_json_object_and_array() {
        assert_eq!(parse_json(r#"{"article": "x"}"#).unwrap().len(), 1);
        assert_eq!(
            parse_json(r#"[{"article": "x"}, {"article": "y"}]"#)
                .unwrap()
                .len(),
            2
        );
        assert!(parse_json("3").is_err());
    }

    #[tokio::test]
    async fn test_import_jsonl_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("raw.jsonl");
        std::fs::write(
            &path,
            "{\"article\": \"first\"}\n\n{\"article\": \"\", \"title\": \"t\"}\n",
        )
        .unwrap();

        let store = MemoryStore::new();
        let written = import_file(&store, &path, "My_Project", "article", None).await.unwrap();
        assert_eq!(written, 2);
        assert_eq!(store.count("My_Project").await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_import_unknown_extension_needs_format() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("raw.txt");
        std::fs::write(&path, "[]").unwrap();

        let store = MemoryStore::new();
        assert!(import_file(&store, &path, "raw", "article", None).await.is_err());
        let written = import_file(&store, &path, "raw", "article", Some(ImportFormat::Json))
            .await
            .unwrap();
        assert_eq!(written, 0);
    }
}
