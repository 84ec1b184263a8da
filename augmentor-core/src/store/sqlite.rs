//! SQLite-backed document store.
//!
//! All collections share one table; each row holds one JSON document.

use super::{Document, DocumentStore, assign_id};
use crate::error::StoreError;
use async_trait::async_trait;
use rusqlite::{Connection, params};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS documents (
    seq INTEGER PRIMARY KEY AUTOINCREMENT,
    collection TEXT NOT NULL,
    doc_id TEXT NOT NULL,
    body TEXT NOT NULL,
    inserted_at TEXT NOT NULL,
    UNIQUE (collection, doc_id)
);
CREATE INDEX IF NOT EXISTS idx_documents_collection ON documents (collection, seq);
";

/// Document store in a single SQLite file.
///
/// The connection is opened once and shared by every call; queries run on
/// the blocking pool.
pub struct SqliteStore {
    location: PathBuf,
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open (or create) the store at `path`.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        conn.execute_batch(SCHEMA)?;
        tracing::debug!(path = %path.display(), "Opened SQLite document store");
        Ok(Self {
            location: path.to_path_buf(),
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open a private in-memory store.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            location: PathBuf::from(":memory:"),
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn location(&self) -> &Path {
        &self.location
    }

    /// Close the connection, surfacing any error SQLite reports on close.
    ///
    /// Dropping the store also closes it, silently.
    pub fn close(self) -> Result<(), StoreError> {
        let location = self.location;
        match Arc::try_unwrap(self.conn) {
            Ok(mutex) => {
                let conn = mutex.into_inner().map_err(|_| StoreError::Poisoned)?;
                conn.close().map_err(|(_, e)| StoreError::Sqlite(e))?;
                tracing::debug!(path = %location.display(), "Closed SQLite document store");
                Ok(())
            }
            // A query task still holds a handle; it closes when that finishes.
            Err(_) => Ok(()),
        }
    }

    async fn with_conn<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> Result<T, StoreError> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut guard = conn.lock().map_err(|_| StoreError::Poisoned)?;
            f(&mut *guard)
        })
        .await
        .map_err(|e| StoreError::Join(e.to_string()))?
    }
}

#[async_trait]
impl DocumentStore for SqliteStore {
    fn backend(&self) -> &str {
        "sqlite"
    }

    async fn find_all(&self, collection: &str) -> Result<Vec<Document>, StoreError> {
        let collection = collection.to_string();
        self.with_conn(move |conn| {
            let mut stmt =
                conn.prepare("SELECT body FROM documents WHERE collection = ?1 ORDER BY seq")?;
            let bodies = stmt
                .query_map(params![collection], |row| row.get::<_, String>(0))?
                .collect::<Result<Vec<_>, _>>()?;

            bodies
                .iter()
                .map(|body| match serde_json::from_str::<serde_json::Value>(body)? {
                    serde_json::Value::Object(map) => Ok(map),
                    _ => Err(StoreError::NotAnObject {
                        collection: collection.clone(),
                    }),
                })
                .collect()
        })
        .await
    }

    async fn insert_many(
        &self,
        collection: &str,
        documents: Vec<Document>,
    ) -> Result<usize, StoreError> {
        if documents.is_empty() {
            return Ok(0);
        }
        let collection = collection.to_string();
        self.with_conn(move |conn| {
            let inserted_at = chrono::Utc::now().to_rfc3339();
            let tx = conn.transaction()?;
            let mut written = 0;
            {
                let mut stmt = tx.prepare(
                    "INSERT INTO documents (collection, doc_id, body, inserted_at)
                     VALUES (?1, ?2, ?3, ?4)",
                )?;
                for mut doc in documents {
                    let id = assign_id(&mut doc);
                    let body = serde_json::to_string(&doc)?;
                    stmt.execute(params![collection, id, body, inserted_at])?;
                    written += 1;
                }
            }
            tx.commit()?;
            tracing::debug!(collection = %collection, written, "Inserted documents");
            Ok(written)
        })
        .await
    }

    async fn count(&self, collection: &str) -> Result<usize, StoreError> {
        let collection = collection.to_string();
        self.with_conn(move |conn| {
            let n: i64 = conn.query_row(
                "SELECT COUNT(*) FROM documents WHERE collection = ?1",
                params![collection],
                |row| row.get(0),
            )?;
            Ok(n.max(0) as usize)
        })
        .await
    }

    async fn collections(&self) -> Result<Vec<String>, StoreError> {
        self.with_conn(|conn| {
            let mut stmt =
                conn.prepare("SELECT DISTINCT collection FROM documents ORDER BY collection")?;
            let names = stmt
                .query_map([], |row| row.get::<_, String>(0))?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(names)
        })
        .await
    }
}
