//! Dual sink: every augmented batch goes to a CSV file and to the store.

use crate::augment::Technique;
use crate::data::record::{AugmentedBatch, Record};
use crate::error::{AugmentorError, Result};
use crate::persistence::atomic_write;
use crate::store::DocumentStore;
use serde_json::Value;
use std::borrow::Cow;
use std::path::{Path, PathBuf};

/// Where one batch ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SinkReceipt {
    pub csv_path: PathBuf,
    pub collection: String,
    pub inserted: usize,
}

/// Writes augmented batches to `<output_dir>/<technique>/` and to
/// `augmented_<technique>`.
///
/// Both writes append: running twice over the same input doubles the rows in
/// the store.
pub struct DualSink<'a> {
    store: &'a dyn DocumentStore,
    output_dir: PathBuf,
}

impl<'a> DualSink<'a> {
    pub fn new(store: &'a dyn DocumentStore, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            store,
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// CSV path for a batch. `index` is zero-based; `None` means unbatched.
    pub fn csv_path(&self, technique: Technique, index: Option<usize>) -> PathBuf {
        let name = technique.name();
        let file = match index {
            Some(i) => format!("{name}_batch_{}.csv", i + 1),
            None => format!("{name}.csv"),
        };
        self.output_dir.join(name).join(file)
    }

    /// Persist one batch: CSV first, then the store insert.
    pub async fn write_batch(
        &self,
        batch: &AugmentedBatch,
        technique: Technique,
        index: Option<usize>,
    ) -> Result<SinkReceipt> {
        let csv_path = self.csv_path(technique, index);
        let bytes = render_csv(&batch.columns, &batch.records)?;
        atomic_write(&csv_path, &bytes)?;
        tracing::info!(path = %csv_path.display(), rows = batch.len(), "Saved batch to CSV");

        let collection = technique.collection();
        let inserted = self
            .store
            .insert_many(&collection, batch.records.clone())
            .await?;
        tracing::info!(collection = %collection, inserted, "Saved batch to store");

        Ok(SinkReceipt {
            csv_path,
            collection,
            inserted,
        })
    }
}

/// Render records as CSV with a header row of `columns`.
///
/// Strings are written verbatim, null and absent fields as empty cells and any
/// other value as compact JSON.
pub fn render_csv(columns: &[String], records: &[Record]) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(columns)?;
    for record in records {
        writer.write_record(columns.iter().map(|c| cell_text(record.get(c)).into_owned()))?;
    }
    writer
        .into_inner()
        .map_err(|e| AugmentorError::Io(e.into_error()))
}

fn cell_text(value: Option<&Value>) -> Cow<'_, str> {
    match value {
        None | Some(Value::Null) => Cow::Borrowed(""),
        Some(Value::String(s)) => Cow::Borrowed(s.as_str()),
        Some(other) => Cow::Owned(other.to_string()),
    }
}
