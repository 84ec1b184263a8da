//! Records and record sets.

use crate::store::{Document, ID_FIELD};
use serde::{Deserialize, Serialize};

/// One article document with its passthrough fields, `_id` removed.
pub type Record = Document;

/// The records of one collection plus their column layout.
///
/// Columns are the union of every record's keys in first-seen order, so a
/// field missing from early documents still gets a CSV column.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordSet {
    pub columns: Vec<String>,
    pub records: Vec<Record>,
}

impl RecordSet {
    /// Build a record set from raw store documents, dropping `_id`.
    pub fn from_documents(documents: Vec<Document>) -> Self {
        let mut columns: Vec<String> = Vec::new();
        let records: Vec<Record> = documents
            .into_iter()
            .map(|mut doc| {
                doc.shift_remove(ID_FIELD);
                for key in doc.keys() {
                    if !columns.iter().any(|c| c == key) {
                        columns.push(key.clone());
                    }
                }
                doc
            })
            .collect();
        Self { columns, records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }
}

/// A batch of records after augmentation.
#[derive(Debug, Clone, PartialEq)]
pub struct AugmentedBatch {
    /// Input columns followed by the technique column.
    pub columns: Vec<String>,
    pub records: Vec<Record>,
    /// Records whose augmentation failed and kept the original text.
    pub fallbacks: usize,
}

impl AugmentedBatch {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
