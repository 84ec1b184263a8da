//! Batch runner: augment a record set batch by batch and persist each batch
//! before the next one starts.

use crate::augment::{Augmenter, Technique, apply_augmenter};
use crate::config::AugmentorConfig;
use crate::data::{AugmentedBatch, Batching, DualSink, Record, RecordSet, load_records};
use crate::error::Result;
use crate::store::DocumentStore;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::PathBuf;

/// Summary of one technique run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub technique: Technique,
    pub collection: String,
    pub batches: usize,
    pub records: usize,
    /// Records that kept their original text because the augmenter failed.
    pub fallbacks: usize,
    pub files: Vec<PathBuf>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl RunReport {
    pub fn duration(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }
}

/// One technique applied over a record set.
pub struct Pipeline<'a> {
    augmenter: &'a dyn Augmenter,
    sink: DualSink<'a>,
    batching: Batching,
    text_field: String,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        augmenter: &'a dyn Augmenter,
        sink: DualSink<'a>,
        batching: Batching,
        text_field: &str,
    ) -> Self {
        Self {
            augmenter,
            sink,
            batching,
            text_field: text_field.to_string(),
        }
    }

    /// Run every batch in order. A batch is fully written to CSV and to the
    /// store before the next is augmented.
    pub async fn run(&self, records: &RecordSet) -> Result<RunReport> {
        let technique = self.augmenter.technique();
        let started_at = Utc::now();
        let columns = output_columns(&records.columns, technique);
        let ranges = self.batching.ranges(records.len());
        let total = ranges.len();

        tracing::info!(
            technique = %technique,
            records = records.len(),
            batches = total,
            "Starting augmentation"
        );

        let mut files = Vec::with_capacity(total);
        let mut fallbacks = 0;
        for (i, range) in ranges.into_iter().enumerate() {
            tracing::info!(technique = %technique, "Processing batch {}/{}", i + 1, total);
            let batch = self
                .augment_batch(&columns, &records.records[range], technique)
                .await;
            fallbacks += batch.fallbacks;

            let index = self.batching.is_chunked().then_some(i);
            let receipt = self.sink.write_batch(&batch, technique, index).await?;
            files.push(receipt.csv_path);
        }

        let report = RunReport {
            technique,
            collection: technique.collection(),
            batches: total,
            records: records.len(),
            fallbacks,
            files,
            started_at,
            finished_at: Utc::now(),
        };
        tracing::info!(
            technique = %technique,
            records = report.records,
            fallbacks = report.fallbacks,
            elapsed_ms = report.duration().num_milliseconds(),
            "Augmentation complete"
        );
        Ok(report)
    }

    async fn augment_batch(
        &self,
        columns: &[String],
        records: &[Record],
        technique: Technique,
    ) -> AugmentedBatch {
        let mut out = Vec::with_capacity(records.len());
        let mut fallbacks = 0;
        for record in records {
            let input = record.get(&self.text_field).unwrap_or(&Value::Null);
            let applied = apply_augmenter(self.augmenter, input).await;
            if applied.fell_back {
                fallbacks += 1;
            }
            let mut augmented = record.clone();
            augmented.insert(technique.column().to_string(), applied.value);
            out.push(augmented);
        }
        AugmentedBatch {
            columns: columns.to_vec(),
            records: out,
            fallbacks,
        }
    }
}

/// Input columns followed by the technique column, unless already present.
fn output_columns(input: &[String], technique: Technique) -> Vec<String> {
    let mut columns = input.to_vec();
    if !columns.iter().any(|c| c == technique.column()) {
        columns.push(technique.column().to_string());
    }
    columns
}

/// Load the configured source collection and run one technique over it.
///
/// Pre-flight failures (empty collection, missing text field) return before
/// anything is written.
pub async fn run_technique(
    store: &dyn DocumentStore,
    augmenter: &dyn Augmenter,
    config: &AugmentorConfig,
) -> Result<RunReport> {
    let technique = augmenter.technique();
    let records = load_records(
        store,
        &config.data.source_collection,
        &config.data.text_field,
    )
    .await?;

    let batching = Batching::from_size(config.batch_size_for(technique));
    let sink = DualSink::new(store, &config.data.output_dir);
    Pipeline::new(augmenter, sink, batching, &config.data.text_field)
        .run(&records)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_columns_appends_once() {
        let input = vec!["title".to_string(), "article".to_string()];
        assert_eq!(
            output_columns(&input, Technique::BackTranslation),
            vec!["title", "article", "Back_Translated"]
        );

        let input = vec!["Back_Translated".to_string(), "article".to_string()];
        assert_eq!(
            output_columns(&input, Technique::BackTranslation),
            vec!["Back_Translated", "article"]
        );
    }
}
