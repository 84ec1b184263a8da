//! # Augmentor Core
//!
//! Batch text augmentation for article corpora kept in a document store.
//! Provides the record source, the four augmenters (back-translation,
//! contextual substitution, synonym substitution, random character noise),
//! the batch runner and the dual CSV + store sink.
//!
//! ```
//! use augmentor_core::{AugmentorConfig, DocumentStore, MemoryStore, Technique};
//! use augmentor_core::{build_augmenter, run_technique};
//!
//! # tokio_test::block_on(async {
//! let store = MemoryStore::new();
//! let doc = serde_json::json!({"article": "Augmenting several longer sentences works."});
//! store
//!     .insert_many("cleaned_data", vec![doc.as_object().unwrap().clone()])
//!     .await
//!     .unwrap();
//!
//! let dir = tempfile::tempdir().unwrap();
//! let mut config = AugmentorConfig::default();
//! config.seed = Some(7);
//! config.data.output_dir = dir.path().to_path_buf();
//!
//! let augmenter = build_augmenter(Technique::RandomAugmentations, &config).unwrap();
//! let report = run_technique(&store, augmenter.as_ref(), &config).await.unwrap();
//! assert_eq!(report.records, 1);
//! assert_eq!(store.count("augmented_Random_Augmentations").await.unwrap(), 1);
//! # });
//! ```

pub mod augment;
pub mod config;
pub mod data;
pub mod error;
pub mod persistence;
pub mod pipeline;
pub mod store;

// Re-export commonly used types at the crate root.
pub use augment::{Augmenter, Technique, apply_augmenter, build_augmenter};
pub use config::{AugmentorConfig, Selection, load_config};
pub use data::{
    AugmentedBatch, Batching, DualSink, Record, RecordSet, clean_collection, import_file,
    load_records,
};
pub use error::{AugmentError, AugmentorError, Result, StoreError};
pub use pipeline::{Pipeline, RunReport, run_technique};
pub use store::{Document, DocumentStore, MemoryStore, SqliteStore};
