//! Data handling: loading, cleaning, batching and persisting records.

pub mod batch;
pub mod clean;
pub mod import;
pub mod record;
pub mod sink;
pub mod source;

pub use batch::Batching;
pub use clean::clean_collection;
pub use import::{ImportFormat, import_file};
pub use record::{AugmentedBatch, Record, RecordSet};
pub use sink::{DualSink, SinkReceipt};
pub use source::load_records;
