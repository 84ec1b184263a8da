//! Error types for Augmentor.
//!
//! Fatal errors (`AugmentorError`) stop a run before anything is written.
//! Per-record errors (`AugmentError`) are recovered by the batch runner,
//! which keeps the original text and moves on.

/// Top-level error type for the Augmentor library.
#[derive(Debug, thiserror::Error)]
pub enum AugmentorError {
    #[error("No data found in collection '{collection}'")]
    DataUnavailable { collection: String },

    #[error("Field '{field}' not found in collection '{collection}'")]
    Schema { field: String, collection: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Augmenter setup failed: {0}")]
    Augment(#[from] AugmentError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl AugmentorError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Whether the error was raised by pre-flight validation of the input data.
    pub fn is_preflight(&self) -> bool {
        matches!(self, Self::DataUnavailable { .. } | Self::Schema { .. })
    }
}

/// Errors from the document store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Document serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Store IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Document in '{collection}' is not a JSON object")]
    NotAnObject { collection: String },

    #[error("Store task failed: {0}")]
    Join(String),

    #[error("Store lock poisoned")]
    Poisoned,
}

/// Errors raised while augmenting a single text.
#[derive(Debug, thiserror::Error)]
pub enum AugmentError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Service returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Unexpected response from {service}: {message}")]
    InvalidResponse { service: String, message: String },

    #[error("Thesaurus error: {0}")]
    Thesaurus(String),

    #[error("Random generator lock poisoned")]
    Poisoned,
}

impl AugmentError {
    pub fn invalid_response(service: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidResponse {
            service: service.into(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, AugmentorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = AugmentorError::DataUnavailable {
            collection: "cleaned_data".into(),
        };
        assert_eq!(err.to_string(), "No data found in collection 'cleaned_data'");

        let err = AugmentorError::Schema {
            field: "article".into(),
            collection: "cleaned_data".into(),
        };
        assert!(err.to_string().contains("'article'"));
    }

    #[test]
    fn test_store_error_converts() {
        let err: AugmentorError = StoreError::NotAnObject {
            collection: "raw".into(),
        }
        .into();
        assert!(matches!(err, AugmentorError::Store(_)));
        assert!(!err.is_preflight());
    }

    #[test]
    fn test_preflight_classification() {
        assert!(
            AugmentorError::DataUnavailable {
                collection: "x".into()
            }
            .is_preflight()
        );
        assert!(!AugmentorError::config("bad").is_preflight());
    }
}
