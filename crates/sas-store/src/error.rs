//! Storage errors.

use thiserror::Error;

/// Errors raised while loading or persisting records.
#[derive(Error, Debug)]
pub enum StorageError {
    /// A record could not be serialized or deserialized.
    #[error("serialization error for {key}: {source}")]
    Serialization {
        /// Key of the record.
        key: String,
        /// Underlying serde error.
        #[source]
        source: serde_json::Error,
    },

    /// The backing file could not be read or written.
    #[error("io error on {path}: {source}")]
    Io {
        /// File being accessed.
        path: String,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The backend refused the write.
    #[error("backend rejected write: {0}")]
    Backend(String),

    /// A write queue was created outside a Tokio runtime.
    #[error("write queue requires a running Tokio runtime")]
    NoRuntime,

    /// The write queue's background task is gone; the write was not applied.
    #[error("write queue closed before the record was saved")]
    WriterClosed,
}
