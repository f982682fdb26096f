//! Progress store error types.

use std::path::PathBuf;

use thiserror::Error;

/// Errors from reading or writing a persisted progress store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backing file could not be read or written.
    #[error("progress store I/O failed for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The backing file is not a JSON object of string values.
    #[error("progress store {path} is malformed: {message}")]
    Malformed { path: PathBuf, message: String },

    /// A progress record could not be encoded.
    #[error("failed to encode progress record: {0}")]
    Encode(#[from] serde_json::Error),
}
