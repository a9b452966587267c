//! Storage errors
//!
//! Only writes produce errors; read problems degrade to "absent".

use std::path::PathBuf;

/// Failure to commit a profile document
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// IO error while writing
    #[error("io error writing {path}: {source}")]
    Io {
        /// File being written
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Profile could not be encoded as JSON
    #[error("encode error: {0}")]
    Encode(#[from] serde_json::Error),

    /// Backend-specific failure
    #[error("store backend error: {0}")]
    Backend(String),
}

impl StoreError {
    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
