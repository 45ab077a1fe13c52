//! Error types for index maintenance.

use thiserror::Error;

/// Result type alias for index operations.
pub type IndexResult<T> = Result<T, IndexError>;

/// Errors that can occur while reading or writing an index.
///
/// Every variant is fatal for the call that produced it. Updates can be
/// retried with the same input.
#[derive(Debug, Error)]
pub enum IndexError {
    /// The backing store rejected an operation.
    #[error("store error: {message}")]
    Store { message: String },

    /// I/O error (file operations).
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// Stored data could not be (de)serialized.
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// Stored identifier could not be parsed.
    #[error("invalid identifier in store: {0}")]
    Core(#[from] elemgraph_core::CoreError),
}

impl IndexError {
    pub fn store(message: impl Into<String>) -> Self {
        Self::Store {
            message: message.into(),
        }
    }
}
