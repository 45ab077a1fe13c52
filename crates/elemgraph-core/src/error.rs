//! Error types for the element model.

use thiserror::Error;

/// Result type alias for element model operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors raised while building or parsing model values.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// A full name could not be parsed into an element identifier.
    #[error("invalid element id {full_name:?}: {reason}")]
    InvalidElemId { full_name: String, reason: String },

    /// An identifier kind string was not recognized.
    #[error("unknown id type: {0}")]
    UnknownIdType(String),
}
