//! Error types for naming.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for naming operations.
pub type NamingResult<T> = Result<T, NamingError>;

/// Errors that abort a naming run.
///
/// Per-instance problems (collisions, cycles, missing targets) are absorbed
/// and reported through [`crate::NamingReport`] instead.
#[derive(Debug, Error)]
pub enum NamingError {
    /// The naming configuration of a type cannot be evaluated.
    #[error("invalid naming config for {type_name}: {reason}")]
    InvalidConfig { type_name: String, reason: String },

    /// Naming configuration file could not be read.
    #[error("failed to read naming config {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Naming configuration could not be parsed.
    #[error("naming config parse error: {0}")]
    ConfigParse(#[from] serde_json::Error),
}

impl NamingError {
    pub(crate) fn invalid_config(type_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            type_name: type_name.into(),
            reason: reason.into(),
        }
    }
}
