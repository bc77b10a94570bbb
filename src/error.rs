//! Error types for schema loading and site publishing

use std::path::PathBuf;

use thiserror::Error;

/// Result type for OAK operations
pub type Result<T> = std::result::Result<T, OakError>;

/// Hard failures raised around the validator.
///
/// Schema violations are never reported through this type; they are plain
/// data returned by [`crate::validator::validate`].
#[derive(Error, Debug)]
pub enum OakError {
    #[error("File not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("Schema not found: {}", path.display())]
    SchemaNotFound { path: PathBuf },

    #[error("JSON parse error in {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid schema at {path}: {reason}")]
    InvalidSchema { path: String, reason: String },

    #[error("Unknown document type: {0}")]
    UnknownKind(String),

    #[error("Unsafe output path segment: {0}")]
    UnsafePath(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl OakError {
    pub(crate) fn invalid_schema(path: &str, reason: impl Into<String>) -> Self {
        Self::InvalidSchema {
            path: path.to_string(),
            reason: reason.into(),
        }
    }
}
