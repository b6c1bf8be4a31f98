//! Error types for docqa-db.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for docqa-db operations.
pub type DbResult<T> = Result<T, DbError>;

/// Errors that can occur in docqa-db operations.
#[derive(Debug, Error)]
pub enum DbError {
    // ========================================================================
    // Vector index errors
    // ========================================================================
    /// Vector index I/O error.
    #[error("Vector index I/O error at {path}: {message}")]
    VectorIo { path: PathBuf, message: String },

    /// Vector index parse error.
    #[error("Vector index parse error at {path}: {message}")]
    VectorParse { path: PathBuf, message: String },

    /// Vector dimension mismatch.
    #[error("Vector dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Vector index incompatible with the requested configuration.
    #[error("Vector index incompatible: {reason}")]
    IndexIncompatible { reason: String },

    /// Requested backend is unknown or compiled out.
    #[error("Vector backend '{backend}' is not available. Available backends: {available}")]
    BackendUnavailable { backend: String, available: String },

    // ========================================================================
    // General errors
    // ========================================================================
    /// IO error wrapper.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error wrapper.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic internal error.
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl DbError {
    /// Create a vector I/O error.
    pub fn vector_io(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::VectorIo {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a vector parse error.
    pub fn vector_parse(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::VectorParse {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create an index incompatible error.
    pub fn index_incompatible(reason: impl Into<String>) -> Self {
        Self::IndexIncompatible {
            reason: reason.into(),
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}
