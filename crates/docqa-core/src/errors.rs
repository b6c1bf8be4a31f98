//! Error types for docqa-core.
//!
//! Only failures that stop an operation live here. Refusals that the answer
//! pipeline reports to the user (blocked, no evidence, low relevance) are
//! data on [`crate::pipeline::ChatResponse`], not errors.

use std::path::PathBuf;

use thiserror::Error;

/// Domain-specific errors for docqa operations.
#[derive(Error, Debug)]
pub enum DocQaError {
    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    /// The configuration file exists but cannot be read or parsed.
    #[error("Config invalid: {0}")]
    InvalidConfig(String),

    /// A configuration value is invalid.
    #[error("Invalid configuration: {message}. {hint}")]
    InvalidConfiguration {
        /// Description of the invalid configuration.
        message: String,
        /// Actionable hint on how to fix it.
        hint: String,
    },

    // -------------------------------------------------------------------------
    // Vector Index Errors
    // -------------------------------------------------------------------------
    /// Vector index I/O error.
    #[error("Vector index I/O error at `{path}`: {message}")]
    VectorIndexIo { path: PathBuf, message: String },

    /// Vector index parse error.
    #[error("Vector index parse error at `{path}`: {message}")]
    VectorIndexParse { path: PathBuf, message: String },

    /// Vector index is incompatible with current configuration.
    #[error("Vector index incompatible: {reason}")]
    VectorIndexIncompatible { reason: String },

    /// Vector index backend is unavailable.
    #[error("Vector index backend `{backend}` is unavailable: {reason}")]
    VectorIndexBackendUnavailable { backend: String, reason: String },

    // -------------------------------------------------------------------------
    // Model Errors
    // -------------------------------------------------------------------------
    /// Embedding provider cannot be used.
    #[error("Embedding provider `{provider}` is unavailable: {reason}")]
    EmbeddingProviderUnavailable { provider: String, reason: String },

    /// An embedding call failed.
    #[error("Embedding failed for model `{model_id}`: {message}")]
    EmbeddingFailed { model_id: String, message: String },

    /// The generation collaborator could not produce text.
    #[error("Generation unavailable: {message}")]
    GenerationUnavailable { message: String },

    // -------------------------------------------------------------------------
    // Session Errors
    // -------------------------------------------------------------------------
    /// Session history could not be read or written.
    #[error("Session store error at `{path}`: {message}")]
    SessionStore { path: PathBuf, message: String },

    // -------------------------------------------------------------------------
    // Evaluation Errors
    // -------------------------------------------------------------------------
    /// The evaluation cases file does not exist.
    #[error("Evaluation cases file not found: {}", .0.display())]
    EvaluationCasesNotFound(PathBuf),

    /// The evaluation cases file is not a JSON array.
    #[error("Invalid evaluation input: {0}")]
    InvalidEvaluationInput(String),

    // -------------------------------------------------------------------------
    // General Errors
    // -------------------------------------------------------------------------
    /// A path or file was not found.
    #[error("Path not found: {0}")]
    PathNotFound(String),

    /// Invalid argument provided to an operation.
    #[error("{0}")]
    InvalidArgument(String),

    /// An I/O error occurred.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML serialization/deserialization error.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A wrapped generic error.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, DocQaError>;
