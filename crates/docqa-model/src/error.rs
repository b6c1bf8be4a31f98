//! Error types for docqa-model.
//!
//! Provider errors carry the model id so a failing call can be traced back
//! to the configuration that selected it.

use thiserror::Error;

/// Result type alias for docqa-model operations.
pub type ModelResult<T> = Result<T, ModelError>;

/// Errors that can occur in docqa-model operations.
#[derive(Debug, Error)]
pub enum ModelError {
    // ========================================================================
    // Provider errors
    // ========================================================================
    /// Provider not available (compiled out or missing credentials).
    #[error("Provider '{provider}' not available: {reason}")]
    ProviderNotAvailable { provider: String, reason: String },

    /// Model configuration invalid.
    #[error("Invalid model configuration: {message}")]
    InvalidConfig { message: String },

    // ========================================================================
    // Inference errors
    // ========================================================================
    /// Embedding generation failed.
    #[error("Embedding failed for model '{model_id}': {message}")]
    EmbeddingFailed { model_id: String, message: String },

    /// A single completion call failed.
    #[error("Generation failed for model '{model_id}': {message}")]
    GenerationFailed { model_id: String, message: String },

    /// Every attempt of a retried completion failed.
    #[error("Generation unavailable after {attempts} attempt(s): {message}")]
    GenerationUnavailable { attempts: u32, message: String },

    // ========================================================================
    // I/O errors
    // ========================================================================
    /// JSON encoding or decoding error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

// ============================================================================
// Error constructors
// ============================================================================

impl ModelError {
    /// Create a provider-not-available error.
    pub fn provider_not_available(provider: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ProviderNotAvailable {
            provider: provider.into(),
            reason: reason.into(),
        }
    }

    /// Create an embedding failed error.
    pub fn embedding_failed(model_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::EmbeddingFailed {
            model_id: model_id.into(),
            message: message.into(),
        }
    }

    /// Create a generation failed error.
    pub fn generation_failed(model_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::GenerationFailed {
            model_id: model_id.into(),
            message: message.into(),
        }
    }

    /// Whether retrying the same call could succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ModelError::GenerationFailed { .. } | ModelError::EmbeddingFailed { .. }
        )
    }
}
