//! # docqa-model
//!
//! Inference layer for docqa - embeddings and answer generation.
//!
//! This crate owns every call that turns text into vectors or prompts into
//! answers. It provides:
//!
//! - **Embedding models**: OpenAI, Ollama, and an offline hashed embedder
//! - **Generation models**: OpenAI chat, Ollama generate, and a deterministic fallback
//! - **Strategy resolution**: the provider is picked once, with a logged fallback
//! - **Retries**: bounded retry/backoff around remote completions
//!
//! ## Features
//!
//! - `openai` (default): OpenAI HTTP providers
//! - `ollama` (default): Ollama HTTP providers
//!
//! ## Usage
//!
//! ```ignore
//! use docqa_model::{create_generation_model, GenerationConfig};
//!
//! let model = create_generation_model(&GenerationConfig::default());
//! let answer = model.complete("Question: ...")?;
//! println!("{}", answer.text());
//! ```

pub mod config;
pub mod error;
pub mod generation;
pub mod hashed;

#[cfg(any(feature = "openai", feature = "ollama"))]
mod http;

#[cfg(feature = "ollama")]
pub mod ollama;

#[cfg(feature = "openai")]
pub mod openai;

use serde::{Deserialize, Serialize};
use std::time::Duration;

pub use config::{
    EmbeddingConfig, EmbeddingProviderKind, GenerationConfig, GenerationProviderKind,
    DEFAULT_DIMENSION, OPENAI_API_KEY_ENV,
};
pub use error::{ModelError, ModelResult};
pub use generation::{fallback_excerpt, FallbackGenerator, GenerationStrategy, RetryingGenerator};
pub use hashed::HashedEmbeddingModel;

// ============================================================================
// Embedding Model Trait
// ============================================================================

/// Trait for embedding models.
///
/// Implementations must be `Send + Sync` to allow use across threads.
pub trait EmbeddingModel: Send + Sync + std::fmt::Debug {
    /// Generate embeddings for a batch of texts, one vector per input.
    fn embed(&self, texts: &[&str]) -> ModelResult<Vec<Vec<f32>>>;

    /// Embed a single text.
    fn embed_one(&self, text: &str) -> ModelResult<Vec<f32>> {
        self.embed(&[text])?
            .into_iter()
            .next()
            .ok_or_else(|| ModelError::embedding_failed(self.model_id(), "no embedding returned"))
    }

    /// Get the embedding dimension.
    fn dimension(&self) -> usize;

    /// Get the model ID.
    fn model_id(&self) -> &str;
}

// ============================================================================
// Generation
// ============================================================================

/// Output of a completion call.
///
/// Every provider adapts its response into this type, so consumers only ever
/// read [`Generation::text`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Generation {
    text: String,
    model_id: String,
}

impl Generation {
    pub fn new(text: impl Into<String>, model_id: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            model_id: model_id.into(),
        }
    }

    /// The generated text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The model that produced it.
    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    pub fn into_text(self) -> String {
        self.text
    }
}

/// Trait for text generation collaborators.
pub trait GenerationModel: Send + Sync + std::fmt::Debug {
    /// Complete a prompt. May fail; callers decide how to recover.
    fn complete(&self, prompt: &str) -> ModelResult<Generation>;

    /// Complete a prompt built from `evidence`, the numbered context blocks.
    ///
    /// Language models only need the prompt. Generators that cannot read
    /// prompts work from the evidence instead of parsing it back out.
    fn complete_grounded(&self, prompt: &str, _evidence: &[String]) -> ModelResult<Generation> {
        self.complete(prompt)
    }

    /// Get the model ID.
    fn model_id(&self) -> &str;
}

// ============================================================================
// Factory Functions
// ============================================================================

/// Create an embedding model from configuration.
///
/// # Errors
///
/// Returns `ModelError::ProviderNotAvailable` if the provider is compiled
/// out or lacks credentials.
pub fn create_embedding_model(config: &EmbeddingConfig) -> ModelResult<Box<dyn EmbeddingModel>> {
    if config.dimension == 0 {
        return Err(ModelError::InvalidConfig {
            message: "embedding dimension must be greater than zero".to_string(),
        });
    }

    match config.provider {
        EmbeddingProviderKind::Hashed => Ok(Box::new(HashedEmbeddingModel::new(config.dimension))),

        #[cfg(feature = "openai")]
        EmbeddingProviderKind::OpenAi => Ok(Box::new(openai::OpenAiEmbeddingModel::new(config)?)),

        #[cfg(feature = "ollama")]
        EmbeddingProviderKind::Ollama => Ok(Box::new(ollama::OllamaEmbeddingModel::new(config)?)),

        #[allow(unreachable_patterns)]
        other => Err(ModelError::provider_not_available(
            other.to_string(),
            "feature not enabled in this build",
        )),
    }
}

/// Create the generation model for a configuration.
///
/// Never fails: an unusable provider resolves to the fallback generator
/// (see [`GenerationStrategy::resolve`]). Remote providers are wrapped in a
/// [`RetryingGenerator`].
pub fn create_generation_model(config: &GenerationConfig) -> Box<dyn GenerationModel> {
    let strategy = GenerationStrategy::resolve(config);
    if strategy.is_fallback() {
        return Box::new(strategy);
    }
    Box::new(RetryingGenerator::new(
        strategy,
        config.max_retries,
        Duration::from_millis(config.retry_backoff_ms),
    ))
}
