//! Configuration types for docqa-model.
//!
//! These are the canonical embedding and generation settings. docqa-core
//! nests them in its application config instead of redefining them.

use serde::{Deserialize, Serialize};

pub const DEFAULT_OPENAI_EMBEDDING_MODEL: &str = "text-embedding-3-small";
pub const DEFAULT_OPENAI_CHAT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_OLLAMA_MODEL: &str = "llama3.2";
pub const DEFAULT_OLLAMA_URL: &str = "http://127.0.0.1:11434";
pub const DEFAULT_OPENAI_URL: &str = "https://api.openai.com";
pub const DEFAULT_DIMENSION: usize = 384;

/// Environment variable consulted when no API key is configured.
pub const OPENAI_API_KEY_ENV: &str = "OPENAI_API_KEY";

// ============================================================================
// EmbeddingProviderKind
// ============================================================================

/// Embedding provider type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProviderKind {
    /// OpenAI `/v1/embeddings`.
    OpenAi,
    /// Ollama `/api/embeddings`.
    Ollama,
    /// Deterministic feature hashing, no network.
    #[default]
    Hashed,
}

impl std::fmt::Display for EmbeddingProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OpenAi => write!(f, "openai"),
            Self::Ollama => write!(f, "ollama"),
            Self::Hashed => write!(f, "hashed"),
        }
    }
}

impl std::str::FromStr for EmbeddingProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(Self::OpenAi),
            "ollama" => Ok(Self::Ollama),
            "hashed" | "local" | "offline" => Ok(Self::Hashed),
            _ => Err(format!(
                "Unknown embedding provider: '{}'. Use 'openai', 'ollama', or 'hashed'.",
                s
            )),
        }
    }
}

// ============================================================================
// EmbeddingConfig
// ============================================================================

/// Configuration for the embedding model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmbeddingConfig {
    #[serde(default)]
    pub provider: EmbeddingProviderKind,

    /// Model name passed to remote providers.
    #[serde(default = "default_embedding_model")]
    pub model: String,

    /// Vector dimension. Remote providers must return vectors of this size.
    #[serde(default = "default_dimension")]
    pub dimension: usize,

    #[serde(default = "default_openai_url")]
    pub openai_url: String,

    #[serde(default = "default_ollama_url")]
    pub ollama_url: String,

    /// API key for OpenAI. Falls back to `OPENAI_API_KEY`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_embedding_model() -> String {
    DEFAULT_OPENAI_EMBEDDING_MODEL.to_string()
}

fn default_dimension() -> usize {
    DEFAULT_DIMENSION
}

fn default_openai_url() -> String {
    DEFAULT_OPENAI_URL.to_string()
}

fn default_ollama_url() -> String {
    DEFAULT_OLLAMA_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    60
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: EmbeddingProviderKind::default(),
            model: default_embedding_model(),
            dimension: DEFAULT_DIMENSION,
            openai_url: default_openai_url(),
            ollama_url: default_ollama_url(),
            api_key: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl EmbeddingConfig {
    /// Offline hashed embedder with the given dimension.
    pub fn hashed(dimension: usize) -> Self {
        Self {
            provider: EmbeddingProviderKind::Hashed,
            dimension,
            ..Self::default()
        }
    }

    /// Configured key, else the `OPENAI_API_KEY` environment variable.
    pub fn resolved_api_key(&self) -> Option<String> {
        resolve_api_key(self.api_key.as_deref())
    }
}

// ============================================================================
// GenerationProviderKind
// ============================================================================

/// Generation provider type requested by configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationProviderKind {
    #[default]
    OpenAi,
    Ollama,
    Fallback,
}

impl std::fmt::Display for GenerationProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OpenAi => write!(f, "openai"),
            Self::Ollama => write!(f, "ollama"),
            Self::Fallback => write!(f, "fallback"),
        }
    }
}

impl std::str::FromStr for GenerationProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(Self::OpenAi),
            "ollama" | "local" => Ok(Self::Ollama),
            "fallback" | "none" => Ok(Self::Fallback),
            _ => Err(format!(
                "Unknown generation provider: '{}'. Use 'openai', 'ollama', or 'fallback'.",
                s
            )),
        }
    }
}

// ============================================================================
// GenerationConfig
// ============================================================================

/// Configuration for the generation collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    #[serde(default)]
    pub provider: GenerationProviderKind,

    #[serde(default = "default_openai_chat_model")]
    pub openai_model: String,

    #[serde(default = "default_openai_url")]
    pub openai_url: String,

    #[serde(default = "default_ollama_model")]
    pub ollama_model: String,

    #[serde(default = "default_ollama_url")]
    pub ollama_url: String,

    /// API key for OpenAI. Falls back to `OPENAI_API_KEY`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Per-request timeout.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Extra attempts after the first failure.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Pause between attempts, doubled after each failure.
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    #[serde(default)]
    pub temperature: f32,
}

fn default_openai_chat_model() -> String {
    DEFAULT_OPENAI_CHAT_MODEL.to_string()
}

fn default_ollama_model() -> String {
    DEFAULT_OLLAMA_MODEL.to_string()
}

fn default_max_retries() -> u32 {
    2
}

fn default_retry_backoff_ms() -> u64 {
    250
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            provider: GenerationProviderKind::default(),
            openai_model: default_openai_chat_model(),
            openai_url: default_openai_url(),
            ollama_model: default_ollama_model(),
            ollama_url: default_ollama_url(),
            api_key: None,
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
            retry_backoff_ms: default_retry_backoff_ms(),
            temperature: 0.0,
        }
    }
}

impl GenerationConfig {
    /// Deterministic fallback generation, no network.
    pub fn fallback() -> Self {
        Self {
            provider: GenerationProviderKind::Fallback,
            ..Self::default()
        }
    }

    /// Configured key, else the `OPENAI_API_KEY` environment variable.
    pub fn resolved_api_key(&self) -> Option<String> {
        resolve_api_key(self.api_key.as_deref())
    }
}

fn resolve_api_key(configured: Option<&str>) -> Option<String> {
    configured
        .filter(|k| !k.trim().is_empty())
        .map(str::to_string)
        .or_else(|| std::env::var(OPENAI_API_KEY_ENV).ok())
        .filter(|k| !k.trim().is_empty())
}

// ============================================================================
// Tests
// ============================================================================
