//! Application configuration.
//!
//! docqa reads one YAML file (camelCase keys). Every section is optional and
//! falls back to the defaults below, so an empty or missing file is valid.
//!
//! ```yaml
//! generation:
//!   provider: ollama
//!   ollamaModel: llama3.2
//! embedding:
//!   provider: hashed
//!   dimension: 384
//! index:
//!   backend: jsonl
//!   dir: /var/lib/docqa/index
//! retrieval:
//!   topK: 4
//!   minRelevance: 0.2
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use docqa_db::vector::{VectorIndexConfig, VectorMetric};
use docqa_model::{EmbeddingConfig, EmbeddingProviderKind, GenerationConfig, GenerationProviderKind};
use serde::{Deserialize, Serialize};

use crate::errors::DocQaError;

/// Environment variable naming the config file.
pub const CONFIG_ENV: &str = "DOCQA_CONFIG";

// ============================================================================
// AppConfig
// ============================================================================

/// Top-level docqa configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
    #[serde(default)]
    pub generation: GenerationConfig,

    #[serde(default)]
    pub embedding: EmbeddingConfig,

    #[serde(default)]
    pub index: IndexConfig,

    #[serde(default)]
    pub chunking: ChunkingConfig,

    #[serde(default)]
    pub retrieval: RetrievalConfig,

    #[serde(default)]
    pub guardrail: GuardrailConfig,

    #[serde(default)]
    pub session: SessionConfig,
}

impl AppConfig {
    /// Load from `$DOCQA_CONFIG` if set, else `~/.docqa/config.yaml`.
    ///
    /// Falls back to defaults when no home directory can be determined.
    pub fn load_default() -> Result<Self, DocQaError> {
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            return Self::from_path(Path::new(&path));
        }
        match Self::default_path() {
            Some(path) => Self::from_path(&path),
            None => {
                tracing::debug!("Could not determine home directory, using default config");
                Ok(Self::default())
            }
        }
    }

    /// Load the configuration from a specific path.
    ///
    /// If the file does not exist, returns a default configuration.
    ///
    /// # Errors
    ///
    /// Returns [`DocQaError::InvalidConfig`] if the file exists but cannot be parsed.
    /// Returns [`DocQaError::InvalidConfiguration`] if validation fails.
    pub fn from_path(path: &Path) -> Result<Self, DocQaError> {
        if !path.exists() {
            tracing::debug!("Config not found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|e| {
            DocQaError::InvalidConfig(format!("Failed to read {}: {}", path.display(), e))
        })?;

        let config = Self::from_yaml(&content).map_err(|e| match e {
            DocQaError::Yaml(err) => {
                DocQaError::InvalidConfig(format!("Failed to parse {}: {}", path.display(), err))
            }
            other => other,
        })?;

        tracing::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Parse and validate a YAML document. Warnings are logged.
    pub fn from_yaml(content: &str) -> Result<Self, DocQaError> {
        // An empty document deserializes to unit, not to an empty mapping.
        let config: Self = if content.trim().is_empty() {
            Self::default()
        } else {
            serde_yaml::from_str(content)?
        };

        for warning in config.validate()? {
            tracing::warn!("Config warning: {}", warning);
        }

        Ok(config)
    }

    /// Get the default config directory (`~/.docqa`).
    pub fn default_dir() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".docqa"))
    }

    /// Get the default config file path (`~/.docqa/config.yaml`).
    pub fn default_path() -> Option<PathBuf> {
        Self::default_dir().map(|d| d.join("config.yaml"))
    }

    /// Offline configuration: hashed embeddings, fallback generation,
    /// in-memory index and sessions. Touches no filesystem or network.
    pub fn offline() -> Self {
        Self {
            generation: GenerationConfig::fallback(),
            embedding: EmbeddingConfig::hashed(docqa_model::DEFAULT_DIMENSION),
            index: IndexConfig {
                backend: "memory".to_string(),
                ..IndexConfig::default()
            },
            session: SessionConfig {
                backend: SessionBackendKind::Memory,
                dir: None,
            },
            ..Self::default()
        }
    }

    /// Resolved vector index directory.
    pub fn index_dir(&self) -> PathBuf {
        self.index
            .dir
            .clone()
            .or_else(|| Self::default_dir().map(|d| d.join("index")))
            .unwrap_or_else(|| PathBuf::from(".docqa").join("index"))
    }

    /// Resolved session history directory (used by the `jsonl` session backend).
    pub fn session_dir(&self) -> PathBuf {
        self.session
            .dir
            .clone()
            .or_else(|| Self::default_dir().map(|d| d.join("sessions")))
            .unwrap_or_else(|| PathBuf::from(".docqa").join("sessions"))
    }

    /// Vector index settings derived from the embedding and index sections.
    pub fn vector_index_config(&self) -> VectorIndexConfig {
        VectorIndexConfig::new(self.embedding.dimension, self.index_dir())
            .with_backend(self.index.backend.clone())
            .with_metric(self.index.metric)
    }

    /// Validate the whole configuration.
    ///
    /// Returns non-fatal warnings, or an error for values that would break
    /// retrieval or chunking.
    pub fn validate(&self) -> Result<Vec<String>, DocQaError> {
        let mut warnings = Vec::new();
        warnings.extend(self.chunking.validate()?);
        warnings.extend(self.retrieval.validate()?);
        warnings.extend(self.guardrail.validate()?);

        if self.embedding.dimension == 0 {
            return Err(DocQaError::InvalidConfiguration {
                message: "embedding.dimension must be greater than 0".to_string(),
                hint: "Set embedding.dimension to the size of your embedding model's vectors"
                    .to_string(),
            });
        }

        if self.index.metric == VectorMetric::L2 {
            warnings.push(format!(
                "index.metric is l2: distances are converted with 1/(1+d), so \
                 retrieval.minRelevance={} is not on the same scale as cosine similarity",
                self.retrieval.min_relevance
            ));
        }

        let needs_openai_key = self.generation.provider == GenerationProviderKind::OpenAi
            && self.generation.resolved_api_key().is_none();
        if needs_openai_key {
            warnings.push(
                "generation.provider is openai but no API key is set; answers will use the fallback generator"
                    .to_string(),
            );
        }

        if self.embedding.provider == EmbeddingProviderKind::OpenAi
            && self.embedding.resolved_api_key().is_none()
        {
            warnings.push(
                "embedding.provider is openai but no API key is set; embedding calls will fail"
                    .to_string(),
            );
        }

        Ok(warnings)
    }
}

// ============================================================================
// IndexConfig
// ============================================================================

/// Vector index section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexConfig {
    /// `jsonl` or `memory`.
    #[serde(default = "default_index_backend")]
    pub backend: String,

    /// Index directory. Defaults to `~/.docqa/index`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,

    #[serde(default)]
    pub metric: VectorMetric,
}

fn default_index_backend() -> String {
    docqa_db::vector::DEFAULT_BACKEND.to_string()
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            backend: default_index_backend(),
            dir: None,
            metric: VectorMetric::default(),
        }
    }
}

// ============================================================================
// ChunkingConfig
// ============================================================================

/// Ingestion chunking section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkingConfig {
    /// Target chunk size in characters.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Characters shared between consecutive chunks.
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,
}

fn default_chunk_size() -> usize {
    900
}

fn default_chunk_overlap() -> usize {
    120
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
        }
    }
}

impl ChunkingConfig {
    pub fn validate(&self) -> Result<Vec<String>, DocQaError> {
        if self.chunk_size == 0 {
            return Err(DocQaError::InvalidConfiguration {
                message: "chunking.chunkSize must be greater than 0".to_string(),
                hint: "Set chunking.chunkSize to a positive number of characters (e.g., 900)"
                    .to_string(),
            });
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(DocQaError::InvalidConfiguration {
                message: format!(
                    "chunking.chunkOverlap ({}) must be smaller than chunking.chunkSize ({})",
                    self.chunk_overlap, self.chunk_size
                ),
                hint: "Lower chunkOverlap or raise chunkSize".to_string(),
            });
        }
        Ok(Vec::new())
    }
}

// ============================================================================
// RetrievalConfig
// ============================================================================

/// Retrieval and answer-shaping section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetrievalConfig {
    /// Passages retrieved per question.
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Best retrieved relevance must reach this to answer.
    #[serde(default = "default_min_relevance")]
    pub min_relevance: f32,

    /// Citations returned per answer.
    #[serde(default = "default_max_citations")]
    pub max_citations: usize,

    /// Grounding ratio under which the low-confidence note is appended.
    #[serde(default = "default_low_grounding_threshold")]
    pub low_grounding_threshold: f32,
}

fn default_top_k() -> usize {
    4
}

fn default_min_relevance() -> f32 {
    0.2
}

fn default_max_citations() -> usize {
    10
}

fn default_low_grounding_threshold() -> f32 {
    0.2
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            min_relevance: default_min_relevance(),
            max_citations: default_max_citations(),
            low_grounding_threshold: default_low_grounding_threshold(),
        }
    }
}

impl RetrievalConfig {
    pub fn validate(&self) -> Result<Vec<String>, DocQaError> {
        let mut warnings = Vec::new();

        if self.top_k == 0 {
            return Err(DocQaError::InvalidConfiguration {
                message: "retrieval.topK must be at least 1".to_string(),
                hint: "Set retrieval.topK to a positive integer (e.g., 4)".to_string(),
            });
        }

        if !(0.0..=1.0).contains(&self.min_relevance) {
            return Err(DocQaError::InvalidConfiguration {
                message: format!(
                    "retrieval.minRelevance must be within [0, 1], got {}",
                    self.min_relevance
                ),
                hint: "Relevance scores are normalized to [0, 1]".to_string(),
            });
        }

        if !(0.0..=1.0).contains(&self.low_grounding_threshold) {
            return Err(DocQaError::InvalidConfiguration {
                message: format!(
                    "retrieval.lowGroundingThreshold must be within [0, 1], got {}",
                    self.low_grounding_threshold
                ),
                hint: "The grounding ratio is a fraction of answer tokens".to_string(),
            });
        }

        if self.max_citations == 0 {
            warnings.push("retrieval.maxCitations is 0; answers will carry no citations".to_string());
        }

        if self.top_k > 50 {
            warnings.push(format!(
                "retrieval.topK={} is large; prompts may exceed the model context",
                self.top_k
            ));
        }

        Ok(warnings)
    }
}

// ============================================================================
// GuardrailConfig
// ============================================================================

/// Query safety section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuardrailConfig {
    /// Longest accepted question, in characters.
    #[serde(default = "default_max_query_chars")]
    pub max_query_chars: usize,
}

fn default_max_query_chars() -> usize {
    2000
}

impl Default for GuardrailConfig {
    fn default() -> Self {
        Self {
            max_query_chars: default_max_query_chars(),
        }
    }
}

impl GuardrailConfig {
    pub fn validate(&self) -> Result<Vec<String>, DocQaError> {
        if self.max_query_chars == 0 {
            return Err(DocQaError::InvalidConfiguration {
                message: "guardrail.maxQueryChars must be greater than 0".to_string(),
                hint: "Set guardrail.maxQueryChars (default 2000)".to_string(),
            });
        }
        Ok(Vec::new())
    }
}

// ============================================================================
// SessionConfig
// ============================================================================

/// Session history backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionBackendKind {
    /// Process-local, lost on exit.
    Memory,
    /// One JSONL file per session.
    #[default]
    Jsonl,
}

/// Session history section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionConfig {
    #[serde(default)]
    pub backend: SessionBackendKind,

    /// Directory for the `jsonl` backend. Defaults to `~/.docqa/sessions`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
}

// ============================================================================
// Tests
// ============================================================================
