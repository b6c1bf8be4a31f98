//! OpenAI providers: `/v1/embeddings` and `/v1/chat/completions`.

use crate::config::{EmbeddingConfig, GenerationConfig};
use crate::error::{ModelError, ModelResult};
use crate::http::{build_client, decode_json, endpoint};
use crate::{EmbeddingModel, Generation, GenerationModel};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

const PROVIDER: &str = "openai";

fn require_key(key: Option<String>) -> ModelResult<String> {
    key.ok_or_else(|| {
        ModelError::provider_not_available(
            PROVIDER,
            "no API key configured (set apiKey or OPENAI_API_KEY)",
        )
    })
}

// ============================================================================
// Embeddings
// ============================================================================

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [&'a str],
    dimensions: usize,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingDatum>,
}

#[derive(Deserialize)]
struct EmbeddingDatum {
    index: usize,
    embedding: Vec<f32>,
}

/// Embeddings via the OpenAI API.
#[derive(Debug)]
pub struct OpenAiEmbeddingModel {
    client: Client,
    url: String,
    api_key: String,
    model: String,
    dimension: usize,
}

impl OpenAiEmbeddingModel {
    pub fn new(config: &EmbeddingConfig) -> ModelResult<Self> {
        Ok(Self {
            client: build_client(PROVIDER, config.timeout_secs)?,
            url: endpoint(&config.openai_url, "v1/embeddings"),
            api_key: require_key(config.resolved_api_key())?,
            model: config.model.clone(),
            dimension: config.dimension,
        })
    }
}

impl EmbeddingModel for OpenAiEmbeddingModel {
    fn embed(&self, texts: &[&str]) -> ModelResult<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        debug!("openai: embedding {} texts with {}", texts.len(), self.model);

        let request = EmbeddingRequest {
            model: &self.model,
            input: texts,
            dimensions: self.dimension,
        };

        let response = self
            .client
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .map_err(|e| ModelError::embedding_failed(&self.model, e.to_string()))?;

        let mut body: EmbeddingResponse =
            decode_json(response).map_err(|m| ModelError::embedding_failed(&self.model, m))?;
        body.data.sort_by_key(|d| d.index);

        if body.data.len() != texts.len() {
            return Err(ModelError::embedding_failed(
                &self.model,
                format!("expected {} embeddings, got {}", texts.len(), body.data.len()),
            ));
        }
        if let Some(bad) = body.data.iter().find(|d| d.embedding.len() != self.dimension) {
            return Err(ModelError::embedding_failed(
                &self.model,
                format!(
                    "expected dimension {}, got {}",
                    self.dimension,
                    bad.embedding.len()
                ),
            ));
        }

        Ok(body.data.into_iter().map(|d| d.embedding).collect())
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_id(&self) -> &str {
        &self.model
    }
}

// ============================================================================
// Chat completions
// ============================================================================

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
    temperature: f32,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Completions via the OpenAI chat API.
#[derive(Debug)]
pub struct OpenAiGenerationModel {
    client: Client,
    url: String,
    api_key: String,
    model: String,
    temperature: f32,
}

impl OpenAiGenerationModel {
    pub fn new(config: &GenerationConfig) -> ModelResult<Self> {
        Ok(Self {
            client: build_client(PROVIDER, config.timeout_secs)?,
            url: endpoint(&config.openai_url, "v1/chat/completions"),
            api_key: require_key(config.resolved_api_key())?,
            model: config.openai_model.clone(),
            temperature: config.temperature,
        })
    }
}

impl GenerationModel for OpenAiGenerationModel {
    fn complete(&self, prompt: &str) -> ModelResult<Generation> {
        debug!("openai: completing prompt ({} chars)", prompt.len());

        let request = ChatRequest {
            model: &self.model,
            messages: [ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: self.temperature,
        };

        let response = self
            .client
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .map_err(|e| ModelError::generation_failed(&self.model, e.to_string()))?;

        let body: ChatResponse =
            decode_json(response).map_err(|m| ModelError::generation_failed(&self.model, m))?;

        let text = body
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(ModelError::generation_failed(
                &self.model,
                "completion was empty",
            ));
        }

        Ok(Generation::new(text, &self.model))
    }

    fn model_id(&self) -> &str {
        &self.model
    }
}
