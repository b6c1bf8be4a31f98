//! Ollama providers: `/api/embeddings` and `/api/generate`.

use crate::config::{EmbeddingConfig, GenerationConfig};
use crate::error::{ModelError, ModelResult};
use crate::http::{build_client, decode_json, endpoint};
use crate::{EmbeddingModel, Generation, GenerationModel};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

const PROVIDER: &str = "ollama";

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    embedding: Vec<f32>,
}

/// Embeddings from a local Ollama server, one request per text.
#[derive(Debug)]
pub struct OllamaEmbeddingModel {
    client: Client,
    url: String,
    model: String,
    dimension: usize,
}

impl OllamaEmbeddingModel {
    pub fn new(config: &EmbeddingConfig) -> ModelResult<Self> {
        Ok(Self {
            client: build_client(PROVIDER, config.timeout_secs)?,
            url: endpoint(&config.ollama_url, "api/embeddings"),
            model: config.model.clone(),
            dimension: config.dimension,
        })
    }
}

impl EmbeddingModel for OllamaEmbeddingModel {
    fn embed(&self, texts: &[&str]) -> ModelResult<Vec<Vec<f32>>> {
        debug!("ollama: embedding {} texts with {}", texts.len(), self.model);

        texts
            .iter()
            .map(|text| {
                let response = self
                    .client
                    .post(&self.url)
                    .json(&EmbeddingRequest {
                        model: &self.model,
                        prompt: text,
                    })
                    .send()
                    .map_err(|e| ModelError::embedding_failed(&self.model, e.to_string()))?;

                let body: EmbeddingResponse = decode_json(response)
                    .map_err(|m| ModelError::embedding_failed(&self.model, m))?;

                if body.embedding.len() != self.dimension {
                    return Err(ModelError::embedding_failed(
                        &self.model,
                        format!(
                            "expected dimension {}, got {}",
                            self.dimension,
                            body.embedding.len()
                        ),
                    ));
                }
                Ok(body.embedding)
            })
            .collect()
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_id(&self) -> &str {
        &self.model
    }
}

#[derive(Serialize)]
struct GenerateOptions {
    temperature: f32,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

/// Completions from a local Ollama server.
#[derive(Debug)]
pub struct OllamaGenerationModel {
    client: Client,
    url: String,
    model: String,
    temperature: f32,
}

impl OllamaGenerationModel {
    pub fn new(config: &GenerationConfig) -> ModelResult<Self> {
        Ok(Self {
            client: build_client(PROVIDER, config.timeout_secs)?,
            url: endpoint(&config.ollama_url, "api/generate"),
            model: config.ollama_model.clone(),
            temperature: config.temperature,
        })
    }
}

impl GenerationModel for OllamaGenerationModel {
    fn complete(&self, prompt: &str) -> ModelResult<Generation> {
        let request = GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
            options: GenerateOptions {
                temperature: self.temperature,
            },
        };

        let response = self
            .client
            .post(&self.url)
            .json(&request)
            .send()
            .map_err(|e| ModelError::generation_failed(&self.model, e.to_string()))?;

        let body: GenerateResponse =
            decode_json(response).map_err(|m| ModelError::generation_failed(&self.model, m))?;

        if body.response.trim().is_empty() {
            return Err(ModelError::generation_failed(&self.model, "response was empty"));
        }

        Ok(Generation::new(body.response, &self.model))
    }

    fn model_id(&self) -> &str {
        &self.model
    }
}
