//! docqa engine: the facade the CLI talks to.
//!
//! [`DocQaEngine`] wires the collaborators named in [`AppConfig`] (vector
//! index, embedding model, generation strategy, session store) into an
//! [`AnswerPipeline`] and exposes ingest, ask, history, summarize and
//! evaluate.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use docqa_db::vector::{open_vector_index, VectorIndexBackend};
use docqa_model::{create_embedding_model, create_generation_model, EmbeddingModel, GenerationModel};
use tracing::{debug, info, warn};

use crate::chunking::RecursiveSplitter;
use crate::config::{AppConfig, SessionBackendKind};
use crate::db_adapter::IntoDocQaResult;
use crate::errors::DocQaError;
use crate::eval::{evaluate_file, EvaluationReport};
use crate::ingest::{ingest_documents, IngestReport, SourceDocument};
use crate::model_adapter::IntoDocQaModelResult;
use crate::pipeline::{AnswerPipeline, AskOptions, ChatResponse, PipelineSettings};
use crate::retriever::VectorRetriever;
use crate::session::{ChatTurn, InMemorySessionStore, JsonlSessionStore, SessionStore};
use crate::summarize::{summarize, SummaryResponse};

// ============================================================================
// DocQaEngine
// ============================================================================

/// The main entry point for docqa operations.
///
/// # Example
///
/// ```ignore
/// use docqa_core::{AppConfig, DocQaEngine};
///
/// let engine = DocQaEngine::from_config(AppConfig::load_default()?)?;
/// let response = engine.ask("What is the notice period?", "default", &Default::default());
/// println!("{}", response.answer);
/// ```
pub struct DocQaEngine {
    config: AppConfig,
    index: Arc<dyn VectorIndexBackend>,
    embedder: Arc<dyn EmbeddingModel>,
    generator: Arc<dyn GenerationModel>,
    splitter: RecursiveSplitter,
    pipeline: AnswerPipeline,
}

impl std::fmt::Debug for DocQaEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocQaEngine")
            .field("index_backend", &self.config.index.backend)
            .field("embedding_model", &self.embedder.model_id())
            .field("generation_model", &self.generator.model_id())
            .finish()
    }
}

impl DocQaEngine {
    // -------------------------------------------------------------------------
    // Construction
    // -------------------------------------------------------------------------

    /// Build an engine from `config`.
    ///
    /// # Errors
    ///
    /// Fails on invalid configuration, an unusable embedding provider, or a
    /// vector index that does not match the configured dimension or metric.
    pub fn from_config(config: AppConfig) -> Result<Self, DocQaError> {
        for warning in config.validate()? {
            warn!("config: {}", warning);
        }

        let embedder: Arc<dyn EmbeddingModel> =
            Arc::from(create_embedding_model(&config.embedding).into_docqa_result()?);
        if embedder.dimension() != config.embedding.dimension {
            return Err(DocQaError::InvalidConfiguration {
                message: format!(
                    "embedding model `{}` produces {} dimensions, config says {}",
                    embedder.model_id(),
                    embedder.dimension(),
                    config.embedding.dimension
                ),
                hint: "Set embedding.dimension to match the model".to_string(),
            });
        }

        let index = open_vector_index(&config.vector_index_config()).into_docqa_result()?;
        let generator: Arc<dyn GenerationModel> =
            Arc::from(create_generation_model(&config.generation));
        let sessions = Self::open_sessions(&config);

        Self::from_parts(config, index, embedder, generator, sessions)
    }

    /// Load configuration from `path` (or the default location) and build.
    pub fn with_config_path(path: Option<&Path>) -> Result<Self, DocQaError> {
        let config = match path {
            Some(path) => AppConfig::from_path(path)?,
            None => AppConfig::load_default()?,
        };
        Self::from_config(config)
    }

    /// Build from explicit collaborators.
    pub fn from_parts(
        config: AppConfig,
        index: Arc<dyn VectorIndexBackend>,
        embedder: Arc<dyn EmbeddingModel>,
        generator: Arc<dyn GenerationModel>,
        sessions: Arc<dyn SessionStore>,
    ) -> Result<Self, DocQaError> {
        let retriever = Arc::new(VectorRetriever::new(index.clone(), embedder.clone()));
        let pipeline = AnswerPipeline::new(
            retriever,
            generator.clone(),
            sessions,
            PipelineSettings::from(&config),
        );
        let splitter =
            RecursiveSplitter::new(config.chunking.chunk_size, config.chunking.chunk_overlap);

        debug!(
            "engine ready: index={} embedding={} generation={}",
            config.index.backend,
            embedder.model_id(),
            generator.model_id()
        );

        Ok(Self {
            config,
            index,
            embedder,
            generator,
            splitter,
            pipeline,
        })
    }

    fn open_sessions(config: &AppConfig) -> Arc<dyn SessionStore> {
        match config.session.backend {
            SessionBackendKind::Memory => Arc::new(InMemorySessionStore::new()),
            SessionBackendKind::Jsonl => Arc::new(JsonlSessionStore::new(config.session_dir())),
        }
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn pipeline(&self) -> &AnswerPipeline {
        &self.pipeline
    }

    pub fn generation_model_id(&self) -> &str {
        self.generator.model_id()
    }

    pub fn embedding_model_id(&self) -> &str {
        self.embedder.model_id()
    }

    /// Number of indexed chunks.
    pub fn indexed_chunks(&self) -> Result<usize, DocQaError> {
        self.index.len().into_docqa_result()
    }

    // -------------------------------------------------------------------------
    // Operations
    // -------------------------------------------------------------------------

    /// Index in-memory documents.
    pub fn ingest(&self, documents: &[SourceDocument]) -> Result<IngestReport, DocQaError> {
        let report = ingest_documents(
            self.index.as_ref(),
            self.embedder.as_ref(),
            &self.splitter,
            documents,
        )?;
        info!(
            "ingested {} chunks from {} sources",
            report.indexed_chunks,
            report.indexed_sources.len()
        );
        Ok(report)
    }

    /// Read UTF-8 text files and index them.
    pub fn ingest_paths(&self, paths: &[PathBuf]) -> Result<IngestReport, DocQaError> {
        let documents = paths
            .iter()
            .map(|p| SourceDocument::from_path(p))
            .collect::<Result<Vec<_>, _>>()?;
        self.ingest(&documents)
    }

    /// Answer a question. Never fails; refusals are reported on the response.
    pub fn ask(&self, question: &str, session_id: &str, options: &AskOptions) -> ChatResponse {
        self.pipeline.answer_with(question, session_id, options)
    }

    pub fn history(&self, session_id: &str) -> Result<Vec<ChatTurn>, DocQaError> {
        self.pipeline.history(session_id)
    }

    pub fn summarize(&self, source: Option<&str>) -> Result<SummaryResponse, DocQaError> {
        summarize(self.index.as_ref(), self.generator.as_ref(), source)
    }

    /// Score the case file at `path` against this engine's pipeline.
    pub fn evaluate(&self, path: &Path) -> Result<EvaluationReport, DocQaError> {
        evaluate_file(&self.pipeline, path)
    }
}
