//! # docqa-core
//!
//! **docqa** – grounded question answering over indexed documents.
//!
//! This crate holds the domain logic: the answer pipeline and its stages,
//! session history, ingestion, summarization and the evaluation scorer.
//! Storage and model providers live in `docqa-db` and `docqa-model`; this
//! crate only talks to them through their traits.
//!
//! ## Main Types
//!
//! - [`DocQaEngine`] – facade used by the CLI
//! - [`AnswerPipeline`] – safety gate → retrieval → relevance gate → dedupe →
//!   citations → generation → grounding check
//! - [`ChatResponse`] / [`AnswerOutcome`] – what a question yields
//! - [`DocQaError`] – domain error type
//!
//! ## Example
//!
//! ```ignore
//! use docqa_core::{AppConfig, AskOptions, DocQaEngine, SourceDocument};
//!
//! let engine = DocQaEngine::from_config(AppConfig::offline())?;
//! engine.ingest(&[SourceDocument::new("lease.txt", "The term is twelve months.")])?;
//!
//! let response = engine.ask("What is the term?", "default", &AskOptions::default());
//! for citation in &response.citations {
//!     println!("{} #{:?}", citation.source, citation.chunk_id);
//! }
//! ```

// Modules
pub mod chunking;
pub mod citation;
pub mod config;
pub mod db_adapter;
pub mod dedupe;
pub mod engine;
pub mod errors;
pub mod eval;
pub mod grounding;
pub mod guardrail;
pub mod ingest;
pub mod model_adapter;
pub mod pipeline;
pub mod prompt;
pub mod relevance;
pub mod retriever;
pub mod session;
pub mod source;
pub mod summarize;
pub mod tokenize;

// Re-exports for convenience
pub use chunking::RecursiveSplitter;
pub use citation::{assemble, Assembly, Citation, MAX_CITATIONS};
pub use config::{
    AppConfig, ChunkingConfig, GuardrailConfig, IndexConfig, RetrievalConfig, SessionBackendKind,
    SessionConfig, CONFIG_ENV,
};
pub use dedupe::dedupe;
pub use engine::DocQaEngine;
pub use errors::{DocQaError, Result};
pub use eval::{
    evaluate_file, load_cases, score, EvaluationCase, EvaluationReport, MetricSet,
    QuestionAnswerer, DEFAULT_CASES_PATH,
};
pub use grounding::{annotate_low_grounding, grounding_ratio, LOW_GROUNDING_NOTE};
pub use guardrail::{check_query, SafetyVerdict};
pub use ingest::{chunk_document, ingest_documents, ChunkRecord, IngestReport, SourceDocument};
pub use pipeline::{
    AnswerOutcome, AnswerPipeline, AskOptions, ChatResponse, PipelineSettings,
};
pub use relevance::{gate, RelevanceGate};
pub use retriever::{to_relevance, PassageRetriever, RetrievedPassage, VectorRetriever};
pub use session::{ChatRole, ChatTurn, InMemorySessionStore, JsonlSessionStore, SessionStore};
pub use source::{normalize_source, source_key};
pub use summarize::{summarize, SummaryResponse};
