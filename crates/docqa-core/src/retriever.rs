//! Retriever adapter.
//!
//! Wraps the vector index search so that every caller sees passages with a
//! relevance in `[0, 1]`, higher meaning more relevant, whatever metric the
//! index was built with.

use std::sync::Arc;

use docqa_db::vector::{ScoreKind, VectorIndexBackend, VectorSearchResult};
use docqa_model::EmbeddingModel;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::db_adapter::IntoDocQaResult;
use crate::errors::DocQaError;
use crate::model_adapter::IntoDocQaModelResult;
use crate::source::normalize_source;

// ============================================================================
// RetrievedPassage
// ============================================================================

/// A passage returned for one question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetrievedPassage {
    pub text: String,
    /// Human-facing source name (storage prefix removed).
    pub source: String,
    /// 1-based chunk position, when known.
    pub chunk_index: Option<u32>,
    /// Relevance in `[0, 1]`, higher is better.
    pub relevance: f64,
}

impl RetrievedPassage {
    pub fn new(
        text: impl Into<String>,
        source: impl AsRef<str>,
        chunk_index: Option<u32>,
        relevance: f64,
    ) -> Self {
        Self {
            text: text.into(),
            source: normalize_source(source.as_ref()),
            // 0 is how an unknown chunk position is encoded upstream
            chunk_index: chunk_index.filter(|c| *c > 0),
            relevance,
        }
    }
}

// ============================================================================
// Relevance conversion
// ============================================================================

/// Map a raw backend score onto `[0, 1]`, higher is better.
///
/// Similarities are clamped; distances go through `1 / (1 + d)`. Non-finite
/// scores become 0.
pub fn to_relevance(score: f32, kind: ScoreKind) -> f64 {
    let score = score as f64;
    if !score.is_finite() {
        return 0.0;
    }
    match kind {
        ScoreKind::Similarity => score.clamp(0.0, 1.0),
        ScoreKind::Distance => 1.0 / (1.0 + score.max(0.0)),
    }
}

// ============================================================================
// PassageRetriever
// ============================================================================

/// Search seam used by the answer pipeline.
pub trait PassageRetriever: Send + Sync {
    /// Up to `k` passages for `query`, most relevant first. Empty when
    /// nothing is indexed.
    fn search(&self, query: &str, k: usize) -> Result<Vec<RetrievedPassage>, DocQaError>;
}

/// [`PassageRetriever`] over an embedding model and a vector index.
pub struct VectorRetriever {
    index: Arc<dyn VectorIndexBackend>,
    embedder: Arc<dyn EmbeddingModel>,
}

impl VectorRetriever {
    pub fn new(index: Arc<dyn VectorIndexBackend>, embedder: Arc<dyn EmbeddingModel>) -> Self {
        Self { index, embedder }
    }

    fn to_passage(result: VectorSearchResult, kind: ScoreKind) -> RetrievedPassage {
        RetrievedPassage::new(
            result.text,
            &result.source,
            result.chunk_index,
            to_relevance(result.score, kind),
        )
    }
}

impl PassageRetriever for VectorRetriever {
    fn search(&self, query: &str, k: usize) -> Result<Vec<RetrievedPassage>, DocQaError> {
        if k == 0 || self.index.is_empty().into_docqa_result()? {
            debug!("retriever: index empty, skipping search");
            return Ok(Vec::new());
        }

        let embedding = self.embedder.embed_one(query).into_docqa_result()?;
        let results = self.index.query(&embedding, k, None).into_docqa_result()?;

        let kind = self.index.score_kind();
        let mut passages: Vec<RetrievedPassage> = results
            .into_iter()
            .map(|r| Self::to_passage(r, kind))
            .collect();

        // Stable, so ties keep the backend's order.
        passages.sort_by(|a, b| {
            b.relevance
                .partial_cmp(&a.relevance)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        debug!(
            "retriever: {} passages, top relevance {:.4}",
            passages.len(),
            passages.first().map(|p| p.relevance).unwrap_or(0.0)
        );
        Ok(passages)
    }
}
