//! Vector index traits and core types.
//!
//! This module defines the core abstraction for passage storage backends.

use crate::error::DbResult;
use serde::{Deserialize, Serialize};

use super::metadata::VectorSearchFilter;

// ============================================================================
// VectorId
// ============================================================================

/// Unique identifier for a stored passage vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VectorId(pub u64);

impl VectorId {
    /// Create a new vector ID.
    pub fn new(id: u64) -> Self {
        VectorId(id)
    }

    /// Get the underlying ID value.
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl From<u64> for VectorId {
    fn from(id: u64) -> Self {
        VectorId(id)
    }
}

impl std::fmt::Display for VectorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// VectorMetric / ScoreKind
// ============================================================================

/// Distance metric for vector similarity search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VectorMetric {
    /// Cosine similarity (default).
    #[default]
    Cosine,
    /// Dot product.
    Dot,
    /// Euclidean (L2) distance.
    L2,
}

impl VectorMetric {
    /// Get the metric name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            VectorMetric::Cosine => "cosine",
            VectorMetric::Dot => "dot",
            VectorMetric::L2 => "l2",
        }
    }

    /// What the raw scores produced under this metric mean.
    pub fn score_kind(&self) -> ScoreKind {
        match self {
            VectorMetric::Cosine | VectorMetric::Dot => ScoreKind::Similarity,
            VectorMetric::L2 => ScoreKind::Distance,
        }
    }
}

impl std::fmt::Display for VectorMetric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for VectorMetric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "cosine" => Ok(VectorMetric::Cosine),
            "dot" => Ok(VectorMetric::Dot),
            "l2" | "euclidean" => Ok(VectorMetric::L2),
            other => Err(format!("unknown vector metric '{}'", other)),
        }
    }
}

/// Orientation of the raw scores a backend reports.
///
/// Backends never rescale. Callers that need a uniform "higher is better"
/// relevance convert `Distance` scores themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreKind {
    /// Higher is more similar.
    Similarity,
    /// Lower is more similar.
    Distance,
}

impl ScoreKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScoreKind::Similarity => "similarity",
            ScoreKind::Distance => "distance",
        }
    }
}

// ============================================================================
// VectorInsert
// ============================================================================

/// A passage vector to insert or update in the index.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VectorInsert {
    /// Unique identifier for this vector.
    pub id: VectorId,

    /// The embedding vector.
    pub vector: Vec<f32>,

    /// Passage text.
    pub text: String,

    /// Logical source (document) name.
    pub source: String,

    /// 1-based chunk position inside the source, if known.
    #[serde(default)]
    pub chunk_index: Option<u32>,

    /// Extra metadata (chunk totals, file extension, ...).
    #[serde(default)]
    pub payload: serde_json::Value,
}

impl VectorInsert {
    /// Create a new vector insert with required fields.
    pub fn new(
        id: impl Into<VectorId>,
        vector: Vec<f32>,
        text: impl Into<String>,
        source: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            vector,
            text: text.into(),
            source: source.into(),
            chunk_index: None,
            payload: serde_json::Value::Null,
        }
    }

    /// Set the chunk index.
    pub fn with_chunk_index(mut self, chunk_index: u32) -> Self {
        self.chunk_index = Some(chunk_index);
        self
    }

    /// Set the payload.
    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }
}

// ============================================================================
// VectorSearchResult / VectorRecord
// ============================================================================

/// A single result from a vector similarity search.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VectorSearchResult {
    /// Identifier of the matched vector.
    pub id: VectorId,

    /// Raw backend score. Orientation given by [`VectorIndexBackend::score_kind`].
    pub score: f32,

    /// Passage text.
    pub text: String,

    /// Logical source name.
    pub source: String,

    /// Chunk index inside the source.
    #[serde(default)]
    pub chunk_index: Option<u32>,

    /// Extra metadata stored with the vector.
    #[serde(default)]
    pub payload: serde_json::Value,
}

/// A stored passage without its embedding, as returned by [`VectorIndexBackend::scan`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VectorRecord {
    pub id: VectorId,
    pub text: String,
    pub source: String,
    #[serde(default)]
    pub chunk_index: Option<u32>,
    #[serde(default)]
    pub payload: serde_json::Value,
}

// ============================================================================
// VectorIndexBackend Trait
// ============================================================================

/// Core trait for passage vector backends.
///
/// ## Implementation Notes
///
/// - Backends must be thread-safe (`Send + Sync`).
/// - `query` returns results ordered best first under the backend's metric.
/// - Upsert semantics: a vector with an existing ID replaces the old one.
pub trait VectorIndexBackend: Send + Sync {
    /// Query the index for similar vectors.
    ///
    /// # Arguments
    /// * `embedding` - The query vector.
    /// * `limit` - Maximum number of results to return.
    /// * `filter` - Optional filter criteria.
    fn query(
        &self,
        embedding: &[f32],
        limit: usize,
        filter: Option<&VectorSearchFilter>,
    ) -> DbResult<Vec<VectorSearchResult>>;

    /// Insert or update vectors in the index.
    fn upsert(&self, vectors: &[VectorInsert]) -> DbResult<()>;

    /// Delete vectors by their IDs.
    fn delete(&self, ids: &[VectorId]) -> DbResult<()>;

    /// Delete every vector stored for `source`. Returns how many were removed.
    fn delete_by_source(&self, source: &str) -> DbResult<usize>;

    /// Swap every vector stored for `source` for `vectors` in one write.
    ///
    /// Returns how many old vectors were removed. When this fails the
    /// stored vectors for `source` are unchanged.
    fn replace_source(&self, source: &str, vectors: &[VectorInsert]) -> DbResult<usize>;

    /// List stored passages matching `filter`, ordered by source then chunk index.
    fn scan(&self, filter: Option<&VectorSearchFilter>) -> DbResult<Vec<VectorRecord>>;

    /// Flush pending writes to persistent storage.
    fn flush(&self) -> DbResult<()>;

    /// Get the number of vectors in the index.
    fn len(&self) -> DbResult<usize>;

    /// Check if the index is empty.
    fn is_empty(&self) -> DbResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Get the dimension of vectors in this index.
    fn dimension(&self) -> usize;

    /// Get the distance metric used by this index.
    fn metric(&self) -> VectorMetric;

    /// Orientation of the scores returned by `query`.
    fn score_kind(&self) -> ScoreKind {
        self.metric().score_kind()
    }
}

// ============================================================================
// Similarity Functions
// ============================================================================

/// Raw score of `b` against `a` under `metric`.
pub(crate) fn raw_score(metric: VectorMetric, a: &[f32], b: &[f32]) -> f32 {
    match metric {
        VectorMetric::Cosine => cosine_similarity(a, b),
        VectorMetric::Dot => dot_product(a, b),
        VectorMetric::L2 => euclidean_distance(a, b),
    }
}

/// Sort scored entries best first for the given score kind.
pub(crate) fn sort_best_first<T>(scored: &mut [(f32, T)], kind: ScoreKind) {
    scored.sort_by(|a, b| {
        let ord = a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal);
        match kind {
            ScoreKind::Similarity => ord.reverse(),
            ScoreKind::Distance => ord,
        }
    });
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a * norm_b)
}

fn dot_product(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

fn euclidean_distance(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y).powi(2))
        .sum::<f32>()
        .sqrt()
}

// ============================================================================
// Tests
// ============================================================================
