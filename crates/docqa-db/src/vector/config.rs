//! Vector index configuration and the on-disk manifest.

use super::traits::{ScoreKind, VectorMetric};
use crate::error::{DbError, DbResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Default backend name.
pub const DEFAULT_BACKEND: &str = "jsonl";

/// Manifest written next to a persisted index.
pub const MANIFEST_FILENAME: &str = "manifest.json";

// ============================================================================
// VectorIndexConfig
// ============================================================================

/// Configuration for opening a vector index.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VectorIndexConfig {
    /// Dimension of vectors in the index.
    pub dimension: usize,

    /// Path to the index directory. Ignored by the `memory` backend.
    pub path: PathBuf,

    /// Backend to use (`jsonl` or `memory`).
    #[serde(default = "default_backend")]
    pub backend: String,

    #[serde(default)]
    pub metric: VectorMetric,
}

fn default_backend() -> String {
    DEFAULT_BACKEND.to_string()
}

impl VectorIndexConfig {
    pub fn new(dimension: usize, path: impl Into<PathBuf>) -> Self {
        Self {
            dimension,
            path: path.into(),
            backend: DEFAULT_BACKEND.to_string(),
            metric: VectorMetric::Cosine,
        }
    }

    pub fn with_backend(mut self, backend: impl Into<String>) -> Self {
        self.backend = backend.into();
        self
    }

    pub fn with_metric(mut self, metric: VectorMetric) -> Self {
        self.metric = metric;
        self
    }
}

// ============================================================================
// IndexManifest
// ============================================================================

/// What a persisted index was built with.
///
/// Stored vectors are only comparable with query vectors of the same
/// dimension, and their scores only mean something under the metric they
/// were ingested with. `scoreKind` is recorded so a reader can tell whether
/// stored scores grow or shrink with relevance without knowing every metric.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexManifest {
    pub dimension: usize,
    pub metric: VectorMetric,
    pub score_kind: ScoreKind,

    /// Number of vectors at the last write.
    #[serde(default)]
    pub count: usize,
}

impl IndexManifest {
    pub fn new(dimension: usize, metric: VectorMetric) -> Self {
        Self {
            dimension,
            metric,
            score_kind: metric.score_kind(),
            count: 0,
        }
    }

    pub fn with_count(mut self, count: usize) -> Self {
        self.count = count;
        self
    }

    /// Read the manifest in `dir`. `None` when the index was never written.
    pub fn load(dir: &Path) -> DbResult<Option<Self>> {
        let path = dir.join(MANIFEST_FILENAME);
        if !path.exists() {
            return Ok(None);
        }
        debug!("Loading index manifest from {:?}", path);

        let content = fs::read_to_string(&path)
            .map_err(|e| DbError::vector_io(&path, format!("Failed to read manifest: {}", e)))?;
        serde_json::from_str(&content)
            .map(Some)
            .map_err(|e| DbError::vector_parse(&path, format!("Failed to parse manifest: {}", e)))
    }

    /// Write the manifest into `dir`, replacing any previous one whole.
    pub fn save(&self, dir: &Path) -> DbResult<()> {
        fs::create_dir_all(dir)?;
        let content = serde_json::to_string_pretty(self)?;
        write_replacing(&dir.join(MANIFEST_FILENAME), content.as_bytes())
    }

    /// Reject opening this index with another dimension or metric.
    pub fn ensure_matches(&self, config: &VectorIndexConfig) -> DbResult<()> {
        if self.dimension != config.dimension {
            return Err(DbError::DimensionMismatch {
                expected: config.dimension,
                actual: self.dimension,
            });
        }

        if self.metric == config.metric {
            return Ok(());
        }

        let requested = config.metric.score_kind();
        let reason = if requested == self.score_kind {
            format!(
                "index was built with metric '{}', configured '{}'. Re-ingest to switch metrics",
                self.metric, config.metric
            )
        } else {
            format!(
                "index was built with metric '{}' ({} scores) but '{}' reports {} scores. \
                 Relevance thresholds would flip meaning. Re-ingest to switch metrics",
                self.metric,
                self.score_kind.as_str(),
                config.metric,
                requested.as_str()
            )
        };
        Err(DbError::index_incompatible(reason))
    }
}

/// Write `bytes` to a sibling temp file, then rename it over `path`.
///
/// Readers see either the old contents or the new ones, never a prefix.
pub(crate) fn write_replacing(path: &Path, bytes: &[u8]) -> DbResult<()> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    fs::write(&tmp, bytes)
        .map_err(|e| DbError::vector_io(&tmp, format!("Failed to write: {}", e)))?;
    fs::rename(&tmp, path)
        .map_err(|e| DbError::vector_io(path, format!("Failed to replace: {}", e)))
}

// ============================================================================
// Tests
// ============================================================================
