//! Ingestion: split source documents into chunks, embed them and write them
//! to the vector index.
//!
//! Re-ingesting a source replaces its chunks. Stale chunks are removed by
//! source before the new ones are upserted, so chunk counts never add up
//! across runs.

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use docqa_db::vector::{VectorId, VectorIndexBackend, VectorInsert};
use docqa_model::EmbeddingModel;
use serde::{Deserialize, Serialize};
use serde_json::json;
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use crate::chunking::RecursiveSplitter;
use crate::db_adapter::IntoDocQaResult;
use crate::errors::DocQaError;
use crate::model_adapter::IntoDocQaModelResult;
use crate::source::normalize_source;

/// Texts embedded per provider call.
const EMBED_BATCH_SIZE: usize = 64;

// ============================================================================
// Types
// ============================================================================

/// A document to index: its name and extracted text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDocument {
    pub name: String,
    pub text: String,
}

impl SourceDocument {
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
        }
    }

    /// Read a UTF-8 text file. The document is named after the file name.
    pub fn from_path(path: &Path) -> Result<Self, DocQaError> {
        if !path.is_file() {
            return Err(DocQaError::PathNotFound(path.display().to_string()));
        }
        let text = fs::read_to_string(path).map_err(|e| {
            DocQaError::InvalidArgument(format!(
                "Cannot read `{}` as UTF-8 text: {}",
                path.display(),
                e
            ))
        })?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self::new(name, text))
    }
}

/// One chunk of a source document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkRecord {
    pub text: String,
    pub source: String,
    /// 1-based.
    pub chunk_index: u32,
    pub total_chunks: u32,
}

impl ChunkRecord {
    /// Stable id for this chunk: same source and position, same id.
    pub fn vector_id(&self) -> VectorId {
        let digest = Sha256::digest(format!("{}\u{0}{}", self.source, self.chunk_index));
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&digest[..8]);
        VectorId::new(u64::from_be_bytes(bytes))
    }

    fn extension(&self) -> String {
        Path::new(&self.source)
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default()
    }
}

/// Outcome of an ingest call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestReport {
    /// Normalized source names, sorted and unique.
    pub indexed_sources: Vec<String>,
    pub indexed_chunks: usize,
    /// Documents that produced no text.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<String>,
}

// ============================================================================
// Chunking
// ============================================================================

/// Split one document into chunk records under its normalized name.
pub fn chunk_document(document: &SourceDocument, splitter: &RecursiveSplitter) -> Vec<ChunkRecord> {
    let source = normalize_source(document.name.trim());
    let pieces = splitter.split(&document.text);
    let total = pieces.len() as u32;

    pieces
        .into_iter()
        .enumerate()
        .map(|(i, text)| ChunkRecord {
            text,
            source: source.clone(),
            chunk_index: i as u32 + 1,
            total_chunks: total,
        })
        .collect()
}

// ============================================================================
// Ingestion
// ============================================================================

/// Chunk, embed and index `documents`.
pub fn ingest_documents(
    index: &dyn VectorIndexBackend,
    embedder: &dyn EmbeddingModel,
    splitter: &RecursiveSplitter,
    documents: &[SourceDocument],
) -> Result<IngestReport, DocQaError> {
    let mut sources = BTreeSet::new();
    let mut report = IngestReport::default();

    for document in documents {
        let chunks = chunk_document(document, splitter);
        if chunks.is_empty() {
            debug!("skipping `{}`: no text", document.name);
            report.skipped.push(document.name.clone());
            continue;
        }
        let source = chunks[0].source.clone();

        let mut inserts = Vec::with_capacity(chunks.len());
        for batch in chunks.chunks(EMBED_BATCH_SIZE) {
            let texts: Vec<&str> = batch.iter().map(|c| c.text.as_str()).collect();
            let vectors = embedder.embed(&texts).into_docqa_result()?;
            if vectors.len() != batch.len() {
                return Err(DocQaError::EmbeddingFailed {
                    model_id: embedder.model_id().to_string(),
                    message: format!(
                        "expected {} embeddings, got {}",
                        batch.len(),
                        vectors.len()
                    ),
                });
            }
            for (chunk, vector) in batch.iter().zip(vectors) {
                inserts.push(
                    VectorInsert::new(chunk.vector_id(), vector, &chunk.text, &chunk.source)
                        .with_chunk_index(chunk.chunk_index)
                        .with_payload(json!({
                            "totalChunks": chunk.total_chunks,
                            "extension": chunk.extension(),
                        })),
                );
            }
        }

        let removed = index.replace_source(&source, &inserts).into_docqa_result()?;
        if removed > 0 {
            debug!("replaced {} stale chunks of `{}`", removed, source);
        }

        info!("indexed `{}`: {} chunks", source, inserts.len());
        report.indexed_chunks += inserts.len();
        sources.insert(source);
    }

    index.flush().into_docqa_result()?;
    report.indexed_sources = sources.into_iter().collect();
    Ok(report)
}
