//! Document summarization over indexed chunks.

use std::collections::BTreeMap;

use docqa_db::vector::{VectorIndexBackend, VectorRecord, VectorSearchFilter};
use docqa_model::{fallback_excerpt, GenerationModel};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::db_adapter::IntoDocQaResult;
use crate::errors::DocQaError;
use crate::prompt::{summary_prompt, SUMMARY_CHUNK_LIMIT};
use crate::source::normalize_source;

pub const NO_CHUNKS_FOR_SOURCE: &str = "No chunks found for this source.";
pub const NO_DOCUMENTS: &str = "No indexed documents to summarize.";
/// Reported source when summarizing everything.
pub const ALL_SOURCES: &str = "all";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryResponse {
    pub source: String,
    pub summary: String,
}

/// Chunks of `source`, in chunk order.
///
/// An exact match on the normalized name wins. Otherwise the name is
/// treated as a suffix and must match exactly one indexed source.
fn chunks_for_source(
    index: &dyn VectorIndexBackend,
    source: &str,
) -> Result<Vec<VectorRecord>, DocQaError> {
    let exact = VectorSearchFilter::new().with_source(normalize_source(source));
    let records = index.scan(Some(&exact)).into_docqa_result()?;
    if !records.is_empty() {
        return Ok(records);
    }

    let suffix = VectorSearchFilter::new().with_source_suffix(source);
    let mut by_source: BTreeMap<String, Vec<VectorRecord>> = BTreeMap::new();
    for record in index.scan(Some(&suffix)).into_docqa_result()? {
        by_source.entry(record.source.clone()).or_default().push(record);
    }

    if by_source.len() == 1 {
        Ok(by_source.into_values().flatten().collect())
    } else {
        if by_source.len() > 1 {
            debug!(
                "`{}` is ambiguous across {} sources",
                source,
                by_source.len()
            );
        }
        Ok(Vec::new())
    }
}

/// Summarize one source, or every indexed source when `source` is `None`.
pub fn summarize(
    index: &dyn VectorIndexBackend,
    generator: &dyn GenerationModel,
    source: Option<&str>,
) -> Result<SummaryResponse, DocQaError> {
    let (name, chunks) = match source.map(str::trim).filter(|s| !s.is_empty()) {
        Some(source) => {
            let chunks = chunks_for_source(index, source)?;
            if chunks.is_empty() {
                return Ok(SummaryResponse {
                    source: source.to_string(),
                    summary: NO_CHUNKS_FOR_SOURCE.to_string(),
                });
            }
            (source.to_string(), chunks)
        }
        None => {
            let chunks = index.scan(None).into_docqa_result()?;
            if chunks.is_empty() {
                return Ok(SummaryResponse {
                    source: ALL_SOURCES.to_string(),
                    summary: NO_DOCUMENTS.to_string(),
                });
            }
            (ALL_SOURCES.to_string(), chunks)
        }
    };

    let content = chunks
        .iter()
        .take(SUMMARY_CHUNK_LIMIT)
        .map(|r| r.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n");
    let prompt = summary_prompt(&content);

    let summary = match generator.complete(&prompt) {
        Ok(generation) => generation.into_text(),
        Err(err) => {
            warn!("summary generation failed, using fallback: {}", err);
            fallback_excerpt(&[])
        }
    };

    Ok(SummaryResponse {
        source: name,
        summary,
    })
}
