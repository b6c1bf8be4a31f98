//! Citation assembly: numbered context blocks for the prompt plus the
//! citation list returned to the caller.

use serde::{Deserialize, Serialize};

use crate::retriever::RetrievedPassage;

/// Default cap on returned citations.
pub const MAX_CITATIONS: usize = 10;

/// User-facing pointer to a passage that backed an answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Citation {
    pub source: String,
    pub chunk_id: Option<u32>,
    /// Relevance rounded to 4 decimal places.
    pub relevance: f64,
}

/// Everything derived from the surviving passages.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Assembly {
    /// `[i] <text>`, 1-based, one per passage.
    pub context_blocks: Vec<String>,
    /// Raw passage texts, parallel to `context_blocks`.
    pub contexts: Vec<String>,
    /// At most `max_citations` entries, in rank order.
    pub citations: Vec<Citation>,
}

pub(crate) fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

/// Build context blocks for every passage and citations for the first
/// `max_citations`. The cap never shortens the context.
pub fn assemble(passages: &[RetrievedPassage], max_citations: usize) -> Assembly {
    let mut assembly = Assembly::default();

    for (i, passage) in passages.iter().enumerate() {
        assembly
            .context_blocks
            .push(format!("[{}] {}", i + 1, passage.text));
        assembly.contexts.push(passage.text.clone());

        if assembly.citations.len() < max_citations {
            assembly.citations.push(Citation {
                source: passage.source.clone(),
                chunk_id: passage.chunk_index,
                relevance: round4(passage.relevance),
            });
        }
    }

    assembly
}

#[cfg(test)]
mod tests {
    use super::*;

    fn passages(n: usize) -> Vec<RetrievedPassage> {
        (0..n)
            .map(|i| {
                RetrievedPassage::new(
                    format!("text {i}"),
                    "a.pdf",
                    Some(i as u32 + 1),
                    1.0 / (i as f64 + 3.0),
                )
            })
            .collect()
    }

    #[test]
    fn test_blocks_are_numbered_from_one() {
        let a = assemble(&passages(2), MAX_CITATIONS);
        assert_eq!(a.context_blocks, vec!["[1] text 0", "[2] text 1"]);
        assert_eq!(a.contexts, vec!["text 0", "text 1"]);
    }

    #[test]
    fn test_citations_capped_but_context_is_not() {
        let a = assemble(&passages(14), MAX_CITATIONS);
        assert_eq!(a.context_blocks.len(), 14);
        assert_eq!(a.citations.len(), 10);
        assert_eq!(a.citations[9].chunk_id, Some(10));
    }

    #[test]
    fn test_relevance_rounded() {
        let a = assemble(&passages(1), MAX_CITATIONS);
        assert_eq!(a.citations[0].relevance, 0.3333);
        assert_eq!(round4(0.123_456), 0.1235);
    }

    #[test]
    fn test_citation_serializes_camel_case() {
        let json = serde_json::to_value(&assemble(&passages(1), 1).citations[0]).unwrap();
        assert_eq!(json["chunkId"], 1);
        assert_eq!(json["source"], "a.pdf");
    }
}
