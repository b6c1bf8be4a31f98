//! Duplicate suppression for ranked passages.
//!
//! The same chunk can come back more than once when a document has been
//! re-indexed; counting it twice would inflate both citations and grounding.

use std::collections::HashSet;

use sha2::{Digest, Sha256};
use tracing::debug;

use crate::retriever::RetrievedPassage;
use crate::source::normalize_source;

/// Identity of a passage: normalized source, chunk index, content digest.
type DedupeKey = (String, Option<u32>, [u8; 32]);

fn dedupe_key(passage: &RetrievedPassage) -> DedupeKey {
    (
        normalize_source(&passage.source),
        passage.chunk_index,
        Sha256::digest(passage.text.as_bytes()).into(),
    )
}

/// Drop later duplicates, keeping the first occurrence of each key.
///
/// Survivors keep their relative order, so the output is still ranked.
pub fn dedupe(passages: Vec<RetrievedPassage>) -> Vec<RetrievedPassage> {
    let before = passages.len();
    let mut seen: HashSet<DedupeKey> = HashSet::with_capacity(before);

    let survivors: Vec<RetrievedPassage> = passages
        .into_iter()
        .filter(|p| seen.insert(dedupe_key(p)))
        .collect();

    if survivors.len() < before {
        debug!("dedupe: dropped {} duplicate passages", before - survivors.len());
    }
    survivors
}
