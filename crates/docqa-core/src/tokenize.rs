//! Tokenizers shared by grounding and evaluation.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

static ALNUM_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[a-zA-Z0-9]+").expect("Invalid regex"));

/// Function words ignored when comparing answers with expected answers.
pub const STOPWORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "by", "for", "from", "how", "in", "is", "it", "of",
    "on", "or", "that", "the", "this", "to", "was", "what", "when", "where", "which", "who",
    "with",
];

/// ASCII alphanumeric runs of the lower-cased text. No filtering.
pub fn raw_tokens(text: &str) -> HashSet<String> {
    let lowered = text.to_lowercase();
    ALNUM_RUN
        .find_iter(&lowered)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Like [`raw_tokens`], minus single characters and [`STOPWORDS`].
pub fn content_tokens(text: &str) -> HashSet<String> {
    raw_tokens(text)
        .into_iter()
        .filter(|t| t.len() > 1 && !STOPWORDS.contains(&t.as_str()))
        .collect()
}
