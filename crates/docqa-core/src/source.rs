//! Source-name normalization.
//!
//! Uploaded files are stored as `<32 hex chars>_<original name>`. Everything
//! user-facing (citations, ingest reports, summaries) uses the original name.

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

static STORAGE_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9a-fA-F]{32}_").expect("Invalid regex"));

/// Strip one leading storage prefix, keeping the rest verbatim.
///
/// Idempotent for every name that does not itself start with a second
/// prefix; in that case each call strips exactly one.
pub fn normalize_source(name: &str) -> String {
    STORAGE_PREFIX.replace(name, "").into_owned()
}

/// Comparison key for a source reference: file name only, trimmed,
/// lower-cased, storage prefix removed.
///
/// Used wherever sources from different origins (labels written by hand,
/// citations, paths) must be matched.
pub fn source_key(name: &str) -> String {
    let file_name = Path::new(name)
        .file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_else(|| name.to_string());
    normalize_source(&file_name.trim().to_lowercase())
}
