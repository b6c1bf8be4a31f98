//! Search filters applied by vector backends.

use serde::{Deserialize, Serialize};

// ============================================================================
// VectorSearchFilter
// ============================================================================

/// Filter criteria for vector search and scan.
///
/// Fields are combined with AND logic. `None` fields are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VectorSearchFilter {
    /// Exact (normalized) source name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,

    /// Source name suffix, compared case-insensitively.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_suffix: Option<String>,
}

impl VectorSearchFilter {
    /// Create an empty filter that matches everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict to one source.
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Restrict to sources ending with `suffix`.
    pub fn with_source_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.source_suffix = Some(suffix.into());
        self
    }

    /// Check whether the filter has no criteria.
    pub fn is_empty(&self) -> bool {
        self.source.is_none() && self.source_suffix.is_none()
    }

    /// Check whether a stored source name passes this filter.
    pub fn matches_source(&self, source: &str) -> bool {
        if let Some(ref expected) = self.source {
            if source != expected {
                return false;
            }
        }

        if let Some(ref suffix) = self.source_suffix {
            if !source.to_lowercase().ends_with(&suffix.to_lowercase()) {
                return false;
            }
        }

        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_filter_matches_all() {
        let filter = VectorSearchFilter::new();
        assert!(filter.is_empty());
        assert!(filter.matches_source("anything.pdf"));
    }

    #[test]
    fn test_source_filter() {
        let filter = VectorSearchFilter::new().with_source("lease.pdf");
        assert!(filter.matches_source("lease.pdf"));
        assert!(!filter.matches_source("other.pdf"));
    }

    #[test]
    fn test_suffix_filter_ignores_case() {
        let filter = VectorSearchFilter::new().with_source_suffix("Lease.PDF");
        assert!(filter.matches_source("office_lease.pdf"));
        assert!(!filter.matches_source("lease.txt"));
    }
}
