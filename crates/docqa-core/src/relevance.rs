//! Relevance gate: refuse to answer when the best evidence is too weak.

use crate::retriever::RetrievedPassage;

/// Result of gating a retrieved set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RelevanceGate {
    /// Nothing was retrieved at all.
    Empty,
    /// Best relevance is under the threshold.
    Refuse { top: f64 },
    /// Best relevance reaches the threshold.
    Pass { top: f64 },
}

/// Gate on the maximum relevance of `passages`.
///
/// Call this on the retrieved set before deduplication.
pub fn gate(passages: &[RetrievedPassage], threshold: f64) -> RelevanceGate {
    let top = passages
        .iter()
        .map(|p| p.relevance)
        .fold(None, |best: Option<f64>, r| Some(best.map_or(r, |b| b.max(r))));

    match top {
        None => RelevanceGate::Empty,
        Some(top) if top < threshold => RelevanceGate::Refuse { top },
        Some(top) => RelevanceGate::Pass { top },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scored(scores: &[f64]) -> Vec<RetrievedPassage> {
        scores
            .iter()
            .enumerate()
            .map(|(i, s)| RetrievedPassage::new(format!("p{i}"), "a.pdf", None, *s))
            .collect()
    }

    #[test]
    fn test_low_scores_refuse() {
        assert_eq!(gate(&scored(&[0.1, 0.05]), 0.2), RelevanceGate::Refuse { top: 0.1 });
    }

    #[test]
    fn test_threshold_is_inclusive() {
        assert!(matches!(gate(&scored(&[0.2]), 0.2), RelevanceGate::Pass { .. }));
    }

    #[test]
    fn test_uses_maximum_not_first() {
        assert_eq!(gate(&scored(&[0.1, 0.7, 0.3]), 0.2), RelevanceGate::Pass { top: 0.7 });
    }

    #[test]
    fn test_empty_is_distinct_from_refuse() {
        assert_eq!(gate(&[], 0.2), RelevanceGate::Empty);
        assert_eq!(gate(&[], 0.0), RelevanceGate::Empty);
    }
}
