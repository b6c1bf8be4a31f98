//! In-memory vector index backend.
//!
//! Holds every vector in a `RwLock<HashMap>` and answers queries by linear
//! scan. The JSONL backend wraps this type and adds persistence.

use super::super::config::VectorIndexConfig;
use super::super::metadata::VectorSearchFilter;
use super::super::traits::{
    raw_score, sort_best_first, VectorId, VectorIndexBackend, VectorInsert, VectorMetric,
    VectorRecord, VectorSearchResult,
};
use crate::error::{DbError, DbResult};
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, trace};

/// Process-local vector index.
pub struct InMemoryVectorIndex {
    dimension: usize,
    metric: VectorMetric,
    vectors: RwLock<HashMap<u64, VectorInsert>>,
}

impl InMemoryVectorIndex {
    /// Create an empty index.
    pub fn new(dimension: usize, metric: VectorMetric) -> Self {
        Self {
            dimension,
            metric,
            vectors: RwLock::new(HashMap::new()),
        }
    }

    /// Create an empty index from a config. The config path is ignored.
    pub fn open(config: &VectorIndexConfig) -> Self {
        debug!("Opening InMemoryVectorIndex (dimension={})", config.dimension);
        Self::new(config.dimension, config.metric)
    }

    pub(super) fn read(&self) -> DbResult<RwLockReadGuard<'_, HashMap<u64, VectorInsert>>> {
        self.vectors
            .read()
            .map_err(|e| DbError::internal(format!("Failed to acquire read lock: {}", e)))
    }

    pub(super) fn write(&self) -> DbResult<RwLockWriteGuard<'_, HashMap<u64, VectorInsert>>> {
        self.vectors
            .write()
            .map_err(|e| DbError::internal(format!("Failed to acquire write lock: {}", e)))
    }

    /// Insert already-validated vectors without touching any storage.
    pub(super) fn load(&self, entries: Vec<VectorInsert>) -> DbResult<()> {
        let mut stored = self.write()?;
        for entry in entries {
            stored.insert(entry.id.value(), entry);
        }
        Ok(())
    }

    /// Reject a batch holding any vector of the wrong dimension.
    pub(super) fn check_dimensions(&self, vectors: &[VectorInsert]) -> DbResult<()> {
        match vectors.iter().find(|v| v.vector.len() != self.dimension) {
            Some(bad) => Err(DbError::DimensionMismatch {
                expected: self.dimension,
                actual: bad.vector.len(),
            }),
            None => Ok(()),
        }
    }

    fn matches(entry: &VectorInsert, filter: Option<&VectorSearchFilter>) -> bool {
        filter.map(|f| f.matches_source(&entry.source)).unwrap_or(true)
    }
}

impl VectorIndexBackend for InMemoryVectorIndex {
    fn query(
        &self,
        embedding: &[f32],
        limit: usize,
        filter: Option<&VectorSearchFilter>,
    ) -> DbResult<Vec<VectorSearchResult>> {
        trace!("Querying InMemoryVectorIndex, limit={}", limit);

        if embedding.len() != self.dimension {
            return Err(DbError::DimensionMismatch {
                expected: self.dimension,
                actual: embedding.len(),
            });
        }

        let stored = self.read()?;

        let mut scored: Vec<(f32, &VectorInsert)> = stored
            .values()
            .filter(|v| Self::matches(v, filter))
            .map(|v| (raw_score(self.metric, embedding, &v.vector), v))
            .collect();

        sort_best_first(&mut scored, self.metric.score_kind());

        let results: Vec<VectorSearchResult> = scored
            .into_iter()
            .take(limit)
            .map(|(score, v)| VectorSearchResult {
                id: v.id,
                score,
                text: v.text.clone(),
                source: v.source.clone(),
                chunk_index: v.chunk_index,
                payload: v.payload.clone(),
            })
            .collect();

        trace!("Found {} results", results.len());
        Ok(results)
    }

    fn upsert(&self, vectors: &[VectorInsert]) -> DbResult<()> {
        debug!("Upserting {} vectors", vectors.len());

        self.check_dimensions(vectors)?;

        let mut stored = self.write()?;
        for insert in vectors {
            stored.insert(insert.id.value(), insert.clone());
        }
        Ok(())
    }

    fn delete(&self, ids: &[VectorId]) -> DbResult<()> {
        debug!("Deleting {} vectors", ids.len());
        let mut stored = self.write()?;
        for id in ids {
            stored.remove(&id.value());
        }
        Ok(())
    }

    fn delete_by_source(&self, source: &str) -> DbResult<usize> {
        let mut stored = self.write()?;
        let before = stored.len();
        stored.retain(|_, v| v.source != source);
        let removed = before - stored.len();
        debug!("Deleted {} stale vectors for source '{}'", removed, source);
        Ok(removed)
    }

    fn replace_source(&self, source: &str, vectors: &[VectorInsert]) -> DbResult<usize> {
        self.check_dimensions(vectors)?;

        let mut stored = self.write()?;
        let before = stored.len();
        stored.retain(|_, v| v.source != source);
        let removed = before - stored.len();
        for insert in vectors {
            stored.insert(insert.id.value(), insert.clone());
        }
        debug!(
            "Replaced {} vectors with {} for source '{}'",
            removed,
            vectors.len(),
            source
        );
        Ok(removed)
    }

    fn scan(&self, filter: Option<&VectorSearchFilter>) -> DbResult<Vec<VectorRecord>> {
        let stored = self.read()?;
        let mut records: Vec<VectorRecord> = stored
            .values()
            .filter(|v| Self::matches(v, filter))
            .map(|v| VectorRecord {
                id: v.id,
                text: v.text.clone(),
                source: v.source.clone(),
                chunk_index: v.chunk_index,
                payload: v.payload.clone(),
            })
            .collect();

        records.sort_by(|a, b| {
            a.source
                .cmp(&b.source)
                .then(a.chunk_index.cmp(&b.chunk_index))
                .then(a.id.cmp(&b.id))
        });
        Ok(records)
    }

    fn flush(&self) -> DbResult<()> {
        Ok(())
    }

    fn len(&self) -> DbResult<usize> {
        Ok(self.read()?.len())
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn metric(&self) -> VectorMetric {
        self.metric
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector::ScoreKind;

    fn insert(id: u64, vector: Vec<f32>, source: &str, chunk: u32) -> VectorInsert {
        VectorInsert::new(id, vector, format!("chunk {}", chunk), source).with_chunk_index(chunk)
    }

    #[test]
    fn test_query_orders_by_similarity() {
        let index = InMemoryVectorIndex::new(2, VectorMetric::Cosine);
        index
            .upsert(&[
                insert(1, vec![0.0, 1.0], "a.pdf", 1),
                insert(2, vec![1.0, 0.0], "a.pdf", 2),
                insert(3, vec![0.7, 0.7], "b.pdf", 1),
            ])
            .unwrap();

        let results = index.query(&[1.0, 0.0], 2, None).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].id.value(), 2);
        assert_eq!(results[1].id.value(), 3);
    }

    #[test]
    fn test_l2_reports_distance_ascending() {
        let index = InMemoryVectorIndex::new(2, VectorMetric::L2);
        assert_eq!(index.score_kind(), ScoreKind::Distance);
        index
            .upsert(&[
                insert(1, vec![3.0, 4.0], "a.pdf", 1),
                insert(2, vec![0.0, 1.0], "a.pdf", 2),
            ])
            .unwrap();

        let results = index.query(&[0.0, 0.0], 5, None).unwrap();
        assert_eq!(results[0].id.value(), 2);
        assert!((results[0].score - 1.0).abs() < 1e-6);
        assert!((results[1].score - 5.0).abs() < 1e-6);
    }

    #[test]
    fn test_upsert_rejects_wrong_dimension() {
        let index = InMemoryVectorIndex::new(3, VectorMetric::Cosine);
        let err = index
            .upsert(&[insert(1, vec![1.0, 0.0], "a.pdf", 1)])
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::DimensionMismatch {
                expected: 3,
                actual: 2
            }
        ));
        assert!(index.is_empty().unwrap());
    }

    #[test]
    fn test_delete_by_source_and_scan() {
        let index = InMemoryVectorIndex::new(2, VectorMetric::Cosine);
        index
            .upsert(&[
                insert(1, vec![1.0, 0.0], "b.pdf", 2),
                insert(2, vec![1.0, 0.0], "b.pdf", 1),
                insert(3, vec![1.0, 0.0], "a.pdf", 1),
            ])
            .unwrap();

        let all = index.scan(None).unwrap();
        let order: Vec<(String, Option<u32>)> =
            all.iter().map(|r| (r.source.clone(), r.chunk_index)).collect();
        assert_eq!(
            order,
            vec![
                ("a.pdf".to_string(), Some(1)),
                ("b.pdf".to_string(), Some(1)),
                ("b.pdf".to_string(), Some(2)),
            ]
        );

        assert_eq!(index.delete_by_source("b.pdf").unwrap(), 2);
        assert_eq!(index.len().unwrap(), 1);
        assert_eq!(index.delete_by_source("missing.pdf").unwrap(), 0);
    }

    #[test]
    fn test_replace_source_keeps_old_chunks_on_bad_batch() {
        let index = InMemoryVectorIndex::new(2, VectorMetric::Cosine);
        index
            .upsert(&[
                insert(1, vec![1.0, 0.0], "a.pdf", 1),
                insert(2, vec![1.0, 0.0], "a.pdf", 2),
                insert(3, vec![1.0, 0.0], "b.pdf", 1),
            ])
            .unwrap();

        let err = index
            .replace_source("a.pdf", &[insert(4, vec![1.0, 0.0, 0.0], "a.pdf", 1)])
            .unwrap_err();
        assert!(matches!(err, DbError::DimensionMismatch { .. }));
        assert_eq!(index.len().unwrap(), 3);

        assert_eq!(
            index
                .replace_source("a.pdf", &[insert(4, vec![0.0, 1.0], "a.pdf", 1)])
                .unwrap(),
            2
        );
        let ids: Vec<u64> = index.scan(None).unwrap().iter().map(|r| r.id.value()).collect();
        assert_eq!(ids, vec![4, 3]);
    }

    #[test]
    fn test_query_with_filter() {
        let index = InMemoryVectorIndex::new(2, VectorMetric::Dot);
        index
            .upsert(&[
                insert(1, vec![1.0, 0.0], "a.pdf", 1),
                insert(2, vec![1.0, 0.0], "b.pdf", 1),
            ])
            .unwrap();

        let filter = VectorSearchFilter::new().with_source("b.pdf");
        let results = index.query(&[1.0, 0.0], 10, Some(&filter)).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].source, "b.pdf");
    }
}
