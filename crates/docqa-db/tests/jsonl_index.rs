//! Integration tests for the JSONL vector backend and index factory.

use docqa_db::vector::{
    open_vector_index, IndexManifest, ScoreKind, VectorIndexConfig, VectorInsert, VectorMetric,
    VectorSearchFilter, MANIFEST_FILENAME,
};
use docqa_db::DbError;

fn passage(id: u64, vector: Vec<f32>, source: &str, chunk: u32) -> VectorInsert {
    VectorInsert::new(id, vector, format!("{} chunk {}", source, chunk), source)
        .with_chunk_index(chunk)
        .with_payload(serde_json::json!({ "totalChunks": 2 }))
}

#[test]
fn persists_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let config = VectorIndexConfig::new(3, dir.path().join("index"));

    {
        let index = open_vector_index(&config).unwrap();
        index
            .upsert(&[
                passage(1, vec![1.0, 0.0, 0.0], "lease.pdf", 1),
                passage(2, vec![0.0, 1.0, 0.0], "lease.pdf", 2),
            ])
            .unwrap();
    }

    let reopened = open_vector_index(&config).unwrap();
    assert_eq!(reopened.len().unwrap(), 2);

    let results = reopened.query(&[0.0, 1.0, 0.0], 1, None).unwrap();
    assert_eq!(results[0].text, "lease.pdf chunk 2");
    assert_eq!(results[0].chunk_index, Some(2));
    assert_eq!(results[0].payload["totalChunks"], 2);

    let manifest = IndexManifest::load(&config.path).unwrap().unwrap();
    assert_eq!(manifest.dimension, 3);
    assert_eq!(manifest.score_kind, ScoreKind::Similarity);
    assert_eq!(manifest.count, 2);
}

#[test]
fn delete_by_source_replaces_stale_chunks() {
    let dir = tempfile::tempdir().unwrap();
    let config = VectorIndexConfig::new(2, dir.path());
    let index = open_vector_index(&config).unwrap();

    index
        .upsert(&[
            passage(1, vec![1.0, 0.0], "nda.pdf", 1),
            passage(2, vec![1.0, 0.0], "msa.pdf", 1),
        ])
        .unwrap();
    assert_eq!(index.delete_by_source("nda.pdf").unwrap(), 1);
    index.upsert(&[passage(3, vec![0.0, 1.0], "nda.pdf", 1)]).unwrap();

    let nda = index
        .scan(Some(&VectorSearchFilter::new().with_source("nda.pdf")))
        .unwrap();
    assert_eq!(nda.len(), 1);
    assert_eq!(nda[0].id.value(), 3);

    drop(index);
    let reopened = open_vector_index(&config).unwrap();
    assert_eq!(reopened.len().unwrap(), 2);
}

#[test]
fn failed_replace_keeps_old_chunks_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let config = VectorIndexConfig::new(2, dir.path());
    let index = open_vector_index(&config).unwrap();
    index
        .upsert(&[
            passage(1, vec![1.0, 0.0], "nda.pdf", 1),
            passage(2, vec![0.0, 1.0], "nda.pdf", 2),
        ])
        .unwrap();

    let err = index
        .replace_source("nda.pdf", &[passage(3, vec![1.0, 0.0, 0.0], "nda.pdf", 1)])
        .unwrap_err();
    assert!(matches!(err, DbError::DimensionMismatch { .. }));
    drop(index);

    let reopened = open_vector_index(&config).unwrap();
    let ids: Vec<u64> = reopened.scan(None).unwrap().iter().map(|r| r.id.value()).collect();
    assert_eq!(ids, vec![1, 2]);
}

#[test]
fn replace_source_swaps_chunks_in_one_write() {
    let dir = tempfile::tempdir().unwrap();
    let config = VectorIndexConfig::new(2, dir.path());
    let index = open_vector_index(&config).unwrap();
    index
        .upsert(&[
            passage(1, vec![1.0, 0.0], "nda.pdf", 1),
            passage(2, vec![1.0, 0.0], "nda.pdf", 2),
            passage(3, vec![1.0, 0.0], "msa.pdf", 1),
        ])
        .unwrap();

    let removed = index
        .replace_source("nda.pdf", &[passage(4, vec![0.0, 1.0], "nda.pdf", 1)])
        .unwrap();
    assert_eq!(removed, 2);
    drop(index);

    let reopened = open_vector_index(&config).unwrap();
    let ids: Vec<u64> = reopened.scan(None).unwrap().iter().map(|r| r.id.value()).collect();
    assert_eq!(ids, vec![3, 4]);
    assert_eq!(IndexManifest::load(dir.path()).unwrap().unwrap().count, 2);
    assert!(!dir.path().join("vectors.jsonl.tmp").exists());
}

#[test]
fn reopen_with_other_dimension_fails() {
    let dir = tempfile::tempdir().unwrap();
    open_vector_index(&VectorIndexConfig::new(4, dir.path())).unwrap();

    let err = open_vector_index(&VectorIndexConfig::new(8, dir.path()))
        .err()
        .unwrap();
    assert!(matches!(
        err,
        DbError::DimensionMismatch {
            expected: 8,
            actual: 4
        }
    ));
}

#[test]
fn reopen_with_other_metric_fails() {
    let dir = tempfile::tempdir().unwrap();
    open_vector_index(&VectorIndexConfig::new(4, dir.path())).unwrap();

    let config = VectorIndexConfig::new(4, dir.path()).with_metric(VectorMetric::L2);
    let err = open_vector_index(&config).err().unwrap();
    assert!(matches!(err, DbError::IndexIncompatible { .. }));
}

#[test]
fn first_open_writes_manifest() {
    let dir = tempfile::tempdir().unwrap();
    let config = VectorIndexConfig::new(4, dir.path().join("fresh")).with_metric(VectorMetric::L2);
    let index = open_vector_index(&config).unwrap();
    assert!(index.is_empty().unwrap());

    let manifest = IndexManifest::load(&config.path).unwrap().unwrap();
    assert_eq!(manifest.metric, VectorMetric::L2);
    assert_eq!(manifest.score_kind, ScoreKind::Distance);
    assert!(config.path.join(MANIFEST_FILENAME).exists());
}

#[test]
fn memory_backend_leaves_no_files() {
    let dir = tempfile::tempdir().unwrap();
    let config = VectorIndexConfig::new(2, dir.path().join("mem")).with_backend("memory");
    let index = open_vector_index(&config).unwrap();
    index.upsert(&[passage(1, vec![1.0, 0.0], "a.pdf", 1)]).unwrap();
    index.flush().unwrap();

    assert_eq!(index.len().unwrap(), 1);
    assert!(!dir.path().join("mem").exists());
}
