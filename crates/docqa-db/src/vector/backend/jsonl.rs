//! JSONL file vector index backend.
//!
//! Stores one passage per line in `vectors.jsonl` and searches by linear
//! scan. Every write replaces the file whole and refreshes the manifest
//! count, so the index is durable without an explicit flush.

use super::super::config::{write_replacing, IndexManifest, VectorIndexConfig};
use super::super::metadata::VectorSearchFilter;
use super::super::traits::{
    VectorId, VectorIndexBackend, VectorInsert, VectorMetric, VectorRecord, VectorSearchResult,
};
use super::memory::InMemoryVectorIndex;
use crate::error::DbResult;
use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Filename for the JSONL data file.
pub const DATA_FILENAME: &str = "vectors.jsonl";

/// File-backed vector index.
pub struct JsonlVectorIndex {
    path: PathBuf,
    inner: InMemoryVectorIndex,
}

impl JsonlVectorIndex {
    /// Open or create a JSONL vector index.
    ///
    /// An existing index must have been built with the configured dimension
    /// and metric.
    pub fn open(config: &VectorIndexConfig) -> DbResult<Self> {
        debug!("Opening JsonlVectorIndex at {:?}", config.path);

        match IndexManifest::load(&config.path)? {
            Some(manifest) => manifest.ensure_matches(config)?,
            None => {
                info!("Creating vector index at {:?}", config.path);
                IndexManifest::new(config.dimension, config.metric).save(&config.path)?;
            }
        }

        let index = Self {
            path: config.path.clone(),
            inner: InMemoryVectorIndex::new(config.dimension, config.metric),
        };

        let data_path = config.path.join(DATA_FILENAME);
        if data_path.exists() {
            index.load_from_file(&data_path)?;
        }

        Ok(index)
    }

    /// Load vectors from a JSONL file. Lines that fail to parse or carry the
    /// wrong dimension are skipped.
    fn load_from_file(&self, path: &Path) -> DbResult<()> {
        debug!("Loading vectors from {:?}", path);

        let reader = BufReader::new(File::open(path)?);
        let mut entries = Vec::new();

        for (line_num, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }

            match serde_json::from_str::<VectorInsert>(&line) {
                Ok(entry) if entry.vector.len() == self.inner.dimension() => entries.push(entry),
                Ok(entry) => {
                    debug!(
                        "Skipping line {}: dimension {} != {}",
                        line_num + 1,
                        entry.vector.len(),
                        self.inner.dimension()
                    );
                }
                Err(e) => {
                    debug!("Skipping invalid line {}: {}", line_num + 1, e);
                }
            }
        }

        debug!("Loaded {} vectors", entries.len());
        self.inner.load(entries)
    }

    /// Save everything currently held in memory.
    fn save_to_file(&self) -> DbResult<()> {
        let stored = self.inner.read()?;
        self.write_entries(stored.values().collect())
    }

    /// Replace the data file with `entries` and bump the manifest count.
    fn write_entries(&self, mut entries: Vec<&VectorInsert>) -> DbResult<()> {
        let data_path = self.path.join(DATA_FILENAME);
        debug!("Saving vectors to {:?}", data_path);
        fs::create_dir_all(&self.path)?;

        entries.sort_by_key(|e| e.id);
        let mut buf = Vec::new();
        for entry in &entries {
            serde_json::to_writer(&mut buf, entry)?;
            buf.push(b'\n');
        }
        write_replacing(&data_path, &buf)?;

        IndexManifest::new(self.inner.dimension(), self.inner.metric())
            .with_count(entries.len())
            .save(&self.path)?;

        debug!("Saved {} vectors", entries.len());
        Ok(())
    }
}

impl VectorIndexBackend for JsonlVectorIndex {
    fn query(
        &self,
        embedding: &[f32],
        limit: usize,
        filter: Option<&VectorSearchFilter>,
    ) -> DbResult<Vec<VectorSearchResult>> {
        self.inner.query(embedding, limit, filter)
    }

    fn upsert(&self, vectors: &[VectorInsert]) -> DbResult<()> {
        self.inner.upsert(vectors)?;
        self.save_to_file()
    }

    fn delete(&self, ids: &[VectorId]) -> DbResult<()> {
        self.inner.delete(ids)?;
        self.save_to_file()
    }

    fn delete_by_source(&self, source: &str) -> DbResult<usize> {
        let removed = self.inner.delete_by_source(source)?;
        if removed > 0 {
            self.save_to_file()?;
        }
        Ok(removed)
    }

    /// Writes the file before changing memory, under the write lock, so a
    /// failed write leaves both the file and the in-memory view as they were.
    fn replace_source(&self, source: &str, vectors: &[VectorInsert]) -> DbResult<usize> {
        self.inner.check_dimensions(vectors)?;

        let mut stored = self.inner.write()?;
        let incoming: HashSet<u64> = vectors.iter().map(|v| v.id.value()).collect();
        let removed = stored.values().filter(|v| v.source == source).count();
        let entries: Vec<&VectorInsert> = stored
            .values()
            .filter(|v| v.source != source && !incoming.contains(&v.id.value()))
            .chain(vectors.iter())
            .collect();
        self.write_entries(entries)?;

        stored.retain(|_, v| v.source != source);
        for insert in vectors {
            stored.insert(insert.id.value(), insert.clone());
        }
        Ok(removed)
    }

    fn scan(&self, filter: Option<&VectorSearchFilter>) -> DbResult<Vec<VectorRecord>> {
        self.inner.scan(filter)
    }

    fn flush(&self) -> DbResult<()> {
        self.save_to_file()
    }

    fn len(&self) -> DbResult<usize> {
        self.inner.len()
    }

    fn dimension(&self) -> usize {
        self.inner.dimension()
    }

    fn metric(&self) -> VectorMetric {
        self.inner.metric()
    }
}
