//! Vector index module for docqa-db.
//!
//! This module provides the passage store behind docqa's retriever.
//!
//! ## Available Backends
//!
//! - `jsonl` (default): File-based backend, linear scan, persisted on every write
//! - `memory`: Process-local backend, nothing touches disk
//!
//! ## Usage
//!
//! ```ignore
//! use docqa_db::vector::{VectorIndexConfig, open_vector_index};
//!
//! let config = VectorIndexConfig::new(384, "/path/to/index");
//! let index = open_vector_index(&config)?;
//!
//! // Replace a document's chunks in one write
//! index.replace_source("contract.pdf", &inserts)?;
//!
//! // Query similar passages
//! let results = index.query(&embedding, 4, None)?;
//! ```

mod backend;
mod config;
mod metadata;
mod traits;

pub use config::{IndexManifest, VectorIndexConfig, DEFAULT_BACKEND, MANIFEST_FILENAME};
pub use metadata::VectorSearchFilter;
pub use traits::{
    ScoreKind, VectorId, VectorIndexBackend, VectorInsert, VectorMetric, VectorRecord,
    VectorSearchResult,
};

pub use backend::{available_backends, open_vector_index, InMemoryVectorIndex};

#[cfg(feature = "jsonl")]
pub use backend::JsonlVectorIndex;
