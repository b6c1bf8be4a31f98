//! Vector index backend implementations.
//!
//! ## Available Backends
//!
//! - `jsonl` (default): file-based, persisted on every write
//! - `memory`: process-local, used for tests and throwaway sessions

#[cfg(feature = "jsonl")]
mod jsonl;
mod memory;

#[cfg(feature = "jsonl")]
pub use jsonl::JsonlVectorIndex;
pub use memory::InMemoryVectorIndex;

use super::config::VectorIndexConfig;
use super::traits::VectorIndexBackend;
use crate::error::{DbError, DbResult};
use std::sync::Arc;
use tracing::debug;

/// Open a vector index with the given configuration.
///
/// Persistent backends create the index on first open and reject an existing
/// one built with another dimension or metric.
///
/// # Errors
///
/// Returns an error if:
/// - The index exists but is incompatible
/// - The backend is not supported
/// - The index cannot be created or opened
pub fn open_vector_index(config: &VectorIndexConfig) -> DbResult<Arc<dyn VectorIndexBackend>> {
    debug!("Opening {} vector index at {:?}", config.backend, config.path);

    match config.backend.as_str() {
        "memory" => Ok(Arc::new(InMemoryVectorIndex::open(config))),

        #[cfg(feature = "jsonl")]
        "jsonl" => Ok(Arc::new(JsonlVectorIndex::open(config)?)),

        backend => Err(DbError::BackendUnavailable {
            backend: backend.to_string(),
            available: available_backends().join(", "),
        }),
    }
}

/// Get a list of available backend names.
#[allow(clippy::vec_init_then_push)]
pub fn available_backends() -> Vec<&'static str> {
    let mut backends = Vec::new();

    #[cfg(feature = "jsonl")]
    backends.push("jsonl");

    backends.push("memory");

    backends
}
