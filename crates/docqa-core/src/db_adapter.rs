//! Adapter layer for docqa-db infrastructure.
//!
//! Maps `DbError` into [`DocQaError`] and provides the extension trait used
//! at every vector index call site.

use crate::errors::DocQaError;

// ============================================================================
// Error Conversion
// ============================================================================

/// Convert a docqa-db error to a docqa-core error.
pub fn from_db_error(err: docqa_db::DbError) -> DocQaError {
    use docqa_db::DbError;

    match err {
        DbError::Io(io_err) => DocQaError::Io(io_err),

        DbError::VectorIo { path, message } => DocQaError::VectorIndexIo { path, message },

        DbError::VectorParse { path, message } => DocQaError::VectorIndexParse { path, message },

        DbError::DimensionMismatch { expected, actual } => DocQaError::VectorIndexIncompatible {
            reason: format!(
                "Dimension mismatch: expected {}, got {}. Re-ingest after changing the embedding model.",
                expected, actual
            ),
        },

        DbError::IndexIncompatible { reason } => DocQaError::VectorIndexIncompatible { reason },

        DbError::BackendUnavailable { backend, available } => {
            DocQaError::VectorIndexBackendUnavailable {
                backend,
                reason: format!("available backends: {}", available),
            }
        }

        DbError::Json(json_err) => DocQaError::Json(json_err),

        DbError::Internal { message } => DocQaError::Other(anyhow::anyhow!(message)),
    }
}

/// Extension trait to convert `DbResult` into a docqa-core result.
pub trait IntoDocQaResult<T> {
    fn into_docqa_result(self) -> Result<T, DocQaError>;
}

impl<T> IntoDocQaResult<T> for docqa_db::DbResult<T> {
    fn into_docqa_result(self) -> Result<T, DocQaError> {
        self.map_err(from_db_error)
    }
}
