//! Adapter layer for docqa-model infrastructure.

use crate::errors::DocQaError;

/// Convert a docqa-model error to a docqa-core error.
pub fn from_model_error(err: docqa_model::ModelError) -> DocQaError {
    use docqa_model::ModelError;

    match err {
        ModelError::ProviderNotAvailable { provider, reason } => {
            DocQaError::EmbeddingProviderUnavailable { provider, reason }
        }

        ModelError::InvalidConfig { message } => DocQaError::InvalidConfiguration {
            message,
            hint: "Check the embedding/generation sections of config.yaml".to_string(),
        },

        ModelError::EmbeddingFailed { model_id, message } => {
            DocQaError::EmbeddingFailed { model_id, message }
        }

        ModelError::GenerationFailed { model_id, message } => DocQaError::GenerationUnavailable {
            message: format!("{}: {}", model_id, message),
        },

        ModelError::GenerationUnavailable { attempts, message } => {
            DocQaError::GenerationUnavailable {
                message: format!("{} (after {} attempt(s))", message, attempts),
            }
        }

        ModelError::Json(json_err) => DocQaError::Json(json_err),
    }
}

/// Extension trait to convert `ModelResult` into a docqa-core result.
pub trait IntoDocQaModelResult<T> {
    fn into_docqa_result(self) -> Result<T, DocQaError>;
}

impl<T> IntoDocQaModelResult<T> for docqa_model::ModelResult<T> {
    fn into_docqa_result(self) -> Result<T, DocQaError> {
        self.map_err(from_model_error)
    }
}
