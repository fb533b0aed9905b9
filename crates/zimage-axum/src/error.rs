//! Axum-specific error types and mappings.
//!
//! Maps `GenerationError` to HTTP status codes. Error bodies use the
//! `{"detail": "..."}` shape clients of this API already expect.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;
use zimage_core::GenerationError;

/// Axum-specific error type.
#[derive(Debug, Error)]
pub enum HttpError {
    /// Request parameters out of range or malformed.
    #[error("{0}")]
    Unprocessable(String),

    /// Resource not found.
    #[error("{0}")]
    NotFound(String),

    /// Internal server error.
    #[error("{0}")]
    Internal(String),
}

impl HttpError {
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Unprocessable(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// JSON error response body.
#[derive(Serialize)]
struct ErrorBody {
    detail: String,
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ErrorBody {
            detail: self.to_string(),
        };
        (status, axum::Json(body)).into_response()
    }
}

impl From<GenerationError> for HttpError {
    fn from(err: GenerationError) -> Self {
        match err {
            GenerationError::Validation(e) => Self::Unprocessable(e.to_string()),
            GenerationError::EngineLoad(e) => Self::Internal(format!("Model not available: {e}")),
            GenerationError::Inference(e) => Self::Internal(format!("Generation failed: {e}")),
            GenerationError::Storage(e) => Self::Internal(format!("Failed to store image: {e}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use zimage_core::ports::{EngineLoadError, InferenceError};
    use zimage_core::ValidationError;

    #[test]
    fn test_generation_errors_map_to_status() {
        let cases = [
            (
                GenerationError::from(ValidationError::EmptyPrompt),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                GenerationError::from(EngineLoadError::ModelNotFound("/m.gguf".into())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                GenerationError::from(InferenceError::OutOfMemory("vram".into())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(HttpError::from(err).status(), status);
        }
    }
}
