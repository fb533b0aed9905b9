//! Request-level error taxonomy.

use serde::Serialize;
use thiserror::Error;

use crate::domain::ValidationError;
use crate::ports::{EngineLoadError, InferenceError};
use crate::storage::StorageError;

/// Everything a generation request can fail with.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    EngineLoad(#[from] EngineLoadError),

    #[error(transparent)]
    Inference(#[from] InferenceError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Stable classification of [`GenerationError`] for adapters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationErrorKind {
    Validation,
    EngineLoad,
    Inference,
    Storage,
}

impl GenerationError {
    pub const fn kind(&self) -> GenerationErrorKind {
        match self {
            Self::Validation(_) => GenerationErrorKind::Validation,
            Self::EngineLoad(_) => GenerationErrorKind::EngineLoad,
            Self::Inference(_) => GenerationErrorKind::Inference,
            Self::Storage(_) => GenerationErrorKind::Storage,
        }
    }

    /// True when the caller sent something invalid, as opposed to a server-side failure.
    pub const fn is_client_error(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}
