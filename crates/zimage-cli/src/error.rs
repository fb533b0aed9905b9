//! CLI-specific error types and mappings.
//!
//! Maps configuration and generation failures to exit codes and
//! user-facing messages.

use thiserror::Error;
use zimage_core::ports::EngineLoadError;
use zimage_core::{ConfigError, GenerationError, StorageError};

/// CLI-specific error type.
#[derive(Debug, Error)]
pub enum CliError {
    /// Invalid command-line arguments or generation parameters.
    #[error("Invalid arguments: {0}")]
    Arguments(String),

    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The model or the inference backend cannot be used.
    #[error("Model not available: {0}")]
    Unavailable(String),

    /// The output directory cannot be used.
    #[error("IO error: {0}")]
    Io(String),

    /// Generation failed, or the server stopped with an error.
    #[error("{0}")]
    Failed(String),
}

impl CliError {
    /// Map error to appropriate exit code.
    ///
    /// Codes follow sysexits.h where one fits:
    /// - 1: General error
    /// - 2: Invalid arguments
    /// - 69: EX_UNAVAILABLE
    /// - 74: EX_IOERR
    /// - 78: EX_CONFIG
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Failed(_) => 1,
            Self::Arguments(_) => 2,
            Self::Unavailable(_) => 69,
            Self::Io(_) => 74,
            Self::Config(_) => 78,
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<EngineLoadError> for CliError {
    fn from(err: EngineLoadError) -> Self {
        Self::Unavailable(err.to_string())
    }
}

impl From<StorageError> for CliError {
    fn from(err: StorageError) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<GenerationError> for CliError {
    fn from(err: GenerationError) -> Self {
        match err {
            GenerationError::Validation(e) => Self::Arguments(e.to_string()),
            GenerationError::EngineLoad(e) => e.into(),
            GenerationError::Storage(e) => e.into(),
            GenerationError::Inference(e) => Self::Failed(format!("Generation failed: {e}")),
        }
    }
}
