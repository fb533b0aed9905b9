#![doc = include_str!("../README.md")]
#![deny(unused_crate_dependencies)]

pub mod config;
pub mod domain;
pub mod error;
pub mod paths;
pub mod ports;
pub mod services;
pub mod storage;

// Re-export commonly used types for convenience
pub use config::{ConfigError, ServiceConfig};
pub use domain::{
    Device, GeneratedArtifact, GenerationDefaults, GenerationParameters, ParameterLimits,
    ResolvedParameters, ValidationError,
};
pub use error::{GenerationError, GenerationErrorKind};
pub use ports::{EngineLoadError, EngineLoader, EngineSpec, ImageEngine, InferenceError, RasterImage};
pub use services::{GenerationService, ModelManager};
pub use storage::{ArtifactStore, EvictionReport, StorageError};

// Only used by the integration tests under tests/
#[cfg(test)]
use sha2 as _;
