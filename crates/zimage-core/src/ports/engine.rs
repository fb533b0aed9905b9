//! Inference engine ports.
//!
//! The diffusion sampler itself lives outside this workspace. These traits
//! describe the only two things the core needs from it: constructing a
//! ready-to-use engine from a model location and device, and turning
//! resolved parameters into one raster image.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{Device, ResolvedParameters};

/// In-memory raster produced by an engine.
pub type RasterImage = image::DynamicImage;

/// Everything a loader needs to construct an engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineSpec {
    /// Model weights location.
    pub model_path: PathBuf,
    /// Target device.
    pub device: Device,
}

impl EngineSpec {
    pub fn new(model_path: impl Into<PathBuf>, device: Device) -> Self {
        Self {
            model_path: model_path.into(),
            device,
        }
    }
}

/// Errors raised while constructing an engine.
///
/// Cloneable so the model manager can hand the same structural failure to
/// every later caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineLoadError {
    /// Nothing exists at the configured model location.
    #[error("model not found at {}", .0.display())]
    ModelNotFound(PathBuf),

    /// Something exists at the model location but cannot be used.
    #[error("invalid model at {}: {reason}", path.display())]
    InvalidModel { path: PathBuf, reason: String },

    /// The engine cannot run on the requested device.
    #[error("device {device} is not supported: {reason}")]
    UnsupportedDevice { device: Device, reason: String },

    /// The engine backend itself is missing or broken.
    #[error("inference backend unavailable: {0}")]
    BackendUnavailable(String),

    /// Construction ran out of memory or another finite resource.
    #[error("resource exhausted while loading model: {0}")]
    ResourceExhausted(String),

    /// Any other construction failure.
    #[error("failed to load model: {0}")]
    Failed(String),
}

impl EngineLoadError {
    /// Returns true if retrying with the same configuration will fail the
    /// same way.
    #[must_use]
    pub const fn is_structural(&self) -> bool {
        matches!(
            self,
            Self::ModelNotFound(_)
                | Self::InvalidModel { .. }
                | Self::UnsupportedDevice { .. }
                | Self::BackendUnavailable(_)
        )
    }
}

/// Errors raised by a single engine invocation.
#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("engine ran out of memory: {0}")]
    OutOfMemory(String),

    /// The engine can no longer serve requests; the handle will be rebuilt.
    #[error("engine unavailable: {0}")]
    EngineUnavailable(String),

    /// The engine finished but its output could not be read as an image.
    #[error("engine produced invalid output: {0}")]
    InvalidOutput(String),

    #[error("inference failed: {0}")]
    Failed(String),
}

/// A constructed, ready-to-invoke image generation engine.
#[async_trait]
pub trait ImageEngine: Send + Sync + fmt::Debug {
    /// Produce one image for `params`.
    ///
    /// With `params.seed` set, the same parameters must yield the same
    /// pixels for a fixed engine, device and version.
    async fn generate(&self, params: &ResolvedParameters) -> Result<RasterImage, InferenceError>;

    /// Device this engine was constructed for.
    fn device(&self) -> Device;

    /// Whether concurrent `generate` calls are safe on this engine.
    ///
    /// Defaults to `false`: callers serialise invocations.
    fn supports_concurrent_invocation(&self) -> bool {
        false
    }

    /// Whether the engine can still serve requests.
    ///
    /// Checked after a failed invocation; `false` makes the model manager
    /// drop the handle and construct a new one on the next request.
    fn is_usable(&self) -> bool {
        true
    }
}

/// Constructs engines. Called at most once per successful load.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EngineLoader: Send + Sync + fmt::Debug {
    async fn load(&self, spec: &EngineSpec) -> Result<Arc<dyn ImageEngine>, EngineLoadError>;
}
