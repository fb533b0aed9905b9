//! `EngineLoader` for stable-diffusion.cpp.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};
use zimage_core::ServiceConfig;
use zimage_core::domain::Device;
use zimage_core::ports::{EngineLoadError, EngineLoader, EngineSpec, ImageEngine};

use super::engine::SdCppEngine;
use super::validate::{check_model_file, resolve_binary, validate_binary};
use crate::system::detect_gpu_info;

/// Builds [`SdCppEngine`]s after checking the model, device and binary.
#[derive(Debug, Clone, Default)]
pub struct SdCppLoader {
    binary: Option<PathBuf>,
    extra_args: Vec<String>,
    scratch_dir: Option<PathBuf>,
}

impl SdCppLoader {
    /// Use `binary` (a path or a name on `PATH`); `None` looks up `sd`.
    pub fn new(binary: Option<PathBuf>) -> Self {
        Self {
            binary,
            ..Self::default()
        }
    }

    pub fn from_config(config: &ServiceConfig) -> Self {
        Self::new(config.sd_binary.clone()).with_extra_args(config.sd_extra_args.clone())
    }

    #[must_use]
    pub fn with_extra_args(mut self, args: Vec<String>) -> Self {
        self.extra_args = args;
        self
    }

    /// Directory for in-flight engine output. Defaults to a `zimage`
    /// directory under the system temp dir.
    #[must_use]
    pub fn with_scratch_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.scratch_dir = Some(dir.into());
        self
    }

    fn scratch_dir(&self) -> PathBuf {
        self.scratch_dir
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join("zimage"))
    }
}

#[async_trait]
impl EngineLoader for SdCppLoader {
    async fn load(&self, spec: &EngineSpec) -> Result<Arc<dyn ImageEngine>, EngineLoadError> {
        check_model_file(&spec.model_path).await?;

        if spec.device == Device::Gpu {
            let gpu = tokio::task::spawn_blocking(detect_gpu_info)
                .await
                .map_err(|e| EngineLoadError::Failed(format!("GPU detection failed: {e}")))?;
            if !gpu.has_gpu() {
                return Err(EngineLoadError::UnsupportedDevice {
                    device: spec.device,
                    reason: "no NVIDIA or Metal GPU detected".into(),
                });
            }
            debug!(target: "zimage.engine", ?gpu, "GPU detected");
        }

        let binary = resolve_binary(self.binary.as_deref())?;
        validate_binary(&binary).await?;

        let scratch_dir = self.scratch_dir();
        tokio::fs::create_dir_all(&scratch_dir).await.map_err(|e| {
            EngineLoadError::Failed(format!(
                "cannot create scratch directory {}: {e}",
                scratch_dir.display()
            ))
        })?;

        info!(
            target: "zimage.engine",
            binary = %binary.display(),
            device = %spec.device,
            "Using stable-diffusion.cpp"
        );

        Ok(Arc::new(SdCppEngine::new(
            binary,
            spec.model_path.clone(),
            spec.device,
            self.extra_args.clone(),
            scratch_dir,
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_missing_model_reported_before_binary() {
        let dir = tempdir().unwrap();
        let model = dir.path().join("z-image-turbo.gguf");
        let loader = SdCppLoader::new(Some("/nonexistent/sd".into()));

        let err = loader
            .load(&EngineSpec::new(&model, Device::Cpu))
            .await
            .unwrap_err();
        assert_eq!(err, EngineLoadError::ModelNotFound(model));
    }

    #[tokio::test]
    async fn test_broken_binary_is_backend_unavailable() {
        let dir = tempdir().unwrap();
        let model = dir.path().join("z.safetensors");
        std::fs::write(&model, b"{}").unwrap();
        let loader = SdCppLoader::new(Some("/nonexistent/sd".into()));

        let err = loader
            .load(&EngineSpec::new(&model, Device::Cpu))
            .await
            .unwrap_err();
        assert!(matches!(err, EngineLoadError::BackendUnavailable(_)));
        assert!(err.is_structural());
    }

    #[test]
    fn test_from_config_carries_binary_and_args() {
        let config = ServiceConfig::from_lookup(|key| match key {
            "SD_BINARY" => Some("sd-cuda".into()),
            "SD_EXTRA_ARGS" => Some("--vae ae.safetensors".into()),
            _ => None,
        })
        .unwrap();
        let loader = SdCppLoader::from_config(&config);
        assert_eq!(loader.binary, Some(PathBuf::from("sd-cuda")));
        assert_eq!(loader.extra_args, ["--vae", "ae.safetensors"]);
    }
}
