//! Generation service - one request from raw parameters to a stored PNG.

use std::io::Cursor;
use std::path::PathBuf;
use std::sync::Arc;

use bytes::Bytes;
use chrono::Local;
use image::ImageFormat;
use tracing::{error, info, warn};

use super::ModelManager;
use crate::domain::{
    GeneratedArtifact, GenerationDefaults, GenerationParameters, ParameterLimits,
    artifact_filename,
};
use crate::error::GenerationError;
use crate::ports::{EngineLoadError, RasterImage};
use crate::storage::{ArtifactStore, StorageError};

/// Orchestrates validation, inference, persistence and eviction.
///
/// Holds no global state: the model manager and the store are injected, so
/// several services (or tests) can share or isolate them freely.
#[derive(Debug, Clone)]
pub struct GenerationService {
    models: Arc<ModelManager>,
    store: Arc<ArtifactStore>,
    defaults: GenerationDefaults,
    limits: ParameterLimits,
}

impl GenerationService {
    pub fn new(
        models: Arc<ModelManager>,
        store: Arc<ArtifactStore>,
        defaults: GenerationDefaults,
    ) -> Self {
        Self {
            models,
            store,
            defaults,
            limits: ParameterLimits::default(),
        }
    }

    /// Generate and persist one image.
    ///
    /// Validation happens before the engine is touched. Once the artifact is
    /// written, the request succeeds regardless of what the eviction pass
    /// that follows runs into.
    pub async fn generate(
        &self,
        raw: GenerationParameters,
    ) -> Result<GeneratedArtifact, GenerationError> {
        let result = self.run(raw).await;
        if let Err(e) = &result {
            error!(kind = ?e.kind(), "Generation failed: {e}");
        }
        result
    }

    async fn run(&self, raw: GenerationParameters) -> Result<GeneratedArtifact, GenerationError> {
        raw.validate(&self.limits)?;
        let params = raw.resolve(&self.defaults);

        info!("Generating image: {}", params.prompt_preview());
        info!("Parameters: {params}");

        self.models.ensure_ready().await?;
        let image = self.models.invoke(&params).await?;

        let png = encode_png(image).await?;
        let created_at = Local::now();
        let filename = artifact_filename(&created_at);
        let path = self.store.write_png(&filename, &png).await?;
        info!("Image saved: {filename}");

        self.evict_keeping(&filename).await;

        Ok(GeneratedArtifact {
            filename,
            path,
            params,
            png,
            created_at,
        })
    }

    /// Load the engine ahead of the first request.
    pub async fn warm_up(&self) -> Result<(), EngineLoadError> {
        self.models.ensure_ready().await
    }

    pub fn is_ready(&self) -> bool {
        self.models.is_ready()
    }

    /// Path of a previously generated artifact, if it is still stored.
    pub async fn resolve_path(&self, filename: &str) -> Option<PathBuf> {
        self.store.resolve_path(filename).await
    }

    pub fn models(&self) -> &ModelManager {
        &self.models
    }

    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    async fn evict_keeping(&self, filename: &str) {
        match self.store.evict(Some(filename)).await {
            Ok(report) if report.failed > 0 => warn!(
                removed = report.removed.len(),
                failed = report.failed,
                "Eviction pass could not delete every old image"
            ),
            Ok(_) => {}
            Err(e) => warn!("Eviction pass skipped: {e}"),
        }
    }
}

async fn encode_png(image: RasterImage) -> Result<Bytes, StorageError> {
    tokio::task::spawn_blocking(move || {
        let mut buf = Cursor::new(Vec::new());
        image
            .write_to(&mut buf, ImageFormat::Png)
            .map_err(|e| StorageError::Encode(e.to_string()))?;
        Ok(Bytes::from(buf.into_inner()))
    })
    .await
    .map_err(|e| StorageError::Encode(format!("encoder task failed: {e}")))?
}
