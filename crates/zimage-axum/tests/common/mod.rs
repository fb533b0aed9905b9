//! Router fixtures backed by an in-process fake engine.

#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use image::{DynamicImage, RgbImage};
use zimage_axum::{CorsConfig, bootstrap_with_loader, create_router};
use zimage_core::ServiceConfig;
use zimage_core::domain::{Device, ResolvedParameters};
use zimage_core::ports::{
    EngineLoadError, EngineLoader, EngineSpec, ImageEngine, InferenceError, RasterImage,
};

/// Fills the image with a colour derived from the seed.
#[derive(Debug)]
pub struct SolidEngine;

#[async_trait]
impl ImageEngine for SolidEngine {
    async fn generate(&self, params: &ResolvedParameters) -> Result<RasterImage, InferenceError> {
        if params.prompt.contains("explode") {
            return Err(InferenceError::Failed("sampler diverged".into()));
        }
        let [r, g, b, ..] = params.seed.unwrap_or(0).to_le_bytes();
        Ok(DynamicImage::ImageRgb8(RgbImage::from_pixel(
            params.width,
            params.height,
            image::Rgb([r, g, b]),
        )))
    }

    fn device(&self) -> Device {
        Device::Cpu
    }
}

#[derive(Debug)]
pub enum FakeLoader {
    Ready,
    Missing,
}

#[async_trait]
impl EngineLoader for FakeLoader {
    async fn load(&self, spec: &EngineSpec) -> Result<Arc<dyn ImageEngine>, EngineLoadError> {
        match self {
            Self::Ready => Ok(Arc::new(SolidEngine)),
            Self::Missing => Err(EngineLoadError::ModelNotFound(spec.model_path.clone())),
        }
    }
}

pub fn config(output_dir: &Path, extra: &[(&str, &str)]) -> ServiceConfig {
    let output_dir = output_dir.display().to_string();
    ServiceConfig::from_lookup(|key| {
        if key == "OUTPUT_DIR" {
            return Some(output_dir.clone());
        }
        extra
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| (*v).to_string())
    })
    .unwrap()
}

pub fn router(config: &ServiceConfig, loader: FakeLoader) -> Router {
    let ctx = bootstrap_with_loader(config, Arc::new(loader)).unwrap();
    create_router(ctx, &CorsConfig::AllowAll)
}
