//! Shared fixtures: a deterministic fake engine and a counting loader.

#![allow(dead_code)]

use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use image::{DynamicImage, RgbImage};
use sha2::{Digest, Sha256};

use zimage_core::domain::{Device, ResolvedParameters};
use zimage_core::ports::{EngineLoadError, EngineLoader, EngineSpec, ImageEngine, InferenceError};
use zimage_core::RasterImage;

/// Unseeded requests draw from here so they differ from each other.
static NONCE: AtomicI64 = AtomicI64::new(1);

/// Engine whose pixels are a SHA-256 stream over the prompt, parameters and seed.
#[derive(Debug, Default)]
pub struct HashEngine {
    pub calls: AtomicUsize,
}

#[async_trait]
impl ImageEngine for HashEngine {
    async fn generate(&self, params: &ResolvedParameters) -> Result<RasterImage, InferenceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let seed = params
            .seed
            .unwrap_or_else(|| i64::MIN + NONCE.fetch_add(1, Ordering::SeqCst));

        let mut hasher = Sha256::new();
        hasher.update(params.prompt.as_bytes());
        hasher.update(params.height.to_le_bytes());
        hasher.update(params.width.to_le_bytes());
        hasher.update(params.num_inference_steps.to_le_bytes());
        hasher.update(params.guidance_scale.to_bits().to_le_bytes());
        hasher.update(seed.to_le_bytes());
        let key = hasher.finalize();

        let row_len = params.width as usize * 3;
        let mut pixels = Vec::with_capacity(row_len * params.height as usize);
        for row in 0..params.height {
            let digest = Sha256::new()
                .chain_update(key)
                .chain_update(row.to_le_bytes())
                .finalize();
            pixels.extend(digest.iter().copied().cycle().take(row_len));
        }

        RgbImage::from_raw(params.width, params.height, pixels)
            .map(DynamicImage::ImageRgb8)
            .ok_or_else(|| InferenceError::InvalidOutput("buffer size mismatch".into()))
    }

    fn device(&self) -> Device {
        Device::Cpu
    }
}

/// Loader that counts calls and can be told to fail.
#[derive(Debug, Default)]
pub struct CountingLoader {
    pub engine: Arc<HashEngine>,
    pub loads: AtomicUsize,
    pub fail_with: Mutex<Option<EngineLoadError>>,
    pub delay: Duration,
}

impl CountingLoader {
    pub fn failing(err: EngineLoadError) -> Self {
        Self {
            fail_with: Mutex::new(Some(err)),
            ..Self::default()
        }
    }

    pub fn slow(delay: Duration) -> Self {
        Self {
            delay,
            ..Self::default()
        }
    }

    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EngineLoader for CountingLoader {
    async fn load(&self, _spec: &EngineSpec) -> Result<Arc<dyn ImageEngine>, EngineLoadError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if let Some(err) = self.fail_with.lock().unwrap().clone() {
            return Err(err);
        }
        Ok(Arc::clone(&self.engine) as Arc<dyn ImageEngine>)
    }
}
