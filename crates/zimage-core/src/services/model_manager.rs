//! Process-wide engine handle.
//!
//! The engine is expensive to construct, so it is built lazily and exactly
//! once: concurrent first callers wait on the same construction instead of
//! starting their own. Invocations are serialised in arrival order unless
//! the engine says it can run them concurrently.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Instant;

use tokio::sync::Mutex;
use tracing::{error, info, warn};

use crate::domain::{Device, ResolvedParameters};
use crate::error::GenerationError;
use crate::ports::{EngineLoadError, EngineLoader, EngineSpec, ImageEngine, RasterImage};

/// Owns the engine handle and the policy around constructing and invoking it.
pub struct ModelManager {
    loader: Arc<dyn EngineLoader>,
    spec: EngineSpec,
    /// Ready handle; read-locked on the fast path.
    engine: RwLock<Option<Arc<dyn ImageEngine>>>,
    /// Held for the duration of a load. Caches structural load failures.
    load: Mutex<Option<EngineLoadError>>,
    /// FIFO queue for engines that cannot run concurrently.
    invoke: Mutex<()>,
    loads: AtomicUsize,
}

impl std::fmt::Debug for ModelManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelManager")
            .field("spec", &self.spec)
            .field("ready", &self.is_ready())
            .field("loads", &self.load_count())
            .finish_non_exhaustive()
    }
}

impl ModelManager {
    pub fn new(loader: Arc<dyn EngineLoader>, spec: EngineSpec) -> Self {
        Self {
            loader,
            spec,
            engine: RwLock::new(None),
            load: Mutex::new(None),
            invoke: Mutex::new(()),
            loads: AtomicUsize::new(0),
        }
    }

    /// Construct the engine if it is not constructed yet.
    ///
    /// Idempotent. A structural failure is returned unchanged on every later
    /// call without retrying; a transient failure lets the next call retry.
    pub async fn ensure_ready(&self) -> Result<(), EngineLoadError> {
        self.engine().await.map(|_| ())
    }

    /// Run one generation on the engine, constructing it first if needed.
    pub async fn invoke(&self, params: &ResolvedParameters) -> Result<RasterImage, GenerationError> {
        let engine = self.engine().await?;

        let _turn = if engine.supports_concurrent_invocation() {
            None
        } else {
            Some(self.invoke.lock().await)
        };

        match engine.generate(params).await {
            Ok(image) => Ok(image),
            Err(e) => {
                if !engine.is_usable() {
                    warn!(
                        target: "zimage.model",
                        error = %e,
                        "Engine is no longer usable, it will be reloaded on the next request"
                    );
                    self.discard(&engine);
                }
                Err(e.into())
            }
        }
    }

    /// Whether a constructed engine is currently held.
    pub fn is_ready(&self) -> bool {
        self.current().is_some()
    }

    /// Device the engine was requested for.
    pub const fn device(&self) -> Device {
        self.spec.device
    }

    pub fn model_path(&self) -> &Path {
        &self.spec.model_path
    }

    /// Number of times the loader has been called.
    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    async fn engine(&self) -> Result<Arc<dyn ImageEngine>, EngineLoadError> {
        if let Some(engine) = self.current() {
            return Ok(engine);
        }

        let mut cached = self.load.lock().await;

        // Another caller may have finished loading while we waited.
        if let Some(engine) = self.current() {
            return Ok(engine);
        }
        if let Some(err) = cached.as_ref() {
            return Err(err.clone());
        }

        info!(
            target: "zimage.model",
            model = %self.spec.model_path.display(),
            device = %self.spec.device,
            "Loading Z-Image-Turbo model"
        );
        let started = Instant::now();
        self.loads.fetch_add(1, Ordering::SeqCst);

        match self.loader.load(&self.spec).await {
            Ok(engine) => {
                info!(
                    target: "zimage.model",
                    device = %engine.device(),
                    "Model loaded successfully in {:.1}s",
                    started.elapsed().as_secs_f64()
                );
                *self.engine.write().unwrap_or_else(PoisonError::into_inner) = Some(Arc::clone(&engine));
                Ok(engine)
            }
            Err(e) => {
                error!(target: "zimage.model", error = %e, "Failed to load model");
                if e.is_structural() {
                    *cached = Some(e.clone());
                }
                Err(e)
            }
        }
    }

    fn current(&self) -> Option<Arc<dyn ImageEngine>> {
        self.engine
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn discard(&self, engine: &Arc<dyn ImageEngine>) {
        let mut slot = self.engine.write().unwrap_or_else(PoisonError::into_inner);
        if slot.as_ref().is_some_and(|held| Arc::ptr_eq(held, engine)) {
            *slot = None;
        }
    }
}
