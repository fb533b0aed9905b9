//! Axum server bootstrap - the composition root.
//!
//! This module is the only place where infrastructure is wired together for
//! the web adapter. The stable-diffusion.cpp loader is chosen here; handlers
//! only ever see the generation service.

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tracing::{error, info};
use zimage_core::ports::EngineLoader;
use zimage_core::{ArtifactStore, GenerationService, ModelManager, ServiceConfig};
use zimage_runtime::SdCppLoader;

/// CORS configuration for the web server.
#[derive(Debug, Clone, Default)]
pub enum CorsConfig {
    /// Allow all origins.
    #[default]
    AllowAll,
    /// Allow specific origins.
    AllowOrigins(Vec<String>),
}

/// Server configuration for the Axum adapter.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Load the engine before accepting requests; a load failure aborts startup.
    pub warm_up: bool,
    pub cors: CorsConfig,
}

impl ServerConfig {
    pub fn from_service_config(config: &ServiceConfig) -> Self {
        Self {
            host: config.host.clone(),
            port: config.port,
            warm_up: true,
            cors: config
                .cors_origins
                .clone()
                .map_or(CorsConfig::AllowAll, CorsConfig::AllowOrigins),
        }
    }

    #[must_use]
    pub const fn with_warm_up(mut self, warm_up: bool) -> Self {
        self.warm_up = warm_up;
        self
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Application context for the Axum adapter.
#[derive(Debug)]
pub struct AxumContext {
    pub generation: GenerationService,
    /// `PUBLIC_BASE_URL`, when configured.
    pub public_base_url: Option<String>,
    /// Used for image URLs when neither a public base URL nor a `Host`
    /// header is available.
    pub fallback_base_url: String,
}

impl AxumContext {
    pub fn new(generation: GenerationService, config: &ServiceConfig) -> Self {
        Self {
            generation,
            public_base_url: config.public_base_url.clone(),
            fallback_base_url: format!("http://{}", config.bind_addr()),
        }
    }
}

/// Bootstrap the service with the stable-diffusion.cpp engine.
pub fn bootstrap(config: &ServiceConfig) -> Result<AxumContext> {
    let loader = Arc::new(SdCppLoader::from_config(config));
    bootstrap_with_loader(config, loader)
}

/// Bootstrap the service with any engine loader.
///
/// Opens the artifact store; does not load the engine.
pub fn bootstrap_with_loader(
    config: &ServiceConfig,
    loader: Arc<dyn EngineLoader>,
) -> Result<AxumContext> {
    info!(
        target: "zimage.paths",
        model_path = %config.model_path.display(),
        output_dir = %config.output_dir.display(),
        device = %config.device,
        max_stored_images = config.max_stored_images,
        "Axum bootstrap resolved paths"
    );

    let store = ArtifactStore::open(&config.output_dir, config.max_stored_images)
        .with_context(|| format!("cannot use output directory {}", config.output_dir.display()))?;
    let models = ModelManager::new(loader, config.engine_spec());
    let generation = GenerationService::new(Arc::new(models), Arc::new(store), config.defaults);

    Ok(AxumContext::new(generation, config))
}

/// Start the web server and run until Ctrl-C.
pub async fn start_server(ctx: AxumContext, config: ServerConfig) -> Result<()> {
    if config.warm_up {
        info!("Loading model before accepting requests...");
        if let Err(e) = ctx.generation.warm_up().await {
            error!("Failed to load model: {e}");
            return Err(e).context("model failed to load at startup");
        }
    }

    let app = crate::routes::create_router(ctx, &config.cors);

    let addr = config.bind_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("zimage API listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("Server stopped by user");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for Ctrl-C: {e}");
        std::future::pending::<()>().await;
    }
}
