//! Generate command handler.
//!
//! Runs one request through the same generation service the HTTP API uses,
//! so validation, defaults, storage and eviction behave identically.

use anyhow::Result;
use tracing::debug;
use zimage_axum::bootstrap;
use zimage_core::ServiceConfig;

use crate::commands::GenerateArgs;
use crate::error::CliError;

pub async fn execute(config: &ServiceConfig, args: GenerateArgs) -> Result<()> {
    debug!(?args, "One-shot generation");
    let ctx = bootstrap(config).map_err(|e| CliError::Io(format!("{e:#}")))?;

    let artifact = ctx
        .generation
        .generate(args.into())
        .await
        .map_err(CliError::from)?;

    let models = ctx.generation.models();
    let params = &artifact.params;
    println!("✓ Image generated: {}", artifact.filename);
    println!(
        "  Model: {} ({})",
        models.model_path().display(),
        models.device()
    );
    println!("  Path:  {}", artifact.path.display());
    println!("  Size:  {}x{}", params.width, params.height);
    println!(
        "  Steps: {}, guidance {}",
        params.num_inference_steps, params.guidance_scale
    );
    match artifact.seed() {
        Some(seed) => println!("  Seed:  {seed}"),
        None => println!("  Seed:  random"),
    }
    Ok(())
}
