//! Serve command handler.

use anyhow::Result;
use zimage_axum::{ServerConfig, bootstrap, start_server};
use zimage_core::ServiceConfig;

use crate::error::CliError;

/// Start the HTTP API and run until Ctrl-C.
///
/// Unless `skip_warmup` is set the model is loaded first, and a load
/// failure ends the command with an error.
pub async fn execute(config: &ServiceConfig, skip_warmup: bool) -> Result<()> {
    let ctx = bootstrap(config).map_err(|e| CliError::Io(format!("{e:#}")))?;
    let server = ServerConfig::from_service_config(config).with_warm_up(!skip_warmup);

    println!();
    println!("  zimage API starting...");
    println!();
    println!("  Model:   {} ({})", config.model_path.display(), config.device);
    println!("  Images:  {}", config.output_dir.display());
    println!("  Listen:  http://{}", server.bind_addr());
    if skip_warmup {
        println!();
        println!("  Model loads on the first request");
    }
    println!();
    println!("  Press Ctrl+C to stop");
    println!();

    start_server(ctx, server)
        .await
        .map_err(|e| CliError::Failed(format!("{e:#}")))?;
    Ok(())
}
