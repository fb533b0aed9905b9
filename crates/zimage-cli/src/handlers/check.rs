//! Check command handler.
//!
//! Runs every startup check in turn and reports each one, instead of
//! stopping at the first failure the way `serve` does.

use std::time::Instant;

use anyhow::Result;
use zimage_core::ServiceConfig;
use zimage_core::domain::Device;
use zimage_core::paths::ensure_output_dir;
use zimage_core::ports::{EngineLoadError, EngineLoader};
use zimage_runtime::sdcpp::{check_model_file, resolve_binary, validate_binary};
use zimage_runtime::{SdCppLoader, detect_gpu_info};

use crate::error::CliError;

pub async fn execute(config: &ServiceConfig) -> Result<()> {
    let mut first_failure: Option<CliError> = None;
    let mut record = |label: &str, outcome: Result<String, CliError>| match outcome {
        Ok(detail) => println!("✓ {label}: {detail}"),
        Err(e) => {
            println!("✗ {label}: {e}");
            first_failure.get_or_insert(e);
        }
    };

    record("Configuration", Ok("valid".to_string()));

    record(
        "Output directory",
        ensure_output_dir(&config.output_dir)
            .map(|()| format!("{} (writable)", config.output_dir.display()))
            .map_err(|e| CliError::Io(e.to_string())),
    );

    record("sd binary", check_binary(config).await);

    if config.device != Device::Cpu {
        record("GPU", check_gpu(config.device).await);
    }

    let model = check_model_file(&config.model_path)
        .await
        .map(|()| config.model_path.display().to_string())
        .map_err(CliError::from);
    let model_ok = model.is_ok();
    record("Model file", model);

    // Loading needs everything above; skip it rather than repeat their errors.
    if model_ok {
        record("Model load", load_engine(config).await);
    }

    match first_failure {
        None => {
            println!();
            println!("All checks passed.");
            Ok(())
        }
        Some(e) => Err(e.into()),
    }
}

async fn check_binary(config: &ServiceConfig) -> Result<String, CliError> {
    let path = resolve_binary(config.sd_binary.as_deref()).map_err(EngineLoadError::from)?;
    validate_binary(&path)
        .await
        .map_err(EngineLoadError::from)?;
    Ok(path.display().to_string())
}

async fn check_gpu(device: Device) -> Result<String, CliError> {
    let info = tokio::task::spawn_blocking(detect_gpu_info)
        .await
        .map_err(|e| CliError::Failed(format!("GPU detection failed: {e}")))?;

    let summary = match (&info.cuda_version, info.has_nvidia_gpu, info.has_metal) {
        (Some(cuda), true, _) => format!("NVIDIA (CUDA {cuda})"),
        (None, true, _) => "NVIDIA (CUDA toolkit not found)".to_string(),
        (_, false, true) => "Metal".to_string(),
        _ => "none detected".to_string(),
    };

    if device == Device::Gpu && !info.has_gpu() {
        return Err(EngineLoadError::UnsupportedDevice {
            device,
            reason: "no GPU detected".into(),
        }
        .into());
    }
    Ok(summary)
}

async fn load_engine(config: &ServiceConfig) -> Result<String, CliError> {
    let start = Instant::now();
    let engine = SdCppLoader::from_config(config)
        .load(&config.engine_spec())
        .await?;
    Ok(format!(
        "ready on {} in {:.1}s",
        engine.device(),
        start.elapsed().as_secs_f64()
    ))
}
