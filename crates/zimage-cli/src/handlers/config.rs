//! Config command handler.

use anyhow::Result;
use zimage_core::ServiceConfig;

/// Print the resolved configuration, as `key = value` lines or JSON.
pub fn execute(config: &ServiceConfig, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(config)?);
    } else {
        for (key, value) in rows(config) {
            println!("{key} = {value}");
        }
    }
    Ok(())
}

fn rows(config: &ServiceConfig) -> Vec<(&'static str, String)> {
    let or_unset = |value: Option<String>| value.unwrap_or_else(|| "(unset)".to_string());
    vec![
        ("MODEL_PATH", config.model_path.display().to_string()),
        ("DEVICE", config.device.to_string()),
        (
            "SD_BINARY",
            or_unset(config.sd_binary.as_ref().map(|p| p.display().to_string())),
        ),
        ("SD_EXTRA_ARGS", config.sd_extra_args.join(" ")),
        ("API_HOST", config.host.clone()),
        ("API_PORT", config.port.to_string()),
        ("PUBLIC_BASE_URL", or_unset(config.public_base_url.clone())),
        ("OUTPUT_DIR", config.output_dir.display().to_string()),
        ("MAX_STORED_IMAGES", config.max_stored_images.to_string()),
        ("DEFAULT_HEIGHT", config.defaults.height.to_string()),
        ("DEFAULT_WIDTH", config.defaults.width.to_string()),
        ("DEFAULT_STEPS", config.defaults.steps.to_string()),
        (
            "DEFAULT_GUIDANCE_SCALE",
            config.defaults.guidance_scale.to_string(),
        ),
        (
            "CORS_ORIGINS",
            config
                .cors_origins
                .as_ref()
                .map_or_else(|| "*".to_string(), |origins| origins.join(",")),
        ),
    ]
}
