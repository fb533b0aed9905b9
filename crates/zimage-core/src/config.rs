//! Service configuration.
//!
//! Read once at startup from key/value pairs (the process environment in
//! production, a map in tests) and shared immutably afterwards.

use std::path::PathBuf;
use std::str::FromStr;

use serde::Serialize;
use thiserror::Error;

use crate::domain::{Device, GenerationDefaults, ParameterLimits};
use crate::paths::{PathError, normalize_user_path};
use crate::ports::EngineSpec;

pub const DEFAULT_MODEL_PATH: &str = "models/Z-Image-Turbo/z-image-turbo.gguf";
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_OUTPUT_DIR: &str = "generated_images";
pub const DEFAULT_MAX_STORED_IMAGES: usize = 1000;

/// Configuration errors, always naming the offending key.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value:?} ({reason})")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },

    #[error("invalid path for {key}: {source}")]
    Path {
        key: &'static str,
        #[source]
        source: PathError,
    },
}

/// Fully resolved service configuration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServiceConfig {
    /// Model weights location (`MODEL_PATH`).
    pub model_path: PathBuf,
    /// Requested device (`DEVICE`).
    pub device: Device,
    /// stable-diffusion.cpp binary (`SD_BINARY`): a path, or a bare name
    /// looked up on `PATH`. `None` looks up `sd`.
    pub sd_binary: Option<PathBuf>,
    /// Extra arguments passed to every engine invocation (`SD_EXTRA_ARGS`).
    pub sd_extra_args: Vec<String>,
    pub host: String,
    pub port: u16,
    /// Base for returned image URLs (`PUBLIC_BASE_URL`), without trailing slash.
    pub public_base_url: Option<String>,
    pub output_dir: PathBuf,
    pub max_stored_images: usize,
    pub defaults: GenerationDefaults,
    /// Allowed CORS origins (`CORS_ORIGINS`); `None` allows any origin.
    pub cors_origins: Option<Vec<String>>,
}

impl ServiceConfig {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key lookup.
    ///
    /// Unset and blank keys take their defaults. The result is validated.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_owned())
                .filter(|v| !v.is_empty())
        };

        let base = GenerationDefaults::default();
        let defaults = GenerationDefaults {
            height: parse_or(&get, "DEFAULT_HEIGHT", base.height)?,
            width: parse_or(&get, "DEFAULT_WIDTH", base.width)?,
            steps: parse_or(&get, "DEFAULT_STEPS", base.steps)?,
            guidance_scale: parse_or(&get, "DEFAULT_GUIDANCE_SCALE", base.guidance_scale)?,
        };

        let config = Self {
            model_path: path_or(&get, "MODEL_PATH", DEFAULT_MODEL_PATH)?,
            device: parse_or(&get, "DEVICE", Device::default())?,
            sd_binary: get("SD_BINARY").map(|raw| binary_value(&raw)).transpose()?,
            sd_extra_args: get("SD_EXTRA_ARGS")
                .map(|raw| raw.split_whitespace().map(str::to_owned).collect())
                .unwrap_or_default(),
            host: get("API_HOST").unwrap_or_else(|| DEFAULT_HOST.to_owned()),
            port: parse_or(&get, "API_PORT", DEFAULT_PORT)?,
            public_base_url: get("PUBLIC_BASE_URL").map(|url| url.trim_end_matches('/').to_owned()),
            output_dir: path_or(&get, "OUTPUT_DIR", DEFAULT_OUTPUT_DIR)?,
            max_stored_images: parse_or(&get, "MAX_STORED_IMAGES", DEFAULT_MAX_STORED_IMAGES)?,
            defaults,
            cors_origins: get("CORS_ORIGINS").map(|raw| parse_origins(&raw)),
        };

        config.validate()?;
        Ok(config)
    }

    /// Check cross-field constraints.
    ///
    /// Called by [`Self::from_lookup`]; call it again after applying
    /// command-line overrides.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_stored_images == 0 {
            return Err(ConfigError::Invalid {
                key: "MAX_STORED_IMAGES",
                value: "0".into(),
                reason: "must be at least 1".into(),
            });
        }

        if let Err(e) = self.defaults.validate(&ParameterLimits::default()) {
            let key = match e.field() {
                Some("height") => "DEFAULT_HEIGHT",
                Some("width") => "DEFAULT_WIDTH",
                Some("num_inference_steps") => "DEFAULT_STEPS",
                _ => "DEFAULT_GUIDANCE_SCALE",
            };
            return Err(ConfigError::Invalid {
                key,
                value: default_value(&self.defaults, key),
                reason: e.to_string(),
            });
        }

        if self.host.is_empty() {
            return Err(ConfigError::Invalid {
                key: "API_HOST",
                value: String::new(),
                reason: "must not be empty".into(),
            });
        }

        if let Some(url) = &self.public_base_url {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(ConfigError::Invalid {
                    key: "PUBLIC_BASE_URL",
                    value: url.clone(),
                    reason: "must start with http:// or https://".into(),
                });
            }
        }

        Ok(())
    }

    /// `host:port` to bind the HTTP listener to.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn engine_spec(&self) -> EngineSpec {
        EngineSpec::new(self.model_path.clone(), self.device)
    }
}

fn parse_or<T, G>(get: &G, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        None => Ok(default),
        Some(raw) => raw.parse().map_err(|e: T::Err| ConfigError::Invalid {
            key,
            value: raw.clone(),
            reason: e.to_string(),
        }),
    }
}

fn path_or<G>(get: &G, key: &'static str, default: &str) -> Result<PathBuf, ConfigError>
where
    G: Fn(&str) -> Option<String>,
{
    let raw = get(key).unwrap_or_else(|| default.to_owned());
    path_value(key, &raw)
}

fn path_value(key: &'static str, raw: &str) -> Result<PathBuf, ConfigError> {
    normalize_user_path(raw).map_err(|source| ConfigError::Path { key, source })
}

/// Bare command names stay as they are; anything path-like is normalized.
fn binary_value(raw: &str) -> Result<PathBuf, ConfigError> {
    if raw.contains(std::path::MAIN_SEPARATOR) || raw.contains('/') || raw.starts_with('~') {
        path_value("SD_BINARY", raw)
    } else {
        Ok(PathBuf::from(raw))
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(str::to_owned)
        .collect()
}

fn default_value(defaults: &GenerationDefaults, key: &str) -> String {
    match key {
        "DEFAULT_HEIGHT" => defaults.height.to_string(),
        "DEFAULT_WIDTH" => defaults.width.to_string(),
        "DEFAULT_STEPS" => defaults.steps.to_string(),
        _ => defaults.guidance_scale.to_string(),
    }
}
