//! CLI bootstrap: configuration from the environment plus command-line
//! overrides.
//!
//! Handlers receive a validated [`ServiceConfig`]; wiring of the engine and
//! store happens in `zimage_axum::bootstrap`.

use zimage_core::ServiceConfig;
use zimage_core::domain::Device;
use zimage_core::paths::normalize_user_path;

use crate::error::CliError;

/// Values given on the command line that take precedence over the
/// environment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigOverrides {
    pub model_path: Option<String>,
    pub device: Option<String>,
    pub output_dir: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
}

impl ConfigOverrides {
    /// Apply the overrides to `config` and re-validate it.
    pub fn apply(&self, mut config: ServiceConfig) -> Result<ServiceConfig, CliError> {
        if let Some(raw) = &self.model_path {
            config.model_path = normalize_user_path(raw)
                .map_err(|e| CliError::Arguments(format!("--model-path: {e}")))?;
        }
        if let Some(raw) = &self.device {
            config.device = raw
                .parse::<Device>()
                .map_err(|e| CliError::Arguments(format!("--device: {e}")))?;
        }
        if let Some(raw) = &self.output_dir {
            config.output_dir = normalize_user_path(raw)
                .map_err(|e| CliError::Arguments(format!("--output-dir: {e}")))?;
        }
        if let Some(host) = &self.host {
            config.host.clone_from(host);
        }
        if let Some(port) = self.port {
            config.port = port;
        }

        config.validate()?;
        Ok(config)
    }
}

/// Load the configuration from the process environment and apply
/// `overrides`.
pub fn load_config(overrides: &ConfigOverrides) -> Result<ServiceConfig, CliError> {
    let config = ServiceConfig::from_env()?;
    overrides.apply(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn base() -> ServiceConfig {
        ServiceConfig::from_lookup(|_| None).unwrap()
    }

    #[test]
    fn test_no_overrides_keeps_config() {
        let config = ConfigOverrides::default().apply(base()).unwrap();
        assert_eq!(config, base());
    }

    #[test]
    fn test_overrides_replace_values() {
        let overrides = ConfigOverrides {
            model_path: Some("/srv/models/z.gguf".into()),
            device: Some("auto".into()),
            output_dir: Some("/srv/out".into()),
            host: Some("127.0.0.1".into()),
            port: Some(9001),
        };
        let config = overrides.apply(base()).unwrap();
        assert_eq!(config.model_path, PathBuf::from("/srv/models/z.gguf"));
        assert_eq!(config.device, Device::Auto);
        assert_eq!(config.output_dir, PathBuf::from("/srv/out"));
        assert_eq!(config.bind_addr(), "127.0.0.1:9001");
    }

    #[test]
    fn test_bad_device_is_an_argument_error() {
        let overrides = ConfigOverrides {
            device: Some("tpu".into()),
            ..Default::default()
        };
        let err = overrides.apply(base()).unwrap_err();
        assert!(matches!(err, CliError::Arguments(_)));
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_overrides_are_validated() {
        let overrides = ConfigOverrides {
            host: Some(String::new()),
            ..Default::default()
        };
        let err = overrides.apply(base()).unwrap_err();
        assert!(matches!(err, CliError::Config(_)));
    }
}
