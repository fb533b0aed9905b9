//! Health and service info bodies.

use serde::{Deserialize, Serialize};

/// Response of `GET /health`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HealthResponse {
    pub status: String,
    pub model_loaded: bool,
}

impl HealthResponse {
    pub fn healthy(model_loaded: bool) -> Self {
        Self {
            status: "healthy".to_string(),
            model_loaded,
        }
    }
}

/// Response of `GET /`.
#[derive(Debug, Clone, Serialize)]
pub struct ApiInfo {
    pub name: &'static str,
    pub version: &'static str,
    pub description: &'static str,
    pub endpoints: Endpoints,
}

#[derive(Debug, Clone, Serialize)]
pub struct Endpoints {
    pub health: &'static str,
    pub generate_file: &'static str,
    pub generate_url: &'static str,
    pub images: &'static str,
}

impl ApiInfo {
    pub const fn current() -> Self {
        Self {
            name: "Z-Image-Turbo API",
            version: env!("CARGO_PKG_VERSION"),
            description: "Text-to-image generation API",
            endpoints: Endpoints {
                health: "GET /health",
                generate_file: "POST /generate/file",
                generate_url: "POST /generate/url",
                images: "GET /images/{filename}",
            },
        }
    }
}
