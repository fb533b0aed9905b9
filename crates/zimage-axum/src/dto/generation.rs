//! Generation request and response bodies.

use serde::{Deserialize, Serialize};
use zimage_core::GenerationParameters;

/// Body of `POST /generate/file` and `POST /generate/url`.
#[derive(Debug, Clone, Deserialize)]
pub struct GenerateRequest {
    pub prompt: String,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub num_inference_steps: Option<u32>,
    #[serde(default)]
    pub guidance_scale: Option<f32>,
    #[serde(default)]
    pub seed: Option<i64>,
}

impl From<GenerateRequest> for GenerationParameters {
    fn from(req: GenerateRequest) -> Self {
        Self {
            prompt: req.prompt,
            height: req.height,
            width: req.width,
            num_inference_steps: req.num_inference_steps,
            guidance_scale: req.guidance_scale,
            seed: req.seed,
        }
    }
}

/// Response of `POST /generate/url`.
///
/// Failures other than validation errors are reported with HTTP 200 and
/// `success: false`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GenerateUrlResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview_url: Option<String>,
}

impl GenerateUrlResponse {
    pub fn generated(filename: String, image_url: String) -> Self {
        Self {
            success: true,
            message: "Image generated successfully".to_string(),
            preview_url: Some(image_url.clone()),
            image_url: Some(image_url),
            filename: Some(filename),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            image_url: None,
            filename: None,
            preview_url: None,
        }
    }
}
