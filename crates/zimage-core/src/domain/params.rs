//! Generation parameters, their bounds, and resolution against defaults.

use std::fmt;
use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Smallest accepted edge length in pixels.
pub const MIN_DIMENSION: u32 = 256;
/// Largest accepted edge length in pixels.
pub const MAX_DIMENSION: u32 = 1024;
/// Inclusive bounds for the denoising step count.
pub const MIN_STEPS: u32 = 1;
pub const MAX_STEPS: u32 = 50;
/// Inclusive bounds for classifier-free guidance.
pub const MIN_GUIDANCE: f32 = 0.0;
pub const MAX_GUIDANCE: f32 = 10.0;

/// Raw, per-request generation parameters.
///
/// Optional fields are filled from [`GenerationDefaults`] by
/// [`GenerationParameters::resolve`]. `seed` stays optional after resolution:
/// an absent seed lets the engine pick one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationParameters {
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

impl GenerationParameters {
    /// Parameters with only a prompt set.
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn with_size(mut self, height: u32, width: u32) -> Self {
        self.height = Some(height);
        self.width = Some(width);
        self
    }

    #[must_use]
    pub const fn with_steps(mut self, steps: u32) -> Self {
        self.num_inference_steps = Some(steps);
        self
    }

    #[must_use]
    pub const fn with_guidance(mut self, guidance: f32) -> Self {
        self.guidance_scale = Some(guidance);
        self
    }

    #[must_use]
    pub const fn with_seed(mut self, seed: i64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Check every supplied field against `limits`.
    ///
    /// Unset fields are not checked here; defaults are validated once when
    /// the configuration is loaded.
    pub fn validate(&self, limits: &ParameterLimits) -> Result<(), ValidationError> {
        if self.prompt.trim().is_empty() {
            return Err(ValidationError::EmptyPrompt);
        }
        if let Some(height) = self.height {
            check_range("height", height, &limits.dimension)?;
        }
        if let Some(width) = self.width {
            check_range("width", width, &limits.dimension)?;
        }
        if let Some(steps) = self.num_inference_steps {
            check_range("num_inference_steps", steps, &limits.steps)?;
        }
        if let Some(guidance) = self.guidance_scale {
            check_guidance(guidance, limits)?;
        }
        Ok(())
    }

    /// Fill unset fields from `defaults`.
    pub fn resolve(self, defaults: &GenerationDefaults) -> ResolvedParameters {
        ResolvedParameters {
            prompt: self.prompt,
            height: self.height.unwrap_or(defaults.height),
            width: self.width.unwrap_or(defaults.width),
            num_inference_steps: self.num_inference_steps.unwrap_or(defaults.steps),
            guidance_scale: self.guidance_scale.unwrap_or(defaults.guidance_scale),
            seed: self.seed,
        }
    }
}

/// Parameters after resolution: every field except `seed` is concrete.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedParameters {
    pub prompt: String,
    pub height: u32,
    pub width: u32,
    pub num_inference_steps: u32,
    pub guidance_scale: f32,
    pub seed: Option<i64>,
}

impl ResolvedParameters {
    /// First 50 characters of the prompt, for log lines.
    pub fn prompt_preview(&self) -> String {
        prompt_preview(&self.prompt)
    }
}

impl fmt::Display for ResolvedParameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}x{}, steps={}, guidance={}, seed=",
            self.height, self.width, self.num_inference_steps, self.guidance_scale
        )?;
        match self.seed {
            Some(seed) => write!(f, "{seed}"),
            None => f.write_str("random"),
        }
    }
}

/// Truncate a prompt to 50 characters on a char boundary.
pub fn prompt_preview(prompt: &str) -> String {
    const PREVIEW_CHARS: usize = 50;
    let mut chars = prompt.chars();
    let preview: String = chars.by_ref().take(PREVIEW_CHARS).collect();
    if chars.next().is_some() {
        format!("{preview}...")
    } else {
        preview
    }
}

/// Process-wide defaults applied to unset request fields.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenerationDefaults {
    pub height: u32,
    pub width: u32,
    pub steps: u32,
    pub guidance_scale: f32,
}

impl Default for GenerationDefaults {
    fn default() -> Self {
        Self {
            height: 512,
            width: 512,
            steps: 9,
            guidance_scale: 0.0,
        }
    }
}

impl GenerationDefaults {
    /// Check that the defaults themselves lie within `limits`.
    pub fn validate(&self, limits: &ParameterLimits) -> Result<(), ValidationError> {
        check_range("height", self.height, &limits.dimension)?;
        check_range("width", self.width, &limits.dimension)?;
        check_range("num_inference_steps", self.steps, &limits.steps)?;
        check_guidance(self.guidance_scale, limits)
    }
}

/// Inclusive bounds enforced before the engine is invoked.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterLimits {
    pub dimension: RangeInclusive<u32>,
    pub steps: RangeInclusive<u32>,
    pub guidance: RangeInclusive<f32>,
}

impl Default for ParameterLimits {
    fn default() -> Self {
        Self {
            dimension: MIN_DIMENSION..=MAX_DIMENSION,
            steps: MIN_STEPS..=MAX_STEPS,
            guidance: MIN_GUIDANCE..=MAX_GUIDANCE,
        }
    }
}

/// Request parameters that failed validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("prompt must not be empty")]
    EmptyPrompt,

    #[error("{field} must be between {min} and {max}, got {value}")]
    OutOfRange {
        field: &'static str,
        value: String,
        min: String,
        max: String,
    },

    #[error("{field} must be a finite number")]
    NotFinite { field: &'static str },
}

impl ValidationError {
    /// Name of the offending field, if the error is about one.
    pub const fn field(&self) -> Option<&'static str> {
        match self {
            Self::EmptyPrompt => Some("prompt"),
            Self::OutOfRange { field, .. } | Self::NotFinite { field } => Some(field),
        }
    }
}

fn check_range(
    field: &'static str,
    value: u32,
    range: &RangeInclusive<u32>,
) -> Result<(), ValidationError> {
    if range.contains(&value) {
        Ok(())
    } else {
        Err(ValidationError::OutOfRange {
            field,
            value: value.to_string(),
            min: range.start().to_string(),
            max: range.end().to_string(),
        })
    }
}

fn check_guidance(value: f32, limits: &ParameterLimits) -> Result<(), ValidationError> {
    const FIELD: &str = "guidance_scale";
    if !value.is_finite() {
        return Err(ValidationError::NotFinite { field: FIELD });
    }
    if limits.guidance.contains(&value) {
        Ok(())
    } else {
        Err(ValidationError::OutOfRange {
            field: FIELD,
            value: value.to_string(),
            min: limits.guidance.start().to_string(),
            max: limits.guidance.end().to_string(),
        })
    }
}
