//! Domain types for text-to-image generation.
//!
//! Pure data: no I/O, no engine access.

mod artifact;
mod device;
mod params;

pub use artifact::{ARTIFACT_EXTENSION, GeneratedArtifact, artifact_filename};
pub use device::{Device, ParseDeviceError};
pub use params::{
    GenerationDefaults, GenerationParameters, MAX_DIMENSION, MAX_GUIDANCE, MAX_STEPS,
    MIN_DIMENSION, MIN_GUIDANCE, MIN_STEPS, ParameterLimits, ResolvedParameters, ValidationError,
    prompt_preview,
};
