//! stable-diffusion.cpp adapter.
//!
//! The `sd` CLI is treated as the inference engine: the loader validates
//! everything that can be checked up front, and the engine runs one process
//! per image.

mod command;
mod engine;
mod loader;
mod validate;

pub use command::{SdCommandBuilder, describe};
pub use engine::{SdCppEngine, classify_failure};
pub use loader::SdCppLoader;
pub use validate::{BinaryError, MODEL_EXTENSIONS, check_model_file, resolve_binary, validate_binary};
