//! Port definitions (trait abstractions) for external systems.
//!
//! Ports define the interfaces that the core domain expects from infrastructure.
//! They contain no implementation details and use only domain types.
//!
//! # Design Rules
//!
//! - No process or filesystem details in any signature
//! - Engine construction and invocation are separate traits so the model
//!   manager owns the construct-once policy

pub mod engine;

pub use engine::{
    EngineLoadError, EngineLoader, EngineSpec, ImageEngine, InferenceError, RasterImage,
};

#[cfg(test)]
pub use engine::MockEngineLoader;
