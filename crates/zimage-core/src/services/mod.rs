//! Core services - the application's business logic layer.
//!
//! Services orchestrate between ports and domain logic. They never know
//! which concrete engine sits behind the ports.

mod generation;
mod model_manager;

pub use generation::GenerationService;
pub use model_manager::ModelManager;
