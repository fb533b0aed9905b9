//! Artifact persistence and the storage cap.

mod artifact_store;
mod error;

pub use artifact_store::{ArtifactStore, EvictionReport, StoredArtifact};
pub use error::StorageError;
