//! Generated artifacts and their file naming.

use std::path::PathBuf;

use bytes::Bytes;
use chrono::{DateTime, Local};
use uuid::Uuid;

use super::params::ResolvedParameters;

/// File extension shared by every stored artifact.
pub const ARTIFACT_EXTENSION: &str = "png";

/// A generated image that has been fully written to the artifact store.
#[derive(Debug, Clone)]
pub struct GeneratedArtifact {
    /// Unique file name inside the store (`image_<date>_<time>_<suffix>.png`).
    pub filename: String,
    /// Absolute path of the stored file.
    pub path: PathBuf,
    /// Parameters the engine was invoked with.
    pub params: ResolvedParameters,
    /// Encoded PNG, identical to the bytes on disk.
    pub png: Bytes,
    /// Wall-clock time the filename was allocated.
    pub created_at: DateTime<Local>,
}

impl GeneratedArtifact {
    /// Seed the request pinned, if any.
    pub const fn seed(&self) -> Option<i64> {
        self.params.seed
    }
}

/// Allocate a new artifact file name for `at`.
///
/// The second-resolution timestamp keeps names roughly chronological; the
/// 8-hex-digit suffix from a v4 UUID keeps concurrent requests in the same
/// second apart.
pub fn artifact_filename(at: &DateTime<Local>) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!(
        "image_{}_{}.{ARTIFACT_EXTENSION}",
        at.format("%Y%m%d_%H%M%S"),
        &suffix[..8]
    )
}
