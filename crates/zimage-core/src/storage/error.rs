//! Artifact storage errors.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::paths::PathError;

/// Failures persisting or listing artifacts.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The output directory is missing, not a directory, or not writable.
    #[error(transparent)]
    Directory(#[from] PathError),

    /// Writing the artifact file failed; nothing was published.
    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Listing the output directory failed.
    #[error("failed to list {}: {source}", path.display())]
    List {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The raster could not be encoded as PNG.
    #[error("failed to encode PNG: {0}")]
    Encode(String),
}
