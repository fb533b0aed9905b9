//! Path resolution and directory preparation failures.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PathError {
    #[error("path is empty")]
    Empty,

    /// `~` was used but the home directory is unknown.
    #[error("cannot expand '~': home directory is unknown")]
    NoHomeDir,

    #[error("cannot resolve relative path: {0}")]
    CurrentDir(#[source] io::Error),

    #[error("{} exists and is not a directory", .0.display())]
    NotADirectory(PathBuf),

    #[error("cannot create {}: {source}", path.display())]
    Create {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{} is not writable: {source}", path.display())]
    NotWritable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}
