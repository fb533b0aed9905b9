//! Path utilities for user-configurable locations.
//!
//! - Expanding `~` and anchoring relative paths
//! - Creating and verifying the artifact directory

mod ensure;
mod error;

use std::env;
use std::path::PathBuf;

pub use ensure::{ensure_output_dir, check_writable};
pub use error::PathError;

/// Normalize a user-supplied path.
///
/// Expands a leading `~`, and anchors relative paths at the current
/// working directory.
pub fn normalize_user_path(raw: &str) -> Result<PathBuf, PathError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(PathError::Empty);
    }

    let expanded = if trimmed.starts_with("~/") || trimmed == "~" {
        let home = dirs::home_dir().ok_or(PathError::NoHomeDir)?;
        if trimmed == "~" {
            home
        } else {
            home.join(trimmed.trim_start_matches("~/"))
        }
    } else {
        PathBuf::from(trimmed)
    };

    if expanded.is_absolute() {
        Ok(expanded)
    } else {
        env::current_dir()
            .map(|cwd| cwd.join(expanded))
            .map_err(PathError::CurrentDir)
    }
}
