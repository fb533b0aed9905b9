//! Binary and model file checks run before an engine is handed out.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tokio::io::AsyncReadExt;
use tokio::process::Command;
use zimage_core::ports::EngineLoadError;

/// Model file extensions stable-diffusion.cpp can load.
pub const MODEL_EXTENSIONS: &[&str] = &["gguf", "safetensors", "ckpt"];

const GGUF_MAGIC: &[u8; 4] = b"GGUF";

/// Why the `sd` binary cannot be used.
#[derive(Debug, Error)]
pub enum BinaryError {
    #[error("sd binary not found: {0}")]
    NotFound(String),

    #[error("sd path is not a file: {}", .0.display())]
    NotAFile(PathBuf),

    #[error("sd binary is not executable: {}", .0.display())]
    NotExecutable(PathBuf),

    #[error("failed to run {}: {reason}", path.display())]
    Broken { path: PathBuf, reason: String },
}

impl From<BinaryError> for EngineLoadError {
    fn from(err: BinaryError) -> Self {
        Self::BackendUnavailable(err.to_string())
    }
}

/// Locate the `sd` binary: an explicit path or name, or `sd` on `PATH`.
pub fn resolve_binary(binary: Option<&Path>) -> Result<PathBuf, BinaryError> {
    let wanted = binary.unwrap_or_else(|| Path::new("sd"));
    if wanted.components().count() > 1 {
        // Explicit path: let validate_binary report what is wrong with it.
        return Ok(wanted.to_path_buf());
    }
    which::which(wanted).map_err(|e| {
        BinaryError::NotFound(format!(
            "{} ({e}); install stable-diffusion.cpp or set SD_BINARY",
            wanted.display()
        ))
    })
}

/// Validate that the `sd` binary is functional.
pub async fn validate_binary(path: &Path) -> Result<(), BinaryError> {
    let metadata = tokio::fs::metadata(path)
        .await
        .map_err(|_| BinaryError::NotFound(path.display().to_string()))?;

    if !metadata.is_file() {
        return Err(BinaryError::NotAFile(path.to_path_buf()));
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if metadata.permissions().mode() & 0o111 == 0 {
            return Err(BinaryError::NotExecutable(path.to_path_buf()));
        }
    }

    let output = Command::new(path)
        .arg("--help")
        .output()
        .await
        .map_err(|e| BinaryError::Broken {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

    if !output.status.success() {
        return Err(BinaryError::Broken {
            path: path.to_path_buf(),
            reason: format!("--help exited with {}", output.status),
        });
    }

    Ok(())
}

/// Check that `path` looks like loadable model weights.
pub async fn check_model_file(path: &Path) -> Result<(), EngineLoadError> {
    let metadata = match tokio::fs::metadata(path).await {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(EngineLoadError::ModelNotFound(path.to_path_buf()));
        }
        Err(e) => return Err(invalid(path, e.to_string())),
    };

    if !metadata.is_file() {
        return Err(invalid(path, "not a regular file"));
    }

    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    if !MODEL_EXTENSIONS.contains(&extension.as_str()) {
        return Err(invalid(
            path,
            format!("expected one of .{}", MODEL_EXTENSIONS.join(", .")),
        ));
    }

    if extension == "gguf" {
        let mut magic = [0u8; 4];
        let mut file = tokio::fs::File::open(path)
            .await
            .map_err(|e| invalid(path, e.to_string()))?;
        if file.read_exact(&mut magic).await.is_err() || &magic != GGUF_MAGIC {
            return Err(invalid(path, "missing GGUF header"));
        }
    }

    Ok(())
}

fn invalid(path: &Path, reason: impl Into<String>) -> EngineLoadError {
    EngineLoadError::InvalidModel {
        path: path.to_path_buf(),
        reason: reason.into(),
    }
}
