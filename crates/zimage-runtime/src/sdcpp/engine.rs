//! `ImageEngine` backed by the stable-diffusion.cpp CLI.

use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, info, warn};
use uuid::Uuid;
use zimage_core::domain::{Device, ResolvedParameters};
use zimage_core::ports::{ImageEngine, InferenceError, RasterImage};

use super::command::{SdCommandBuilder, describe};

/// Characters of stderr kept in failure messages.
const STDERR_TAIL_CHARS: usize = 800;

/// One `sd` process per generation.
///
/// Runs are not cancelled when the caller goes away: the child process is
/// left to finish so its output is not half-written.
#[derive(Debug)]
pub struct SdCppEngine {
    binary: PathBuf,
    model_path: PathBuf,
    device: Device,
    extra_args: Vec<String>,
    scratch_dir: PathBuf,
    usable: AtomicBool,
}

impl SdCppEngine {
    pub(crate) const fn new(
        binary: PathBuf,
        model_path: PathBuf,
        device: Device,
        extra_args: Vec<String>,
        scratch_dir: PathBuf,
    ) -> Self {
        Self {
            binary,
            model_path,
            device,
            extra_args,
            scratch_dir,
            usable: AtomicBool::new(true),
        }
    }

    async fn run(
        &self,
        params: &ResolvedParameters,
        output: &Path,
    ) -> Result<RasterImage, InferenceError> {
        let std_cmd = SdCommandBuilder::new(&self.binary, &self.model_path)
            .params(params)
            .output(output)
            .device(self.device)
            .extra_args(self.extra_args.iter().cloned())
            .build();
        debug!(target: "zimage.engine", "Executing: {}", describe(&std_cmd));

        let mut cmd = Command::from(std_cmd);
        cmd.stdin(Stdio::null()).kill_on_drop(false);

        let started = Instant::now();
        let result = match cmd.output().await {
            Ok(result) => result,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                self.usable.store(false, Ordering::SeqCst);
                return Err(InferenceError::EngineUnavailable(format!(
                    "{} is gone: {e}",
                    self.binary.display()
                )));
            }
            Err(e) => return Err(InferenceError::Failed(format!("failed to start sd: {e}"))),
        };

        let stderr = String::from_utf8_lossy(&result.stderr);
        if !result.status.success() {
            return Err(classify_failure(result.status, &stderr));
        }
        info!(
            target: "zimage.engine",
            "sd finished in {:.1}s",
            started.elapsed().as_secs_f64()
        );

        let output = output.to_path_buf();
        let image = tokio::task::spawn_blocking(move || image::open(&output))
            .await
            .map_err(|e| InferenceError::InvalidOutput(format!("decoder task failed: {e}")))?
            .map_err(|e| InferenceError::InvalidOutput(e.to_string()))?;

        if image.width() != params.width || image.height() != params.height {
            warn!(
                target: "zimage.engine",
                "sd returned {}x{}, requested {}x{}",
                image.height(),
                image.width(),
                params.height,
                params.width
            );
        }
        Ok(image)
    }
}

#[async_trait]
impl ImageEngine for SdCppEngine {
    async fn generate(&self, params: &ResolvedParameters) -> Result<RasterImage, InferenceError> {
        let output = self
            .scratch_dir
            .join(format!("render-{}.png", Uuid::new_v4().simple()));
        let result = self.run(params, &output).await;
        if let Err(e) = tokio::fs::remove_file(&output).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(target: "zimage.engine", "Failed to remove {}: {e}", output.display());
            }
        }
        result
    }

    fn device(&self) -> Device {
        self.device
    }

    fn is_usable(&self) -> bool {
        self.usable.load(Ordering::SeqCst)
    }
}

/// Map a failed `sd` run to an inference error.
pub fn classify_failure(status: ExitStatus, stderr: &str) -> InferenceError {
    let tail = stderr_tail(stderr);
    let lower = stderr.to_ascii_lowercase();
    if lower.contains("out of memory") || lower.contains("failed to allocate") {
        InferenceError::OutOfMemory(tail)
    } else {
        InferenceError::Failed(format!("sd exited with {status}: {tail}"))
    }
}

fn stderr_tail(stderr: &str) -> String {
    let trimmed = stderr.trim();
    let count = trimmed.chars().count();
    if count <= STDERR_TAIL_CHARS {
        return trimmed.to_string();
    }
    let tail: String = trimmed.chars().skip(count - STDERR_TAIL_CHARS).collect();
    format!("...{tail}")
}
