//! GPU detection.
//!
//! Detects by running vendor tools, so the result reflects the host rather
//! than what the `sd` binary was compiled for.

use std::process::Command;

/// Acceleration hardware found on this host.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GpuInfo {
    pub has_nvidia_gpu: bool,
    /// CUDA toolkit release, when `nvcc` is installed.
    pub cuda_version: Option<String>,
    pub has_metal: bool,
}

impl GpuInfo {
    /// Whether any GPU the engine could run on was found.
    pub const fn has_gpu(&self) -> bool {
        self.has_nvidia_gpu || self.has_metal
    }
}

/// Check the host for a GPU `sd` could use.
///
/// Blocking: runs external commands.
pub fn detect_gpu_info() -> GpuInfo {
    let nvidia = nvidia_present();
    GpuInfo {
        has_nvidia_gpu: nvidia,
        cuda_version: nvidia.then(cuda_toolkit_release).flatten(),
        has_metal: cfg!(target_os = "macos"),
    }
}

/// NVIDIA card present, with or without the CUDA toolkit.
fn nvidia_present() -> bool {
    if Command::new("nvidia-smi")
        .arg("--list-gpus")
        .output()
        .is_ok_and(|o| o.status.success())
    {
        return true;
    }

    #[cfg(target_os = "linux")]
    {
        let listed = Command::new("lspci").output().is_ok_and(|out| {
            out.status.success()
                && out
                    .stdout
                    .to_ascii_lowercase()
                    .windows(6)
                    .any(|w| w == b"nvidia")
        });
        if listed {
            return true;
        }
    }

    false
}

/// Release of the installed CUDA toolkit, from `nvcc --version`.
pub fn cuda_toolkit_release() -> Option<String> {
    let out = Command::new("nvcc").arg("--version").output().ok()?;
    out.status
        .success()
        .then(|| parse_nvcc_release(&String::from_utf8_lossy(&out.stdout)))
        .flatten()
}

/// Extract "12.0" from "Cuda compilation tools, release 12.0, V12.0.140".
fn parse_nvcc_release(stdout: &str) -> Option<String> {
    let line = stdout.lines().find(|l| l.contains("release"))?;
    let version = line.split("release").nth(1)?.split(',').next()?.trim();
    (!version.is_empty()).then(|| version.to_string())
}
