//! OS-level checks used when deciding whether a device request can be met.

mod gpu;

pub use gpu::{GpuInfo, cuda_toolkit_release, detect_gpu_info};
