#![doc = include_str!("../README.md")]
#![deny(unsafe_code)]
#![deny(unused_crate_dependencies)]

pub mod sdcpp;
pub mod system;

pub use sdcpp::{SdCommandBuilder, SdCppEngine, SdCppLoader};
pub use system::{GpuInfo, detect_gpu_info};
