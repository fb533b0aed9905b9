//! Main CLI parser and top-level argument handling.

use clap::Parser;

use crate::bootstrap::ConfigOverrides;
use crate::commands::Commands;

/// Command-line interface for the Z-Image-Turbo service.
#[derive(Debug, Parser)]
#[command(name = "zimage")]
#[command(about = "Serve and run Z-Image-Turbo text-to-image generation")]
#[command(version)]
pub struct Cli {
    /// Model weights to load instead of MODEL_PATH
    #[arg(long = "model-path", global = true)]
    pub model_path: Option<String>,

    /// Inference device (CPU, GPU or AUTO) instead of DEVICE
    #[arg(long, global = true)]
    pub device: Option<String>,

    /// Directory for generated images instead of OUTPUT_DIR
    #[arg(long = "output-dir", global = true)]
    pub output_dir: Option<String>,

    /// Enable verbose/debug output
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// Overrides taken from global options and the selected command.
    pub fn overrides(&self) -> ConfigOverrides {
        let (host, port) = match &self.command {
            Some(Commands::Serve { host, port, .. }) => (host.clone(), *port),
            _ => (None, None),
        };
        ConfigOverrides {
            model_path: self.model_path.clone(),
            device: self.device.clone(),
            output_dir: self.output_dir.clone(),
            host,
            port,
        }
    }
}
