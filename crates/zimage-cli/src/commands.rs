//! Subcommands of the `zimage` binary.

use clap::{Args, Subcommand};
use zimage_core::GenerationParameters;

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Start the HTTP API (the default when no command is given)
    Serve {
        /// Bind host instead of API_HOST
        #[arg(long)]
        host: Option<String>,
        /// Bind port instead of API_PORT
        #[arg(long)]
        port: Option<u16>,
        /// Accept requests before the model is loaded; the first request loads it
        #[arg(long, env = "ZIMAGE_SKIP_WARMUP")]
        skip_warmup: bool,
    },

    /// Generate one image and store it in the output directory
    Generate(GenerateArgs),

    /// Check that the output directory, backend and model are usable
    Check,

    /// Show the resolved configuration
    Config {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Debug, Clone, Args)]
pub struct GenerateArgs {
    /// Text prompt
    #[arg(short, long)]
    pub prompt: String,
    /// Image height in pixels
    #[arg(long)]
    pub height: Option<u32>,
    /// Image width in pixels
    #[arg(long)]
    pub width: Option<u32>,
    /// Number of denoising steps
    #[arg(long)]
    pub steps: Option<u32>,
    /// Guidance scale
    #[arg(long)]
    pub guidance: Option<f32>,
    /// Seed for reproducible output (may be negative)
    #[arg(short, long, allow_negative_numbers = true)]
    pub seed: Option<i64>,
}

impl From<GenerateArgs> for GenerationParameters {
    fn from(args: GenerateArgs) -> Self {
        Self {
            prompt: args.prompt,
            height: args.height,
            width: args.width,
            num_inference_steps: args.steps,
            guidance_scale: args.guidance,
            seed: args.seed,
        }
    }
}
