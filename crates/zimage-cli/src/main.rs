//! CLI entry point.
//!
//! Loads `.env`, initialises logging, resolves the configuration once and
//! dispatches to a handler. Errors carrying a [`CliError`] choose the exit
//! code.

use clap::Parser;
use tracing_subscriber::EnvFilter;

use zimage_cli::{Cli, CliError, Commands, handlers, load_config};

#[tokio::main]
async fn main() {
    // Load environment variables before anything reads them
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e:#}");
        let code = e.downcast_ref::<CliError>().map_or(1, CliError::exit_code);
        std::process::exit(code);
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(&cli.overrides())?;

    match cli.command {
        None => handlers::serve::execute(&config, false).await,
        Some(Commands::Serve { skip_warmup, .. }) => {
            handlers::serve::execute(&config, skip_warmup).await
        }
        Some(Commands::Generate(args)) => handlers::generate::execute(&config, args).await,
        Some(Commands::Check) => handlers::check::execute(&config).await,
        Some(Commands::Config { json }) => handlers::config::execute(&config, json),
    }
}
