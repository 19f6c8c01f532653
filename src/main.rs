//! jvmlayer - cacheable JDK/JRE layers
//!
//! CLI entry point that dispatches to subcommands.

use clap::Parser;
use console::style;
use jvmlayer::cli::{Cli, Commands};
use jvmlayer::config::ConfigManager;
use jvmlayer::error::JvmLayerResult;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            let mut source = std::error::Error::source(&e);
            while let Some(cause) = source {
                eprintln!("  {} {}", style("Caused by:").dim(), cause);
                source = cause.source();
            }
            if let Some(hint) = e.hint() {
                eprintln!("{} {}", style("Hint:").yellow(), hint);
            }
            ExitCode::FAILURE
        }
    }
}

async fn run() -> JvmLayerResult<()> {
    let cli = Cli::parse();

    // Load configuration
    let config_manager = if let Some(ref path) = cli.config {
        ConfigManager::with_path(path.clone())
    } else {
        ConfigManager::new()
    };
    let config = config_manager.load().await?;

    // Initialize logging: 0 = warn, 1 = info, 2+ = debug
    let filter = match cli.verbose {
        0 => EnvFilter::new("jvmlayer=warn"),
        1 => EnvFilter::new("jvmlayer=info"),
        _ => EnvFilter::new("jvmlayer=debug"),
    };

    if config.general.log_format == "json" {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .without_time()
            .with_writer(std::io::stderr)
            .init();
    }

    // Dispatch to command
    match cli.command {
        Commands::Build(args) => jvmlayer::cli::commands::build(args, &config).await,
        Commands::Layers(args) => jvmlayer::cli::commands::layers(args, &config).await,
    }
}
