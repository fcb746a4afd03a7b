//! Buildy - minimal build-triggering service
//!
//! CLI entry point that dispatches to subcommands.

use buildy::cli::{Cli, Commands};
use buildy::config::{Config, ConfigManager};
use buildy::error::BuildyResult;
use clap::Parser;
use console::style;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            if let Some(hint) = e.hint() {
                eprintln!("{} {}", style("Hint:").yellow(), hint);
            }
            ExitCode::FAILURE
        }
    }
}

async fn run() -> BuildyResult<()> {
    let cli = Cli::parse();

    let config_manager = match cli.config {
        Some(ref path) => ConfigManager::with_path(path.clone()),
        None => ConfigManager::new(),
    };
    let config = config_manager.load().await?;

    init_logging(cli.verbose, &config);

    match cli.command {
        Commands::Serve(args) => buildy::cli::commands::serve(args, &config).await,
        Commands::History(args) => buildy::cli::commands::history(args, &config).await,
        Commands::Config(args) => {
            buildy::cli::commands::config(args, &config, &config_manager).await
        }
    }
}

/// 0 = info, 1 = debug, 2+ = trace
fn init_logging(verbose: u8, config: &Config) {
    let filter = match verbose {
        0 => EnvFilter::new("buildy=info"),
        1 => EnvFilter::new("buildy=debug"),
        _ => EnvFilter::new("buildy=trace"),
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
            .with_writer(std::io::stderr)
            .init();
    }
}
