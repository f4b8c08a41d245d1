//! vaulticon - vault entry icon sync
//!
//! CLI entry point that dispatches to subcommands.

use clap::Parser;
use console::style;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;
use vaulticon::cli::{Cli, Commands};
use vaulticon::config::ConfigManager;
use vaulticon::error::VaultIconResult;

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

async fn run() -> VaultIconResult<()> {
    let cli = Cli::parse();

    let config_manager = match cli.config {
        Some(ref path) => ConfigManager::with_path(path.clone()),
        None => ConfigManager::new(),
    };
    let config = config_manager.load().await?;

    // 0 = warn, 1 = info, 2+ = debug
    let filter = match cli.verbose {
        0 => EnvFilter::new("vaulticon=warn"),
        1 => EnvFilter::new("vaulticon=info"),
        _ => EnvFilter::new("vaulticon=debug"),
    };

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    if config.general.log_format == "json" {
        subscriber.json().init();
    } else {
        subscriber.without_time().init();
    }

    match cli.command {
        Commands::Sync(args) => vaulticon::cli::commands::sync(args, &config).await,
        Commands::Status(args) => vaulticon::cli::commands::status(args, &config).await,
        Commands::Icon(args) => vaulticon::cli::commands::icon(args, &config).await,
        Commands::Config(args) => {
            vaulticon::cli::commands::config(args, &config, &config_manager).await
        }
    }
}
