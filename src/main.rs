//! shellcache - Offline shell cache for live-data dashboards
//!
//! CLI entry point that dispatches to subcommands.

use clap::Parser;
use console::style;
use shellcache::cli::{Cli, Commands};
use shellcache::config::ConfigManager;
use shellcache::error::ShellCacheResult;
use std::process::ExitCode;
use tracing::debug;
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

async fn run() -> ShellCacheResult<()> {
    let cli = Cli::parse();

    let config_manager = if let Some(ref path) = cli.config {
        ConfigManager::with_path(path.clone())
    } else {
        ConfigManager::new()
    };

    // Config command handles its own loading so init can repair a bad file
    if let Commands::Config(args) = cli.command {
        init_logging(cli.verbose, false);
        return shellcache::cli::commands::config(args, &config_manager).await;
    }

    let config = config_manager.load().await?;
    init_logging(cli.verbose, config.general.log_format == "json");
    debug!("Loaded configuration from {}", config_manager.path().display());

    match cli.command {
        Commands::Config(_) => unreachable!("Config handled above"),
        Commands::Install => shellcache::cli::commands::install(&config).await,
        Commands::Activate => shellcache::cli::commands::activate(&config).await,
        Commands::Fetch(args) => shellcache::cli::commands::fetch(args, &config).await,
        Commands::Cache(args) => shellcache::cli::commands::cache(args, &config).await,
    }
}

/// Initialize logging: 0 = warn, 1 = info, 2+ = debug
fn init_logging(verbose: u8, json: bool) {
    let filter = match verbose {
        0 => EnvFilter::new("shellcache=warn"),
        1 => EnvFilter::new("shellcache=info"),
        _ => EnvFilter::new("shellcache=debug"),
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    if json {
        builder.json().init();
    } else {
        builder.without_time().init();
    }
}
