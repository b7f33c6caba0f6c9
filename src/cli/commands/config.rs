//! Config command - show or initialize configuration

use crate::cli::args::{ConfigAction, ConfigArgs};
use crate::config::{Config, ConfigManager};
use crate::error::ShellCacheResult;
use console::style;

/// Execute the config command
///
/// Runs before the configuration is loaded so `init --force` can repair a
/// broken file.
pub async fn execute(args: ConfigArgs, manager: &ConfigManager) -> ShellCacheResult<()> {
    match args.action {
        None | Some(ConfigAction::Show) => {
            let config = manager.load().await?;
            println!("{}", render(&config)?);
        }
        Some(ConfigAction::Path) => println!("{}", manager.path().display()),
        Some(ConfigAction::Init { force }) => init_config(manager, force).await?,
    }

    Ok(())
}

fn render(config: &Config) -> ShellCacheResult<String> {
    Ok(toml::to_string_pretty(config)?)
}

async fn init_config(manager: &ConfigManager, force: bool) -> ShellCacheResult<()> {
    let path = manager.path();

    if path.exists() && !force {
        eprintln!(
            "{} Config already exists at {}",
            style("!").yellow(),
            path.display()
        );
        eprintln!("  Use --force to overwrite");
        return Ok(());
    }

    manager.save(&Config::default()).await?;
    println!(
        "{} Configuration initialized at {}",
        style("✓").green(),
        path.display()
    );
    Ok(())
}
