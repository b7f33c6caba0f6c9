//! Cache command - inspect and clear cache versions

use crate::cache::{format_bytes, CacheStore, VersionSummary};
use crate::cli::args::{CacheAction, CacheArgs, OutputFormat};
use crate::config::Config;
use crate::error::{ShellCacheError, ShellCacheResult};
use crate::router::create_router;
use console::style;
use std::io::{self, Write};
use tracing::debug;

/// Execute the cache command
pub async fn execute(args: CacheArgs, config: &Config) -> ShellCacheResult<()> {
    let router = create_router(config)?;
    let store = router.store().as_ref();

    match args.action {
        CacheAction::List { format } => list_versions(store, &config.cache.version, format).await,
        CacheAction::Show { version } => {
            let version = version.unwrap_or_else(|| config.cache.version.clone());
            show_version(store, &version).await
        }
        CacheAction::Clear { yes } => clear_versions(store, yes).await,
    }
}

async fn summaries(store: &dyn CacheStore) -> ShellCacheResult<Vec<VersionSummary>> {
    let mut summaries = vec![];
    for version in store.list_versions().await? {
        if let Some(summary) = store.version_info(&version).await? {
            summaries.push(summary);
        }
    }
    summaries.sort_by(|a, b| b.version.created_at.cmp(&a.version.created_at));
    Ok(summaries)
}

/// List all cache versions
async fn list_versions(
    store: &dyn CacheStore,
    current: &str,
    format: OutputFormat,
) -> ShellCacheResult<()> {
    let versions = summaries(store).await?;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&versions)?);
            return Ok(());
        }
        OutputFormat::Plain => {
            for summary in &versions {
                println!("{}", summary.version.name);
            }
            return Ok(());
        }
        OutputFormat::Table => {}
    }

    if versions.is_empty() {
        println!("No cache versions found.");
        return Ok(());
    }

    println!(
        "{:<24} {:<10} {:<10} {:<10} {:<20}",
        "VERSION", "STATE", "ENTRIES", "SIZE", "CREATED"
    );
    println!("{}", "-".repeat(76));

    for summary in &versions {
        let state = if summary.version.name == current {
            style("current").green().to_string()
        } else {
            style("stale").yellow().to_string()
        };

        println!(
            "{:<24} {:<10} {:<10} {:<10} {:<20}",
            summary.version.name,
            state,
            summary.entry_count,
            format_bytes(summary.size_bytes),
            summary.version.created_at.format("%Y-%m-%d %H:%M")
        );
    }

    println!();
    println!("Total: {} version(s)", versions.len());
    Ok(())
}

/// List the entries of one version
async fn show_version(store: &dyn CacheStore, version: &str) -> ShellCacheResult<()> {
    let summary = store
        .version_info(version)
        .await?
        .ok_or_else(|| ShellCacheError::VersionNotFound(version.to_string()))?;

    println!("Version: {}", style(&summary.version.name).cyan());
    println!(
        "Created: {}",
        summary.version.created_at.format("%Y-%m-%d %H:%M:%S")
    );
    println!();

    let handle = store.open(version).await?;
    let keys = store.entries(&handle).await?;
    if keys.is_empty() {
        println!("No entries.");
        return Ok(());
    }

    for key in &keys {
        println!("  {} {}", style("•").cyan(), key);
    }
    println!();
    println!(
        "Total: {} entr{} ({})",
        keys.len(),
        if keys.len() == 1 { "y" } else { "ies" },
        format_bytes(summary.size_bytes)
    );
    Ok(())
}

/// Delete every cache version
async fn clear_versions(store: &dyn CacheStore, skip_confirm: bool) -> ShellCacheResult<()> {
    let versions = store.list_versions().await?;

    if versions.is_empty() {
        println!("No cache versions to clear.");
        return Ok(());
    }

    println!("This will remove {} cache version(s):", versions.len());
    for version in &versions {
        println!("  {} {}", style("•").red(), version);
    }
    println!();

    if !skip_confirm {
        print!("Are you sure? [y/N] ");
        let _ = io::stdout().flush();

        let mut input = String::new();
        if io::stdin().read_line(&mut input).is_err() {
            println!("Failed to read input, aborting.");
            return Ok(());
        }

        if !input.trim().eq_ignore_ascii_case("y") {
            println!("Aborted.");
            return Ok(());
        }
    }

    let mut removed = 0;
    for version in &versions {
        debug!("Removing cache version: {}", version);
        if store.delete(version).await? {
            removed += 1;
        }
    }

    println!("{} cleared {} version(s)", style("✓").green(), removed);
    Ok(())
}
