//! Activate command - remove stale cache versions

use crate::audit::AuditLog;
use crate::config::Config;
use crate::error::ShellCacheResult;
use crate::router::{create_router, Lifecycle};
use console::style;

/// Execute the activate command
pub async fn execute(config: &Config) -> ShellCacheResult<()> {
    let router = create_router(config)?;
    let outcome = router.on_activate().await;
    AuditLog::new(config).activate(&outcome).await;

    for version in &outcome.deleted {
        println!("  {} removed {}", style("•").red(), version);
    }
    for (version, reason) in &outcome.failed {
        println!(
            "  {} could not remove {} ({})",
            style("!").yellow(),
            version,
            reason
        );
    }

    if outcome.deleted.is_empty() && outcome.failed.is_empty() {
        println!("No stale cache versions.");
    }

    println!(
        "{} Active version: {}",
        style("✓").green(),
        style(&outcome.current).cyan()
    );

    Ok(())
}
