//! Install command - create the current version and precache the shell

use crate::audit::AuditLog;
use crate::config::Config;
use crate::error::ShellCacheResult;
use crate::router::{create_router, Lifecycle};
use console::{style, Emoji};

static CHECK: Emoji<'_, '_> = Emoji("✓ ", "[OK] ");
static CROSS: Emoji<'_, '_> = Emoji("✗ ", "[FAIL] ");

/// Execute the install command
///
/// Partial precache is reported but is not a failure.
pub async fn execute(config: &Config) -> ShellCacheResult<()> {
    let router = create_router(config)?;
    let outcome = router.on_install().await;
    AuditLog::new(config).install(&outcome).await;

    println!(
        "Installing cache version {}",
        style(&outcome.version).cyan()
    );

    if let Some(reason) = &outcome.store_error {
        println!(
            "  {} {} ({})",
            CROSS,
            style("Cache store unavailable").red(),
            reason
        );
    }

    for url in &outcome.report.stored {
        println!("  {}{}", CHECK, url);
    }
    for failure in &outcome.report.failed {
        println!(
            "  {}{} {}",
            CROSS,
            failure.url,
            style(format!("({})", failure.reason)).dim()
        );
    }

    println!();
    match outcome.report.into_result() {
        Ok(stored) => println!("{} Precached {} asset(s)", style("✓").green(), stored.len()),
        Err(e) => println!(
            "{} {}; missing assets are fetched on demand",
            style("!").yellow(),
            e
        ),
    }

    Ok(())
}
