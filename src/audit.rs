//! Audit log for cache lifecycle events
//!
//! Writes JSON lines to `<state_dir>/shellcache/audit.log`.

use crate::config::{schema::Config, ConfigManager};
use crate::router::{ActivateOutcome, InstallOutcome};
use chrono::Utc;
use std::path::PathBuf;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tracing::warn;

/// File-based audit logger that appends JSON lines
pub struct AuditLog {
    enabled: bool,
    path: PathBuf,
}

impl AuditLog {
    /// Create a new audit logger from config
    pub fn new(config: &Config) -> Self {
        Self {
            enabled: config.general.audit_log,
            path: ConfigManager::audit_log_path(),
        }
    }

    /// Log an audit event as a JSON line
    ///
    /// Silently drops events on IO failure.
    pub async fn log(&self, event: &str, data: &serde_json::Value) {
        if !self.enabled {
            return;
        }

        let entry = serde_json::json!({
            "timestamp": Utc::now().to_rfc3339(),
            "event": event,
            "data": data,
        });

        let mut line = match serde_json::to_string(&entry) {
            Ok(s) => s,
            Err(e) => {
                warn!("Failed to serialize audit event: {}", e);
                return;
            }
        };
        line.push('\n');

        if let Err(e) = self.append(&line).await {
            warn!("Failed to write audit log: {}", e);
        }
    }

    /// Record the result of an install signal
    pub async fn install(&self, outcome: &InstallOutcome) {
        let failed: Vec<_> = outcome
            .report
            .failed
            .iter()
            .map(|f| serde_json::json!({"url": f.url, "reason": f.reason}))
            .collect();
        let error = outcome
            .report
            .clone()
            .into_result()
            .err()
            .map(|e| e.to_string());
        self.log(
            "cache.install",
            &serde_json::json!({
                "version": outcome.version,
                "stored": outcome.report.stored,
                "failed": failed,
                "error": error,
                "store_error": outcome.store_error,
            }),
        )
        .await;
    }

    /// Record the result of an activate signal
    pub async fn activate(&self, outcome: &ActivateOutcome) {
        self.log(
            "cache.activate",
            &serde_json::json!({
                "current": outcome.current,
                "deleted": outcome.deleted,
                "failed": outcome.failed.iter().map(|(v, _)| v).collect::<Vec<_>>(),
            }),
        )
        .await;
    }

    async fn append(&self, line: &str) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;

        file.write_all(line.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }
}
