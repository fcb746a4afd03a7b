//! Audit journal for build events
//!
//! Writes JSON lines to `<builds directory>/audit.log`, next to the build
//! directories it describes. On by default.

use crate::config::Config;
use chrono::Utc;
use std::path::{Path, PathBuf};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tracing::warn;

/// Journal file name inside the builds directory
pub const AUDIT_FILE: &str = "audit.log";

/// File-based audit logger that appends JSON lines
#[derive(Debug)]
pub struct AuditLog {
    enabled: bool,
    path: PathBuf,
}

impl AuditLog {
    /// Create an audit logger writing into `builds_dir`
    pub fn new(config: &Config, builds_dir: &Path) -> Self {
        Self {
            enabled: config.general.audit_log,
            path: builds_dir.join(AUDIT_FILE),
        }
    }

    /// Log an audit event as a JSON line
    ///
    /// IO failures are logged and dropped; they never fail a request.
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

    async fn append(&self, line: &str) -> std::io::Result<()> {
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
