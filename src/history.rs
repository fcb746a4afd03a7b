//! Build history: build directories on disk that the cache no longer tracks
//!
//! A build directory is named after its build id, so anything under the
//! base directory whose name parses as a UUID is a past (or untracked) build.

use crate::build::{pipeline, BuildId, LOG_FILE};
use crate::error::{BuildyError, BuildyResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use tokio::fs;
use tracing::debug;
use uuid::Uuid;

/// A build directory found on disk
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Former build id (the directory name)
    pub id: BuildId,

    /// Last modification of the build directory
    pub modified_at: Option<DateTime<Utc>>,

    /// Whether `build.log` exists
    pub has_log: bool,
}

/// List build directories under `base` that are not in `tracked`, newest first.
///
/// A missing base directory means no history.
pub async fn discover(base: &Path, tracked: &HashSet<BuildId>) -> BuildyResult<Vec<HistoryEntry>> {
    if !fs::try_exists(base).await.unwrap_or(false) {
        return Ok(vec![]);
    }

    let mut entries = fs::read_dir(base)
        .await
        .map_err(|e| BuildyError::io(format!("reading build directory {}", base.display()), e))?;

    let mut history = vec![];
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| BuildyError::io("reading build directory entry", e))?
    {
        let Some(id) = entry
            .file_name()
            .to_str()
            .and_then(|name| Uuid::parse_str(name).ok())
        else {
            continue;
        };

        if tracked.contains(&id) {
            continue;
        }

        let metadata = match entry.metadata().await {
            Ok(metadata) if metadata.is_dir() => metadata,
            _ => continue,
        };

        let has_log = fs::metadata(entry.path().join(LOG_FILE))
            .await
            .map(|m| m.is_file())
            .unwrap_or(false);

        history.push(HistoryEntry {
            id,
            modified_at: metadata.modified().ok().map(DateTime::<Utc>::from),
            has_log,
        });
    }

    // Sort by modification time, newest first
    history.sort_by(|a, b| b.modified_at.cmp(&a.modified_at));
    debug!("Found {} untracked build(s) in {}", history.len(), base.display());

    Ok(history)
}

/// Read the log of any build under `base`, tracked or not.
///
/// Returns `None` when there is no such build or it has no log.
pub async fn read_log(base: &Path, id: &BuildId) -> BuildyResult<Option<String>> {
    let directory = base.join(id.to_string());
    match pipeline::read_log(&directory).await {
        Ok(log) => Ok(Some(log)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(BuildyError::io(format!("reading log of build {}", id), e)),
    }
}
