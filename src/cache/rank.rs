//! Cache rank: running builds first, then newest first

use crate::build::{Build, BuildId, BuildStatus};
use chrono::{DateTime, Utc};
use std::cmp::Ordering;
use std::sync::Arc;

/// What the cache needs to know about an entry
pub trait Tracked: Send + Sync {
    /// Current status. Called on every cleanup pass and listing.
    fn status(&self) -> BuildStatus;

    /// When the entry was created
    fn created_at(&self) -> DateTime<Utc>;
}

impl Tracked for Build {
    fn status(&self) -> BuildStatus {
        Build::status(self)
    }

    fn created_at(&self) -> DateTime<Utc> {
        Build::created_at(self)
    }
}

/// An entry with its status sampled once, so sorting sees a consistent view
#[derive(Debug)]
pub(crate) struct Ranked<B> {
    pub id: BuildId,
    pub build: Arc<B>,
    pub status: BuildStatus,
    pub created_at: DateTime<Utc>,
}

/// Sample every entry's status and sort by cache rank, best first.
pub(crate) fn rank<B: Tracked>(entries: Vec<(BuildId, Arc<B>)>) -> Vec<Ranked<B>> {
    let mut ranked: Vec<Ranked<B>> = entries
        .into_iter()
        .map(|(id, build)| Ranked {
            id,
            status: build.status(),
            created_at: build.created_at(),
            build,
        })
        .collect();

    ranked.sort_by(compare);
    ranked
}

fn compare<B>(a: &Ranked<B>, b: &Ranked<B>) -> Ordering {
    b.status
        .is_running()
        .cmp(&a.status.is_running())
        .then_with(|| b.created_at.cmp(&a.created_at))
        // Deterministic order for equal timestamps
        .then_with(|| a.id.cmp(&b.id))
}
