//! Bounded registry of tracked builds

use crate::build::{Build, BuildId, BuildStatus};
use crate::cache::rank::{rank, Tracked};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, info};

/// Builds tracked in memory, keyed by id, holding at most `capacity`
/// entries unless running builds alone need more room.
///
/// Writers are serialized by `write_lock` for the whole cleanup+insert.
/// Readers only take the map's read lock, which writers hold just long
/// enough to apply a cleanup decision, so reads never wait on status polls.
#[derive(Debug)]
pub struct BuildCache<B = Build> {
    capacity: usize,
    entries: RwLock<HashMap<BuildId, Arc<B>>>,
    write_lock: Mutex<()>,
}

impl<B: Tracked> BuildCache<B> {
    /// Create an empty cache. A capacity of 0 is treated as 1.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: RwLock::new(HashMap::new()),
            write_lock: Mutex::new(()),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Insert or replace `id`, evicting low-ranked builds first.
    ///
    /// Never rejects and never evicts a running build. Returns the evicted
    /// builds; their directories stay on disk.
    pub fn put(&self, id: BuildId, build: B) -> Vec<(BuildId, Arc<B>)> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);

        let evicted = self.cleanup(id);

        let mut entries = self.write();
        for (old, _) in &evicted {
            entries.remove(old);
        }
        entries.insert(id, Arc::new(build));
        drop(entries);

        if !evicted.is_empty() {
            info!("Evicted {} build(s) from cache", evicted.len());
        }
        evicted
    }

    /// Look up a tracked build
    pub fn get(&self, id: &BuildId) -> Option<Arc<B>> {
        self.read().get(id).cloned()
    }

    /// All tracked builds, running first, then newest first
    pub fn values(&self) -> Vec<Arc<B>> {
        self.ranked().into_iter().map(|(build, _)| build).collect()
    }

    /// Like [`values`](Self::values), paired with the status each build
    /// was ranked by
    pub fn ranked(&self) -> Vec<(Arc<B>, BuildStatus)> {
        rank(self.snapshot(None))
            .into_iter()
            .map(|entry| (entry.build, entry.status))
            .collect()
    }

    /// Ids of all tracked builds
    pub fn keys(&self) -> HashSet<BuildId> {
        self.read().keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Poll every tracked build once. Returns how many are still running.
    pub fn refresh(&self) -> usize {
        self.snapshot(None)
            .iter()
            .filter(|(_, build)| build.status().is_running())
            .count()
    }

    /// Decide which entries to drop before `incoming` is inserted.
    ///
    /// | tracked (excluding `incoming`) | kept                                |
    /// |--------------------------------|-------------------------------------|
    /// | `< capacity`                   | everything                          |
    /// | `>= capacity`                  | top `max(capacity - 1, running)`    |
    ///
    /// Statuses are polled fresh on every pass.
    fn cleanup(&self, incoming: BuildId) -> Vec<(BuildId, Arc<B>)> {
        let candidates = self.snapshot(Some(incoming));
        if candidates.len() < self.capacity {
            return Vec::new();
        }

        let mut ranked = rank(candidates);
        let running = ranked.iter().filter(|e| e.status.is_running()).count();
        let keep = (self.capacity - 1).max(running);
        debug!(
            "Cache cleanup: {} tracked, {} running, keeping {}",
            ranked.len(),
            running,
            keep
        );

        ranked
            .split_off(keep.min(ranked.len()))
            .into_iter()
            .map(|entry| (entry.id, entry.build))
            .collect()
    }

    fn snapshot(&self, except: Option<BuildId>) -> Vec<(BuildId, Arc<B>)> {
        self.read()
            .iter()
            .filter(|(id, _)| Some(**id) != except)
            .map(|(id, build)| (*id, Arc::clone(build)))
            .collect()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<BuildId, Arc<B>>> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<BuildId, Arc<B>>> {
        self.entries.write().unwrap_or_else(PoisonError::into_inner)
    }
}
