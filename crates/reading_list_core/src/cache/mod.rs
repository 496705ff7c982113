//! In-memory entry index and its refresh machinery.
//!
//! # Responsibility
//! - Hold the most recently decoded snapshot per entry id.
//! - Rebuild the index from storage with single-flight, bounded-parallel scans.
//!
//! # Invariants
//! - Cached entries are immutable `Arc` snapshots; updates replace slots.
//! - The map lock is held for one map operation at a time, never across I/O.
//! - Full refreshes add and overwrite; they never evict missing ids.

use crate::model::entry::{Entry, EntryId};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

mod refresh;
mod token;

pub use refresh::{RefreshReport, RefreshStatus};
pub(crate) use refresh::{load_entry, refresh_all};
pub(crate) use token::RefreshToken;

/// Mutex-guarded map from entry id to latest known snapshot.
#[derive(Debug, Default)]
pub struct EntryCache {
    entries: Mutex<HashMap<EntryId, Arc<Entry>>>,
}

impl EntryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached snapshot for `id`.
    pub fn get(&self, id: &str) -> Option<Arc<Entry>> {
        self.guard().get(id).cloned()
    }

    /// Installs `entry` as the snapshot for its id and returns it.
    pub fn install(&self, entry: Entry) -> Arc<Entry> {
        let snapshot = Arc::new(entry);
        self.guard()
            .insert(snapshot.id.clone(), Arc::clone(&snapshot));
        snapshot
    }

    /// Copies out every cached snapshot, in no particular order.
    pub fn snapshot(&self) -> Vec<Arc<Entry>> {
        self.guard().values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.guard().len()
    }

    pub fn is_empty(&self) -> bool {
        self.guard().is_empty()
    }

    // Snapshots are immutable, so a map poisoned mid-insert is still coherent.
    fn guard(&self) -> MutexGuard<'_, HashMap<EntryId, Arc<Entry>>> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
