//! Full and single-entry cache refresh from storage.

use super::EntryCache;
use crate::codec::decode_entry;
use crate::error::{AggregateError, EntryError, EntryResult, ItemFailure};
use crate::model::entry::{entry_file_name, Entry, EntryId, ENTRY_FILE_EXTENSION};
use crate::storage::EntryStorage;
use log::{info, warn};
use std::io;
use std::sync::mpsc;
use std::sync::Mutex;
use std::thread;
use std::time::Instant;

/// Overall outcome of one full refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshStatus {
    /// Every enumerated entry was decoded.
    Clean,
    /// Some entries were decoded, some failed.
    Partial,
    /// Nothing was decoded and at least one failure was recorded.
    Failed,
}

/// Result of `refresh_all`: what was loaded and what failed.
#[derive(Debug, Default)]
pub struct RefreshReport {
    /// Files found by enumeration.
    pub scanned: usize,
    /// Entries decoded and installed into the cache.
    pub loaded: usize,
    pub failures: Vec<ItemFailure>,
    /// The caller joined a refresh already in flight instead of scanning.
    pub coalesced: bool,
}

impl RefreshReport {
    pub(crate) fn coalesced() -> Self {
        Self {
            coalesced: true,
            ..Self::default()
        }
    }

    pub(crate) fn aborted(error: EntryError) -> Self {
        Self {
            failures: vec![ItemFailure { id: None, error }],
            ..Self::default()
        }
    }

    pub fn status(&self) -> RefreshStatus {
        if self.failures.is_empty() {
            RefreshStatus::Clean
        } else if self.loaded == 0 {
            RefreshStatus::Failed
        } else {
            RefreshStatus::Partial
        }
    }

    /// Converts the report into the number of loaded entries, or every
    /// recorded failure.
    pub fn into_result(self) -> EntryResult<usize> {
        if self.failures.is_empty() {
            Ok(self.loaded)
        } else {
            Err(EntryError::Aggregate(AggregateError::new(self.failures)))
        }
    }
}

/// Decodes one stored entry.
pub(crate) fn load_entry(storage: &dyn EntryStorage, id: &str) -> EntryResult<Entry> {
    let file = storage
        .open(&entry_file_name(id))
        .map_err(|err| EntryError::storage(id, err))?;
    decode_entry(id, file).map_err(|err| EntryError::codec(id, err))
}

/// Scans storage and installs every decodable entry into `cache`.
///
/// Caller must hold the refresh token. Failures are collected per item;
/// successfully decoded entries are installed regardless.
pub(crate) fn refresh_all(
    storage: &dyn EntryStorage,
    cache: &EntryCache,
    workers: usize,
) -> RefreshReport {
    let started_at = Instant::now();
    info!("event=entry_refresh module=cache status=start workers={workers}");

    let suffix = format!(".{ENTRY_FILE_EXTENSION}");
    let names = match storage.list_names(&suffix) {
        Ok(names) => names,
        Err(err) => {
            warn!(
                "event=entry_refresh module=cache status=error duration_ms={} error_code=enumerate_failed error={}",
                started_at.elapsed().as_millis(),
                err
            );
            return RefreshReport::aborted(EntryError::Io {
                id: None,
                source: err,
            });
        }
    };
    let ids: Vec<EntryId> = names
        .iter()
        .filter_map(|name| name.strip_suffix(suffix.as_str()))
        .map(str::to_string)
        .collect();

    let mut report = RefreshReport {
        scanned: ids.len(),
        ..RefreshReport::default()
    };

    let (id_tx, id_rx) = mpsc::channel::<EntryId>();
    for id in ids {
        // Receiver is alive until the end of this function.
        let _ = id_tx.send(id);
    }
    drop(id_tx);
    let queue = Mutex::new(id_rx);

    let pool_size = workers.max(1).min(report.scanned.max(1));
    thread::scope(|scope| {
        let handles: Vec<_> = (0..pool_size)
            .map(|_| scope.spawn(|| drain_queue(storage, cache, &queue)))
            .collect();
        for handle in handles {
            match handle.join() {
                Ok((loaded, mut failures)) => {
                    report.loaded += loaded;
                    report.failures.append(&mut failures);
                }
                Err(_) => report.failures.push(ItemFailure {
                    id: None,
                    error: EntryError::Io {
                        id: None,
                        source: io::Error::other("refresh worker panicked"),
                    },
                }),
            }
        }
    });

    info!(
        "event=entry_refresh module=cache status=ok scanned={} loaded={} failures={} duration_ms={}",
        report.scanned,
        report.loaded,
        report.failures.len(),
        started_at.elapsed().as_millis()
    );
    report
}

fn drain_queue(
    storage: &dyn EntryStorage,
    cache: &EntryCache,
    queue: &Mutex<mpsc::Receiver<EntryId>>,
) -> (usize, Vec<ItemFailure>) {
    let mut loaded = 0;
    let mut failures = Vec::new();
    loop {
        let next = queue
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .recv();
        let Ok(id) = next else {
            break;
        };
        match load_entry(storage, &id) {
            Ok(entry) => {
                cache.install(entry);
                loaded += 1;
            }
            Err(error) => {
                warn!(
                    "event=entry_refresh_item module=cache status=error id={} error={}",
                    id, error
                );
                failures.push(ItemFailure {
                    id: Some(id),
                    error,
                });
            }
        }
    }
    (loaded, failures)
}
