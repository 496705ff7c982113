//! Entry manager facade.
//!
//! # Responsibility
//! - Provide `read`/`update`/`list` over file-per-entry storage.
//! - Keep the in-memory cache coherent with what was last read or written.
//!
//! # Invariants
//! - `read` always re-reads the backing file before answering.
//! - `update` validates the id before any storage access, keeps header keys
//!   the model does not know about, and answers with the re-read snapshot.
//! - `list` runs (or joins) a full refresh before serving from the cache,
//!   and serves every decodable entry even when some files are broken.

use crate::cache::{self, EntryCache, RefreshReport, RefreshToken};
use crate::codec::encode_to_vec;
use crate::error::{EntryError, EntryResult};
use crate::model::entry::{validate_id, Entry};
use crate::model::order::fifo_sort;
use crate::service::config::ManagerConfig;
use crate::storage::EntryStorage;
use log::{debug, error, info, warn};
use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;

/// Collaborator-facing entry operations.
pub trait EntryStore: Send + Sync {
    /// Reads one entry fresh from storage.
    fn read(&self, id: &str) -> EntryResult<Arc<Entry>>;
    /// Creates or overwrites one entry.
    fn update(&self, entry: Entry) -> EntryResult<Arc<Entry>>;
    /// Lists up to `limit` entries in FIFO order.
    fn list(&self, limit: usize) -> EntryResult<Vec<Arc<Entry>>>;
}

/// List result envelope.
#[derive(Debug)]
pub struct EntryListResult {
    /// At most `limit` entries, oldest unread first.
    pub items: Vec<Arc<Entry>>,
    /// Outcome of the refresh that preceded the listing.
    pub refresh: RefreshReport,
}

/// Handle to a refresh running on its own thread.
#[derive(Debug)]
pub struct RefreshTask {
    handle: JoinHandle<RefreshReport>,
}

impl RefreshTask {
    /// Blocks until the refresh finishes and returns its report.
    pub fn wait(self) -> RefreshReport {
        self.handle.join().unwrap_or_else(|_| {
            RefreshReport::aborted(EntryError::Io {
                id: None,
                source: io::Error::other("background refresh panicked"),
            })
        })
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

/// Cache-backed CRUD over a flat entry store.
pub struct EntryManager {
    storage: Arc<dyn EntryStorage>,
    cache: EntryCache,
    token: RefreshToken,
    config: ManagerConfig,
}

impl EntryManager {
    /// Creates a manager with an empty cache.
    pub fn new(storage: Arc<dyn EntryStorage>, config: ManagerConfig) -> Self {
        Self {
            storage,
            cache: EntryCache::new(),
            token: RefreshToken::new(),
            config,
        }
    }

    /// Creates a manager and warms the cache with one full refresh.
    ///
    /// Broken entry files are logged, never fatal.
    pub fn open(storage: Arc<dyn EntryStorage>, config: ManagerConfig) -> Self {
        let manager = Self::new(storage, config);
        let report = manager.refresh_all();
        if !report.failures.is_empty() {
            warn!(
                "event=manager_open module=manager status=degraded loaded={} failures={}",
                report.loaded,
                report.failures.len()
            );
        }
        manager
    }

    pub fn config(&self) -> ManagerConfig {
        self.config
    }

    /// Reads the entry with `id`, refreshing its cache slot.
    ///
    /// # Errors
    /// - `Validation` when `id` is not a valid slug.
    /// - `NotFound` when no file backs `id`.
    /// - `Format`/`Io` when the file cannot be decoded.
    pub fn read(&self, id: &str) -> EntryResult<Arc<Entry>> {
        validate_id(id)?;
        self.refresh_one(id)
    }

    /// Creates or overwrites the entry and returns the stored snapshot.
    ///
    /// New ids get a new file, published only once fully written. Existing
    /// files are re-read so header keys the entry does not model (and the
    /// body) are carried over, then replaced atomically. Concurrent saves of
    /// one id resolve last-writer-wins.
    pub fn update(&self, mut entry: Entry) -> EntryResult<Arc<Entry>> {
        // The id becomes a file name; reject anything but a slug first.
        entry.validate()?;
        let started_at = Instant::now();
        let name = entry.file_name();

        let fresh = encode_to_vec(&entry).map_err(|err| EntryError::codec(&entry.id, err))?;
        let mode = match self.storage.create_new(&name, &fresh) {
            Ok(()) => "create",
            Err(err) if err.kind() == io::ErrorKind::AlreadyExists => {
                let stored = cache::load_entry(self.storage.as_ref(), &entry.id)?;
                entry.adopt_original(&stored);
                let bytes = encode_to_vec(&entry).map_err(|err| EntryError::codec(&entry.id, err))?;
                self.storage.replace(&name, &bytes).map_err(|err| {
                    error!(
                        "event=entry_update module=manager status=error id={} mode=replace error={}",
                        entry.id, err
                    );
                    EntryError::storage(&entry.id, err)
                })?;
                "replace"
            }
            Err(err) => {
                error!(
                    "event=entry_update module=manager status=error id={} mode=create error={}",
                    entry.id, err
                );
                return Err(EntryError::storage(&entry.id, err));
            }
        };

        info!(
            "event=entry_update module=manager status=ok id={} mode={} duration_ms={}",
            entry.id,
            mode,
            started_at.elapsed().as_millis()
        );
        self.refresh_one(&entry.id)
    }

    /// Lists up to `limit` entries, oldest unread first.
    ///
    /// Runs or joins a full refresh first. Refresh failures are reported in
    /// the result and logged; they never hide entries that did decode.
    pub fn list(&self, limit: usize) -> EntryListResult {
        let refresh = self.refresh_all();
        if !refresh.failures.is_empty() {
            warn!(
                "event=entry_list module=manager status=degraded failures={}",
                refresh.failures.len()
            );
        }

        let mut items = self.cache.snapshot();
        fifo_sort(&mut items);
        items.truncate(limit);
        EntryListResult { items, refresh }
    }

    /// Rebuilds the cache from storage, or joins the refresh already running.
    ///
    /// At most one scan runs at a time. Callers arriving mid-scan block until
    /// it finishes and get a `coalesced` report without scanning again.
    pub fn refresh_all(&self) -> RefreshReport {
        match self.token.acquire_or_wait() {
            Some(_driver) => {
                cache::refresh_all(self.storage.as_ref(), &self.cache, self.config.workers)
            }
            None => {
                debug!("event=entry_refresh module=cache status=coalesced");
                RefreshReport::coalesced()
            }
        }
    }

    /// Starts `refresh_all` on a background thread.
    pub fn refresh_in_background(self: &Arc<Self>) -> RefreshTask {
        let manager = Arc::clone(self);
        RefreshTask {
            handle: thread::spawn(move || manager.refresh_all()),
        }
    }

    /// Re-reads one entry from storage and installs it into the cache.
    pub fn refresh_one(&self, id: &str) -> EntryResult<Arc<Entry>> {
        let entry = cache::load_entry(self.storage.as_ref(), id).map_err(|err| {
            debug!("event=entry_read module=manager status=error id={id} error={err}");
            err
        })?;
        Ok(self.cache.install(entry))
    }

    /// Returns the cached snapshot for `id` without touching storage.
    pub fn cached(&self, id: &str) -> Option<Arc<Entry>> {
        self.cache.get(id)
    }

    pub fn cached_len(&self) -> usize {
        self.cache.len()
    }

    /// Whether a full refresh is currently running.
    pub fn refresh_in_progress(&self) -> bool {
        self.token.is_held()
    }

    /// Number of callers blocked on the running full refresh.
    pub fn refresh_waiters(&self) -> usize {
        self.token.waiting()
    }
}

impl EntryStore for EntryManager {
    fn read(&self, id: &str) -> EntryResult<Arc<Entry>> {
        EntryManager::read(self, id)
    }

    fn update(&self, entry: Entry) -> EntryResult<Arc<Entry>> {
        EntryManager::update(self, entry)
    }

    fn list(&self, limit: usize) -> EntryResult<Vec<Arc<Entry>>> {
        Ok(EntryManager::list(self, limit).items)
    }
}
