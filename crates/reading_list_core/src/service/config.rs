//! Entry manager configuration.

use std::num::NonZeroUsize;

/// Tunables fixed when an `EntryManager` is constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ManagerConfig {
    /// Upper bound on concurrent file decodes during a full refresh.
    pub workers: usize,
}

impl ManagerConfig {
    /// Uses exactly `workers` refresh workers (at least one).
    pub fn with_workers(workers: usize) -> Self {
        Self {
            workers: workers.max(1),
        }
    }
}

impl Default for ManagerConfig {
    /// One refresh worker per available processing unit.
    fn default() -> Self {
        let workers = std::thread::available_parallelism()
            .map(NonZeroUsize::get)
            .unwrap_or(1);
        Self::with_workers(workers)
    }
}
