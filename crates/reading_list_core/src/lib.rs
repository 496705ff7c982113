//! Core domain logic for the reading list.
//! This crate owns entry storage, the entry file format and the entry cache.

pub mod cache;
pub mod codec;
pub mod error;
pub mod logging;
pub mod model;
pub mod service;
pub mod storage;

pub use cache::{EntryCache, RefreshReport, RefreshStatus};
pub use codec::{decode_entry, encode_entry, CodecError, CodecResult};
pub use error::{AggregateError, EntryError, EntryResult, ItemFailure};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::date::{format_date, parse_date, EntryDate};
pub use model::entry::{
    gen_id, make_source, validate_id, Entry, EntryId, EntryValidationError, Source,
    ENTRY_FILE_EXTENSION,
};
pub use model::form::EntryForm;
pub use model::order::{fifo_cmp, fifo_sort};
pub use service::config::ManagerConfig;
pub use service::entry_manager::{EntryListResult, EntryManager, EntryStore, RefreshTask};
pub use storage::{DirStorage, EntryStorage, MemoryStorage, RecordFile};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
