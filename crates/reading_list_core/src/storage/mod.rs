//! Storage capability used by the entry manager.
//!
//! # Responsibility
//! - Name the exact file operations the manager needs: enumerate by suffix,
//!   open for reading, create-if-absent, and whole-file replacement.
//! - Keep filesystem details out of cache and manager code.
//!
//! # Invariants
//! - Names are flat file names (`<id>.md`); adapters reject path separators.
//! - `create_new` fails with `ErrorKind::AlreadyExists` when the name exists.
//! - `create_new` and `replace` publish whole files: readers see no file,
//!   the old bytes, or the new bytes, never a partial write. A failed call
//!   leaves nothing behind.

use std::io::{self, Read, Seek};

mod dir;
mod memory;

pub use dir::DirStorage;
pub use memory::MemoryStorage;

/// A record opened for reading. Dropping the handle closes it.
pub trait RecordFile: Read + Seek + Send {}

impl<T: Read + Seek + Send> RecordFile for T {}

/// Flat, file-per-record storage.
pub trait EntryStorage: Send + Sync {
    /// Lists names of regular files ending with `suffix`, sorted.
    fn list_names(&self, suffix: &str) -> io::Result<Vec<String>>;
    /// Opens an existing file for reading.
    fn open(&self, name: &str) -> io::Result<Box<dyn RecordFile>>;
    /// Publishes `bytes` as `name` only if `name` does not exist yet.
    fn create_new(&self, name: &str, bytes: &[u8]) -> io::Result<()>;
    /// Atomically replaces the full contents of `name`.
    fn replace(&self, name: &str, bytes: &[u8]) -> io::Result<()>;
}

pub(crate) fn check_flat_name(name: &str) -> io::Result<()> {
    if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\']) {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("invalid storage name `{name}`"),
        ));
    }
    Ok(())
}
