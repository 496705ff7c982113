//! In-memory storage adapter.
//!
//! Mirrors the directory adapter's contract without touching disk; used by
//! tests and by callers that need a disposable store.

use super::{check_flat_name, EntryStorage, RecordFile};
use std::collections::BTreeMap;
use std::io::{self, Read, Seek, SeekFrom};
use std::sync::{Arc, Mutex, MutexGuard};

type SharedBytes = Arc<Mutex<Vec<u8>>>;

/// Map-backed record store.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    files: Mutex<BTreeMap<String, SharedBytes>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds or overwrites one file.
    pub fn insert(&self, name: impl Into<String>, bytes: impl Into<Vec<u8>>) {
        self.files_guard()
            .insert(name.into(), Arc::new(Mutex::new(bytes.into())));
    }

    /// Returns a copy of one file's bytes.
    pub fn contents(&self, name: &str) -> Option<Vec<u8>> {
        self.files_guard().get(name).map(|bytes| lock(bytes).clone())
    }

    fn files_guard(&self) -> MutexGuard<'_, BTreeMap<String, SharedBytes>> {
        self.files
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl EntryStorage for MemoryStorage {
    fn list_names(&self, suffix: &str) -> io::Result<Vec<String>> {
        Ok(self
            .files_guard()
            .keys()
            .filter(|name| name.ends_with(suffix))
            .cloned()
            .collect())
    }

    fn open(&self, name: &str) -> io::Result<Box<dyn RecordFile>> {
        check_flat_name(name)?;
        let files = self.files_guard();
        let bytes = files.get(name).ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, format!("no file `{name}`"))
        })?;
        Ok(Box::new(MemoryFile::new(Arc::clone(bytes))))
    }

    fn create_new(&self, name: &str, bytes: &[u8]) -> io::Result<()> {
        check_flat_name(name)?;
        let mut files = self.files_guard();
        if files.contains_key(name) {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("file `{name}` already exists"),
            ));
        }
        files.insert(name.to_string(), Arc::new(Mutex::new(bytes.to_vec())));
        Ok(())
    }

    fn replace(&self, name: &str, bytes: &[u8]) -> io::Result<()> {
        check_flat_name(name)?;
        self.insert(name, bytes);
        Ok(())
    }
}

fn lock(bytes: &SharedBytes) -> MutexGuard<'_, Vec<u8>> {
    bytes.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Cursor over one shared in-memory file.
struct MemoryFile {
    bytes: SharedBytes,
    position: u64,
}

impl MemoryFile {
    fn new(bytes: SharedBytes) -> Self {
        Self { bytes, position: 0 }
    }
}

impl Read for MemoryFile {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let data = lock(&self.bytes);
        let start = usize::try_from(self.position)
            .unwrap_or(usize::MAX)
            .min(data.len());
        let count = buf.len().min(data.len() - start);
        buf[..count].copy_from_slice(&data[start..start + count]);
        self.position += count as u64;
        Ok(count)
    }
}

impl Seek for MemoryFile {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let len = lock(&self.bytes).len() as i128;
        let target = match pos {
            SeekFrom::Start(offset) => i128::from(offset),
            SeekFrom::End(offset) => len + i128::from(offset),
            SeekFrom::Current(offset) => i128::from(self.position) + i128::from(offset),
        };
        if target < 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "seek before start of file",
            ));
        }
        self.position = target as u64;
        Ok(self.position)
    }
}
