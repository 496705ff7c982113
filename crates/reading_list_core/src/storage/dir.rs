//! Directory-backed storage adapter.

use super::{check_flat_name, EntryStorage, RecordFile};
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Stores each record as one file in a flat directory.
#[derive(Debug, Clone)]
pub struct DirStorage {
    root: PathBuf,
}

impl DirStorage {
    /// Uses an existing directory as the record store.
    ///
    /// # Errors
    /// - `NotFound` / `NotADirectory`-style errors when `root` is not a directory.
    pub fn open(root: impl AsRef<Path>) -> io::Result<Self> {
        let root = root.as_ref().to_path_buf();
        let metadata = fs::metadata(&root)?;
        if !metadata.is_dir() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("`{}` is not a directory", root.display()),
            ));
        }
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, name: &str) -> io::Result<PathBuf> {
        check_flat_name(name)?;
        Ok(self.root.join(name))
    }

    /// Writes `bytes` to a synced temp file beside the records.
    ///
    /// The temp name has no record suffix, so listings never pick it up; it
    /// is removed on drop unless persisted.
    fn stage(&self, bytes: &[u8]) -> io::Result<NamedTempFile> {
        let mut staged = NamedTempFile::new_in(&self.root)?;
        staged.write_all(bytes)?;
        staged.as_file().sync_all()?;
        Ok(staged)
    }
}

impl EntryStorage for DirStorage {
    fn list_names(&self, suffix: &str) -> io::Result<Vec<String>> {
        let mut names = Vec::new();
        for item in fs::read_dir(&self.root)? {
            let item = item?;
            if !item.file_type()?.is_file() {
                continue;
            }
            if let Some(name) = item.file_name().to_str() {
                if name.ends_with(suffix) {
                    names.push(name.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }

    fn open(&self, name: &str) -> io::Result<Box<dyn RecordFile>> {
        let file = OpenOptions::new().read(true).open(self.resolve(name)?)?;
        Ok(Box::new(file))
    }

    fn create_new(&self, name: &str, bytes: &[u8]) -> io::Result<()> {
        let target = self.resolve(name)?;
        self.stage(bytes)?
            .persist_noclobber(&target)
            .map_err(|err| err.error)?;
        Ok(())
    }

    fn replace(&self, name: &str, bytes: &[u8]) -> io::Result<()> {
        let target = self.resolve(name)?;
        self.stage(bytes)?.persist(&target).map_err(|err| err.error)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::DirStorage;
    use crate::storage::EntryStorage;
    use std::io::{ErrorKind, Read};
    use tempfile::TempDir;

    #[test]
    fn lists_only_matching_regular_files() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("b.md"), "b").unwrap();
        std::fs::write(dir.path().join("a.md"), "a").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "x").unwrap();
        std::fs::create_dir(dir.path().join("nested.md")).unwrap();

        let storage = DirStorage::open(dir.path()).unwrap();
        assert_eq!(storage.list_names(".md").unwrap(), vec!["a.md", "b.md"]);
    }

    #[test]
    fn create_new_refuses_to_clobber() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("taken.md"), "original").unwrap();
        let storage = DirStorage::open(dir.path()).unwrap();

        let err = storage.create_new("taken.md", b"clobber").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AlreadyExists);
        storage.create_new("fresh.md", b"hello").unwrap();

        assert_eq!(std::fs::read_to_string(dir.path().join("taken.md")).unwrap(), "original");
        assert_eq!(std::fs::read_to_string(dir.path().join("fresh.md")).unwrap(), "hello");
    }

    #[test]
    fn refused_create_leaves_no_staging_files() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("taken.md"), "original").unwrap();
        let storage = DirStorage::open(dir.path()).unwrap();

        storage.create_new("taken.md", b"clobber").unwrap_err();
        storage.replace("taken.md", b"replaced").unwrap();

        let names: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|item| item.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(names, vec!["taken.md"]);
    }

    #[test]
    fn create_new_publishes_complete_contents() {
        let dir = TempDir::new().unwrap();
        let storage = DirStorage::open(dir.path()).unwrap();

        storage.create_new("fresh.md", b"---\ntitle: Fresh\n---\n").unwrap();
        let mut text = String::new();
        storage.open("fresh.md").unwrap().read_to_string(&mut text).unwrap();
        assert_eq!(text, "---\ntitle: Fresh\n---\n");
    }

    #[test]
    fn replace_swaps_whole_contents() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("entry.md"), "a much longer original body").unwrap();
        let storage = DirStorage::open(dir.path()).unwrap();

        storage.replace("entry.md", b"short").unwrap();
        let mut text = String::new();
        storage.open("entry.md").unwrap().read_to_string(&mut text).unwrap();
        assert_eq!(text, "short");
        assert_eq!(storage.list_names(".md").unwrap(), vec!["entry.md"]);
    }

    #[test]
    fn rejects_names_with_separators() {
        let dir = TempDir::new().unwrap();
        let storage = DirStorage::open(dir.path()).unwrap();
        let err = storage.open("../escape.md").err().unwrap();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }
}
