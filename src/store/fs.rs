use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use super::{Store, StoreError};

/// Filesystem-backed store: one file per key under a root directory,
/// containing the raw payload with no envelope. The file's own modified
/// time is the staleness signal.
pub struct FsStore {
    root: PathBuf,
}

impl FsStore {
    /// Open a store rooted at `root`, creating the directory if missing.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|source| StoreError::Create {
            path: root.clone(),
            source,
        })?;
        Ok(FsStore { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }
}

impl Store for FsStore {
    fn stat(&self, key: &str) -> Result<Option<SystemTime>, StoreError> {
        let path = self.entry_path(key);
        match fs::metadata(&path) {
            Ok(meta) if meta.is_file() => {
                let modified = meta
                    .modified()
                    .map_err(|source| StoreError::Stat { path, source })?;
                Ok(Some(modified))
            }
            // A directory at the entry path is not an entry.
            Ok(_) => Ok(None),
            Err(source) if source.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StoreError::Stat { path, source }),
        }
    }

    fn read(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let path = self.entry_path(key);
        match fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(source) if source.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StoreError::Read { path, source }),
        }
    }

    fn write(&self, key: &str, bytes: &[u8]) -> Result<(), StoreError> {
        let path = self.entry_path(key);
        fs::write(&path, bytes).map_err(|source| StoreError::Write { path, source })
    }
}
