use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::SystemTime;

use super::{Store, StoreError};

#[derive(Clone)]
struct Entry {
    bytes: Vec<u8>,
    modified: SystemTime,
}

/// In-memory store backed by `Arc<RwLock<HashMap>>`.
///
/// Clone-friendly (cloning shares the same underlying storage). Useful as a
/// process-local cache and as a stand-in for [`FsStore`] in tests.
#[derive(Clone)]
pub struct InMemoryStore {
    entries: Arc<RwLock<HashMap<String, Entry>>>,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStore {
    pub fn new() -> Self {
        InMemoryStore {
            entries: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl Store for InMemoryStore {
    fn stat(&self, key: &str) -> Result<Option<SystemTime>, StoreError> {
        let entries = self
            .entries
            .read()
            .map_err(|_| StoreError::Poisoned("entries read"))?;
        Ok(entries.get(key).map(|entry| entry.modified))
    }

    fn read(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let entries = self
            .entries
            .read()
            .map_err(|_| StoreError::Poisoned("entries read"))?;
        Ok(entries.get(key).map(|entry| entry.bytes.clone()))
    }

    fn write(&self, key: &str, bytes: &[u8]) -> Result<(), StoreError> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| StoreError::Poisoned("entries write"))?;
        entries.insert(
            key.to_string(),
            Entry {
                bytes: bytes.to_vec(),
                modified: SystemTime::now(),
            },
        );
        Ok(())
    }
}
