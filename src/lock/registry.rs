use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::error::CacheError;

/// Registry handing out one shared/exclusive lock per key.
///
/// Lookups take the registry's own lock in read mode first and only upgrade
/// to write mode to create a missing entry, re-checking after the upgrade so
/// two racing writers cannot both insert. The registry lock is held for the
/// lookup or insert only, never across I/O, so unrelated keys stay fully
/// parallel.
///
/// Locks are never evicted: one entry per distinct key ever requested, for
/// the life of the process.
pub struct KeyLockRegistry {
    locks: RwLock<HashMap<String, Arc<RwLock<()>>>>,
}

impl Default for KeyLockRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyLockRegistry {
    pub fn new() -> Self {
        KeyLockRegistry {
            locks: RwLock::new(HashMap::new()),
        }
    }

    /// Get (or create) the lock for `key`.
    ///
    /// Repeated calls with the same key return the same `Arc`, even when
    /// the first calls race.
    pub fn get_lock(&self, key: &str) -> Result<Arc<RwLock<()>>, CacheError> {
        {
            let locks = self
                .locks
                .read()
                .map_err(|_| CacheError::LockPoisoned("registry read"))?;
            if let Some(lock) = locks.get(key) {
                return Ok(lock.clone());
            }
        }

        let mut locks = self
            .locks
            .write()
            .map_err(|_| CacheError::LockPoisoned("registry write"))?;
        if let Some(lock) = locks.get(key) {
            return Ok(lock.clone());
        }

        let lock = Arc::new(RwLock::new(()));
        locks.insert(key.to_string(), lock.clone());
        Ok(lock)
    }
}
