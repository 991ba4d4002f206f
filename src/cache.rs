use std::path::PathBuf;
use std::time::{Duration, SystemTime};

use tracing::debug;

use crate::error::CacheError;
use crate::lock::KeyLockRegistry;
use crate::source::Source;
use crate::store::{FsStore, Store};

/// Disk-backed, on-demand memoization cache.
///
/// `fetch` returns the cached payload for a key if one exists, otherwise it
/// computes the payload via the [`Source`], persists it, and returns it.
/// Concurrent requests for the same key are serialized by a per-key
/// read/write lock; requests for different keys proceed fully in parallel.
///
/// The cache never evicts: entries grow unbounded in storage, and the lock
/// registry keeps one lock per distinct key for the life of the process.
/// Entries are only ever invalidated by the `max_age` check on read or by
/// out-of-band deletion.
pub struct Cache<S: Source, B: Store = FsStore> {
    source: S,
    store: B,
    locks: KeyLockRegistry,
}

impl<S: Source> Cache<S> {
    /// Cache backed by one file per key under `root` (created if missing).
    pub fn new(source: S, root: impl Into<PathBuf>) -> Result<Self, CacheError> {
        let store = FsStore::new(root).map_err(CacheError::Infrastructure)?;
        Ok(Cache::with_store(source, store))
    }
}

impl<S: Source, B: Store> Cache<S, B> {
    /// Cache over an arbitrary storage backend.
    pub fn with_store(source: S, store: B) -> Self {
        Cache {
            source,
            store,
            locks: KeyLockRegistry::new(),
        }
    }

    /// Access the storage backend.
    pub fn backend(&self) -> &B {
        &self.store
    }

    /// Cached payload for `key`, computing and persisting it on a miss.
    /// Hits are accepted unconditionally, whatever their age.
    pub fn fetch(&self, key: &str) -> Result<Vec<u8>, CacheError> {
        check_key(key)?;
        debug!(key, "checking cache");
        if let Some((bytes, _)) = self.retrieve(key)? {
            debug!(key, "cache hit");
            return Ok(bytes);
        }
        self.compute_and_store(key)
    }

    /// Like [`fetch`](Cache::fetch), but an entry whose age is `max_age` or
    /// older is treated as a miss and recomputed.
    pub fn fetch_with_max_age(
        &self,
        key: &str,
        max_age: Duration,
    ) -> Result<Vec<u8>, CacheError> {
        check_key(key)?;
        debug!(key, ?max_age, "checking cache");
        if let Some((bytes, modified)) = self.retrieve(key)? {
            if is_fresh(modified, max_age) {
                debug!(key, "cache hit");
                return Ok(bytes);
            }
            debug!(key, "cache entry stale");
        }
        self.compute_and_store(key)
    }

    /// Read attempt under the key's shared lock.
    ///
    /// `Ok(None)` covers everything that falls through to a recompute: no
    /// entry, a directory at the entry path, an unreadable entry, or an
    /// entry that vanished between stat and read. Only infrastructure
    /// conditions are errors.
    fn retrieve(&self, key: &str) -> Result<Option<(Vec<u8>, SystemTime)>, CacheError> {
        let lock = self.locks.get_lock(key)?;
        let _shared = lock
            .read()
            .map_err(|_| CacheError::LockPoisoned("shared key lock"))?;

        let Some(modified) = self.store.stat(key).map_err(CacheError::Infrastructure)? else {
            return Ok(None);
        };
        match self.store.read(key) {
            Ok(Some(bytes)) => Ok(Some((bytes, modified))),
            Ok(None) | Err(_) => Ok(None),
        }
    }

    /// Compute and persist under the key's exclusive lock.
    ///
    /// The lock covers the whole compute-and-write, so concurrent writes to
    /// one key never interleave. A waiter that acquires the lock after
    /// another writer finishes does not re-check storage; only a fresh
    /// `fetch` does, via `retrieve`.
    fn compute_and_store(&self, key: &str) -> Result<Vec<u8>, CacheError> {
        debug!(key, "cache miss, invoking source");
        let lock = self.locks.get_lock(key)?;
        let _exclusive = lock
            .write()
            .map_err(|_| CacheError::LockPoisoned("exclusive key lock"))?;

        let bytes = self.source.compute(key).map_err(|source| CacheError::Source {
            key: key.to_string(),
            source,
        })?;

        if let Err(source) = self.store.write(key, &bytes) {
            return Err(CacheError::Persist {
                key: key.to_string(),
                bytes,
                source,
            });
        }
        Ok(bytes)
    }
}

/// Reject keys that cannot name a single storage entry.
fn check_key(key: &str) -> Result<(), CacheError> {
    let reason = if key.is_empty() {
        "key is empty"
    } else if key == "." || key == ".." {
        "key is a relative path component"
    } else if key.contains(['/', '\\']) {
        "key contains a path separator"
    } else if key.contains('\0') {
        "key contains a NUL byte"
    } else {
        return Ok(());
    };
    Err(CacheError::InvalidKey {
        key: key.to_string(),
        reason,
    })
}

fn is_fresh(modified: SystemTime, max_age: Duration) -> bool {
    // A modified time in the future counts as fresh.
    match modified.elapsed() {
        Ok(age) => age < max_age,
        Err(_) => true,
    }
}
