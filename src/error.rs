use std::fmt;

use crate::store::StoreError;

/// Errors surfaced by [`Cache`](crate::Cache) operations.
///
/// A miss is never an error; it triggers a recompute internally. What does
/// surface: keys that cannot name a storage entry, compute failures, persist
/// failures (with the computed payload still attached), and storage
/// infrastructure conditions that must not be masked as misses.
#[derive(Debug)]
pub enum CacheError {
    /// The key is not usable as a storage identifier.
    InvalidKey { key: String, reason: &'static str },
    /// The compute source failed. Nothing was written; the key keeps
    /// whatever entry it had before.
    Source {
        key: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// The payload was computed but could not be persisted. The computed
    /// bytes ride along so the caller still gets usable data; nothing
    /// durable was stored, so the next fetch recomputes.
    Persist {
        key: String,
        bytes: Vec<u8>,
        source: StoreError,
    },
    /// The storage backend itself is unusable (e.g. the cache root cannot
    /// be statted). Not scoped to one key and never reported as a miss.
    Infrastructure(StoreError),
    /// A lock guarding cache state was poisoned by a panicking thread.
    LockPoisoned(&'static str),
}

impl CacheError {
    /// The payload computed just before a persistence failure, if any.
    pub fn computed_bytes(&self) -> Option<&[u8]> {
        match self {
            CacheError::Persist { bytes, .. } => Some(bytes),
            _ => None,
        }
    }
}

impl fmt::Display for CacheError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheError::InvalidKey { key, reason } => {
                write!(f, "invalid cache key {:?}: {}", key, reason)
            }
            CacheError::Source { key, source } => {
                write!(f, "source failed for key {:?}: {}", key, source)
            }
            CacheError::Persist { key, source, .. } => {
                write!(f, "computed key {:?} but failed to persist it: {}", key, source)
            }
            CacheError::Infrastructure(source) => {
                write!(f, "cache storage unusable: {}", source)
            }
            CacheError::LockPoisoned(operation) => {
                write!(f, "cache lock poisoned during {}", operation)
            }
        }
    }
}

impl std::error::Error for CacheError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CacheError::Source { source, .. } => Some(source.as_ref()),
            CacheError::Persist { source, .. } => Some(source),
            CacheError::Infrastructure(source) => Some(source),
            _ => None,
        }
    }
}
