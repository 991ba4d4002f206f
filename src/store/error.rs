use std::fmt;
use std::io;
use std::path::PathBuf;

/// Error type for storage backends.
#[derive(Debug)]
pub enum StoreError {
    /// The storage root could not be created.
    Create { path: PathBuf, source: io::Error },
    /// An entry could not be inspected at all (permission denied on the
    /// cache root, etc.). Infrastructure condition, not a per-key miss.
    Stat { path: PathBuf, source: io::Error },
    /// An entry exists but could not be read.
    Read { path: PathBuf, source: io::Error },
    /// An entry could not be written.
    Write { path: PathBuf, source: io::Error },
    /// An in-memory backend lock was poisoned.
    Poisoned(&'static str),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Create { path, source } => {
                write!(f, "failed to create storage root {}: {}", path.display(), source)
            }
            StoreError::Stat { path, source } => {
                write!(f, "failed to stat entry {}: {}", path.display(), source)
            }
            StoreError::Read { path, source } => {
                write!(f, "failed to read entry {}: {}", path.display(), source)
            }
            StoreError::Write { path, source } => {
                write!(f, "failed to write entry {}: {}", path.display(), source)
            }
            StoreError::Poisoned(operation) => {
                write!(f, "store lock poisoned during {}", operation)
            }
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreError::Create { source, .. }
            | StoreError::Stat { source, .. }
            | StoreError::Read { source, .. }
            | StoreError::Write { source, .. } => Some(source),
            StoreError::Poisoned(_) => None,
        }
    }
}
