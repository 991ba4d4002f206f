mod error;
mod fs;
mod in_memory;

pub use error::StoreError;
pub use fs::FsStore;
pub use in_memory::InMemoryStore;

use std::time::SystemTime;

/// Abstract keyed byte storage.
///
/// One entry per key: the raw payload plus a last-modified timestamp, fully
/// replaced on every write. The cache consults `stat` for existence and
/// staleness before paying for a `read`; backends report "no usable entry"
/// as `None` rather than an error, so only genuine I/O conditions travel the
/// error channel.
pub trait Store: Send + Sync {
    /// Last-modified time of the entry for `key`, or `None` if no usable
    /// entry exists.
    fn stat(&self, key: &str) -> Result<Option<SystemTime>, StoreError>;

    /// Full payload for `key`, or `None` if the entry is gone.
    fn read(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    /// Replace the entry for `key` with `bytes`.
    fn write(&self, key: &str, bytes: &[u8]) -> Result<(), StoreError>;
}
