mod cache;
mod error;
mod lock;
mod source;
mod store;

pub use cache::Cache;
pub use error::CacheError;
pub use lock::KeyLockRegistry;
pub use source::{Source, SourceError};
pub use store::{FsStore, InMemoryStore, Store, StoreError};
