mod registry;

pub use registry::KeyLockRegistry;
