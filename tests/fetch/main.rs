use std::fs;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use bytestash::{Cache, CacheError, Source, SourceError};
use tempfile::TempDir;

/// Source that serves a swappable payload and counts invocations.
struct CountingSource {
    payload: Mutex<Vec<u8>>,
    calls: AtomicUsize,
}

impl CountingSource {
    fn new(payload: &[u8]) -> Arc<Self> {
        Arc::new(CountingSource {
            payload: Mutex::new(payload.to_vec()),
            calls: AtomicUsize::new(0),
        })
    }

    fn set_payload(&self, payload: &[u8]) {
        *self.payload.lock().unwrap() = payload.to_vec();
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Source for CountingSource {
    fn compute(&self, _key: &str) -> Result<Vec<u8>, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.payload.lock().unwrap().clone())
    }
}

fn as_source(
    source: &Arc<CountingSource>,
) -> impl Fn(&str) -> Result<Vec<u8>, SourceError> + Send + Sync {
    let source = source.clone();
    move |key: &str| source.compute(key)
}

// --- Hit / Miss ---

#[test]
fn fetch_computes_persists_and_returns() {
    let temp = TempDir::new().unwrap();
    let source = CountingSource::new(b"HELLO");
    let cache = Cache::new(as_source(&source), temp.path()).unwrap();

    assert_eq!(cache.fetch("greeting").unwrap(), b"HELLO");
    assert_eq!(source.calls(), 1);
    assert_eq!(fs::read(temp.path().join("greeting")).unwrap(), b"HELLO");

    // Second fetch is a hit: exactly the stored bytes, no second compute.
    assert_eq!(cache.fetch("greeting").unwrap(), b"HELLO");
    assert_eq!(source.calls(), 1);
}

#[test]
fn preseeded_file_served_without_compute() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("greeting"), b"HELLO").unwrap();
    let source = CountingSource::new(b"unused");
    let cache = Cache::new(as_source(&source), temp.path()).unwrap();

    assert_eq!(cache.fetch("greeting").unwrap(), b"HELLO");
    assert_eq!(source.calls(), 0);
}

#[test]
fn entry_stored_as_raw_bytes() {
    let temp = TempDir::new().unwrap();
    let source = CountingSource::new(b"\x00\x01binary\xff");
    let cache = Cache::new(as_source(&source), temp.path()).unwrap();

    cache.fetch("blob").unwrap();
    assert_eq!(
        fs::read(temp.path().join("blob")).unwrap(),
        b"\x00\x01binary\xff"
    );
}

// --- Staleness ---

#[test]
fn fresh_entry_served_within_max_age() {
    let temp = TempDir::new().unwrap();
    let source = CountingSource::new(b"HELLO");
    let cache = Cache::new(as_source(&source), temp.path()).unwrap();

    cache.fetch("greeting").unwrap();
    let bytes = cache
        .fetch_with_max_age("greeting", Duration::from_secs(3600))
        .unwrap();

    assert_eq!(bytes, b"HELLO");
    assert_eq!(source.calls(), 1);
}

#[test]
fn aged_entry_recomputed_and_rewritten() {
    let temp = TempDir::new().unwrap();
    let source = CountingSource::new(b"HELLO");
    let cache = Cache::new(as_source(&source), temp.path()).unwrap();

    cache.fetch("greeting").unwrap();
    source.set_payload(b"WORLD");
    thread::sleep(Duration::from_millis(25));

    let bytes = cache
        .fetch_with_max_age("greeting", Duration::from_millis(5))
        .unwrap();

    assert_eq!(bytes, b"WORLD");
    assert_eq!(source.calls(), 2);
    assert_eq!(fs::read(temp.path().join("greeting")).unwrap(), b"WORLD");
}

#[test]
fn max_age_miss_on_absent_key_computes() {
    let temp = TempDir::new().unwrap();
    let source = CountingSource::new(b"HELLO");
    let cache = Cache::new(as_source(&source), temp.path()).unwrap();

    let bytes = cache
        .fetch_with_max_age("greeting", Duration::from_secs(3600))
        .unwrap();

    assert_eq!(bytes, b"HELLO");
    assert_eq!(source.calls(), 1);
}

// --- Failures ---

#[test]
fn source_failure_surfaces_error_and_leaves_no_file() {
    let temp = TempDir::new().unwrap();
    let failing = |_key: &str| -> Result<Vec<u8>, SourceError> { Err("boom".into()) };
    let cache = Cache::new(failing, temp.path()).unwrap();

    let err = cache.fetch("bad").unwrap_err();
    assert!(matches!(err, CacheError::Source { .. }));
    assert!(err.to_string().contains("boom"));
    assert!(!temp.path().join("bad").exists());

    // The failed attempt wrote nothing, so the next fetch misses again.
    let err = cache.fetch("bad").unwrap_err();
    assert!(err.to_string().contains("boom"));
}

#[test]
fn directory_at_entry_path_is_a_miss_and_persist_fails() {
    let temp = TempDir::new().unwrap();
    fs::create_dir(temp.path().join("taken")).unwrap();
    let source = CountingSource::new(b"HELLO");
    let cache = Cache::new(as_source(&source), temp.path()).unwrap();

    // The directory is not an entry, so the source runs; the write then
    // fails against the directory, and the computed bytes ride the error.
    let err = cache.fetch("taken").unwrap_err();
    assert_eq!(source.calls(), 1);
    assert_eq!(err.computed_bytes(), Some(&b"HELLO"[..]));
    assert!(matches!(err, CacheError::Persist { .. }));
}

// --- Key validation ---

#[test]
fn unsafe_keys_rejected() {
    let temp = TempDir::new().unwrap();
    let source = CountingSource::new(b"unused");
    let cache = Cache::new(as_source(&source), temp.path()).unwrap();

    for key in ["", ".", "..", "etc/passwd", "a\\b", "nul\0key"] {
        let err = cache.fetch(key).unwrap_err();
        assert!(matches!(err, CacheError::InvalidKey { .. }), "key {:?}", key);
        let err = cache
            .fetch_with_max_age(key, Duration::from_secs(1))
            .unwrap_err();
        assert!(matches!(err, CacheError::InvalidKey { .. }), "key {:?}", key);
    }
    assert_eq!(source.calls(), 0);
}
