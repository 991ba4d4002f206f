/// Error type produced by a [`Source`].
pub type SourceError = Box<dyn std::error::Error + Send + Sync>;

/// The compute function invoked on a cache miss.
///
/// Implementations map a key to the payload that should be cached for it.
/// The cache holds the source for its own lifetime and never calls it while
/// a usable entry exists. Compute may block for as long as it likes; the
/// cache imposes no timeout, and other keys proceed unaffected while one
/// key's compute is in flight.
///
/// Closures of the right shape implement `Source` directly:
///
/// ```
/// use bytestash::{Source, SourceError};
///
/// let upper = |key: &str| -> Result<Vec<u8>, SourceError> {
///     Ok(key.to_uppercase().into_bytes())
/// };
/// assert_eq!(upper.compute("abc").unwrap(), b"ABC");
/// ```
pub trait Source: Send + Sync {
    /// Compute the payload for `key`.
    fn compute(&self, key: &str) -> Result<Vec<u8>, SourceError>;
}

impl<F> Source for F
where
    F: Fn(&str) -> Result<Vec<u8>, SourceError> + Send + Sync,
{
    fn compute(&self, key: &str) -> Result<Vec<u8>, SourceError> {
        self(key)
    }
}
