//! Contract of the external metadata cache store.

use std::sync::Arc;
use std::time::Duration;

/// Error type returned by [`CacheStore`] implementations.
pub type StoreError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// A key/value store used to persist synthesized metadata.
///
/// The store may be shared between threads or processes. Each `get` and `set` must be atomic
/// for its key; beyond that, callers treat races and failures as ordinary misses.
pub trait CacheStore: Send + Sync {
    /// Returns the value stored under `key`, or `None` if there is none or it has expired.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Stores `value` under `key`, replacing any previous value.
    ///
    /// With a `ttl`, the value expires after the given duration; without one it never expires.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be written.
    fn set(&self, key: &str, value: String, ttl: Option<Duration>) -> Result<(), StoreError>;
}

impl<S> CacheStore for Arc<S>
where
    S: CacheStore + ?Sized,
{
    #[inline]
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        (**self).get(key)
    }

    #[inline]
    fn set(&self, key: &str, value: String, ttl: Option<Duration>) -> Result<(), StoreError> {
        (**self).set(key, value, ttl)
    }
}

impl<S> CacheStore for Box<S>
where
    S: CacheStore + ?Sized,
{
    #[inline]
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        (**self).get(key)
    }

    #[inline]
    fn set(&self, key: &str, value: String, ttl: Option<Duration>) -> Result<(), StoreError> {
        (**self).set(key, value, ttl)
    }
}
