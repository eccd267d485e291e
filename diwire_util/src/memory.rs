//! In-process metadata store.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use diwire_core::{CacheStore, StoreError};

#[derive(Debug)]
struct Entry {
    value: String,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

/// A [`CacheStore`] that keeps entries in memory for the lifetime of the process.
///
/// Expired entries are dropped lazily, when they are read or by [`purge_expired`].
///
/// [`purge_expired`]: MemoryStore::purge_expired
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, Entry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<String, Entry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns the number of entries, including expired ones not yet purged.
    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    /// Removes the entry under `key`, returning its value if it had not expired.
    pub fn remove(&self, key: &str) -> Option<String> {
        self.entries()
            .remove(key)
            .filter(|entry| !entry.is_expired(Instant::now()))
            .map(|entry| entry.value)
    }

    pub fn clear(&self) {
        self.entries().clear();
    }

    /// Drops every expired entry, returning how many were dropped.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries();
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired(now));
        before - entries.len()
    }
}

impl CacheStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut entries = self.entries();
        let Some(entry) = entries.get(key) else {
            return Ok(None);
        };
        if entry.is_expired(Instant::now()) {
            entries.remove(key);
            return Ok(None);
        }
        Ok(Some(entry.value.clone()))
    }

    fn set(&self, key: &str, value: String, ttl: Option<Duration>) -> Result<(), StoreError> {
        // A lifetime too long to represent never expires.
        let expires_at = ttl.and_then(|ttl| Instant::now().checked_add(ttl));
        self.entries()
            .insert(key.to_owned(), Entry { value, expires_at });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_set() {
        let store = MemoryStore::new();
        assert_eq!(store.get("a").unwrap(), None);

        store.set("a", "1".to_owned(), None).unwrap();
        store.set("a", "2".to_owned(), None).unwrap();
        assert_eq!(store.get("a").unwrap().as_deref(), Some("2"));
        assert_eq!(store.len(), 1);

        assert_eq!(store.remove("a").as_deref(), Some("2"));
        assert!(store.is_empty());
    }

    #[test]
    fn test_expiry() {
        let store = MemoryStore::new();
        store.set("gone", "x".to_owned(), Some(Duration::ZERO)).unwrap();
        store
            .set("kept", "y".to_owned(), Some(Duration::from_secs(3600)))
            .unwrap();
        store.set("forever", "z".to_owned(), Some(Duration::MAX)).unwrap();

        assert_eq!(store.get("gone").unwrap(), None);
        assert_eq!(store.len(), 2);
        assert_eq!(store.get("kept").unwrap().as_deref(), Some("y"));
        assert_eq!(store.get("forever").unwrap().as_deref(), Some("z"));
    }

    #[test]
    fn test_purge_expired() {
        let store = MemoryStore::new();
        store.set("a", "x".to_owned(), Some(Duration::ZERO)).unwrap();
        store.set("b", "y".to_owned(), Some(Duration::ZERO)).unwrap();
        store.set("c", "z".to_owned(), None).unwrap();

        assert_eq!(store.purge_expired(), 2);
        assert_eq!(store.len(), 1);

        store.clear();
        assert!(store.is_empty());
    }
}
