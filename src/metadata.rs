//! Persistence of inspected constructor metadata.

use std::sync::Arc;
use std::time::Duration;

use diwire_core::{CacheStore, StoreError, Token};
use serde::{Deserialize, Serialize};

const FORMAT_VERSION: u32 = 1;

#[derive(Serialize, Deserialize)]
struct CachedDefinition {
    version: u32,
    class: String,
    arguments: Vec<Token>,
}

/// [`MetadataCache`] stores synthesized argument lists in an optional [`CacheStore`].
///
/// The cache only saves work: every failure to read or write the store is a miss, never an
/// error. Without a store, every lookup misses.
#[derive(Clone)]
pub struct MetadataCache {
    store: Option<Arc<dyn CacheStore>>,
    prefix: String,
    ttl: Option<Duration>,
}

impl MetadataCache {
    pub const DEFAULT_PREFIX: &'static str = "diwire";

    /// Creates a cache without a store.
    pub fn disabled() -> Self {
        Self {
            store: None,
            prefix: Self::DEFAULT_PREFIX.to_owned(),
            ttl: None,
        }
    }

    /// Creates a cache backed by `store`.
    pub fn new(store: Arc<dyn CacheStore>) -> Self {
        Self {
            store: Some(store),
            ..Self::disabled()
        }
    }

    /// Sets the namespace prepended to every store key.
    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Sets the lifetime of written entries.
    #[must_use]
    pub const fn with_ttl(mut self, ttl: Option<Duration>) -> Self {
        self.ttl = ttl;
        self
    }

    #[inline]
    pub const fn is_enabled(&self) -> bool {
        self.store.is_some()
    }

    #[inline]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    fn key(&self, class: &str) -> String {
        format!("{}:{class}", self.prefix)
    }

    /// Returns the cached argument tokens of `class`.
    #[cfg_attr(not(feature = "tracing"), allow(unused_variables))]
    pub fn load(&self, class: &str) -> Option<Vec<Token>> {
        let store = self.store.as_ref()?;
        let key = self.key(class);

        let raw = match store.get(&key) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                trace!(key = %key, "metadata cache miss");
                return None;
            }
            Err(err) => {
                warn!(key = %key, error = %err, "failed to read metadata cache");
                return None;
            }
        };

        match serde_json::from_str::<CachedDefinition>(&raw) {
            Ok(entry) if entry.version == FORMAT_VERSION && entry.class == class => {
                trace!(key = %key, "metadata cache hit");
                Some(entry.arguments)
            }
            Ok(_) => {
                debug!(key = %key, "ignoring metadata cache entry of another format");
                None
            }
            Err(err) => {
                warn!(key = %key, error = %err, "failed to decode metadata cache entry");
                None
            }
        }
    }

    /// Writes the argument tokens of `class`, ignoring failures.
    #[cfg_attr(not(feature = "tracing"), allow(unused_variables))]
    pub fn store(&self, class: &str, arguments: &[Token]) {
        let Some(store) = &self.store else {
            return;
        };
        let key = self.key(class);
        let entry = CachedDefinition {
            version: FORMAT_VERSION,
            class: class.to_owned(),
            arguments: arguments.to_vec(),
        };

        let result = serde_json::to_string(&entry)
            .map_err(StoreError::from)
            .and_then(|raw| store.set(&key, raw, self.ttl));
        if let Err(err) = result {
            warn!(key = %key, error = %err, "failed to write metadata cache");
        }
    }
}

impl Default for MetadataCache {
    fn default() -> Self {
        Self::disabled()
    }
}

impl std::fmt::Debug for MetadataCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetadataCache")
            .field("enabled", &self.is_enabled())
            .field("prefix", &self.prefix)
            .field("ttl", &self.ttl)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use super::*;

    #[derive(Default)]
    struct MapStore {
        entries: Mutex<HashMap<String, (String, Option<Duration>)>>,
    }

    impl CacheStore for MapStore {
        fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
            let entries = self.entries.lock().unwrap();
            Ok(entries.get(key).map(|(value, _)| value.clone()))
        }

        fn set(&self, key: &str, value: String, ttl: Option<Duration>) -> Result<(), StoreError> {
            self.entries
                .lock()
                .unwrap()
                .insert(key.to_owned(), (value, ttl));
            Ok(())
        }
    }

    struct BrokenStore;

    impl CacheStore for BrokenStore {
        fn get(&self, _key: &str) -> Result<Option<String>, StoreError> {
            Err("connection refused".into())
        }

        fn set(&self, _key: &str, _value: String, _ttl: Option<Duration>) -> Result<(), StoreError> {
            Err("connection refused".into())
        }
    }

    #[test]
    fn test_store_then_load() {
        let store = Arc::new(MapStore::default());
        let cache = MetadataCache::new(store.clone())
            .with_prefix("app")
            .with_ttl(Some(Duration::from_secs(30)));
        let tokens = vec![Token::reference("Bar"), Token::literal(3)];

        assert_eq!(cache.load("Foo"), None);
        cache.store("Foo", &tokens);
        assert_eq!(cache.load("Foo"), Some(tokens));

        let entries = store.entries.lock().unwrap();
        let (_, ttl) = &entries["app:Foo"];
        assert_eq!(*ttl, Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_disabled_always_misses() {
        let cache = MetadataCache::default();
        assert!(!cache.is_enabled());
        cache.store("Foo", &[]);
        assert_eq!(cache.load("Foo"), None);
    }

    #[test]
    fn test_broken_store_is_a_miss() {
        let cache = MetadataCache::new(Arc::new(BrokenStore));
        cache.store("Foo", &[Token::literal(1)]);
        assert_eq!(cache.load("Foo"), None);
    }

    #[test]
    fn test_foreign_entries_are_misses() {
        let store = Arc::new(MapStore::default());
        let cache = MetadataCache::new(store.clone());

        store
            .set("diwire:Foo", r#"{"version":0,"class":"Foo","arguments":[]}"#.into(), None)
            .unwrap();
        assert_eq!(cache.load("Foo"), None);

        store
            .set("diwire:Foo", r#"{"version":1,"class":"Bar","arguments":[]}"#.into(), None)
            .unwrap();
        assert_eq!(cache.load("Foo"), None);

        store.set("diwire:Foo", "not json".into(), None).unwrap();
        assert_eq!(cache.load("Foo"), None);
    }
}
