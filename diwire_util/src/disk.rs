//! On-disk metadata store that survives process restarts.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use diwire_core::{CacheStore, StoreError};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tempfile::NamedTempFile;

#[derive(Serialize, Deserialize)]
struct Record {
    key: String,
    value: String,
    expires_at_ms: Option<u64>,
}

/// A [`CacheStore`] keeping one JSON file per key in a directory.
///
/// File names are derived from a SHA-256 digest of the key, so any key is a valid file name.
/// Writes go through a temporary file that is atomically renamed into place, which makes the
/// directory safe to share between processes.
#[derive(Debug, Clone)]
pub struct DirStore {
    root: PathBuf,
}

impl DirStore {
    /// Opens the store rooted at `root`, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn open(root: impl Into<PathBuf>) -> io::Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    #[inline]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path(&self, key: &str) -> PathBuf {
        let digest = Sha256::digest(key.as_bytes());
        self.root.join(format!("{}.json", hex::encode(digest)))
    }

    /// Removes the entry under `key`. Returns `false` if there was none.
    ///
    /// # Errors
    ///
    /// Returns an error if the entry exists but cannot be removed.
    pub fn remove(&self, key: &str) -> io::Result<bool> {
        match fs::remove_file(self.path(key)) {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(err) => Err(err),
        }
    }
}

fn now_ms() -> u64 {
    let elapsed = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
}

impl CacheStore for DirStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let path = self.path(key);
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };

        let record: Record = serde_json::from_str(&raw)?;
        // Digest collision, or a file written by something else.
        if record.key != key {
            return Ok(None);
        }
        if record.expires_at_ms.is_some_and(|at| at <= now_ms()) {
            self.remove(key)?;
            return Ok(None);
        }
        Ok(Some(record.value))
    }

    fn set(&self, key: &str, value: String, ttl: Option<Duration>) -> Result<(), StoreError> {
        let expires_at_ms = ttl.map(|ttl| {
            let ttl = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX);
            now_ms().saturating_add(ttl)
        });
        let record = Record {
            key: key.to_owned(),
            value,
            expires_at_ms,
        };

        let mut file = NamedTempFile::new_in(&self.root)?;
        serde_json::to_writer(&mut file, &record)?;
        file.flush()?;
        file.persist(self.path(key))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_set() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirStore::open(dir.path().join("metadata")).unwrap();

        assert_eq!(store.get("app:Foo").unwrap(), None);
        store.set("app:Foo", "[1]".to_owned(), None).unwrap();
        store.set("app:Foo", "[2]".to_owned(), None).unwrap();
        assert_eq!(store.get("app:Foo").unwrap().as_deref(), Some("[2]"));

        assert!(store.remove("app:Foo").unwrap());
        assert!(!store.remove("app:Foo").unwrap());
    }

    #[test]
    fn test_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        DirStore::open(dir.path())
            .unwrap()
            .set("key", "value".to_owned(), Some(Duration::from_secs(3600)))
            .unwrap();

        let store = DirStore::open(dir.path()).unwrap();
        assert_eq!(store.get("key").unwrap().as_deref(), Some("value"));
    }

    #[test]
    fn test_expired_entry_is_removed() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirStore::open(dir.path()).unwrap();
        store.set("key", "value".to_owned(), Some(Duration::ZERO)).unwrap();

        assert_eq!(store.get("key").unwrap(), None);
        assert!(!store.remove("key").unwrap());
    }

    #[test]
    fn test_corrupt_entry_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirStore::open(dir.path()).unwrap();
        fs::write(store.path("key"), "not json").unwrap();

        assert!(store.get("key").is_err());
    }
}
