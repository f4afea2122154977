use std::{collections::HashMap, sync::Mutex};

use async_trait::async_trait;

use crate::storage::{Blob, BlobStore, ConflictSnafu, StoreError, Version};

/// In-process store with the same version semantics as the remote one.
///
/// Used for dry runs and tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    blobs: HashMap<String, Blob>,
    writes: u64,
}

impl Inner {
    fn write(&mut self, key: &str, content: &str) -> Version {
        self.writes += 1;
        let version = Version(format!("v{}", self.writes));
        self.blobs.insert(
            key.to_string(),
            Blob {
                content: content.to_string(),
                version: version.clone(),
            },
        );
        version
    }
}

impl MemoryStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-seeded with one blob.
    pub fn with_blob(key: &str, content: &str) -> Self {
        let store = Self::new();
        store.insert(key, content);
        store
    }

    /// Unconditional write, bypassing the version check.
    pub fn insert(&self, key: &str, content: &str) -> Version {
        self.lock().write(key, content)
    }

    /// Current content of `key`.
    pub fn content(&self, key: &str) -> Option<String> {
        self.lock().blobs.get(key).map(|b| b.content.clone())
    }

    /// Number of successful writes so far.
    pub fn writes(&self) -> u64 {
        self.lock().writes
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl BlobStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Blob>, StoreError> {
        Ok(self.lock().blobs.get(key).cloned())
    }

    async fn put(
        &self,
        key: &str,
        content: &str,
        expected: Option<&Version>,
        _message: &str,
    ) -> Result<Version, StoreError> {
        let mut inner = self.lock();
        if inner.blobs.get(key).map(|b| &b.version) != expected {
            return ConflictSnafu { key }.fail();
        }
        Ok(inner.write(key, content))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn create_then_update_with_version() {
        let store = MemoryStore::new();
        assert_eq!(store.get("a.csv").await.unwrap(), None);

        let v1 = store.put("a.csv", "one", None, "create").await.unwrap();
        let blob = store.get("a.csv").await.unwrap().unwrap();
        assert_eq!(blob.version, v1);

        let v2 = store.put("a.csv", "two", Some(&v1), "update").await.unwrap();
        assert_ne!(v1, v2);
        assert_eq!(store.content("a.csv").as_deref(), Some("two"));
    }

    #[tokio::test]
    async fn stale_or_missing_version_conflicts() {
        let store = MemoryStore::with_blob("a.csv", "one");
        let err = store.put("a.csv", "x", None, "blind").await.unwrap_err();
        assert!(err.is_conflict());
        let stale = Version("v0".into());
        assert!(store.put("a.csv", "x", Some(&stale), "stale").await.unwrap_err().is_conflict());
        assert!(store.put("b.csv", "x", Some(&stale), "gone").await.unwrap_err().is_conflict());
        assert_eq!(store.writes(), 1);
    }
}
