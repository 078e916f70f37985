use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use bytes::Bytes;

use super::{etag_for, ArtifactStore, StoredObject};
use crate::error::StoreError;

/// Store that keeps every object in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    objects: RwLock<HashMap<String, StoredObject>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored objects.
    pub fn len(&self) -> usize {
        self.objects
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Stored body of `key` as UTF-8, for assertions and debugging.
    pub fn text(&self, key: &str) -> Option<String> {
        self.objects
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .map(|object| String::from_utf8_lossy(&object.body).into_owned())
    }
}

#[async_trait]
impl ArtifactStore for MemoryStore {
    async fn put(&self, key: &str, body: Bytes, content_type: &str) -> Result<(), StoreError> {
        let object = StoredObject {
            etag: etag_for(&body),
            body,
            content_type: Some(content_type.to_string()),
        };
        self.objects
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), object);
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<StoredObject>, StoreError> {
        Ok(self
            .objects
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_then_get() {
        let store = MemoryStore::new();
        store
            .put("stations.json", Bytes::from_static(b"[]"), "application/json")
            .await
            .unwrap();

        let object = store.get("stations.json").await.unwrap().unwrap();
        assert_eq!(object.body, Bytes::from_static(b"[]"));
        assert_eq!(object.content_type.as_deref(), Some("application/json"));
        assert_eq!(object.etag, etag_for(b"[]"));
    }

    #[tokio::test]
    async fn test_missing_key_is_none() {
        let store = MemoryStore::new();
        assert!(store.get("programs/TBS.json").await.unwrap().is_none());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_last_writer_wins() {
        let store = MemoryStore::new();
        store
            .put("k", Bytes::from_static(b"old"), "text/plain")
            .await
            .unwrap();
        store
            .put("k", Bytes::from_static(b"new"), "application/json")
            .await
            .unwrap();

        assert_eq!(store.len(), 1);
        assert_eq!(store.text("k").as_deref(), Some("new"));
        let object = store.get("k").await.unwrap().unwrap();
        assert_eq!(object.etag, etag_for(b"new"));
    }
}
