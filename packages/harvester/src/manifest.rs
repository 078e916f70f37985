//! Staged publishing manifest.
//!
//! In staged mode a harvest run writes its artifacts under
//! `runs/<run_id>/` and, only once every station succeeded, overwrites
//! `manifest.json` to point at that prefix. Readers that resolve keys through
//! the manifest therefore see either the previous run or the new run, never a
//! mix of both.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::MANIFEST_KEY;
use crate::error::Result;
use crate::store::ArtifactStore;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub run_id: Uuid,
    /// Key prefix of the published run, ending in `/`.
    pub prefix: String,
    pub station_count: usize,
    pub published_at: DateTime<Utc>,
}

impl Manifest {
    pub fn new(run_id: Uuid, station_count: usize) -> Self {
        Self {
            run_id,
            prefix: staging_prefix(run_id),
            station_count,
            published_at: Utc::now(),
        }
    }

    /// Key under which the published copy of `key` lives.
    ///
    /// # Examples
    /// ```
    /// use radiko_harvester::manifest::Manifest;
    /// use uuid::Uuid;
    ///
    /// let manifest = Manifest::new(Uuid::nil(), 3);
    /// assert_eq!(
    ///     manifest.resolve("programs/TBS.json"),
    ///     "runs/00000000-0000-0000-0000-000000000000/programs/TBS.json"
    /// );
    /// ```
    pub fn resolve(&self, key: &str) -> String {
        format!("{}{key}", self.prefix)
    }
}

/// Key prefix under which a staged run writes its artifacts.
pub fn staging_prefix(run_id: Uuid) -> String {
    format!("runs/{run_id}/")
}

/// Read the current manifest, if one was ever published.
pub async fn load_manifest<A: ArtifactStore + ?Sized>(store: &A) -> Result<Option<Manifest>> {
    match store.get(MANIFEST_KEY).await? {
        Some(object) => Ok(Some(serde_json::from_slice(&object.body)?)),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use bytes::Bytes;

    #[tokio::test]
    async fn test_load_manifest_absent() {
        let store = MemoryStore::new();
        assert!(load_manifest(&store).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_load_manifest_roundtrip() {
        let store = MemoryStore::new();
        let manifest = Manifest::new(Uuid::new_v4(), 12);
        store
            .put(
                MANIFEST_KEY,
                Bytes::from(serde_json::to_vec(&manifest).unwrap()),
                "application/json",
            )
            .await
            .unwrap();

        let loaded = load_manifest(&store).await.unwrap().unwrap();
        assert_eq!(loaded, manifest);
        assert!(loaded.prefix.starts_with("runs/"));
        assert!(loaded.prefix.ends_with('/'));
    }

    #[tokio::test]
    async fn test_corrupt_manifest_is_an_error() {
        let store = MemoryStore::new();
        store
            .put(MANIFEST_KEY, Bytes::from_static(b"{not json"), "application/json")
            .await
            .unwrap();
        assert!(load_manifest(&store).await.is_err());
    }
}
