//! Artifact store: the key/value object store shared by the harvest and the
//! read path.
//!
//! The store offers last-writer-wins overwrite per key and nothing across
//! keys. Implementations:
//!
//! - [`MemoryStore`]: process-local map, used by tests and single-process runs
//! - [`FsStore`]: one file per object plus a metadata sidecar

mod fs;
mod memory;

use async_trait::async_trait;
use bytes::Bytes;
use sha2::{Digest, Sha256};

use crate::error::StoreError;

pub use fs::FsStore;
pub use memory::MemoryStore;

/// An object as read back from the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub body: Bytes,
    pub content_type: Option<String>,
    /// Quoted HTTP entity tag.
    pub etag: String,
}

#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Store `body` under `key`, replacing any previous object.
    async fn put(&self, key: &str, body: Bytes, content_type: &str) -> Result<(), StoreError>;

    /// Look up `key`. A missing key is `Ok(None)`, never an error.
    async fn get(&self, key: &str) -> Result<Option<StoredObject>, StoreError>;
}

/// Compute the entity tag of a body: quoted hex SHA-256.
///
/// # Examples
/// ```
/// use radiko_harvester::store::etag_for;
///
/// assert_eq!(
///     etag_for(b"[]"),
///     "\"4f53cda18c2baa0c0354bb5f9a3ecbe5ed12ab4d8e11ba873c2f11161202b945\""
/// );
/// ```
pub fn etag_for(body: &[u8]) -> String {
    format!("\"{}\"", hex::encode(Sha256::digest(body)))
}
