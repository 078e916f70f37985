use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;

use super::{etag_for, ArtifactStore, StoredObject};
use crate::error::StoreError;

/// Store that keeps objects on the local filesystem.
///
/// Layout under `root`: `objects/<key>` holds the body, `meta/<key>.json`
/// holds the content type. The entity tag is derived from the body on read,
/// so it always matches the bytes served.
#[derive(Debug, Clone)]
pub struct FsStore {
    root: PathBuf,
}

#[derive(Debug, Serialize, Deserialize)]
struct ObjectMetadata {
    content_type: Option<String>,
}

impl FsStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn object_path(&self, key: &str) -> PathBuf {
        self.root.join("objects").join(key)
    }

    fn meta_path(&self, key: &str) -> PathBuf {
        self.root.join("meta").join(format!("{key}.json"))
    }
}

/// Keys map onto relative paths, so they must not escape the store root.
fn is_valid_key(key: &str) -> bool {
    !key.is_empty()
        && !key.starts_with('/')
        && !key.contains('\\')
        && key
            .split('/')
            .all(|segment| !segment.is_empty() && segment != "." && segment != "..")
}

/// Write `contents` to a sibling temp file, flush it to disk and rename it
/// over `path`.
async fn write_atomic(key: &str, path: &Path, contents: &[u8]) -> Result<(), StoreError> {
    let io_err = |source| StoreError::Io {
        key: key.to_string(),
        source,
    };

    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await.map_err(io_err)?;
    }

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let tmp_path = path.with_file_name(format!(".{file_name}.{}.tmp", uuid::Uuid::new_v4()));

    if let Err(e) = write_synced(&tmp_path, contents).await {
        let _ = tokio::fs::remove_file(&tmp_path).await;
        return Err(io_err(e));
    }
    if let Err(e) = tokio::fs::rename(&tmp_path, path).await {
        let _ = tokio::fs::remove_file(&tmp_path).await;
        return Err(io_err(e));
    }
    Ok(())
}

async fn write_synced(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let mut file = tokio::fs::File::create(path).await?;
    file.write_all(contents).await?;
    file.sync_all().await
}

#[async_trait]
impl ArtifactStore for FsStore {
    async fn put(&self, key: &str, body: Bytes, content_type: &str) -> Result<(), StoreError> {
        if !is_valid_key(key) {
            return Err(StoreError::InvalidKey(key.to_string()));
        }

        let metadata = ObjectMetadata {
            content_type: Some(content_type.to_string()),
        };
        let metadata_json = serde_json::to_vec(&metadata).map_err(|source| StoreError::Metadata {
            key: key.to_string(),
            source,
        })?;

        write_atomic(key, &self.meta_path(key), &metadata_json).await?;
        write_atomic(key, &self.object_path(key), &body).await?;

        tracing::debug!(key, bytes = body.len(), "stored object");
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<StoredObject>, StoreError> {
        // Nothing can ever be stored under an invalid key
        if !is_valid_key(key) {
            return Ok(None);
        }

        let body = match tokio::fs::read(self.object_path(key)).await {
            Ok(body) => body,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                // A directory such as `programs` is not an object
                let is_dir = tokio::fs::metadata(self.object_path(key))
                    .await
                    .map(|m| m.is_dir())
                    .unwrap_or(false);
                if is_dir {
                    return Ok(None);
                }
                return Err(StoreError::Io {
                    key: key.to_string(),
                    source,
                });
            }
        };

        let content_type = match tokio::fs::read(self.meta_path(key)).await {
            Ok(raw) => {
                let metadata: ObjectMetadata =
                    serde_json::from_slice(&raw).map_err(|source| StoreError::Metadata {
                        key: key.to_string(),
                        source,
                    })?;
                metadata.content_type
            }
            Err(e) if e.kind() == ErrorKind::NotFound => None,
            Err(source) => {
                return Err(StoreError::Io {
                    key: key.to_string(),
                    source,
                })
            }
        };

        Ok(Some(StoredObject {
            etag: etag_for(&body),
            body: Bytes::from(body),
            content_type,
        }))
    }
}
