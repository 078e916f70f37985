use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, Response};
use bytes::Bytes;
use http_body_util::BodyExt;
use tower::ServiceExt;

use radiko_harvester::{ArtifactStore, MemoryStore, StoreError, StoredObject};
use radiko_pipeline::{router, ServerState};

pub const DIRECTORY_XML: &str = r#"<stations area_id="JP13">
  <station><id>TBS</id><name>TBSラジオ</name></station>
  <station><id>QRR</id><name>文化放送</name></station>
</stations>"#;

pub fn schedule_xml(id: &str) -> String {
    format!(
        r#"<radiko><stations><station id="{id}"><name>{id}</name>
            <progs><date>20240115</date>
              <prog id="{id}-1" ft="20240115050000" to="20240115060000" dur="3600">
                <title>Morning</title><url/><desc/><info/><pfm>Host</pfm><img/>
              </prog>
              <prog id="{id}-2" ft="20240115060000" to="20240115070000" dur="3600">
                <title>News</title><url/><desc/><info/><pfm/><img/>
              </prog>
            </progs>
            <progs><date>20240116</date>
              <prog id="{id}-3" ft="20240116050000" to="20240116060000" dur="3600">
                <title>Morning</title><url/><desc/><info/><pfm>Host</pfm><img/>
              </prog>
              <prog id="{id}-4" ft="20240116060000" to="20240116070000" dur="3600">
                <title>News</title><url/><desc/><info/><pfm/><img/>
              </prog>
            </progs>
        </station></stations></radiko>"#
    )
}

/// Send one request through a fresh router over `store`.
#[allow(dead_code)]
pub async fn send(
    store: Arc<dyn ArtifactStore>,
    read_via_manifest: bool,
    method: &str,
    uri: &str,
) -> Response<Body> {
    let app = router(ServerState::new(store).with_read_via_manifest(read_via_manifest));
    app.oneshot(
        Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap(),
    )
    .await
    .unwrap()
}

#[allow(dead_code)]
pub async fn body_bytes(response: Response<Body>) -> Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

#[allow(dead_code)]
pub async fn seeded_store(objects: &[(&str, &str)]) -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::new());
    for (key, body) in objects {
        store
            .put(key, Bytes::from(body.to_string()), "application/json")
            .await
            .unwrap();
    }
    store
}

/// Store whose reads always fail.
#[allow(dead_code)]
pub struct BrokenStore;

#[async_trait]
impl ArtifactStore for BrokenStore {
    async fn put(&self, key: &str, _body: Bytes, _content_type: &str) -> Result<(), StoreError> {
        Err(StoreError::InvalidKey(key.to_string()))
    }

    async fn get(&self, key: &str) -> Result<Option<StoredObject>, StoreError> {
        Err(StoreError::Io {
            key: key.to_string(),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        })
    }
}
