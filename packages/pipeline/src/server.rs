//! Read-only HTTP surface over the artifact store.
//!
//! Every `GET /<key>` is answered from the store; there are no other routes.

use std::sync::Arc;

use axum::body::Body;
use axum::extract::State;
use axum::http::header::{CONTENT_TYPE, ETAG};
use axum::http::{HeaderMap, HeaderValue, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Router;
use tower_http::trace::TraceLayer;

use radiko_harvester::{load_manifest, ArtifactStore, FsStore, MANIFEST_KEY};

use crate::config::ServerConfig;
use crate::error::Result;

const NOT_FOUND_BODY: &str = "Object Not Found";

#[derive(Clone)]
pub struct ServerState {
    pub store: Arc<dyn ArtifactStore>,
    /// Look keys up under the prefix published in `manifest.json`.
    pub read_via_manifest: bool,
}

impl ServerState {
    pub fn new(store: Arc<dyn ArtifactStore>) -> Self {
        Self {
            store,
            read_via_manifest: false,
        }
    }

    pub fn with_read_via_manifest(mut self, enabled: bool) -> Self {
        self.read_via_manifest = enabled;
        self
    }
}

/// Build the read router.
pub fn router(state: ServerState) -> Router {
    Router::new()
        .fallback(serve_object)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// Serve the store at `config.listen_addr` until SIGINT.
pub async fn run_read_server(config: ServerConfig) -> Result<()> {
    let store: Arc<dyn ArtifactStore> = Arc::new(FsStore::new(&config.store_dir));
    let app = router(ServerState::new(store).with_read_via_manifest(config.read_via_manifest));

    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    tracing::info!(
        addr = %config.listen_addr,
        store_dir = %config.store_dir.display(),
        read_via_manifest = config.read_via_manifest,
        "read server listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("received SIGINT, stopping read server");
            }
        })
        .await?;
    Ok(())
}

async fn serve_object(
    State(state): State<ServerState>,
    method: Method,
    uri: Uri,
) -> std::result::Result<Response, StatusCode> {
    if !method.as_str().eq_ignore_ascii_case("GET") {
        return Err(StatusCode::METHOD_NOT_ALLOWED);
    }

    let key = uri.path().strip_prefix('/').unwrap_or(uri.path());
    let storage_key = resolve_key(&state, key).await?;

    let object = state.store.get(&storage_key).await.map_err(|e| {
        tracing::error!(key = %storage_key, error = %e, "store read failed");
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    let Some(object) = object else {
        tracing::debug!(key = %storage_key, "object not found");
        return Ok((StatusCode::NOT_FOUND, NOT_FOUND_BODY).into_response());
    };

    let mut headers = HeaderMap::new();
    if let Some(content_type) = object.content_type.as_deref() {
        match HeaderValue::from_str(content_type) {
            Ok(value) => {
                headers.insert(CONTENT_TYPE, value);
            }
            Err(_) => {
                tracing::warn!(key = %storage_key, "stored content type is not a valid header");
            }
        }
    }
    if let Ok(value) = HeaderValue::from_str(&object.etag) {
        headers.insert(ETAG, value);
    }

    Ok((StatusCode::OK, headers, Body::from(object.body)).into_response())
}

/// Map a request key onto a storage key, honouring the manifest if enabled.
async fn resolve_key(state: &ServerState, key: &str) -> std::result::Result<String, StatusCode> {
    if !state.read_via_manifest || key == MANIFEST_KEY {
        return Ok(key.to_string());
    }

    let manifest = load_manifest(state.store.as_ref()).await.map_err(|e| {
        tracing::error!(error = %e, "failed to load manifest");
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    Ok(match manifest {
        Some(manifest) => manifest.resolve(key),
        None => key.to_string(),
    })
}
