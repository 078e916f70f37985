use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use radiko_harvester::config::{SourceConfig, DEFAULT_AREA_ID, HTTP_TIMEOUT_SECS};
use radiko_harvester::http::RetryPolicy;
use radiko_harvester::{ArrayShape, PublishMode};

use crate::error::{PipelineError, Result};

const DEFAULT_STORE_DIR: &str = "./radiko-cache";
const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:8080";

#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub store_dir: PathBuf,
    pub interval: Duration,
    pub time_budget: Option<Duration>,
    pub publish_mode: PublishMode,
    pub source: SourceConfig,
}

impl WorkerConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable lookup.
    pub fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let store_dir = var("STORE_DIR")
            .unwrap_or_else(|| DEFAULT_STORE_DIR.into())
            .into();

        let interval_secs: u64 = var("HARVEST_INTERVAL_SECS")
            .and_then(|v| v.parse().ok())
            .unwrap_or(3600);

        let time_budget = var("HARVEST_TIME_BUDGET_SECS")
            .and_then(|v| v.parse().ok())
            .map(Duration::from_secs);

        let publish_mode = match var("PUBLISH_MODE") {
            Some(mode) => mode
                .parse()
                .map_err(|e| PipelineError::Config(format!("PUBLISH_MODE: {e}")))?,
            None => PublishMode::Direct,
        };

        let max_attempts: u32 = var("UPSTREAM_MAX_ATTEMPTS")
            .and_then(|v| v.parse().ok())
            .unwrap_or(1);

        let base_delay_ms: u64 = var("UPSTREAM_RETRY_BASE_DELAY_MS")
            .and_then(|v| v.parse().ok())
            .unwrap_or(500);

        let timeout_secs: u64 = var("UPSTREAM_TIMEOUT_SECS")
            .and_then(|v| v.parse().ok())
            .unwrap_or(HTTP_TIMEOUT_SECS);

        // Upstream normally repeats stations and programs; a lone one is opt-in
        let array_shape = if var("RADIKO_ACCEPT_SINGLE_ELEMENTS").is_some_and(|v| is_truthy(&v)) {
            ArrayShape::AcceptSingle
        } else {
            ArrayShape::Strict
        };

        let mut builder = SourceConfig::builder()
            .area_id(var("RADIKO_AREA_ID").unwrap_or_else(|| DEFAULT_AREA_ID.into()))
            .array_shape(array_shape)
            .timeout(Duration::from_secs(timeout_secs))
            .retry(RetryPolicy::exponential(
                max_attempts,
                Duration::from_millis(base_delay_ms),
            ));
        if let Some(url) = var("RADIKO_DIRECTORY_URL") {
            builder = builder.directory_url(url);
        }
        if let Some(template) = var("RADIKO_SCHEDULE_URL_TEMPLATE") {
            builder = builder.schedule_url_template(template);
        }

        Ok(Self {
            store_dir,
            interval: Duration::from_secs(interval_secs),
            time_budget,
            publish_mode,
            source: builder.build()?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub store_dir: PathBuf,
    pub listen_addr: SocketAddr,
    /// Resolve keys through `manifest.json` (staged deployments).
    pub read_via_manifest: bool,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let store_dir = var("STORE_DIR")
            .unwrap_or_else(|| DEFAULT_STORE_DIR.into())
            .into();

        let listen_addr = var("LISTEN_ADDR").unwrap_or_else(|| DEFAULT_LISTEN_ADDR.into());
        let listen_addr = listen_addr
            .parse()
            .map_err(|e| PipelineError::Config(format!("LISTEN_ADDR '{listen_addr}': {e}")))?;

        let read_via_manifest = var("READ_VIA_MANIFEST").is_some_and(|v| is_truthy(&v));

        Ok(Self {
            store_dir,
            listen_addr,
            read_via_manifest,
        })
    }
}

fn is_truthy(value: &str) -> bool {
    value == "true" || value == "1"
}
