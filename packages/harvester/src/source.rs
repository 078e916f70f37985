//! Upstream access: the two read-only requests and the per-document pipeline.

use async_trait::async_trait;
use reqwest::Client;

use crate::config::{weekly_schedule_url, SourceConfig};
use crate::error::Result;
use crate::http::{create_client, download_text, RetryPolicy};
use crate::schema::{validate_station_directory, validate_weekly_schedule, ArrayShape};
use crate::transform::{to_schedule, to_stations};
use crate::types::{ProgramsInDate, Station};
use crate::xml::decode;

/// Raw upstream documents, enabling fakes in tests.
#[async_trait]
pub trait StationSource: Send + Sync {
    /// Fetch the station directory XML.
    async fn fetch_station_directory(&self) -> Result<String>;

    /// Fetch one station's weekly schedule XML.
    async fn fetch_weekly_schedule(&self, station_id: &str) -> Result<String>;

    /// How this source's documents treat a lone repeated element.
    fn array_shape(&self) -> ArrayShape {
        ArrayShape::Strict
    }
}

/// radiko API client.
pub struct RadikoClient {
    http: Client,
    directory_url: String,
    schedule_url_template: String,
    retry: RetryPolicy,
    array_shape: ArrayShape,
}

impl RadikoClient {
    pub fn new(config: &SourceConfig) -> Result<Self> {
        Ok(Self {
            http: create_client(config.timeout)?,
            directory_url: config.directory_url.clone(),
            schedule_url_template: config.schedule_url_template.clone(),
            retry: config.retry,
            array_shape: config.array_shape,
        })
    }
}

#[async_trait]
impl StationSource for RadikoClient {
    async fn fetch_station_directory(&self) -> Result<String> {
        tracing::debug!(url = %self.directory_url, "fetching station directory");
        download_text(&self.http, &self.directory_url, &self.retry).await
    }

    async fn fetch_weekly_schedule(&self, station_id: &str) -> Result<String> {
        let url = weekly_schedule_url(&self.schedule_url_template, station_id);
        tracing::debug!(station_id, url = %url, "fetching weekly schedule");
        download_text(&self.http, &url, &self.retry).await
    }

    fn array_shape(&self) -> ArrayShape {
        self.array_shape
    }
}

/// Fetch, decode, validate and transform the station directory.
pub async fn fetch_stations<S: StationSource + ?Sized>(source: &S) -> Result<Vec<Station>> {
    let xml = source.fetch_station_directory().await?;
    parse_stations(&xml, source.array_shape())
}

/// Fetch, decode, validate and transform one station's weekly schedule.
pub async fn fetch_programs<S: StationSource + ?Sized>(
    source: &S,
    station_id: &str,
) -> Result<Vec<ProgramsInDate>> {
    let xml = source.fetch_weekly_schedule(station_id).await?;
    parse_programs(&xml, source.array_shape())
}

/// Decode, validate and transform station directory XML.
pub fn parse_stations(xml: &str, shape: ArrayShape) -> Result<Vec<Station>> {
    let tree = decode(xml)?;
    let doc = validate_station_directory(&tree, shape)?;
    Ok(to_stations(doc))
}

/// Decode, validate and transform weekly schedule XML.
pub fn parse_programs(xml: &str, shape: ArrayShape) -> Result<Vec<ProgramsInDate>> {
    let tree = decode(xml)?;
    let doc = validate_weekly_schedule(&tree, shape)?;
    Ok(to_schedule(doc))
}

/// Test utilities for the station source.
#[cfg(any(test, feature = "test-utils"))]
pub mod test_support {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use super::*;
    use crate::error::HarvesterError;

    /// In-memory source serving canned XML and recording requests.
    #[derive(Default)]
    pub struct MockSource {
        directory: Option<String>,
        schedules: HashMap<String, String>,
        requests: Mutex<Vec<String>>,
        array_shape: ArrayShape,
    }

    impl MockSource {
        pub fn new(directory: impl Into<String>) -> Self {
            Self {
                directory: Some(directory.into()),
                ..Default::default()
            }
        }

        pub fn with_schedule(mut self, station_id: &str, xml: impl Into<String>) -> Self {
            self.schedules.insert(station_id.to_string(), xml.into());
            self
        }

        pub fn with_array_shape(mut self, shape: ArrayShape) -> Self {
            self.array_shape = shape;
            self
        }

        /// Requested documents in order: `directory` or a station id.
        pub fn requests(&self) -> Vec<String> {
            self.requests.lock().map(|r| r.clone()).unwrap_or_default()
        }

        fn record(&self, request: &str) {
            if let Ok(mut requests) = self.requests.lock() {
                requests.push(request.to_string());
            }
        }
    }

    #[async_trait]
    impl StationSource for MockSource {
        async fn fetch_station_directory(&self) -> Result<String> {
            self.record("directory");
            self.directory.clone().ok_or(HarvesterError::UpstreamStatus {
                url: "mock://directory".to_string(),
                status: 503,
            })
        }

        async fn fetch_weekly_schedule(&self, station_id: &str) -> Result<String> {
            self.record(station_id);
            self.schedules
                .get(station_id)
                .cloned()
                .ok_or_else(|| HarvesterError::UpstreamStatus {
                    url: format!("mock://weekly/{station_id}"),
                    status: 404,
                })
        }

        fn array_shape(&self) -> ArrayShape {
            self.array_shape
        }
    }
}
