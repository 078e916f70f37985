//! Configuration constants and validation functions for the harvester.

use regex::Regex;
use std::sync::LazyLock;
use std::time::Duration;

use crate::error::{HarvesterError, Result};
use crate::http::RetryPolicy;
use crate::schema::ArrayShape;

/// Base URL for the radiko v3 API.
pub const RADIKO_BASE_URL: &str = "http://radiko.jp/v3";

/// Area whose station directory is harvested by default (Tokyo).
pub const DEFAULT_AREA_ID: &str = "JP13";

/// Placeholder substituted with the station id in schedule URL templates.
pub const STATION_ID_PLACEHOLDER: &str = "{station_id}";

/// HTTP timeout in seconds.
pub const HTTP_TIMEOUT_SECS: u64 = 30;

/// Store key of the station directory artifact.
pub const STATIONS_KEY: &str = "stations.json";

/// Store key of the staged-publishing manifest.
pub const MANIFEST_KEY: &str = "manifest.json";

/// Content type of every artifact written by the harvester.
pub const ARTIFACT_CONTENT_TYPE: &str = "application/json";

/// Area ID pattern: JP followed by a prefecture number 1-47.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static AREA_ID_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^JP([1-9]|[1-3][0-9]|4[0-7])$").expect("valid regex"));

/// Validate area ID format.
///
/// # Examples
/// ```
/// use radiko_harvester::config::validate_area_id;
///
/// assert!(validate_area_id("JP13").is_ok());
/// assert!(validate_area_id("JP48").is_err());
/// ```
pub fn validate_area_id(area_id: &str) -> Result<()> {
    if AREA_ID_PATTERN.is_match(area_id) {
        Ok(())
    } else {
        Err(HarvesterError::InvalidAreaId(area_id.to_string()))
    }
}

/// Build the station directory URL for an area.
pub fn station_directory_url(area_id: &str) -> String {
    debug_assert!(
        AREA_ID_PATTERN.is_match(area_id),
        "area_id should be validated before calling station_directory_url"
    );
    format!("{RADIKO_BASE_URL}/station/list/{area_id}.xml")
}

/// Default weekly schedule URL template.
pub fn default_schedule_url_template() -> String {
    format!("{RADIKO_BASE_URL}/program/station/weekly/{STATION_ID_PLACEHOLDER}.xml")
}

/// Substitute a station id into a schedule URL template.
///
/// The id is inserted verbatim; upstream-provided ids are trusted.
///
/// # Examples
/// ```
/// use radiko_harvester::config::weekly_schedule_url;
///
/// assert_eq!(
///     weekly_schedule_url("http://radiko.jp/v3/program/station/weekly/{station_id}.xml", "TBS"),
///     "http://radiko.jp/v3/program/station/weekly/TBS.xml"
/// );
/// ```
pub fn weekly_schedule_url(template: &str, station_id: &str) -> String {
    template.replace(STATION_ID_PLACEHOLDER, station_id)
}

/// Store key of a station's weekly schedule artifact.
pub fn programs_key(station_id: &str) -> String {
    format!("programs/{station_id}.json")
}

/// Where and how the source client talks to upstream.
#[derive(Debug, Clone)]
pub struct SourceConfig {
    pub directory_url: String,
    pub schedule_url_template: String,
    pub timeout: Duration,
    pub retry: RetryPolicy,
    /// Whether a lone repeated element may stand in for a one-element list.
    pub array_shape: ArrayShape,
}

impl SourceConfig {
    pub fn builder() -> SourceConfigBuilder {
        SourceConfigBuilder::default()
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            directory_url: station_directory_url(DEFAULT_AREA_ID),
            schedule_url_template: default_schedule_url_template(),
            timeout: Duration::from_secs(HTTP_TIMEOUT_SECS),
            retry: RetryPolicy::default(),
            array_shape: ArrayShape::default(),
        }
    }
}

#[derive(Debug, Default)]
pub struct SourceConfigBuilder {
    area_id: Option<String>,
    directory_url: Option<String>,
    schedule_url_template: Option<String>,
    timeout: Option<Duration>,
    retry: Option<RetryPolicy>,
    array_shape: ArrayShape,
}

impl SourceConfigBuilder {
    /// Harvest the directory of this area. Ignored when `directory_url` is set.
    pub fn area_id(mut self, area_id: impl Into<String>) -> Self {
        self.area_id = Some(area_id.into());
        self
    }

    pub fn directory_url(mut self, url: impl Into<String>) -> Self {
        self.directory_url = Some(url.into());
        self
    }

    pub fn schedule_url_template(mut self, template: impl Into<String>) -> Self {
        self.schedule_url_template = Some(template.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = Some(retry);
        self
    }

    pub fn array_shape(mut self, shape: ArrayShape) -> Self {
        self.array_shape = shape;
        self
    }

    pub fn build(self) -> Result<SourceConfig> {
        let directory_url = match (self.directory_url, self.area_id) {
            (Some(url), _) => url,
            (None, Some(area_id)) => {
                validate_area_id(&area_id)?;
                station_directory_url(&area_id)
            }
            (None, None) => station_directory_url(DEFAULT_AREA_ID),
        };

        let schedule_url_template = self
            .schedule_url_template
            .unwrap_or_else(default_schedule_url_template);
        if !schedule_url_template.contains(STATION_ID_PLACEHOLDER) {
            return Err(HarvesterError::InvalidUrlTemplate(schedule_url_template));
        }

        let retry = self.retry.unwrap_or_default();
        if retry.max_attempts == 0 {
            return Err(HarvesterError::Config(
                "retry policy needs at least one attempt".to_string(),
            ));
        }

        Ok(SourceConfig {
            directory_url,
            schedule_url_template,
            timeout: self
                .timeout
                .unwrap_or(Duration::from_secs(HTTP_TIMEOUT_SECS)),
            retry,
            array_shape: self.array_shape,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_area_id_valid() {
        assert!(validate_area_id("JP1").is_ok());
        assert!(validate_area_id("JP13").is_ok());
        assert!(validate_area_id("JP27").is_ok());
        assert!(validate_area_id("JP47").is_ok());
    }

    #[test]
    fn test_validate_area_id_invalid() {
        assert!(validate_area_id("").is_err());
        assert!(validate_area_id("JP0").is_err());
        assert!(validate_area_id("JP48").is_err());
        assert!(validate_area_id("JP013").is_err()); // Leading zero
        assert!(validate_area_id("jp13").is_err()); // Lowercase
        assert!(validate_area_id("JP13 ").is_err());
    }

    #[test]
    fn test_station_directory_url() {
        assert_eq!(
            station_directory_url("JP13"),
            "http://radiko.jp/v3/station/list/JP13.xml"
        );
    }

    #[test]
    fn test_weekly_schedule_url_is_verbatim() {
        let template = default_schedule_url_template();
        assert_eq!(
            weekly_schedule_url(&template, "INT"),
            "http://radiko.jp/v3/program/station/weekly/INT.xml"
        );
        // No escaping is applied to upstream ids
        assert_eq!(
            weekly_schedule_url(&template, "A B"),
            "http://radiko.jp/v3/program/station/weekly/A B.xml"
        );
    }

    #[test]
    fn test_programs_key() {
        assert_eq!(programs_key("TBS"), "programs/TBS.json");
    }

    #[test]
    fn test_builder_defaults() {
        let config = SourceConfig::builder().build().unwrap();
        assert_eq!(config.directory_url, "http://radiko.jp/v3/station/list/JP13.xml");
        assert_eq!(
            config.schedule_url_template,
            "http://radiko.jp/v3/program/station/weekly/{station_id}.xml"
        );
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.retry.max_attempts, 1);
        assert_eq!(config.array_shape, ArrayShape::Strict);
    }

    #[test]
    fn test_builder_array_shape_opt_in() {
        let config = SourceConfig::builder()
            .array_shape(ArrayShape::AcceptSingle)
            .build()
            .unwrap();
        assert_eq!(config.array_shape, ArrayShape::AcceptSingle);
        assert_eq!(SourceConfig::default().array_shape, ArrayShape::Strict);
    }

    #[test]
    fn test_builder_area_id() {
        let config = SourceConfig::builder().area_id("JP27").build().unwrap();
        assert_eq!(config.directory_url, "http://radiko.jp/v3/station/list/JP27.xml");

        assert!(matches!(
            SourceConfig::builder().area_id("JP99").build(),
            Err(HarvesterError::InvalidAreaId(_))
        ));
    }

    #[test]
    fn test_builder_directory_url_wins_over_area() {
        let config = SourceConfig::builder()
            .area_id("JP27")
            .directory_url("http://localhost:1234/list.xml")
            .build()
            .unwrap();
        assert_eq!(config.directory_url, "http://localhost:1234/list.xml");
    }

    #[test]
    fn test_builder_rejects_template_without_placeholder() {
        let result = SourceConfig::builder()
            .schedule_url_template("http://localhost/weekly.xml")
            .build();
        assert!(matches!(result, Err(HarvesterError::InvalidUrlTemplate(_))));
    }

    #[test]
    fn test_builder_rejects_zero_attempts() {
        let result = SourceConfig::builder()
            .retry(RetryPolicy {
                max_attempts: 0,
                base_delay: Duration::ZERO,
            })
            .build();
        assert!(matches!(result, Err(HarvesterError::Config(_))));
    }
}
