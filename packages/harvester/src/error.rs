//! Error types for the harvester.
//!
//! `HarvesterError` covers everything that can go wrong while producing an
//! artifact; `StoreError` is the narrower error of the artifact store so that
//! store implementations do not depend on HTTP or XML crates.

use thiserror::Error;

/// Main error type for the harvester library.
#[derive(Debug, Error)]
pub enum HarvesterError {
    /// Connection error, timeout or other failure before a response arrived.
    #[error("HTTP request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Upstream answered with a non-success status.
    #[error("upstream returned {status} for {url}")]
    UpstreamStatus { url: String, status: u16 },

    /// All attempts allowed by the retry policy failed.
    #[error("giving up on {url} after {attempts} attempts: {message}")]
    RetriesExhausted {
        url: String,
        attempts: u32,
        message: String,
    },

    /// XML parsing failed.
    #[error("XML parsing failed: {0}")]
    XmlParse(#[from] roxmltree::Error),

    /// Decoded document does not match its schema.
    #[error("{schema} validation failed: {}", errors.join(", "))]
    Validation {
        schema: &'static str,
        errors: Vec<String>,
    },

    /// JSON serialization of an artifact failed.
    #[error("JSON serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Artifact store operation failed.
    #[error("artifact store error: {0}")]
    Store(#[from] StoreError),

    /// Invalid area identifier.
    #[error("Invalid area ID: '{0}'. Expected JP1 through JP47 (e.g., JP13)")]
    InvalidAreaId(String),

    /// Schedule URL template without a station placeholder.
    #[error("Invalid schedule URL template: '{0}'. Expected a {{station_id}} placeholder")]
    InvalidUrlTemplate(String),

    /// Other configuration problem.
    #[error("configuration error: {0}")]
    Config(String),

    /// A harvest run stopped before completing.
    #[error("harvest failed at {stage}: {message}")]
    HarvestFailed { stage: String, message: String },
}

/// Coarse classification used in harvest reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Transport,
    Validation,
    Store,
    Other,
}

impl HarvesterError {
    /// Classify this error for reporting.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Transport { .. } | Self::UpstreamStatus { .. } | Self::RetriesExhausted { .. } => {
                ErrorKind::Transport
            }
            Self::XmlParse(_) | Self::Validation { .. } => ErrorKind::Validation,
            Self::Store(_) => ErrorKind::Store,
            Self::Serialization(_)
            | Self::InvalidAreaId(_)
            | Self::InvalidUrlTemplate(_)
            | Self::Config(_)
            | Self::HarvestFailed { .. } => ErrorKind::Other,
        }
    }
}

/// Errors raised by artifact store implementations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error on key '{key}': {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("key '{0}' is not a valid object key")]
    InvalidKey(String),

    #[error("corrupt metadata for key '{key}': {source}")]
    Metadata {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Result type alias for harvester operations.
pub type Result<T> = std::result::Result<T, HarvesterError>;
