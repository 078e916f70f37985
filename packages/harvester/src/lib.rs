//! radiko harvester - Cache the radiko station directory and weekly schedules.
//!
//! This crate fetches the radiko station directory and every station's weekly
//! program schedule, converts the XML into a compact JSON model and writes the
//! result to an artifact store.
//!
//! # Example
//!
//! ```
//! use radiko_harvester::{config, parse_stations, ArrayShape};
//!
//! assert!(config::validate_area_id("JP13").is_ok());
//!
//! let stations = parse_stations(
//!     "<stations>\
//!        <station><id>TBS</id><name>TBS RADIO</name></station>\
//!        <station><id>QRR</id><name>JOQR</name></station>\
//!      </stations>",
//!     ArrayShape::Strict,
//! )
//! .unwrap();
//! assert_eq!(stations[0].id, "TBS");
//! assert_eq!(stations.len(), 2);
//! ```
//!
//! # Architecture
//!
//! The harvester is organized into several modules:
//!
//! - [`config`]: Configuration constants, URLs and artifact keys
//! - [`types`]: Output model and typed upstream documents
//! - [`error`]: Error types and Result alias
//! - [`http`]: HTTP client and retry policy
//! - [`xml`]: XML to JSON tree decoding
//! - [`schema`]: Structural validation of decoded trees
//! - [`transform`]: Upstream documents to output model
//! - [`source`]: Upstream access and the per-document pipeline
//! - [`store`]: Artifact store trait and implementations
//! - [`manifest`]: Staged publishing manifest
//! - [`harvester`]: Harvest orchestrator
//! - [`cli`]: Command-line interface

pub mod cli;
pub mod config;
pub mod error;
pub mod harvester;
pub mod http;
pub mod manifest;
pub mod schema;
pub mod source;
pub mod store;
pub mod transform;
pub mod types;
pub mod xml;

// Re-export main entry points
pub use harvester::{HarvestFailure, HarvestReport, HarvestStage, Harvester, PublishMode};
pub use source::{fetch_programs, fetch_stations, parse_programs, parse_stations};

// Re-export commonly used items
pub use config::{programs_key, SourceConfig, MANIFEST_KEY, STATIONS_KEY};
pub use error::{ErrorKind, HarvesterError, Result, StoreError};
pub use manifest::{load_manifest, Manifest};
pub use schema::ArrayShape;
pub use source::{RadikoClient, StationSource};
pub use store::{ArtifactStore, FsStore, MemoryStore, StoredObject};
pub use types::{Program, ProgramsInDate, Station};
