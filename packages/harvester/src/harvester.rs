//! Harvest orchestrator that ties all components together.
//!
//! One run walks `FetchDirectory → WriteDirectory → (FetchSchedule →
//! WriteSchedule)* → Done`, one station at a time in directory order. The
//! first failure ends the run: stations before it keep their fresh artifacts,
//! stations after it keep whatever an earlier run left behind. The run never
//! returns an error; the outcome is described by [`HarvestReport`].

use std::fmt;
use std::str::FromStr;
use std::time::{Duration, Instant};

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::config::{programs_key, ARTIFACT_CONTENT_TYPE, MANIFEST_KEY, STATIONS_KEY};
use crate::error::{ErrorKind, HarvesterError, Result};
use crate::manifest::{staging_prefix, Manifest};
use crate::source::{fetch_programs, fetch_stations, StationSource};
use crate::store::ArtifactStore;

/// Where a run writes its artifacts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PublishMode {
    /// Overwrite `stations.json` and `programs/<id>.json` in place.
    #[default]
    Direct,
    /// Write under `runs/<run_id>/` and swap `manifest.json` on success.
    Staged,
}

impl PublishMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Direct => "direct",
            Self::Staged => "staged",
        }
    }
}

impl fmt::Display for PublishMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PublishMode {
    type Err = HarvesterError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "direct" => Ok(Self::Direct),
            "staged" => Ok(Self::Staged),
            other => Err(HarvesterError::Config(format!(
                "unknown publish mode '{other}', expected 'direct' or 'staged'"
            ))),
        }
    }
}

/// Step of a harvest run at which it stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HarvestStage {
    FetchDirectory,
    WriteDirectory,
    FetchSchedule,
    WriteSchedule,
    Publish,
    Cancelled,
}

impl HarvestStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FetchDirectory => "fetch_directory",
            Self::WriteDirectory => "write_directory",
            Self::FetchSchedule => "fetch_schedule",
            Self::WriteSchedule => "write_schedule",
            Self::Publish => "publish",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for HarvestStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a run stopped early.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HarvestFailure {
    pub stage: HarvestStage,
    pub kind: ErrorKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub station_id: Option<String>,
    pub message: String,
}

impl HarvestFailure {
    fn from_error(stage: HarvestStage, station_id: Option<&str>, error: &HarvesterError) -> Self {
        Self {
            stage,
            kind: error.kind(),
            station_id: station_id.map(str::to_string),
            message: error.to_string(),
        }
    }

    fn cancelled(station_id: Option<&str>, reason: &str) -> Self {
        Self {
            stage: HarvestStage::Cancelled,
            kind: ErrorKind::Other,
            station_id: station_id.map(str::to_string),
            message: reason.to_string(),
        }
    }
}

/// Outcome of one harvest run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HarvestReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub publish_mode: PublishMode,
    /// Directory size; `None` when the directory never validated.
    pub stations_total: Option<usize>,
    pub directory_written: bool,
    pub stations_attempted: usize,
    pub schedules_written: usize,
    /// Staged mode only: the manifest now points at this run.
    pub published: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<HarvestFailure>,
}

impl HarvestReport {
    fn new(publish_mode: PublishMode) -> Self {
        let now = Utc::now();
        Self {
            run_id: Uuid::new_v4(),
            started_at: now,
            finished_at: now,
            publish_mode,
            stations_total: None,
            directory_written: false,
            stations_attempted: 0,
            schedules_written: 0,
            published: false,
            failure: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.failure.is_none()
    }
}

/// Harvest orchestrator.
pub struct Harvester<'a, S: StationSource + ?Sized, A: ArtifactStore + ?Sized> {
    source: &'a S,
    store: &'a A,
    publish_mode: PublishMode,
    time_budget: Option<Duration>,
}

impl<'a, S: StationSource + ?Sized, A: ArtifactStore + ?Sized> Harvester<'a, S, A> {
    pub fn new(source: &'a S, store: &'a A) -> Self {
        Self {
            source,
            store,
            publish_mode: PublishMode::Direct,
            time_budget: None,
        }
    }

    pub fn with_publish_mode(mut self, publish_mode: PublishMode) -> Self {
        self.publish_mode = publish_mode;
        self
    }

    /// Stop the run at the next station boundary once this much time passed.
    pub fn with_time_budget(mut self, time_budget: Duration) -> Self {
        self.time_budget = Some(time_budget);
        self
    }

    /// Execute one harvest run.
    ///
    /// `cancel` and the time budget are checked before the directory fetch
    /// and before each station; an in-flight request or write always
    /// completes.
    pub async fn run(&self, cancel: &CancellationToken) -> HarvestReport {
        let mut report = HarvestReport::new(self.publish_mode);
        let deadline = self.time_budget.map(|budget| Instant::now() + budget);

        tracing::info!(
            run_id = %report.run_id,
            publish_mode = %self.publish_mode,
            "starting harvest run"
        );

        match self.execute(&mut report, cancel, deadline).await {
            Ok(()) => {
                tracing::info!(
                    run_id = %report.run_id,
                    stations = report.schedules_written,
                    published = report.published,
                    "harvest run completed"
                );
            }
            Err(failure) => {
                tracing::error!(
                    run_id = %report.run_id,
                    stage = %failure.stage,
                    station_id = failure.station_id.as_deref().unwrap_or("-"),
                    attempted = report.stations_attempted,
                    written = report.schedules_written,
                    error = %failure.message,
                    "harvest run failed"
                );
                report.failure = Some(failure);
            }
        }

        report.finished_at = Utc::now();
        report
    }

    async fn execute(
        &self,
        report: &mut HarvestReport,
        cancel: &CancellationToken,
        deadline: Option<Instant>,
    ) -> std::result::Result<(), HarvestFailure> {
        check_continue(cancel, deadline, None)?;

        let stations = fetch_stations(self.source)
            .await
            .map_err(|e| HarvestFailure::from_error(HarvestStage::FetchDirectory, None, &e))?;
        report.stations_total = Some(stations.len());

        let prefix = match self.publish_mode {
            PublishMode::Direct => String::new(),
            PublishMode::Staged => staging_prefix(report.run_id),
        };

        self.write_json(&format!("{prefix}{STATIONS_KEY}"), &stations)
            .await
            .map_err(|e| HarvestFailure::from_error(HarvestStage::WriteDirectory, None, &e))?;
        report.directory_written = true;
        tracing::debug!(stations = stations.len(), "station directory written");

        for station in &stations {
            let station_id = station.id.as_str();
            check_continue(cancel, deadline, Some(station_id))?;
            report.stations_attempted += 1;

            let programs = fetch_programs(self.source, station_id).await.map_err(|e| {
                HarvestFailure::from_error(HarvestStage::FetchSchedule, Some(station_id), &e)
            })?;

            self.write_json(&format!("{prefix}{}", programs_key(station_id)), &programs)
                .await
                .map_err(|e| {
                    HarvestFailure::from_error(HarvestStage::WriteSchedule, Some(station_id), &e)
                })?;
            report.schedules_written += 1;

            tracing::debug!(station_id, days = programs.len(), "weekly schedule written");
        }

        if self.publish_mode == PublishMode::Staged {
            let manifest = Manifest::new(report.run_id, stations.len());
            self.write_json(MANIFEST_KEY, &manifest)
                .await
                .map_err(|e| HarvestFailure::from_error(HarvestStage::Publish, None, &e))?;
            report.published = true;
            tracing::info!(prefix = %manifest.prefix, "manifest published");
        }

        Ok(())
    }

    async fn write_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let body = serde_json::to_vec(value)?;
        self.store
            .put(key, Bytes::from(body), ARTIFACT_CONTENT_TYPE)
            .await?;
        Ok(())
    }
}

fn check_continue(
    cancel: &CancellationToken,
    deadline: Option<Instant>,
    station_id: Option<&str>,
) -> std::result::Result<(), HarvestFailure> {
    if cancel.is_cancelled() {
        return Err(HarvestFailure::cancelled(station_id, "harvest run cancelled"));
    }
    if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
        return Err(HarvestFailure::cancelled(station_id, "harvest time budget exhausted"));
    }
    Ok(())
}
