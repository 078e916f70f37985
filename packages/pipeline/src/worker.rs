use tokio::signal::unix::{signal, SignalKind};
use tokio_util::sync::CancellationToken;

use radiko_harvester::{
    ArtifactStore, FsStore, HarvestReport, Harvester, RadikoClient, StationSource,
};

use crate::config::WorkerConfig;
use crate::error::{PipelineError, Result};

/// Run the harvest worker loop.
///
/// Harvests immediately on startup and then every `config.interval`.
/// Supports graceful shutdown via SIGTERM and SIGINT (ctrl+c). A signal also
/// cancels the in-flight run, which stops at its next station boundary.
pub async fn run_harvest_worker(config: WorkerConfig) -> Result<()> {
    let client = RadikoClient::new(&config.source)?;
    let store = FsStore::new(&config.store_dir);

    tracing::info!(
        store_dir = %config.store_dir.display(),
        directory_url = %config.source.directory_url,
        interval = ?config.interval,
        publish_mode = %config.publish_mode,
        "starting harvest worker"
    );

    let mut sigterm = signal(SignalKind::terminate()).map_err(|e| {
        PipelineError::Worker(format!("failed to register SIGTERM handler: {e}"))
    })?;

    let shutdown = CancellationToken::new();
    let trigger = shutdown.clone();
    tokio::spawn(async move {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("received SIGINT, stopping worker");
            }
            _ = sigterm.recv() => {
                tracing::info!("received SIGTERM, stopping worker");
            }
        }
        trigger.cancel();
    });

    run_harvest_loop(&client, &store, &config, &shutdown).await;
    Ok(())
}

/// Harvest on every interval tick until `shutdown` is cancelled.
///
/// Reports are logged and otherwise ignored: a failed run never stops the
/// loop.
pub async fn run_harvest_loop<S, A>(
    source: &S,
    store: &A,
    config: &WorkerConfig,
    shutdown: &CancellationToken,
) where
    S: StationSource + ?Sized,
    A: ArtifactStore + ?Sized,
{
    let mut next_run = std::time::Duration::ZERO; // harvest immediately on startup

    loop {
        tokio::select! {
            biased;

            _ = shutdown.cancelled() => break,
            _ = tokio::time::sleep(next_run) => {}
        }

        let report = run_once(source, store, config, shutdown).await;
        log_report(&report);
        next_run = config.interval;
    }
}

/// Execute a single harvest run with the worker's settings.
pub async fn run_once<S, A>(
    source: &S,
    store: &A,
    config: &WorkerConfig,
    cancel: &CancellationToken,
) -> HarvestReport
where
    S: StationSource + ?Sized,
    A: ArtifactStore + ?Sized,
{
    let mut harvester = Harvester::new(source, store).with_publish_mode(config.publish_mode);
    if let Some(budget) = config.time_budget {
        harvester = harvester.with_time_budget(budget);
    }
    harvester.run(cancel).await
}

fn log_report(report: &HarvestReport) {
    let elapsed_ms = (report.finished_at - report.started_at).num_milliseconds();
    match &report.failure {
        None => tracing::info!(
            run_id = %report.run_id,
            stations = report.schedules_written,
            elapsed_ms,
            "scheduled harvest succeeded"
        ),
        Some(failure) => tracing::warn!(
            run_id = %report.run_id,
            stage = %failure.stage,
            station_id = failure.station_id.as_deref().unwrap_or("-"),
            written = report.schedules_written,
            elapsed_ms,
            "scheduled harvest failed, artifacts may be partially stale"
        ),
    }
}
