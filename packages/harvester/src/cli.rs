//! Command-line interface for the harvester.

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Parser, Subcommand};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tokio_util::sync::CancellationToken;

use crate::config::{SourceConfig, DEFAULT_AREA_ID};
use crate::error::{HarvesterError, Result};
use crate::harvester::{HarvestReport, Harvester, PublishMode};
use crate::http::RetryPolicy;
use crate::schema::ArrayShape;
use crate::source::{fetch_programs, fetch_stations, RadikoClient};
use crate::store::FsStore;

/// radiko harvester - Cache the radiko station directory and weekly schedules.
#[derive(Parser)]
#[command(name = "radiko-harvester")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// radiko area to harvest (JP1 to JP47)
    #[arg(short, long, global = true, default_value = DEFAULT_AREA_ID)]
    pub area: String,

    /// Attempts per upstream request, including the first
    #[arg(long, global = true, default_value_t = 1)]
    pub max_attempts: u32,

    /// Accept a lone station or program where upstream normally sends a list
    #[arg(long, global = true)]
    pub accept_single_elements: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run one full harvest into a store directory.
    Harvest {
        /// Store root directory
        #[arg(short, long)]
        store_dir: PathBuf,

        /// Write under runs/<run_id>/ and publish through manifest.json
        #[arg(long)]
        staged: bool,

        /// Stop at the next station boundary after this many seconds
        #[arg(long)]
        time_budget: Option<u64>,
    },

    /// Print the station directory as JSON.
    Stations,

    /// Print one station's weekly schedule as JSON.
    Schedule {
        /// radiko station ID (e.g., TBS)
        station_id: String,
    },
}

/// Run the CLI.
pub async fn run() -> Result<()> {
    let cli = Cli::parse();

    let config = SourceConfig::builder()
        .area_id(&cli.area)
        .retry(RetryPolicy::exponential(
            cli.max_attempts,
            RetryPolicy::default().base_delay,
        ))
        .array_shape(array_shape(cli.accept_single_elements))
        .build()?;
    let client = RadikoClient::new(&config)?;

    match cli.command {
        Commands::Harvest {
            store_dir,
            staged,
            time_budget,
        } => harvest_command(&client, &store_dir, staged, time_budget).await,
        Commands::Stations => {
            let stations = fetch_stations(&client).await?;
            print_json(&stations)
        }
        Commands::Schedule { station_id } => {
            let programs = fetch_programs(&client, &station_id).await?;
            print_json(&programs)
        }
    }
}

fn array_shape(accept_single_elements: bool) -> ArrayShape {
    if accept_single_elements {
        ArrayShape::AcceptSingle
    } else {
        ArrayShape::Strict
    }
}

/// Execute the harvest command.
async fn harvest_command(
    client: &RadikoClient,
    store_dir: &Path,
    staged: bool,
    time_budget: Option<u64>,
) -> Result<()> {
    let publish_mode = if staged {
        PublishMode::Staged
    } else {
        PublishMode::Direct
    };

    println!(
        "{} into {} ({})",
        style("Harvesting").bold(),
        style(store_dir.display()).cyan(),
        style(publish_mode).green()
    );
    println!();

    let pb = ProgressBar::new_spinner();
    #[allow(clippy::expect_used)] // Static template string that is guaranteed to be valid
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .expect("valid template"),
    );
    pb.set_message("Fetching station directory and schedules...");
    pb.enable_steady_tick(Duration::from_millis(100));

    let store = FsStore::new(store_dir);
    let mut harvester = Harvester::new(client, &store).with_publish_mode(publish_mode);
    if let Some(secs) = time_budget {
        harvester = harvester.with_time_budget(Duration::from_secs(secs));
    }

    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ctrl_c.cancel();
        }
    });

    let report = harvester.run(&cancel).await;
    pb.finish_and_clear();

    print_report(&report);

    match report.failure {
        None => Ok(()),
        Some(failure) => Err(HarvesterError::HarvestFailed {
            stage: failure.stage.to_string(),
            message: failure.message,
        }),
    }
}

fn print_report(report: &HarvestReport) {
    if let Some(total) = report.stations_total {
        println!("  Stations: {total}");
    }
    println!("  Schedules written: {}", report.schedules_written);
    if report.published {
        println!("  Published run: {}", style(report.run_id).green());
    }

    println!();
    match &report.failure {
        None => println!("{}", style("Harvest complete").green().bold()),
        Some(failure) => println!(
            "{} {}",
            style("Harvest failed:").red().bold(),
            failure.station_id.as_deref().unwrap_or("station directory")
        ),
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
