use std::sync::Arc;

use anyhow::{Context, anyhow};
use clap::{Args, Parser, Subcommand};
use weather_sync_core::{Config, Coordinate, Coordinator, RefreshOutcome, backend_from_config};

use crate::{configure, terminal::TerminalView};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather-sync", version, about = "Weather and AI advice, kept in sync")]
pub struct Cli {
    /// Override the configured server base URL.
    #[arg(long, global = true)]
    pub server: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Args)]
pub struct LocationArgs {
    /// Latitude; falls back to the configured location.
    #[arg(long, allow_hyphen_values = true, requires = "lon")]
    pub lat: Option<f64>,

    /// Longitude; falls back to the configured location.
    #[arg(long, allow_hyphen_values = true, requires = "lat")]
    pub lon: Option<f64>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Interactively configure server, retry policy and default location.
    Configure,

    /// Fetch current weather once.
    Weather {
        #[command(flatten)]
        location: LocationArgs,
    },

    /// Fetch current weather, then ask for advice.
    Advice {
        #[command(flatten)]
        location: LocationArgs,
    },

    /// Refresh weather and advice periodically until Ctrl-C.
    Watch {
        #[command(flatten)]
        location: LocationArgs,

        /// Seconds between refreshes (30-3600); defaults to the configured interval.
        #[arg(long)]
        interval: Option<u64>,

        /// Ask for advice once before the first tick.
        #[arg(long)]
        advice: bool,
    },

    /// Show recent weather records for the location.
    History {
        #[command(flatten)]
        location: LocationArgs,

        /// Number of records; defaults to the configured limit.
        #[arg(long)]
        limit: Option<u32>,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        let mut config = Config::load()?;
        if let Some(server) = self.server {
            config.server.base_url = server;
        }

        match self.command {
            Command::Configure => configure::run(config),
            Command::Weather { location } => {
                let mut coordinator = connect(&config)?;
                let outcome = bind(&mut coordinator, &location, &config).await?;
                weather_loaded(outcome)
            }
            Command::Advice { location } => {
                let mut coordinator = connect(&config)?;
                let outcome = bind(&mut coordinator, &location, &config).await?;
                weather_loaded(outcome).context("Cannot ask for advice without weather data")?;
                coordinator.request_advice().await?;
                Ok(())
            }
            Command::Watch { location, interval, advice } => {
                let mut coordinator = connect(&config)?;
                bind(&mut coordinator, &location, &config).await?;
                if advice {
                    // No weather yet is not fatal here; the scheduler keeps trying.
                    if let Err(e) = coordinator.request_advice().await {
                        tracing::warn!("skipping initial advice: {}", e);
                    }
                }

                let interval = interval.unwrap_or(config.scheduler.interval_secs);
                coordinator.start_scheduler(interval)?;

                tokio::signal::ctrl_c().await.context("Failed to listen for Ctrl-C")?;
                coordinator.stop_scheduler();
                Ok(())
            }
            Command::History { location, limit } => {
                let mut coordinator = connect(&config)?;
                let coordinate = resolve_coordinate(&location, &config)?;
                coordinator.set_coordinate(coordinate);
                coordinator.load_history(limit.unwrap_or(config.history.limit)).await?;
                Ok(())
            }
        }
    }
}

fn connect(config: &Config) -> anyhow::Result<Coordinator> {
    let backend = backend_from_config(config)?;
    Ok(Coordinator::from_config(backend, Arc::new(TerminalView::new()), config))
}

async fn bind(
    coordinator: &mut Coordinator,
    location: &LocationArgs,
    config: &Config,
) -> anyhow::Result<RefreshOutcome> {
    let coordinate = resolve_coordinate(location, config)?;
    Ok(coordinator.bind_location(coordinate).await)
}

fn weather_loaded(outcome: RefreshOutcome) -> anyhow::Result<()> {
    match outcome {
        RefreshOutcome::Failed => Err(anyhow!("Weather fetch failed after all retries")),
        _ => Ok(()),
    }
}

fn resolve_coordinate(location: &LocationArgs, config: &Config) -> anyhow::Result<Coordinate> {
    match (location.lat, location.lon) {
        (Some(lat), Some(lon)) => Ok(Coordinate::new(lat, lon)?),
        _ => config.default_coordinate().ok_or_else(|| {
            anyhow!(
                "No location given.\n\
                 Hint: pass --lat/--lon or run `weather-sync configure` to set a default location."
            )
        }),
    }
}
