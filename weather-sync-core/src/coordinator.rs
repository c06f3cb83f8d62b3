use std::sync::Arc;
use std::time::Duration;

use crate::backend::WeatherBackend;
use crate::config::Config;
use crate::error::ValidationError;
use crate::model::{Coordinate, HistoryEntry, UpdateSource};
use crate::retry::{RequestKind, RetryPolicy};
use crate::scheduler::{Scheduler, SchedulerStatus};
use crate::state::SharedState;
use crate::view::View;
use crate::weather::RefreshOutcome;
use crate::{advice, weather};

/// Everything a refresh operation needs. Cheap to clone.
#[derive(Clone)]
pub struct Services {
    pub backend: Arc<dyn WeatherBackend>,
    pub view: Arc<dyn View>,
    pub state: SharedState,
    pub retry: RetryPolicy,
}

/// Entry point for user actions: binds a location, runs manual refreshes
/// and owns the scheduler.
pub struct Coordinator {
    services: Services,
    coordinate: Option<Coordinate>,
    scheduler: Scheduler,
}

impl Coordinator {
    pub fn new(
        backend: Arc<dyn WeatherBackend>,
        view: Arc<dyn View>,
        retry: RetryPolicy,
        advice_delay: Duration,
    ) -> Self {
        let services = Services { backend, view, state: SharedState::new(), retry };
        let scheduler = Scheduler::new(services.clone(), advice_delay);
        Self { services, coordinate: None, scheduler }
    }

    pub fn from_config(backend: Arc<dyn WeatherBackend>, view: Arc<dyn View>, config: &Config) -> Self {
        Self::new(backend, view, config.retry.policy(), config.scheduler.advice_delay())
    }

    pub fn state(&self) -> &SharedState {
        &self.services.state
    }

    pub fn coordinate(&self) -> Option<Coordinate> {
        self.coordinate
    }

    pub fn scheduler_status(&self) -> SchedulerStatus {
        self.scheduler.status()
    }

    /// Bind the coordinate without any network call.
    pub fn set_coordinate(&mut self, coordinate: Coordinate) {
        self.coordinate = Some(coordinate);
    }

    /// Bind the coordinate, then resolve a display name for it while the
    /// initial weather loads.
    ///
    /// The name lookup is best effort and runs alongside the weather fetch,
    /// so its retries never hold the weather back. A failure keeps whatever
    /// name was shown before.
    pub async fn bind_location(&mut self, coordinate: Coordinate) -> RefreshOutcome {
        self.set_coordinate(coordinate);

        let services = &self.services;
        let (_, outcome) = tokio::join!(
            resolve_location_name(services, coordinate),
            weather::refresh(services, coordinate, UpdateSource::Manual),
        );
        outcome
    }

    pub async fn refresh_weather(&self) -> Result<RefreshOutcome, ValidationError> {
        let coordinate = self.coordinate.ok_or(ValidationError::MissingCoordinate)?;
        Ok(weather::refresh(&self.services, coordinate, UpdateSource::Manual).await)
    }

    /// Ask for fresh advice and display it regardless of the server's
    /// `need_update` verdict.
    pub async fn request_advice(&self) -> Result<RefreshOutcome, ValidationError> {
        let (ctx, record_id) =
            self.services.state.refresh_context().ok_or(ValidationError::WeatherNotLoaded)?;
        Ok(advice::refresh_advice(&self.services, ctx, record_id, UpdateSource::Manual).await)
    }

    pub fn start_scheduler(&mut self, interval_secs: u64) -> Result<(), ValidationError> {
        self.scheduler.start(self.coordinate, interval_secs)
    }

    pub fn stop_scheduler(&mut self) {
        self.scheduler.stop();
    }

    /// Fetch recent records for the bound coordinate. `None` when the
    /// request failed; the error has been reported to the view.
    pub async fn load_history(&self, limit: u32) -> Result<Option<Vec<HistoryEntry>>, ValidationError> {
        let coordinate = self.coordinate.ok_or(ValidationError::MissingCoordinate)?;
        if limit == 0 {
            return Err(ValidationError::HistoryLimit);
        }

        let services = &self.services;
        let result = services
            .retry
            .execute(
                RequestKind::History,
                |status| services.view.request_status(&status),
                || services.backend.history(coordinate, limit),
            )
            .await;

        match result {
            Ok(entries) => {
                services.view.history_loaded(&entries);
                Ok(Some(entries))
            }
            Err(e) => {
                services.view.history_failed(&e.to_string());
                Ok(None)
            }
        }
    }
}

async fn resolve_location_name(services: &Services, coordinate: Coordinate) {
    let name = services
        .retry
        .execute(
            RequestKind::Location,
            |status| services.view.request_status(&status),
            || services.backend.location_name(coordinate),
        )
        .await;

    match name {
        Ok(Some(name)) => {
            services.state.set_location_name(name.clone());
            services.view.location_resolved(&name);
        }
        Ok(None) => tracing::debug!(%coordinate, "server has no name for this location"),
        Err(e) => tracing::warn!(%coordinate, "location lookup failed: {}", e),
    }
}
