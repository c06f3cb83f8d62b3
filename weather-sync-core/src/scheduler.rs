//! Periodic refresh.
//!
//! Each tick captures the current weather as "previous", fires a weather
//! refresh, waits a fixed gap, then asks for advice using whatever is in
//! shared state at that moment. The weather fetch is not awaited before the
//! advice step: if it is still retrying when the gap elapses, the advice
//! request sees the pre-tick weather and record id. Ticks are not serialized
//! either, so a slow tick can overlap the next one and the last response to
//! arrive wins.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

use crate::coordinator::Services;
use crate::error::ValidationError;
use crate::model::{Coordinate, UpdateSource};
use crate::{advice, weather};

pub const MIN_INTERVAL_SECS: u64 = 30;
pub const MAX_INTERVAL_SECS: u64 = 3600;
pub const DEFAULT_ADVICE_DELAY_MS: u64 = 1000;

pub fn validate_interval(interval_secs: u64) -> Result<Duration, ValidationError> {
    if (MIN_INTERVAL_SECS..=MAX_INTERVAL_SECS).contains(&interval_secs) {
        Ok(Duration::from_secs(interval_secs))
    } else {
        Err(ValidationError::IntervalOutOfRange(interval_secs))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerStatus {
    Stopped,
    Running { interval_secs: u64 },
}

impl SchedulerStatus {
    pub fn is_running(&self) -> bool {
        matches!(self, SchedulerStatus::Running { .. })
    }
}

pub struct Scheduler {
    services: Services,
    advice_delay: Duration,
    status: SchedulerStatus,
    timer: Option<JoinHandle<()>>,
}

impl Scheduler {
    pub fn new(services: Services, advice_delay: Duration) -> Self {
        Self { services, advice_delay, status: SchedulerStatus::Stopped, timer: None }
    }

    pub fn status(&self) -> SchedulerStatus {
        self.status
    }

    /// Arm the repeating timer, replacing any timer already running.
    ///
    /// Rejected without a coordinate or with an interval outside
    /// [`MIN_INTERVAL_SECS`, `MAX_INTERVAL_SECS`]; a rejection changes nothing.
    /// Must be called from within a tokio runtime.
    pub fn start(
        &mut self,
        coordinate: Option<Coordinate>,
        interval_secs: u64,
    ) -> Result<(), ValidationError> {
        let coordinate = coordinate.ok_or(ValidationError::MissingCoordinate)?;
        let period = validate_interval(interval_secs)?;

        self.cancel_timer();

        let services = self.services.clone();
        let advice_delay = self.advice_delay;
        self.timer = Some(tokio::spawn(async move {
            let mut ticker = time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                tokio::spawn(tick(services.clone(), coordinate, advice_delay));
            }
        }));

        self.status = SchedulerStatus::Running { interval_secs };
        tracing::info!(%coordinate, interval_secs, "scheduler started");
        self.services.view.scheduler_changed(self.status);
        Ok(())
    }

    /// Prevent future ticks. Requests already in flight run to completion.
    pub fn stop(&mut self) {
        let was_running = self.cancel_timer();
        if self.status.is_running() || was_running {
            self.status = SchedulerStatus::Stopped;
            tracing::info!("scheduler stopped");
            self.services.view.scheduler_changed(self.status);
        }
    }

    fn cancel_timer(&mut self) -> bool {
        match self.timer.take() {
            Some(handle) => {
                handle.abort();
                true
            }
            None => false,
        }
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.cancel_timer();
    }
}

async fn tick(services: Services, coordinate: Coordinate, advice_delay: Duration) {
    let previous = services.state.capture_previous();
    tracing::debug!(%coordinate, "scheduler tick");

    let weather_services = services.clone();
    tokio::spawn(async move {
        weather::refresh(&weather_services, coordinate, UpdateSource::Automatic).await;
    });

    time::sleep(advice_delay).await;

    // The weather fetch above may not have landed yet; read whatever is current.
    let Some((mut ctx, record_id)) = services.state.refresh_context() else {
        tracing::debug!("no weather loaded yet, skipping scheduled advice");
        return;
    };
    ctx.previous_weather = previous;

    advice::refresh_advice(&services, ctx, record_id, UpdateSource::Automatic).await;
}
