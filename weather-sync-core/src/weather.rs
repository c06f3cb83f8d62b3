//! Weather refresh: one retried fetch, then a whole-value replace of the
//! current weather. A terminal failure leaves shared state untouched.

use chrono::Local;

use crate::coordinator::Services;
use crate::model::{Coordinate, UpdateSource};
use crate::retry::RequestKind;

/// Result of a refresh as seen by the caller. Errors have already been
/// reported to the view by the time this is returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// New data replaced what was displayed.
    Applied,
    /// The request succeeded but nothing visible changed.
    Unchanged,
    /// The retry budget ran out; the error was reported to the view.
    Failed,
}

pub async fn refresh(services: &Services, coordinate: Coordinate, source: UpdateSource) -> RefreshOutcome {
    tracing::debug!(%coordinate, %source, "refreshing weather");

    let result = services
        .retry
        .execute(
            RequestKind::Weather,
            |status| services.view.request_status(&status),
            || services.backend.weather(coordinate),
        )
        .await;

    match result {
        Ok(report) => {
            services.state.apply_weather(&report);
            tracing::info!(
                record_id = ?report.record_id,
                alerts = report.alerts.len(),
                "weather updated ({source})"
            );
            services.view.weather_updated(&report, source, Local::now());
            RefreshOutcome::Applied
        }
        Err(e) => {
            services.view.weather_failed(&e.to_string(), source);
            RefreshOutcome::Failed
        }
    }
}
