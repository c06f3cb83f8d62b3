//! State shared by the refresh operations and the scheduler.
//!
//! Mutation happens in short critical sections that never span an `.await`,
//! so concurrent refreshes interleave at whole-update granularity and the
//! last response to land wins. There is no versioning of in-flight requests.

use std::sync::Arc;

use chrono::{DateTime, Local};
use parking_lot::Mutex;

use crate::model::{AppliedAdvice, RecordId, WeatherReport, WeatherSnapshot};

/// Point-in-time copy of everything the coordinator tracks.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StateSnapshot {
    pub current_weather: Option<WeatherSnapshot>,
    pub record_id: Option<RecordId>,
    pub alerts: Vec<String>,
    pub previous_weather: Option<WeatherSnapshot>,
    pub last_applied_advice_weather: Option<WeatherSnapshot>,
    pub advice: Option<AppliedAdvice>,
    pub last_auto_attempt: Option<DateTime<Local>>,
    pub location_name: Option<String>,
}

/// Weather triple handed to an advice refresh.
#[derive(Debug, Clone, PartialEq)]
pub struct RefreshContext {
    pub current_weather: WeatherSnapshot,
    pub previous_weather: Option<WeatherSnapshot>,
    pub last_applied_advice_weather: Option<WeatherSnapshot>,
}

#[derive(Debug, Clone, Default)]
pub struct SharedState {
    inner: Arc<Mutex<StateSnapshot>>,
}

impl SharedState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> StateSnapshot {
        self.inner.lock().clone()
    }

    pub fn current_weather(&self) -> Option<WeatherSnapshot> {
        self.inner.lock().current_weather.clone()
    }

    pub fn record_id(&self) -> Option<RecordId> {
        self.inner.lock().record_id
    }

    /// Replace the current weather with a fresh report.
    pub fn apply_weather(&self, report: &WeatherReport) {
        let mut state = self.inner.lock();
        state.current_weather = Some(report.weather.clone());
        state.record_id = report.record_id;
        state.alerts = report.alerts.clone();
    }

    /// Copy the current weather into `previous_weather` and return it.
    pub fn capture_previous(&self) -> Option<WeatherSnapshot> {
        let mut state = self.inner.lock();
        state.previous_weather = state.current_weather.clone();
        state.previous_weather.clone()
    }

    /// Build the advice context from whatever is current right now.
    /// Returns `None` while no weather has been loaded.
    pub fn refresh_context(&self) -> Option<(RefreshContext, Option<RecordId>)> {
        let state = self.inner.lock();
        let current_weather = state.current_weather.clone()?;
        let ctx = RefreshContext {
            current_weather,
            previous_weather: state.previous_weather.clone(),
            last_applied_advice_weather: state.last_applied_advice_weather.clone(),
        };
        Some((ctx, state.record_id))
    }

    pub fn apply_advice(&self, advice: AppliedAdvice, weather: WeatherSnapshot) {
        let mut state = self.inner.lock();
        state.advice = Some(advice);
        state.last_applied_advice_weather = Some(weather);
    }

    pub fn record_auto_attempt(&self, at: DateTime<Local>) {
        self.inner.lock().last_auto_attempt = Some(at);
    }

    pub fn set_location_name(&self, name: String) {
        self.inner.lock().location_name = Some(name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::UpdateSource;
    use crate::testing::{report, snapshot};

    #[test]
    fn capture_previous_copies_current() {
        let state = SharedState::new();
        assert_eq!(state.capture_previous(), None);

        state.apply_weather(&report(20.0, 1));
        let captured = state.capture_previous();

        assert_eq!(captured, Some(snapshot(20.0)));
        assert_eq!(state.snapshot().previous_weather, Some(snapshot(20.0)));
    }

    #[test]
    fn last_write_wins() {
        let state = SharedState::new();
        state.apply_weather(&report(20.0, 1));
        state.apply_weather(&report(18.0, 2));

        assert_eq!(state.current_weather(), Some(snapshot(18.0)));
        assert_eq!(state.record_id(), Some(RecordId(2)));
    }

    #[test]
    fn refresh_context_requires_weather() {
        let state = SharedState::new();
        assert!(state.refresh_context().is_none());

        state.apply_weather(&report(20.0, 7));
        state.capture_previous();
        state.apply_advice(
            AppliedAdvice { text: "umbrella".into(), source: UpdateSource::Manual, applied_at: Local::now() },
            snapshot(20.0),
        );
        state.apply_weather(&report(25.0, 8));

        let (ctx, record_id) = state.refresh_context().unwrap();
        assert_eq!(ctx.current_weather, snapshot(25.0));
        assert_eq!(ctx.previous_weather, Some(snapshot(20.0)));
        assert_eq!(ctx.last_applied_advice_weather, Some(snapshot(20.0)));
        assert_eq!(record_id, Some(RecordId(8)));
    }
}
