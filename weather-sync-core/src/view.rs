//! Notification seam between the core and whatever displays its output.

use chrono::{DateTime, Local};

use crate::model::{AppliedAdvice, HistoryEntry, UpdateSource, WeatherReport};
use crate::retry::RetryStatus;
use crate::scheduler::SchedulerStatus;

/// Receives every user-visible change the core produces.
///
/// Calls are made from inside refresh tasks and must not block.
pub trait View: Send + Sync {
    /// Progress of a single request: success, retry, or terminal failure.
    fn request_status(&self, status: &RetryStatus);

    fn location_resolved(&self, name: &str);

    fn weather_updated(&self, report: &WeatherReport, source: UpdateSource, at: DateTime<Local>);

    fn weather_failed(&self, message: &str, source: UpdateSource);

    /// A manual advice request is in flight.
    fn advice_pending(&self);

    fn advice_applied(&self, advice: &AppliedAdvice);

    fn advice_failed(&self, message: &str, source: UpdateSource);

    /// A scheduled advice request completed, whether or not it changed anything.
    fn auto_attempt_recorded(&self, at: DateTime<Local>);

    /// Enable or disable the control that triggers manual advice.
    fn advice_control_enabled(&self, enabled: bool);

    fn scheduler_changed(&self, status: SchedulerStatus);

    fn history_loaded(&self, entries: &[HistoryEntry]);

    fn history_failed(&self, message: &str);
}
