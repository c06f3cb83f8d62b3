use chrono::{DateTime, Local};
use weather_sync_core::{
    AppliedAdvice, HistoryEntry, RetryStatus, SchedulerStatus, UpdateSource, View, WeatherReport,
    model::format_display_time,
};

/// Prints every view notification to stdout.
#[derive(Debug, Default)]
pub struct TerminalView;

impl TerminalView {
    pub fn new() -> Self {
        Self
    }
}

fn source_label(source: UpdateSource) -> &'static str {
    match source {
        UpdateSource::Manual => "manual update",
        UpdateSource::Automatic => "automatic update",
    }
}

impl View for TerminalView {
    fn request_status(&self, status: &RetryStatus) {
        // Single-attempt successes are the common case; keep them quiet.
        if let RetryStatus::Succeeded { attempt: 1, .. } = status {
            return;
        }
        println!("· {status}");
    }

    fn location_resolved(&self, name: &str) {
        println!("Location: {name}");
    }

    fn weather_updated(&self, report: &WeatherReport, source: UpdateSource, at: DateTime<Local>) {
        println!();
        println!("── Weather ({}, {}) ──", source_label(source), format_display_time(&at));
        println!("{}", report.weather.summary());

        if report.alerts.is_empty() {
            println!("Alerts: none");
        } else {
            println!("Alerts ({}):", report.alerts.len());
            for alert in &report.alerts {
                println!("{alert}\n");
            }
        }
    }

    fn weather_failed(&self, message: &str, source: UpdateSource) {
        println!("Weather {} failed: {message}", source_label(source));
    }

    fn advice_pending(&self) {
        println!("Generating advice...");
    }

    fn advice_applied(&self, advice: &AppliedAdvice) {
        println!();
        println!(
            "── Advice ({}, {}) ──",
            source_label(advice.source),
            format_display_time(&advice.applied_at)
        );
        if advice.text.trim().is_empty() {
            println!("No advice yet");
        } else {
            println!("{}", advice.text.trim());
        }
    }

    fn advice_failed(&self, message: &str, source: UpdateSource) {
        println!("Advice {} failed: {message}", source_label(source));
    }

    fn auto_attempt_recorded(&self, at: DateTime<Local>) {
        println!("Last automatic update: {}", format_display_time(&at));
    }

    fn advice_control_enabled(&self, enabled: bool) {
        tracing::trace!(enabled, "advice control toggled");
    }

    fn scheduler_changed(&self, status: SchedulerStatus) {
        match status {
            SchedulerStatus::Running { interval_secs } => {
                println!("Scheduler running, every {interval_secs}s (Ctrl-C to stop)");
            }
            SchedulerStatus::Stopped => println!("Scheduler stopped"),
        }
    }

    fn history_loaded(&self, entries: &[HistoryEntry]) {
        println!();
        println!("── History ──");
        if entries.is_empty() {
            println!("No history records");
            return;
        }
        for entry in entries {
            let tz = entry.timezone.as_deref().unwrap_or("");
            println!("{} {tz}", entry.timestamp);
            println!("{}\n", entry.formatted);
        }
    }

    fn history_failed(&self, message: &str) {
        println!("Failed to load history: {message}");
    }
}
