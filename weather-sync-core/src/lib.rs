//! Core library for the `weather-sync` CLI.
//!
//! This crate keeps a "current weather + advice" view in sync with a remote
//! server over an unreliable network:
//! - Bounded retry with a fixed delay for every request
//! - Weather and advice refresh operations over one shared state
//! - A periodic scheduler that sequences weather before advice
//! - Configuration & the HTTP backend
//!
//! Output goes through the [`View`] trait so any front end can render it.

pub mod advice;
pub mod backend;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod model;
pub mod retry;
pub mod scheduler;
pub mod state;
pub mod view;
pub mod weather;

#[cfg(test)]
mod testing;

pub use backend::{WeatherBackend, backend_from_config, http::HttpBackend};
pub use config::Config;
pub use coordinator::{Coordinator, Services};
pub use error::{SyncError, ValidationError};
pub use model::{
    AdviceRequest, AdviceResult, AppliedAdvice, Coordinate, HistoryEntry, RecordId, UpdateSource,
    WeatherReport, WeatherSnapshot,
};
pub use retry::{RequestKind, RetryPolicy, RetryStatus};
pub use scheduler::{Scheduler, SchedulerStatus};
pub use state::{RefreshContext, SharedState, StateSnapshot};
pub use view::View;
pub use weather::RefreshOutcome;
