//! Error types for the synchronization core.

use reqwest::StatusCode;
use thiserror::Error;

use crate::scheduler::{MAX_INTERVAL_SECS, MIN_INTERVAL_SECS};

/// Input rejected before any network call is made. Never retried.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("No location available yet; bind a coordinate first")]
    MissingCoordinate,

    #[error("Coordinate out of range: lat {latitude}, lon {longitude}")]
    CoordinateOutOfRange { latitude: f64, longitude: f64 },

    #[error(
        "Update interval must be between {min} and {max} seconds, got {0}",
        min = MIN_INTERVAL_SECS,
        max = MAX_INTERVAL_SECS
    )]
    IntervalOutOfRange(u64),

    #[error("Weather data has not loaded yet")]
    WeatherNotLoaded,

    #[error("History limit must be at least 1")]
    HistoryLimit,
}

/// Failure of a single request attempt.
///
/// Every variant except `Validation` is treated as transient by the retry
/// policy; whether it ends up terminal depends only on the attempt count.
#[derive(Error, Debug)]
pub enum SyncError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("HTTP {status}: {message}")]
    Status { status: StatusCode, message: String },

    #[error("{0}")]
    Api(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Malformed response: {0}")]
    Decode(#[from] serde_json::Error),
}
