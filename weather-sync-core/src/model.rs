use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use crate::error::ValidationError;

/// Geographic coordinate the coordinator is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, ValidationError> {
        if !latitude.is_finite()
            || !longitude.is_finite()
            || !(-90.0..=90.0).contains(&latitude)
            || !(-180.0..=180.0).contains(&longitude)
        {
            return Err(ValidationError::CoordinateOutOfRange { latitude, longitude });
        }

        Ok(Self { latitude, longitude })
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "lat {:.4}, lon {:.4}", self.latitude, self.longitude)
    }
}

/// Server-assigned identifier of a stored weather record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub i64);

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Which cadence triggered an update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpdateSource {
    Manual,
    Automatic,
}

impl UpdateSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            UpdateSource::Manual => "manual",
            UpdateSource::Automatic => "automatic",
        }
    }

    pub fn is_forced(&self) -> bool {
        matches!(self, UpdateSource::Manual)
    }
}

impl fmt::Display for UpdateSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub description: String,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentConditions {
    pub temp: f64,
    pub feels_like: f64,
    pub humidity: u8,
    #[serde(default)]
    pub weather: Vec<Condition>,
    pub wind_speed: f64,
    pub pressure: f64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Weather payload as returned by the server.
///
/// Fields the coordinator does not read are kept in `extra` so the snapshot
/// can be sent back to the advice endpoint unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub current: CurrentConditions,
    #[serde(default)]
    pub timezone: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl WeatherSnapshot {
    pub fn description(&self) -> &str {
        self.current
            .weather
            .first()
            .map(|c| c.description.as_str())
            .unwrap_or("unknown")
    }

    pub fn icon(&self) -> Option<&str> {
        self.current.weather.first().and_then(|c| c.icon.as_deref())
    }

    /// Multi-line human readable summary of the current conditions.
    pub fn summary(&self) -> String {
        let c = &self.current;
        format!(
            "Temperature: {:.1}°C (feels like {:.1}°C)\n\
             Humidity: {}%\n\
             Conditions: {}\n\
             Wind: {} m/s\n\
             Pressure: {} hPa\n\
             Timezone: {}",
            c.temp,
            c.feels_like,
            c.humidity,
            self.description(),
            c.wind_speed,
            c.pressure,
            self.timezone,
        )
    }
}

/// One successful weather round-trip.
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherReport {
    pub weather: WeatherSnapshot,
    pub alerts: Vec<String>,
    pub record_id: Option<RecordId>,
}

/// Body of an advice request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdviceRequest {
    pub weather_data: WeatherSnapshot,
    pub last_update_weather_data: Option<WeatherSnapshot>,
    pub previous_weather_data: Option<WeatherSnapshot>,
    pub record_id: Option<RecordId>,
    pub force_update: bool,
}

/// Successful advice judgment. Failures travel as `SyncError`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdviceResult {
    pub needs_update: bool,
    pub text: String,
}

/// Advice currently shown to the user.
#[derive(Debug, Clone, PartialEq)]
pub struct AppliedAdvice {
    /// Markdown source as returned by the server.
    pub text: String,
    pub source: UpdateSource,
    pub applied_at: DateTime<Local>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    #[serde(default)]
    pub id: Option<RecordId>,
    pub timestamp: String,
    #[serde(default)]
    pub timezone: Option<String>,
    pub formatted: String,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub alerts: Vec<String>,
}

/// Timestamp format used for everything shown to the user.
pub const DISPLAY_TIME_FORMAT: &str = "%Y/%m/%d %H:%M:%S";

pub fn format_display_time(at: &DateTime<Local>) -> String {
    at.format(DISPLAY_TIME_FORMAT).to_string()
}
