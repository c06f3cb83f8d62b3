use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::{
    error::SyncError,
    model::{AdviceRequest, AdviceResult, Coordinate, HistoryEntry, RecordId, WeatherReport, WeatherSnapshot},
};

use super::WeatherBackend;

/// JSON-over-POST client for the weather/advice server.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    base_url: Url,
    http: Client,
}

impl HttpBackend {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let base_url = Url::parse(base_url.trim_end_matches('/'))
            .with_context(|| format!("Invalid server URL: {base_url}"))?;

        let http = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self { base_url, http })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.as_str().trim_end_matches('/'), path)
    }

    async fn post<B, R>(&self, path: &str, body: &B) -> Result<R, SyncError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let res = self.http.post(self.endpoint(path)).json(body).send().await?;

        let status = res.status();
        let text = res.text().await?;

        if !status.is_success() {
            return Err(SyncError::Status { status, message: error_message(&text) });
        }

        Ok(serde_json::from_str(&text)?)
    }
}

#[derive(Debug, Serialize)]
struct CoordinateBody {
    lat: f64,
    lon: f64,
}

impl From<Coordinate> for CoordinateBody {
    fn from(c: Coordinate) -> Self {
        Self { lat: c.latitude, lon: c.longitude }
    }
}

#[derive(Debug, Serialize)]
struct HistoryBody {
    lat: f64,
    lon: f64,
    limit: u32,
}

#[derive(Debug, Deserialize)]
struct LocationResponse {
    location_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WeatherEnvelope {
    #[serde(default)]
    success: bool,
    weather: Option<WeatherSnapshot>,
    #[serde(default)]
    alerts: Vec<String>,
    record_id: Option<RecordId>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AdviceEnvelope {
    #[serde(default)]
    success: bool,
    #[serde(default = "need_update_default")]
    need_update: bool,
    advice: Option<String>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct HistoryEnvelope {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    history: Vec<HistoryEntry>,
    error: Option<String>,
}

// The server treats a missing flag as "update".
fn need_update_default() -> bool {
    true
}

fn rejected(error: Option<String>, fallback: &str) -> SyncError {
    SyncError::Api(error.filter(|e| !e.is_empty()).unwrap_or_else(|| fallback.to_string()))
}

#[async_trait]
impl WeatherBackend for HttpBackend {
    async fn location_name(&self, coordinate: Coordinate) -> Result<Option<String>, SyncError> {
        let res: LocationResponse =
            self.post("get_location_name", &CoordinateBody::from(coordinate)).await?;

        Ok(res.location_name.filter(|n| !n.trim().is_empty()))
    }

    async fn weather(&self, coordinate: Coordinate) -> Result<WeatherReport, SyncError> {
        let res: WeatherEnvelope = self.post("get_weather", &CoordinateBody::from(coordinate)).await?;

        if !res.success {
            return Err(rejected(res.error, "Failed to fetch weather data"));
        }

        let weather = res
            .weather
            .ok_or_else(|| SyncError::Api("Weather response contained no weather data".into()))?;

        Ok(WeatherReport { weather, alerts: res.alerts, record_id: res.record_id })
    }

    async fn advice(&self, request: &AdviceRequest) -> Result<AdviceResult, SyncError> {
        let res: AdviceEnvelope = self.post("get_advice", request).await?;

        if !res.success {
            return Err(rejected(res.error, "Failed to generate advice"));
        }

        Ok(AdviceResult { needs_update: res.need_update, text: res.advice.unwrap_or_default() })
    }

    async fn history(
        &self,
        coordinate: Coordinate,
        limit: u32,
    ) -> Result<Vec<HistoryEntry>, SyncError> {
        let body = HistoryBody { lat: coordinate.latitude, lon: coordinate.longitude, limit };
        let res: HistoryEnvelope = self.post("get_history", &body).await?;

        if !res.success {
            return Err(rejected(res.error, "Failed to load history"));
        }

        Ok(res.history)
    }
}

/// Prefer the server's `error` field; fall back to a truncated raw body.
fn error_message(body: &str) -> String {
    #[derive(Deserialize)]
    struct ErrorBody {
        error: Option<String>,
    }

    match serde_json::from_str::<ErrorBody>(body) {
        Ok(ErrorBody { error: Some(e) }) if !e.is_empty() => e,
        _ => truncate_body(body),
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() > MAX {
        let cut = (0..=MAX).rev().find(|&i| body.is_char_boundary(i)).unwrap_or(0);
        format!("{}...", &body[..cut])
    } else {
        body.to_string()
    }
}
