use crate::{
    Config,
    backend::http::HttpBackend,
    error::SyncError,
    model::{AdviceRequest, AdviceResult, Coordinate, HistoryEntry, WeatherReport},
};
use async_trait::async_trait;
use std::{fmt::Debug, sync::Arc};

pub mod http;

/// The remote side the coordinator talks to. One call is one attempt;
/// retrying is the caller's job.
#[async_trait]
pub trait WeatherBackend: Send + Sync + Debug {
    /// `Ok(None)` when the server has no name for the coordinate.
    async fn location_name(&self, coordinate: Coordinate) -> Result<Option<String>, SyncError>;

    async fn weather(&self, coordinate: Coordinate) -> Result<WeatherReport, SyncError>;

    async fn advice(&self, request: &AdviceRequest) -> Result<AdviceResult, SyncError>;

    async fn history(
        &self,
        coordinate: Coordinate,
        limit: u32,
    ) -> Result<Vec<HistoryEntry>, SyncError>;
}

/// Construct the HTTP backend described by `config`.
pub fn backend_from_config(config: &Config) -> anyhow::Result<Arc<dyn WeatherBackend>> {
    let backend = HttpBackend::new(&config.server.base_url, config.server.timeout())?;
    Ok(Arc::new(backend))
}
