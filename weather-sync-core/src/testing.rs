//! Scripted backend and recording view for unit tests.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Local};
use parking_lot::Mutex;
use serde_json::Map;

use crate::backend::WeatherBackend;
use crate::coordinator::Services;
use crate::error::SyncError;
use crate::model::{
    AdviceRequest, AdviceResult, AppliedAdvice, Condition, Coordinate, CurrentConditions,
    HistoryEntry, RecordId, UpdateSource, WeatherReport, WeatherSnapshot,
};
use crate::retry::{RetryPolicy, RetryStatus};
use crate::scheduler::SchedulerStatus;
use crate::state::SharedState;
use crate::view::View;

pub fn snapshot(temp: f64) -> WeatherSnapshot {
    WeatherSnapshot {
        current: CurrentConditions {
            temp,
            feels_like: temp,
            humidity: 60,
            weather: vec![Condition {
                description: "clear sky".into(),
                icon: Some("01d".into()),
                extra: Map::new(),
            }],
            wind_speed: 2.5,
            pressure: 1012.0,
            extra: Map::new(),
        },
        timezone: "Asia/Shanghai".into(),
        extra: Map::new(),
    }
}

pub fn report(temp: f64, record_id: i64) -> WeatherReport {
    WeatherReport { weather: snapshot(temp), alerts: Vec::new(), record_id: Some(RecordId(record_id)) }
}

pub fn xiamen() -> Coordinate {
    Coordinate { latitude: 24.4798, longitude: 118.0894 }
}

/// Reply to one scripted call. `Fail` becomes `SyncError::Api`.
#[derive(Debug, Clone)]
pub enum Reply<T> {
    Ok(T),
    Fail(String),
}

impl<T> Reply<T> {
    fn into_result(self) -> Result<T, SyncError> {
        match self {
            Reply::Ok(v) => Ok(v),
            Reply::Fail(msg) => Err(SyncError::Api(msg)),
        }
    }
}

/// Answers from per-endpoint queues; once a queue is empty the fallback
/// reply is used for every further call.
#[derive(Debug)]
pub struct ScriptedBackend {
    weather: Mutex<(VecDeque<Reply<WeatherReport>>, Reply<WeatherReport>)>,
    advice: Mutex<(VecDeque<Reply<AdviceResult>>, Reply<AdviceResult>)>,
    location: Mutex<Reply<Option<String>>>,
    history: Mutex<Reply<Vec<HistoryEntry>>>,
    pub weather_calls: Mutex<Vec<Coordinate>>,
    pub advice_calls: Mutex<Vec<AdviceRequest>>,
    pub history_calls: Mutex<Vec<(Coordinate, u32)>>,
}

impl Default for ScriptedBackend {
    fn default() -> Self {
        Self {
            weather: Mutex::new((VecDeque::new(), Reply::Ok(report(20.0, 1)))),
            advice: Mutex::new((
                VecDeque::new(),
                Reply::Ok(AdviceResult { needs_update: true, text: "Enjoy the sun".into() }),
            )),
            location: Mutex::new(Reply::Ok(Some("Xiamen, Fujian, CN".into()))),
            history: Mutex::new(Reply::Ok(Vec::new())),
            weather_calls: Mutex::new(Vec::new()),
            advice_calls: Mutex::new(Vec::new()),
            history_calls: Mutex::new(Vec::new()),
        }
    }
}

impl ScriptedBackend {
    pub fn push_weather(&self, reply: Reply<WeatherReport>) -> &Self {
        self.weather.lock().0.push_back(reply);
        self
    }

    pub fn weather_fallback(&self, reply: Reply<WeatherReport>) -> &Self {
        self.weather.lock().1 = reply;
        self
    }

    pub fn push_advice(&self, reply: Reply<AdviceResult>) -> &Self {
        self.advice.lock().0.push_back(reply);
        self
    }

    pub fn advice_fallback(&self, reply: Reply<AdviceResult>) -> &Self {
        self.advice.lock().1 = reply;
        self
    }

    pub fn set_location(&self, reply: Reply<Option<String>>) -> &Self {
        *self.location.lock() = reply;
        self
    }

    pub fn set_history(&self, reply: Reply<Vec<HistoryEntry>>) -> &Self {
        *self.history.lock() = reply;
        self
    }

    pub fn weather_call_count(&self) -> usize {
        self.weather_calls.lock().len()
    }

    pub fn advice_requests(&self) -> Vec<AdviceRequest> {
        self.advice_calls.lock().clone()
    }
}

#[async_trait]
impl WeatherBackend for ScriptedBackend {
    async fn location_name(&self, _coordinate: Coordinate) -> Result<Option<String>, SyncError> {
        self.location.lock().clone().into_result()
    }

    async fn weather(&self, coordinate: Coordinate) -> Result<WeatherReport, SyncError> {
        self.weather_calls.lock().push(coordinate);
        let mut script = self.weather.lock();
        let reply = match script.0.pop_front() {
            Some(reply) => reply,
            None => script.1.clone(),
        };
        reply.into_result()
    }

    async fn advice(&self, request: &AdviceRequest) -> Result<AdviceResult, SyncError> {
        self.advice_calls.lock().push(request.clone());
        let mut script = self.advice.lock();
        let reply = match script.0.pop_front() {
            Some(reply) => reply,
            None => script.1.clone(),
        };
        reply.into_result()
    }

    async fn history(
        &self,
        coordinate: Coordinate,
        limit: u32,
    ) -> Result<Vec<HistoryEntry>, SyncError> {
        self.history_calls.lock().push((coordinate, limit));
        self.history.lock().clone().into_result()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ViewEvent {
    Status(RetryStatus),
    Location(String),
    Weather { record_id: Option<RecordId>, source: UpdateSource },
    WeatherFailed { message: String, source: UpdateSource },
    AdvicePending,
    AdviceApplied { text: String, source: UpdateSource },
    AdviceFailed { message: String, source: UpdateSource },
    AutoAttempt(DateTime<Local>),
    AdviceControl(bool),
    Scheduler(SchedulerStatus),
    History(usize),
    HistoryFailed(String),
}

#[derive(Debug, Default)]
pub struct RecordingView {
    events: Mutex<Vec<ViewEvent>>,
}

impl RecordingView {
    pub fn events(&self) -> Vec<ViewEvent> {
        self.events.lock().clone()
    }

    pub fn count(&self, pred: impl Fn(&ViewEvent) -> bool) -> usize {
        self.events.lock().iter().filter(|e| pred(e)).count()
    }

    fn push(&self, event: ViewEvent) {
        self.events.lock().push(event);
    }
}

impl View for RecordingView {
    fn request_status(&self, status: &RetryStatus) {
        self.push(ViewEvent::Status(status.clone()));
    }

    fn location_resolved(&self, name: &str) {
        self.push(ViewEvent::Location(name.to_string()));
    }

    fn weather_updated(&self, report: &WeatherReport, source: UpdateSource, _at: DateTime<Local>) {
        self.push(ViewEvent::Weather { record_id: report.record_id, source });
    }

    fn weather_failed(&self, message: &str, source: UpdateSource) {
        self.push(ViewEvent::WeatherFailed { message: message.to_string(), source });
    }

    fn advice_pending(&self) {
        self.push(ViewEvent::AdvicePending);
    }

    fn advice_applied(&self, advice: &AppliedAdvice) {
        self.push(ViewEvent::AdviceApplied { text: advice.text.clone(), source: advice.source });
    }

    fn advice_failed(&self, message: &str, source: UpdateSource) {
        self.push(ViewEvent::AdviceFailed { message: message.to_string(), source });
    }

    fn auto_attempt_recorded(&self, at: DateTime<Local>) {
        self.push(ViewEvent::AutoAttempt(at));
    }

    fn advice_control_enabled(&self, enabled: bool) {
        self.push(ViewEvent::AdviceControl(enabled));
    }

    fn scheduler_changed(&self, status: SchedulerStatus) {
        self.push(ViewEvent::Scheduler(status));
    }

    fn history_loaded(&self, entries: &[HistoryEntry]) {
        self.push(ViewEvent::History(entries.len()));
    }

    fn history_failed(&self, message: &str) {
        self.push(ViewEvent::HistoryFailed(message.to_string()));
    }
}

/// Services wired to a scripted backend and a recording view.
pub struct Harness {
    pub backend: Arc<ScriptedBackend>,
    pub view: Arc<RecordingView>,
    pub services: Services,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_policy(RetryPolicy::default())
    }

    pub fn with_policy(retry: RetryPolicy) -> Self {
        let backend = Arc::new(ScriptedBackend::default());
        let view = Arc::new(RecordingView::default());
        let services = Services {
            backend: backend.clone(),
            view: view.clone(),
            state: SharedState::new(),
            retry,
        };
        Self { backend, view, services }
    }

    pub fn state(&self) -> &SharedState {
        &self.services.state
    }
}

pub fn is_retrying(event: &ViewEvent) -> bool {
    matches!(event, ViewEvent::Status(s) if s.is_retrying())
}
