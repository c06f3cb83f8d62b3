//! Bounded retry with a fixed delay between attempts.
//!
//! Every failure kind (transport error, non-2xx status, `success: false`,
//! malformed payload) is retried the same way; a failure only becomes
//! terminal once the attempt budget is spent. A status is emitted after
//! every attempt so the view can show progress.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use crate::error::SyncError;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;
pub const DEFAULT_DELAY_MS: u64 = 2000;

/// Which endpoint a request targets. Used for status text and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestKind {
    Location,
    Weather,
    Advice,
    History,
}

impl RequestKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestKind::Location => "location lookup",
            RequestKind::Weather => "weather fetch",
            RequestKind::Advice => "advice request",
            RequestKind::History => "history lookup",
        }
    }
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one attempt, reported to the view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryStatus {
    Succeeded {
        request: RequestKind,
        attempt: u32,
    },
    Retrying {
        request: RequestKind,
        attempt: u32,
        max_attempts: u32,
        delay: Duration,
        error: String,
    },
    Failed {
        request: RequestKind,
        attempts: u32,
        error: String,
    },
}

impl RetryStatus {
    pub fn request(&self) -> RequestKind {
        match self {
            RetryStatus::Succeeded { request, .. }
            | RetryStatus::Retrying { request, .. }
            | RetryStatus::Failed { request, .. } => *request,
        }
    }

    pub fn is_retrying(&self) -> bool {
        matches!(self, RetryStatus::Retrying { .. })
    }

    pub fn is_terminal_failure(&self) -> bool {
        matches!(self, RetryStatus::Failed { .. })
    }
}

impl fmt::Display for RetryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RetryStatus::Succeeded { request, attempt: 1 } => write!(f, "{request} succeeded"),
            RetryStatus::Succeeded { request, attempt } => {
                write!(f, "{request} succeeded on attempt {attempt}")
            }
            RetryStatus::Retrying { request, attempt, max_attempts, delay, error } => write!(
                f,
                "{request} failed ({error}); retrying in {:.1}s, attempt {}/{max_attempts}",
                delay.as_secs_f64(),
                attempt + 1,
            ),
            RetryStatus::Failed { request, attempts, error } => {
                write!(f, "{request} failed after {attempts} attempt(s): {error}")
            }
        }
    }
}

/// Attempt budget and fixed back-off.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first one. Never below 1.
    max_attempts: u32,
    delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS, Duration::from_millis(DEFAULT_DELAY_MS))
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self { max_attempts: max_attempts.max(1), delay }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Run `operation` until it succeeds or the attempt budget is exhausted.
    ///
    /// `on_status` is called once per attempt. The error returned on terminal
    /// failure is the one produced by the last attempt. A
    /// [`SyncError::Validation`] is terminal on the attempt that produced it.
    pub async fn execute<T, F, Fut, S>(
        &self,
        request: RequestKind,
        mut on_status: S,
        mut operation: F,
    ) -> Result<T, SyncError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, SyncError>>,
        S: FnMut(RetryStatus),
    {
        let mut attempt = 1;

        loop {
            match operation().await {
                Ok(value) => {
                    if attempt > 1 {
                        tracing::info!("{} succeeded after {} attempts", request, attempt);
                    } else {
                        tracing::debug!("{} succeeded", request);
                    }
                    on_status(RetryStatus::Succeeded { request, attempt });
                    return Ok(value);
                }
                Err(e @ SyncError::Validation(_)) => {
                    tracing::error!("{} rejected: {}", request, e);
                    on_status(RetryStatus::Failed { request, attempts: attempt, error: e.to_string() });
                    return Err(e);
                }
                Err(e) if attempt < self.max_attempts => {
                    tracing::warn!(
                        "{} failed on attempt {} of {}: {}",
                        request,
                        attempt,
                        self.max_attempts,
                        e
                    );
                    on_status(RetryStatus::Retrying {
                        request,
                        attempt,
                        max_attempts: self.max_attempts,
                        delay: self.delay,
                        error: e.to_string(),
                    });
                    tokio::time::sleep(self.delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    tracing::error!("{} failed, all {} attempts exhausted: {}", request, attempt, e);
                    on_status(RetryStatus::Failed { request, attempts: attempt, error: e.to_string() });
                    return Err(e);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationError;
    use std::cell::Cell;
    use tokio::time::Instant;

    fn flaky(failures: u32, calls: &Cell<u32>) -> impl Future<Output = Result<u32, SyncError>> {
        calls.set(calls.get() + 1);
        let n = calls.get();
        async move {
            if n <= failures {
                Err(SyncError::Api(format!("boom {n}")))
            } else {
                Ok(n)
            }
        }
    }

    #[test]
    fn default_policy_is_five_attempts_two_seconds() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts(), 5);
        assert_eq!(policy.delay(), Duration::from_millis(2000));
    }

    #[test]
    fn zero_attempts_is_clamped() {
        assert_eq!(RetryPolicy::new(0, Duration::ZERO).max_attempts(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn k_failures_then_success_reports_k_retries() {
        let policy = RetryPolicy::default();

        for k in 0..5 {
            let calls = Cell::new(0);
            let mut statuses = Vec::new();

            let value = policy
                .execute(RequestKind::Weather, |s| statuses.push(s), || flaky(k, &calls))
                .await
                .unwrap();

            assert_eq!(value, k + 1);
            assert_eq!(calls.get(), k + 1);
            assert_eq!(statuses.iter().filter(|s| s.is_retrying()).count(), k as usize);
            assert_eq!(
                statuses.last(),
                Some(&RetryStatus::Succeeded { request: RequestKind::Weather, attempt: k + 1 })
            );
            assert_eq!(statuses.len(), k as usize + 1);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn always_failing_stops_after_budget() {
        let policy = RetryPolicy::default();
        let calls = Cell::new(0);
        let mut statuses = Vec::new();
        let started = Instant::now();

        let err = policy
            .execute(RequestKind::Advice, |s| statuses.push(s), || flaky(u32::MAX, &calls))
            .await
            .unwrap_err();

        assert_eq!(calls.get(), 5);
        assert_eq!(err.to_string(), "boom 5");
        assert_eq!(statuses.iter().filter(|s| s.is_retrying()).count(), 4);
        assert_eq!(statuses.iter().filter(|s| s.is_terminal_failure()).count(), 1);
        assert!(matches!(
            statuses.last(),
            Some(RetryStatus::Failed { attempts: 5, error, .. }) if error == "boom 5"
        ));
        // Four fixed gaps, no back-off growth.
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_secs(8) && elapsed < Duration::from_secs(9));
    }

    #[tokio::test(start_paused = true)]
    async fn validation_error_is_not_retried() {
        let policy = RetryPolicy::default();
        let calls = Cell::new(0);
        let mut statuses = Vec::new();
        let started = Instant::now();

        let err = policy
            .execute(RequestKind::History, |s| statuses.push(s), || {
                calls.set(calls.get() + 1);
                async { Err::<(), _>(SyncError::from(ValidationError::HistoryLimit)) }
            })
            .await
            .unwrap_err();

        assert!(matches!(err, SyncError::Validation(ValidationError::HistoryLimit)));
        assert_eq!(calls.get(), 1);
        assert_eq!(started.elapsed(), Duration::ZERO);
        assert!(matches!(
            statuses.as_slice(),
            [RetryStatus::Failed { attempts: 1, .. }]
        ));
    }

    #[test]
    fn status_text_mentions_next_attempt() {
        let status = RetryStatus::Retrying {
            request: RequestKind::Weather,
            attempt: 2,
            max_attempts: 5,
            delay: Duration::from_secs(2),
            error: "HTTP 502".into(),
        };
        assert_eq!(
            status.to_string(),
            "weather fetch failed (HTTP 502); retrying in 2.0s, attempt 3/5"
        );
    }
}
