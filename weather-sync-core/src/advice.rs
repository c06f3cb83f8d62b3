//! Advice refresh.
//!
//! Manual requests always replace the displayed advice on success. Scheduled
//! requests only do so when the server says the advice changed; otherwise
//! they just stamp the "last automatic attempt" time.

use chrono::Local;

use crate::coordinator::Services;
use crate::model::{AdviceRequest, AppliedAdvice, RecordId, UpdateSource};
use crate::retry::RequestKind;
use crate::state::RefreshContext;
use crate::weather::RefreshOutcome;

pub async fn refresh_advice(
    services: &Services,
    ctx: RefreshContext,
    record_id: Option<RecordId>,
    source: UpdateSource,
) -> RefreshOutcome {
    let force = source.is_forced();
    if force {
        services.view.advice_control_enabled(false);
        services.view.advice_pending();
    }

    let request = AdviceRequest {
        weather_data: ctx.current_weather,
        last_update_weather_data: ctx.last_applied_advice_weather,
        previous_weather_data: ctx.previous_weather,
        record_id,
        force_update: force,
    };

    let result = services
        .retry
        .execute(
            RequestKind::Advice,
            |status| services.view.request_status(&status),
            || services.backend.advice(&request),
        )
        .await;

    let outcome = match result {
        Ok(advice) => {
            let now = Local::now();
            if !force {
                services.state.record_auto_attempt(now);
                services.view.auto_attempt_recorded(now);
            }

            if force || advice.needs_update {
                let applied = AppliedAdvice { text: advice.text, source, applied_at: now };
                services.state.apply_advice(applied.clone(), request.weather_data);
                tracing::info!(?record_id, "advice applied ({source})");
                services.view.advice_applied(&applied);
                RefreshOutcome::Applied
            } else {
                tracing::debug!(?record_id, "advice unchanged, keeping displayed text");
                RefreshOutcome::Unchanged
            }
        }
        Err(e) => {
            services.view.advice_failed(&e.to_string(), source);
            RefreshOutcome::Failed
        }
    };

    if force {
        services.view.advice_control_enabled(true);
    }

    outcome
}
