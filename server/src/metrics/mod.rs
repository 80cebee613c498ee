//! Prometheus metrics export
//!
//! Provides metrics endpoint for monitoring and alerting

use std::sync::Arc;

use anyhow::Result;
use axum::{extract::State, http::StatusCode, response::IntoResponse};
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

use crate::coordinator::RunRejected;
use crate::session::SessionState;
use crate::AppState;

/// Prometheus metrics recorder
static METRICS_HANDLE: OnceCell<PrometheusHandle> = OnceCell::new();

/// Install the Prometheus recorder. Later calls are no-ops.
pub fn init_metrics() -> Result<()> {
    METRICS_HANDLE.get_or_try_init(|| -> Result<PrometheusHandle> {
        let handle = PrometheusBuilder::new()
            .set_buckets_for_metric(
                Matcher::Full("scratchpad_run_duration_seconds".to_string()),
                &[0.01, 0.05, 0.1, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0],
            )?
            .install_recorder()?;
        Ok(handle)
    })?;
    Ok(())
}

/// Record a completed run
pub fn record_run(success: bool, duration_secs: f64) {
    let outcome = if success { "success" } else { "error" };
    counter!("scratchpad_runs_total", "outcome" => outcome).increment(1);
    histogram!("scratchpad_run_duration_seconds").record(duration_secs);
}

/// Record a run that was not admitted
pub fn record_rejection(rejection: &RunRejected) {
    let reason = match rejection {
        RunRejected::NotReady => "not_ready",
        RunRejected::Unavailable(_) => "unavailable",
        RunRejected::Busy => "busy",
    };
    counter!("scratchpad_runs_rejected_total", "reason" => reason).increment(1);
}

/// Record the session state (0 unready, 1 ready, -1 failed)
pub fn record_session_state(state: &SessionState) {
    let value = match state {
        SessionState::Unready => 0.0,
        SessionState::Ready => 1.0,
        SessionState::Failed(_) => -1.0,
    };
    gauge!("scratchpad_session_state").set(value);
}

/// Prometheus metrics endpoint handler
pub async fn metrics_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    record_session_state(&state.session.state());

    let metrics = METRICS_HANDLE
        .get()
        .map(|handle| handle.render())
        .unwrap_or_default();

    (
        StatusCode::OK,
        [("Content-Type", "text/plain; version=0.0.4")],
        metrics,
    )
}
