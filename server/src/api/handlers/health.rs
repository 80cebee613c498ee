//! Health check handler

use std::sync::Arc;

use axum::{extract::State, Json};

use crate::models::{HealthResponse, HealthStatus};
use crate::session::SessionState;
use crate::AppState;

/// Health check endpoint
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let uptime = state.started_at.elapsed().as_secs();
    let session = state.session.state();

    let status = match session {
        SessionState::Ready => HealthStatus::Healthy,
        SessionState::Unready => HealthStatus::Degraded,
        SessionState::Failed(_) => HealthStatus::Unhealthy,
    };

    Json(HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: uptime,
        session,
    })
}
