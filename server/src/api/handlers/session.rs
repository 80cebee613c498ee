//! Interpreter session handlers

use std::sync::Arc;

use axum::{extract::State, Json};

use crate::models::SessionInfo;
use crate::AppState;

/// Get the interpreter session state
pub async fn get_session(State(state): State<Arc<AppState>>) -> Json<SessionInfo> {
    Json(SessionInfo {
        session: state.session.state(),
        engine_version: state.session.engine().map(|engine| engine.version()),
        run_state: state.coordinator.run_state(),
        total_runs: state.coordinator.total_runs(),
    })
}
