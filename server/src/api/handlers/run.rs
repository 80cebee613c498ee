//! Code run handlers

use std::sync::Arc;

use axum::{extract::State, Json};

use crate::api::ApiError;
use crate::coordinator::RunRejected;
use crate::models::{HistoryResponse, RunRequest, RunResponse};
use crate::AppState;

/// Reject source text over the configured size limit
pub(crate) fn check_source_size(state: &AppState, source: &str) -> Result<(), ApiError> {
    if source.len() > state.config.max_source_bytes {
        return Err(ApiError::PayloadTooLarge);
    }
    Ok(())
}

/// Advisory rejections become responses; a busy coordinator is a conflict
pub(crate) fn rejection_response(rejection: RunRejected) -> Result<RunResponse, ApiError> {
    rejection
        .advisory()
        .ok_or_else(|| ApiError::Conflict(rejection.to_string()))
}

/// Run source text directly
pub async fn run_source(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RunRequest>,
) -> Result<Json<RunResponse>, ApiError> {
    check_source_size(&state, &request.source)?;

    let response = match state.coordinator.execute(&request.source).await {
        Ok(report) => RunResponse::from(report),
        Err(rejection) => rejection_response(rejection)?,
    };

    Ok(Json(response))
}

/// Recent run history
pub async fn get_history(State(state): State<Arc<AppState>>) -> Json<HistoryResponse> {
    Json(HistoryResponse {
        runs: state.coordinator.history().await,
    })
}
