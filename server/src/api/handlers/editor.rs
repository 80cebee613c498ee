//! Editor panel handlers

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};

use crate::api::ApiError;
use crate::coordinator::RunRejected;
use crate::editor::EXAMPLES;
use crate::models::{EditorSnapshot, ExampleInfo, RunResponse, UpdateSourceRequest};
use crate::AppState;

use super::run::{check_source_size, rejection_response};

/// Edits while the session is loading are a conflict
fn edit_rejected(rejection: RunRejected) -> ApiError {
    ApiError::Conflict(rejection.to_string())
}

/// Current panel state
pub async fn get_editor(State(state): State<Arc<AppState>>) -> Json<EditorSnapshot> {
    Json(state.editor.snapshot().await)
}

/// Replace the panel's source text
pub async fn update_source(
    State(state): State<Arc<AppState>>,
    Json(request): Json<UpdateSourceRequest>,
) -> Result<Json<EditorSnapshot>, ApiError> {
    check_source_size(&state, &request.source)?;
    state
        .editor
        .set_source(request.source)
        .await
        .map_err(edit_rejected)?;
    Ok(Json(state.editor.snapshot().await))
}

/// Run the panel's source text
pub async fn run_editor(State(state): State<Arc<AppState>>) -> Result<Json<RunResponse>, ApiError> {
    match state.editor.run().await {
        Ok(response) => Ok(Json(response)),
        Err(rejection) => rejection_response(rejection).map(Json),
    }
}

/// Restore the default source and clear the output
pub async fn reset_editor(
    State(state): State<Arc<AppState>>,
) -> Result<Json<EditorSnapshot>, ApiError> {
    state.editor.reset().await.map_err(edit_rejected)?;
    Ok(Json(state.editor.snapshot().await))
}

/// Built-in examples
pub async fn list_examples() -> Json<Vec<ExampleInfo>> {
    Json(
        EXAMPLES
            .iter()
            .enumerate()
            .map(|(index, example)| ExampleInfo {
                index,
                title: example.title.to_string(),
                description: example.description.to_string(),
                code: example.code.to_string(),
            })
            .collect(),
    )
}

/// Load an example into the panel
pub async fn load_example(
    State(state): State<Arc<AppState>>,
    Path(index): Path<usize>,
) -> Result<Json<EditorSnapshot>, ApiError> {
    state
        .editor
        .load_example(index)
        .await
        .map_err(edit_rejected)?
        .ok_or_else(|| ApiError::NotFound(format!("Example {} not found", index)))?;

    Ok(Json(state.editor.snapshot().await))
}
