//! API module for the Scratchpad service
//!
//! Provides REST API endpoints for:
//! - Running source text
//! - The live editor panel
//! - Session state and health checks

mod error;
mod handlers;

use std::sync::Arc;

use axum::{
    routing::{get, post, put},
    Router,
};

use crate::AppState;

pub use error::ApiError;

/// Create the main application router
pub fn create_router(state: Arc<AppState>) -> Router {
    let mut router = Router::new()
        // Health check
        .route("/health", get(handlers::health::health_check))
        // API v1 routes
        .nest("/api/v1", api_v1_routes());

    if state.config.metrics.enabled {
        router = router.route(&state.config.metrics.path, get(crate::metrics::metrics_handler));
    }

    router.with_state(state)
}

/// API v1 routes
fn api_v1_routes() -> Router<Arc<AppState>> {
    Router::new()
        // Session and run endpoints
        .route("/session", get(handlers::session::get_session))
        .route("/run", post(handlers::run::run_source))
        .route("/history", get(handlers::run::get_history))
        .route("/examples", get(handlers::editor::list_examples))
        // Editor panel endpoints
        .nest("/editor", editor_routes())
}

/// Editor panel routes
fn editor_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(handlers::editor::get_editor))
        .route("/source", put(handlers::editor::update_source))
        .route("/run", post(handlers::editor::run_editor))
        .route("/reset", post(handlers::editor::reset_editor))
        .route("/examples/:index", post(handlers::editor::load_example))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use axum::body::{to_bytes, Body};
    use axum::http::{Method, Request, StatusCode};
    use pretty_assertions::assert_eq;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::config::AppConfig;
    use crate::engine::testing::{GatedEngine, ReadyLoader, StalledLoader};
    use crate::engine::{Engine, EngineError, MockEngine, MockEngineLoader};
    use crate::session::SessionState;

    fn echo_engine() -> MockEngine {
        let mut engine = MockEngine::new();
        engine.expect_version().return_const("Python 3.test".to_string());
        engine.expect_capture_stdout().returning(|| Ok(()));
        engine.expect_run_program().returning(|code: &str| {
            if code.contains("1/0") {
                Err(EngineError::Execution("ZeroDivisionError: division by zero".into()))
            } else {
                Ok(())
            }
        });
        engine
            .expect_captured_stdout()
            .returning(|| Ok("hi, mundo!\n".to_string()));
        engine.expect_release_stdout().returning(|| Ok(()));
        engine
    }

    async fn ready_state(config: AppConfig) -> Arc<AppState> {
        let engine: Arc<dyn Engine> = Arc::new(echo_engine());
        let mut loader = MockEngineLoader::new();
        loader.expect_load().returning(move || Ok(engine.clone()));
        let state = Arc::new(AppState::new(config, Arc::new(loader)));
        assert_eq!(state.session.acquire().await, SessionState::Ready);
        state
    }

    async fn send(
        state: Arc<AppState>,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json");
        let request = match body {
            Some(body) => request.body(Body::from(body.to_string())).unwrap(),
            None => request.body(Body::empty()).unwrap(),
        };

        let response = create_router(state).oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    #[tokio::test]
    async fn test_health_reports_session() {
        let state = ready_state(AppConfig::default()).await;
        let (status, body) = send(state, Method::GET, "/health", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["session"], json!({"state": "ready"}));
    }

    #[tokio::test]
    async fn test_run_endpoint() {
        let state = ready_state(AppConfig::default()).await;
        let (status, body) = send(
            state.clone(),
            Method::POST,
            "/api/v1/run",
            Some(json!({"source": "print(\"hi, mundo!\")"})),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "success");
        assert_eq!(body["output"], "hi, mundo!\n");
        assert_eq!(body["result"], json!({"kind": "output", "text": "hi, mundo!\n"}));

        let (_, body) = send(
            state.clone(),
            Method::POST,
            "/api/v1/run",
            Some(json!({"source": "x = 1/0"})),
        )
        .await;
        assert_eq!(body["status"], "error");

        let (_, body) = send(state, Method::GET, "/api/v1/history", None).await;
        assert_eq!(body["runs"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_oversized_source_is_rejected() {
        let config = AppConfig {
            max_source_bytes: 8,
            ..AppConfig::default()
        };
        let state = ready_state(config).await;
        let (status, body) = send(
            state,
            Method::POST,
            "/api/v1/run",
            Some(json!({"source": "print(\"too long\")"})),
        )
        .await;

        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(body["error"], "PAYLOAD_TOO_LARGE");
    }

    #[tokio::test]
    async fn test_run_before_ready_is_advisory() {
        let state = Arc::new(AppState::new(AppConfig::default(), Arc::new(StalledLoader)));
        let (status, body) = send(
            state.clone(),
            Method::POST,
            "/api/v1/run",
            Some(json!({"source": "print(1)"})),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "not_ready");
        assert_eq!(body["output"], "Python is still loading...");

        let (_, body) = send(state, Method::GET, "/health", None).await;
        assert_eq!(body["status"], "degraded");
    }

    #[tokio::test]
    async fn test_editor_flow() {
        let state = ready_state(AppConfig::default()).await;
        let default_source = state.config.editor.default_source.clone();

        let (status, body) = send(
            state.clone(),
            Method::PUT,
            "/api/v1/editor/source",
            Some(json!({"source": "print(\"hi, mundo!\")"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["source"], "print(\"hi, mundo!\")");

        let (_, body) = send(state.clone(), Method::POST, "/api/v1/editor/run", None).await;
        assert_eq!(body["output"], "hi, mundo!\n");

        let (_, body) = send(state.clone(), Method::GET, "/api/v1/editor", None).await;
        assert_eq!(body["output"], "hi, mundo!\n");
        assert_eq!(body["controls"]["run"], true);

        let (_, body) = send(state.clone(), Method::POST, "/api/v1/editor/reset", None).await;
        assert_eq!(body["source"], Value::String(default_source));
        assert_eq!(body["output"], Value::Null);
    }

    #[tokio::test]
    async fn test_examples() {
        let state = ready_state(AppConfig::default()).await;

        let (_, body) = send(state.clone(), Method::GET, "/api/v1/examples", None).await;
        assert_eq!(body.as_array().unwrap().len(), crate::editor::EXAMPLES.len());
        assert_eq!(body[0]["title"], "Variables");

        let (status, body) =
            send(state.clone(), Method::POST, "/api/v1/editor/examples/2", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["source"], crate::editor::EXAMPLES[2].code);

        let (status, body) = send(state, Method::POST, "/api/v1/editor/examples/99", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_session_endpoint() {
        let state = ready_state(AppConfig::default()).await;
        let (_, body) = send(state, Method::GET, "/api/v1/session", None).await;

        assert_eq!(body["session"], json!({"state": "ready"}));
        assert_eq!(body["engine_version"], "Python 3.test");
        assert_eq!(body["run_state"], "idle");
    }

    #[tokio::test]
    async fn test_busy_run_is_a_conflict() {
        let engine = GatedEngine::new();
        let loaded: Arc<dyn Engine> = engine.clone();
        let state = Arc::new(AppState::new(
            AppConfig::default(),
            Arc::new(ReadyLoader(loaded)),
        ));
        assert_eq!(state.session.acquire().await, SessionState::Ready);

        let running = {
            let coordinator = state.coordinator.clone();
            tokio::spawn(async move { coordinator.run("slow()").await })
        };
        engine.entered.notified().await;

        let (status, body) = send(
            state.clone(),
            Method::POST,
            "/api/v1/run",
            Some(json!({"source": "print(1)"})),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"], "CONFLICT");
        assert_eq!(body["message"], "A run is already in progress");

        let (status, _) = send(state.clone(), Method::POST, "/api/v1/editor/run", None).await;
        assert_eq!(status, StatusCode::CONFLICT);

        engine.gate.notify_one();
        running.await.unwrap().unwrap();

        let (_, body) = send(state, Method::GET, "/api/v1/history", None).await;
        assert_eq!(body["runs"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_editor_while_loading() {
        let state = Arc::new(AppState::new(AppConfig::default(), Arc::new(StalledLoader)));
        let default_source = state.config.editor.default_source.clone();

        let (status, body) = send(
            state.clone(),
            Method::PUT,
            "/api/v1/editor/source",
            Some(json!({"source": "x = 1"})),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["message"], "Python is still loading...");

        let (status, _) = send(state.clone(), Method::POST, "/api/v1/editor/reset", None).await;
        assert_eq!(status, StatusCode::CONFLICT);
        let (status, _) =
            send(state.clone(), Method::POST, "/api/v1/editor/examples/0", None).await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, body) = send(state.clone(), Method::POST, "/api/v1/editor/run", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "not_ready");

        let (_, body) = send(state, Method::GET, "/api/v1/editor", None).await;
        assert_eq!(body["source"], Value::String(default_source));
        assert_eq!(body["controls"]["edit"], false);
    }
}
