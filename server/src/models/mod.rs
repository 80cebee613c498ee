//! Data models for the Scratchpad service
//!
//! Request/response types and the records kept by the run coordinator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::session::SessionState;

// ============================================================================
// Execution Models
// ============================================================================

/// Text shown when a run succeeds without printing anything
pub const NO_OUTPUT_PLACEHOLDER: &str = "Code executed successfully (no output)";

/// Outcome of one admitted run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "text", rename_all = "lowercase")]
pub enum ExecutionResult {
    /// Captured standard output; empty when the program printed nothing
    Output(String),
    /// The engine's diagnostic, verbatim
    Failure(String),
}

impl ExecutionResult {
    pub fn is_success(&self) -> bool {
        matches!(self, ExecutionResult::Output(_))
    }

    pub fn status(&self) -> RunStatus {
        match self {
            ExecutionResult::Output(_) => RunStatus::Success,
            ExecutionResult::Failure(_) => RunStatus::Error,
        }
    }

    /// Text the editor panel renders for this result
    pub fn display_text(&self) -> String {
        match self {
            ExecutionResult::Output(text) if text.is_empty() => NO_OUTPUT_PLACEHOLDER.to_string(),
            ExecutionResult::Output(text) => text.clone(),
            ExecutionResult::Failure(message) => format!("Error:\n{}", message),
        }
    }
}

/// Run status reported over the API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Success,
    Error,
    NotReady,
    Unavailable,
}

/// Admission state of the coordinator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunState {
    Idle,
    Running,
}

/// History entry for a completed run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunRecord {
    pub run_id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub source_hash: String,
    pub status: RunStatus,
    pub duration_ms: u64,
    pub output_bytes: usize,
}

/// Request to run source text
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunRequest {
    pub source: String,
}

/// Response for a run request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunResponse {
    #[serde(default)]
    pub run_id: Option<Uuid>,
    pub status: RunStatus,
    /// Display text (output, placeholder, diagnostic or advisory)
    pub output: String,
    #[serde(default)]
    pub result: Option<ExecutionResult>,
    #[serde(default)]
    pub duration_ms: u64,
}

/// Recent runs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryResponse {
    pub runs: Vec<RunRecord>,
}

// ============================================================================
// Editor Models
// ============================================================================

/// Which panel controls are enabled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Controls {
    pub edit: bool,
    pub run: bool,
    pub reset: bool,
}

/// Snapshot of the editor panel
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditorSnapshot {
    pub source: String,
    #[serde(default)]
    pub output: Option<String>,
    pub status: String,
    pub session: SessionState,
    pub run_state: RunState,
    pub controls: Controls,
}

/// Replace the editor's source text
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateSourceRequest {
    pub source: String,
}

/// Example snippet listing entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExampleInfo {
    pub index: usize,
    pub title: String,
    pub description: String,
    pub code: String,
}

// ============================================================================
// System Models
// ============================================================================

/// Session information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionInfo {
    pub session: SessionState,
    #[serde(default)]
    pub engine_version: Option<String>,
    pub run_state: RunState,
    pub total_runs: u64,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub version: String,
    pub uptime_seconds: u64,
    pub session: SessionState,
}

/// Health status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_display_text() {
        assert_eq!(
            ExecutionResult::Output("hi, mundo!\n".into()).display_text(),
            "hi, mundo!\n"
        );
        assert_eq!(
            ExecutionResult::Output(String::new()).display_text(),
            NO_OUTPUT_PLACEHOLDER
        );
        assert_eq!(
            ExecutionResult::Failure("ZeroDivisionError: division by zero".into()).display_text(),
            "Error:\nZeroDivisionError: division by zero"
        );
    }

    #[test]
    fn test_result_serialization() {
        let json = serde_json::to_value(ExecutionResult::Output("a\n".into())).unwrap();
        assert_eq!(json, serde_json::json!({"kind": "output", "text": "a\n"}));
        let status = serde_json::to_value(RunStatus::NotReady).unwrap();
        assert_eq!(status, serde_json::json!("not_ready"));
    }
}
