//! Live editor panel
//!
//! Holds the panel's source text and last rendered result, and derives the
//! status line and enabled controls from the session and run state.

pub mod examples;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::coordinator::{RunCoordinator, RunRejected};
use crate::models::{Controls, EditorSnapshot, RunResponse, RunState};
use crate::session::SessionState;

pub use examples::{Example, EXAMPLES};

/// Editor settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditorConfig {
    /// Source text shown on load and restored by reset
    #[serde(default = "default_source")]
    pub default_source: String,
}

fn default_source() -> String {
    "# Write your Python code here\nprint(\"hi, mundo!\")".to_string()
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            default_source: default_source(),
        }
    }
}

#[derive(Debug)]
struct Panel {
    source: String,
    output: Option<String>,
}

/// The editor panel bound to a run coordinator
pub struct LiveEditor {
    default_source: String,
    coordinator: Arc<RunCoordinator>,
    panel: RwLock<Panel>,
}

impl LiveEditor {
    pub fn new(config: &EditorConfig, coordinator: Arc<RunCoordinator>) -> Self {
        Self {
            default_source: config.default_source.clone(),
            coordinator,
            panel: RwLock::new(Panel {
                source: config.default_source.clone(),
                output: None,
            }),
        }
    }

    pub async fn snapshot(&self) -> EditorSnapshot {
        let session = self.coordinator.session().state();
        let run_state = self.coordinator.run_state();
        let panel = self.panel.read().await;

        EditorSnapshot {
            source: panel.source.clone(),
            output: panel.output.clone(),
            status: status_line(&session),
            controls: controls(&session, run_state),
            session,
            run_state,
        }
    }

    /// Replace the source text; refused while the session is loading
    pub async fn set_source(&self, source: String) -> Result<(), RunRejected> {
        self.ensure_editable()?;
        self.panel.write().await.source = source;
        Ok(())
    }

    /// Replace the source with a built-in example
    pub async fn load_example(&self, index: usize) -> Result<Option<&'static Example>, RunRejected> {
        self.ensure_editable()?;
        let Some(example) = examples::get(index) else {
            return Ok(None);
        };
        self.panel.write().await.source = example.code.to_string();
        Ok(Some(example))
    }

    /// Restore the default source and clear the last result
    pub async fn reset(&self) -> Result<(), RunRejected> {
        self.ensure_editable()?;
        let mut panel = self.panel.write().await;
        panel.source = self.default_source.clone();
        panel.output = None;
        Ok(())
    }

    /// Run the current source and render its result into the panel
    pub async fn run(&self) -> Result<RunResponse, RunRejected> {
        let (source, previous) = {
            let mut panel = self.panel.write().await;
            (panel.source.clone(), panel.output.take())
        };

        let response = match self.coordinator.execute(&source).await {
            Ok(report) => RunResponse::from(report),
            Err(RunRejected::Busy) => {
                let mut panel = self.panel.write().await;
                if panel.output.is_none() {
                    panel.output = previous;
                }
                return Err(RunRejected::Busy);
            }
            Err(rejection) => rejection.advisory().ok_or(rejection)?,
        };

        self.panel.write().await.output = Some(response.output.clone());
        Ok(response)
    }

    fn ensure_editable(&self) -> Result<(), RunRejected> {
        let session = self.coordinator.session().state();
        if controls(&session, self.coordinator.run_state()).edit {
            Ok(())
        } else {
            Err(RunRejected::NotReady)
        }
    }
}

/// Status message for the session state
pub fn status_line(session: &SessionState) -> String {
    match session {
        SessionState::Unready => "Python is still loading...".to_string(),
        SessionState::Ready => "Python ready! Write your code and click Run.".to_string(),
        SessionState::Failed(message) => format!("Error loading Python: {}", message),
    }
}

/// Enabled controls for the session and run state
pub fn controls(session: &SessionState, run_state: RunState) -> Controls {
    let loaded = !matches!(session, SessionState::Unready);
    Controls {
        edit: loaded,
        run: session.is_ready() && run_state == RunState::Idle,
        reset: loaded,
    }
}
