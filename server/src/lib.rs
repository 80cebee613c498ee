//! Scratchpad library
//!
//! Live Python editor service: one interpreter session per process, single
//! flight runs with captured standard output.

use std::sync::Arc;
use std::time::Instant;

pub mod api;
pub mod config;
pub mod coordinator;
pub mod editor;
pub mod engine;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod session;

/// Application state shared across all handlers
pub struct AppState {
    pub config: config::AppConfig,
    pub session: Arc<session::SessionManager>,
    pub coordinator: Arc<coordinator::RunCoordinator>,
    pub editor: editor::LiveEditor,
    pub started_at: Instant,
}

impl AppState {
    /// Wire the session, coordinator and editor around an engine loader
    pub fn new(config: config::AppConfig, loader: Arc<dyn engine::EngineLoader>) -> Self {
        let session = Arc::new(session::SessionManager::new(loader, config.load_timeout()));
        let coordinator = Arc::new(coordinator::RunCoordinator::new(session.clone()));
        let editor = editor::LiveEditor::new(&config.editor, coordinator.clone());

        Self {
            config,
            session,
            coordinator,
            editor,
            started_at: Instant::now(),
        }
    }
}
