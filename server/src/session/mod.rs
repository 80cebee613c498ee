//! Interpreter session management
//!
//! A session is acquired exactly once per process lifetime. It starts out
//! `Unready` and settles into `Ready` or `Failed`; both are terminal.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio::time::timeout;
use tracing::{error, info};

use crate::engine::{Engine, EngineLoader};

/// Session lifecycle state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "message", rename_all = "lowercase")]
pub enum SessionState {
    Unready,
    Ready,
    Failed(String),
}

impl SessionState {
    pub fn is_ready(&self) -> bool {
        matches!(self, SessionState::Ready)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SessionState::Unready => "unready",
            SessionState::Ready => "ready",
            SessionState::Failed(_) => "failed",
        }
    }
}

/// Owns the engine handle and its acquisition
pub struct SessionManager {
    loader: Arc<dyn EngineLoader>,
    load_timeout: Duration,
    started: AtomicBool,
    engine: OnceCell<Arc<dyn Engine>>,
    state: watch::Sender<SessionState>,
}

impl SessionManager {
    pub fn new(loader: Arc<dyn EngineLoader>, load_timeout: Duration) -> Self {
        let (state, _) = watch::channel(SessionState::Unready);
        Self {
            loader,
            load_timeout,
            started: AtomicBool::new(false),
            engine: OnceCell::new(),
            state,
        }
    }

    /// Current state snapshot
    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// Engine handle, present once the session is ready
    pub fn engine(&self) -> Option<Arc<dyn Engine>> {
        self.engine.get().cloned()
    }

    /// Whether acquisition has been triggered
    pub fn is_started(&self) -> bool {
        self.started.load(Ordering::Acquire)
    }

    /// Trigger acquisition in the background. Later calls are no-ops.
    pub fn start(self: &Arc<Self>) {
        if self.is_started() {
            return;
        }
        let manager = self.clone();
        tokio::spawn(async move {
            manager.acquire().await;
        });
    }

    /// Acquire the engine, or wait for the acquisition already in flight
    pub async fn acquire(&self) -> SessionState {
        if self.started.swap(true, Ordering::AcqRel) {
            return self.wait_settled().await;
        }

        info!(timeout_secs = self.load_timeout.as_secs(), "Acquiring interpreter session");

        let outcome = match timeout(self.load_timeout, self.loader.load()).await {
            Ok(Ok(engine)) => Ok(engine),
            Ok(Err(e)) => Err(e.to_string()),
            Err(_) => Err(format!(
                "interpreter did not load within {} seconds",
                self.load_timeout.as_secs()
            )),
        };

        let state = match outcome {
            Ok(engine) => {
                info!(version = %engine.version(), "Interpreter session ready");
                // Only this call can reach here, so the cell is still empty
                let _ = self.engine.set(engine);
                SessionState::Ready
            }
            Err(message) => {
                error!(error = %message, "Interpreter session failed to load");
                SessionState::Failed(message)
            }
        };

        crate::metrics::record_session_state(&state);
        self.state.send_replace(state.clone());
        state
    }

    /// Wait until the session reaches a terminal state
    pub async fn wait_settled(&self) -> SessionState {
        let mut rx = self.state.subscribe();
        loop {
            let state = rx.borrow_and_update().clone();
            if state != SessionState::Unready {
                return state;
            }
            if rx.changed().await.is_err() {
                return self.state();
            }
        }
    }
}
