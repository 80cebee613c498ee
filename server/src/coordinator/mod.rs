//! Execution request coordination
//!
//! Admits at most one run at a time against the session's engine, captures
//! the engine's standard output for the duration of the run, and turns every
//! engine failure into a result instead of an error.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use sha2::{Digest, Sha256};
use thiserror::Error;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::engine::{Engine, EngineError};
use crate::models::{ExecutionResult, RunRecord, RunResponse, RunState, RunStatus};
use crate::session::{SessionManager, SessionState};

/// Maximum number of run history entries to keep
const MAX_RUN_HISTORY: usize = 100;

/// Reasons a run was not admitted
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RunRejected {
    #[error("Python is still loading...")]
    NotReady,

    #[error("Error loading Python: {0}")]
    Unavailable(String),

    #[error("A run is already in progress")]
    Busy,
}

impl RunRejected {
    pub fn status(&self) -> Option<RunStatus> {
        match self {
            RunRejected::NotReady => Some(RunStatus::NotReady),
            RunRejected::Unavailable(_) => Some(RunStatus::Unavailable),
            RunRejected::Busy => None,
        }
    }

    /// Advisory response for rejections that are reported rather than refused
    pub fn advisory(&self) -> Option<RunResponse> {
        Some(RunResponse {
            run_id: None,
            status: self.status()?,
            output: self.to_string(),
            result: None,
            duration_ms: 0,
        })
    }
}

/// A completed run
#[derive(Debug, Clone)]
pub struct RunReport {
    pub run_id: Uuid,
    pub result: ExecutionResult,
    pub duration_ms: u64,
}

impl From<RunReport> for RunResponse {
    fn from(report: RunReport) -> Self {
        Self {
            run_id: Some(report.run_id),
            status: report.result.status(),
            output: report.result.display_text(),
            result: Some(report.result),
            duration_ms: report.duration_ms,
        }
    }
}

/// Single-flight runner over the session's engine
pub struct RunCoordinator {
    session: Arc<SessionManager>,
    /// Held for the whole run; its guard is the Running state
    run_lock: Mutex<()>,
    history: RwLock<VecDeque<RunRecord>>,
    total_runs: AtomicU64,
}

impl RunCoordinator {
    pub fn new(session: Arc<SessionManager>) -> Self {
        Self {
            session,
            run_lock: Mutex::new(()),
            history: RwLock::new(VecDeque::with_capacity(MAX_RUN_HISTORY)),
            total_runs: AtomicU64::new(0),
        }
    }

    pub fn session(&self) -> &Arc<SessionManager> {
        &self.session
    }

    /// Current admission state
    pub fn run_state(&self) -> RunState {
        if self.run_lock.try_lock().is_ok() {
            RunState::Idle
        } else {
            RunState::Running
        }
    }

    pub fn total_runs(&self) -> u64 {
        self.total_runs.load(Ordering::Relaxed)
    }

    /// Run source text and return its result
    pub async fn run(&self, source: &str) -> Result<ExecutionResult, RunRejected> {
        self.execute(source).await.map(|report| report.result)
    }

    /// Run source text and return the full report
    pub async fn execute(&self, source: &str) -> Result<RunReport, RunRejected> {
        let engine = self.engine_for_run().map_err(|rejection| {
            crate::metrics::record_rejection(&rejection);
            rejection
        })?;

        let _running = self.run_lock.try_lock().map_err(|_| {
            crate::metrics::record_rejection(&RunRejected::Busy);
            RunRejected::Busy
        })?;

        let run_id = Uuid::new_v4();
        let start_time = Instant::now();

        debug!(run_id = %run_id, source_bytes = source.len(), "Running source");

        let result = match capture_output(engine.as_ref(), source).await {
            Ok(text) => ExecutionResult::Output(text),
            Err(e) => {
                let message = e.to_string();
                if message.is_empty() {
                    ExecutionResult::Failure("Execution failed".to_string())
                } else {
                    ExecutionResult::Failure(message)
                }
            }
        };

        let duration_ms = start_time.elapsed().as_millis() as u64;
        self.total_runs.fetch_add(1, Ordering::Relaxed);

        let output_bytes = match &result {
            ExecutionResult::Output(text) => text.len(),
            ExecutionResult::Failure(_) => 0,
        };

        self.add_record(RunRecord {
            run_id,
            timestamp: Utc::now(),
            source_hash: hash_source(source),
            status: result.status(),
            duration_ms,
            output_bytes,
        })
        .await;

        crate::metrics::record_run(result.is_success(), duration_ms as f64 / 1000.0);

        info!(
            run_id = %run_id,
            status = ?result.status(),
            duration_ms = duration_ms,
            "Run completed"
        );

        Ok(RunReport {
            run_id,
            result,
            duration_ms,
        })
    }

    /// Recent runs, oldest first
    pub async fn history(&self) -> Vec<RunRecord> {
        self.history.read().await.iter().cloned().collect()
    }

    async fn add_record(&self, record: RunRecord) {
        let mut history = self.history.write().await;
        if history.len() >= MAX_RUN_HISTORY {
            history.pop_front();
        }
        history.push_back(record);
    }

    /// Engine handle if the session can take a run; starts acquisition on first need
    fn engine_for_run(&self) -> Result<Arc<dyn Engine>, RunRejected> {
        match self.session.state() {
            SessionState::Ready => self.session.engine().ok_or(RunRejected::NotReady),
            SessionState::Unready => {
                self.session.start();
                Err(RunRejected::NotReady)
            }
            SessionState::Failed(message) => Err(RunRejected::Unavailable(message)),
        }
    }
}

/// Redirect stdout, run, read the buffer, and always restore stdout
async fn capture_output(engine: &dyn Engine, source: &str) -> Result<String, EngineError> {
    let captured: Result<String, EngineError> = async {
        engine.capture_stdout().await?;
        engine.run_program(source).await?;
        engine.captured_stdout().await
    }
    .await;

    if let Err(e) = engine.release_stdout().await {
        warn!(error = %e, "Failed to restore engine stdout");
    }

    captured
}

fn hash_source(source: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(source.as_bytes());
    format!("{:x}", hasher.finalize())
}
