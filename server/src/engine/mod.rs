//! Interpreter engine contract
//!
//! The engine is an opaque external interpreter. The service only relies on
//! the operations below: an asynchronous load (through [`EngineLoader`]),
//! statement and program execution, and redirection of the interpreter's
//! standard output into an in-memory sink.

pub mod python;
#[cfg(test)]
pub mod testing;

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use python::{PythonEngine, PythonLoader};

/// Engine error types
#[derive(Debug, Error)]
pub enum EngineError {
    /// Diagnostic raised by the executed source (syntax or runtime error)
    #[error("{0}")]
    Execution(String),

    #[error("Interpreter not found: {0}")]
    NotFound(String),

    #[error("Failed to fetch runtime bundle: {0}")]
    Bundle(String),

    #[error("Engine I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Engine protocol error: {0}")]
    Protocol(String),

    #[error("Engine process terminated")]
    Terminated,
}

/// A loaded interpreter instance
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Engine: Send + Sync {
    /// Human readable interpreter version
    fn version(&self) -> String;

    /// Execute statements in the session namespace
    async fn run_statements(&self, code: &str) -> Result<(), EngineError>;

    /// Execute a whole program; top-level `await` is allowed
    async fn run_program(&self, code: &str) -> Result<(), EngineError>;

    /// Redirect standard output into a fresh, empty in-memory buffer
    async fn capture_stdout(&self) -> Result<(), EngineError>;

    /// Contents accumulated in the capture buffer so far
    async fn captured_stdout(&self) -> Result<String, EngineError>;

    /// Restore the original standard output stream
    async fn release_stdout(&self) -> Result<(), EngineError>;
}

/// Asynchronous acquisition of an engine instance
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EngineLoader: Send + Sync {
    async fn load(&self) -> Result<Arc<dyn Engine>, EngineError>;
}

/// Engine acquisition settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Explicit interpreter path (defaults to `python3` on PATH)
    #[serde(default)]
    pub interpreter: Option<PathBuf>,

    /// URL of the runtime bundle (driver script); embedded copy when unset
    #[serde(default)]
    pub bundle_url: Option<String>,

    /// Maximum time allowed for acquisition
    #[serde(default = "default_load_timeout")]
    pub load_timeout_seconds: u64,
}

fn default_load_timeout() -> u64 {
    30
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            interpreter: None,
            bundle_url: None,
            load_timeout_seconds: default_load_timeout(),
        }
    }
}
