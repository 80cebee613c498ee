//! Engine doubles shared by the unit tests

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Notify;

use super::{Engine, EngineError, EngineLoader};

/// Engine whose program runs block until released
pub struct GatedEngine {
    pub gate: Notify,
    pub entered: Notify,
}

impl GatedEngine {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            gate: Notify::new(),
            entered: Notify::new(),
        })
    }
}

#[async_trait]
impl Engine for GatedEngine {
    fn version(&self) -> String {
        "gated".to_string()
    }

    async fn run_statements(&self, _code: &str) -> Result<(), EngineError> {
        Ok(())
    }

    async fn run_program(&self, _code: &str) -> Result<(), EngineError> {
        self.entered.notify_one();
        self.gate.notified().await;
        Ok(())
    }

    async fn capture_stdout(&self) -> Result<(), EngineError> {
        Ok(())
    }

    async fn captured_stdout(&self) -> Result<String, EngineError> {
        Ok("done\n".to_string())
    }

    async fn release_stdout(&self) -> Result<(), EngineError> {
        Ok(())
    }
}

/// Loader that never finishes
pub struct StalledLoader;

#[async_trait]
impl EngineLoader for StalledLoader {
    async fn load(&self) -> Result<Arc<dyn Engine>, EngineError> {
        std::future::pending().await
    }
}

/// Loader handing out an already running engine
pub struct ReadyLoader(pub Arc<dyn Engine>);

#[async_trait]
impl EngineLoader for ReadyLoader {
    async fn load(&self) -> Result<Arc<dyn Engine>, EngineError> {
        Ok(self.0.clone())
    }
}
