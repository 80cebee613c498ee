//! Python engine backed by a persistent interpreter process
//!
//! The child runs a small driver that reads one JSON request per line on
//! stdin and answers one JSON reply per line on stdout. The driver moves
//! both pipes to private descriptors before running user code, so anything
//! the user code writes to descriptor 1 (prints while no capture is active,
//! child processes, `os.write`) lands on the child's stderr, which is
//! forwarded to the log.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::{Engine, EngineConfig, EngineError, EngineLoader};

/// Embedded runtime bundle
const DRIVER_SOURCE: &str = include_str!("driver.py");

#[derive(Debug, Serialize)]
struct DriverRequest<'a> {
    id: u64,
    op: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct DriverReply {
    id: Option<u64>,
    ok: bool,
    #[serde(default)]
    value: Value,
    #[serde(default)]
    error: Option<String>,
}

/// Request/reply pipe to the driver
struct DriverChannel {
    stdin: ChildStdin,
    replies: Lines<BufReader<ChildStdout>>,
    next_id: u64,
    // Set while a request has no matching reply yet
    outstanding: bool,
}

impl DriverChannel {
    async fn call(&mut self, op: &str, code: Option<&str>) -> Result<Value, EngineError> {
        self.next_id += 1;
        let id = self.next_id;

        let mut line = serde_json::to_string(&DriverRequest { id, op, code })
            .map_err(|e| EngineError::Protocol(e.to_string()))?;
        line.push('\n');

        if self.outstanding {
            // A dropped call may have left a partial request line behind
            debug!(request = id, "Resynchronizing driver channel");
            line.insert(0, '\n');
        }
        self.outstanding = true;

        self.stdin.write_all(line.as_bytes()).await?;
        self.stdin.flush().await?;

        let reply = self.reply_to(id).await?;
        self.outstanding = false;

        if reply.ok {
            Ok(reply.value)
        } else {
            Err(EngineError::Execution(reply.error.unwrap_or_default()))
        }
    }

    /// Read replies until the one answering `id`, discarding stale ones
    async fn reply_to(&mut self, id: u64) -> Result<DriverReply, EngineError> {
        loop {
            let raw = self
                .replies
                .next_line()
                .await?
                .ok_or(EngineError::Terminated)?;

            let reply: DriverReply = match serde_json::from_str(&raw) {
                Ok(reply) => reply,
                Err(e) => {
                    warn!(error = %e, "Discarding invalid driver reply");
                    continue;
                }
            };

            match reply.id {
                Some(reply_id) if reply_id == id => return Ok(reply),
                Some(reply_id) if reply_id > id => {
                    return Err(EngineError::Protocol(format!(
                        "reply id {} is ahead of request {}",
                        reply_id, id
                    )))
                }
                stale => debug!(reply = ?stale, request = id, "Discarding stale driver reply"),
            }
        }
    }
}

/// A running Python interpreter
pub struct PythonEngine {
    version: String,
    channel: Mutex<DriverChannel>,
    // Held so the process is killed when the engine is dropped
    _child: Child,
}

impl PythonEngine {
    /// Spawn the interpreter with the given driver and perform the handshake
    pub async fn spawn(interpreter: &Path, driver: &str) -> Result<Self, EngineError> {
        let mut child = Command::new(interpreter)
            .arg("-u")
            .arg("-c")
            .arg(driver)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| EngineError::Protocol("driver stdin unavailable".into()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| EngineError::Protocol("driver stdout unavailable".into()))?;

        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(async move {
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    info!(line = %line, "Uncaptured engine output");
                }
            });
        }

        let mut channel = DriverChannel {
            stdin,
            replies: BufReader::new(stdout).lines(),
            next_id: 0,
            outstanding: false,
        };

        let version = match channel.call("hello", None).await? {
            Value::String(version) => version,
            other => {
                return Err(EngineError::Protocol(format!(
                    "unexpected handshake reply: {}",
                    other
                )))
            }
        };

        debug!(interpreter = %interpreter.display(), version = %version, "Python driver started");

        Ok(Self {
            version,
            channel: Mutex::new(channel),
            _child: child,
        })
    }

    async fn call(&self, op: &str, code: Option<&str>) -> Result<Value, EngineError> {
        self.channel.lock().await.call(op, code).await
    }
}

#[async_trait]
impl Engine for PythonEngine {
    fn version(&self) -> String {
        self.version.clone()
    }

    async fn run_statements(&self, code: &str) -> Result<(), EngineError> {
        self.call("exec", Some(code)).await.map(|_| ())
    }

    async fn run_program(&self, code: &str) -> Result<(), EngineError> {
        self.call("run", Some(code)).await.map(|_| ())
    }

    async fn capture_stdout(&self) -> Result<(), EngineError> {
        self.call("capture", None).await.map(|_| ())
    }

    async fn captured_stdout(&self) -> Result<String, EngineError> {
        match self.call("read", None).await? {
            Value::String(text) => Ok(text),
            Value::Null => Ok(String::new()),
            other => Err(EngineError::Protocol(format!(
                "unexpected capture buffer: {}",
                other
            ))),
        }
    }

    async fn release_stdout(&self) -> Result<(), EngineError> {
        self.call("release", None).await.map(|_| ())
    }
}

/// Loads a [`PythonEngine`] from the configured interpreter and bundle
pub struct PythonLoader {
    config: EngineConfig,
}

impl PythonLoader {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    /// Resolve the interpreter binary
    fn interpreter_path(&self) -> Result<PathBuf, EngineError> {
        if let Some(path) = &self.config.interpreter {
            return which::which(path)
                .map_err(|_| EngineError::NotFound(path.display().to_string()));
        }

        which::which("python3")
            .or_else(|_| which::which("python"))
            .map_err(|_| EngineError::NotFound("python3".to_string()))
    }

    /// Driver source, fetched from the bundle URL when one is configured
    async fn driver_source(&self) -> Result<String, EngineError> {
        let Some(url) = &self.config.bundle_url else {
            return Ok(DRIVER_SOURCE.to_string());
        };

        info!(url = %url, "Fetching runtime bundle");

        let response = reqwest::get(url)
            .await
            .map_err(|e| EngineError::Bundle(e.to_string()))?;

        if !response.status().is_success() {
            return Err(EngineError::Bundle(format!(
                "{} returned {}",
                url,
                response.status()
            )));
        }

        response
            .text()
            .await
            .map_err(|e| EngineError::Bundle(e.to_string()))
    }
}

#[async_trait]
impl EngineLoader for PythonLoader {
    async fn load(&self) -> Result<Arc<dyn Engine>, EngineError> {
        let interpreter = self.interpreter_path()?;
        let driver = self.driver_source().await?;
        let engine = PythonEngine::spawn(&interpreter, &driver).await?;
        Ok(Arc::new(engine))
    }
}
