//! Stdio client adapter: JSON-RPC over a spawned child process.
//!
//! Protocol messages are framed as newline-delimited JSON on the child's
//! stdin/stdout. Process exit or crash closes the pipes, which surfaces
//! as a failed result from any in-flight operation; `stop` kills the
//! child, making it the effective cancellation primitive.

use std::collections::HashMap;
use std::io::{BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, ChildStdout, Stdio};
use std::sync::Mutex as StdMutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};
use tokio::sync::Mutex;
use tokio::time::timeout;

use toolhub_core::{ClientError, ServerConfig, Tool, ToolCallResult, ToolClient};

use crate::protocol::{
    self, InitializeResult, JsonRpcRequest, JsonRpcResponse, ServerCapabilities,
};

/// How long to wait for a single response line. Generous because
/// package runners like npx may install on first launch.
const READ_TIMEOUT: Duration = Duration::from_secs(30);

/// Client for one tool server reached over a spawned child process.
///
/// Created unstarted; `start` spawns the process and performs the
/// initialize handshake. Never reused across a stop/start cycle.
pub struct StdioClient {
    config: ServerConfig,
    /// Child process, present between start and stop.
    process: StdMutex<Option<Child>>,
    /// Stdin for sending requests.
    stdin: StdMutex<Option<ChildStdin>>,
    /// Stdout reader for receiving responses.
    stdout: Mutex<Option<BufReader<ChildStdout>>>,
    /// Capabilities advertised during initialize.
    capabilities: StdMutex<Option<ServerCapabilities>>,
    /// Request ID counter.
    request_id: AtomicU64,
    /// Guards against a second start on the same instance.
    started: AtomicBool,
    /// True between a successful start and any stop.
    running: AtomicBool,
}

impl StdioClient {
    /// Create a new, unstarted stdio client.
    #[must_use]
    pub fn new(config: ServerConfig) -> Self {
        Self {
            config,
            process: StdMutex::new(None),
            stdin: StdMutex::new(None),
            stdout: Mutex::new(None),
            capabilities: StdMutex::new(None),
            request_id: AtomicU64::new(1),
            started: AtomicBool::new(false),
            running: AtomicBool::new(false),
        }
    }

    /// Spawn the child process, returning the stdout pipe for the caller
    /// to install under the async read lock.
    fn spawn_process(&self) -> Result<BufReader<ChildStdout>, ClientError> {
        let mut command = std::process::Command::new(&self.config.command);
        command
            .args(&self.config.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null());

        for entry in &self.config.env {
            command.env(&entry.key, &entry.value);
        }

        let mut child = command.spawn().map_err(|e| {
            ClientError::SpawnFailed(format!(
                "Failed to spawn {:?}: {e}\nArgs: {:?}",
                self.config.command, self.config.args
            ))
        })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| ClientError::SpawnFailed("Failed to get stdin".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| ClientError::SpawnFailed("Failed to get stdout".to_string()))?;

        *lock(&self.process)? = Some(child);
        *lock(&self.stdin)? = Some(stdin);

        Ok(BufReader::new(stdout))
    }

    /// Send the initialize request and the initialized notification.
    async fn initialize(&self) -> Result<(), ClientError> {
        let result: Value = self.request("initialize", Some(protocol::initialize_params())).await?;
        let init: InitializeResult = serde_json::from_value(result)?;

        if let Some(info) = &init.server_info {
            tracing::debug!(server = %info.name, "initialized tool server session");
        }
        *lock(&self.capabilities)? = Some(init.capabilities);

        self.notify("notifications/initialized", None)
    }

    /// Send a JSON-RPC request and wait for the next valid response line.
    async fn request(&self, method: &str, params: Option<Value>) -> Result<Value, ClientError> {
        let id = self.request_id.fetch_add(1, Ordering::SeqCst);
        let request = JsonRpcRequest::new(id, method, params);
        let request_line = serde_json::to_string(&request)? + "\n";

        self.write_line(&request_line)?;

        // Read the response with a timeout; skip any non-JSON startup
        // noise the launcher may print to stdout.
        let read_result = timeout(READ_TIMEOUT, async {
            let mut guard = self.stdout.lock().await;
            let reader = guard.as_mut().ok_or(ClientError::NotConnected)?;

            for _ in 0..10 {
                let mut line = String::new();
                match reader.read_line(&mut line) {
                    Ok(0) => {
                        // EOF - server closed stdout (exit, crash, or stop)
                        return Err(ClientError::Protocol(
                            "Server closed connection".to_string(),
                        ));
                    }
                    Ok(_) => {
                        let trimmed = line.trim();
                        if trimmed.is_empty() {
                            continue;
                        }
                        if let Ok(response) = serde_json::from_str::<JsonRpcResponse>(trimmed) {
                            return Ok(response);
                        }
                        tracing::debug!(line = trimmed, "Skipping non-JSON-RPC output");
                    }
                    Err(e) => return Err(ClientError::Io(e)),
                }
            }

            Err(ClientError::Protocol(
                "No valid JSON-RPC response received".to_string(),
            ))
        })
        .await;

        let response = match read_result {
            Ok(Ok(r)) => r,
            Ok(Err(e)) => return Err(e),
            Err(_) => return Err(ClientError::Timeout),
        };

        protocol::unwrap_response(response)
    }

    /// Send a JSON-RPC notification (no response expected).
    fn notify(&self, method: &str, params: Option<Value>) -> Result<(), ClientError> {
        let body = protocol::notification(method, params);
        let line = serde_json::to_string(&body)? + "\n";
        self.write_line(&line)
    }

    fn write_line(&self, line: &str) -> Result<(), ClientError> {
        let mut guard = lock(&self.stdin)?;
        let stdin = guard.as_mut().ok_or(ClientError::NotConnected)?;
        stdin.write_all(line.as_bytes())?;
        stdin.flush()?;
        Ok(())
    }
}

#[async_trait]
impl ToolClient for StdioClient {
    async fn start(&self) -> Result<(), ClientError> {
        if self.started.swap(true, Ordering::SeqCst) {
            return Err(ClientError::Protocol(
                "Client already started; create a fresh instance per attempt".to_string(),
            ));
        }

        let stdout = self.spawn_process()?;
        *self.stdout.lock().await = Some(stdout);
        self.initialize().await?;
        self.running.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn list_tools(&self) -> Result<Vec<Tool>, ClientError> {
        // A server that doesn't advertise the tools capability has none.
        let has_tools = lock(&self.capabilities)?
            .as_ref()
            .is_some_and(|c| c.tools.is_some());
        if !has_tools {
            return Ok(Vec::new());
        }

        let result = self.request("tools/list", None).await?;
        protocol::tools_from_result(&result)
    }

    async fn call_tool(
        &self,
        name: &str,
        arguments: HashMap<String, Value>,
    ) -> Result<ToolCallResult, ClientError> {
        let params = json!({
            "name": name,
            "arguments": arguments
        });

        let result = self.request("tools/call", Some(params)).await?;
        Ok(protocol::call_result_from_result(&result))
    }

    fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);

        // Drop stdin to signal EOF to a well-behaved server.
        if let Ok(mut stdin) = self.stdin.lock() {
            stdin.take();
        }

        // Kill the process if still running; closing its stdout unblocks
        // any in-flight read.
        let process = match self.process.lock() {
            Ok(mut guard) => guard.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        if let Some(mut child) = process {
            let _ = child.kill();
            let _ = child.wait();
        }

        if let Ok(mut capabilities) = self.capabilities.lock() {
            capabilities.take();
        }
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

impl Drop for StdioClient {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Lock a std mutex, mapping poisoning to a protocol error.
pub(crate) fn lock<T>(mutex: &StdMutex<T>) -> Result<std::sync::MutexGuard<'_, T>, ClientError> {
    mutex
        .lock()
        .map_err(|_| ClientError::Protocol("Client state lock poisoned".to_string()))
}
