//! SSE client adapter: JSON-RPC over a persistent HTTP event stream.
//!
//! The server is an external process. The client opens a long-lived
//! `text/event-stream` GET, waits for the `endpoint` event naming the
//! POST URL, then sends each JSON-RPC request as an HTTP POST and
//! correlates the response arriving as a `message` event by request id.
//! `stop` aborts the stream reader, which fails every pending request.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex as StdMutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use serde_json::{Value, json};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use url::Url;

use toolhub_core::{ClientError, ServerConfig, Tool, ToolCallResult, ToolClient};

use crate::client::lock;
use crate::protocol::{
    self, InitializeResult, JsonRpcRequest, JsonRpcResponse, ServerCapabilities,
};

/// How long to wait for the endpoint event or a single response.
const RESPONSE_TIMEOUT: Duration = Duration::from_secs(30);

type PendingMap = Arc<StdMutex<HashMap<u64, oneshot::Sender<JsonRpcResponse>>>>;

/// One parsed server-sent event.
#[derive(Debug, PartialEq, Eq)]
pub(crate) struct SseEvent {
    pub name: String,
    pub data: String,
}

/// Incremental parser for the `text/event-stream` wire format.
///
/// Buffers raw bytes so a UTF-8 sequence or line split across chunks is
/// reassembled before decoding.
#[derive(Default)]
pub(crate) struct SseParser {
    buffer: Vec<u8>,
    event: Option<String>,
    data: String,
}

impl SseParser {
    /// Feed a chunk of bytes, returning any events completed by it.
    pub(crate) fn push(&mut self, chunk: &[u8]) -> Vec<SseEvent> {
        self.buffer.extend_from_slice(chunk);

        let mut events = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let raw: Vec<u8> = self.buffer.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&raw);
            let line = line.trim_end_matches(['\n', '\r']);

            if line.is_empty() {
                if self.event.is_some() || !self.data.is_empty() {
                    events.push(SseEvent {
                        name: self
                            .event
                            .take()
                            .unwrap_or_else(|| "message".to_string()),
                        data: std::mem::take(&mut self.data)
                            .trim_end_matches('\n')
                            .to_string(),
                    });
                }
            } else if let Some(rest) = line.strip_prefix("event:") {
                self.event = Some(rest.trim_start().to_string());
            } else if let Some(rest) = line.strip_prefix("data:") {
                self.data.push_str(rest.strip_prefix(' ').unwrap_or(rest));
                self.data.push('\n');
            }
            // Comments (":") and other fields (id, retry) are ignored.
        }
        events
    }
}

/// Client for one tool server reached over an SSE stream.
///
/// Created unstarted; `start` opens the stream and performs the
/// initialize handshake. Never reused across a stop/start cycle.
pub struct SseClient {
    config: ServerConfig,
    http: reqwest::Client,
    /// POST endpoint resolved from the `endpoint` handshake event.
    endpoint: StdMutex<Option<Url>>,
    /// In-flight requests awaiting a correlated `message` event.
    pending: PendingMap,
    /// Stream reader task, present between start and stop.
    reader: StdMutex<Option<JoinHandle<()>>>,
    /// Capabilities advertised during initialize.
    capabilities: StdMutex<Option<ServerCapabilities>>,
    request_id: AtomicU64,
    started: AtomicBool,
    running: AtomicBool,
}

impl SseClient {
    /// Create a new, unstarted SSE client.
    #[must_use]
    pub fn new(config: ServerConfig) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
            endpoint: StdMutex::new(None),
            pending: Arc::new(StdMutex::new(HashMap::new())),
            reader: StdMutex::new(None),
            capabilities: StdMutex::new(None),
            request_id: AtomicU64::new(1),
            started: AtomicBool::new(false),
            running: AtomicBool::new(false),
        }
    }

    /// Open the event stream and spawn the reader task. Returns once the
    /// server has announced its POST endpoint.
    async fn connect(&self) -> Result<(), ClientError> {
        let stream_url = self
            .config
            .url
            .clone()
            .filter(|u| !u.trim().is_empty())
            .ok_or_else(|| ClientError::Protocol("No SSE url configured".to_string()))?;

        let response = self
            .http
            .get(&stream_url)
            .header("Accept", "text/event-stream")
            .send()
            .await
            .map_err(|e| ClientError::Transport(format!("Failed to open event stream: {e}")))?;

        if !response.status().is_success() {
            return Err(ClientError::Transport(format!(
                "Event stream request failed: {}",
                response.status()
            )));
        }

        let (endpoint_tx, endpoint_rx) = oneshot::channel::<String>();
        let pending = Arc::clone(&self.pending);

        let handle = tokio::spawn(async move {
            let mut endpoint_tx = Some(endpoint_tx);
            let mut parser = SseParser::default();
            let mut stream = response.bytes_stream();

            while let Some(chunk) = stream.next().await {
                let Ok(chunk) = chunk else { break };
                for event in parser.push(&chunk) {
                    match event.name.as_str() {
                        "endpoint" => {
                            if let Some(tx) = endpoint_tx.take() {
                                let _ = tx.send(event.data);
                            }
                        }
                        "message" => route_response(&pending, &event.data),
                        other => {
                            tracing::debug!(event = other, "Ignoring unknown SSE event");
                        }
                    }
                }
            }

            // Stream ended: dropping the senders fails every pending call.
            if let Ok(mut pending) = pending.lock() {
                pending.clear();
            }
        });
        *lock(&self.reader)? = Some(handle);

        let raw_endpoint = timeout(RESPONSE_TIMEOUT, endpoint_rx)
            .await
            .map_err(|_| ClientError::Timeout)?
            .map_err(|_| {
                ClientError::Protocol("Event stream closed before endpoint event".to_string())
            })?;

        let base = Url::parse(&stream_url)
            .map_err(|e| ClientError::Protocol(format!("Invalid SSE url {stream_url:?}: {e}")))?;
        let endpoint = base.join(&raw_endpoint).map_err(|e| {
            ClientError::Protocol(format!("Invalid endpoint {raw_endpoint:?}: {e}"))
        })?;

        tracing::debug!(endpoint = %endpoint, "resolved SSE message endpoint");
        *lock(&self.endpoint)? = Some(endpoint);
        Ok(())
    }

    /// Send the initialize request and the initialized notification.
    async fn initialize(&self) -> Result<(), ClientError> {
        let result = self
            .request("initialize", Some(protocol::initialize_params()))
            .await?;
        let init: InitializeResult = serde_json::from_value(result)?;

        if let Some(info) = &init.server_info {
            tracing::debug!(server = %info.name, "initialized tool server session");
        }
        *lock(&self.capabilities)? = Some(init.capabilities);

        self.notify("notifications/initialized", None).await
    }

    /// Send a JSON-RPC request as a POST and await the correlated event.
    async fn request(&self, method: &str, params: Option<Value>) -> Result<Value, ClientError> {
        let endpoint = lock(&self.endpoint)?
            .clone()
            .ok_or(ClientError::NotConnected)?;

        let id = self.request_id.fetch_add(1, Ordering::SeqCst);
        let (tx, rx) = oneshot::channel();
        lock(&self.pending)?.insert(id, tx);

        let request = JsonRpcRequest::new(id, method, params);
        let post = self.http.post(endpoint.clone()).json(&request).send().await;

        match post {
            Ok(response) if response.status().is_success() => {}
            Ok(response) => {
                self.forget_pending(id);
                return Err(ClientError::Transport(format!(
                    "POST to {endpoint} failed: {}",
                    response.status()
                )));
            }
            Err(e) => {
                self.forget_pending(id);
                return Err(ClientError::Transport(e.to_string()));
            }
        }

        let response = match timeout(RESPONSE_TIMEOUT, rx).await {
            Ok(Ok(response)) => response,
            Ok(Err(_)) => {
                return Err(ClientError::Protocol("Event stream closed".to_string()));
            }
            Err(_) => {
                self.forget_pending(id);
                return Err(ClientError::Timeout);
            }
        };

        protocol::unwrap_response(response)
    }

    /// Send a JSON-RPC notification (no response expected).
    async fn notify(&self, method: &str, params: Option<Value>) -> Result<(), ClientError> {
        let endpoint = lock(&self.endpoint)?
            .clone()
            .ok_or(ClientError::NotConnected)?;
        let body = protocol::notification(method, params);

        self.http
            .post(endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))?;
        Ok(())
    }

    fn forget_pending(&self, id: u64) {
        if let Ok(mut pending) = self.pending.lock() {
            pending.remove(&id);
        }
    }
}

/// Deliver a `message` event to the request waiting on its id.
fn route_response(pending: &PendingMap, data: &str) {
    match serde_json::from_str::<JsonRpcResponse>(data) {
        Ok(response) => {
            let Some(id) = response.id else {
                tracing::debug!("Ignoring SSE message without request id");
                return;
            };
            let sender = pending.lock().ok().and_then(|mut map| map.remove(&id));
            if let Some(tx) = sender {
                let _ = tx.send(response);
            }
        }
        Err(e) => {
            tracing::debug!(error = %e, "Skipping non-JSON-RPC SSE message");
        }
    }
}

#[async_trait]
impl ToolClient for SseClient {
    async fn start(&self) -> Result<(), ClientError> {
        if self.started.swap(true, Ordering::SeqCst) {
            return Err(ClientError::Protocol(
                "Client already started; create a fresh instance per attempt".to_string(),
            ));
        }

        self.connect().await?;
        self.initialize().await?;
        self.running.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn list_tools(&self) -> Result<Vec<Tool>, ClientError> {
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

        // Abort the stream reader, then fail anything still in flight.
        let handle = match self.reader.lock() {
            Ok(mut guard) => guard.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        if let Some(handle) = handle {
            handle.abort();
        }

        if let Ok(mut pending) = self.pending.lock() {
            pending.clear();
        }
        if let Ok(mut endpoint) = self.endpoint.lock() {
            endpoint.take();
        }
        if let Ok(mut capabilities) = self.capabilities.lock() {
            capabilities.take();
        }
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

impl Drop for SseClient {
    fn drop(&mut self) {
        self.stop();
    }
}
