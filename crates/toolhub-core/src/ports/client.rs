//! Client adapter contract for tool server transports.
//!
//! One `ToolClient` instance exists per running server and is never
//! reused across a stop/start cycle; the hub constructs a fresh instance
//! for every start attempt and compares `Arc` identities to detect
//! superseded attempts.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::domain::{ServerConfig, Tool, ToolCallResult};

/// Errors that can occur during client adapter operations.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Failed to spawn the server process.
    #[error("Failed to spawn tool server process: {0}")]
    SpawnFailed(String),

    /// I/O failure talking to the server.
    #[error("Failed to communicate with tool server: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization failure.
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// The server violated the protocol (bad framing, missing result, EOF).
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Timed out waiting for a server response.
    #[error("Timeout waiting for tool server response")]
    Timeout,

    /// The server returned a JSON-RPC error object.
    #[error("Tool server returned error: code={code}, message={message}")]
    Rpc {
        /// JSON-RPC error code.
        code: i64,
        /// JSON-RPC error message.
        message: String,
    },

    /// Operation issued before a successful `start` or after `stop`.
    #[error("Client not connected")]
    NotConnected,

    /// HTTP transport failure (SSE servers).
    #[error("Transport error: {0}")]
    Transport(String),
}

/// Transport adapter for one tool server instance.
///
/// All operations except `stop` involve external process or network I/O
/// and may take unbounded wall-clock time. `stop` is the cancellation
/// primitive: it is idempotent, safe to call at any time (including
/// concurrently with an in-flight `start` or `list_tools`), and causes
/// in-flight operations to fail promptly rather than hang.
#[async_trait]
pub trait ToolClient: Send + Sync {
    /// Establish the transport (spawn the process or open the stream)
    /// and perform the protocol handshake.
    ///
    /// Safe to call exactly once per instance; a second call fails.
    async fn start(&self) -> Result<(), ClientError>;

    /// Discover the tools the server exposes. Valid only after a
    /// successful `start`.
    async fn list_tools(&self) -> Result<Vec<Tool>, ClientError>;

    /// Invoke one remote tool. Valid only while the client reports
    /// itself running.
    async fn call_tool(
        &self,
        name: &str,
        arguments: HashMap<String, Value>,
    ) -> Result<ToolCallResult, ClientError>;

    /// Tear down the transport (terminate the process / close the
    /// stream). Idempotent and synchronous from the caller's view.
    fn stop(&self);

    /// True only between a successful `start` and any `stop`.
    fn is_running(&self) -> bool;
}

/// Factory producing a fresh client adapter per start attempt.
///
/// Construction is pure: the factory only builds the adapter honoring
/// the configured transport kind; no I/O happens until `start`.
pub trait ClientFactory: Send + Sync {
    /// Create a new, unstarted client for the given configuration.
    fn create(&self, config: &ServerConfig) -> Arc<dyn ToolClient>;
}
