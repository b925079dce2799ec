//! Tool server configuration and status types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::tool::Tool;

/// Transport used to reach a tool server.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    /// Stdio-based server - the hub spawns and manages the process
    #[default]
    Stdio,
    /// SSE-based server - external process, the hub connects via HTTP
    Sse,
}

/// Runtime status of a tool server.
///
/// Exactly one status per server at any instant; transitions are
/// serialized per server by the hub.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServerStatus {
    /// Server is not running
    #[default]
    Stopped,
    /// Server is starting up (transport and discovery in flight)
    Starting,
    /// Server is running and its tools are published
    Running,
    /// The last start attempt failed; see the record's last error
    Error,
}

/// Environment variable entry for a spawned server process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvVar {
    /// Environment variable key (unique within a config)
    pub key: String,
    /// Environment variable value
    pub value: String,
}

impl EnvVar {
    /// Create a new environment variable entry.
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Configuration for one tool server.
///
/// The `id` is the unique, immutable identifier used by every hub
/// operation. Configuration is immutable once registered except through
/// explicit re-registration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Unique identifier for the server.
    pub id: String,

    /// User-friendly display name.
    pub name: String,

    /// Launch command (e.g., "npx" or "/usr/local/bin/mcp-server").
    /// Required for stdio servers; unused for SSE servers.
    #[serde(default)]
    pub command: String,

    /// Arguments to pass to the executable.
    #[serde(default)]
    pub args: Vec<String>,

    /// Environment variables for the server process.
    #[serde(default)]
    pub env: Vec<EnvVar>,

    /// Transport kind (stdio or SSE).
    pub transport: TransportKind,

    /// URL of the SSE event stream (e.g., `http://localhost:3001/sse`).
    /// Required for SSE servers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Whether to start this server when the hub initializes.
    pub auto_start: bool,

    /// Whether this server's launch command is permitted to execute.
    /// Untrusted servers can be registered but never started.
    pub trusted: bool,
}

impl ServerConfig {
    /// Create a stdio server configuration.
    #[must_use]
    pub fn stdio(
        id: impl Into<String>,
        name: impl Into<String>,
        command: impl Into<String>,
        args: Vec<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            command: command.into(),
            args,
            env: Vec::new(),
            transport: TransportKind::Stdio,
            url: None,
            auto_start: false,
            trusted: false,
        }
    }

    /// Create an SSE server configuration.
    #[must_use]
    pub fn sse(id: impl Into<String>, name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            command: String::new(),
            args: Vec::new(),
            env: Vec::new(),
            transport: TransportKind::Sse,
            url: Some(url.into()),
            auto_start: false,
            trusted: false,
        }
    }

    /// Add an environment variable.
    #[must_use]
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push(EnvVar::new(key, value));
        self
    }

    /// Set auto-start.
    #[must_use]
    pub const fn with_auto_start(mut self, auto_start: bool) -> Self {
        self.auto_start = auto_start;
        self
    }

    /// Mark the server's launch command as trusted.
    #[must_use]
    pub const fn with_trusted(mut self, trusted: bool) -> Self {
        self.trusted = trusted;
        self
    }
}

/// Point-in-time view of one registered server.
///
/// This is the read model returned by the hub's snapshot operations.
/// It never reflects a partially-applied transition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSnapshot {
    /// Registered configuration.
    pub config: ServerConfig,

    /// Current runtime status.
    pub status: ServerStatus,

    /// Most recent error message, populated while the server is in the
    /// error state and cleared on any successful transition out of it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,

    /// When the server was registered.
    pub registered_at: DateTime<Utc>,

    /// Tools currently published for this server (empty unless running).
    #[serde(default)]
    pub tools: Vec<Tool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stdio_config_builder() {
        let config = ServerConfig::stdio(
            "files",
            "File Tools",
            "npx",
            vec!["-y".to_string(), "@test/mcp-server".to_string()],
        )
        .with_env("API_KEY", "secret123")
        .with_auto_start(true)
        .with_trusted(true);

        assert_eq!(config.id, "files");
        assert_eq!(config.transport, TransportKind::Stdio);
        assert_eq!(config.command, "npx");
        assert_eq!(config.env.len(), 1);
        assert_eq!(config.env[0].key, "API_KEY");
        assert!(config.auto_start);
        assert!(config.trusted);
        assert!(config.url.is_none());
    }

    #[test]
    fn test_sse_config_builder() {
        let config = ServerConfig::sse("remote", "Remote Server", "http://localhost:3001/sse");

        assert_eq!(config.transport, TransportKind::Sse);
        assert_eq!(config.url, Some("http://localhost:3001/sse".to_string()));
        assert!(config.command.is_empty());
        assert!(!config.trusted);
    }

    #[test]
    fn test_serialization() {
        let config = ServerConfig::stdio("s1", "Test", "node", vec!["server.js".to_string()]);
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("\"transport\":\"stdio\""));
        assert!(json.contains("\"id\":\"s1\""));
    }

    #[test]
    fn test_status_serialization() {
        let json = serde_json::to_string(&ServerStatus::Running).unwrap();
        assert_eq!(json, "\"running\"");
    }
}
