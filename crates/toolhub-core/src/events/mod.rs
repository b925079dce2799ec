//! Canonical event union for hub lifecycle events.
//!
//! This module is the single source of truth for events delivered to
//! listeners (UI bridges, log sinks, etc.).
//!
//! # Wire Format
//!
//! Events are serialized with a `type` tag:
//!
//! ```json
//! { "type": "server_started", "serverId": "files", "serverName": "File Tools" }
//! ```

use serde::{Deserialize, Serialize};

use crate::ports::HubErrorInfo;

/// Summary of a server for event payloads.
///
/// This is a lightweight representation for events — not the full
/// `ServerConfig`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerSummary {
    /// Identifier of the server.
    pub id: String,
    /// User-friendly name of the server.
    pub name: String,
    /// Transport kind (stdio or sse).
    pub transport: String,
}

impl ServerSummary {
    /// Create a new server summary.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        transport: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            transport: transport.into(),
        }
    }
}

/// Canonical hub event types.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HubEvent {
    /// A server was added to the configuration.
    ServerAdded {
        /// Summary of the added server.
        server: ServerSummary,
    },

    /// A server was removed from the configuration.
    ServerRemoved {
        /// Identifier of the removed server.
        #[serde(rename = "serverId")]
        server_id: String,
    },

    /// A server has started and its tools are published.
    ServerStarted {
        /// Identifier of the server.
        #[serde(rename = "serverId")]
        server_id: String,
        /// Name of the server.
        #[serde(rename = "serverName")]
        server_name: String,
    },

    /// A server has been stopped.
    ServerStopped {
        /// Identifier of the server.
        #[serde(rename = "serverId")]
        server_id: String,
        /// Name of the server.
        #[serde(rename = "serverName")]
        server_name: String,
    },

    /// A server encountered an error.
    ServerError {
        /// User-safe error information.
        error: HubErrorInfo,
    },
}

impl HubEvent {
    /// Create a server added event.
    pub const fn server_added(server: ServerSummary) -> Self {
        Self::ServerAdded { server }
    }

    /// Create a server removed event.
    pub fn server_removed(server_id: impl Into<String>) -> Self {
        Self::ServerRemoved {
            server_id: server_id.into(),
        }
    }

    /// Create a server started event.
    pub fn server_started(server_id: impl Into<String>, server_name: impl Into<String>) -> Self {
        Self::ServerStarted {
            server_id: server_id.into(),
            server_name: server_name.into(),
        }
    }

    /// Create a server stopped event.
    pub fn server_stopped(server_id: impl Into<String>, server_name: impl Into<String>) -> Self {
        Self::ServerStopped {
            server_id: server_id.into(),
            server_name: server_name.into(),
        }
    }

    /// Create a server error event.
    pub const fn server_error(error: HubErrorInfo) -> Self {
        Self::ServerError { error }
    }

    /// Get the event name for wire protocols.
    ///
    /// This provides consistent event naming across listener transports.
    pub const fn event_name(&self) -> &'static str {
        match self {
            Self::ServerAdded { .. } => "hub:added",
            Self::ServerRemoved { .. } => "hub:removed",
            Self::ServerStarted { .. } => "hub:started",
            Self::ServerStopped { .. } => "hub:stopped",
            Self::ServerError { .. } => "hub:error",
        }
    }
}
