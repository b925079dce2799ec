//! Default client factory honoring the configured transport kind.

use std::sync::Arc;

use toolhub_core::{ClientFactory, ServerConfig, ToolClient, TransportKind};

use crate::client::StdioClient;
use crate::sse::SseClient;

/// Factory producing the built-in transport adapters.
///
/// Construction is pure; no process is spawned and no connection is
/// opened until the hub calls `start` on the returned client.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultClientFactory;

impl DefaultClientFactory {
    /// Create the default factory.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl ClientFactory for DefaultClientFactory {
    fn create(&self, config: &ServerConfig) -> Arc<dyn ToolClient> {
        match config.transport {
            TransportKind::Stdio => Arc::new(StdioClient::new(config.clone())),
            TransportKind::Sse => Arc::new(SseClient::new(config.clone())),
        }
    }
}
