//! Application service tying the hub to configuration storage and
//! event delivery.
//!
//! The service owns persistence ordering (register in memory first,
//! then save, rolling back on storage failure) and emits lifecycle
//! events for listeners. The hub itself stays storage- and
//! event-agnostic.

use std::sync::Arc;

use toolhub_core::{
    ClientFactory, ConfigStore, ConfigStoreError, HubErrorCategory, HubErrorInfo, HubEvent,
    HubEventEmitter, HubServiceError, ServerConfig, ServerSnapshot, ServerStatus, ServerSummary,
    Tool, ToolCallRequest, ToolCallResult, TransportKind,
};

use crate::hub::ToolHub;

const fn transport_label(transport: TransportKind) -> &'static str {
    match transport {
        TransportKind::Stdio => "stdio",
        TransportKind::Sse => "sse",
    }
}

/// Facade over the hub, the config store, and the event emitter.
pub struct HubService {
    store: Arc<dyn ConfigStore>,
    emitter: Arc<dyn HubEventEmitter>,
    hub: Arc<ToolHub>,
}

impl HubService {
    /// Create a service with its collaborators.
    #[must_use]
    pub fn new(
        store: Arc<dyn ConfigStore>,
        factory: Arc<dyn ClientFactory>,
        emitter: Arc<dyn HubEventEmitter>,
    ) -> Self {
        Self {
            store,
            emitter,
            hub: Arc::new(ToolHub::new(factory)),
        }
    }

    /// The underlying hub, for callers that need direct access.
    #[must_use]
    pub fn hub(&self) -> Arc<ToolHub> {
        Arc::clone(&self.hub)
    }

    /// Load stored configurations, register them, and start the ones
    /// marked for auto-start. Untrusted servers are registered but never
    /// auto-started; individual failures are reported and skipped so one
    /// bad server cannot block the rest.
    ///
    /// # Errors
    ///
    /// - `Store` when the configuration listing itself fails
    pub async fn initialize(&self) -> Result<(), HubServiceError> {
        let configs = self.store.list().await?;
        tracing::info!(count = configs.len(), "initializing tool server hub");

        for config in configs {
            let id = config.id.clone();
            let auto_start = config.auto_start;
            let trusted = config.trusted;

            if let Err(e) = self.hub.register(config).await {
                tracing::warn!(id = %id, error = %e, "skipping invalid stored server");
                continue;
            }

            if !auto_start {
                continue;
            }
            if !trusted {
                tracing::warn!(id = %id, "not auto-starting untrusted server");
                continue;
            }
            if let Err(e) = self.start_server(&id).await {
                tracing::warn!(id = %id, error = %e, "auto-start failed");
            }
        }
        Ok(())
    }

    /// Register a server and persist its configuration.
    ///
    /// # Errors
    ///
    /// - `InvalidConfig` for a blank id
    /// - `Store` when persisting fails (the registration is rolled back)
    pub async fn add_server(&self, config: ServerConfig) -> Result<(), HubServiceError> {
        let summary = ServerSummary::new(
            &config.id,
            &config.name,
            transport_label(config.transport),
        );

        self.hub.register(config.clone()).await?;
        if let Err(e) = self.store.save(&config).await {
            let _ = self.hub.unregister(&config.id).await;
            return Err(e.into());
        }

        self.emitter.emit(HubEvent::server_added(summary));
        Ok(())
    }

    /// Stop (if live) and remove a server, deleting its stored
    /// configuration.
    ///
    /// # Errors
    ///
    /// - `NotFound` for an unknown id
    /// - `Store` when deletion fails for a reason other than absence
    pub async fn remove_server(&self, id: &str) -> Result<(), HubServiceError> {
        self.hub.unregister(id).await?;

        match self.store.delete(id).await {
            Ok(()) | Err(ConfigStoreError::NotFound(_)) => {}
            Err(e) => return Err(e.into()),
        }

        self.emitter.emit(HubEvent::server_removed(id));
        Ok(())
    }

    /// Start a server and return its discovered tools.
    ///
    /// Emits `ServerStarted` on success and `ServerError` on failure. A
    /// start superseded by a concurrent stop emits neither.
    ///
    /// # Errors
    ///
    /// Propagates the hub's start errors.
    pub async fn start_server(&self, id: &str) -> Result<Vec<Tool>, HubServiceError> {
        let name = self.hub.get_server(id).await?.config.name;

        match self.hub.start_server(id).await {
            Ok(tools) => {
                let running = self
                    .hub
                    .get_server(id)
                    .await
                    .is_ok_and(|s| s.status == ServerStatus::Running);
                if running {
                    self.emitter.emit(HubEvent::server_started(id, &name));
                }
                Ok(tools)
            }
            Err(e) => {
                let info = HubErrorInfo {
                    server_id: Some(id.to_string()),
                    server_name: name,
                    message: e.to_string(),
                    category: HubErrorCategory::from(&e),
                };
                self.emitter.emit(HubEvent::server_error(info));
                Err(e)
            }
        }
    }

    /// Stop a server and emit `ServerStopped`.
    ///
    /// # Errors
    ///
    /// - `NotFound` for an unknown id
    pub async fn stop_server(&self, id: &str) -> Result<(), HubServiceError> {
        let name = self.hub.get_server(id).await?.config.name;
        self.hub.stop_server(id).await?;
        self.emitter.emit(HubEvent::server_stopped(id, name));
        Ok(())
    }

    /// Forward a tool call to a running server.
    ///
    /// # Errors
    ///
    /// Propagates the hub's call errors.
    pub async fn call_tool(
        &self,
        request: ToolCallRequest,
    ) -> Result<ToolCallResult, HubServiceError> {
        self.hub.call_tool(request).await
    }

    /// Snapshot of one server.
    ///
    /// # Errors
    ///
    /// - `NotFound` for an unknown id
    pub async fn get_server(&self, id: &str) -> Result<ServerSnapshot, HubServiceError> {
        self.hub.get_server(id).await
    }

    /// Tools currently published for one server.
    ///
    /// # Errors
    ///
    /// - `NotFound` for an unknown id
    pub async fn server_tools(&self, id: &str) -> Result<Vec<Tool>, HubServiceError> {
        self.hub.server_tools(id).await
    }

    /// Snapshots of every registered server.
    pub async fn list_servers(&self) -> Vec<ServerSnapshot> {
        self.hub.list_servers().await
    }

    /// Stop all live servers. Registrations and stored configurations
    /// are kept.
    pub async fn shutdown(&self) {
        tracing::info!("shutting down tool server hub");
        self.hub.shutdown().await;
    }
}
