//! Lifecycle hub for registered tool servers.
//!
//! One `ServerEntry` per registered server, each guarding its own state
//! behind a short-lived async mutex. No lock is ever held across adapter
//! I/O; instead, every start attempt installs a fresh client and the
//! commit step re-checks that the same client is still installed. A stop
//! (or re-registration) that lands mid-start detaches the client, so the
//! straggling start attempt discards its result instead of resurrecting
//! a server the caller already stopped.
//!
//! Exactly one `stop` is issued per client instance: whoever detaches it
//! from the entry owns the teardown.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, RwLock};

use toolhub_core::{
    ClientFactory, HubServiceError, ServerConfig, ServerSnapshot, ServerStatus, Tool,
    ToolCallRequest, ToolCallResult, ToolClient,
};

use crate::registry::ToolRegistry;
use crate::security;

/// Mutable per-server state, guarded by the entry mutex.
struct ServerState {
    config: ServerConfig,
    status: ServerStatus,
    last_error: Option<String>,
    registered_at: DateTime<Utc>,
    /// Client for the current generation; `None` whenever no start
    /// attempt or running instance is live.
    client: Option<Arc<dyn ToolClient>>,
}

/// One registered server. Shared so lifecycle operations can release
/// the hub-wide map before touching per-server state.
struct ServerEntry {
    state: Mutex<ServerState>,
}

impl ServerEntry {
    fn new(config: ServerConfig) -> Self {
        Self {
            state: Mutex::new(ServerState {
                config,
                status: ServerStatus::Stopped,
                last_error: None,
                registered_at: Utc::now(),
                client: None,
            }),
        }
    }
}

/// True when both handles refer to the same client instance.
fn same_generation(a: &Arc<dyn ToolClient>, b: &Arc<dyn ToolClient>) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

/// Registry of tool servers and owner of their lifecycles.
pub struct ToolHub {
    factory: Arc<dyn ClientFactory>,
    registry: ToolRegistry,
    servers: RwLock<HashMap<String, Arc<ServerEntry>>>,
}

impl ToolHub {
    /// Create a hub that builds clients through the given factory.
    #[must_use]
    pub fn new(factory: Arc<dyn ClientFactory>) -> Self {
        Self {
            factory,
            registry: ToolRegistry::new(),
            servers: RwLock::new(HashMap::new()),
        }
    }

    /// Register a server, replacing any existing registration with the
    /// same id. A live or starting instance of the old registration is
    /// stopped first.
    ///
    /// # Errors
    ///
    /// - `InvalidConfig` if the id is blank
    pub async fn register(&self, config: ServerConfig) -> Result<(), HubServiceError> {
        if config.id.trim().is_empty() {
            return Err(HubServiceError::InvalidConfig(
                "Server id must not be empty".to_string(),
            ));
        }

        let replaced = {
            let mut servers = self.servers.write().await;
            let previous = match servers.get(&config.id) {
                Some(entry) => {
                    let mut state = entry.state.lock().await;
                    state.status = ServerStatus::Stopped;
                    state.last_error = None;
                    state.client.take()
                }
                None => None,
            };
            self.registry.clear(&config.id).await;
            tracing::debug!(id = %config.id, name = %config.name, "registered tool server");
            servers.insert(config.id.clone(), Arc::new(ServerEntry::new(config)));
            previous
        };

        if let Some(client) = replaced {
            client.stop();
        }
        Ok(())
    }

    /// Remove a server, stopping any live instance.
    ///
    /// # Errors
    ///
    /// - `NotFound` if no server with the given id is registered
    pub async fn unregister(&self, id: &str) -> Result<(), HubServiceError> {
        let entry = {
            let mut servers = self.servers.write().await;
            servers
                .remove(id)
                .ok_or_else(|| HubServiceError::NotFound(id.to_string()))?
        };

        let detached = {
            let mut state = entry.state.lock().await;
            state.status = ServerStatus::Stopped;
            state.last_error = None;
            self.registry.clear(id).await;
            state.client.take()
        };
        if let Some(client) = detached {
            client.stop();
        }

        tracing::debug!(id, "unregistered tool server");
        Ok(())
    }

    /// Start a server: security gate, transport start, tool discovery,
    /// then publication. Returns the discovered tools, or an empty list
    /// when a concurrent stop superseded the attempt.
    ///
    /// # Errors
    ///
    /// - `NotFound` for an unknown id
    /// - `Security` when the gate rejects the configuration
    /// - `StartFailed` when the server is already starting or running,
    ///   or when transport start / discovery fails
    pub async fn start_server(&self, id: &str) -> Result<Vec<Tool>, HubServiceError> {
        let entry = self.entry(id).await?;

        let (client, name) = {
            let mut state = entry.state.lock().await;

            security::validate_before_start(&state.config)
                .map_err(|e| HubServiceError::Security(e.to_string()))?;

            if matches!(state.status, ServerStatus::Starting | ServerStatus::Running) {
                return Err(HubServiceError::StartFailed(format!(
                    "Server '{}' is already active",
                    state.config.name
                )));
            }

            let client = self.factory.create(&state.config);
            state.status = ServerStatus::Starting;
            state.last_error = None;
            state.client = Some(Arc::clone(&client));
            (client, state.config.name.clone())
        };

        tracing::info!(id, server = %name, "starting tool server");

        if let Err(e) = client.start().await {
            return self
                .abort_start(&entry, id, &client, format!("Failed to start: {e}"))
                .await;
        }

        let tools = match client.list_tools().await {
            Ok(tools) => tools,
            Err(e) => {
                return self
                    .abort_start(&entry, id, &client, format!("Tool discovery failed: {e}"))
                    .await;
            }
        };

        let mut state = entry.state.lock().await;
        let current = state
            .client
            .as_ref()
            .is_some_and(|c| same_generation(c, &client));
        if !current {
            // A stop or re-registration won the race; the winner already
            // tore this client down.
            tracing::debug!(id, "start attempt superseded, discarding result");
            return Ok(Vec::new());
        }

        state.status = ServerStatus::Running;
        self.registry.replace(id, tools.clone()).await;
        drop(state);

        tracing::info!(id, tools = tools.len(), "tool server running");
        Ok(tools)
    }

    /// Stop a server. A no-op success when nothing is live, including
    /// when it only detaches an in-flight start attempt.
    ///
    /// # Errors
    ///
    /// - `NotFound` for an unknown id
    pub async fn stop_server(&self, id: &str) -> Result<(), HubServiceError> {
        let entry = self.entry(id).await?;

        let detached = {
            let mut state = entry.state.lock().await;
            state.status = ServerStatus::Stopped;
            state.last_error = None;
            self.registry.clear(id).await;
            state.client.take()
        };

        if let Some(client) = detached {
            client.stop();
            tracing::info!(id, "tool server stopped");
        }
        Ok(())
    }

    /// Forward a tool call to a running server.
    ///
    /// A result with `is_error = true` is the remote tool reporting an
    /// application-level failure and is returned as `Ok`.
    ///
    /// # Errors
    ///
    /// - `NotFound` for an unknown id
    /// - `NotRunning` unless the server is in the running state
    /// - `ToolError` for transport-level call failures
    pub async fn call_tool(
        &self,
        request: ToolCallRequest,
    ) -> Result<ToolCallResult, HubServiceError> {
        let entry = self.entry(&request.server_id).await?;

        let client = {
            let state = entry.state.lock().await;
            if state.status != ServerStatus::Running {
                return Err(HubServiceError::NotRunning(request.server_id.clone()));
            }
            state.client.clone().ok_or_else(|| {
                HubServiceError::Internal(format!(
                    "Running server '{}' has no client",
                    request.server_id
                ))
            })?
        };

        // The client is a detached handle here; a concurrent stop makes
        // the call fail rather than block the stop.
        client
            .call_tool(&request.tool, request.arguments)
            .await
            .map_err(|e| HubServiceError::ToolError(e.to_string()))
    }

    /// Point-in-time view of one server.
    ///
    /// # Errors
    ///
    /// - `NotFound` for an unknown id
    pub async fn get_server(&self, id: &str) -> Result<ServerSnapshot, HubServiceError> {
        let entry = self.entry(id).await?;
        Ok(self.snapshot(&entry).await)
    }

    /// Tools currently published for one server; empty unless running.
    ///
    /// # Errors
    ///
    /// - `NotFound` for an unknown id
    pub async fn server_tools(&self, id: &str) -> Result<Vec<Tool>, HubServiceError> {
        let entry = self.entry(id).await?;
        let state = entry.state.lock().await;
        if state.status == ServerStatus::Running {
            Ok(self.registry.get(id).await)
        } else {
            Ok(Vec::new())
        }
    }

    /// Snapshots of every registered server, ordered by id.
    pub async fn list_servers(&self) -> Vec<ServerSnapshot> {
        let entries: Vec<Arc<ServerEntry>> =
            { self.servers.read().await.values().cloned().collect() };

        let mut snapshots = Vec::with_capacity(entries.len());
        for entry in &entries {
            snapshots.push(self.snapshot(entry).await);
        }
        snapshots.sort_by(|a, b| a.config.id.cmp(&b.config.id));
        snapshots
    }

    /// Stop every live server. Registrations are kept.
    pub async fn shutdown(&self) {
        let entries: Vec<(String, Arc<ServerEntry>)> = {
            let servers = self.servers.read().await;
            servers
                .iter()
                .map(|(id, entry)| (id.clone(), Arc::clone(entry)))
                .collect()
        };

        for (id, entry) in entries {
            let detached = {
                let mut state = entry.state.lock().await;
                state.status = ServerStatus::Stopped;
                state.last_error = None;
                self.registry.clear(&id).await;
                state.client.take()
            };
            if let Some(client) = detached {
                tracing::info!(id = %id, "stopping tool server");
                client.stop();
            }
        }
    }

    async fn entry(&self, id: &str) -> Result<Arc<ServerEntry>, HubServiceError> {
        let servers = self.servers.read().await;
        servers
            .get(id)
            .cloned()
            .ok_or_else(|| HubServiceError::NotFound(id.to_string()))
    }

    async fn snapshot(&self, entry: &ServerEntry) -> ServerSnapshot {
        let state = entry.state.lock().await;
        let tools = if state.status == ServerStatus::Running {
            self.registry.get(&state.config.id).await
        } else {
            Vec::new()
        };
        ServerSnapshot {
            config: state.config.clone(),
            status: state.status,
            last_error: state.last_error.clone(),
            registered_at: state.registered_at,
            tools,
        }
    }

    /// Fail a still-current start attempt, or discard a superseded one.
    ///
    /// Only the path that detaches the client calls `stop`; when the
    /// attempt was superseded, the superseding operation already did.
    async fn abort_start(
        &self,
        entry: &Arc<ServerEntry>,
        id: &str,
        client: &Arc<dyn ToolClient>,
        message: String,
    ) -> Result<Vec<Tool>, HubServiceError> {
        let still_current = {
            let mut state = entry.state.lock().await;
            let current = state
                .client
                .as_ref()
                .is_some_and(|c| same_generation(c, client));
            if current {
                state.client.take();
                state.status = ServerStatus::Error;
                state.last_error = Some(message.clone());
            }
            current
        };

        if still_current {
            client.stop();
            tracing::warn!(id, error = %message, "tool server start failed");
            Err(HubServiceError::StartFailed(message))
        } else {
            tracing::debug!(id, "failed start attempt was already superseded");
            Ok(Vec::new())
        }
    }
}
