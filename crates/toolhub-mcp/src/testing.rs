//! Test doubles shared by the hub and service test suites.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::sync::Mutex as StdMutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use serde_json::{Value, json};
use tokio::sync::Notify;

use toolhub_core::{
    ClientError, ClientFactory, ConfigStore, ConfigStoreError, HubEvent, HubEventEmitter,
    ServerConfig, Tool, ToolCallResult, ToolClient,
};

/// Scriptable client adapter. Counters let tests assert lifecycle
/// invariants like "stop was called exactly once".
pub(crate) struct FakeClient {
    tools: Vec<Tool>,
    fail_start: bool,
    fail_discovery: bool,
    /// When present, `list_tools` signals `entered_discovery` and then
    /// blocks until `discovery_gate` is released.
    discovery_gate: Option<Arc<Notify>>,
    entered_discovery: Option<Arc<Notify>>,
    start_calls: AtomicUsize,
    stop_calls: AtomicUsize,
    call_count: AtomicUsize,
    running: AtomicBool,
}

impl FakeClient {
    pub fn with_tools(names: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            tools: names.iter().map(|n| Tool::new(*n)).collect(),
            fail_start: false,
            fail_discovery: false,
            discovery_gate: None,
            entered_discovery: None,
            start_calls: AtomicUsize::new(0),
            stop_calls: AtomicUsize::new(0),
            call_count: AtomicUsize::new(0),
            running: AtomicBool::new(false),
        })
    }

    pub fn failing_start() -> Arc<Self> {
        let mut client = Self::template();
        client.fail_start = true;
        Arc::new(client)
    }

    pub fn failing_discovery() -> Arc<Self> {
        let mut client = Self::template();
        client.fail_discovery = true;
        Arc::new(client)
    }

    /// A client whose discovery blocks until the returned gate is
    /// notified; the middle handle fires once discovery is entered.
    pub fn gated(names: &[&str]) -> (Arc<Self>, Arc<Notify>, Arc<Notify>) {
        let entered = Arc::new(Notify::new());
        let gate = Arc::new(Notify::new());
        let mut client = Self::template();
        client.tools = names.iter().map(|n| Tool::new(*n)).collect();
        client.discovery_gate = Some(Arc::clone(&gate));
        client.entered_discovery = Some(Arc::clone(&entered));
        (Arc::new(client), entered, gate)
    }

    /// Like `gated`, but discovery fails once the gate is released.
    pub fn gated_failing_discovery() -> (Arc<Self>, Arc<Notify>, Arc<Notify>) {
        let entered = Arc::new(Notify::new());
        let gate = Arc::new(Notify::new());
        let mut client = Self::template();
        client.fail_discovery = true;
        client.discovery_gate = Some(Arc::clone(&gate));
        client.entered_discovery = Some(Arc::clone(&entered));
        (Arc::new(client), entered, gate)
    }

    fn template() -> Self {
        Self {
            tools: Vec::new(),
            fail_start: false,
            fail_discovery: false,
            discovery_gate: None,
            entered_discovery: None,
            start_calls: AtomicUsize::new(0),
            stop_calls: AtomicUsize::new(0),
            call_count: AtomicUsize::new(0),
            running: AtomicBool::new(false),
        }
    }

    pub fn starts(&self) -> usize {
        self.start_calls.load(Ordering::SeqCst)
    }

    pub fn stops(&self) -> usize {
        self.stop_calls.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ToolClient for FakeClient {
    async fn start(&self) -> Result<(), ClientError> {
        self.start_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_start {
            return Err(ClientError::SpawnFailed("forced start failure".to_string()));
        }
        self.running.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn list_tools(&self) -> Result<Vec<Tool>, ClientError> {
        if let (Some(entered), Some(gate)) = (&self.entered_discovery, &self.discovery_gate) {
            entered.notify_one();
            gate.notified().await;
        }
        if self.fail_discovery {
            return Err(ClientError::Protocol(
                "forced discovery failure".to_string(),
            ));
        }
        Ok(self.tools.clone())
    }

    async fn call_tool(
        &self,
        name: &str,
        _arguments: HashMap<String, Value>,
    ) -> Result<ToolCallResult, ClientError> {
        if !self.is_running() {
            return Err(ClientError::NotConnected);
        }
        self.call_count.fetch_add(1, Ordering::SeqCst);
        Ok(ToolCallResult::success(vec![json!({
            "type": "text",
            "text": format!("called {name}")
        })]))
    }

    fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
        self.stop_calls.fetch_add(1, Ordering::SeqCst);
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

/// Factory handing out a queue of prepared fake clients.
///
/// Once the queue is exhausted it falls back to empty-tool clients, so
/// tests only script the attempts they care about.
pub(crate) struct FakeFactory {
    queue: StdMutex<VecDeque<Arc<FakeClient>>>,
    pub created: AtomicUsize,
}

impl FakeFactory {
    pub fn queued(clients: Vec<Arc<FakeClient>>) -> Arc<Self> {
        Arc::new(Self {
            queue: StdMutex::new(clients.into_iter().collect()),
            created: AtomicUsize::new(0),
        })
    }

    pub fn single(client: Arc<FakeClient>) -> Arc<Self> {
        Self::queued(vec![client])
    }

    pub fn creations(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }
}

impl ClientFactory for FakeFactory {
    fn create(&self, _config: &ServerConfig) -> Arc<dyn ToolClient> {
        self.created.fetch_add(1, Ordering::SeqCst);
        let next = self.queue.lock().unwrap().pop_front();
        match next {
            Some(client) => client,
            None => FakeClient::with_tools(&[]),
        }
    }
}

/// In-memory config store for service tests.
#[derive(Default)]
pub(crate) struct MemoryStore {
    configs: StdMutex<Vec<ServerConfig>>,
}

impl MemoryStore {
    pub fn with_configs(configs: Vec<ServerConfig>) -> Arc<Self> {
        Arc::new(Self {
            configs: StdMutex::new(configs),
        })
    }

    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .configs
            .lock()
            .unwrap()
            .iter()
            .map(|c| c.id.clone())
            .collect();
        ids.sort();
        ids
    }
}

#[async_trait]
impl ConfigStore for MemoryStore {
    async fn list(&self) -> Result<Vec<ServerConfig>, ConfigStoreError> {
        Ok(self.configs.lock().unwrap().clone())
    }

    async fn save(&self, config: &ServerConfig) -> Result<(), ConfigStoreError> {
        let mut configs = self.configs.lock().unwrap();
        configs.retain(|c| c.id != config.id);
        configs.push(config.clone());
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<(), ConfigStoreError> {
        let mut configs = self.configs.lock().unwrap();
        let before = configs.len();
        configs.retain(|c| c.id != id);
        if configs.len() == before {
            return Err(ConfigStoreError::NotFound(id.to_string()));
        }
        Ok(())
    }
}

/// Emitter that records every event for later assertions.
#[derive(Clone, Default)]
pub(crate) struct CollectingEmitter {
    events: Arc<StdMutex<Vec<HubEvent>>>,
}

impl CollectingEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn event_names(&self) -> Vec<&'static str> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .map(HubEvent::event_name)
            .collect()
    }
}

impl HubEventEmitter for CollectingEmitter {
    fn emit(&self, event: HubEvent) {
        self.events.lock().unwrap().push(event);
    }

    fn clone_box(&self) -> Box<dyn HubEventEmitter> {
        Box::new(self.clone())
    }
}
