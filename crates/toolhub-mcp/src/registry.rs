//! Catalog of tools currently published by running servers.

use std::collections::HashMap;

use tokio::sync::RwLock;

use toolhub_core::Tool;

/// Maps server identifiers to their currently known tool lists.
///
/// Writes are whole-entry replacements performed by the generation that
/// owns the server, so readers never observe a partially-updated list.
/// An entry is absent (and reads as empty) whenever its server is not
/// running.
#[derive(Default)]
pub struct ToolRegistry {
    entries: RwLock<HashMap<String, Vec<Tool>>>,
}

impl ToolRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomically set the tool list for a server.
    pub async fn replace(&self, server_id: &str, tools: Vec<Tool>) {
        let mut entries = self.entries.write().await;
        entries.insert(server_id.to_string(), tools);
    }

    /// Remove all tools for a server.
    pub async fn clear(&self, server_id: &str) {
        let mut entries = self.entries.write().await;
        entries.remove(server_id);
    }

    /// Get the tool list for a server; empty if absent.
    pub async fn get(&self, server_id: &str) -> Vec<Tool> {
        let entries = self.entries.read().await;
        entries.get(server_id).cloned().unwrap_or_default()
    }

    /// Snapshot of all entries across servers.
    pub async fn all(&self) -> Vec<(String, Vec<Tool>)> {
        let entries = self.entries.read().await;
        entries
            .iter()
            .map(|(id, tools)| (id.clone(), tools.clone()))
            .collect()
    }
}
