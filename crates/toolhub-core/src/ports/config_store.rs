//! Server configuration store trait and error types.
//!
//! This module defines the persistence abstraction for server
//! configurations. The hub only needs read access at registration time
//! and does not depend on any particular encoding or location.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::ServerConfig;

/// Domain-specific errors for config store operations.
#[derive(Debug, Error)]
pub enum ConfigStoreError {
    /// The requested server configuration was not found.
    #[error("Server configuration not found: {0}")]
    NotFound(String),

    /// Storage backend error (filesystem, database, etc.).
    #[error("Storage error: {0}")]
    Internal(String),
}

/// Store for server configurations.
///
/// Implementations handle all persistence details internally. The
/// constraint is a unique `id` across all stored configurations;
/// `save` replaces an existing configuration with the same id atomically.
#[async_trait]
pub trait ConfigStore: Send + Sync {
    /// List all stored server configurations.
    ///
    /// # Errors
    ///
    /// - `Internal` for storage errors
    async fn list(&self) -> Result<Vec<ServerConfig>, ConfigStoreError>;

    /// Insert or replace a server configuration by its id.
    ///
    /// # Errors
    ///
    /// - `Internal` for storage errors
    async fn save(&self, config: &ServerConfig) -> Result<(), ConfigStoreError>;

    /// Delete a server configuration by its id.
    ///
    /// # Errors
    ///
    /// - `NotFound` if no configuration with the given id exists
    /// - `Internal` for storage errors
    async fn delete(&self, id: &str) -> Result<(), ConfigStoreError>;
}
