//! Port definitions (trait abstractions) for external systems.
//!
//! Ports define the interfaces the core domain expects from
//! infrastructure. They contain no implementation details and use only
//! domain types.
//!
//! # Design Rules
//!
//! - No process/transport implementation details in any signature
//! - The client adapter trait is the seam for transports (stdio, SSE)
//! - The config store trait is the seam for persistence

pub mod client;
pub mod config_store;
pub mod event_emitter;
pub mod hub_error;

pub use client::{ClientError, ClientFactory, ToolClient};
pub use config_store::{ConfigStore, ConfigStoreError};
pub use event_emitter::{HubEventEmitter, NoopEmitter};
pub use hub_error::{HubErrorCategory, HubErrorInfo, HubServiceError};
