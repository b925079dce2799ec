//! Core domain types and port definitions for the tool-server hub.
//!
//! This crate holds the pure domain model (server configurations,
//! statuses, tools, call results), the port traits the hub depends on
//! (client adapter, config store, event emitter), and the event union
//! delivered to listeners. It contains no transport or persistence
//! implementation details.

#![deny(unsafe_code)]

pub mod domain;
pub mod events;
pub mod ports;

// Re-export commonly used types for convenience
pub use domain::{
    EnvVar, ServerConfig, ServerSnapshot, ServerStatus, Tool, ToolCallRequest, ToolCallResult,
    TransportKind,
};
pub use events::{HubEvent, ServerSummary};
pub use ports::{
    ClientError, ClientFactory, ConfigStore, ConfigStoreError, HubErrorCategory, HubErrorInfo,
    HubEventEmitter, HubServiceError, NoopEmitter, ToolClient,
};
