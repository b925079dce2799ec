//! Tool-server hub: lifecycle management and call mediation for
//! external tool servers.
//!
//! The hub registers tool servers, gates their launch configurations,
//! starts and stops them over stdio or SSE transports, publishes their
//! discovered tools, and forwards tool calls. Concurrency is handled by
//! generation tracking: each start attempt gets a fresh client adapter,
//! and a stop that lands mid-start simply supersedes the attempt.

#![deny(unsafe_code)]

pub mod client;
pub mod factory;
pub mod hub;
mod protocol;
pub mod registry;
pub mod security;
pub mod service;
pub mod sse;

#[cfg(test)]
pub(crate) mod testing;

pub use client::StdioClient;
pub use factory::DefaultClientFactory;
pub use hub::ToolHub;
pub use registry::ToolRegistry;
pub use security::{SAFE_COMMANDS, SecurityError, is_trusted, validate_before_start};
pub use service::HubService;
pub use sse::SseClient;
