//! Core domain types.
//!
//! These types represent the pure domain model, independent of any
//! infrastructure concerns (transport, persistence, etc.).
//!
//! # Structure
//!
//! - `server` - Server configuration and status (`ServerConfig`, `ServerStatus`, etc.)
//! - `tool` - Tool and tool-call types (`Tool`, `ToolCallRequest`, `ToolCallResult`)

pub mod server;
pub mod tool;

pub use server::{EnvVar, ServerConfig, ServerSnapshot, ServerStatus, TransportKind};
pub use tool::{Tool, ToolCallRequest, ToolCallResult};
