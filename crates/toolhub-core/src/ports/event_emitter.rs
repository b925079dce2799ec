//! Event emitter trait for hub event broadcasting.
//!
//! This module defines the abstraction for emitting hub events.
//! Implementations handle transport details (channels, UI bridges, etc.).

use crate::events::HubEvent;

/// Trait for emitting hub events.
///
/// This abstraction keeps event plumbing consistent and prevents channel
/// types from becoming part of the public API surface.
///
/// # Implementations
///
/// - `NoopEmitter` - For tests and headless contexts that don't need events
/// - Adapter-specific implementations (UI bridges, SSE fan-out, etc.)
pub trait HubEventEmitter: Send + Sync {
    /// Emit a hub event.
    ///
    /// Implementations should handle the event asynchronously or buffer it.
    /// This method should not block.
    fn emit(&self, event: HubEvent);

    /// Clone this emitter into a boxed trait object.
    ///
    /// This enables cloning of `Arc<dyn HubEventEmitter>` without
    /// requiring the underlying type to implement Clone.
    fn clone_box(&self) -> Box<dyn HubEventEmitter>;
}

/// A no-op event emitter for tests and headless contexts.
#[derive(Debug, Clone, Default)]
pub struct NoopEmitter;

impl NoopEmitter {
    /// Create a new no-op emitter.
    pub const fn new() -> Self {
        Self
    }
}

impl HubEventEmitter for NoopEmitter {
    fn emit(&self, _event: HubEvent) {
        // Intentionally do nothing
    }

    fn clone_box(&self) -> Box<dyn HubEventEmitter> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_noop_emitter() {
        let emitter = NoopEmitter::new();

        // Should not panic
        emitter.emit(HubEvent::server_removed("s1"));
    }

    #[test]
    fn test_noop_emitter_clone_box() {
        let emitter = NoopEmitter::new();
        let _boxed: Box<dyn HubEventEmitter> = emitter.clone_box();
    }

    #[test]
    fn test_arc_emitter() {
        let emitter: Arc<dyn HubEventEmitter> = Arc::new(NoopEmitter::new());
        emitter.emit(HubEvent::server_removed("s1"));
    }
}
