//! Domain event system — decoupled observability.
//!
//! Events are published when something interesting happens in the loop.
//! Subscribers (the CLI, tests, future dashboards) can react without
//! coupling to the agent internals.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;

/// All domain events in the system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum DomainEvent {
    /// The model produced a response for a session turn
    ResponseGenerated {
        session_id: String,
        model: String,
        tokens_used: u32,
        timestamp: DateTime<Utc>,
    },

    /// A tool call finished (success or failure)
    ToolExecuted {
        tool_name: String,
        success: bool,
        duration_ms: u64,
        timestamp: DateTime<Utc>,
    },

    /// The memory store was touched
    MemoryAccessed {
        operation: String, // "save", "query", "list"
        count: usize,
        timestamp: DateTime<Utc>,
    },

    /// The agent asked the user a clarifying question
    ClarificationRequested {
        question_preview: String,
        answered: bool,
        timestamp: DateTime<Utc>,
    },

    /// A reasoning turn ended
    TurnCompleted {
        session_id: String,
        iterations: u32,
        failed: bool,
        timestamp: DateTime<Utc>,
    },
}

/// A broadcast-based event bus.
///
/// Uses `tokio::sync::broadcast` for multi-consumer pub/sub; publishing
/// with no subscribers is a no-op.
pub struct EventBus {
    sender: broadcast::Sender<Arc<DomainEvent>>,
}

impl EventBus {
    /// Create a new event bus with the given capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all subscribers.
    pub fn publish(&self, event: DomainEvent) {
        let _ = self.sender.send(Arc::new(event));
    }

    /// Subscribe to receive events.
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<DomainEvent>> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}
