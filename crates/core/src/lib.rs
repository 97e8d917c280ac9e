//! Core domain types and traits for the Cipher assistant.
//!
//! This crate defines the vocabulary the rest of the workspace speaks:
//! messages and the bounded conversation window, tool specifications and
//! the registry/executor pair, the model provider trait, the memory store
//! trait, errors, and domain events.

pub mod error;
pub mod event;
pub mod executor;
pub mod memory;
pub mod message;
pub mod provider;
pub mod tool;

pub use error::{AgentError, Error, MemoryError, ProviderError, Result, ToolError};
pub use event::{DomainEvent, EventBus};
pub use executor::ToolExecutor;
pub use memory::{MemoryRecord, MemoryStore, RetentionPolicy, SAVED_AT_KEY};
pub use message::{ConversationWindow, Message, MessageToolCall, Role, SessionId};
pub use provider::{Provider, ProviderRequest, ProviderResponse, ToolDefinition, Usage};
pub use tool::{
    FailureKind, ParamKind, ParamSpec, Tool, ToolCallRequest, ToolRegistry, ToolResult, ToolSpec,
};
