//! Message types and the bounded conversation window.
//!
//! A session's history is a rolling window of turns: once the window is
//! full, the oldest turn is evicted first (FIFO). Turns are only ever
//! appended, never edited in place.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for an agent session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub String);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The role of a turn in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The end user
    User,
    /// The assistant
    Assistant,
    /// System instructions
    System,
    /// Tool execution result
    Tool,
}

/// A single turn in a conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Unique message ID
    pub id: String,

    /// Who produced this turn
    pub role: Role,

    /// The text content
    pub content: String,

    /// Tool calls requested by the assistant (if any)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<MessageToolCall>,

    /// If this is a tool observation, which tool call it answers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,

    /// Timestamp
    pub timestamp: DateTime<Utc>,
}

impl Message {
    fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: None,
            timestamp: Utc::now(),
        }
    }

    /// Create a new user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    /// Create a new assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    /// Create a new system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    /// Create a tool observation answering the given tool call.
    pub fn tool_result(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        let mut msg = Self::new(Role::Tool, content);
        msg.tool_call_id = Some(tool_call_id.into());
        msg
    }
}

/// A tool call embedded in an assistant message.
///
/// Arguments are kept as the raw JSON string the model produced; parsing
/// happens in the reasoning loop so malformed output can be surfaced back
/// to the model instead of crashing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageToolCall {
    /// Unique ID for this tool call
    pub id: String,

    /// Name of the tool to invoke
    pub name: String,

    /// Arguments as a JSON string
    pub arguments: String,
}

/// A bounded rolling window of conversation turns.
///
/// Holds at most `max_turns` turns; pushing beyond that evicts the oldest
/// turn first. The window is the full context handed to the model on each
/// decision step (the system prompt is assembled separately and is not
/// part of the window).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationWindow {
    /// The owning session
    pub session_id: SessionId,

    turns: std::collections::VecDeque<Message>,

    max_turns: usize,

    /// When the window was created
    pub created_at: DateTime<Utc>,
}

impl ConversationWindow {
    /// Create an empty window holding at most `max_turns` turns.
    pub fn new(max_turns: usize) -> Self {
        Self {
            session_id: SessionId::new(),
            turns: std::collections::VecDeque::new(),
            max_turns: max_turns.max(1),
            created_at: Utc::now(),
        }
    }

    /// Append a turn, evicting the oldest if the window is full.
    pub fn push(&mut self, message: Message) {
        self.turns.push_back(message);
        while self.turns.len() > self.max_turns {
            self.turns.pop_front();
        }
    }

    /// The turns currently in the window, oldest first.
    pub fn turns(&self) -> impl Iterator<Item = &Message> {
        self.turns.iter()
    }

    /// Snapshot of the window as a Vec (oldest first).
    pub fn to_messages(&self) -> Vec<Message> {
        self.turns.iter().cloned().collect()
    }

    /// The most recent turn with the given role, if any.
    pub fn last_with_role(&self, role: Role) -> Option<&Message> {
        self.turns.iter().rev().find(|m| m.role == role)
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn max_turns(&self) -> usize {
        self.max_turns
    }
}
