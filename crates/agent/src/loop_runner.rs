//! The reasoning loop.
//!
//! A state machine per user turn: `AwaitingModel` asks the provider for
//! the next action; a response naming tool calls moves to `ExecutingTool`,
//! where every call is run through the uniform executor and its
//! observation appended as a tool turn; a response with no tool calls is
//! the final answer (`Done`). Exceeding the iteration cap forces `Failed`
//! with a best-effort message.
//!
//! There is no built-in retry schedule: failures are surfaced to the model
//! as structured observations and the decision to retry differently, switch
//! tools, or ask the user belongs to the model.

use chrono::Utc;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, info, warn};

use cipher_core::error::{Error, ToolError};
use cipher_core::event::{DomainEvent, EventBus};
use cipher_core::executor::ToolExecutor;
use cipher_core::memory::{MemoryRecord, MemoryStore};
use cipher_core::message::{ConversationWindow, Message};
use cipher_core::provider::{Provider, ProviderRequest};
use cipher_core::tool::{ToolCallRequest, ToolResult};

use crate::prompt::DEFAULT_SYSTEM_PROMPT;

/// The loop's state for one user turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    /// Waiting for the model's next decision.
    AwaitingModel,
    /// Running the tool calls the model named.
    ExecutingTool,
    /// A final answer was produced.
    Done,
    /// The iteration cap was exceeded.
    Failed,
}

/// The outcome of one processed user turn.
#[derive(Debug)]
pub struct TurnOutcome {
    /// The answer surfaced to the user (best-effort on `Failed`).
    pub answer: String,
    /// Terminal state: `Done` or `Failed`.
    pub state: LoopState,
    /// Model-decision cycles consumed.
    pub iterations: u32,
    /// Total tool calls executed.
    pub tool_calls_made: usize,
}

/// Message surfaced when the iteration cap is hit.
const CAP_EXCEEDED_ANSWER: &str =
    "I've reached the maximum number of tool-call iterations for this \
     request. Please narrow the request or provide further guidance.";

/// The agent loop: one instance per session binding, sharing the provider,
/// executor, event bus, and memory store across sessions.
pub struct AgentLoop {
    provider: Arc<dyn Provider>,
    model: String,
    temperature: f32,
    max_tokens: Option<u32>,
    executor: Arc<ToolExecutor>,
    event_bus: Arc<EventBus>,
    system_prompt: String,
    max_iterations: u32,
    memory: Option<Arc<dyn MemoryStore>>,
    auto_save: bool,
    recall_limit: usize,
}

impl AgentLoop {
    pub fn new(
        provider: Arc<dyn Provider>,
        model: impl Into<String>,
        temperature: f32,
        executor: Arc<ToolExecutor>,
        event_bus: Arc<EventBus>,
    ) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature,
            max_tokens: None,
            executor,
            event_bus,
            system_prompt: DEFAULT_SYSTEM_PROMPT.into(),
            max_iterations: 12,
            memory: None,
            auto_save: false,
            recall_limit: 5,
        }
    }

    /// Set the iteration cap (model-decision cycles per turn).
    pub fn with_max_iterations(mut self, max: u32) -> Self {
        self.max_iterations = max.max(1);
        self
    }

    /// Set the max tokens per model response.
    pub fn with_max_tokens(mut self, max: u32) -> Self {
        self.max_tokens = Some(max);
        self
    }

    /// Override the system prompt.
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    /// Attach a memory store for recall at turn start and auto-save at end.
    pub fn with_memory(mut self, memory: Arc<dyn MemoryStore>) -> Self {
        self.memory = Some(memory);
        self
    }

    /// Enable auto-save of completed exchanges to memory.
    pub fn with_auto_save(mut self, enabled: bool) -> Self {
        self.auto_save = enabled;
        self
    }

    /// Set the maximum memories recalled per turn.
    pub fn with_recall_limit(mut self, limit: usize) -> Self {
        self.recall_limit = limit;
        self
    }

    pub fn max_iterations(&self) -> u32 {
        self.max_iterations
    }

    /// Process one user message to completion.
    ///
    /// Returns `Err` only on a terminal condition the loop cannot absorb
    /// (provider outage); every tool-level problem comes back to the model
    /// as a Failure observation instead.
    pub async fn process(
        &self,
        window: &mut ConversationWindow,
        user_message: &str,
    ) -> Result<TurnOutcome, Error> {
        info!(
            session_id = %window.session_id,
            turns = window.len(),
            "Processing user message"
        );

        window.push(Message::user(user_message));

        // ── Memory recall seeds the turn ──
        let recalled = self.recall_memories(user_message).await;
        let system_prompt = if recalled.is_empty() {
            self.system_prompt.clone()
        } else {
            format!("{}{}", self.system_prompt, format_recall(&recalled))
        };

        let tool_definitions = self.executor.registry().definitions();
        let mut tool_calls_made = 0usize;

        for iteration in 1..=self.max_iterations {
            debug!(
                session_id = %window.session_id,
                iteration,
                state = ?LoopState::AwaitingModel,
                "Loop iteration"
            );

            let mut messages = vec![Message::system(&system_prompt)];
            messages.extend(window.to_messages());

            let request = ProviderRequest {
                model: self.model.clone(),
                messages,
                temperature: self.temperature,
                max_tokens: self.max_tokens,
                tools: tool_definitions.clone(),
            };

            let response = self.provider.complete(request).await?;

            if let Some(usage) = &response.usage {
                self.event_bus.publish(DomainEvent::ResponseGenerated {
                    session_id: window.session_id.to_string(),
                    model: response.model.clone(),
                    tokens_used: usage.total_tokens,
                    timestamp: Utc::now(),
                });
            }

            // ── Final answer: no tool calls ──
            if response.message.tool_calls.is_empty() {
                let answer = response.message.content.clone();
                window.push(response.message);

                self.auto_save_exchange(window, user_message, &answer).await;
                self.event_bus.publish(DomainEvent::TurnCompleted {
                    session_id: window.session_id.to_string(),
                    iterations: iteration,
                    failed: false,
                    timestamp: Utc::now(),
                });

                info!(
                    session_id = %window.session_id,
                    iterations = iteration,
                    tool_calls = tool_calls_made,
                    "Turn completed"
                );

                return Ok(TurnOutcome {
                    answer,
                    state: LoopState::Done,
                    iterations: iteration,
                    tool_calls_made,
                });
            }

            // ── Execute the tool calls the model named ──
            debug!(
                session_id = %window.session_id,
                iteration,
                state = ?LoopState::ExecutingTool,
                count = response.message.tool_calls.len(),
                "Dispatching tool calls"
            );
            let tool_calls = response.message.tool_calls.clone();
            window.push(response.message);

            for tc in &tool_calls {
                tool_calls_made += 1;

                let start = std::time::Instant::now();
                let (result, observation) = self.run_tool_call(&tc.name, &tc.arguments).await;
                let duration_ms = start.elapsed().as_millis() as u64;

                if !result.is_success() {
                    warn!(tool = %tc.name, observation = %observation, "Tool call failed");
                }

                self.event_bus.publish(DomainEvent::ToolExecuted {
                    tool_name: tc.name.clone(),
                    success: result.is_success(),
                    duration_ms,
                    timestamp: Utc::now(),
                });

                window.push(Message::tool_result(&tc.id, &observation));
            }
        }

        // ── Iteration cap exceeded ──
        warn!(
            session_id = %window.session_id,
            cap = self.max_iterations,
            "Iteration cap exceeded, surfacing best-effort answer"
        );
        self.event_bus.publish(DomainEvent::TurnCompleted {
            session_id: window.session_id.to_string(),
            iterations: self.max_iterations,
            failed: true,
            timestamp: Utc::now(),
        });

        Ok(TurnOutcome {
            answer: CAP_EXCEEDED_ANSWER.into(),
            state: LoopState::Failed,
            iterations: self.max_iterations,
            tool_calls_made,
        })
    }

    /// Parse the model-supplied arguments and execute one tool call.
    ///
    /// Malformed argument JSON is a recoverable ParsingError observation,
    /// not a crash — the model sees it and gets another turn.
    async fn run_tool_call(&self, tool_name: &str, raw_arguments: &str) -> (ToolResult, String) {
        let parsed: Result<Map<String, Value>, ToolError> = if raw_arguments.trim().is_empty() {
            Ok(Map::new())
        } else {
            match serde_json::from_str::<Value>(raw_arguments) {
                Ok(Value::Object(map)) => Ok(map),
                Ok(other) => Err(ToolError::Parsing(format!(
                    "Tool arguments must be a JSON object, got: {other}"
                ))),
                Err(e) => Err(ToolError::Parsing(format!(
                    "Tool arguments are not valid JSON: {e}"
                ))),
            }
        };

        match parsed {
            Ok(arguments) => {
                let request = ToolCallRequest::new(tool_name, arguments);
                self.executor.execute_rendered(&request).await
            }
            Err(err) => {
                let result = ToolResult::from_error(err);
                let rendered = result.render(self.executor.observation_char_cap());
                (result, rendered)
            }
        }
    }

    /// Query the memory store with the user's message.
    async fn recall_memories(&self, user_message: &str) -> Vec<MemoryRecord> {
        let Some(memory) = &self.memory else {
            return Vec::new();
        };

        match memory.query(user_message, self.recall_limit).await {
            Ok(records) => {
                if !records.is_empty() {
                    debug!(count = records.len(), "Recalled memories for context");
                    self.event_bus.publish(DomainEvent::MemoryAccessed {
                        operation: "query".into(),
                        count: records.len(),
                        timestamp: Utc::now(),
                    });
                }
                records
            }
            Err(e) => {
                warn!("Memory recall failed: {e}");
                Vec::new()
            }
        }
    }

    /// Save a summary of the completed exchange to memory.
    async fn auto_save_exchange(
        &self,
        window: &ConversationWindow,
        user_message: &str,
        answer: &str,
    ) {
        let Some(memory) = &self.memory else {
            return;
        };
        if !self.auto_save {
            return;
        }
        // Skip trivial exchanges.
        if user_message.len() < 10 || answer.len() < 10 {
            return;
        }

        let summary = format!("User asked: {user_message}\nAssistant answered: {answer}");
        let mut metadata = Map::new();
        metadata.insert("kind".into(), Value::String("conversation".into()));
        metadata.insert("auto_saved".into(), Value::Bool(true));
        metadata.insert(
            "session".into(),
            Value::String(window.session_id.to_string()),
        );

        match memory.save(&summary, Some(metadata)).await {
            Ok(id) => {
                debug!(memory_id = %id, "Auto-saved exchange to memory");
                self.event_bus.publish(DomainEvent::MemoryAccessed {
                    operation: "save".into(),
                    count: 1,
                    timestamp: Utc::now(),
                });
            }
            Err(e) => warn!("Failed to auto-save exchange: {e}"),
        }
    }
}

/// Format recalled memories as a context block appended to the system
/// prompt.
fn format_recall(records: &[MemoryRecord]) -> String {
    let mut block = String::from("\n\n## Recalled memories\n");
    for (i, record) in records.iter().enumerate() {
        block.push_str(&format!(
            "{}. [score={:.2}] {}\n",
            i + 1,
            record.score,
            record.content
        ));
    }
    block
}
