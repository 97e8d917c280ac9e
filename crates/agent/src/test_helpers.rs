//! Scripted providers for deterministic loop tests.
//!
//! The loop's retry behavior is a policy of the model, so tests substitute
//! a deterministic scripted strategy: a fixed sequence of responses (or
//! errors), with call counting and request capture for assertions.

use std::sync::Mutex;

use cipher_core::error::ProviderError;
use cipher_core::message::{Message, MessageToolCall};
use cipher_core::provider::{Provider, ProviderRequest, ProviderResponse, Usage};

/// One scripted model decision.
pub enum ScriptedStep {
    Respond(ProviderResponse),
    Fail(ProviderError),
}

/// A provider that replays a fixed script.
///
/// Each `complete` call consumes the next step; when the script is
/// exhausted the last step is repeated, which makes "model that always
/// wants another tool call" trivially expressible.
pub struct ScriptedProvider {
    steps: Mutex<Vec<ScriptedStep>>,
    cursor: Mutex<usize>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl ScriptedProvider {
    pub fn new(steps: Vec<ScriptedStep>) -> Self {
        assert!(!steps.is_empty(), "script must have at least one step");
        Self {
            steps: Mutex::new(steps),
            cursor: Mutex::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// A single final text answer.
    pub fn single_text(text: &str) -> Self {
        Self::new(vec![ScriptedStep::Respond(text_response(text))])
    }

    /// Tool calls first, then a final answer.
    pub fn tool_then_answer(
        tool_calls: Vec<MessageToolCall>,
        thought: &str,
        answer: &str,
    ) -> Self {
        Self::new(vec![
            ScriptedStep::Respond(tool_call_response(tool_calls, thought)),
            ScriptedStep::Respond(text_response(answer)),
        ])
    }

    /// A model that requests the same tool call forever.
    pub fn always_tool_call(tool_call: MessageToolCall) -> Self {
        Self::new(vec![ScriptedStep::Respond(tool_call_response(
            vec![tool_call],
            "Thinking...",
        ))])
    }

    /// How many times `complete` was called.
    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// The request captured on call `index`.
    pub fn request(&self, index: usize) -> ProviderRequest {
        self.requests.lock().unwrap()[index].clone()
    }
}

#[async_trait::async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        self.requests.lock().unwrap().push(request);

        let steps = self.steps.lock().unwrap();
        let mut cursor = self.cursor.lock().unwrap();
        let index = (*cursor).min(steps.len() - 1);
        *cursor += 1;

        match &steps[index] {
            ScriptedStep::Respond(response) => Ok(response.clone()),
            ScriptedStep::Fail(err) => Err(err.clone()),
        }
    }
}

/// A plain text response (no tool calls).
pub fn text_response(text: &str) -> ProviderResponse {
    ProviderResponse {
        message: Message::assistant(text),
        usage: Some(Usage {
            prompt_tokens: 10,
            completion_tokens: 5,
            total_tokens: 15,
        }),
        model: "scripted-model".into(),
    }
}

/// A response carrying tool calls plus optional thought content.
pub fn tool_call_response(tool_calls: Vec<MessageToolCall>, thought: &str) -> ProviderResponse {
    let mut message = Message::assistant(thought);
    message.tool_calls = tool_calls;
    ProviderResponse {
        message,
        usage: Some(Usage {
            prompt_tokens: 10,
            completion_tokens: 5,
            total_tokens: 15,
        }),
        model: "scripted-model".into(),
    }
}

/// A tool call with JSON arguments.
pub fn make_tool_call(name: &str, args: serde_json::Value) -> MessageToolCall {
    MessageToolCall {
        id: format!("call_{name}"),
        name: name.to_string(),
        arguments: serde_json::to_string(&args).unwrap(),
    }
}

/// A tool call whose arguments are a raw (possibly malformed) string.
pub fn make_raw_tool_call(name: &str, raw_arguments: &str) -> MessageToolCall {
    MessageToolCall {
        id: format!("call_{name}"),
        name: name.to_string(),
        arguments: raw_arguments.to_string(),
    }
}
