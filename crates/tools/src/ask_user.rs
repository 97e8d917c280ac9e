//! Clarification tool — suspend the loop and ask the end user.
//!
//! Instead of performing external work, this tool sends the question to
//! the session surface over a channel and blocks (only the issuing task)
//! until a reply arrives or the timeout elapses. A timeout or a missing
//! surface resolves to a "no response" failure, which the loop treats as
//! an ordinary observation — never an indefinite wait.

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tracing::debug;

use cipher_core::error::ToolError;
use cipher_core::tool::{ParamKind, ParamSpec, Tool, ToolSpec};

/// A clarification question in flight to the session surface.
pub struct ClarificationRequest {
    pub question: String,
    pub reply: oneshot::Sender<String>,
}

pub struct AskUserTool {
    surface: Option<mpsc::Sender<ClarificationRequest>>,
    wait: Duration,
}

impl AskUserTool {
    pub fn new(surface: Option<mpsc::Sender<ClarificationRequest>>, wait: Duration) -> Self {
        Self { surface, wait }
    }

    fn no_response(&self) -> ToolError {
        ToolError::Execution {
            tool_name: "ask_user".into(),
            reason: "The user did not respond in time.".into(),
        }
    }
}

#[async_trait]
impl Tool for AskUserTool {
    fn spec(&self) -> ToolSpec {
        ToolSpec::new(
            "ask_user",
            "Ask the user a clarifying question and wait for their reply. Use \
             only when you genuinely need more information or direction; never \
             to confirm something you already know.",
            vec![ParamSpec::required(
                "question",
                ParamKind::String,
                "The question to ask the user",
            )],
        )
    }

    // Slightly above the internal wait so the executor's deadline never
    // fires before the sentinel is produced.
    fn timeout(&self) -> Duration {
        self.wait + Duration::from_secs(5)
    }

    async fn invoke(&self, arguments: Map<String, Value>) -> Result<Value, ToolError> {
        let question = arguments
            .get("question")
            .and_then(Value::as_str)
            .ok_or_else(|| ToolError::InvalidArgument("'question' must be a string".into()))?;

        let Some(surface) = &self.surface else {
            debug!("No clarification surface attached; reporting no response");
            return Err(self.no_response());
        };

        let (reply_tx, reply_rx) = oneshot::channel();
        let request = ClarificationRequest {
            question: question.to_string(),
            reply: reply_tx,
        };

        if surface.send(request).await.is_err() {
            // Surface went away (e.g. headless run); same as no answer.
            return Err(self.no_response());
        }

        match tokio::time::timeout(self.wait, reply_rx).await {
            Ok(Ok(answer)) => Ok(serde_json::json!({ "response": answer })),
            Ok(Err(_)) | Err(_) => Err(self.no_response()),
        }
    }
}
