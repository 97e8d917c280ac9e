//! Agent sessions.
//!
//! A session owns one conversation window and a binding to one agent
//! loop; one session per end-user conversation. Sessions never share
//! conversation state — only the memory store and tool registry are
//! shared process-wide, through the loop they are bound to.

use std::sync::Arc;
use tracing::{error, info};

use cipher_core::message::{ConversationWindow, SessionId};

use crate::loop_runner::AgentLoop;

/// Answer surfaced when the turn fails terminally (provider outage); the
/// session itself stays usable for the next message.
const GENERIC_FAILURE_ANSWER: &str =
    "I'm sorry — something went wrong while processing that request. \
     Please try again.";

pub struct AgentSession {
    window: ConversationWindow,
    agent: Arc<AgentLoop>,
}

impl AgentSession {
    pub fn new(agent: Arc<AgentLoop>, window_turns: usize) -> Self {
        let window = ConversationWindow::new(window_turns);
        info!(session_id = %window.session_id, "Session started");
        Self { window, agent }
    }

    pub fn id(&self) -> &SessionId {
        &self.window.session_id
    }

    pub fn window(&self) -> &ConversationWindow {
        &self.window
    }

    /// Process one user message and return the answer.
    ///
    /// One message at a time per session: the exclusive borrow on the
    /// window means a second message cannot interleave with this one.
    pub async fn handle_message(&mut self, text: &str) -> String {
        match self.agent.process(&mut self.window, text).await {
            Ok(outcome) => outcome.answer,
            Err(e) => {
                error!(session_id = %self.window.session_id, error = %e, "Turn failed terminally");
                GENERIC_FAILURE_ANSWER.into()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::*;
    use cipher_core::error::ProviderError;
    use cipher_core::event::EventBus;
    use cipher_core::executor::ToolExecutor;
    use cipher_memory::InMemoryStore;
    use cipher_tools::{ToolContext, build_registry};

    fn session_with(provider: Arc<ScriptedProvider>) -> (AgentSession, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let ctx = ToolContext::new(dir.path().to_path_buf(), Arc::new(InMemoryStore::new()));
        let registry = Arc::new(build_registry(&ctx).unwrap());
        let executor = Arc::new(ToolExecutor::new(registry));
        let agent = Arc::new(AgentLoop::new(
            provider,
            "scripted-model",
            0.7,
            executor,
            Arc::new(EventBus::default()),
        ));
        (AgentSession::new(agent, 50), dir)
    }

    #[tokio::test]
    async fn answers_a_message() {
        let provider = Arc::new(ScriptedProvider::single_text("Hi there!"));
        let (mut session, _dir) = session_with(provider);

        let answer = session.handle_message("Hello").await;
        assert_eq!(answer, "Hi there!");
        assert_eq!(session.window().len(), 2);
    }

    #[tokio::test]
    async fn window_accumulates_across_turns() {
        let provider = Arc::new(ScriptedProvider::single_text("Noted."));
        let (mut session, _dir) = session_with(provider);

        session.handle_message("First message").await;
        session.handle_message("Second message").await;
        assert_eq!(session.window().len(), 4);
    }

    #[tokio::test]
    async fn terminal_error_yields_apology_and_session_survives() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            ScriptedStep::Fail(ProviderError::Network("connection refused".into())),
            ScriptedStep::Respond(text_response("Back online.")),
        ]));
        let (mut session, _dir) = session_with(provider);

        let first = session.handle_message("Hello?").await;
        assert!(first.contains("something went wrong"));

        // The same session keeps working on the next turn.
        let second = session.handle_message("Are you there?").await;
        assert_eq!(second, "Back online.");
    }

    #[tokio::test]
    async fn sessions_have_distinct_ids_and_windows() {
        let provider = Arc::new(ScriptedProvider::single_text("ok"));
        let (session_a, _dir_a) = session_with(provider.clone());
        let (session_b, _dir_b) = session_with(provider);
        assert_ne!(session_a.id(), session_b.id());
        assert_eq!(session_a.window().len(), 0);
    }
}
