//! The Cipher reasoning loop.
//!
//! Given a conversation window and the tool catalogue, the loop asks the
//! model for its next action, executes any tool calls it names, folds the
//! observations back in, and stops on a final answer, the iteration cap,
//! or a fatal provider error.

pub mod loop_runner;
pub mod prompt;
pub mod session;
pub mod test_helpers;

pub use loop_runner::{AgentLoop, LoopState, TurnOutcome};
pub use prompt::DEFAULT_SYSTEM_PROMPT;
pub use session::AgentSession;
