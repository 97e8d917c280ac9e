//! Command allowlist for the shell tool.
//!
//! Shell execution is an explicitly gated capability: when enabled, only
//! commands whose base name appears on the allowlist may run. An empty
//! allowlist denies everything.

use serde::{Deserialize, Serialize};

/// An allowlist of base command names.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommandAllowlist {
    commands: Vec<String>,
}

impl CommandAllowlist {
    pub fn new(commands: Vec<String>) -> Self {
        Self { commands }
    }

    /// Whether the command line's base command is allowed.
    ///
    /// Only the first whitespace-separated word is checked; arguments are
    /// the tool's responsibility.
    pub fn is_allowed(&self, command_line: &str) -> bool {
        let Some(base) = command_line.split_whitespace().next() else {
            return false;
        };
        self.commands.iter().any(|c| c == base)
    }

    /// The base command of a command line, for error messages.
    pub fn base_command(command_line: &str) -> &str {
        command_line.split_whitespace().next().unwrap_or("")
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}
