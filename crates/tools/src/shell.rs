//! Shell tool — allowlisted command execution.
//!
//! Gated behind `[tools] enable_shell`; even when enabled, only commands
//! whose base name is on the configured allowlist may run.

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, warn};

use cipher_core::error::ToolError;
use cipher_core::tool::{ParamKind, ParamSpec, Tool, ToolSpec};
use cipher_security::CommandAllowlist;

pub struct ShellTool {
    allowlist: CommandAllowlist,
}

impl ShellTool {
    pub fn new(allowlist: CommandAllowlist) -> Self {
        Self { allowlist }
    }
}

#[async_trait]
impl Tool for ShellTool {
    fn spec(&self) -> ToolSpec {
        ToolSpec::new(
            "shell",
            "Execute a shell command and return its stdout/stderr. Only \
             allowlisted commands may run.",
            vec![ParamSpec::required(
                "command",
                ParamKind::String,
                "The shell command to execute",
            )],
        )
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(30)
    }

    async fn invoke(&self, arguments: Map<String, Value>) -> Result<Value, ToolError> {
        let command = arguments
            .get("command")
            .and_then(Value::as_str)
            .ok_or_else(|| ToolError::InvalidArgument("'command' must be a string".into()))?;

        if !self.allowlist.is_allowed(command) {
            return Err(ToolError::Denied {
                tool_name: "shell".into(),
                reason: format!(
                    "Command '{}' not in allowlist",
                    CommandAllowlist::base_command(command)
                ),
            });
        }

        debug!(command = %command, "Executing shell command");

        let output = if cfg!(target_os = "windows") {
            Command::new("cmd").args(["/C", command]).output().await
        } else {
            Command::new("sh").args(["-c", command]).output().await
        };

        let output = output.map_err(|e| ToolError::Execution {
            tool_name: "shell".into(),
            reason: e.to_string(),
        })?;

        let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        let exit_code = output.status.code().unwrap_or(-1);

        if !output.status.success() {
            warn!(command = %command, exit_code, "Command failed");
            return Err(ToolError::Execution {
                tool_name: "shell".into(),
                reason: format!("[exit code: {exit_code}] {stdout} {stderr}"),
            });
        }

        Ok(serde_json::json!({
            "stdout": stdout,
            "stderr": stderr,
            "exit_code": exit_code,
        }))
    }
}
