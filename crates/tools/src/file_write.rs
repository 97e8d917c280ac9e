//! File write tool — workspace-confined file creation.
//!
//! Takes a bare filename, never a path. The sandbox invariant lives in
//! `cipher_security::validate_filename` and runs before any filesystem
//! access.

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::path::PathBuf;

use cipher_core::error::ToolError;
use cipher_core::tool::{ParamKind, ParamSpec, Tool, ToolSpec};
use cipher_security::safe_join;

pub struct FileWriteTool {
    workspace_dir: PathBuf,
}

impl FileWriteTool {
    pub fn new(workspace_dir: PathBuf) -> Self {
        Self { workspace_dir }
    }
}

#[async_trait]
impl Tool for FileWriteTool {
    fn spec(&self) -> ToolSpec {
        ToolSpec::new(
            "write_to_file",
            "Write text content to a file in the workspace. Creates the file \
             if it doesn't exist, overwrites if it does. Useful for saving \
             summaries, drafts, or results.",
            vec![
                ParamSpec::required("filename", ParamKind::String, "The file name (no paths)"),
                ParamSpec::required("content", ParamKind::String, "The text content to write"),
            ],
        )
    }

    async fn invoke(&self, arguments: Map<String, Value>) -> Result<Value, ToolError> {
        let filename = arguments
            .get("filename")
            .and_then(Value::as_str)
            .ok_or_else(|| ToolError::InvalidArgument("'filename' must be a string".into()))?;
        let content = arguments
            .get("content")
            .and_then(Value::as_str)
            .ok_or_else(|| ToolError::InvalidArgument("'content' must be a string".into()))?;

        // Sandbox check happens before the filesystem is touched.
        let path = safe_join(&self.workspace_dir, filename)
            .map_err(|e| ToolError::InvalidArgument(format!("Invalid filename: {e}")))?;

        tokio::fs::create_dir_all(&self.workspace_dir)
            .await
            .map_err(|e| ToolError::Execution {
                tool_name: "write_to_file".into(),
                reason: format!("Failed to create workspace: {e}"),
            })?;

        tokio::fs::write(&path, content)
            .await
            .map_err(|e| ToolError::Execution {
                tool_name: "write_to_file".into(),
                reason: format!("Failed to write file: {e}"),
            })?;

        Ok(serde_json::json!({
            "status": "success",
            "message": format!("File '{}' written ({} bytes).", filename, content.len()),
        }))
    }
}
