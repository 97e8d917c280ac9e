//! File read tool — workspace-confined file access.

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::path::PathBuf;

use cipher_core::error::ToolError;
use cipher_core::tool::{ParamKind, ParamSpec, Tool, ToolSpec};
use cipher_security::safe_join;

pub struct FileReadTool {
    workspace_dir: PathBuf,
}

impl FileReadTool {
    pub fn new(workspace_dir: PathBuf) -> Self {
        Self { workspace_dir }
    }
}

#[async_trait]
impl Tool for FileReadTool {
    fn spec(&self) -> ToolSpec {
        ToolSpec::new(
            "read_from_file",
            "Read the full text content of a file in the workspace.",
            vec![ParamSpec::required(
                "filename",
                ParamKind::String,
                "The file name (no paths)",
            )],
        )
    }

    async fn invoke(&self, arguments: Map<String, Value>) -> Result<Value, ToolError> {
        let filename = arguments
            .get("filename")
            .and_then(Value::as_str)
            .ok_or_else(|| ToolError::InvalidArgument("'filename' must be a string".into()))?;

        let path = safe_join(&self.workspace_dir, filename)
            .map_err(|e| ToolError::InvalidArgument(format!("Invalid filename: {e}")))?;

        match tokio::fs::read_to_string(&path).await {
            Ok(content) => Ok(serde_json::json!({
                "filename": filename,
                "content": content,
            })),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(ToolError::Execution {
                tool_name: "read_from_file".into(),
                reason: format!("File '{filename}' not found"),
            }),
            Err(e) => Err(ToolError::Execution {
                tool_name: "read_from_file".into(),
                reason: format!("Failed to read file: {e}"),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(filename: &str) -> Map<String, Value> {
        let mut map = Map::new();
        map.insert("filename".into(), Value::String(filename.into()));
        map
    }

    #[tokio::test]
    async fn read_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("notes.txt"), "remember this").unwrap();

        let tool = FileReadTool::new(dir.path().to_path_buf());
        let payload = tool.invoke(args("notes.txt")).await.unwrap();
        assert_eq!(payload["filename"], "notes.txt");
        assert_eq!(payload["content"], "remember this");
    }

    #[tokio::test]
    async fn missing_file_is_execution_error() {
        let dir = tempfile::tempdir().unwrap();
        let tool = FileReadTool::new(dir.path().to_path_buf());

        let err = tool.invoke(args("absent.txt")).await.unwrap_err();
        assert!(matches!(err, ToolError::Execution { .. }));
        assert!(err.to_string().contains("not found"));
    }

    #[tokio::test]
    async fn traversal_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let tool = FileReadTool::new(dir.path().to_path_buf());

        let err = tool.invoke(args("../../etc/passwd")).await.unwrap_err();
        assert!(matches!(err, ToolError::InvalidArgument(_)));
    }
}
