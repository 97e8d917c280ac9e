//! Workspace listing tool.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use std::path::PathBuf;

use cipher_core::error::ToolError;
use cipher_core::tool::{Tool, ToolSpec};

pub struct ListFilesTool {
    workspace_dir: PathBuf,
}

impl ListFilesTool {
    pub fn new(workspace_dir: PathBuf) -> Self {
        Self { workspace_dir }
    }
}

#[async_trait]
impl Tool for ListFilesTool {
    fn spec(&self) -> ToolSpec {
        ToolSpec::new(
            "list_files",
            "List the files currently in the workspace with their sizes and \
             modification times.",
            vec![],
        )
    }

    async fn invoke(&self, _arguments: Map<String, Value>) -> Result<Value, ToolError> {
        // An absent workspace just means nothing has been written yet.
        let mut reader = match tokio::fs::read_dir(&self.workspace_dir).await {
            Ok(reader) => reader,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(serde_json::json!({ "files": [] }));
            }
            Err(e) => {
                return Err(ToolError::Execution {
                    tool_name: "list_files".into(),
                    reason: format!("Failed to read workspace: {e}"),
                });
            }
        };

        let mut files = Vec::new();
        while let Some(entry) = reader.next_entry().await.map_err(|e| ToolError::Execution {
            tool_name: "list_files".into(),
            reason: format!("Failed to read entry: {e}"),
        })? {
            let Ok(meta) = entry.metadata().await else {
                continue;
            };
            if !meta.is_file() {
                continue;
            }

            let size_kb = (meta.len() as f64 / 1024.0 * 100.0).round() / 100.0;
            let last_modified = meta
                .modified()
                .ok()
                .map(|t| DateTime::<Utc>::from(t).to_rfc3339())
                .unwrap_or_default();

            files.push(serde_json::json!({
                "filename": entry.file_name().to_string_lossy(),
                "size_kb": size_kb,
                "last_modified": last_modified,
            }));
        }

        files.sort_by(|a, b| {
            a["filename"]
                .as_str()
                .unwrap_or_default()
                .cmp(b["filename"].as_str().unwrap_or_default())
        });

        Ok(serde_json::json!({ "files": files }))
    }
}
